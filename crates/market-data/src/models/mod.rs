//! Quote models
//!
//! This module contains the core data types for quote operations:
//! - `types` - Type aliases for common identifiers (SourceId, Currency)
//! - `currency` - Currency identities and the immutable lookup table
//! - `quote` - Single-source quote, price legs and base units
//! - `aggregate` - Aggregation request/result and ordering intent
//! - `conversion` - Conversion request/result

mod aggregate;
mod conversion;
mod currency;
mod quote;
mod types;

pub use aggregate::{AggregateRequest, AggregatedResult, OrderIntent, RankedQuote};
pub use conversion::{parse_amount, ConversionRequest, ConversionResult};
pub use currency::{CurrencyIdentity, CurrencyTable, DOMESTIC_CURRENCY};
pub use quote::{parse_price, BaseUnit, PriceField, Quote};
pub use types::{Currency, SourceId};
