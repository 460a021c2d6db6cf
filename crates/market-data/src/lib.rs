//! fxrate Market Data Crate
//!
//! This crate answers "what does currency X cost right now, and where is it
//! cheapest" by querying several independent bank quotation boards and
//! reconciling their incompatible formats into one schema.
//!
//! # Overview
//!
//! The market data crate supports:
//! - Six upstream sources with distinct transports and payloads
//! - Currency identity matching across inconsistent naming
//! - Unit normalization onto a per-100 basis
//! - Concurrent fan-out with per-source deadlines and ranking
//! - Leg-aware amount conversion against a single source
//!
//! # Architecture
//!
//! ```text
//!   query text
//!       |
//!       v
//! +------------------+
//! | CurrencyResolver |  (used inside every adapter)
//! +------------------+
//!       |
//!       v
//! +------------------+     +------------------+
//! |  SourceAdapter   | --> |   raw Quote      |  (per 1 or per 100)
//! +------------------+     +------------------+
//!                                  |
//!                                  v
//!                          +------------------+
//!                          |    normalize     |  (per 100)
//!                          +------------------+
//!                             |            |
//!                             v            v
//!                  +----------------+  +-------------------+
//!                  |   Aggregator   |  | CurrencyConverter |
//!                  |   -> rank      |  +-------------------+
//!                  +----------------+
//! ```
//!
//! # Core Types
//!
//! - [`Quote`] - One source's four price legs for one currency
//! - [`AggregatedResult`] - Ranked successes plus timeout and miss sets
//! - [`ConversionResult`] - Converted amount and the leg used
//! - [`CurrencyTable`] - Immutable currency codes, names and synonyms
//!
//! # Type Aliases
//!
//! - [`SourceId`] - Source identifier (e.g., "BOC", "CMB")
//! - [`Currency`] - Currency code (ISO 4217)

pub mod config;
pub mod converter;
pub mod errors;
pub mod models;
pub mod normalizer;
pub mod provider;
pub mod registry;
pub mod resolver;

pub use config::FetchConfig;
pub use converter::{convert_with_quote, ConversionPlan, CurrencyConverter, Direction};
pub use errors::{FailureClass, MarketDataError};
pub use normalizer::normalize;

// Re-export all public types from models
pub use models::{
    parse_amount, parse_price, AggregateRequest, AggregatedResult, BaseUnit, ConversionRequest,
    ConversionResult, Currency, CurrencyIdentity, CurrencyTable, OrderIntent, PriceField, Quote,
    RankedQuote, SourceId, DOMESTIC_CURRENCY,
};

// Re-export provider types
pub use provider::{
    BocSource, CgbSource, CibSource, CiticSource, CmbSource, SourceAdapter, UnionPaySource,
};

// Re-export registry types
pub use registry::{
    rank, Aggregator, FetchDiagnostics, MissReason, SourceAttempt, SourceOutcome, SourceRegistry,
};

// Re-export resolver types
pub use resolver::{CurrencyResolver, NormalizedQuery};
