//! Currency identity resolution for source adapters.
//!
//! Every adapter receives a free-form query ("usd", "港币", "hkd/cny") and has
//! to find the matching row in a table that may be keyed by Chinese name,
//! ISO code, or both. The resolver owns that logic:
//!
//! ```text
//! query ──▶ normalize ──▶ NormalizedQuery { key, target, code }
//!                                │
//!   row (label, code?) ──────────┴──▶ matches ──▶ bool
//! ```
//!
//! A row that matches nothing is not an error; adapters report it as
//! `Ok(None)`.
//!
//! # Example
//!
//! ```
//! use fxrate_market_data::resolver::CurrencyResolver;
//!
//! let resolver = CurrencyResolver::default();
//! let query = resolver.normalize("hkd");
//! assert_eq!(query.target, "港币");
//! assert!(resolver.matches("港元", None, &query));
//! ```

mod currency_resolver;

pub use currency_resolver::{CurrencyResolver, NormalizedQuery};
