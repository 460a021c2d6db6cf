//! Source adapter trait definitions.
//!
//! This module defines the core `SourceAdapter` trait that every upstream
//! quote publisher implements.

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::Quote;

/// Trait for upstream quote sources.
///
/// Each implementation owns its transport and decode quirks behind this
/// contract. Cancellation is cooperative: dropping the returned future
/// aborts the in-flight request and discards any partially read body.
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use fxrate_market_data::provider::SourceAdapter;
///
/// struct MyBank;
///
/// #[async_trait]
/// impl SourceAdapter for MyBank {
///     fn id(&self) -> &'static str {
///         "MY_BANK"
///     }
///
///     fn key(&self) -> &'static str {
///         "mybank"
///     }
///
///     fn display_name(&self) -> &'static str {
///         "My Bank"
///     }
///
///     async fn fetch_quote(&self, query: &str) -> Result<Option<Quote>, MarketDataError> {
///         // ... fetch, decode, locate, match
///     }
/// }
/// ```
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// Unique upper-case identifier, e.g. "BOC".
    ///
    /// Used for logging, diagnostics and the aggregation result sets.
    fn id(&self) -> &'static str;

    /// Lower-case key users type to select the source, e.g. "boc".
    fn key(&self) -> &'static str;

    /// Human-readable institution name.
    fn display_name(&self) -> &'static str;

    /// Fetch this source's raw quote for a free-form currency query.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(quote))` - the first matching row, in the source's own
    ///   base unit (not yet normalized)
    /// * `Ok(None)` - the source does not list the currency
    /// * `Err(error)` - transport, status, decode or layout failure
    async fn fetch_quote(&self, query: &str) -> Result<Option<Quote>, MarketDataError>;
}
