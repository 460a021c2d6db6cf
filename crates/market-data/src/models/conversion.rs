use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quote::PriceField;
use super::types::SourceId;
use crate::errors::MarketDataError;

/// A single-leg amount conversion against one source.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct ConversionRequest {
    /// Source key or id ("boc", "CMB", ...)
    pub source: String,
    pub from: String,
    pub to: String,
    pub amount: Decimal,
}

impl ConversionRequest {
    /// Build a request from an already-parsed amount.
    ///
    /// Negative amounts are rejected.
    pub fn new(
        source: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: Decimal,
    ) -> Result<Self, MarketDataError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MarketDataError::InvalidInput(format!(
                "amount must not be negative: {}",
                amount
            )));
        }
        Ok(Self {
            source: source.into(),
            from: from.into(),
            to: to.into(),
            amount,
        })
    }

    /// Build a request from user text such as "1,000.50".
    pub fn parse(
        source: impl Into<String>,
        from: impl Into<String>,
        to: impl Into<String>,
        amount: &str,
    ) -> Result<Self, MarketDataError> {
        Self::new(source, from, to, parse_amount(amount)?)
    }
}

/// Parse a user-supplied amount. Thousands separators are accepted.
pub fn parse_amount(raw: &str) -> Result<Decimal, MarketDataError> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() {
        return Err(MarketDataError::InvalidInput("amount is empty".to_string()));
    }
    let amount = cleaned
        .parse::<Decimal>()
        .map_err(|_| MarketDataError::InvalidInput(format!("not a number: {}", raw.trim())))?;
    if amount.is_sign_negative() && !amount.is_zero() {
        return Err(MarketDataError::InvalidInput(format!(
            "amount must not be negative: {}",
            raw.trim()
        )));
    }
    Ok(amount)
}

/// Result of a conversion.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversionResult {
    pub source: SourceId,
    /// Upper-case origin currency code
    pub from: String,
    /// Upper-case destination currency code
    pub to: String,
    pub amount: Decimal,
    pub converted: Decimal,
    /// Leg used; `None` for a same-currency identity conversion
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price_field: Option<PriceField>,
    /// Canonical per-100 rate used
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rate: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub release_time: Option<String>,
    /// Foreign currency label as printed by the source
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_name: Option<String>,
}

impl ConversionResult {
    /// "spot", "cash" or "identity".
    pub fn leg_label(&self) -> &'static str {
        self.price_field.map(|f| f.kind()).unwrap_or("identity")
    }
}
