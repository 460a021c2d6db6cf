use std::fmt;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::types::{Currency, SourceId};

/// Foreign-currency denomination a quoted price is expressed against.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BaseUnit {
    /// Price of 1 unit of foreign currency
    One,
    /// Price of 100 units of foreign currency (the canonical basis)
    #[default]
    Hundred,
}

impl BaseUnit {
    /// Parse a unit cell. Only an explicit "1" means per-unit quoting;
    /// blanks and anything unrecognised fall back to the per-100 basis.
    pub fn parse(raw: &str) -> Self {
        match raw.trim() {
            "1" => Self::One,
            _ => Self::Hundred,
        }
    }

    pub fn units(&self) -> Decimal {
        match self {
            Self::One => Decimal::ONE,
            Self::Hundred => Decimal::ONE_HUNDRED,
        }
    }
}

/// One of the four published price legs.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceField {
    /// Institution buys electronic foreign currency from the customer
    BuySpot,
    /// Institution buys foreign banknotes from the customer
    BuyCash,
    /// Institution sells electronic foreign currency to the customer
    SellSpot,
    /// Institution sells foreign banknotes to the customer
    SellCash,
}

impl PriceField {
    /// "spot" or "cash"
    pub fn kind(&self) -> &'static str {
        match self {
            Self::BuySpot | Self::SellSpot => "spot",
            Self::BuyCash | Self::SellCash => "cash",
        }
    }
}

impl fmt::Display for PriceField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::BuySpot => "buy spot",
            Self::BuyCash => "buy cash",
            Self::SellSpot => "sell spot",
            Self::SellCash => "sell cash",
        };
        f.write_str(label)
    }
}

/// A single source's quote for one currency.
///
/// Every price is either a positive decimal or `None` ("unavailable");
/// zero and negative upstream values are never stored.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    /// Source of the quote (BOC, CIB, ...)
    pub source: SourceId,

    /// Currency label as the source printed it
    pub currency_name: String,

    /// ISO code, when the source publishes one or it could be resolved
    #[serde(skip_serializing_if = "Option::is_none")]
    pub currency_code: Option<Currency>,

    pub buy_spot: Option<Decimal>,
    pub buy_cash: Option<Decimal>,
    pub sell_spot: Option<Decimal>,
    pub sell_cash: Option<Decimal>,

    /// Reference / middle / conversion price
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference: Option<Decimal>,

    /// Release time exactly as displayed by the source
    pub release_time: String,

    /// Denomination the prices are quoted against
    pub base_unit: BaseUnit,
}

impl Quote {
    /// Create a quote with every price unavailable.
    pub fn new(source: SourceId, currency_name: impl Into<String>) -> Self {
        Self {
            source,
            currency_name: currency_name.into(),
            currency_code: None,
            buy_spot: None,
            buy_cash: None,
            sell_spot: None,
            sell_cash: None,
            reference: None,
            release_time: String::new(),
            base_unit: BaseUnit::Hundred,
        }
    }

    /// The price published for `field`.
    pub fn price(&self, field: PriceField) -> Option<Decimal> {
        match field {
            PriceField::BuySpot => self.buy_spot,
            PriceField::BuyCash => self.buy_cash,
            PriceField::SellSpot => self.sell_spot,
            PriceField::SellCash => self.sell_cash,
        }
    }

    /// Display label: "美元 (USD)" or just the name.
    pub fn display_name(&self) -> String {
        match &self.currency_code {
            Some(code) if !self.currency_name.contains(code.as_ref()) => {
                format!("{} ({})", self.currency_name, code)
            }
            _ => self.currency_name.clone(),
        }
    }
}

/// Parse an upstream price cell.
///
/// Accepts thousands separators. Blank cells, "-" placeholders, unparsable
/// text and non-positive values all yield `None`.
pub fn parse_price(raw: &str) -> Option<Decimal> {
    let cleaned = raw.trim().replace(',', "");
    if cleaned.is_empty() || cleaned == "-" || cleaned == "--" {
        return None;
    }
    cleaned
        .parse::<Decimal>()
        .ok()
        .filter(|value| value.is_sign_positive() && !value.is_zero())
}
