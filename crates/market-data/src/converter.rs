//! Single-source amount conversion between the domestic currency and one
//! foreign currency.
//!
//! The customer's side decides the leg: buying foreign currency uses the
//! source's sell prices, selling it uses the buy prices. Spot is preferred,
//! cash is the fallback. Foreign-to-foreign conversion is not offered since
//! no source publishes a direct cross rate.

use std::borrow::Cow;
use std::sync::Arc;

use log::debug;
use rust_decimal::Decimal;

use crate::errors::MarketDataError;
use crate::models::{ConversionRequest, ConversionResult, Currency, PriceField, Quote};
use crate::registry::SourceRegistry;
use crate::resolver::CurrencyResolver;

/// Which way money flows across the domestic border.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Direction {
    /// Domestic amount in, foreign amount out (sell legs)
    ToForeign,
    /// Foreign amount in, domestic amount out (buy legs)
    ToDomestic,
}

impl Direction {
    /// Legs tried in order.
    fn legs(&self) -> [PriceField; 2] {
        match self {
            Self::ToForeign => [PriceField::SellSpot, PriceField::SellCash],
            Self::ToDomestic => [PriceField::BuySpot, PriceField::BuyCash],
        }
    }
}

/// How a request resolves before any lookup.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ConversionPlan {
    /// Same currency on both sides
    Identity { code: String },
    /// Look `foreign` up and convert in `direction`
    Quote {
        foreign: String,
        direction: Direction,
    },
}

/// One side of a request after resolution.
struct Side {
    key: String,
    code: Option<Currency>,
    domestic: bool,
}

impl Side {
    fn resolve(resolver: &CurrencyResolver, raw: &str) -> Self {
        let normalized = resolver.normalize(raw);
        let table = resolver.table();
        let code = normalized
            .code
            .clone()
            .filter(|code| table.by_code(code).is_some())
            .or_else(|| table.find(&normalized.key).map(|c| c.code.clone()));
        let domestic = table.is_domestic(&normalized.key);
        Self {
            key: normalized.key,
            code,
            domestic,
        }
    }

    fn label(&self) -> String {
        match &self.code {
            Some(code) => code.to_string(),
            None => self.key.to_uppercase(),
        }
    }

    fn same_as(&self, other: &Side) -> bool {
        match (&self.code, &other.code) {
            (Some(a), Some(b)) => a.eq_ignore_ascii_case(b),
            _ => self.key == other.key,
        }
    }
}

/// Decide how to serve a request without touching the network.
pub fn plan(
    resolver: &CurrencyResolver,
    from: &str,
    to: &str,
) -> Result<ConversionPlan, MarketDataError> {
    let from = Side::resolve(resolver, from);
    let to = Side::resolve(resolver, to);

    if from.key.is_empty() || to.key.is_empty() {
        return Err(MarketDataError::InvalidInput(
            "both currencies are required".to_string(),
        ));
    }
    if from.same_as(&to) {
        return Ok(ConversionPlan::Identity { code: from.label() });
    }

    match (from.domestic, to.domestic) {
        (true, false) => Ok(ConversionPlan::Quote {
            foreign: to.key,
            direction: Direction::ToForeign,
        }),
        (false, true) => Ok(ConversionPlan::Quote {
            foreign: from.key,
            direction: Direction::ToDomestic,
        }),
        _ => Err(MarketDataError::ConversionUnsupported(format!(
            "{} -> {}: only conversions to or from {} are supported",
            from.label(),
            to.label(),
            resolver.table().domestic()
        ))),
    }
}

/// Convert against an already normalized (per-100) quote.
pub fn convert_with_quote(
    request: &ConversionRequest,
    quote: &Quote,
    direction: Direction,
) -> Result<ConversionResult, MarketDataError> {
    let (field, rate) = direction
        .legs()
        .into_iter()
        .find_map(|field| quote.price(field).map(|rate| (field, rate)))
        .ok_or_else(|| {
            MarketDataError::ConversionUnsupported(format!(
                "{} publishes neither spot nor cash {} for {}",
                quote.source,
                match direction {
                    Direction::ToForeign => "sell price",
                    Direction::ToDomestic => "buy price",
                },
                quote.display_name()
            ))
        })?;

    let converted = match direction {
        Direction::ToDomestic => request
            .amount
            .checked_mul(rate)
            .and_then(|v| v.checked_div(Decimal::ONE_HUNDRED)),
        Direction::ToForeign => request
            .amount
            .checked_div(rate)
            .and_then(|v| v.checked_mul(Decimal::ONE_HUNDRED)),
    }
    .ok_or_else(|| {
        MarketDataError::InvalidInput(format!("amount out of range: {}", request.amount))
    })?;

    Ok(ConversionResult {
        source: quote.source.clone(),
        from: request.from.trim().to_uppercase(),
        to: request.to.trim().to_uppercase(),
        amount: request.amount,
        converted,
        price_field: Some(field),
        rate: Some(rate),
        release_time: Some(quote.release_time.clone()),
        currency_name: Some(quote.display_name()),
    })
}

/// Converts amounts using one source's published prices.
pub struct CurrencyConverter {
    registry: Arc<SourceRegistry>,
}

impl CurrencyConverter {
    pub fn new(registry: Arc<SourceRegistry>) -> Self {
        Self { registry }
    }

    /// Convert `request.amount` from `request.from` to `request.to`.
    ///
    /// Input is validated before any network call. A same-currency request
    /// is answered as an identity for any source key, registered or not;
    /// every other request needs a registered source and propagates its
    /// lookup errors.
    pub async fn convert(
        &self,
        request: &ConversionRequest,
    ) -> Result<ConversionResult, MarketDataError> {
        if request.amount.is_sign_negative() && !request.amount.is_zero() {
            return Err(MarketDataError::InvalidInput(format!(
                "amount must not be negative: {}",
                request.amount
            )));
        }
        let resolver = self.registry.resolver();

        let (foreign, direction) = match plan(resolver, &request.from, &request.to)? {
            ConversionPlan::Identity { code } => {
                let source = match self.registry.get(&request.source) {
                    Ok(source) => Cow::Borrowed(source.id()),
                    Err(_) => Cow::Owned(request.source.trim().to_string()),
                };
                return Ok(ConversionResult {
                    source,
                    from: code.clone(),
                    to: code,
                    amount: request.amount,
                    converted: request.amount,
                    price_field: None,
                    rate: None,
                    release_time: None,
                    currency_name: None,
                });
            }
            ConversionPlan::Quote { foreign, direction } => (foreign, direction),
        };
        let source = self.registry.get(&request.source)?;

        debug!(
            "Converting {} {} -> {} via {}",
            request.amount,
            request.from,
            request.to,
            source.id()
        );
        let quote = self
            .registry
            .fetch_quote(source.id(), &foreign)
            .await?
            .ok_or_else(|| {
                MarketDataError::ConversionUnsupported(format!(
                    "{} does not list {}",
                    source.id(),
                    foreign.to_uppercase()
                ))
            })?;

        let mut result = convert_with_quote(request, &quote, direction)?;
        result.from = Side::resolve(resolver, &request.from).label();
        result.to = Side::resolve(resolver, &request.to).label();
        Ok(result)
    }
}
