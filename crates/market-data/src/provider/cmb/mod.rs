//! China Merchants Bank (CMB) FX rate API.

use std::borrow::Cow;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::config::FetchConfig;
use crate::errors::MarketDataError;
use crate::models::{parse_price, BaseUnit, Currency, Quote};
use crate::provider::citic::dotted_release_time;
use crate::provider::http::{decode_json, default_client, fetch, json_request};
use crate::provider::SourceAdapter;
use crate::resolver::{CurrencyResolver, NormalizedQuery};

const API_URL: &str = "https://fx.cmbchina.com/api/v1/fx/rate";
const SOURCE_ID: &str = "CMB";
const SUCCESS_CODE: &str = "SUC0000";

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateResponse {
    #[serde(default)]
    return_code: String,
    error_msg: Option<String>,
    body: Option<Vec<RateRow>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateRow {
    /// Chinese name, e.g. "美元"
    #[serde(default)]
    ccy_nbr: String,
    /// Name and code, e.g. "美元 USD"
    #[serde(default)]
    ccy_nbr_eng: String,
    /// Spot buy
    #[serde(default)]
    rth_bid: String,
    /// Cash buy
    #[serde(default)]
    rtc_bid: String,
    /// Spot sell
    #[serde(default)]
    rth_ofr: String,
    /// Cash sell
    #[serde(default)]
    rtc_ofr: String,
    /// Bank conversion price
    #[serde(default)]
    rtb_bid: String,
    #[serde(default)]
    rat_dat: String,
    #[serde(default)]
    rat_tim: String,
}

/// China Merchants Bank FX rate API.
pub struct CmbSource {
    client: Client,
    resolver: CurrencyResolver,
}

impl CmbSource {
    pub fn new(config: &FetchConfig, resolver: CurrencyResolver) -> Self {
        Self {
            client: default_client(config),
            resolver,
        }
    }
}

/// Code from the letters of the last token: "美元 USD" -> "USD".
fn extract_symbol(eng: &str) -> Option<Currency> {
    let symbol: String = eng
        .split_whitespace()
        .last()?
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_uppercase();
    (!symbol.is_empty()).then_some(Cow::Owned(symbol))
}

fn parse_rows(
    body: &[u8],
    resolver: &CurrencyResolver,
    query: &NormalizedQuery,
) -> Result<Option<Quote>, MarketDataError> {
    let response: RateResponse = decode_json(SOURCE_ID, body)?;
    if !response.return_code.eq_ignore_ascii_case(SUCCESS_CODE) {
        return Err(MarketDataError::Rejected {
            source_id: SOURCE_ID.to_string(),
            code: response.return_code,
            message: response.error_msg.unwrap_or_default(),
        });
    }

    let rows = response.body.ok_or_else(|| MarketDataError::Layout {
        source_id: SOURCE_ID.to_string(),
        message: "body array missing".to_string(),
    })?;

    for row in rows {
        let name = row.ccy_nbr.trim();
        let symbol = extract_symbol(&row.ccy_nbr_eng);
        if !resolver.matches(name, symbol.as_deref(), query) {
            continue;
        }

        let mut quote = Quote::new(Cow::Borrowed(SOURCE_ID), name);
        quote.currency_code = symbol.or_else(|| resolver.code_for_label(name));
        quote.buy_spot = parse_price(&row.rth_bid);
        quote.buy_cash = parse_price(&row.rtc_bid);
        quote.sell_spot = parse_price(&row.rth_ofr);
        quote.sell_cash = parse_price(&row.rtc_ofr);
        quote.reference = parse_price(&row.rtb_bid);
        quote.release_time = dotted_release_time(&row.rat_dat, &row.rat_tim);
        quote.base_unit = BaseUnit::Hundred;
        return Ok(Some(quote));
    }

    Ok(None)
}

#[async_trait]
impl SourceAdapter for CmbSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn key(&self) -> &'static str {
        "cmb"
    }

    fn display_name(&self) -> &'static str {
        "招商银行"
    }

    async fn fetch_quote(&self, query: &str) -> Result<Option<Quote>, MarketDataError> {
        let query = self.resolver.normalize(query);
        if query.is_empty() {
            return Ok(None);
        }

        debug!("Fetching CMB rate listing for '{}'", query.target);
        let fetched = fetch(SOURCE_ID, json_request(&self.client, API_URL)).await?;

        parse_rows(&fetched.body, &self.resolver, &query)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    const LISTING: &str = r#"{
        "returnCode": "SUC0000",
        "errorMsg": null,
        "body": [
            {"ccyNbr": "港币", "ccyNbrEng": "港币 HKD", "rtbBid": "91.03", "rthOfr": "91.34",
             "rtcOfr": "91.34", "rthBid": "90.98", "rtcBid": "90.26",
             "ratTim": "10:28:31", "ratDat": "2024年01月02日"},
            {"ccyNbr": "欧元", "ccyNbrEng": "欧元 EUR", "rtbBid": "782.18", "rthOfr": "787.52",
             "rtcOfr": "787.52", "rthBid": "781.79", "rtcBid": "757.47",
             "ratTim": "10:28:31", "ratDat": "2024年01月02日"}
        ]
    }"#;

    fn lookup(body: &str, query: &str) -> Result<Option<Quote>, MarketDataError> {
        let resolver = CurrencyResolver::default();
        let normalized = resolver.normalize(query);
        parse_rows(body.as_bytes(), &resolver, &normalized)
    }

    #[test]
    fn test_provider_identity() {
        let source = CmbSource::new(&FetchConfig::default(), CurrencyResolver::default());
        assert_eq!(source.id(), "CMB");
        assert_eq!(source.key(), "cmb");
    }

    #[test]
    fn test_extract_symbol() {
        assert_eq!(extract_symbol("美元 USD").as_deref(), Some("USD"));
        assert_eq!(extract_symbol("  日元 (jpy) ").as_deref(), Some("JPY"));
        assert_eq!(extract_symbol("  ").as_deref(), None);
    }

    #[test]
    fn test_field_mapping() {
        let quote = lookup(LISTING, "eur").unwrap().unwrap();
        assert_eq!(quote.currency_name, "欧元");
        assert_eq!(quote.currency_code.as_deref(), Some("EUR"));
        assert_eq!(quote.buy_spot, Some(dec!(781.79)));
        assert_eq!(quote.buy_cash, Some(dec!(757.47)));
        assert_eq!(quote.sell_spot, Some(dec!(787.52)));
        assert_eq!(quote.sell_cash, Some(dec!(787.52)));
        assert_eq!(quote.reference, Some(dec!(782.18)));
        assert_eq!(quote.release_time, "2024.01.02 10:28:31");
    }

    #[test]
    fn test_failure_code_is_rejected() {
        let body = r#"{"returnCode": "ERR0001", "errorMsg": "系统繁忙", "body": null}"#;
        assert!(matches!(
            lookup(body, "usd"),
            Err(MarketDataError::Rejected { .. })
        ));
    }

    #[test]
    fn test_unlisted_currency() {
        assert!(lookup(LISTING, "usd").unwrap().is_none());
    }
}
