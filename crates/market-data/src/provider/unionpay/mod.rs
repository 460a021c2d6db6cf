//! UnionPay International card settlement rates.
//!
//! One JSON document per day at `jfimg/YYYYMMDD.json`. Today's file is
//! published some time after midnight, so a missing file falls back to the
//! previous day's. Rates are per single unit.
//!
//! The document lists directed pairs. For a foreign currency X:
//! - `X -> CNY` (1 X = r CNY) gives the buy legs and the reference price
//! - `CNY -> X` (1 CNY = r X) gives the sell legs as `1 / r`

use std::borrow::Cow;
use std::future::Future;

use async_trait::async_trait;
use chrono::{Local, NaiveDate};
use log::{debug, warn};
use reqwest::Client;
use rust_decimal::Decimal;
use serde::Deserialize;

use crate::config::FetchConfig;
use crate::errors::MarketDataError;
use crate::models::{BaseUnit, Currency, Quote};
use crate::provider::http::{decode_json, default_client, fetch, json_request};
use crate::provider::SourceAdapter;
use crate::resolver::{CurrencyResolver, NormalizedQuery};

const BASE_URL: &str = "https://m.unionpayintl.com/jfimg/";
const SOURCE_ID: &str = "UNIONPAY";

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateDocument {
    exchange_rate_json: Option<Vec<RateEntry>>,
    #[serde(default)]
    cur_date: String,
}

/// 1 `trans_cur` = `rate_data` `base_cur`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateEntry {
    trans_cur: String,
    base_cur: String,
    rate_data: f64,
}

/// UnionPay International settlement rates.
pub struct UnionPaySource {
    client: Client,
    resolver: CurrencyResolver,
}

impl UnionPaySource {
    pub fn new(config: &FetchConfig, resolver: CurrencyResolver) -> Self {
        Self {
            client: default_client(config),
            resolver,
        }
    }

    /// Fetch the newest published document: today's, then yesterday's.
    async fn fetch_document(&self) -> Result<RateDocument, MarketDataError> {
        let urls = candidate_urls(BASE_URL, Local::now().date_naive());
        let client = &self.client;
        first_available(&urls, |url| async move {
            fetch(SOURCE_ID, json_request(client, &url))
                .await
                .map(|fetched| fetched.body)
        })
        .await
    }
}

/// Try each candidate in order and return the first document that decodes.
///
/// Any failure (status, transport, decode) moves on to the next candidate;
/// when all fail the last error is returned.
async fn first_available<F, Fut>(
    urls: &[String],
    mut fetch_body: F,
) -> Result<RateDocument, MarketDataError>
where
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<Vec<u8>, MarketDataError>>,
{
    let mut last_error = None;

    for (attempt, url) in urls.iter().enumerate() {
        debug!("Fetching UnionPay rate document {} (attempt {})", url, attempt + 1);
        let result = match fetch_body(url.clone()).await {
            Ok(body) => decode_json::<RateDocument>(SOURCE_ID, &body),
            Err(e) => Err(e),
        };
        match result {
            Ok(document) => return Ok(document),
            Err(e) => {
                if attempt + 1 < urls.len() {
                    warn!("UnionPay document {} unavailable, trying previous day: {}", url, e);
                }
                last_error = Some(e);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| MarketDataError::Layout {
        source_id: SOURCE_ID.to_string(),
        message: "no rate document candidates".to_string(),
    }))
}

/// Document URLs to try, newest first. Bounded to two attempts.
fn candidate_urls(base: &str, today: NaiveDate) -> Vec<String> {
    std::iter::once(Some(today))
        .chain(std::iter::once(today.pred_opt()))
        .flatten()
        .map(|date| format!("{}{}.json", base, date.format("%Y%m%d")))
        .collect()
}

fn positive_rate(value: f64) -> Option<Decimal> {
    Decimal::try_from(value)
        .ok()
        .filter(|rate| rate.is_sign_positive() && !rate.is_zero())
}

/// Resolve the ISO code a query refers to.
fn query_code(resolver: &CurrencyResolver, query: &NormalizedQuery) -> Option<Currency> {
    query
        .code
        .clone()
        .filter(|code| resolver.table().by_code(code).is_some())
        .or_else(|| resolver.code_for_label(&query.target))
}

fn build_quote(
    document: RateDocument,
    resolver: &CurrencyResolver,
    query: &NormalizedQuery,
) -> Result<Option<Quote>, MarketDataError> {
    let entries = document.exchange_rate_json.ok_or_else(|| MarketDataError::Layout {
        source_id: SOURCE_ID.to_string(),
        message: "exchangeRateJson missing".to_string(),
    })?;

    let table = resolver.table();
    let Some(code) = query_code(resolver, query) else {
        return Ok(None);
    };
    if table.is_domestic(&code) {
        return Ok(None);
    }
    let domestic = table.domestic();

    let mut inbound = None;
    let mut outbound = None;
    for entry in &entries {
        let from = entry.trans_cur.trim();
        let to = entry.base_cur.trim();
        if inbound.is_none() && from.eq_ignore_ascii_case(&code) && to.eq_ignore_ascii_case(domestic) {
            inbound = positive_rate(entry.rate_data);
        } else if outbound.is_none()
            && from.eq_ignore_ascii_case(domestic)
            && to.eq_ignore_ascii_case(&code)
        {
            outbound = positive_rate(entry.rate_data)
                .and_then(|rate| Decimal::ONE.checked_div(rate));
        }
    }

    if inbound.is_none() && outbound.is_none() {
        return Ok(None);
    }

    let name = table
        .by_code(&code)
        .map(|identity| identity.name.to_string())
        .unwrap_or_else(|| code.to_string());

    let mut quote = Quote::new(Cow::Borrowed(SOURCE_ID), name);
    quote.currency_code = Some(code);
    quote.buy_spot = inbound;
    quote.buy_cash = inbound;
    quote.reference = inbound;
    quote.sell_spot = outbound;
    quote.sell_cash = outbound;
    quote.release_time = document.cur_date;
    quote.base_unit = BaseUnit::One;
    Ok(Some(quote))
}

#[async_trait]
impl SourceAdapter for UnionPaySource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn key(&self) -> &'static str {
        "unionpay"
    }

    fn display_name(&self) -> &'static str {
        "银联国际"
    }

    async fn fetch_quote(&self, query: &str) -> Result<Option<Quote>, MarketDataError> {
        let query = self.resolver.normalize(query);
        if query.is_empty() {
            return Ok(None);
        }

        let document = self.fetch_document().await?;
        build_quote(document, &self.resolver, &query)
    }
}
