//! China CITIC Bank (CITIC) foreign exchange rate endpoint.
//!
//! JSON listing with spot legs only; cash prices are not published.

use std::borrow::Cow;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use serde::Deserialize;

use crate::config::FetchConfig;
use crate::errors::MarketDataError;
use crate::models::{parse_price, BaseUnit, Quote};
use crate::provider::http::{decode_json, default_client, fetch, json_request};
use crate::provider::SourceAdapter;
use crate::resolver::{CurrencyResolver, NormalizedQuery};

const API_URL: &str = "https://etrade.citicbank.com/portalweb/cms/getForeignExchRate.htm";
const SOURCE_ID: &str = "CITIC";
const SUCCESS_CODE: &str = "AAAAAAA";

// ============================================================================
// API Response Structures
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateResponse {
    #[serde(default)]
    ret_code: String,
    #[serde(default)]
    ret_msg: String,
    content: Option<RateContent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateContent {
    result_list: Option<Vec<RateItem>>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RateItem {
    #[serde(default)]
    cur_name: String,
    #[serde(default)]
    cur_code: String,
    /// Customer sells foreign currency
    #[serde(default)]
    cstexc_buy_price: String,
    /// Customer buys foreign currency
    #[serde(default)]
    cstexc_sell_price: String,
    #[serde(default)]
    quote_price_date: String,
    #[serde(default)]
    quote_price_time: String,
}

/// China CITIC Bank rate endpoint.
pub struct CiticSource {
    client: Client,
    resolver: CurrencyResolver,
}

impl CiticSource {
    pub fn new(config: &FetchConfig, resolver: CurrencyResolver) -> Self {
        Self {
            client: default_client(config),
            resolver,
        }
    }
}

/// "2024年01月02日" + "10:30:00" -> "2024.01.02 10:30:00"
pub(crate) fn dotted_release_time(date: &str, time: &str) -> String {
    let date = date
        .trim()
        .replace(['年', '月'], ".")
        .replace('日', "");
    let date = date.trim_end_matches('.').trim();
    let time = time.trim();

    match (date.is_empty(), time.is_empty()) {
        (true, _) => time.to_string(),
        (false, true) => date.to_string(),
        (false, false) => format!("{} {}", date, time),
    }
}

fn parse_rows(
    body: &[u8],
    resolver: &CurrencyResolver,
    query: &NormalizedQuery,
) -> Result<Option<Quote>, MarketDataError> {
    let response: RateResponse = decode_json(SOURCE_ID, body)?;
    if !response.ret_code.eq_ignore_ascii_case(SUCCESS_CODE) {
        return Err(MarketDataError::Rejected {
            source_id: SOURCE_ID.to_string(),
            code: response.ret_code,
            message: response.ret_msg,
        });
    }

    let items = response
        .content
        .and_then(|content| content.result_list)
        .ok_or_else(|| MarketDataError::Layout {
            source_id: SOURCE_ID.to_string(),
            message: "content.resultList missing".to_string(),
        })?;

    for item in items {
        let name = item.cur_name.trim();
        let code = match item.cur_code.trim() {
            code if code.len() == 3 && code.chars().all(|c| c.is_ascii_alphabetic()) => {
                Some(Cow::Owned(code.to_uppercase()))
            }
            _ => resolver.code_for_label(name),
        };
        if !resolver.matches(name, code.as_deref(), query) {
            continue;
        }

        let mut quote = Quote::new(Cow::Borrowed(SOURCE_ID), name);
        quote.currency_code = code;
        quote.buy_spot = parse_price(&item.cstexc_buy_price);
        quote.sell_spot = parse_price(&item.cstexc_sell_price);
        quote.release_time = dotted_release_time(&item.quote_price_date, &item.quote_price_time);
        quote.base_unit = BaseUnit::Hundred;
        return Ok(Some(quote));
    }

    Ok(None)
}

#[async_trait]
impl SourceAdapter for CiticSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn key(&self) -> &'static str {
        "citic"
    }

    fn display_name(&self) -> &'static str {
        "中信银行"
    }

    async fn fetch_quote(&self, query: &str) -> Result<Option<Quote>, MarketDataError> {
        let query = self.resolver.normalize(query);
        if query.is_empty() {
            return Ok(None);
        }

        debug!("Fetching CITIC rate listing for '{}'", query.target);
        let fetched = fetch(SOURCE_ID, json_request(&self.client, API_URL)).await?;

        parse_rows(&fetched.body, &self.resolver, &query)
    }
}
