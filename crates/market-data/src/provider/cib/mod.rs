//! Industrial Bank (CIB) quotation service.
//!
//! Two requests per lookup: the public page sets the session cookie and
//! carries the release banner, then the JSON listing endpoint returns the
//! rows. The listing refuses requests without the page's cookie.

use std::borrow::Cow;

use async_trait::async_trait;
use chrono::Utc;
use log::debug;
use reqwest::header::COOKIE;
use reqwest::{Client, RequestBuilder};
use scraper::Html;
use serde::Deserialize;
use serde_json::Value;

use crate::config::FetchConfig;
use crate::errors::MarketDataError;
use crate::models::{parse_price, BaseUnit, Quote};
use crate::provider::decode::{cell, decode_text, first_text};
use crate::provider::http::{decode_json, default_client, fetch, html_request, json_request};
use crate::provider::SourceAdapter;
use crate::resolver::{CurrencyResolver, NormalizedQuery};

const PAGE_URL: &str = "https://personalbank.cib.com.cn/pers/main/pubinfo/ifxQuotationQuery.do";
const LIST_URL: &str = "https://personalbank.cib.com.cn/pers/main/pubinfo/ifxQuotationQuery/list";
const SOURCE_ID: &str = "CIB";
const BANNER_SELECTOR: &str = ".labe_text";

// ============================================================================
// API Response Structures
// ============================================================================

/// Listing payload: a jqGrid data set
#[derive(Debug, Deserialize)]
struct ListResponse {
    rows: Option<Vec<ListRow>>,
}

/// Cells are [name, code, unit, buySpot, sellSpot, buyCash, sellCash]
#[derive(Debug, Deserialize)]
struct ListRow {
    #[serde(default)]
    cell: Vec<Value>,
}

const COL_NAME: usize = 0;
const COL_CODE: usize = 1;
const COL_UNIT: usize = 2;
const COL_BUY_SPOT: usize = 3;
const COL_SELL_SPOT: usize = 4;
const COL_BUY_CASH: usize = 5;
const COL_SELL_CASH: usize = 6;
const ROW_WIDTH: usize = 7;

/// Industrial Bank quotation service.
pub struct CibSource {
    client: Client,
    resolver: CurrencyResolver,
}

impl CibSource {
    pub fn new(config: &FetchConfig, resolver: CurrencyResolver) -> Self {
        Self {
            client: default_client(config),
            resolver,
        }
    }

    fn list_url(now_millis: i64) -> String {
        format!(
            "{}?_search=false&dataSet.nd={}&dataSet.rows=80&dataSet.page=1&dataSet.sidx=&dataSet.sord=asc",
            LIST_URL, now_millis
        )
    }

    /// Listing request carrying the landing page's session cookie.
    fn list_request(&self, cookie: &str, now_millis: i64) -> RequestBuilder {
        let request = json_request(&self.client, &Self::list_url(now_millis));
        if cookie.is_empty() {
            request
        } else {
            request.header(COOKIE, cookie)
        }
    }
}

/// Clean the page banner into a release-time string.
///
/// "日期：2024年01月02日 星期二 10:30:00" becomes "2024-01-02 10:30:00".
fn clean_banner(raw: &str) -> String {
    let without_prefix = raw.replace("日期：", " ");
    without_prefix
        .split_whitespace()
        .filter(|token| !token.contains("星期"))
        .collect::<Vec<_>>()
        .join(" ")
        .replace('年', "-")
        .replace('月', "-")
        .replace('日', "")
        .trim()
        .to_string()
}

fn parse_banner(html: &str) -> Result<String, MarketDataError> {
    let document = Html::parse_document(html);
    let raw = first_text(SOURCE_ID, &document, BANNER_SELECTOR)?;
    Ok(raw.map(|text| clean_banner(&text)).unwrap_or_default())
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.trim().to_string(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn parse_rows(
    body: &[u8],
    release_time: &str,
    resolver: &CurrencyResolver,
    query: &NormalizedQuery,
) -> Result<Option<Quote>, MarketDataError> {
    let response: ListResponse = decode_json(SOURCE_ID, body)?;
    let rows = response.rows.ok_or_else(|| MarketDataError::Layout {
        source_id: SOURCE_ID.to_string(),
        message: "listing has no rows array".to_string(),
    })?;

    for row in rows {
        if row.cell.len() < ROW_WIDTH {
            continue;
        }
        let cells: Vec<String> = row.cell.iter().map(cell_text).collect();
        let code = cell(&cells, COL_CODE);
        let name = match cell(&cells, COL_NAME) {
            "" => code,
            name => name,
        };
        if !resolver.matches(name, Some(code), query) {
            continue;
        }

        let mut quote = Quote::new(Cow::Borrowed(SOURCE_ID), name);
        quote.currency_code = if code.is_empty() {
            resolver.code_for_label(name)
        } else {
            Some(Cow::Owned(code.to_uppercase()))
        };
        quote.buy_spot = parse_price(cell(&cells, COL_BUY_SPOT));
        quote.sell_spot = parse_price(cell(&cells, COL_SELL_SPOT));
        quote.buy_cash = parse_price(cell(&cells, COL_BUY_CASH));
        quote.sell_cash = parse_price(cell(&cells, COL_SELL_CASH));
        quote.base_unit = BaseUnit::parse(cell(&cells, COL_UNIT));
        quote.release_time = release_time.to_string();
        return Ok(Some(quote));
    }

    Ok(None)
}

#[async_trait]
impl SourceAdapter for CibSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn key(&self) -> &'static str {
        "cib"
    }

    fn display_name(&self) -> &'static str {
        "兴业银行"
    }

    async fn fetch_quote(&self, query: &str) -> Result<Option<Quote>, MarketDataError> {
        let query = self.resolver.normalize(query);
        if query.is_empty() {
            return Ok(None);
        }

        debug!("Fetching CIB session page for '{}'", query.target);
        let page = fetch(SOURCE_ID, html_request(&self.client, PAGE_URL)).await?;
        let cookie = page.cookie_header();
        let release_time = parse_banner(&decode_text(&page.body, page.content_type()))?;

        let request = self.list_request(&cookie, Utc::now().timestamp_millis());
        let listing = fetch(SOURCE_ID, request).await?;

        parse_rows(&listing.body, &release_time, &self.resolver, &query)
    }
}
