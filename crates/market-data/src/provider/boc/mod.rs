//! Bank of China foreign exchange quotation board.
//!
//! A single HTML page listing every currency per 100 units. The server only
//! speaks TLS 1.2 and resets reused connections, so this source runs its own
//! HTTP/1.1 client with pooling disabled.

use std::borrow::Cow;

use async_trait::async_trait;
use log::debug;
use reqwest::header::CONNECTION;
use reqwest::tls::Version;
use reqwest::Client;
use scraper::Html;

use crate::config::FetchConfig;
use crate::errors::MarketDataError;
use crate::models::{parse_price, BaseUnit, Quote};
use crate::provider::decode::{cell, decode_text, locate_table, table_rows};
use crate::provider::http::{fetch, html_request};
use crate::provider::SourceAdapter;
use crate::resolver::{CurrencyResolver, NormalizedQuery};

const PAGE_URL: &str = "https://www.boc.cn/sourcedb/whpj/index.html";
const SOURCE_ID: &str = "BOC";
const TABLE_MARKER: &str = "货币名称";

// Column layout of the quotation table
const COL_NAME: usize = 0;
const COL_BUY_SPOT: usize = 1;
const COL_BUY_CASH: usize = 2;
const COL_SELL_SPOT: usize = 3;
const COL_SELL_CASH: usize = 4;
const COL_REFERENCE: usize = 5;
const COL_DATE: usize = 6;
const COL_TIME: usize = 7;

/// Bank of China quotation board.
pub struct BocSource {
    client: Client,
    resolver: CurrencyResolver,
}

impl BocSource {
    pub fn new(config: &FetchConfig, resolver: CurrencyResolver) -> Self {
        Self {
            client: legacy_tls_client(config),
            resolver,
        }
    }
}

/// TLS 1.2 only, HTTP/1.1 only, no idle connections kept.
///
/// The upstream also insists on an RSA key-exchange CBC suite; the platform
/// TLS backend negotiates it on its own since it cannot be pinned here.
fn legacy_tls_client(config: &FetchConfig) -> Client {
    Client::builder()
        .timeout(config.request_timeout)
        .user_agent(config.user_agent.clone())
        .min_tls_version(Version::TLS_1_2)
        .max_tls_version(Version::TLS_1_2)
        .http1_only()
        .pool_max_idle_per_host(0)
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// Find the first row matching `query` on a decoded board page.
fn parse_board(
    html: &str,
    resolver: &CurrencyResolver,
    query: &NormalizedQuery,
) -> Result<Option<Quote>, MarketDataError> {
    let document = Html::parse_document(html);
    let table = locate_table(SOURCE_ID, &document, TABLE_MARKER)?;
    let rows = table_rows(SOURCE_ID, table)?;

    for cells in rows.iter().skip(1) {
        if cells.len() < 2 {
            continue;
        }
        let name = cell(cells, COL_NAME);
        if !resolver.matches(name, None, query) {
            continue;
        }

        let mut quote = Quote::new(Cow::Borrowed(SOURCE_ID), name);
        quote.currency_code = resolver.code_for_label(name);
        quote.buy_spot = parse_price(cell(cells, COL_BUY_SPOT));
        quote.buy_cash = parse_price(cell(cells, COL_BUY_CASH));
        quote.sell_spot = parse_price(cell(cells, COL_SELL_SPOT));
        quote.sell_cash = parse_price(cell(cells, COL_SELL_CASH));
        quote.reference = parse_price(cell(cells, COL_REFERENCE));
        quote.release_time = release_time(cell(cells, COL_DATE), cell(cells, COL_TIME));
        quote.base_unit = BaseUnit::Hundred;
        return Ok(Some(quote));
    }

    Ok(None)
}

/// Date column, plus the time column unless the date already carries it.
fn release_time(date: &str, time: &str) -> String {
    match (date.is_empty(), time.is_empty()) {
        (true, _) => time.to_string(),
        (false, true) => date.to_string(),
        (false, false) if date.contains(time) => date.to_string(),
        (false, false) => format!("{} {}", date, time),
    }
}

#[async_trait]
impl SourceAdapter for BocSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn key(&self) -> &'static str {
        "boc"
    }

    fn display_name(&self) -> &'static str {
        "中国银行"
    }

    async fn fetch_quote(&self, query: &str) -> Result<Option<Quote>, MarketDataError> {
        let query = self.resolver.normalize(query);
        if query.is_empty() {
            return Ok(None);
        }

        debug!("Fetching BOC quotation board for '{}'", query.target);
        let request = html_request(&self.client, PAGE_URL).header(CONNECTION, "close");
        let fetched = fetch(SOURCE_ID, request).await?;
        let html = decode_text(&fetched.body, fetched.content_type());

        parse_board(&html, &self.resolver, &query)
    }
}
