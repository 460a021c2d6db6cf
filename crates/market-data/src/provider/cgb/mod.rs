//! China Guangfa Bank (CGB) exchange price page.
//!
//! Served in a legacy Chinese encoding, so the body is transcoded before
//! parsing. Unlike the other boards, each row declares its own base unit:
//! most currencies are quoted per 100 units, a few per single unit.

use std::borrow::Cow;

use async_trait::async_trait;
use log::debug;
use reqwest::Client;
use scraper::Html;

use crate::config::FetchConfig;
use crate::errors::MarketDataError;
use crate::models::{parse_price, BaseUnit, Quote};
use crate::provider::decode::{cell, decode_text, first_text, selector, table_rows};
use crate::provider::http::{default_client, fetch, html_request};
use crate::provider::SourceAdapter;
use crate::resolver::{CurrencyResolver, NormalizedQuery};

const PAGE_URL: &str = "https://www.cgbchina.com.cn/searchExchangePrice.gsp?internal_time=14";
const SOURCE_ID: &str = "CGB";
const TABLE_SELECTOR: &str = "table.ratetable";
const RELEASE_SELECTOR: &str = "span._times";
const RELEASE_PREFIX: &str = "发布时间为：";

const COL_NAME: usize = 0;
const COL_CODE: usize = 1;
const COL_UNIT: usize = 2;
const COL_MIDDLE: usize = 3;
const COL_BUY_SPOT: usize = 4;
const COL_BUY_CASH: usize = 5;
const COL_SELL_SPOT: usize = 6;
const COL_SELL_CASH: usize = 7;
const ROW_WIDTH: usize = 8;

/// China Guangfa Bank exchange price page.
pub struct CgbSource {
    client: Client,
    resolver: CurrencyResolver,
}

impl CgbSource {
    pub fn new(config: &FetchConfig, resolver: CurrencyResolver) -> Self {
        Self {
            client: default_client(config),
            resolver,
        }
    }
}

/// "美元/人民币" -> "美元"
fn before_slash(text: &str) -> &str {
    text.split('/').next().unwrap_or(text).trim()
}

fn parse_page(
    html: &str,
    resolver: &CurrencyResolver,
    query: &NormalizedQuery,
) -> Result<Option<Quote>, MarketDataError> {
    let document = Html::parse_document(html);

    let release_time = first_text(SOURCE_ID, &document, RELEASE_SELECTOR)?
        .map(|text| text.trim_start_matches(RELEASE_PREFIX).trim().to_string())
        .filter(|text| !text.is_empty())
        .ok_or_else(|| MarketDataError::Layout {
            source_id: SOURCE_ID.to_string(),
            message: "release time banner missing".to_string(),
        })?;

    let table_sel = selector(SOURCE_ID, TABLE_SELECTOR)?;
    let table = document
        .select(&table_sel)
        .next()
        .ok_or_else(|| MarketDataError::Layout {
            source_id: SOURCE_ID.to_string(),
            message: "rate table missing".to_string(),
        })?;

    for cells in table_rows(SOURCE_ID, table)?.iter().skip(1) {
        if cells.len() < ROW_WIDTH {
            continue;
        }
        let name = before_slash(cell(cells, COL_NAME));
        let code = before_slash(cell(cells, COL_CODE));
        if !resolver.matches(name, Some(code), query) {
            continue;
        }

        let mut quote = Quote::new(Cow::Borrowed(SOURCE_ID), name);
        quote.currency_code = if code.is_empty() {
            resolver.code_for_label(name)
        } else {
            Some(Cow::Owned(code.to_uppercase()))
        };
        quote.base_unit = BaseUnit::parse(cell(cells, COL_UNIT));
        quote.reference = parse_price(cell(cells, COL_MIDDLE));
        quote.buy_spot = parse_price(cell(cells, COL_BUY_SPOT));
        quote.buy_cash = parse_price(cell(cells, COL_BUY_CASH));
        quote.sell_spot = parse_price(cell(cells, COL_SELL_SPOT));
        quote.sell_cash = parse_price(cell(cells, COL_SELL_CASH));
        quote.release_time = release_time;
        return Ok(Some(quote));
    }

    Ok(None)
}

#[async_trait]
impl SourceAdapter for CgbSource {
    fn id(&self) -> &'static str {
        SOURCE_ID
    }

    fn key(&self) -> &'static str {
        "cgb"
    }

    fn display_name(&self) -> &'static str {
        "广发银行"
    }

    async fn fetch_quote(&self, query: &str) -> Result<Option<Quote>, MarketDataError> {
        let query = self.resolver.normalize(query);
        if query.is_empty() {
            return Ok(None);
        }

        debug!("Fetching CGB exchange price page for '{}'", query.target);
        let fetched = fetch(SOURCE_ID, html_request(&self.client, PAGE_URL)).await?;
        let html = decode_text(&fetched.body, fetched.content_type());

        parse_page(&html, &self.resolver, &query)
    }
}
