//! Scripted adapters for registry, aggregator and converter tests.

use std::borrow::Cow;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;

use crate::errors::MarketDataError;
use crate::models::Quote;
use crate::provider::SourceAdapter;

/// What a mock source does when asked for a quote.
#[derive(Clone, Debug)]
pub enum Script {
    /// Answer with this quote after the delay
    Answer(Duration, Quote),
    /// Report the currency as not listed
    NotListed,
    /// Fail with a layout error
    Broken,
}

pub struct MockSource {
    pub id: &'static str,
    pub key: &'static str,
    pub script: Script,
    pub calls: AtomicUsize,
}

impl MockSource {
    pub fn new(id: &'static str, key: &'static str, script: Script) -> Self {
        Self {
            id,
            key,
            script,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

/// A per-100 quote with the given legs.
pub fn quote(
    source: &'static str,
    buy_spot: Option<rust_decimal::Decimal>,
    buy_cash: Option<rust_decimal::Decimal>,
    sell_spot: Option<rust_decimal::Decimal>,
    sell_cash: Option<rust_decimal::Decimal>,
) -> Quote {
    let mut quote = Quote::new(Cow::Borrowed(source), "美元");
    quote.currency_code = Some(Cow::Borrowed("USD"));
    quote.buy_spot = buy_spot;
    quote.buy_cash = buy_cash;
    quote.sell_spot = sell_spot;
    quote.sell_cash = sell_cash;
    quote.release_time = "2024-01-02 10:00".to_string();
    quote
}

#[async_trait]
impl SourceAdapter for MockSource {
    fn id(&self) -> &'static str {
        self.id
    }

    fn key(&self) -> &'static str {
        self.key
    }

    fn display_name(&self) -> &'static str {
        "测试银行"
    }

    async fn fetch_quote(&self, _query: &str) -> Result<Option<Quote>, MarketDataError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.script {
            Script::Answer(delay, quote) => {
                tokio::time::sleep(*delay).await;
                Ok(Some(quote.clone()))
            }
            Script::NotListed => Ok(None),
            Script::Broken => Err(MarketDataError::Layout {
                source_id: self.id.to_string(),
                message: "rate table missing".to_string(),
            }),
        }
    }
}
