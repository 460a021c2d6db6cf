//! Plain-text rendering of quotes, aggregations and conversions.

use std::fmt::Write;

use fxrate_market_data::{AggregatedResult, ConversionResult, OrderIntent, PriceField, Quote};
use rust_decimal::Decimal;

/// Decimal places shown for rates.
const RATE_DP: u32 = 4;
/// Decimal places shown for amounts.
const AMOUNT_DP: u32 = 2;

fn price(value: Option<Decimal>) -> String {
    value
        .map(|v| v.round_dp(RATE_DP).normalize().to_string())
        .unwrap_or_else(|| "-".to_string())
}

fn or_dash(text: &str) -> &str {
    if text.trim().is_empty() {
        "-"
    } else {
        text
    }
}

pub fn quote(source_name: &str, quote: &Quote) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} {} (per 100)", source_name, quote.display_name());
    let _ = writeln!(out, "  buy spot:   {}", price(quote.buy_spot));
    let _ = writeln!(out, "  buy cash:   {}", price(quote.buy_cash));
    let _ = writeln!(out, "  sell spot:  {}", price(quote.sell_spot));
    let _ = writeln!(out, "  sell cash:  {}", price(quote.sell_cash));
    if quote.reference.is_some() {
        let _ = writeln!(out, "  reference:  {}", price(quote.reference));
    }
    let _ = write!(out, "  released:   {}", or_dash(&quote.release_time));
    out
}

pub fn aggregate(
    currency: &str,
    intent: OrderIntent,
    leg: PriceField,
    result: &AggregatedResult,
) -> String {
    let mut out = String::new();
    let heading = match intent {
        OrderIntent::CheapestToBuy => "cheapest to buy",
        OrderIntent::BestToSell => "best to sell",
    };
    let label = result
        .currency_name()
        .unwrap_or_else(|| currency.to_string());
    let _ = writeln!(out, "{}: {} by {} (per 100)", label, heading, leg);

    if result.is_empty() {
        let _ = writeln!(out, "  no source returned a usable {}", leg);
    }
    for (i, entry) in result.ranked.iter().enumerate() {
        let _ = writeln!(
            out,
            "  {}. {:<9} {:>12}  {}",
            i + 1,
            entry.quote.source,
            price(Some(entry.rate)),
            or_dash(&entry.quote.release_time)
        );
    }
    if result.success_count > result.ranked.len() {
        let _ = writeln!(
            out,
            "  ({} more not shown)",
            result.success_count - result.ranked.len()
        );
    }
    if !result.timeouts.is_empty() {
        let ids: Vec<&str> = result.timeouts.iter().map(|s| s.as_ref()).collect();
        let _ = writeln!(out, "  timed out: {}", ids.join(", "));
    }
    if !result.misses.is_empty() {
        let ids: Vec<&str> = result.misses.iter().map(|s| s.as_ref()).collect();
        let _ = writeln!(out, "  no data:   {}", ids.join(", "));
    }
    out.trim_end().to_string()
}

pub fn conversion(result: &ConversionResult) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {} = {} {}",
        result.amount.round_dp(AMOUNT_DP),
        result.from,
        result.converted.round_dp(AMOUNT_DP),
        result.to
    );
    match (result.price_field, result.rate) {
        (Some(field), Some(rate)) => {
            let _ = writeln!(
                out,
                "  {} {} {} (per 100, {})",
                result.source,
                result.currency_name.as_deref().unwrap_or_default(),
                price(Some(rate)),
                field
            );
            let _ = write!(
                out,
                "  leg: {}, released {}",
                result.leg_label(),
                or_dash(result.release_time.as_deref().unwrap_or_default())
            );
        }
        _ => {
            let _ = write!(out, "  leg: {}", result.leg_label());
        }
    }
    out
}
