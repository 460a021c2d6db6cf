//! Ordering of successful quotes by caller intent.

use crate::models::{OrderIntent, RankedQuote};

/// Sort successes by rate and apply `top_n`.
///
/// Ascending for `CheapestToBuy`, descending for `BestToSell`. Equal rates
/// keep a stable order by source id. `top_n` of `None` or `0` keeps every
/// entry.
pub fn rank(
    mut entries: Vec<RankedQuote>,
    intent: OrderIntent,
    top_n: Option<usize>,
) -> Vec<RankedQuote> {
    entries.sort_by(|a, b| {
        let by_rate = match intent {
            OrderIntent::CheapestToBuy => a.rate.cmp(&b.rate),
            OrderIntent::BestToSell => b.rate.cmp(&a.rate),
        };
        by_rate.then_with(|| a.quote.source.cmp(&b.quote.source))
    });

    if let Some(n) = top_n.filter(|n| *n > 0) {
        entries.truncate(n);
    }
    entries
}
