use std::num::NonZeroUsize;

use clap::{Args, Parser, Subcommand, ValueEnum};
use fxrate_market_data::PriceField;

/// Compare foreign-exchange quotes published by Chinese banks.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show one source's quote for a currency
    Quote {
        /// Source key, e.g. "boc" or "cmb"
        source: String,
        /// Currency code, name or synonym
        currency: String,
    },
    /// Query several sources and rank them
    Compare(CompareArgs),
    /// Convert an amount through one source's published prices
    Convert {
        source: String,
        amount: String,
        from: String,
        to: String,
    },
    /// List the available sources
    Sources,
}

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Currency code, name or synonym
    pub currency: String,

    /// Comma-separated source keys (default: all)
    #[arg(long, value_delimiter = ',')]
    pub sources: Option<Vec<String>>,

    /// Keep only the best N entries (N >= 1)
    #[arg(long)]
    pub top: Option<NonZeroUsize>,

    /// Rank for selling foreign currency instead of buying it
    #[arg(long)]
    pub sell: bool,

    /// Price leg to rank by (default depends on --sell)
    #[arg(long, value_enum)]
    pub leg: Option<Leg>,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum Leg {
    BuySpot,
    BuyCash,
    SellSpot,
    SellCash,
}

impl From<Leg> for PriceField {
    fn from(leg: Leg) -> Self {
        match leg {
            Leg::BuySpot => PriceField::BuySpot,
            Leg::BuyCash => PriceField::BuyCash,
            Leg::SellSpot => PriceField::SellSpot,
            Leg::SellCash => PriceField::SellCash,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_compare() {
        let cli = Cli::parse_from([
            "fxrate", "compare", "usd", "--sources", "boc,cmb", "--top", "2", "--sell", "--leg",
            "buy-cash",
        ]);
        match cli.command {
            Command::Compare(args) => {
                assert_eq!(args.currency, "usd");
                assert_eq!(
                    args.sources,
                    Some(vec!["boc".to_string(), "cmb".to_string()])
                );
                assert_eq!(args.top.map(NonZeroUsize::get), Some(2));
                assert!(args.sell);
                assert!(matches!(args.leg, Some(Leg::BuyCash)));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_zero_top_is_rejected() {
        let result = Cli::try_parse_from(["fxrate", "compare", "usd", "--top", "0"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_global_json_flag() {
        let cli = Cli::parse_from(["fxrate", "sources", "--json"]);
        assert!(cli.json);
        assert!(matches!(cli.command, Command::Sources));
    }

    #[test]
    fn test_verify_cli() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
