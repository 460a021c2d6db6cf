//! fxrate command-line front end.

mod cli;
mod config;
mod render;

use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use fxrate_market_data::{
    AggregateRequest, Aggregator, ConversionRequest, CurrencyConverter, OrderIntent,
    SourceRegistry,
};
use tracing_subscriber::prelude::*;
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::{Cli, Command, CompareArgs};
use crate::config::Config;

pub fn init_tracing() {
    let log_format = std::env::var("FXRATE_LOG_FORMAT").unwrap_or_else(|_| "text".to_string());
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    if log_format.eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().json().with_current_span(false).with_writer(std::io::stderr))
            .init();
    } else {
        registry
            .with(
                fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .with_writer(std::io::stderr),
            )
            .init();
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = Config::from_env();
    let registry = Arc::new(SourceRegistry::with_default_sources(config.fetch_config()));

    match cli.command {
        Command::Quote { source, currency } => {
            let adapter = registry.get(&source)?;
            let quote = registry
                .fetch_quote(&source, &currency)
                .await
                .with_context(|| format!("failed to fetch {} from {}", currency, adapter.id()))?
                .with_context(|| format!("{} does not list '{}'", adapter.id(), currency))?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&quote)?);
            } else {
                println!("{}", render::quote(adapter.display_name(), &quote));
            }
        }
        Command::Compare(args) => compare(registry, args, cli.json).await?,
        Command::Convert {
            source,
            amount,
            from,
            to,
        } => {
            let request = ConversionRequest::parse(source, from, to, &amount)?;
            let result = CurrencyConverter::new(registry).convert(&request).await?;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&result)?);
            } else {
                println!("{}", render::conversion(&result));
            }
        }
        Command::Sources => {
            if cli.json {
                let listing: Vec<_> = registry
                    .sources()
                    .iter()
                    .map(|s| {
                        serde_json::json!({
                            "key": s.key(),
                            "id": s.id(),
                            "name": s.display_name(),
                        })
                    })
                    .collect();
                println!("{}", serde_json::to_string_pretty(&listing)?);
            } else {
                for source in registry.sources() {
                    println!("{:<9} {:<9} {}", source.key(), source.id(), source.display_name());
                }
            }
        }
    }

    Ok(())
}

async fn compare(
    registry: Arc<SourceRegistry>,
    args: CompareArgs,
    json: bool,
) -> anyhow::Result<()> {
    let intent = if args.sell {
        OrderIntent::BestToSell
    } else {
        OrderIntent::CheapestToBuy
    };

    let mut request = AggregateRequest::new(args.currency.clone(), intent);
    if let Some(sources) = args.sources {
        request = request.with_sources(sources);
    }
    if let Some(top) = args.top {
        request = request.with_top_n(top.get());
    }
    if let Some(leg) = args.leg {
        request = request.with_leg(leg.into());
    }

    let result = Aggregator::new(registry).aggregate(&request).await?;
    tracing::debug!("{}", result.diagnostics.summary());

    if json {
        println!("{}", serde_json::to_string_pretty(&result)?);
    } else {
        println!(
            "{}",
            render::aggregate(&args.currency, intent, request.leg(), &result)
        );
    }
    Ok(())
}
