use super::ui;
use crate::core::{CurrencyPrice, PriceProvider, ProviderError};
use comfy_table::Cell;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, info};

pub fn display_prices_as_table(prices: &[CurrencyPrice]) -> String {
    let mut table = ui::new_styled_table();

    table.set_header(vec![
        ui::header_cell("Pair"),
        ui::header_cell("Symbol"),
        ui::header_cell("Bid"),
        ui::header_cell("Ask"),
    ]);

    for price in prices {
        let bid = if price.is_single_value() {
            ui::empty_cell()
        } else {
            ui::price_cell(price.bid_price)
        };

        table.add_row(vec![
            Cell::new(&price.description),
            Cell::new(&price.currency_symbol),
            bid,
            ui::price_cell(price.ask_price),
        ]);
    }

    format!(
        "{}\n\n{}",
        ui::style_text("Current prices", ui::StyleType::Title),
        table
    )
}

/// What the user sees instead of prices when a query fails.
pub fn display_failure(err: &ProviderError) -> String {
    let reason = if err.is_fetch() {
        "the exchange could not be reached"
    } else if err.is_parse() {
        "the exchange sent an unexpected response"
    } else {
        "the request could not be made"
    };

    format!(
        "{}\n{}",
        ui::style_text(
            &format!("Sorry, prices are unavailable right now: {reason}."),
            ui::StyleType::Error
        ),
        ui::style_text(&err.to_string(), ui::StyleType::Subtle)
    )
}

async fn query(provider: &dyn PriceProvider) -> Result<String, ProviderError> {
    let pb = ui::new_spinner("Fetching prices...");
    let result = provider.fetch_last_prices().await;
    pb.finish_and_clear();

    result.map(|prices| display_prices_as_table(&prices))
}

/// Answers a single price query.
pub async fn run(provider: &dyn PriceProvider) -> anyhow::Result<()> {
    match query(provider).await {
        Ok(output) => {
            println!("{output}");
            Ok(())
        }
        Err(e) => {
            println!("{}", display_failure(&e));
            Err(e.into())
        }
    }
}

/// Answers a price query every `every` until Ctrl-C. A failed query is
/// reported and the loop carries on.
pub async fn watch(provider: &dyn PriceProvider, every: Duration) -> anyhow::Result<()> {
    let mut ticker = interval(every);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    info!(interval_secs = every.as_secs(), "Watching prices");

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, abandoning in-flight query");
                return Ok(());
            }
            _ = ticker.tick() => {}
        }

        // A query still in flight when Ctrl-C arrives is dropped, not awaited
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                debug!("Interrupted, abandoning in-flight query");
                return Ok(());
            }
            result = query(provider) => {
                match result {
                    Ok(output) => println!("{output}\n"),
                    Err(e) => println!("{}\n", display_failure(&e)),
                }
            }
        }
    }
}
