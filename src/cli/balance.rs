//! Terminal view of the aggregated exchange balance.

use anyhow::Result;
use comfy_table::Cell;

use crate::balance::balance_report;
use crate::binance::BinanceClient;
use crate::cli::ui;
use crate::config::AppConfig;
use crate::pricing::BinancePrices;

pub async fn run(config: AppConfig) -> Result<()> {
    let Some(credentials) = config.binance.clone() else {
        anyhow::bail!("Binance API credentials not configured. Run `coindeck check` for details.");
    };

    let spinner = ui::new_spinner("Fetching balances...");
    let client = BinanceClient::new(&config.binance_base_url, credentials)?;
    let prices = BinancePrices::new(client.clone());
    let report = balance_report(&client, &prices).await;
    spinner.finish_and_clear();
    let report = report?;

    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Asset"),
        ui::header_cell("Free"),
        ui::header_cell("Locked"),
    ]);
    for entry in &report.balances {
        table.add_row(vec![
            Cell::new(&entry.asset),
            Cell::new(&entry.free),
            Cell::new(&entry.locked),
        ]);
    }
    println!("{table}");

    println!(
        "\nTotal Value ({}): {}",
        ui::style_text("USD", ui::StyleType::TotalLabel),
        ui::style_text(&report.total_balance, ui::StyleType::TotalValue)
    );
    Ok(())
}
