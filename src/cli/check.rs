//! Environment validation for operators setting up the service.

use std::env;

use anyhow::Result;
use console::style;

use crate::cli::ui::{StyleType, style_text};
use crate::config::DEFAULT_PORT;

fn mask(value: &str) -> String {
    if value.len() > 10 {
        format!("{}...{}", &value[..4], &value[value.len() - 4..])
    } else {
        "***".to_string()
    }
}

fn report_secret(name: &str, value: Option<&str>) -> bool {
    match value {
        Some(value) if !value.is_empty() => {
            println!("   {name}: {} {}", mask(value), style("ok").green());
            if value.contains("your_api") {
                println!(
                    "   {}",
                    style_text(
                        &format!("{name} looks like a placeholder value"),
                        StyleType::Warning
                    )
                );
            } else if value.len() < 20 {
                println!(
                    "   {}",
                    style_text(
                        &format!("{name} looks too short for a real exchange key"),
                        StyleType::Warning
                    )
                );
            }
            true
        }
        _ => {
            println!("   {name}: {}", style_text("not set", StyleType::Error));
            false
        }
    }
}

pub fn run() -> Result<()> {
    println!(
        "{}\n",
        style_text("Environment configuration", StyleType::Title)
    );

    let api_key = env::var("BINANCE_API_KEY").ok();
    let api_secret = env::var("BINANCE_API_SECRET").ok();

    let key_ok = report_secret("BINANCE_API_KEY", api_key.as_deref());
    let secret_ok = report_secret("BINANCE_API_SECRET", api_secret.as_deref());

    match env::var("PORT") {
        Ok(port) => println!("   PORT: {port}"),
        Err(_) => println!("   PORT: {DEFAULT_PORT} (default)"),
    }

    println!();
    if !key_ok || !secret_ok {
        println!("Your .env file should look like:\n");
        println!("BINANCE_API_KEY=your_api_key");
        println!("BINANCE_API_SECRET=your_api_secret");
        println!("PORT={DEFAULT_PORT}");
        anyhow::bail!("missing required environment variables");
    }

    println!(
        "{}",
        style_text("Environment is configured correctly.", StyleType::TotalValue)
    );
    println!("Make sure the exchange key has the Reading permission enabled.");
    Ok(())
}
