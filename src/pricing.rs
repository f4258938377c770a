//! USD price resolution for exchange assets, current and historical.

use anyhow::Result;
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::binance::{BinanceClient, ClientError};

/// Quote assets treated as pegged to 1 USD. Lookup order doubles as the
/// fallback order for `{ASSET}{QUOTE}` pairs.
pub const STABLECOINS: &[&str] = &["USDT", "BUSD"];

/// Fiat currency codes the exchange lists as deposit/withdrawal assets.
/// These never have spot pairs, so a lookup would be a guaranteed round
/// trip to a 400 response.
const FIAT_CODES: &[&str] = &[
    "BRL", "EUR", "GBP", "UAH", "RUB", "TRY", "ARS", "NGN", "ZAR", "COP", "MXN", "AUD", "PLN",
    "RON", "CZK",
];

#[async_trait]
pub trait SpotPriceProvider: Send + Sync {
    /// Latest USD price for an asset. `Ok(None)` means the asset has no
    /// quotable market, which is an expected outcome, not an error.
    async fn spot_usd(&self, asset: &str) -> Result<Option<f64>>;
}

#[async_trait]
pub trait HistoricalPriceProvider: Send + Sync {
    /// USD closing price for the UTC calendar day containing `at_millis`.
    /// `Ok(None)` means no price path exists; callers must treat that as a
    /// null value, never as a failure.
    async fn close_usd_at(&self, asset: &str, at_millis: i64) -> Result<Option<f64>>;
}

#[derive(Debug, Deserialize)]
struct TickerPrice {
    price: String,
}

/// A single kline row is a positional array of mixed types; only the close
/// price at index 4 is of interest here.
type KlineRow = Vec<serde_json::Value>;

fn close_price(row: &KlineRow) -> Option<f64> {
    row.get(4)?.as_str()?.parse().ok()
}

pub(crate) fn utc_day_bounds(at_millis: i64) -> (i64, i64) {
    const DAY_MS: i64 = 86_400_000;
    let start = at_millis.div_euclid(DAY_MS) * DAY_MS;
    (start, start + DAY_MS - 1)
}

pub struct BinancePrices {
    client: BinanceClient,
}

impl BinancePrices {
    pub fn new(client: BinanceClient) -> Self {
        BinancePrices { client }
    }
}

#[async_trait]
impl SpotPriceProvider for BinancePrices {
    async fn spot_usd(&self, asset: &str) -> Result<Option<f64>> {
        for quote in STABLECOINS {
            let symbol = format!("{asset}{quote}");
            let params = [("symbol".to_string(), symbol.clone())];
            match self
                .client
                .get_public::<TickerPrice>("/api/v3/ticker/price", &params)
                .await
            {
                Ok(ticker) => return Ok(Some(ticker.price.parse()?)),
                Err(ClientError::Api { .. }) => {
                    debug!(%symbol, "no spot market, trying next quote");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }
}

#[async_trait]
impl HistoricalPriceProvider for BinancePrices {
    async fn close_usd_at(&self, asset: &str, at_millis: i64) -> Result<Option<f64>> {
        if STABLECOINS.contains(&asset) {
            return Ok(Some(1.0));
        }
        if FIAT_CODES.contains(&asset) {
            return Ok(None);
        }

        let (day_start, day_end) = utc_day_bounds(at_millis);
        for quote in STABLECOINS {
            let symbol = format!("{asset}{quote}");
            let params = [
                ("symbol".to_string(), symbol.clone()),
                ("interval".to_string(), "1d".to_string()),
                ("startTime".to_string(), day_start.to_string()),
                ("endTime".to_string(), day_end.to_string()),
                ("limit".to_string(), "1".to_string()),
            ];
            match self
                .client
                .get_public::<Vec<KlineRow>>("/api/v3/klines", &params)
                .await
            {
                Ok(rows) => {
                    if let Some(close) = rows.first().and_then(close_price) {
                        return Ok(Some(close));
                    }
                    // valid pair, no candle on that day: fall through
                    debug!(%symbol, "no daily candle, trying next quote");
                }
                Err(ClientError::Api { .. }) => {
                    debug!(%symbol, "pair does not exist, trying next quote");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Ok(None)
    }
}
