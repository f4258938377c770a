//! Aggregates the account's holdings into a single USD-denominated view.

use anyhow::Result;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::binance::BinanceClient;
use crate::pricing::SpotPriceProvider;

/// One account holding, amounts as the exchange's decimal strings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetBalance {
    pub asset: String,
    pub free: String,
    pub locked: String,
}

#[derive(Debug, Deserialize)]
struct AccountInfo {
    balances: Vec<AssetBalance>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceReport {
    pub total_balance: String,
    pub balances: Vec<AssetBalance>,
}

fn held_amount(entry: &AssetBalance) -> f64 {
    let free: f64 = entry.free.parse().unwrap_or(0.0);
    let locked: f64 = entry.locked.parse().unwrap_or(0.0);
    free + locked
}

/// Fetches the account and values every held asset concurrently. Each
/// valuation resolves to a number on its own: an asset with no quotable
/// market contributes 0 instead of failing the batch. Only the top-level
/// account fetch can fail the whole operation.
pub async fn balance_report(
    client: &BinanceClient,
    prices: &dyn SpotPriceProvider,
) -> Result<BalanceReport> {
    let account: AccountInfo = client.get_signed("/api/v3/account", Vec::new()).await?;
    let held: Vec<AssetBalance> = account
        .balances
        .into_iter()
        .filter(|entry| held_amount(entry) > 0.0)
        .collect();

    let valuations = held.iter().map(|entry| async move {
        let amount = held_amount(entry);
        if entry.asset == "USDT" {
            return amount;
        }
        match prices.spot_usd(&entry.asset).await {
            Ok(Some(price)) => amount * price,
            Ok(None) => 0.0,
            Err(err) => {
                debug!(asset = %entry.asset, error = %err, "spot lookup failed, valuing at 0");
                0.0
            }
        }
    });
    let total: f64 = join_all(valuations).await.into_iter().sum();

    Ok(BalanceReport {
        total_balance: format!("{total:.2}"),
        balances: held,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use async_trait::async_trait;
    use std::collections::HashMap;

    use crate::config::BinanceConfig;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    struct MockSpotPrices {
        prices: HashMap<String, f64>,
        errors: Vec<String>,
    }

    impl MockSpotPrices {
        fn new() -> Self {
            MockSpotPrices {
                prices: HashMap::new(),
                errors: Vec::new(),
            }
        }

        fn with_price(mut self, asset: &str, price: f64) -> Self {
            self.prices.insert(asset.to_string(), price);
            self
        }

        fn with_error(mut self, asset: &str) -> Self {
            self.errors.push(asset.to_string());
            self
        }
    }

    #[async_trait]
    impl SpotPriceProvider for MockSpotPrices {
        async fn spot_usd(&self, asset: &str) -> Result<Option<f64>> {
            if self.errors.iter().any(|a| a == asset) {
                return Err(anyhow!("price service unavailable"));
            }
            Ok(self.prices.get(asset).copied())
        }
    }

    async fn account_server(body: &str) -> MockServer {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/account"))
            .respond_with(ResponseTemplate::new(200).set_body_string(body.to_string()))
            .mount(&server)
            .await;
        server
    }

    fn client_for(server: &MockServer) -> BinanceClient {
        BinanceClient::new(
            &server.uri(),
            BinanceConfig {
                api_key: "k".to_string(),
                api_secret: "s".to_string(),
            },
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_total_is_sum_of_held_amounts_times_price() {
        let server = account_server(
            r#"{"balances":[
                {"asset":"BTC","free":"0.5","locked":"0.1"},
                {"asset":"USDT","free":"100.0","locked":"0.0"},
                {"asset":"ETH","free":"0.0","locked":"0.0"}
            ]}"#,
        )
        .await;
        let prices = MockSpotPrices::new().with_price("BTC", 30000.0);

        let report = balance_report(&client_for(&server), &prices).await.unwrap();

        // 0.6 * 30000 + 100 * 1; the zero-balance ETH entry is filtered out
        assert_eq!(report.total_balance, "18100.00");
        assert_eq!(report.balances.len(), 2);
        assert_eq!(report.balances[0].asset, "BTC");
        assert_eq!(report.balances[1].asset, "USDT");
    }

    #[tokio::test]
    async fn test_unquotable_asset_contributes_nothing() {
        let server = account_server(
            r#"{"balances":[
                {"asset":"DUST","free":"123.0","locked":"0.0"},
                {"asset":"USDT","free":"50.0","locked":"0.0"}
            ]}"#,
        )
        .await;
        let prices = MockSpotPrices::new();

        let report = balance_report(&client_for(&server), &prices).await.unwrap();
        assert_eq!(report.total_balance, "50.00");
        assert_eq!(report.balances.len(), 2);
    }

    #[tokio::test]
    async fn test_price_lookup_error_does_not_fail_the_batch() {
        let server = account_server(
            r#"{"balances":[
                {"asset":"BTC","free":"1.0","locked":"0.0"},
                {"asset":"USDT","free":"10.0","locked":"0.0"}
            ]}"#,
        )
        .await;
        let prices = MockSpotPrices::new().with_error("BTC");

        let report = balance_report(&client_for(&server), &prices).await.unwrap();
        assert_eq!(report.total_balance, "10.00");
    }

    #[tokio::test]
    async fn test_account_failure_surfaces_upstream_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/v3/account"))
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string(r#"{"code":-2014,"msg":"API-key format invalid."}"#),
            )
            .mount(&server)
            .await;
        let prices = MockSpotPrices::new();

        let err = balance_report(&client_for(&server), &prices)
            .await
            .unwrap_err();
        assert_eq!(err.root_cause().to_string(), "API-key format invalid.");
    }
}
