//! Simple Earn flexible-product history: subscriptions, redemptions and
//! interest payments merged into one ledger with yield attribution.

use chrono::Utc;
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::binance::{BinanceClient, ClientError};
use crate::pricing::HistoricalPriceProvider;
use crate::transactions::{HISTORY_WINDOW_DAYS, display_date};

const DAY_MS: i64 = 86_400_000;
const EARN_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EarnKind {
    Subscription,
    Redemption,
    Interest,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnEvent {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: EarnKind,
    pub asset: String,
    pub amount: f64,
    #[serde(rename = "amountInUSD")]
    pub amount_in_usd: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub product_id: Option<String>,
    pub date: String,
    /// Interest accrued up to this redemption; only set on redemptions.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub yield_amount: Option<f64>,
    #[serde(rename = "yieldInUSD", skip_serializing_if = "Option::is_none")]
    pub yield_in_usd: Option<f64>,
    #[serde(skip_serializing)]
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EarnHistory {
    pub subscriptions: Vec<EarnEvent>,
    pub redemptions: Vec<EarnEvent>,
    pub interests: Vec<EarnEvent>,
    pub history: Vec<EarnEvent>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct YieldSummary {
    pub total_yield: String,
}

#[derive(Debug, Deserialize)]
struct Rows<T> {
    rows: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SubscriptionRecord {
    amount: String,
    asset: String,
    time: i64,
    purchase_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RedemptionRecord {
    amount: String,
    asset: String,
    time: i64,
    #[serde(default)]
    project_id: Option<String>,
    redeem_id: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewardRecord {
    rewards: String,
    asset: String,
    time: i64,
    #[serde(default)]
    project_id: Option<String>,
}

async fn fetch_rows<T: serde::de::DeserializeOwned>(
    client: &BinanceClient,
    path: &str,
    start: i64,
    end: i64,
) -> Result<Vec<T>, ClientError> {
    let rows: Rows<T> = client
        .get_signed(
            path,
            vec![
                ("startTime".to_string(), start.to_string()),
                ("endTime".to_string(), end.to_string()),
                ("size".to_string(), EARN_PAGE_SIZE.to_string()),
            ],
        )
        .await?;
    Ok(rows.rows)
}

async fn usd_value(
    asset: &str,
    amount: f64,
    at_millis: i64,
    prices: &dyn HistoricalPriceProvider,
) -> Option<f64> {
    match prices.close_usd_at(asset, at_millis).await {
        Ok(price) => price.map(|p| amount * p),
        Err(_) => None,
    }
}

fn event(
    id: String,
    kind: EarnKind,
    asset: String,
    amount: f64,
    amount_in_usd: Option<f64>,
    product_id: Option<String>,
    timestamp: i64,
) -> EarnEvent {
    EarnEvent {
        id,
        kind,
        asset,
        amount,
        amount_in_usd,
        product_id,
        date: display_date(timestamp),
        yield_amount: None,
        yield_in_usd: None,
        timestamp,
    }
}

/// For every redemption, attributes the interest accrued on the same
/// product and asset up to the redemption time. Quadratic in the two list
/// lengths, which a 90-day per-user window keeps small.
pub fn attribute_yield(redemptions: &mut [EarnEvent], interests: &[EarnEvent]) {
    for redemption in redemptions {
        let mut amount = 0.0;
        let mut usd = 0.0;
        for interest in interests {
            if interest.product_id == redemption.product_id
                && interest.asset == redemption.asset
                && interest.timestamp <= redemption.timestamp
            {
                amount += interest.amount;
                usd += interest.amount_in_usd.unwrap_or(0.0);
            }
        }
        redemption.yield_amount = Some(amount);
        redemption.yield_in_usd = Some(usd);
    }
}

/// Fetches the three sub-histories concurrently over the 90-day window.
/// A failing sub-fetch degrades to an empty list so the others still
/// render.
pub async fn earn_history(
    client: &BinanceClient,
    prices: &dyn HistoricalPriceProvider,
) -> EarnHistory {
    let end = Utc::now().timestamp_millis();
    let start = end - HISTORY_WINDOW_DAYS * DAY_MS;

    let (subs, reds, rewards) = futures::join!(
        fetch_rows::<SubscriptionRecord>(
            client,
            "/sapi/v1/simple-earn/flexible/history/subscriptionRecord",
            start,
            end,
        ),
        fetch_rows::<RedemptionRecord>(
            client,
            "/sapi/v1/simple-earn/flexible/history/redemptionRecord",
            start,
            end,
        ),
        fetch_rows::<RewardRecord>(
            client,
            "/sapi/v1/simple-earn/flexible/history/rewardsRecord",
            start,
            end,
        ),
    );
    let subs = subs.unwrap_or_else(|err| {
        warn!(error = %err, "subscription history unavailable, continuing without it");
        Vec::new()
    });
    let reds = reds.unwrap_or_else(|err| {
        warn!(error = %err, "redemption history unavailable, continuing without it");
        Vec::new()
    });
    let rewards = rewards.unwrap_or_else(|err| {
        warn!(error = %err, "rewards history unavailable, continuing without it");
        Vec::new()
    });

    let subscriptions = join_all(subs.iter().map(|r| async move {
        let amount: f64 = r.amount.parse().unwrap_or(0.0);
        event(
            r.purchase_id.to_string(),
            EarnKind::Subscription,
            r.asset.clone(),
            amount,
            usd_value(&r.asset, amount, r.time, prices).await,
            None,
            r.time,
        )
    }))
    .await;

    let mut redemptions = join_all(reds.iter().map(|r| async move {
        let amount: f64 = r.amount.parse().unwrap_or(0.0);
        event(
            r.redeem_id.to_string(),
            EarnKind::Redemption,
            r.asset.clone(),
            amount,
            usd_value(&r.asset, amount, r.time, prices).await,
            r.project_id.clone(),
            r.time,
        )
    }))
    .await;

    let interests = join_all(rewards.iter().map(|r| async move {
        let amount: f64 = r.rewards.parse().unwrap_or(0.0);
        event(
            format!("{}-{}", r.asset, r.time),
            EarnKind::Interest,
            r.asset.clone(),
            amount,
            usd_value(&r.asset, amount, r.time, prices).await,
            r.project_id.clone(),
            r.time,
        )
    }))
    .await;

    attribute_yield(&mut redemptions, &interests);

    let mut history: Vec<EarnEvent> = subscriptions
        .iter()
        .chain(redemptions.iter())
        .chain(interests.iter())
        .cloned()
        .collect();
    history.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    EarnHistory {
        subscriptions,
        redemptions,
        interests,
        history,
    }
}

/// Total interest earned over the window, in USD.
pub async fn yield_summary(
    client: &BinanceClient,
    prices: &dyn HistoricalPriceProvider,
) -> YieldSummary {
    let end = Utc::now().timestamp_millis();
    let start = end - HISTORY_WINDOW_DAYS * DAY_MS;

    let rewards = fetch_rows::<RewardRecord>(
        client,
        "/sapi/v1/simple-earn/flexible/history/rewardsRecord",
        start,
        end,
    )
    .await
    .unwrap_or_else(|err| {
        warn!(error = %err, "rewards history unavailable, reporting zero yield");
        Vec::new()
    });

    let values = join_all(rewards.iter().map(|r| async move {
        let amount: f64 = r.rewards.parse().unwrap_or(0.0);
        usd_value(&r.asset, amount, r.time, prices)
            .await
            .unwrap_or(0.0)
    }))
    .await;
    let total: f64 = values.into_iter().sum();

    YieldSummary {
        total_yield: format!("{total:.2}"),
    }
}
