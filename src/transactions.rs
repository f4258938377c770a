//! Deposit and withdrawal history over the exchange's queryable window.

use std::future::Future;

use chrono::{Local, NaiveDateTime, TimeZone, Utc};
use futures::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::binance::{BinanceClient, ClientError};
use crate::pricing::{HistoricalPriceProvider, utc_day_bounds};

/// The exchange caps history queries at a trailing 90-day span.
pub const HISTORY_WINDOW_DAYS: i64 = 90;
pub const PAGE_LIMIT: usize = 1000;

const DAY_MS: i64 = 86_400_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Incoming,
    Outgoing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TxStatus {
    Confirmed,
    Pending,
    Processing,
}

/// Public transaction shape consumed by the dashboard. The raw timestamp is
/// a sort key only and stays out of the serialized form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: String,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub amount: f64,
    #[serde(rename = "amountInUSD")]
    pub amount_in_usd: Option<f64>,
    pub currency: String,
    pub network: String,
    pub status: TxStatus,
    pub date: String,
    pub hash: String,
    #[serde(skip_serializing)]
    pub timestamp: i64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransactionLedger {
    pub transactions: Vec<Transaction>,
    pub truncated: bool,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TodayDeposits {
    pub deposits: Vec<Transaction>,
    pub total_today: String,
    pub count: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DepositRecord {
    #[serde(default)]
    id: String,
    amount: String,
    coin: String,
    #[serde(default)]
    network: String,
    status: i64,
    insert_time: i64,
    #[serde(default)]
    tx_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WithdrawRecord {
    id: String,
    amount: String,
    coin: String,
    #[serde(default)]
    network: String,
    status: i64,
    apply_time: String,
    #[serde(default)]
    tx_id: String,
}

pub struct Paginated<T> {
    pub records: Vec<T>,
    pub truncated: bool,
}

/// Walks a paginated history endpoint from `cursor` until a short page.
/// The cursor advances to one past the last record's timestamp, so a
/// boundary record is never fetched twice. A failed page stops the walk
/// and marks the result truncated instead of discarding what was already
/// accumulated.
pub async fn fetch_all_pages<T, F, Fut>(
    mut cursor: i64,
    mut fetch: F,
    ts: impl Fn(&T) -> i64,
) -> Paginated<T>
where
    F: FnMut(i64) -> Fut,
    Fut: Future<Output = Result<Vec<T>, ClientError>>,
{
    let mut records = Vec::new();
    let mut truncated = false;
    loop {
        match fetch(cursor).await {
            Ok(batch) => {
                if batch.is_empty() {
                    break;
                }
                let full_page = batch.len() >= PAGE_LIMIT;
                let last_ts = batch.last().map(|record| ts(record));
                records.extend(batch);
                match last_ts {
                    Some(t) if full_page => cursor = t + 1,
                    _ => break,
                }
            }
            Err(err) => {
                warn!(error = %err, "history page failed, returning truncated result");
                truncated = true;
                break;
            }
        }
    }
    Paginated { records, truncated }
}

async fn deposit_page(
    client: &BinanceClient,
    start: i64,
    end: i64,
) -> Result<Vec<DepositRecord>, ClientError> {
    client
        .get_signed(
            "/sapi/v1/capital/deposit/hisrec",
            vec![
                ("startTime".to_string(), start.to_string()),
                ("endTime".to_string(), end.to_string()),
                ("limit".to_string(), PAGE_LIMIT.to_string()),
            ],
        )
        .await
}

async fn withdraw_page(
    client: &BinanceClient,
    start: i64,
    end: i64,
) -> Result<Vec<WithdrawRecord>, ClientError> {
    client
        .get_signed(
            "/sapi/v1/capital/withdraw/history",
            vec![
                ("startTime".to_string(), start.to_string()),
                ("endTime".to_string(), end.to_string()),
                ("limit".to_string(), PAGE_LIMIT.to_string()),
            ],
        )
        .await
}

fn deposit_status(code: i64) -> TxStatus {
    match code {
        1 => TxStatus::Confirmed,
        // credited but not yet withdrawable
        6 => TxStatus::Processing,
        _ => TxStatus::Pending,
    }
}

fn withdraw_status(code: i64) -> TxStatus {
    match code {
        6 => TxStatus::Confirmed,
        4 => TxStatus::Processing,
        _ => TxStatus::Pending,
    }
}

pub(crate) fn display_date(ts_millis: i64) -> String {
    Local
        .timestamp_millis_opt(ts_millis)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}

/// Withdrawal apply times come back as `YYYY-MM-DD HH:MM:SS` UTC strings,
/// not epoch millis.
fn parse_apply_time(raw: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .map(|dt| dt.and_utc().timestamp_millis())
}

fn withdraw_ts(record: &WithdrawRecord) -> i64 {
    parse_apply_time(&record.apply_time).unwrap_or(0)
}

async fn usd_value(
    asset: &str,
    amount: f64,
    at_millis: i64,
    prices: &dyn HistoricalPriceProvider,
) -> Option<f64> {
    match prices.close_usd_at(asset, at_millis).await {
        Ok(Some(price)) => Some(amount * price),
        Ok(None) => None,
        Err(err) => {
            debug!(asset, error = %err, "historical price lookup failed");
            None
        }
    }
}

async fn from_deposit(record: &DepositRecord, prices: &dyn HistoricalPriceProvider) -> Transaction {
    let amount: f64 = record.amount.parse().unwrap_or(0.0);
    Transaction {
        id: if record.id.is_empty() {
            record.tx_id.clone()
        } else {
            record.id.clone()
        },
        direction: Direction::Incoming,
        amount,
        amount_in_usd: usd_value(&record.coin, amount, record.insert_time, prices).await,
        currency: record.coin.clone(),
        network: record.network.clone(),
        status: deposit_status(record.status),
        date: display_date(record.insert_time),
        hash: record.tx_id.clone(),
        timestamp: record.insert_time,
    }
}

async fn from_withdrawal(
    record: &WithdrawRecord,
    prices: &dyn HistoricalPriceProvider,
) -> Transaction {
    let amount: f64 = record.amount.parse().unwrap_or(0.0);
    let at = withdraw_ts(record);
    Transaction {
        id: record.id.clone(),
        direction: Direction::Outgoing,
        amount,
        amount_in_usd: usd_value(&record.coin, amount, at, prices).await,
        currency: record.coin.clone(),
        network: record.network.clone(),
        status: withdraw_status(record.status),
        date: display_date(at),
        hash: record.tx_id.clone(),
        timestamp: at,
    }
}

/// Full 90-day ledger: deposits and withdrawals paginated independently
/// and concurrently, every record valued in USD, newest first.
pub async fn transaction_history(
    client: &BinanceClient,
    prices: &dyn HistoricalPriceProvider,
) -> TransactionLedger {
    let end = Utc::now().timestamp_millis();
    let start = end - HISTORY_WINDOW_DAYS * DAY_MS;

    let deposits = fetch_all_pages(
        start,
        |cursor| deposit_page(client, cursor, end),
        |record| record.insert_time,
    );
    let withdrawals = fetch_all_pages(start, |cursor| withdraw_page(client, cursor, end), withdraw_ts);
    let (deposits, withdrawals) = futures::join!(deposits, withdrawals);
    let truncated = deposits.truncated || withdrawals.truncated;

    let (mut transactions, withdrawn) = futures::join!(
        join_all(
            deposits
                .records
                .iter()
                .map(|record| from_deposit(record, prices)),
        ),
        join_all(
            withdrawals
                .records
                .iter()
                .map(|record| from_withdrawal(record, prices)),
        ),
    );
    transactions.extend(withdrawn);
    transactions.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    TransactionLedger {
        transactions,
        truncated,
    }
}

/// Deposits received since UTC midnight, with their USD sum.
pub async fn deposits_today(
    client: &BinanceClient,
    prices: &dyn HistoricalPriceProvider,
) -> TodayDeposits {
    let now = Utc::now().timestamp_millis();
    let (day_start, _) = utc_day_bounds(now);

    let page = fetch_all_pages(
        day_start,
        |cursor| deposit_page(client, cursor, now),
        |record| record.insert_time,
    )
    .await;

    let mut deposits = join_all(
        page.records
            .iter()
            .map(|record| from_deposit(record, prices)),
    )
    .await;
    deposits.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let total: f64 = deposits
        .iter()
        .filter_map(|tx| tx.amount_in_usd)
        .sum();

    TodayDeposits {
        total_today: format!("{total:.2}"),
        count: deposits.len(),
        deposits,
    }
}
