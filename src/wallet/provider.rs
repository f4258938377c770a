//! Wallet capability interface and the JSON-RPC adapter.

use alloy_primitives::{Address, B256};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::sync::watch;
use tracing::debug;

/// Unsigned transaction handed to the wallet for signing and broadcast.
/// Token transfers carry no native value; everything is in `data`.
#[derive(Debug, Clone)]
pub struct TransactionRequest {
    pub from: Address,
    pub to: Address,
    pub data: Vec<u8>,
}

/// The capabilities a wallet must expose, whatever environment backs it.
/// Adapters are selected at connect time; nothing downstream inspects the
/// concrete provider.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Vec<Address>>;
    async fn chain_id(&self) -> Result<u64>;
    async fn switch_chain(&self, chain_id: u64) -> Result<()>;
    /// Observed chain changes; 0 until the first chain id is seen.
    fn chain_changes(&self) -> watch::Receiver<u64>;
    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256>;
}

#[derive(Debug, Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    result: Option<Value>,
    error: Option<RpcError>,
}

pub(crate) async fn rpc_call(
    http: &reqwest::Client,
    url: &str,
    method: &str,
    params: Value,
) -> Result<Value> {
    debug!(method, url, "RPC request");
    let body = json!({
        "jsonrpc": "2.0",
        "id": 1,
        "method": method,
        "params": params,
    });
    let response: RpcResponse = http.post(url).json(&body).send().await?.json().await?;
    if let Some(err) = response.error {
        bail!("RPC error {}: {}", err.code, err.message);
    }
    response
        .result
        .ok_or_else(|| anyhow!("RPC response missing result for {method}"))
}

fn parse_hex_quantity(raw: &str) -> Result<u64> {
    u64::from_str_radix(raw.trim_start_matches("0x"), 16)
        .with_context(|| format!("invalid hex quantity: {raw}"))
}

/// Adapter for wallets reachable over plain JSON-RPC (a node or bridge that
/// manages its own accounts). Chain changes are published whenever a call
/// observes a new chain id; there is no push channel on this transport.
pub struct JsonRpcWallet {
    http: reqwest::Client,
    url: String,
    chain_tx: watch::Sender<u64>,
}

impl JsonRpcWallet {
    pub fn new(url: &str) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent("coindeck/0.1")
            .build()?;
        let (chain_tx, _) = watch::channel(0);
        Ok(JsonRpcWallet {
            http,
            url: url.to_string(),
            chain_tx,
        })
    }
}

#[async_trait]
impl WalletProvider for JsonRpcWallet {
    async fn request_accounts(&self) -> Result<Vec<Address>> {
        // wallets expose eth_requestAccounts; bare nodes only eth_accounts
        let result = match rpc_call(&self.http, &self.url, "eth_requestAccounts", json!([])).await {
            Ok(value) => value,
            Err(_) => rpc_call(&self.http, &self.url, "eth_accounts", json!([])).await?,
        };
        serde_json::from_value(result).context("malformed accounts response")
    }

    async fn chain_id(&self) -> Result<u64> {
        let result = rpc_call(&self.http, &self.url, "eth_chainId", json!([])).await?;
        let id = parse_hex_quantity(result.as_str().unwrap_or_default())?;
        self.chain_tx.send_replace(id);
        Ok(id)
    }

    async fn switch_chain(&self, chain_id: u64) -> Result<()> {
        rpc_call(
            &self.http,
            &self.url,
            "wallet_switchEthereumChain",
            json!([{ "chainId": format!("0x{chain_id:x}") }]),
        )
        .await?;
        self.chain_tx.send_replace(chain_id);
        Ok(())
    }

    fn chain_changes(&self) -> watch::Receiver<u64> {
        self.chain_tx.subscribe()
    }

    async fn send_transaction(&self, tx: TransactionRequest) -> Result<B256> {
        let result = rpc_call(
            &self.http,
            &self.url,
            "eth_sendTransaction",
            json!([{
                "from": tx.from,
                "to": tx.to,
                "data": format!("0x{}", hex::encode(&tx.data)),
                "value": "0x0",
            }]),
        )
        .await?;
        result
            .as_str()
            .unwrap_or_default()
            .parse::<B256>()
            .context("malformed transaction hash")
    }
}
