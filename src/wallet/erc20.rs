//! Minimal ERC-20 surface: metadata reads and `transfer` call encoding.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{SolCall, sol};
use anyhow::{Result, ensure};
use serde_json::json;
use tracing::debug;

use crate::wallet::provider::rpc_call;

sol! {
    function name() public view returns (string);
    function decimals() public view returns (uint8);
    function transfer(address to, uint256 value) public returns (bool);
}

#[derive(Debug, Clone)]
pub struct TokenInfo {
    pub name: String,
    pub decimals: u8,
}

pub fn transfer_calldata(to: Address, value: U256) -> Vec<u8> {
    transferCall { to, value }.abi_encode()
}

async fn eth_call(http: &reqwest::Client, rpc_url: &str, to: Address, data: Vec<u8>) -> Result<Vec<u8>> {
    let result = rpc_call(
        http,
        rpc_url,
        "eth_call",
        json!([{ "to": to, "data": format!("0x{}", hex::encode(data)) }, "latest"]),
    )
    .await?;
    let raw = result.as_str().unwrap_or_default();
    Ok(hex::decode(raw.trim_start_matches("0x"))?)
}

/// Reads a token's display metadata from the chain. Tokens that fail either
/// read fall back to a generic name and 18 decimals, matching what the
/// payment page shows for opaque contracts.
pub async fn token_info(rpc_url: &str, token: Address) -> TokenInfo {
    let http = match reqwest::Client::builder()
        .user_agent("coindeck/0.1")
        .build()
    {
        Ok(http) => http,
        Err(err) => {
            debug!(error = %err, "could not build RPC client, using token defaults");
            return TokenInfo {
                name: "Token".to_string(),
                decimals: 18,
            };
        }
    };

    let name = match eth_call(&http, rpc_url, token, nameCall {}.abi_encode()).await {
        Ok(raw) => nameCall::abi_decode_returns(&raw).unwrap_or_else(|_| "Token".to_string()),
        Err(err) => {
            debug!(%token, error = %err, "name() call failed, using default");
            "Token".to_string()
        }
    };
    let decimals = match eth_call(&http, rpc_url, token, decimalsCall {}.abi_encode()).await {
        Ok(raw) => decimalsCall::abi_decode_returns(&raw).unwrap_or(18),
        Err(err) => {
            debug!(%token, error = %err, "decimals() call failed, using default");
            18
        }
    };

    TokenInfo { name, decimals }
}

/// Parses a human decimal amount into token base units. Accepts a comma as
/// the decimal separator, as entered on the payment page.
pub fn parse_units(amount: &str, decimals: u8) -> Result<U256> {
    let normalized = amount.trim().replace(',', ".");
    ensure!(!normalized.is_empty(), "empty amount");

    let (whole, frac) = match normalized.split_once('.') {
        Some((whole, frac)) => (whole, frac),
        None => (normalized.as_str(), ""),
    };
    ensure!(
        !whole.is_empty() || !frac.is_empty(),
        "amount has no digits"
    );
    ensure!(
        whole.chars().all(|c| c.is_ascii_digit()) && frac.chars().all(|c| c.is_ascii_digit()),
        "amount is not a decimal number"
    );
    ensure!(
        frac.len() <= decimals as usize,
        "amount has more than {decimals} decimal places"
    );

    let scale = U256::from(10).pow(U256::from(decimals));
    let whole_units = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10)? * scale
    };
    let frac_padded = format!("{frac:0<width$}", width = decimals as usize);
    let frac_units = if frac_padded.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(&frac_padded, 10)?
    };
    Ok(whole_units + frac_units)
}
