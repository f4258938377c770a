use alloy_primitives::{Address, B256, U256};
use anyhow::{Result, anyhow};
use tracing::info;

use crate::wallet::chains::{Network, RECEIVER, StableToken};
use crate::wallet::erc20;
use crate::wallet::provider::{TransactionRequest, WalletProvider};

/// Drives a wallet through one stablecoin payment: connect, verify the
/// chain, switch when wrong, then send the token transfer to the fixed
/// receiver.
pub struct PaymentGateway<P> {
    provider: P,
    network: Network,
    token: StableToken,
    rpc_url: String,
}

#[derive(Debug)]
pub struct PaymentReceipt {
    pub tx_hash: B256,
    pub payer: Address,
    pub token: Address,
    pub token_name: String,
    pub amount: U256,
}

impl<P: WalletProvider> PaymentGateway<P> {
    pub fn new(provider: P, network: Network, token: StableToken) -> Self {
        PaymentGateway {
            provider,
            network,
            token,
            rpc_url: network.spec().rpc_url.to_string(),
        }
    }

    /// Overrides the chain RPC endpoint used for token metadata reads.
    pub fn with_rpc_url(mut self, url: &str) -> Self {
        self.rpc_url = url.to_string();
        self
    }

    pub async fn connect(&self) -> Result<Address> {
        let accounts = self.provider.request_accounts().await?;
        accounts
            .into_iter()
            .next()
            .ok_or_else(|| anyhow!("wallet returned no accounts"))
    }

    /// Checks the wallet is on the target chain and switches it otherwise.
    pub async fn ensure_network(&self) -> Result<()> {
        let want = self.network.spec().chain_id;
        let have = self.provider.chain_id().await?;
        if have != want {
            info!(have, want, network = self.network.spec().name, "switching wallet chain");
            self.provider.switch_chain(want).await?;
        }
        Ok(())
    }

    pub async fn pay(&self, amount: &str) -> Result<PaymentReceipt> {
        let payer = self.connect().await?;
        self.ensure_network().await?;

        let token_address = self.network.token_address(self.token);
        let token = erc20::token_info(&self.rpc_url, token_address).await;
        let units = erc20::parse_units(amount, token.decimals)?;

        let tx_hash = self
            .provider
            .send_transaction(TransactionRequest {
                from: payer,
                to: token_address,
                data: erc20::transfer_calldata(RECEIVER, units),
            })
            .await?;
        info!(%tx_hash, token = token.name.as_str(), "payment submitted");

        Ok(PaymentReceipt {
            tx_hash,
            payer,
            token: token_address,
            token_name: token.name,
            amount: units,
        })
    }
}
