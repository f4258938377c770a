//! Wallet payment gateway: ERC-20 transfers to a fixed receiver across a
//! small set of EVM chains, driven through a wallet capability interface.

pub mod chains;
pub mod erc20;
pub mod payment;
pub mod provider;

pub use chains::{Network, RECEIVER, StableToken};
pub use payment::{PaymentGateway, PaymentReceipt};
pub use provider::{JsonRpcWallet, TransactionRequest, WalletProvider};
