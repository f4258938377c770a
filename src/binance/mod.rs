pub mod client;
pub mod sign;

pub use client::{BinanceClient, ClientError};
