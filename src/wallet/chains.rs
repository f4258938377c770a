use alloy_primitives::{Address, address};

/// All payments land on this address, regardless of chain or token.
pub const RECEIVER: Address = address!("ed14922507cee9938faaf2958d577a2aeea9c4e7");

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Bsc,
    Arbitrum,
    Polygon,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StableToken {
    Usdt,
    Usdc,
}

#[derive(Debug)]
pub struct ChainSpec {
    pub name: &'static str,
    pub chain_id: u64,
    pub rpc_url: &'static str,
    usdt: Address,
    usdc: Address,
}

static BSC: ChainSpec = ChainSpec {
    name: "BNB Chain",
    chain_id: 0x38,
    rpc_url: "https://bsc-dataseed.binance.org",
    usdt: address!("55d398326f99059ff775485246999027b3197955"),
    usdc: address!("8ac76a51cc950d9822d68b83fe1ad97b32cd580d"),
};

static ARBITRUM: ChainSpec = ChainSpec {
    name: "Arbitrum",
    chain_id: 0xa4b1,
    rpc_url: "https://arb1.arbitrum.io/rpc",
    usdt: address!("fd086bc7cd5c481dcc9c85ebe478a1c0b69fcbb9"),
    usdc: address!("ff970a61a04b1ca14834a43f5de4533ebddb5cc8"),
};

static POLYGON: ChainSpec = ChainSpec {
    name: "Polygon",
    chain_id: 0x89,
    rpc_url: "https://polygon-rpc.com",
    usdt: address!("3813e82e6f7098b9583fc0f33a962d02018b6803"),
    usdc: address!("2791bca1f2de4661ed88a30c99a7a9449aa84174"),
};

impl Network {
    pub fn spec(self) -> &'static ChainSpec {
        match self {
            Network::Bsc => &BSC,
            Network::Arbitrum => &ARBITRUM,
            Network::Polygon => &POLYGON,
        }
    }

    pub fn token_address(self, token: StableToken) -> Address {
        let spec = self.spec();
        match token {
            StableToken::Usdt => spec.usdt,
            StableToken::Usdc => spec.usdc,
        }
    }
}
