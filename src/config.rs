use std::env;

pub const DEFAULT_PORT: u16 = 3001;
pub const DEFAULT_BASE_URL: &str = "https://api.binance.com";

/// Exchange API credential pair. One identity per process lifetime.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    pub api_key: String,
    pub api_secret: String,
}

/// Process configuration, loaded once at startup and injected into the
/// server state. Request handlers never read the environment directly.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub binance: Option<BinanceConfig>,
    pub binance_base_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let binance = match (env::var("BINANCE_API_KEY"), env::var("BINANCE_API_SECRET")) {
            (Ok(api_key), Ok(api_secret)) if !api_key.is_empty() && !api_secret.is_empty() => {
                Some(BinanceConfig {
                    api_key,
                    api_secret,
                })
            }
            _ => None,
        };

        let port = env::var("PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(DEFAULT_PORT);

        let binance_base_url =
            env::var("BINANCE_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        AppConfig {
            port,
            binance,
            binance_base_url,
        }
    }
}
