use chrono::Utc;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;

use crate::binance::sign;
use crate::config::BinanceConfig;

/// Upstream call failure. `Api` carries the exchange's own error payload so
/// callers can distinguish an unknown symbol from a transport problem.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("{msg}")]
    Api { code: i64, msg: String },
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    code: i64,
    msg: String,
}

#[derive(Debug, Clone)]
pub struct BinanceClient {
    http: reqwest::Client,
    base_url: String,
    credentials: BinanceConfig,
}

impl BinanceClient {
    pub fn new(base_url: &str, credentials: BinanceConfig) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .user_agent("coindeck/0.1")
            .build()?;
        Ok(BinanceClient {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// GET on a public (unsigned) endpoint.
    pub async fn get_public<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(String, String)],
    ) -> Result<T, ClientError> {
        let query = sign::encode_query(params);
        let url = if query.is_empty() {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}{}?{}", self.base_url, path, query)
        };
        debug!("GET {url}");

        let response = self.http.get(&url).send().await?;
        Self::decode(response).await
    }

    /// GET on a private endpoint. The timestamp is generated here, right
    /// before the request goes out: the exchange rejects stale timestamps,
    /// so it cannot be computed once for a batch of calls.
    pub async fn get_signed<T: DeserializeOwned>(
        &self,
        path: &str,
        mut params: Vec<(String, String)>,
    ) -> Result<T, ClientError> {
        params.push((
            "timestamp".to_string(),
            Utc::now().timestamp_millis().to_string(),
        ));
        let query = sign::signed_query(&params, &self.credentials.api_secret);
        let url = format!("{}{}?{}", self.base_url, path, query);
        debug!("GET {} (signed)", path);

        let response = self
            .http
            .get(&url)
            .header("X-MBX-APIKEY", &self.credentials.api_key)
            .send()
            .await?;
        Self::decode(response).await
    }

    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response.json::<T>().await?);
        }

        let body = response.text().await.unwrap_or_default();
        match serde_json::from_str::<ApiErrorBody>(&body) {
            Ok(err) => Err(ClientError::Api {
                code: err.code,
                msg: err.msg,
            }),
            Err(_) => Err(ClientError::Api {
                code: i64::from(status.as_u16()),
                msg: format!("HTTP {status}"),
            }),
        }
    }
}
