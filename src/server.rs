//! JSON HTTP API consumed by the dashboard.

use actix_cors::Cors;
use actix_web::http::StatusCode;
use actix_web::{App, HttpResponse, HttpServer, web};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::info;

use crate::balance;
use crate::binance::{BinanceClient, ClientError};
use crate::config::AppConfig;
use crate::earn;
use crate::pricing::BinancePrices;
use crate::transactions;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("Binance API credentials not configured")]
    CredentialsMissing,
    #[error("{0}")]
    Upstream(String),
    #[error("Internal server error")]
    Internal,
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        if err.chain().any(|cause| cause.is::<ClientError>()) {
            ApiError::Upstream(err.root_cause().to_string())
        } else {
            ApiError::Internal
        }
    }
}

impl actix_web::ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::CredentialsMissing | ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Upstream(_) => StatusCode::BAD_REQUEST,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(json!({
            "success": false,
            "error": self.to_string(),
        }))
    }
}

#[derive(Serialize)]
struct Success<T: Serialize> {
    success: bool,
    #[serde(flatten)]
    data: T,
}

fn success<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Success {
        success: true,
        data,
    })
}

/// Shared server state: the configuration injected at startup. Each request
/// builds its own upstream client; nothing mutable is shared across
/// requests.
pub struct AppState {
    pub config: AppConfig,
}

impl AppState {
    fn exchange(&self) -> Result<(BinanceClient, BinancePrices), ApiError> {
        let credentials = self
            .config
            .binance
            .clone()
            .ok_or(ApiError::CredentialsMissing)?;
        let client = BinanceClient::new(&self.config.binance_base_url, credentials)
            .map_err(|_| ApiError::Internal)?;
        let prices = BinancePrices::new(client.clone());
        Ok((client, prices))
    }
}

async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "message": "Backend is running",
    }))
}

async fn get_balance(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let (client, prices) = state.exchange()?;
    let report = balance::balance_report(&client, &prices).await?;
    Ok(success(report))
}

async fn get_deposits_today(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let (client, prices) = state.exchange()?;
    Ok(success(transactions::deposits_today(&client, &prices).await))
}

async fn get_transactions(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let (client, prices) = state.exchange()?;
    Ok(success(
        transactions::transaction_history(&client, &prices).await,
    ))
}

async fn get_earn_history(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let (client, prices) = state.exchange()?;
    Ok(success(earn::earn_history(&client, &prices).await))
}

async fn get_earn_yield(state: web::Data<AppState>) -> Result<HttpResponse, ApiError> {
    let (client, prices) = state.exchange()?;
    Ok(success(earn::yield_summary(&client, &prices).await))
}

pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/health").route(web::get().to(health)));
    cfg.service(
        web::scope("/api")
            .service(web::resource("/balance").route(web::get().to(get_balance)))
            .service(web::resource("/deposits/today").route(web::get().to(get_deposits_today)))
            .service(web::resource("/transactions").route(web::get().to(get_transactions)))
            .service(web::resource("/earn/history").route(web::get().to(get_earn_history)))
            .service(web::resource("/earn/yield").route(web::get().to(get_earn_yield))),
    );
}

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    let port = config.port;
    if config.binance.is_none() {
        tracing::warn!("Binance API credentials not configured, data endpoints will fail");
    }
    let state = web::Data::new(AppState { config });

    info!("Server listening on port {port}");
    HttpServer::new(move || {
        // the dashboard is served from a different origin
        App::new()
            .wrap(Cors::permissive())
            .app_data(state.clone())
            .configure(routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;
    Ok(())
}
