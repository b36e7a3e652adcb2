//! VaultCore backend API client
//!
//! Implements the backend REST surface for:
//! - Login and OTP-verified signup
//! - Account balance and transaction history
//! - OTP-guarded transfers and the PDF statement
//! - Stock portfolio and purchases
//!
//! Protected calls carry the session token as a bearer credential. There is
//! no retry and no token refresh: a 401/403 is handed back as
//! [`DashboardError::Unauthorized`] for the caller to act on.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{RequestBuilder, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::types::{
    Account, BuyStockRequest, LoginRequest, LoginResponse, MessageResponse, PortfolioEntry,
    SignupRequest, SignupVerifyRequest, SignupVerifyResponse, Transaction, TransferRequest,
};

const SIGNUP_REQUEST_PATH: &str = "/api/auth/signup-request";
const SIGNUP_VERIFY_PATH: &str = "/api/auth/signup-verify";
const BALANCE_PATH: &str = "/api/account/my-balance";
const HISTORY_PATH: &str = "/api/transaction/history";
const TRANSFER_OTP_PATH: &str = "/api/transaction/request-transfer-otp";
const TRANSFER_PATH: &str = "/api/transaction/transfer";
const STATEMENT_PATH: &str = "/api/transaction/download-pdf";
const PORTFOLIO_PATH: &str = "/api/stocks/portfolio";
const BUY_STOCK_PATH: &str = "/api/stocks/buy";

/// Backend operations used by the dashboard flows.
///
/// `token` is the raw access token; implementations attach it as a bearer
/// credential.
#[async_trait]
pub trait BankApi: Send + Sync {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse>;
    async fn signup_request(&self, request: &SignupRequest) -> Result<MessageResponse>;
    async fn signup_verify(&self, request: &SignupVerifyRequest) -> Result<SignupVerifyResponse>;

    async fn my_balance(&self, token: &str) -> Result<Account>;
    async fn transaction_history(&self, token: &str) -> Result<Vec<Transaction>>;
    async fn request_transfer_otp(&self, token: &str) -> Result<MessageResponse>;
    async fn transfer(&self, token: &str, request: &TransferRequest) -> Result<MessageResponse>;
    async fn download_statement(&self, token: &str) -> Result<Vec<u8>>;
    async fn portfolio(&self, token: &str) -> Result<Vec<PortfolioEntry>>;
    async fn buy_stock(&self, token: &str, request: &BuyStockRequest) -> Result<MessageResponse>;
}

/// HTTP client for the VaultCore backend
#[derive(Debug, Clone)]
pub struct BankClient {
    http: reqwest::Client,
    base_url: String,
    login_path: String,
}

impl BankClient {
    /// Create new client against `config.api_base_url`
    pub fn new(config: &Config) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            http,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            login_path: config.login_path.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    /// Perform unauthenticated POST
    async fn post_public<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T> {
        let request = self.http.post(self.url(path)).json(body);
        Self::decode(Self::send(request, path).await?).await
    }

    /// Perform GET request with bearer authentication
    async fn get<T: DeserializeOwned>(&self, path: &str, token: &str) -> Result<T> {
        let request = self.http.get(self.url(path)).bearer_auth(token);
        Self::decode(Self::send(request, path).await?).await
    }

    /// Perform POST request with bearer authentication
    async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        token: &str,
        body: &B,
    ) -> Result<T> {
        let request_id = uuid::Uuid::new_v4().to_string();
        let request = self
            .http
            .post(self.url(path))
            .bearer_auth(token)
            .header("X-Request-Id", &request_id)
            .json(body);

        let response = Self::send(request, path).await?;
        info!(path, request_id = %request_id, "Mutation accepted");
        Self::decode(response).await
    }

    /// Send and map every non-success status to an error
    async fn send(request: RequestBuilder, path: &str) -> Result<reqwest::Response> {
        let response = request.send().await.map_err(|e| {
            warn!(path, error = %e, "Backend unreachable");
            DashboardError::from(e)
        })?;
        let status = response.status();
        debug!(path, status = status.as_u16(), "Backend responded");

        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = extract_message(&body);
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(DashboardError::Unauthorized {
                status: status.as_u16(),
                message,
            });
        }

        Err(DashboardError::Api {
            status: status.as_u16(),
            message,
        })
    }

    /// Parse a success body; an empty body reads as JSON `null`
    async fn decode<T: DeserializeOwned>(response: reqwest::Response) -> Result<T> {
        let body = response.text().await?;
        if body.trim().is_empty() {
            return Ok(serde_json::from_str("null")?);
        }
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl BankApi for BankClient {
    async fn login(&self, request: &LoginRequest) -> Result<LoginResponse> {
        self.post_public(&self.login_path, request).await
    }

    async fn signup_request(&self, request: &SignupRequest) -> Result<MessageResponse> {
        self.post_public(SIGNUP_REQUEST_PATH, request).await
    }

    async fn signup_verify(&self, request: &SignupVerifyRequest) -> Result<SignupVerifyResponse> {
        self.post_public(SIGNUP_VERIFY_PATH, request).await
    }

    async fn my_balance(&self, token: &str) -> Result<Account> {
        self.get(BALANCE_PATH, token).await
    }

    async fn transaction_history(&self, token: &str) -> Result<Vec<Transaction>> {
        let history: Option<Vec<Transaction>> = self.get(HISTORY_PATH, token).await?;
        Ok(history.unwrap_or_default())
    }

    async fn request_transfer_otp(&self, token: &str) -> Result<MessageResponse> {
        let reply: Option<MessageResponse> = self
            .post(TRANSFER_OTP_PATH, token, &serde_json::json!({}))
            .await?;
        Ok(reply.unwrap_or_default())
    }

    async fn transfer(&self, token: &str, request: &TransferRequest) -> Result<MessageResponse> {
        let reply: Option<MessageResponse> = self.post(TRANSFER_PATH, token, request).await?;
        Ok(reply.unwrap_or_default())
    }

    async fn download_statement(&self, token: &str) -> Result<Vec<u8>> {
        let request = self.http.get(self.url(STATEMENT_PATH)).bearer_auth(token);
        let response = Self::send(request, STATEMENT_PATH).await?;
        Ok(response.bytes().await?.to_vec())
    }

    async fn portfolio(&self, token: &str) -> Result<Vec<PortfolioEntry>> {
        let entries: Option<Vec<PortfolioEntry>> = self.get(PORTFOLIO_PATH, token).await?;
        Ok(entries.unwrap_or_default())
    }

    async fn buy_stock(&self, token: &str, request: &BuyStockRequest) -> Result<MessageResponse> {
        let reply: Option<MessageResponse> = self.post(BUY_STOCK_PATH, token, request).await?;
        Ok(reply.unwrap_or_default())
    }
}

/// Pull a human-readable message out of an error body.
///
/// Prefers a JSON `message` field, then a bare JSON string, then the raw
/// text when it is not JSON at all.
pub fn extract_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }

    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.is_empty())
            .map(String::from),
        Ok(serde_json::Value::String(text)) if !text.is_empty() => Some(text),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}
