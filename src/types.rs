//! Common types for the dashboard client
//!
//! Wire shapes exchanged with the VaultCore backend plus the navigation
//! target returned by every flow.

use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Where the front end should go next
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Signup,
    Dashboard,
}

/// Account summary from `/api/account/my-balance`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Internal account id, compared against `Transaction::sender_account_id`
    #[serde(default)]
    pub id: Option<i64>,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub account_number: String,
    #[serde(default)]
    pub current_balance: Decimal,
}

/// Money movement direction relative to the current account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Debit,
    Credit,
}

impl std::fmt::Display for Direction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Direction::Debit => write!(f, "Debited"),
            Direction::Credit => write!(f, "Credited"),
        }
    }
}

/// A transaction from `/api/transaction/history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub id: i64,
    #[serde(default)]
    pub sender_account_id: Option<i64>,
    #[serde(default)]
    pub receiver_account_id: Option<i64>,
    pub amount: Decimal,
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub timestamp: Option<NaiveDateTime>,
}

impl Transaction {
    /// Debit when the current account sent it, credit otherwise
    pub fn direction(&self, my_account_id: Option<i64>) -> Direction {
        match (self.sender_account_id, my_account_id) {
            (Some(sender), Some(me)) if sender == me => Direction::Debit,
            _ => Direction::Credit,
        }
    }
}

/// An owned stock position from `/api/stocks/portfolio`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortfolioEntry {
    pub id: i64,
    pub stock_symbol: String,
    pub quantity: i64,
    pub avg_buy_price: Decimal,
}

impl PortfolioEntry {
    /// Cost basis at the average buy price; `None` if it overflows
    pub fn invested(&self) -> Option<Decimal> {
        self.avg_buy_price.checked_mul(Decimal::from(self.quantity))
    }
}

/// Login body
#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Login response; `token` is the legacy name for the access token
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    #[serde(alias = "token")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

/// Signup step 1 body
#[derive(Debug, Clone, Serialize)]
pub struct SignupRequest {
    pub email: String,
}

/// Signup step 2 body
#[derive(Debug, Clone, Serialize)]
pub struct SignupVerifyRequest {
    pub email: String,
    pub otp: String,
    pub password: String,
}

/// Signup verify response; some deployments log the user in directly
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupVerifyResponse {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, alias = "token")]
    pub access_token: Option<String>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub username: Option<String>,
}

/// OTP-confirmed transfer body
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransferRequest {
    pub receiver_account: String,
    pub amount: Decimal,
    pub otp: String,
}

/// Stock purchase body
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BuyStockRequest {
    pub symbol: String,
    pub quantity: u32,
    pub price: Decimal,
}

/// Generic `{ "message": ... }` reply
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}
