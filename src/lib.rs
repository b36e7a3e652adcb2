//! VaultCore Dashboard - client for the VaultCore banking backend
//!
//! A thin orchestration layer: the backend owns balances, transfers, OTPs and
//! holdings; this crate keeps the session, drives the screens' state machines
//! and renders what the server returns.
//!
//! # Architecture
//! - `session`: persisted access token behind an injectable context
//! - `client`: bearer-authenticated HTTP client behind the `BankApi` trait
//! - `auth`: login and OTP signup flows
//! - `transfer`: OTP-guarded transfer wizard
//! - `dashboard`: balance/history orchestration, stock purchase, statement
//! - `ticker`: simulated live price feed
//! - `view`: plain-text rendering for the terminal front end

// Clippy configuration for client code patterns
#![allow(clippy::cast_precision_loss)] // Float casts OK for display
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::doc_markdown)] // Doc style flexibility
#![allow(clippy::new_without_default)] // Test doubles
#![allow(clippy::map_unwrap_or)] // Explicit error handling preference

pub mod auth;
pub mod client;
pub mod config;
pub mod dashboard;
pub mod error;
pub mod session;
pub mod ticker;
pub mod transfer;
pub mod types;
pub mod view;

#[cfg(test)]
mod testing;

pub use auth::{LoginFlow, SignupStep, SignupWizard, TokenClaims};
pub use client::{BankApi, BankClient};
pub use config::Config;
pub use dashboard::{Dashboard, Statement};
pub use error::{DashboardError, Result};
pub use session::{
    ExpiryPolicy, FileSessionStore, MemorySessionStore, Session, SessionContext, SessionStore,
};
pub use ticker::{PriceSample, PriceSimulator, Ticker, TickerHandle};
pub use transfer::{TransferStep, TransferWizard};
pub use types::*;
