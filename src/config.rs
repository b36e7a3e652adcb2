//! Configuration management for the dashboard client

use std::path::PathBuf;

use crate::error::{DashboardError, Result};

/// Dashboard client configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Backend base URL (scheme + host + port)
    pub api_base_url: String,

    /// Login route; the legacy backend exposes `/login`
    pub login_path: String,

    /// Where the session keys are persisted between runs
    pub session_file: PathBuf,

    pub request_timeout_secs: u64,

    /// Treat tokens with a past `exp` claim as absent
    pub enforce_token_expiry: bool,

    /// Symbol bought from the stock panel
    pub stock_symbol: String,

    /// Live ticker
    pub ticker_base_price: f64,
    pub ticker_interval_ms: u64,
    pub ticker_window: usize,

    /// Log level
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: "http://localhost:8080".to_string(),
            login_path: "/api/auth/login".to_string(),
            session_file: default_session_file(),
            request_timeout_secs: 30,
            enforce_token_expiry: false,
            stock_symbol: "VAULT".to_string(),
            ticker_base_price: 100.0,
            ticker_interval_ms: 1000,
            ticker_window: 30,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from `VAULTCORE_*` environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from any key lookup (environment, test maps)
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            api_base_url: lookup("VAULTCORE_API_BASE_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or(defaults.api_base_url),

            login_path: lookup("VAULTCORE_LOGIN_PATH").unwrap_or(defaults.login_path),

            session_file: lookup("VAULTCORE_SESSION_FILE")
                .map(PathBuf::from)
                .unwrap_or(defaults.session_file),

            request_timeout_secs: lookup("VAULTCORE_REQUEST_TIMEOUT_SECS")
                .map(|v| v.parse().unwrap_or(defaults.request_timeout_secs))
                .unwrap_or(defaults.request_timeout_secs),

            enforce_token_expiry: lookup("VAULTCORE_ENFORCE_TOKEN_EXPIRY")
                .map(|v| v.to_lowercase() == "true")
                .unwrap_or(defaults.enforce_token_expiry),

            stock_symbol: lookup("VAULTCORE_STOCK_SYMBOL").unwrap_or(defaults.stock_symbol),

            ticker_base_price: lookup("VAULTCORE_TICKER_BASE_PRICE")
                .map(|v| v.parse().unwrap_or(defaults.ticker_base_price))
                .unwrap_or(defaults.ticker_base_price),

            ticker_interval_ms: lookup("VAULTCORE_TICKER_INTERVAL_MS")
                .map(|v| v.parse().unwrap_or(defaults.ticker_interval_ms))
                .unwrap_or(defaults.ticker_interval_ms),

            ticker_window: lookup("VAULTCORE_TICKER_WINDOW")
                .map(|v| v.parse().unwrap_or(defaults.ticker_window))
                .unwrap_or(defaults.ticker_window),

            log_level: lookup("VAULTCORE_LOG_LEVEL").unwrap_or(defaults.log_level),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if !self.api_base_url.starts_with("http://") && !self.api_base_url.starts_with("https://")
        {
            return Err(DashboardError::Config(format!(
                "api_base_url must be an http(s) URL, got {}",
                self.api_base_url
            )));
        }
        if !self.login_path.starts_with('/') {
            return Err(DashboardError::Config("login_path must start with '/'".into()));
        }
        if self.request_timeout_secs == 0 {
            return Err(DashboardError::Config("request_timeout_secs must be positive".into()));
        }
        if self.ticker_interval_ms == 0 {
            return Err(DashboardError::Config("ticker_interval_ms must be positive".into()));
        }
        if !self.ticker_base_price.is_finite() || self.ticker_base_price <= 0.0 {
            return Err(DashboardError::Config(
                "ticker_base_price must be a positive finite number".into(),
            ));
        }
        if self.ticker_window == 0 {
            return Err(DashboardError::Config("ticker_window must be positive".into()));
        }
        if self.stock_symbol.trim().is_empty() {
            return Err(DashboardError::Config("stock_symbol required".into()));
        }
        Ok(())
    }
}

fn default_session_file() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".vaultcore")
        .join("session.json")
}
