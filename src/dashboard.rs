//! Dashboard orchestrator
//!
//! Owns everything the dashboard screen shows and coordinates the backend
//! calls behind it. The server is the only source of truth: after every
//! successful mutation the balance and history are pulled again, nothing is
//! patched locally.

use rust_decimal::Decimal;
use tracing::{debug, error, info, warn};

use crate::client::BankApi;
use crate::config::Config;
use crate::error::{DashboardError, Result};
use crate::session::SessionContext;
use crate::transfer::TransferWizard;
use crate::types::{Account, BuyStockRequest, PortfolioEntry, Route, Transaction};

const REFRESH_FALLBACK: &str = "Failed to load account data.";
const BUY_FALLBACK: &str = "Purchase failed.";
const PORTFOLIO_FALLBACK: &str = "Failed to load portfolio.";
const STATEMENT_FALLBACK: &str = "Failed to generate PDF statement.";

/// A downloaded account statement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Statement {
    /// Suggested name, `Statement_<username>.pdf`
    pub file_name: String,
    pub bytes: Vec<u8>,
}

/// Dashboard screen state and actions
#[derive(Debug)]
pub struct Dashboard<A: BankApi> {
    api: A,
    session: SessionContext,
    stock_symbol: String,
    route: Route,

    pub account: Option<Account>,
    pub transactions: Vec<Transaction>,
    pub portfolio: Vec<PortfolioEntry>,
    /// True while balance and history are in flight
    pub loading: bool,
    pub transfer: TransferWizard,
    pub notice: Option<String>,
    pub error: Option<String>,
}

impl<A: BankApi> Dashboard<A> {
    pub fn new(api: A, session: SessionContext, config: &Config) -> Self {
        Self {
            api,
            session,
            stock_symbol: config.stock_symbol.clone(),
            route: Route::Dashboard,
            account: None,
            transactions: Vec::new(),
            portfolio: Vec::new(),
            loading: false,
            transfer: TransferWizard::new(),
            notice: None,
            error: None,
        }
    }

    /// Where the front end should be right now
    pub fn route(&self) -> Route {
        self.route
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn session(&self) -> &SessionContext {
        &self.session
    }

    pub fn stock_symbol(&self) -> &str {
        &self.stock_symbol
    }

    /// Enter the dashboard. Without a session nothing is fetched.
    pub async fn mount(&mut self) -> Route {
        if !self.session.is_authenticated() {
            info!("No session, redirecting to login");
            self.route = Route::Login;
            return self.route;
        }

        self.route = Route::Dashboard;
        if let Err(e) = self.refresh().await {
            debug!(error = %e, "Initial load incomplete");
        }
        self.route
    }

    /// Re-read balance and history concurrently.
    ///
    /// State is replaced only when both succeed.
    pub async fn refresh(&mut self) -> Result<()> {
        let token = self.token()?;

        self.loading = true;
        let (balance, history) = futures::join!(
            self.api.my_balance(&token),
            self.api.transaction_history(&token)
        );
        self.loading = false;

        let failure = match (balance, history) {
            (Ok(account), Ok(transactions)) => {
                info!(
                    account = %account.account_number,
                    transactions = transactions.len(),
                    "Dashboard refreshed"
                );
                self.account = Some(account);
                self.transactions = transactions;
                self.error = None;
                return Ok(());
            }
            // Auth failure wins so the session is always invalidated
            (Err(a), Err(b)) => {
                if b.is_auth_failure() {
                    b
                } else {
                    a
                }
            }
            (Err(e), Ok(_)) | (Ok(_), Err(e)) => e,
        };

        Err(self.fail(failure, REFRESH_FALLBACK))
    }

    /// Issue the transfer OTP for the details in the wizard
    pub async fn request_transfer_otp(&mut self) -> Result<()> {
        let token = self.token()?;
        let result = self.transfer.request_otp(&self.api, &token).await;
        self.after_wizard(result)
    }

    /// Confirm the pending transfer; success triggers one refresh
    pub async fn confirm_transfer(&mut self) -> Result<()> {
        let token = self.token()?;
        let result = self.transfer.confirm(&self.api, &token).await;
        self.after_wizard(result)?;
        let refreshed = self.refresh().await;
        reload_after_mutation(refreshed)
    }

    /// Buy `quantity_input` shares at the current ticker `price`
    pub async fn buy_stock(&mut self, quantity_input: &str, price: f64) -> Result<()> {
        self.notice = None;
        self.error = None;

        let Some(quantity) = quantity_input
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|q| *q > 0)
        else {
            let err = DashboardError::Validation("Invalid quantity.".into());
            self.error = Some(err.user_message(BUY_FALLBACK));
            return Err(err);
        };
        let price = Decimal::try_from(price)
            .map(|p| p.round_dp(2))
            .map_err(|_| DashboardError::Validation("Price unavailable.".into()))?;

        let token = self.token()?;
        let request = BuyStockRequest {
            symbol: self.stock_symbol.clone(),
            quantity,
            price,
        };

        if let Err(e) = self.api.buy_stock(&token, &request).await {
            return Err(self.fail(e, BUY_FALLBACK));
        }

        info!(symbol = %request.symbol, quantity, price = %request.price, "Stock purchased");

        let refreshed = self.refresh().await;
        reload_after_mutation(refreshed)?;
        let reloaded = self.load_portfolio().await;
        reload_after_mutation(reloaded)?;

        self.notice = Some(format!(
            "Successfully purchased {quantity} {} stocks.",
            self.stock_symbol
        ));
        Ok(())
    }

    /// Reload owned positions
    pub async fn load_portfolio(&mut self) -> Result<()> {
        let token = self.token()?;
        match self.api.portfolio(&token).await {
            Ok(entries) => {
                debug!(positions = entries.len(), "Portfolio loaded");
                self.portfolio = entries;
                Ok(())
            }
            Err(e) => Err(self.fail(e, PORTFOLIO_FALLBACK)),
        }
    }

    /// Fetch the PDF statement
    pub async fn download_statement(&mut self) -> Result<Statement> {
        let token = self.token()?;
        match self.api.download_statement(&token).await {
            Ok(bytes) => {
                let statement = Statement {
                    file_name: format!("Statement_{}.pdf", self.statement_owner()),
                    bytes,
                };
                info!(file = %statement.file_name, size = statement.bytes.len(), "Statement downloaded");
                Ok(statement)
            }
            Err(e) => Err(self.fail(e, STATEMENT_FALLBACK)),
        }
    }

    /// End the session and leave the dashboard
    pub fn logout(&mut self) -> Result<()> {
        self.reset();
        self.session.clear()?;
        info!("Logged out");
        Ok(())
    }

    fn statement_owner(&self) -> String {
        self.account
            .as_ref()
            .map(|a| a.username.clone())
            .filter(|u| !u.is_empty())
            .or_else(|| self.session.username())
            .unwrap_or_else(|| "user".to_string())
    }

    /// Current access token, or route to login
    fn token(&mut self) -> Result<String> {
        if let Some(token) = self.session.access_token() {
            return Ok(token);
        }
        self.reset();
        Err(DashboardError::NotLoggedIn)
    }

    /// Wizard errors are already on the wizard; only auth needs handling here
    fn after_wizard(&mut self, result: Result<()>) -> Result<()> {
        if result.as_ref().is_err_and(DashboardError::is_auth_failure) {
            self.invalidate();
        }
        result
    }

    /// Route a failed call: auth ends the session, anything else is shown
    fn fail(&mut self, e: DashboardError, fallback: &str) -> DashboardError {
        if e.is_auth_failure() {
            self.invalidate();
        } else {
            warn!(error = %e, "Dashboard request failed");
            self.error = Some(e.user_message(fallback));
        }
        e
    }

    fn invalidate(&mut self) {
        error!("Session rejected by backend, logging out");
        if let Err(e) = self.session.clear() {
            warn!(error = %e, "Failed to clear session");
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.account = None;
        self.transactions.clear();
        self.portfolio.clear();
        self.transfer.cancel();
        self.loading = false;
        self.notice = None;
        self.route = Route::Login;
    }
}

/// The mutation went through; only a lost session fails the action
fn reload_after_mutation(reload: Result<()>) -> Result<()> {
    match reload {
        Err(e) if e.is_auth_failure() => Err(e),
        Err(e) => {
            debug!(error = %e, "Reload after mutation failed");
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}
