//! Scripted in-memory backend for flow tests

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use rust_decimal::Decimal;
use tokio::sync::Barrier;

use crate::client::BankApi;
use crate::error::{DashboardError, Result};
use crate::types::{
    Account, BuyStockRequest, LoginRequest, LoginResponse, MessageResponse, PortfolioEntry,
    SignupRequest, SignupVerifyRequest, SignupVerifyResponse, Transaction, TransferRequest,
};

/// Canned outcome for one endpoint
#[derive(Debug, Clone)]
pub enum Reply {
    Ok,
    /// Non-auth HTTP failure with optional server message
    Fail(u16, Option<String>),
    Unauthorized(u16),
    /// No response at all
    Transport,
}

impl Reply {
    fn into_result<T>(self, ok: T) -> Result<T> {
        match self {
            Reply::Ok => Ok(ok),
            Reply::Fail(status, message) => Err(DashboardError::Api { status, message }),
            Reply::Unauthorized(status) => Err(DashboardError::Unauthorized {
                status,
                message: None,
            }),
            Reply::Transport => Err(DashboardError::Http("connection refused".into())),
        }
    }
}

/// Per-endpoint call counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Calls {
    pub logins: usize,
    pub signup_requests: usize,
    pub signup_verifies: usize,
    pub balances: usize,
    pub histories: usize,
    pub otp_requests: usize,
    pub transfers: usize,
    pub statements: usize,
    pub portfolios: usize,
    pub buys: usize,
}

impl Calls {
    pub fn total(&self) -> usize {
        self.logins
            + self.signup_requests
            + self.signup_verifies
            + self.balances
            + self.histories
            + self.otp_requests
            + self.transfers
            + self.statements
            + self.portfolios
            + self.buys
    }
}

#[derive(Debug)]
struct Script {
    login: Reply,
    login_response: LoginResponse,
    signup_request: Reply,
    signup_verify: Reply,
    signup_verify_response: SignupVerifyResponse,
    balance: Reply,
    account: Account,
    history: Reply,
    transactions: Vec<Transaction>,
    otp: Reply,
    transfer: Reply,
    statement: Reply,
    portfolio: Reply,
    entries: Vec<PortfolioEntry>,
    buy: Reply,
}

#[derive(Debug)]
pub struct FakeBank {
    script: Mutex<Script>,
    calls: Mutex<Calls>,
    tokens_seen: Mutex<Vec<String>>,
    last_transfer: Mutex<Option<TransferRequest>>,
    last_buy: Mutex<Option<BuyStockRequest>>,
    /// Balance and history both wait here when set
    read_gate: Mutex<Option<Arc<Barrier>>>,
}

impl FakeBank {
    pub fn new() -> Self {
        let script = Script {
            login: Reply::Ok,
            login_response: LoginResponse {
                access_token: Some("abc".into()),
                refresh_token: None,
                username: Some("ishaq".into()),
                email: Some("ishaq@example.com".into()),
            },
            signup_request: Reply::Ok,
            signup_verify: Reply::Ok,
            signup_verify_response: SignupVerifyResponse::default(),
            balance: Reply::Ok,
            account: Account {
                id: Some(7),
                username: "ishaq".into(),
                email: Some("ishaq@example.com".into()),
                account_number: "ACC-1A2B3C".into(),
                current_balance: Decimal::from(5000),
            },
            history: Reply::Ok,
            transactions: Vec::new(),
            otp: Reply::Ok,
            transfer: Reply::Ok,
            statement: Reply::Ok,
            portfolio: Reply::Ok,
            entries: Vec::new(),
            buy: Reply::Ok,
        };
        Self {
            script: Mutex::new(script),
            calls: Mutex::new(Calls::default()),
            tokens_seen: Mutex::new(Vec::new()),
            last_transfer: Mutex::new(None),
            last_buy: Mutex::new(None),
            read_gate: Mutex::new(None),
        }
    }

    fn with_script<R>(&self, f: impl FnOnce(&mut Script) -> R) -> R {
        f(&mut self.script.lock().unwrap())
    }

    fn record(&self, f: impl FnOnce(&mut Calls)) {
        f(&mut self.calls.lock().unwrap());
    }

    fn saw_token(&self, token: &str) {
        self.tokens_seen.lock().unwrap().push(token.to_string());
    }

    pub fn calls(&self) -> Calls {
        self.calls.lock().unwrap().clone()
    }

    pub fn tokens_seen(&self) -> Vec<String> {
        self.tokens_seen.lock().unwrap().clone()
    }

    pub fn last_transfer(&self) -> Option<TransferRequest> {
        self.last_transfer.lock().unwrap().clone()
    }

    pub fn last_buy(&self) -> Option<BuyStockRequest> {
        self.last_buy.lock().unwrap().clone()
    }

    /// Make balance and history block until both are in flight
    pub fn gate_reads(&self) {
        *self.read_gate.lock().unwrap() = Some(Arc::new(Barrier::new(2)));
    }

    async fn pass_read_gate(&self) {
        let gate = self.read_gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.wait().await;
        }
    }

    pub fn set_login_reply(&self, reply: Reply, response: LoginResponse) {
        self.with_script(|s| {
            s.login = reply;
            s.login_response = response;
        });
    }

    pub fn set_signup_request_reply(&self, reply: Reply) {
        self.with_script(|s| s.signup_request = reply);
    }

    pub fn set_signup_verify_reply(&self, reply: Reply, response: SignupVerifyResponse) {
        self.with_script(|s| {
            s.signup_verify = reply;
            s.signup_verify_response = response;
        });
    }

    pub fn set_balance_reply(&self, reply: Reply) {
        self.with_script(|s| s.balance = reply);
    }

    pub fn set_account(&self, account: Account) {
        self.with_script(|s| s.account = account);
    }

    pub fn set_history_reply(&self, reply: Reply) {
        self.with_script(|s| s.history = reply);
    }

    pub fn set_transactions(&self, transactions: Vec<Transaction>) {
        self.with_script(|s| s.transactions = transactions);
    }

    pub fn set_otp_reply(&self, reply: Reply) {
        self.with_script(|s| s.otp = reply);
    }

    pub fn set_transfer_reply(&self, reply: Reply) {
        self.with_script(|s| s.transfer = reply);
    }

    pub fn set_statement_reply(&self, reply: Reply) {
        self.with_script(|s| s.statement = reply);
    }

    pub fn set_portfolio(&self, reply: Reply, entries: Vec<PortfolioEntry>) {
        self.with_script(|s| {
            s.portfolio = reply;
            s.entries = entries;
        });
    }

    pub fn set_buy_reply(&self, reply: Reply) {
        self.with_script(|s| s.buy = reply);
    }
}

#[async_trait]
impl BankApi for FakeBank {
    async fn login(&self, _request: &LoginRequest) -> Result<LoginResponse> {
        self.record(|c| c.logins += 1);
        self.with_script(|s| s.login.clone().into_result(s.login_response.clone()))
    }

    async fn signup_request(&self, _request: &SignupRequest) -> Result<MessageResponse> {
        self.record(|c| c.signup_requests += 1);
        self.with_script(|s| s.signup_request.clone().into_result(MessageResponse::default()))
    }

    async fn signup_verify(&self, _request: &SignupVerifyRequest) -> Result<SignupVerifyResponse> {
        self.record(|c| c.signup_verifies += 1);
        self.with_script(|s| {
            s.signup_verify
                .clone()
                .into_result(s.signup_verify_response.clone())
        })
    }

    async fn my_balance(&self, token: &str) -> Result<Account> {
        self.record(|c| c.balances += 1);
        self.saw_token(token);
        self.pass_read_gate().await;
        self.with_script(|s| s.balance.clone().into_result(s.account.clone()))
    }

    async fn transaction_history(&self, token: &str) -> Result<Vec<Transaction>> {
        self.record(|c| c.histories += 1);
        self.saw_token(token);
        self.pass_read_gate().await;
        self.with_script(|s| s.history.clone().into_result(s.transactions.clone()))
    }

    async fn request_transfer_otp(&self, token: &str) -> Result<MessageResponse> {
        self.record(|c| c.otp_requests += 1);
        self.saw_token(token);
        self.with_script(|s| s.otp.clone().into_result(MessageResponse::default()))
    }

    async fn transfer(&self, token: &str, request: &TransferRequest) -> Result<MessageResponse> {
        self.record(|c| c.transfers += 1);
        self.saw_token(token);
        *self.last_transfer.lock().unwrap() = Some(request.clone());
        self.with_script(|s| s.transfer.clone().into_result(MessageResponse::default()))
    }

    async fn download_statement(&self, token: &str) -> Result<Vec<u8>> {
        self.record(|c| c.statements += 1);
        self.saw_token(token);
        self.with_script(|s| s.statement.clone().into_result(b"%PDF-1.4".to_vec()))
    }

    async fn portfolio(&self, token: &str) -> Result<Vec<PortfolioEntry>> {
        self.record(|c| c.portfolios += 1);
        self.saw_token(token);
        self.with_script(|s| s.portfolio.clone().into_result(s.entries.clone()))
    }

    async fn buy_stock(&self, token: &str, request: &BuyStockRequest) -> Result<MessageResponse> {
        self.record(|c| c.buys += 1);
        self.saw_token(token);
        *self.last_buy.lock().unwrap() = Some(request.clone());
        self.with_script(|s| s.buy.clone().into_result(MessageResponse::default()))
    }
}
