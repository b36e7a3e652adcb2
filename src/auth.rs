//! Authentication flows and access-token inspection
//!
//! Login exchanges credentials for a session; signup is a two-step OTP flow.
//! Tokens are only *inspected* here (base64url payload, no signature check)
//! so the session layer can optionally distrust expired ones.

use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::client::BankApi;
use crate::error::{DashboardError, Result};
use crate::session::{Session, SessionContext};
use crate::types::{LoginRequest, Route, SignupRequest, SignupVerifyRequest};

const LOGIN_FALLBACK: &str = "Invalid email or password. Please try again.";
const SIGNUP_OTP_FALLBACK: &str = "Failed to send OTP. Please try again.";
const SIGNUP_VERIFY_FALLBACK: &str = "Signup Failed. Invalid OTP or server error.";

/// Claims read from a JWT access token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (the account email)
    #[serde(default)]
    pub sub: Option<String>,

    /// Expiration (Unix timestamp)
    #[serde(default)]
    pub exp: Option<i64>,

    /// Issued at (Unix timestamp)
    #[serde(default)]
    pub iat: Option<i64>,
}

impl TokenClaims {
    /// Decode the payload segment; `None` for opaque or malformed tokens
    pub fn decode(token: &str) -> Option<Self> {
        let mut segments = token.split('.');
        let (_header, payload, _signature) = (segments.next()?, segments.next()?, segments.next()?);
        if segments.next().is_some() {
            return None;
        }

        // Tolerate padded encoders
        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('=')).ok()?;
        serde_json::from_slice(&bytes).ok()
    }

    /// Tokens without `exp` never expire client-side
    pub fn is_expired(&self, now: i64) -> bool {
        self.exp.is_some_and(|exp| exp <= now)
    }
}

/// Login form state
#[derive(Debug)]
pub struct LoginFlow {
    session: SessionContext,
    /// Inline error under the form
    pub error: Option<String>,
    pub loading: bool,
}

impl LoginFlow {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            error: None,
            loading: false,
        }
    }

    /// Already signed in users skip the form
    pub fn mount(&self) -> Route {
        if self.session.is_authenticated() {
            Route::Dashboard
        } else {
            Route::Login
        }
    }

    /// Exchange credentials for a session.
    ///
    /// On failure the route stays [`Route::Login`] and `error` carries the
    /// message to display; the typed error is returned as well.
    pub async fn submit<A: BankApi + ?Sized>(
        &mut self,
        api: &A,
        email: &str,
        password: &str,
    ) -> Result<Route> {
        self.error = None;

        let email = email.trim();
        if email.is_empty() || password.is_empty() {
            let err = DashboardError::Validation("Email and password are required.".into());
            self.error = Some(err.user_message(LOGIN_FALLBACK));
            return Err(err);
        }

        self.loading = true;
        let result = api
            .login(&LoginRequest {
                email: email.to_string(),
                password: password.to_string(),
            })
            .await;
        self.loading = false;

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "Login failed");
                self.error = Some(e.user_message(LOGIN_FALLBACK));
                return Err(e);
            }
        };

        let Some(access_token) = response.access_token.filter(|t| !t.is_empty()) else {
            let err = DashboardError::Api {
                status: 200,
                message: Some("Authentication failed: No token received".into()),
            };
            self.error = Some(err.user_message(LOGIN_FALLBACK));
            return Err(err);
        };

        self.session.set(&Session {
            access_token,
            refresh_token: response.refresh_token,
            username: response.username.or(response.email),
        })?;
        info!("Login succeeded");

        Ok(Route::Dashboard)
    }
}

/// Signup wizard steps
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignupStep {
    RequestOtp,
    VerifyOtp,
    Complete,
}

/// Two-step signup: email → OTP + password
#[derive(Debug)]
pub struct SignupWizard {
    session: SessionContext,
    pub step: SignupStep,
    pub email: String,
    /// Success or error banner
    pub notice: Option<String>,
    pub error: Option<String>,
    pub loading: bool,
}

impl SignupWizard {
    pub fn new(session: SessionContext) -> Self {
        Self {
            session,
            step: SignupStep::RequestOtp,
            email: String::new(),
            notice: None,
            error: None,
            loading: false,
        }
    }

    /// Signed in users go straight to the dashboard
    pub fn mount(&self) -> Route {
        if self.session.is_authenticated() {
            Route::Dashboard
        } else {
            Route::Signup
        }
    }

    fn clear_messages(&mut self) {
        self.notice = None;
        self.error = None;
    }

    /// Step 1: ask the backend to mail an OTP
    pub async fn request_otp<A: BankApi + ?Sized>(&mut self, api: &A, email: &str) -> Result<()> {
        self.clear_messages();

        let email = email.trim();
        if email.is_empty() {
            let err = DashboardError::Validation("Please enter your email.".into());
            self.error = Some(err.user_message(SIGNUP_OTP_FALLBACK));
            return Err(err);
        }

        self.loading = true;
        let result = api
            .signup_request(&SignupRequest {
                email: email.to_string(),
            })
            .await;
        self.loading = false;

        match result {
            Ok(reply) => {
                self.email = email.to_string();
                self.step = SignupStep::VerifyOtp;
                self.notice = Some(reply.message.unwrap_or_else(|| "OTP sent successfully!".into()));
                info!("Signup OTP requested");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Signup OTP request failed");
                self.error = Some(e.user_message(SIGNUP_OTP_FALLBACK));
                Err(e)
            }
        }
    }

    /// Step 2: verify the OTP and create the account.
    ///
    /// Routes to login, or straight to the dashboard when the backend hands
    /// back a token.
    pub async fn verify<A: BankApi + ?Sized>(
        &mut self,
        api: &A,
        otp: &str,
        password: &str,
    ) -> Result<Route> {
        self.clear_messages();

        if self.step != SignupStep::VerifyOtp {
            return Err(DashboardError::Validation("Request an OTP first.".into()));
        }
        let otp = otp.trim();
        if otp.is_empty() || password.is_empty() {
            let err = DashboardError::Validation("OTP and password are required.".into());
            self.error = Some(err.user_message(SIGNUP_VERIFY_FALLBACK));
            return Err(err);
        }

        self.loading = true;
        let result = api
            .signup_verify(&SignupVerifyRequest {
                email: self.email.clone(),
                otp: otp.to_string(),
                password: password.to_string(),
            })
            .await;
        self.loading = false;

        let reply = match result {
            Ok(reply) => reply,
            Err(e) => {
                warn!(error = %e, "Signup verification failed");
                self.error = Some(e.user_message(SIGNUP_VERIFY_FALLBACK));
                return Err(e);
            }
        };

        self.step = SignupStep::Complete;
        match reply.access_token.filter(|t| !t.is_empty()) {
            Some(access_token) => {
                self.session.set(&Session {
                    access_token,
                    refresh_token: reply.refresh_token,
                    username: reply.username,
                })?;
                self.notice = Some("Account created!".into());
                info!("Signup completed with session");
                Ok(Route::Dashboard)
            }
            None => {
                self.notice = Some("Account created! Redirecting to login...".into());
                info!("Signup completed");
                Ok(Route::Login)
            }
        }
    }
}
