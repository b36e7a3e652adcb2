//! OTP-guarded transfer wizard
//!
//! `EnteringDetails → AwaitingOtp → Confirmed`. Failures never move the
//! wizard; they set `error` and leave user input in place so the same step
//! can be retried. Only presence and positivity are checked locally, the
//! backend decides everything else.

use std::str::FromStr;

use rust_decimal::Decimal;
use tracing::{info, warn};

use crate::client::BankApi;
use crate::error::{DashboardError, Result};
use crate::types::TransferRequest;

const OTP_REQUEST_FALLBACK: &str = "Failed to initiate transfer.";
const CONFIRM_FALLBACK: &str = "Transfer failed. Check OTP or Balance.";

/// Wizard step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TransferStep {
    #[default]
    EnteringDetails,
    AwaitingOtp,
    Confirmed,
}

/// Transfer form state
#[derive(Debug, Clone, Default)]
pub struct TransferWizard {
    step: TransferStep,
    /// Raw form fields, kept verbatim between attempts
    pub receiver_account: String,
    pub amount: String,
    pub otp: String,
    error: Option<String>,
    notice: Option<String>,
}

impl TransferWizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> TransferStep {
        self.step
    }

    /// Error overlay for the current step
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Last success message from the backend
    pub fn notice(&self) -> Option<&str> {
        self.notice.as_deref()
    }

    /// Recipient and a strictly positive amount
    pub fn validated_details(&self) -> Result<(String, Decimal)> {
        let receiver = self.receiver_account.trim();
        if receiver.is_empty() {
            return Err(DashboardError::Validation(
                "Please enter an account number.".into(),
            ));
        }

        let amount = Decimal::from_str(self.amount.trim())
            .ok()
            .filter(|a| a.is_sign_positive() && !a.is_zero())
            .ok_or_else(|| DashboardError::Validation("Please enter a valid amount.".into()))?;

        Ok((receiver.to_string(), amount))
    }

    /// Ask the backend to issue an OTP for this transfer
    pub async fn request_otp<A: BankApi + ?Sized>(&mut self, api: &A, token: &str) -> Result<()> {
        self.error = None;
        self.notice = None;

        if self.step != TransferStep::EnteringDetails {
            return Err(self.reject("OTP already requested."));
        }
        if let Err(e) = self.validated_details() {
            self.error = Some(e.user_message(OTP_REQUEST_FALLBACK));
            return Err(e);
        }

        match api.request_transfer_otp(token).await {
            Ok(reply) => {
                self.step = TransferStep::AwaitingOtp;
                self.notice = Some(
                    reply
                        .message
                        .unwrap_or_else(|| "OTP has been sent to your registered email.".into()),
                );
                info!("Transfer OTP issued");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Transfer OTP request failed");
                self.error = Some(e.user_message(OTP_REQUEST_FALLBACK));
                Err(e)
            }
        }
    }

    /// Submit the transfer with the entered OTP
    pub async fn confirm<A: BankApi + ?Sized>(&mut self, api: &A, token: &str) -> Result<()> {
        self.error = None;
        self.notice = None;

        if self.step != TransferStep::AwaitingOtp {
            return Err(self.reject("Request an OTP first."));
        }

        let request = match self.build_request() {
            Ok(request) => request,
            Err(e) => {
                self.error = Some(e.user_message(CONFIRM_FALLBACK));
                return Err(e);
            }
        };

        match api.transfer(token, &request).await {
            Ok(reply) => {
                self.step = TransferStep::Confirmed;
                self.otp.clear();
                self.notice = Some(reply.message.unwrap_or_else(|| "Transfer Successful!".into()));
                info!(receiver = %request.receiver_account, amount = %request.amount, "Transfer confirmed");
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Transfer rejected");
                self.error = Some(e.user_message(CONFIRM_FALLBACK));
                Err(e)
            }
        }
    }

    /// Out-of-order step: shown like any other validation error
    fn reject(&mut self, message: &str) -> DashboardError {
        self.error = Some(message.to_string());
        DashboardError::Validation(message.to_string())
    }

    fn build_request(&self) -> Result<TransferRequest> {
        let (receiver_account, amount) = self.validated_details()?;
        let otp = self.otp.trim();
        if otp.is_empty() {
            return Err(DashboardError::Validation("Please enter the OTP.".into()));
        }
        Ok(TransferRequest {
            receiver_account,
            amount,
            otp: otp.to_string(),
        })
    }

    /// Leave OTP entry, keeping recipient and amount
    pub fn back_to_details(&mut self) {
        if self.step == TransferStep::AwaitingOtp {
            self.step = TransferStep::EnteringDetails;
            self.otp.clear();
            self.error = None;
            self.notice = None;
        }
    }

    /// Start over after a confirmed transfer
    pub fn make_another(&mut self) {
        if self.step == TransferStep::Confirmed {
            *self = Self::default();
        }
    }

    /// Drop the pending request from any step
    pub fn cancel(&mut self) {
        *self = Self::default();
    }
}
