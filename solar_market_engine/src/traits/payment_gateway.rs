use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::db_types::Money;

/// A request to collect `amount` from the holder of `phone`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentRequest {
    pub phone: String,
    pub amount: Money,
    /// Shown to the payer. The order number.
    pub account_reference: String,
    pub description: String,
}

/// The gateway's acknowledgement that a payment prompt has been sent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentInitiation {
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub customer_message: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum GatewayError {
    #[error("Could not reach the payment gateway: {0}")]
    Network(String),
    #[error("The payment gateway timed out: {0}")]
    Timeout(String),
    #[error("The payment gateway rejected the request ({code}): {description}")]
    Rejected { code: String, description: String },
    #[error("The payment gateway refused our credentials: {0}")]
    Authentication(String),
    #[error("The payment gateway sent an unexpected response: {0}")]
    InvalidResponse(String),
}

impl GatewayError {
    /// Network trouble may clear up on a later attempt. A rejection is the gateway's final business decision.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Timeout(_))
    }
}

/// The external payment processor, as seen by the checkout engine.
///
/// Implementations own credential management and any wire-format details. Every failure, including timeouts, must be
/// reported as a [`GatewayError`].
#[allow(async_fn_in_trait)]
pub trait PaymentGateway {
    /// Asks the gateway to prompt the payer. Returns the correlation ids that the asynchronous result will carry.
    async fn initiate_payment(&self, request: PaymentRequest) -> Result<PaymentInitiation, GatewayError>;

    /// Fetches the gateway's view of an earlier payment request. The payload is gateway-defined.
    async fn query_status(&self, checkout_request_id: &str) -> Result<Value, GatewayError>;
}
