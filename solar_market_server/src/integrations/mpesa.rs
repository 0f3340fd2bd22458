//! Glue between the Daraja client in `mpesa_tools` and the engine's [`PaymentGateway`] seam.
use log::*;
use mpesa_tools::{MpesaApi, MpesaApiError, StkCallback};
use serde_json::Value;
use solar_market_engine::{
    order_objects::PaymentCallback,
    traits::{GatewayError, PaymentGateway, PaymentInitiation, PaymentRequest},
};

/// Result code used for callbacks that arrive without one. Any non-zero code is treated as a failed payment.
const MISSING_RESULT_CODE: i64 = -1;

#[derive(Clone)]
pub struct MpesaGateway {
    api: MpesaApi,
}

impl MpesaGateway {
    pub fn new(api: MpesaApi) -> Self {
        Self { api }
    }
}

impl PaymentGateway for MpesaGateway {
    async fn initiate_payment(&self, request: PaymentRequest) -> Result<PaymentInitiation, GatewayError> {
        // Daraja only takes whole shillings. Round up so that we never undercharge.
        let amount = request.amount.whole_units_ceil();
        let response = self
            .api
            .stk_push(&request.phone, amount, &request.account_reference, &request.description)
            .await
            .map_err(gateway_error)?;
        Ok(PaymentInitiation {
            checkout_request_id: response.checkout_request_id,
            merchant_request_id: response.merchant_request_id,
            customer_message: response.customer_message,
        })
    }

    async fn query_status(&self, checkout_request_id: &str) -> Result<Value, GatewayError> {
        self.api.stk_query(checkout_request_id).await.map_err(gateway_error)
    }
}

pub fn gateway_error(e: MpesaApiError) -> GatewayError {
    debug!("📲️ M-PESA call failed. {e}");
    match e {
        MpesaApiError::Timeout(s) => GatewayError::Timeout(s),
        MpesaApiError::Network(s) | MpesaApiError::Initialization(s) => GatewayError::Network(s),
        MpesaApiError::AuthenticationFailed(s) => GatewayError::Authentication(s),
        MpesaApiError::QueryError { status, message } if status >= 500 => {
            GatewayError::Network(format!("HTTP {status}. {message}"))
        },
        MpesaApiError::QueryError { status, message } => {
            GatewayError::Rejected { code: status.to_string(), description: message }
        },
        MpesaApiError::JsonError(s) => GatewayError::InvalidResponse(s),
        MpesaApiError::Rejected { code, description } => GatewayError::Rejected { code, description },
    }
}

/// Strips the Daraja wire format from an STK callback.
pub fn callback_from_stk(cb: &StkCallback) -> PaymentCallback {
    let metadata = cb.metadata();
    let result_code = cb.result_code.unwrap_or_else(|| {
        warn!("📲️ Callback for {} carries no result code. Treating it as a failure.", cb.checkout_request_id);
        MISSING_RESULT_CODE
    });
    PaymentCallback {
        checkout_request_id: cb.checkout_request_id.clone(),
        merchant_request_id: cb.merchant_request_id.clone(),
        result_code,
        result_desc: cb.result_desc.clone(),
        amount: metadata.amount,
        receipt_number: metadata.receipt_number,
        transaction_date: metadata.transaction_date,
        phone_number: metadata.phone_number,
    }
}
