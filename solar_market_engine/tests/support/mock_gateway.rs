use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use serde_json::{json, Value};
use solar_market_engine::traits::{GatewayError, PaymentGateway, PaymentInitiation, PaymentRequest};

/// An in-process stand-in for the M-PESA gateway.
///
/// Requests are accepted with sequential correlation ids unless a failure has been scripted with [`Self::fail_next`].
/// Every request is recorded. Clones share state, so a test can keep a handle after giving one to the engine.
#[derive(Clone, Default)]
pub struct MockGateway {
    state: Arc<Mutex<GatewayState>>,
}

#[derive(Default)]
struct GatewayState {
    failures: VecDeque<GatewayError>,
    requests: Vec<PaymentRequest>,
    queries: Vec<String>,
    counter: u64,
}

impl MockGateway {
    pub fn fail_next(&self, error: GatewayError) {
        self.state.lock().unwrap().failures.push_back(error);
    }

    pub fn requests(&self) -> Vec<PaymentRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn queries(&self) -> Vec<String> {
        self.state.lock().unwrap().queries.clone()
    }

    pub fn checkout_request_id(n: u64) -> String {
        format!("ws_CO_1512202314302{n:04}")
    }
}

impl PaymentGateway for MockGateway {
    async fn initiate_payment(&self, request: PaymentRequest) -> Result<PaymentInitiation, GatewayError> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(request);
        if let Some(e) = state.failures.pop_front() {
            return Err(e);
        }
        state.counter += 1;
        let n = state.counter;
        Ok(PaymentInitiation {
            checkout_request_id: Self::checkout_request_id(n),
            merchant_request_id: format!("29115-34620561-{n}"),
            customer_message: "Success. Request accepted for processing".to_string(),
        })
    }

    async fn query_status(&self, checkout_request_id: &str) -> Result<Value, GatewayError> {
        self.state.lock().unwrap().queries.push(checkout_request_id.to_string());
        Ok(json!({
            "ResponseCode": "0",
            "CheckoutRequestID": checkout_request_id,
            "ResultCode": "0",
            "ResultDesc": "The service request is processed successfully."
        }))
    }
}
