//! Wire types for the asynchronous STK push result that Daraja posts to the callback URL.
//!
//! ```json
//! {"Body": {"stkCallback": {
//!     "MerchantRequestID": "29115-34620561-1",
//!     "CheckoutRequestID": "ws_CO_191220191020363925",
//!     "ResultCode": 0,
//!     "ResultDesc": "The service request is processed successfully.",
//!     "CallbackMetadata": {"Item": [
//!         {"Name": "Amount", "Value": 4030},
//!         {"Name": "MpesaReceiptNumber", "Value": "ABC123"},
//!         {"Name": "TransactionDate", "Value": 20231215143022},
//!         {"Name": "PhoneNumber", "Value": 254712345678}
//!     ]}
//! }}}
//! ```
use chrono::NaiveDateTime;
use log::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{data_objects::lenient_i64, MpesaApiError};

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StkCallbackEnvelope {
    #[serde(rename = "Body")]
    pub body: StkCallbackBody,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StkCallbackBody {
    #[serde(rename = "stkCallback")]
    pub stk_callback: StkCallback,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct StkCallback {
    #[serde(rename = "MerchantRequestID", default)]
    pub merchant_request_id: String,
    #[serde(rename = "CheckoutRequestID")]
    pub checkout_request_id: String,
    #[serde(rename = "ResultCode", default, deserialize_with = "lenient_i64")]
    pub result_code: Option<i64>,
    #[serde(rename = "ResultDesc", default)]
    pub result_desc: String,
    #[serde(rename = "CallbackMetadata", default)]
    pub callback_metadata: Option<CallbackMetadata>,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct CallbackMetadata {
    #[serde(rename = "Item", default)]
    pub items: Vec<MetadataItem>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct MetadataItem {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Value", default)]
    pub value: Option<Value>,
}

/// The interesting bits of a successful callback's metadata list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PaymentMetadata {
    pub amount: Option<f64>,
    pub receipt_number: Option<String>,
    pub transaction_date: Option<NaiveDateTime>,
    pub phone_number: Option<String>,
}

impl StkCallbackEnvelope {
    pub fn from_slice(body: &[u8]) -> Result<Self, MpesaApiError> {
        serde_json::from_slice(body).map_err(|e| MpesaApiError::JsonError(e.to_string()))
    }

    pub fn callback(&self) -> &StkCallback {
        &self.body.stk_callback
    }
}

impl StkCallback {
    /// A missing result code is treated as a failure.
    pub fn is_success(&self) -> bool {
        self.result_code == Some(0)
    }

    pub fn metadata(&self) -> PaymentMetadata {
        let mut result = PaymentMetadata::default();
        let Some(meta) = &self.callback_metadata else {
            return result;
        };
        for item in &meta.items {
            let Some(value) = &item.value else { continue };
            match item.name.as_str() {
                "Amount" => result.amount = value_as_f64(value),
                "MpesaReceiptNumber" => result.receipt_number = Some(value_as_string(value)),
                "TransactionDate" => {
                    let raw = value_as_string(value);
                    result.transaction_date = NaiveDateTime::parse_from_str(&raw, "%Y%m%d%H%M%S")
                        .map_err(|e| warn!("📲️ Could not parse M-PESA transaction date '{raw}'. {e}"))
                        .ok();
                },
                "PhoneNumber" => result.phone_number = Some(value_as_string(value)),
                _ => trace!("📲️ Ignoring callback metadata item {}", item.name),
            }
        }
        result
    }
}

fn value_as_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn value_as_f64(v: &Value) -> Option<f64> {
    match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
