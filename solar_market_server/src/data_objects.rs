use std::fmt::Display;

use serde::{Deserialize, Serialize};
use slm_common::Money;
use solar_market_engine::{
    db_types::{Order, OrderStatus, PaymentStatus, Role},
    order_objects::CheckoutResult,
    traits::data_objects::{OrderQueryFilter, ProductFilter, UserQueryFilter},
};

use crate::errors::ServerError;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

//----------------------------------------------   M-PESA  ----------------------------------------------------
/// The only answer the gateway ever gets from the callback route.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallbackAck {
    #[serde(rename = "ResultCode")]
    pub result_code: i64,
    #[serde(rename = "ResultDesc")]
    pub result_desc: String,
}

impl CallbackAck {
    pub fn accepted() -> Self {
        Self { result_code: 0, result_desc: "Success".to_string() }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CallbackToken {
    pub token: Option<String>,
}

//----------------------------------------------   Catalogue  ----------------------------------------------------
/// Catalogue query string. Prices are in KES.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductSearchParams {
    pub search: Option<String>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub min_wattage: Option<i64>,
    pub max_wattage: Option<i64>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ProductSearchParams {
    pub fn filter(&self) -> Result<ProductFilter, ServerError> {
        let price = |name: &str, v: Option<f64>| -> Result<Option<Money>, ServerError> {
            v.map(|p| {
                Money::try_from_units_f64(p)
                    .ok()
                    .filter(|m| !m.is_negative())
                    .ok_or_else(|| ServerError::ValidationError(format!("{name} must be a non-negative amount")))
            })
            .transpose()
        };
        let mut filter = ProductFilter::default()
            .with_price_range(price("min_price", self.min_price)?, price("max_price", self.max_price)?)
            .with_wattage_range(self.min_wattage, self.max_wattage);
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            filter = filter.with_search(search);
        }
        Ok(filter)
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct PageParams {
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

//----------------------------------------------   Orders  ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderSearchParams {
    pub customer_id: Option<i64>,
    pub payment_status: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl OrderSearchParams {
    pub fn filter(&self) -> OrderQueryFilter {
        OrderQueryFilter {
            customer_id: self.customer_id,
            payment_status: self.payment_status,
            order_status: self.order_status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckoutResponse {
    pub message: String,
    pub order: Order,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mpesa: Option<MpesaPrompt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MpesaPrompt {
    pub checkout_request_id: String,
    pub customer_message: String,
}

impl From<CheckoutResult> for CheckoutResponse {
    fn from(result: CheckoutResult) -> Self {
        match result.payment {
            Some(p) => Self {
                message: "M-PESA payment initiated. Check your phone.".to_string(),
                order: result.order,
                mpesa: Some(MpesaPrompt {
                    checkout_request_id: p.checkout_request_id,
                    customer_message: p.customer_message,
                }),
            },
            None => Self { message: "Order placed successfully".to_string(), order: result.order, mpesa: None },
        }
    }
}

//----------------------------------------------   Users  ----------------------------------------------------
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UserSearchParams {
    pub role: Option<Role>,
}

impl From<UserSearchParams> for UserQueryFilter {
    fn from(params: UserSearchParams) -> Self {
        UserQueryFilter { role: params.role }
    }
}

//----------------------------------------------   Cart  ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AddToCartRequest {
    pub product_id: Option<i64>,
    pub quantity: Option<i64>,
}

impl AddToCartRequest {
    /// Returns the product id and quantity. The quantity defaults to 1.
    pub fn validate(&self) -> Result<(i64, i64), ServerError> {
        let product_id =
            self.product_id.ok_or_else(|| ServerError::ValidationError("product_id is required".to_string()))?;
        Ok((product_id, self.quantity.unwrap_or(1)))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateCartRequest {
    pub quantity: Option<i64>,
}

//----------------------------------------------   Tickets  ----------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketReply {
    pub message: Option<String>,
    #[serde(default)]
    pub resolve: bool,
}
