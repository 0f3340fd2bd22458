use chrono::NaiveDateTime;
use thiserror::Error;

use crate::{
    db_types::{
        NewOrder,
        NewOrderItem,
        NewPaymentCallback,
        Order,
        OrderNumber,
        PaymentCallbackRecord,
        PaymentStatus,
    },
    traits::{CartApiError, CartManagement, GatewayError},
};

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Cart is empty")]
    EmptyCart,
    #[error("Insufficient stock for {product_name}")]
    InsufficientStock { product_id: i64, product_name: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("Order number {0} is already in use")]
    OrderNumberCollision(OrderNumber),
    #[error("{0}")]
    GatewayError(#[from] GatewayError),
    #[error("Payment could not be initiated for order {}: {source}", order.order_number)]
    PaymentInitiationFailed { order: Box<Order>, source: GatewayError },
    #[error("Illegal payment status change. {0}")]
    PaymentStatusUpdateError(String),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}

impl From<CartApiError> for CheckoutError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::DatabaseError(s) => CheckoutError::DatabaseError(s),
            other => CheckoutError::ValidationError(other.to_string()),
        }
    }
}

/// The gateway's final word on a payment, as carried by its callback.
#[derive(Debug, Clone, PartialEq)]
pub enum PaymentVerdict {
    Succeeded { receipt_number: Option<String>, transaction_date: Option<NaiveDateTime>, phone_number: Option<String> },
    Failed { reason: String },
}

impl PaymentVerdict {
    /// The payment status an order ends up in once this verdict is applied.
    pub fn payment_status(&self) -> PaymentStatus {
        match self {
            Self::Succeeded { .. } => PaymentStatus::Completed,
            Self::Failed { .. } => PaymentStatus::Failed,
        }
    }
}

/// Result of trying to move an order out of `pending`.
#[derive(Debug, Clone, PartialEq)]
pub enum Settlement {
    /// This call performed the transition.
    Applied(Order),
    /// The order had already left `pending`; it is returned unchanged.
    AlreadySettled(Order),
    /// No order carries the given checkout request id.
    NotFound,
}

/// Storage behaviour needed by the checkout and payment reconciliation flow.
///
/// Every method that changes `payment_status` must do so as a compare-and-swap from `pending`, inside a single
/// transaction, so that concurrent callbacks cannot both win.
#[allow(async_fn_in_trait)]
pub trait CheckoutManagement: CartManagement {
    /// Atomically reserves stock for every item and stores the order with its line items.
    ///
    /// Fails with [`CheckoutError::InsufficientStock`] if any product cannot cover its quantity, and with
    /// [`CheckoutError::OrderNumberCollision`] if the order number is taken. Nothing is written in either case.
    async fn create_order(&self, order: NewOrder, items: &[NewOrderItem]) -> Result<Order, CheckoutError>;

    /// Stores the gateway correlation ids on a still-pending order.
    async fn attach_payment_request(
        &self,
        order_id: i64,
        checkout_request_id: &str,
        merchant_request_id: &str,
    ) -> Result<Order, CheckoutError>;

    /// Marks a pending order's payment as failed because the gateway never accepted it. The order status is left
    /// as is, and reserved stock is released.
    async fn fail_payment_initiation(&self, order_id: i64, reason: &str) -> Result<Order, CheckoutError>;

    /// Completes payment for an order whose method has no asynchronous confirmation step.
    async fn complete_offline_payment(&self, order_id: i64) -> Result<Order, CheckoutError>;

    /// Applies the gateway's verdict to the order with the given checkout request id. Failed payments release their
    /// reserved stock in the same transaction.
    async fn settle_payment(&self, checkout_request_id: &str, verdict: &PaymentVerdict)
        -> Result<Settlement, CheckoutError>;

    async fn fetch_order_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Order>, CheckoutError>;

    /// Appends an entry to the callback audit trail.
    async fn record_payment_callback(
        &self,
        callback: NewPaymentCallback,
    ) -> Result<PaymentCallbackRecord, CheckoutError>;
}
