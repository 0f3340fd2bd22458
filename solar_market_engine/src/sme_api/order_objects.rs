use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{CallbackOutcome, CartLine, Money, Order, OrderItem, PaymentCallbackRecord, PaymentMethod},
    helpers::{clean_phone_number, require_text},
    traits::{CheckoutError, PaymentInitiation, PaymentVerdict},
};

//--------------------------------------   CheckoutRequest   ---------------------------------------------------------
/// The checkout parameters as supplied by the customer. Every field is required; missing fields are reported by
/// [`CheckoutRequest::validate`] rather than by the deserializer, so that the caller gets a useful message.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CheckoutRequest {
    pub payment_method: Option<String>,
    pub shipping_address: Option<String>,
    pub phone_number: Option<String>,
}

impl CheckoutRequest {
    pub fn new<S: Into<String>>(payment_method: S, shipping_address: S, phone_number: S) -> Self {
        Self {
            payment_method: Some(payment_method.into()),
            shipping_address: Some(shipping_address.into()),
            phone_number: Some(phone_number.into()),
        }
    }

    pub fn validate(&self) -> Result<ValidCheckout, CheckoutError> {
        use CheckoutError::ValidationError;
        let method = require_text("Payment method", self.payment_method.as_deref()).map_err(ValidationError)?;
        let shipping_address = require_text("Shipping address", self.shipping_address.as_deref()).map_err(ValidationError)?;
        let phone = require_text("Phone number", self.phone_number.as_deref()).map_err(ValidationError)?;
        let payment_method = method
            .parse::<PaymentMethod>()
            .map_err(|_| ValidationError(format!("Unsupported payment method: {method}")))?;
        let phone_number = clean_phone_number(&phone).map_err(ValidationError)?;
        Ok(ValidCheckout { payment_method, shipping_address, phone_number })
    }
}

/// A checkout request that has passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidCheckout {
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub phone_number: String,
}

//--------------------------------------    PricingPolicy    ---------------------------------------------------------
/// Server-side pricing. A flat shipping fee plus a tax rate, expressed in basis points, on the subtotal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    pub shipping_fee: Money,
    pub tax_rate_bps: u32,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        Self { shipping_fee: Money::from_units(1000), tax_rate_bps: 100 }
    }
}

impl PricingPolicy {
    pub fn new(shipping_fee: Money, tax_rate_bps: u32) -> Self {
        Self { shipping_fee, tax_rate_bps }
    }

    /// Prices the given cart lines using the product prices they carry. Fails if any amount overflows.
    pub fn quote(&self, lines: &[CartLine]) -> Result<OrderQuote, CheckoutError> {
        let too_large = || CheckoutError::ValidationError("Order total is too large".into());
        let subtotal = lines.iter().try_fold(Money::default(), |acc, line| {
            line.price.checked_mul(line.quantity).and_then(|t| acc.checked_add(t)).ok_or_else(too_large)
        })?;
        let tax = subtotal.basis_points(self.tax_rate_bps);
        let total = subtotal.checked_add(self.shipping_fee).and_then(|t| t.checked_add(tax)).ok_or_else(too_large)?;
        Ok(OrderQuote { subtotal, shipping_fee: self.shipping_fee, tax, total })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderQuote {
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub tax: Money,
    pub total: Money,
}

//--------------------------------------    CheckoutResult   ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckoutResult {
    pub order: Order,
    /// Present for M-PESA orders. The payer must confirm the prompt on their phone.
    pub payment: Option<PaymentInitiation>,
}

//--------------------------------------   PaymentCallback   ---------------------------------------------------------
/// A payment result pushed to us by the gateway, stripped of its wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCallback {
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub result_code: i64,
    pub result_desc: String,
    /// Whole currency units, as reported by the gateway.
    pub amount: Option<f64>,
    pub receipt_number: Option<String>,
    pub transaction_date: Option<NaiveDateTime>,
    pub phone_number: Option<String>,
}

impl PaymentCallback {
    pub fn is_success(&self) -> bool {
        self.result_code == 0
    }

    pub fn verdict(&self) -> PaymentVerdict {
        if self.is_success() {
            PaymentVerdict::Succeeded {
                receipt_number: self.receipt_number.clone(),
                transaction_date: self.transaction_date,
                phone_number: self.phone_number.clone(),
            }
        } else {
            let reason = if self.result_desc.trim().is_empty() {
                format!("Payment failed with result code {}", self.result_code)
            } else {
                self.result_desc.clone()
            };
            PaymentVerdict::Failed { reason }
        }
    }

    /// The reported amount in minor units, if the gateway sent a usable one.
    pub fn reported_amount(&self) -> Option<Money> {
        self.amount.and_then(|a| Money::try_from_units_f64(a).ok())
    }
}

//-------------------------------------- ReconciliationOutcome -------------------------------------------------------
/// What happened when a callback was reconciled against local state. None of these is an error from the gateway's
/// point of view.
#[derive(Debug, Clone, PartialEq)]
pub enum ReconciliationOutcome {
    /// The callback moved the order out of `pending`.
    Applied(Order),
    /// The callback moved the order to `completed`, but the amount reported differs from the amount requested.
    AmountMismatch { order: Order, requested: Money, reported: Option<Money> },
    /// The order was already in the state this callback asks for.
    Duplicate(Order),
    /// The order had already been settled the other way.
    Conflict(Order),
    /// No order carries the checkout request id.
    Unmatched,
}

impl ReconciliationOutcome {
    pub fn callback_outcome(&self) -> CallbackOutcome {
        match self {
            Self::Applied(_) => CallbackOutcome::Applied,
            Self::Duplicate(_) => CallbackOutcome::Duplicate,
            Self::AmountMismatch { .. } | Self::Conflict(_) => CallbackOutcome::Anomaly,
            Self::Unmatched => CallbackOutcome::Unmatched,
        }
    }

    pub fn order(&self) -> Option<&Order> {
        match self {
            Self::Applied(o) | Self::Duplicate(o) | Self::Conflict(o) => Some(o),
            Self::AmountMismatch { order, .. } => Some(order),
            Self::Unmatched => None,
        }
    }

    /// A human-readable note for the audit trail.
    pub fn note(&self) -> Option<String> {
        match self {
            Self::Applied(_) => None,
            Self::AmountMismatch { requested, reported: Some(r), .. } => {
                Some(format!("Amount mismatch. Requested {requested}, gateway reported {r}"))
            },
            Self::AmountMismatch { requested, reported: None, .. } => {
                Some(format!("Amount mismatch. Requested {requested}, gateway reported no amount"))
            },
            Self::Duplicate(o) => Some(format!("Order {} is already {}", o.order_number, o.payment_status)),
            Self::Conflict(o) => Some(format!(
                "Order {} was already {} when a contradicting callback arrived",
                o.order_number, o.payment_status
            )),
            Self::Unmatched => Some("No order carries this checkout request id".to_string()),
        }
    }
}

//--------------------------------------      CartView       ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartView {
    pub items: Vec<CartLine>,
    /// Computed from live product prices.
    pub subtotal: Money,
    pub item_count: usize,
}

impl CartView {
    pub fn new(items: Vec<CartLine>) -> Self {
        let subtotal = items.iter().map(CartLine::line_total).sum();
        let item_count = items.len();
        Self { items, subtotal, item_count }
    }
}

//--------------------------------------     OrderDetail     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderDetail {
    pub order: Order,
    pub items: Vec<OrderItem>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub callbacks: Vec<PaymentCallbackRecord>,
}
