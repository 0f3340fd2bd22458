//! Data types shared between the storage backends and the public engine API.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
pub use slm_common::Money;
use sqlx::{FromRow, Type};
use thiserror::Error;

#[derive(Debug, Clone, Error)]
#[error("Conversion error: {0}")]
pub struct ConversionError(String);

//--------------------------------------        Role         ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Provider,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "customer"),
            Role::Provider => write!(f, "provider"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "provider" => Ok(Self::Provider),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    /// M-PESA STK push. Payment is confirmed asynchronously via callback.
    Mpesa,
    Card,
    CashOnDelivery,
    BankTransfer,
}

impl PaymentMethod {
    /// Only M-PESA orders wait for an out-of-band confirmation.
    pub fn is_asynchronous(&self) -> bool {
        matches!(self, Self::Mpesa)
    }
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mpesa => write!(f, "mpesa"),
            Self::Card => write!(f, "card"),
            Self::CashOnDelivery => write!(f, "cash_on_delivery"),
            Self::BankTransfer => write!(f, "bank_transfer"),
        }
    }
}

impl FromStr for PaymentMethod {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mpesa" | "m-pesa" => Ok(Self::Mpesa),
            "card" => Ok(Self::Card),
            "cash_on_delivery" => Ok(Self::CashOnDelivery),
            "bank_transfer" => Ok(Self::BankTransfer),
            _ => Err(ConversionError(format!("Unsupported payment method: {s}"))),
        }
    }
}

//--------------------------------------    PaymentStatus    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    Pending,
    Completed,
    Failed,
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            s => Err(ConversionError(format!("Invalid payment status: {s}"))),
        }
    }
}

//--------------------------------------     OrderStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Processing,
    Cancelled,
}

impl Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Processing => write!(f, "processing"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl FromStr for OrderStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "processing" => Ok(Self::Processing),
            "cancelled" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------    TicketStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum TicketStatus {
    Open,
    Resolved,
}

impl Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Open => write!(f, "open"),
            Self::Resolved => write!(f, "resolved"),
        }
    }
}

//--------------------------------------   CallbackOutcome   ---------------------------------------------------------
/// How a payment callback was handled. Recorded in the callback audit trail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CallbackOutcome {
    /// The callback moved the order out of `pending`.
    Applied,
    /// The order was already in the state the callback asks for.
    Duplicate,
    /// The callback contradicts the order's current state, or reports an unexpected amount.
    Anomaly,
    /// No order carries the callback's checkout request id.
    Unmatched,
}

impl Display for CallbackOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Applied => write!(f, "applied"),
            Self::Duplicate => write!(f, "duplicate"),
            Self::Anomaly => write!(f, "anomaly"),
            Self::Unmatched => write!(f, "unmatched"),
        }
    }
}

//--------------------------------------     OrderNumber     ---------------------------------------------------------
/// The customer-facing order reference, e.g. `ORD-7Q2M9XK4AB`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct OrderNumber(pub String);

impl OrderNumber {
    pub const PREFIX: &'static str = "ORD-";
    pub const RANDOM_LEN: usize = 10;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for OrderNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

//--------------------------------------    TicketNumber     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, Type, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct TicketNumber(pub String);

impl TicketNumber {
    pub const PREFIX: &'static str = "TKT-";
    pub const RANDOM_LEN: usize = 8;

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TicketNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for TicketNumber {
    fn from(s: String) -> Self {
        Self(s)
    }
}

//--------------------------------------        User         ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub full_name: String,
    pub phone: Option<String>,
    pub role: Role,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    #[serde(default)]
    pub phone: Option<String>,
    pub role: Role,
}

//--------------------------------------   ProviderProfile   ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct ProviderProfile {
    pub id: i64,
    pub user_id: i64,
    pub business_name: String,
    pub business_description: Option<String>,
    pub business_address: Option<String>,
    pub tax_id: Option<String>,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProviderProfile {
    pub business_name: String,
    #[serde(default)]
    pub business_description: Option<String>,
    #[serde(default)]
    pub business_address: Option<String>,
    #[serde(default)]
    pub tax_id: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProviderProfile {
    pub business_name: Option<String>,
    pub business_description: Option<String>,
    pub business_address: Option<String>,
    pub tax_id: Option<String>,
}

impl UpdateProviderProfile {
    pub fn is_empty(&self) -> bool {
        self.business_name.is_none() &&
            self.business_description.is_none() &&
            self.business_address.is_none() &&
            self.tax_id.is_none()
    }
}

//--------------------------------------       Product       ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Product {
    pub id: i64,
    pub provider_id: i64,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub wattage: Option<i64>,
    pub battery_capacity: Option<String>,
    pub solar_panel_type: Option<String>,
    pub lighting_duration: Option<String>,
    pub warranty_period: Option<String>,
    pub stock_quantity: i64,
    pub image_url: Option<String>,
    pub is_active: bool,
    pub is_approved: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether customers can currently see and buy this product.
    pub fn is_available(&self) -> bool {
        self.is_active && self.is_approved
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    #[serde(default)]
    pub wattage: Option<i64>,
    #[serde(default)]
    pub battery_capacity: Option<String>,
    #[serde(default)]
    pub solar_panel_type: Option<String>,
    #[serde(default)]
    pub lighting_duration: Option<String>,
    #[serde(default)]
    pub warranty_period: Option<String>,
    #[serde(default)]
    pub stock_quantity: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Money>,
    pub wattage: Option<i64>,
    pub battery_capacity: Option<String>,
    pub solar_panel_type: Option<String>,
    pub lighting_duration: Option<String>,
    pub warranty_period: Option<String>,
    pub stock_quantity: Option<i64>,
    pub image_url: Option<String>,
    pub is_active: Option<bool>,
}

impl UpdateProduct {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() &&
            self.description.is_none() &&
            self.price.is_none() &&
            self.wattage.is_none() &&
            self.battery_capacity.is_none() &&
            self.solar_panel_type.is_none() &&
            self.lighting_duration.is_none() &&
            self.warranty_period.is_none() &&
            self.stock_quantity.is_none() &&
            self.image_url.is_none() &&
            self.is_active.is_none()
    }
}

//--------------------------------------       CartItem      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct CartItem {
    pub id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A cart item joined with the live product record it refers to.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct CartLine {
    pub id: i64,
    pub customer_id: i64,
    pub product_id: i64,
    pub quantity: i64,
    pub name: String,
    pub price: Money,
    pub image_url: Option<String>,
    pub stock_quantity: i64,
    pub is_active: bool,
    pub is_approved: bool,
}

impl CartLine {
    pub fn line_total(&self) -> Money {
        self.price * self.quantity
    }

    pub fn is_purchasable(&self) -> bool {
        self.is_active && self.is_approved && self.stock_quantity >= self.quantity
    }
}

//--------------------------------------        Order        ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_id: i64,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub tax: Money,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub order_status: OrderStatus,
    pub shipping_address: String,
    pub phone_number: String,
    pub mpesa_checkout_request_id: Option<String>,
    pub mpesa_merchant_request_id: Option<String>,
    pub mpesa_receipt_number: Option<String>,
    /// As reported by M-PESA, in East Africa Time.
    pub mpesa_transaction_date: Option<NaiveDateTime>,
    pub mpesa_phone_number: Option<String>,
    pub payment_failure_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_settled(&self) -> bool {
        self.payment_status != PaymentStatus::Pending
    }
}

/// An order as it is first written. All amounts have been computed by the engine.
#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_id: i64,
    pub subtotal: Money,
    pub shipping_fee: Money,
    pub tax: Money,
    pub total_amount: Money,
    pub payment_method: PaymentMethod,
    pub shipping_address: String,
    pub phone_number: String,
}

//--------------------------------------      OrderItem      ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn line_total(&self) -> Money {
        self.unit_price * self.quantity
    }
}

/// Snapshot of a cart line at the moment of purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl From<&CartLine> for NewOrderItem {
    fn from(line: &CartLine) -> Self {
        Self {
            product_id: line.product_id,
            product_name: line.name.clone(),
            quantity: line.quantity,
            unit_price: line.price,
        }
    }
}

//--------------------------------------    SupportTicket    ---------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct SupportTicket {
    pub id: i64,
    pub ticket_number: TicketNumber,
    pub customer_id: i64,
    pub order_id: Option<i64>,
    pub subject: String,
    pub message: String,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewSupportTicket {
    pub ticket_number: TicketNumber,
    pub customer_id: i64,
    pub order_id: Option<i64>,
    pub subject: String,
    pub message: String,
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct TicketResponse {
    pub id: i64,
    pub ticket_id: i64,
    pub responder_id: i64,
    pub message: String,
    pub responder_name: Option<String>,
    pub responder_role: Option<Role>,
    pub created_at: DateTime<Utc>,
}

//-------------------------------------- PaymentCallbackRecord -------------------------------------------------------
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq)]
pub struct PaymentCallbackRecord {
    pub id: i64,
    pub order_id: Option<i64>,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub result_code: Option<i64>,
    pub result_desc: String,
    pub amount: Option<Money>,
    pub receipt_number: Option<String>,
    pub outcome: CallbackOutcome,
    pub note: Option<String>,
    pub received_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewPaymentCallback {
    pub order_id: Option<i64>,
    pub checkout_request_id: String,
    pub merchant_request_id: String,
    pub result_code: Option<i64>,
    pub result_desc: String,
    pub amount: Option<Money>,
    pub receipt_number: Option<String>,
    pub outcome: CallbackOutcome,
    pub note: Option<String>,
}
