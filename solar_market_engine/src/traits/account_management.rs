use thiserror::Error;

use crate::{
    db_types::{NewUser, Order, OrderItem, PaymentCallbackRecord, User},
    traits::data_objects::{OrderQueryFilter, Page, Pagination, PlatformAnalytics, UserQueryFilter},
};

#[derive(Debug, Clone, Error)]
pub enum AccountApiError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("A user with email {0} already exists")]
    UserAlreadyExists(String),
    #[error("Cannot deactivate admin users")]
    CannotDeactivateAdmin,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for AccountApiError {
    fn from(e: sqlx::Error) -> Self {
        AccountApiError::DatabaseError(e.to_string())
    }
}

/// Users, plus read access to orders and their payment history.
#[allow(async_fn_in_trait)]
pub trait AccountManagement {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError>;

    async fn fetch_users(&self, filter: UserQueryFilter) -> Result<Vec<User>, AccountApiError>;

    async fn insert_user(&self, user: NewUser) -> Result<User, AccountApiError>;

    async fn set_user_active(&self, user_id: i64, active: bool) -> Result<Option<User>, AccountApiError>;

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, AccountApiError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, AccountApiError>;

    /// Orders matching the filter, newest first.
    async fn search_orders(&self, filter: OrderQueryFilter, page: Pagination) -> Result<Page<Order>, AccountApiError>;

    async fn fetch_payment_callbacks(&self, order_id: i64) -> Result<Vec<PaymentCallbackRecord>, AccountApiError>;

    async fn platform_analytics(&self) -> Result<PlatformAnalytics, AccountApiError>;
}
