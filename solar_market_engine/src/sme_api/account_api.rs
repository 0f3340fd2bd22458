//! Users, order history and platform-wide figures.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{NewUser, Order, Role, User},
    helpers::{clean_phone_number, is_valid_email, require_text},
    order_objects::OrderDetail,
    traits::{
        data_objects::{OrderQueryFilter, Page, Pagination, PlatformAnalytics, UserQueryFilter},
        AccountApiError,
        AccountManagement,
    },
};

pub struct AccountApi<B> {
    db: B,
    orders_per_page: u32,
}

impl<B: Debug> Debug for AccountApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AccountApi ({:?})", self.db)
    }
}

impl<B> AccountApi<B>
where B: AccountManagement
{
    pub fn new(db: B, orders_per_page: u32) -> Self {
        Self { db, orders_per_page }
    }

    pub async fn user(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        self.db.fetch_user(user_id).await
    }

    pub async fn users(&self, filter: UserQueryFilter) -> Result<Vec<User>, AccountApiError> {
        self.db.fetch_users(filter).await
    }

    /// Creates a user record. Credentials are managed elsewhere.
    pub async fn create_user(&self, user: NewUser) -> Result<User, AccountApiError> {
        use AccountApiError::ValidationError;
        let email = require_text("email", Some(user.email.as_str())).map_err(ValidationError)?;
        if !is_valid_email(&email) {
            return Err(ValidationError(format!("'{email}' is not a valid email address")));
        }
        let full_name = require_text("full_name", Some(user.full_name.as_str())).map_err(ValidationError)?;
        let phone = match user.phone.as_deref().map(str::trim).filter(|p| !p.is_empty()) {
            Some(p) => Some(clean_phone_number(p).map_err(ValidationError)?),
            None => None,
        };
        let user = self.db.insert_user(NewUser { email, full_name, phone, role: user.role }).await?;
        info!("👤️ Created {} account #{} for {}", user.role, user.id, user.email);
        Ok(user)
    }

    pub async fn activate_user(&self, user_id: i64) -> Result<User, AccountApiError> {
        self.db.set_user_active(user_id, true).await?.ok_or_else(|| AccountApiError::NotFound(format!("User {user_id}")))
    }

    /// Admin accounts cannot be deactivated.
    pub async fn deactivate_user(&self, user_id: i64) -> Result<User, AccountApiError> {
        let user =
            self.db.fetch_user(user_id).await?.ok_or_else(|| AccountApiError::NotFound(format!("User {user_id}")))?;
        if user.role == Role::Admin {
            warn!("👤️ Refusing to deactivate admin account #{user_id}");
            return Err(AccountApiError::CannotDeactivateAdmin);
        }
        let user = self
            .db
            .set_user_active(user_id, false)
            .await?
            .ok_or_else(|| AccountApiError::NotFound(format!("User {user_id}")))?;
        info!("👤️ Deactivated account #{user_id}");
        Ok(user)
    }

    /// The customer's orders, newest first.
    pub async fn customer_orders(
        &self,
        customer_id: i64,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<Page<Order>, AccountApiError> {
        let filter = OrderQueryFilter::default().with_customer_id(customer_id);
        let page = Pagination::new(page, per_page, self.orders_per_page);
        self.db.search_orders(filter, page).await
    }

    /// An order with its line items, as long as it belongs to the customer.
    pub async fn customer_order(&self, customer_id: i64, order_id: i64) -> Result<OrderDetail, AccountApiError> {
        let order = self
            .db
            .fetch_order(order_id)
            .await?
            .filter(|o| o.customer_id == customer_id)
            .ok_or_else(|| AccountApiError::NotFound(format!("Order {order_id}")))?;
        let items = self.db.fetch_order_items(order.id).await?;
        Ok(OrderDetail { order, items, callbacks: vec![] })
    }

    pub async fn orders(
        &self,
        filter: OrderQueryFilter,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<Page<Order>, AccountApiError> {
        let page = Pagination::new(page, per_page, self.orders_per_page);
        self.db.search_orders(filter, page).await
    }

    /// An order with its line items and every payment callback received for it.
    pub async fn order_detail(&self, order_id: i64) -> Result<OrderDetail, AccountApiError> {
        let order =
            self.db.fetch_order(order_id).await?.ok_or_else(|| AccountApiError::NotFound(format!("Order {order_id}")))?;
        let items = self.db.fetch_order_items(order_id).await?;
        let callbacks = self.db.fetch_payment_callbacks(order_id).await?;
        Ok(OrderDetail { order, items, callbacks })
    }

    pub async fn platform_analytics(&self) -> Result<PlatformAnalytics, AccountApiError> {
        self.db.platform_analytics().await
    }
}
