//! `SqliteDatabase` is a concrete implementation of a solar marketplace backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`crate::traits`]
//! module.
use std::fmt::Debug;

use log::*;
use sqlx::{migrate, SqlitePool};

use super::db::{
    callbacks,
    carts,
    db_url,
    is_unique_violation,
    new_pool,
    orders,
    products,
    profiles,
    tickets,
    users,
};
use crate::{
    db_types::{
        CartItem,
        CartLine,
        NewOrder,
        NewOrderItem,
        NewPaymentCallback,
        NewProduct,
        NewProviderProfile,
        NewSupportTicket,
        NewUser,
        Order,
        OrderItem,
        PaymentCallbackRecord,
        PaymentStatus,
        Product,
        ProviderProfile,
        Role,
        SupportTicket,
        TicketResponse,
        TicketStatus,
        UpdateProduct,
        UpdateProviderProfile,
        User,
    },
    traits::{
        data_objects::{
            OrderQueryFilter,
            Page,
            Pagination,
            PlatformAnalytics,
            ProductFilter,
            ProviderAnalytics,
            UserQueryFilter,
        },
        AccountApiError,
        AccountManagement,
        CartApiError,
        CartManagement,
        CatalogApiError,
        CatalogManagement,
        CheckoutError,
        CheckoutManagement,
        PaymentVerdict,
        Settlement,
        TicketApiError,
        TicketManagement,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using the `SLM_DATABASE_URL` environment variable (or the default).
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(&url, max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        let pool = new_pool(url, max_connections).await?;
        Ok(Self { url: url.to_string(), pool })
    }

    pub fn url(&self) -> &str {
        self.url.as_str()
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date. Safe to call on every start-up.
    pub async fn run_migrations(&self) -> Result<(), sqlx::migrate::MigrateError> {
        migrate!("./src/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations complete");
        Ok(())
    }

    pub async fn close(&mut self) -> Result<(), sqlx::Error> {
        self.pool.close().await;
        Ok(())
    }
}

impl CartManagement for SqliteDatabase {
    async fn fetch_cart_lines(&self, customer_id: i64) -> Result<Vec<CartLine>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let lines = carts::fetch_cart_lines(customer_id, &mut conn).await?;
        Ok(lines)
    }

    async fn fetch_cart_line(&self, customer_id: i64, item_id: i64) -> Result<Option<CartLine>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let line = carts::fetch_cart_line(customer_id, item_id, &mut conn).await?;
        Ok(line)
    }

    async fn add_to_cart(&self, customer_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartApiError> {
        let mut tx = self.pool.begin().await?;
        let product = products::fetch_product(product_id, &mut tx)
            .await?
            .filter(|p| p.is_available())
            .ok_or(CartApiError::ProductUnavailable(product_id))?;
        let existing = carts::fetch_cart_item_for_product(customer_id, product_id, &mut tx).await?;
        let in_cart = existing.as_ref().map(|i| i.quantity).unwrap_or(0);
        let wanted = in_cart.checked_add(quantity).unwrap_or(i64::MAX);
        if product.stock_quantity < wanted {
            return Err(CartApiError::InsufficientStock { product_id, available: product.stock_quantity });
        }
        let item = carts::upsert_cart_item(customer_id, product_id, quantity, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Cart line {} for customer {customer_id} now holds {} of product {product_id}", item.id, item.quantity);
        Ok(item)
    }

    async fn set_cart_quantity(
        &self,
        customer_id: i64,
        item_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartApiError> {
        let mut tx = self.pool.begin().await?;
        let Some(line) = carts::fetch_cart_line(customer_id, item_id, &mut tx).await? else {
            return Ok(None);
        };
        if line.stock_quantity < quantity {
            return Err(CartApiError::InsufficientStock { product_id: line.product_id, available: line.stock_quantity });
        }
        let item = carts::set_quantity(customer_id, item_id, quantity, &mut tx).await?;
        tx.commit().await?;
        Ok(item)
    }

    async fn remove_cart_item(&self, customer_id: i64, item_id: i64) -> Result<bool, CartApiError> {
        let mut tx = self.pool.begin().await?;
        let removed = carts::remove_item(customer_id, item_id, &mut tx).await?;
        tx.commit().await?;
        Ok(removed)
    }

    async fn clear_cart(&self, customer_id: i64) -> Result<u64, CartApiError> {
        let mut tx = self.pool.begin().await?;
        let n = carts::clear_cart(customer_id, &mut tx).await?;
        tx.commit().await?;
        Ok(n)
    }
}

impl CheckoutManagement for SqliteDatabase {
    async fn create_order(&self, order: NewOrder, items: &[NewOrderItem]) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order_number = order.order_number.clone();
        let order = match orders::insert_order(order, &mut tx).await {
            Ok(order) => order,
            Err(e) if is_unique_violation(&e) => return Err(CheckoutError::OrderNumberCollision(order_number)),
            Err(e) => return Err(e.into()),
        };
        for item in items {
            if !products::reserve_stock(item.product_id, item.quantity, &mut tx).await? {
                debug!("🗃️ Could not reserve {} of product {} for {order_number}", item.quantity, item.product_id);
                return Err(CheckoutError::InsufficientStock {
                    product_id: item.product_id,
                    product_name: item.product_name.clone(),
                });
            }
            orders::insert_order_item(order.id, item, &mut tx).await?;
        }
        tx.commit().await?;
        debug!("🗃️ Order {order_number} saved with {} line items", items.len());
        Ok(order)
    }

    async fn attach_payment_request(
        &self,
        order_id: i64,
        checkout_request_id: &str,
        merchant_request_id: &str,
    ) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::attach_payment_request(order_id, checkout_request_id, merchant_request_id, &mut tx)
            .await?
            .ok_or_else(|| {
                CheckoutError::PaymentStatusUpdateError(format!(
                    "Order {order_id} is not pending, so it cannot be linked to payment request {checkout_request_id}"
                ))
            })?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fail_payment_initiation(&self, order_id: i64, reason: &str) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order = match orders::fail_initiation(order_id, reason, &mut tx).await? {
            Some(order) => {
                products::release_stock_for_order(order_id, &mut tx).await?;
                order
            },
            None => orders::fetch_order(order_id, &mut tx)
                .await?
                .ok_or_else(|| CheckoutError::NotFound(format!("Order {order_id}")))?,
        };
        tx.commit().await?;
        Ok(order)
    }

    async fn complete_offline_payment(&self, order_id: i64) -> Result<Order, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::complete_offline(order_id, &mut tx).await?.ok_or_else(|| {
            CheckoutError::PaymentStatusUpdateError(format!("Order {order_id} is no longer awaiting payment"))
        })?;
        tx.commit().await?;
        Ok(order)
    }

    async fn settle_payment(
        &self,
        checkout_request_id: &str,
        verdict: &PaymentVerdict,
    ) -> Result<Settlement, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let updated = match verdict {
            PaymentVerdict::Succeeded { receipt_number, transaction_date, phone_number } => {
                orders::complete_payment(
                    checkout_request_id,
                    receipt_number.as_deref(),
                    *transaction_date,
                    phone_number.as_deref(),
                    &mut tx,
                )
                .await?
            },
            PaymentVerdict::Failed { reason } => {
                let order = orders::cancel_payment(checkout_request_id, reason, &mut tx).await?;
                if let Some(order) = &order {
                    products::release_stock_for_order(order.id, &mut tx).await?;
                }
                order
            },
        };
        let result = match updated {
            Some(order) => Settlement::Applied(order),
            None => match orders::fetch_order_by_checkout_request_id(checkout_request_id, &mut tx).await? {
                Some(order) => Settlement::AlreadySettled(order),
                None => Settlement::NotFound,
            },
        };
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_order_by_checkout_request_id(
        &self,
        checkout_request_id: &str,
    ) -> Result<Option<Order>, CheckoutError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order_by_checkout_request_id(checkout_request_id, &mut conn).await?;
        Ok(order)
    }

    async fn record_payment_callback(
        &self,
        callback: NewPaymentCallback,
    ) -> Result<PaymentCallbackRecord, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let record = callbacks::insert_callback(callback, &mut tx).await?;
        tx.commit().await?;
        Ok(record)
    }
}

impl CatalogManagement for SqliteDatabase {
    async fn search_products(&self, filter: ProductFilter, page: Pagination) -> Result<Page<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::search_products(filter, page, &mut conn).await?;
        Ok(products)
    }

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let product = products::fetch_product(product_id, &mut conn).await?;
        Ok(product)
    }

    async fn fetch_products_for_provider(&self, provider_id: i64) -> Result<Vec<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_products_for_provider(provider_id, &mut conn).await?;
        Ok(products)
    }

    async fn fetch_all_products(&self, only_unapproved: bool) -> Result<Vec<Product>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let products = products::fetch_all_products(only_unapproved, &mut conn).await?;
        Ok(products)
    }

    async fn insert_product(&self, provider_id: i64, product: NewProduct) -> Result<Product, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let product = products::insert_product(provider_id, product, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Product #{} ({}) added by provider {provider_id}", product.id, product.name);
        Ok(product)
    }

    async fn update_product(&self, product_id: i64, update: UpdateProduct) -> Result<Option<Product>, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let deactivating = update.is_active == Some(false);
        let product = products::update_product(product_id, update, &mut tx).await?;
        if product.is_some() && deactivating {
            carts::purge_product(product_id, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(product)
    }

    async fn deactivate_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let product = products::set_active(product_id, false, &mut tx).await?;
        if product.is_some() {
            let n = carts::purge_product(product_id, &mut tx).await?;
            debug!("🗃️ Product #{product_id} deactivated and removed from {n} carts");
        }
        tx.commit().await?;
        Ok(product)
    }

    async fn set_product_approval(&self, product_id: i64, approved: bool) -> Result<Option<Product>, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let product = products::set_approval(product_id, approved, &mut tx).await?;
        tx.commit().await?;
        Ok(product)
    }

    async fn provider_analytics(&self, provider_id: i64) -> Result<ProviderAnalytics, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let analytics = products::provider_analytics(provider_id, &mut conn).await?;
        Ok(analytics)
    }

    async fn fetch_profile_for_user(&self, user_id: i64) -> Result<Option<ProviderProfile>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let profile = profiles::fetch_profile_for_user(user_id, &mut conn).await?;
        Ok(profile)
    }

    async fn fetch_profiles(&self, approved: bool) -> Result<Vec<ProviderProfile>, CatalogApiError> {
        let mut conn = self.pool.acquire().await?;
        let profiles = profiles::fetch_profiles(approved, &mut conn).await?;
        Ok(profiles)
    }

    async fn insert_profile(
        &self,
        user_id: i64,
        profile: NewProviderProfile,
    ) -> Result<ProviderProfile, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let profile = match profiles::insert_profile(user_id, profile, &mut tx).await {
            Ok(profile) => profile,
            Err(e) if is_unique_violation(&e) => return Err(CatalogApiError::ProfileAlreadyExists),
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        Ok(profile)
    }

    async fn update_profile(
        &self,
        user_id: i64,
        update: UpdateProviderProfile,
    ) -> Result<Option<ProviderProfile>, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let profile = profiles::update_profile(user_id, update, &mut tx).await?;
        tx.commit().await?;
        Ok(profile)
    }

    async fn set_profile_approval(
        &self,
        profile_id: i64,
        approved: bool,
    ) -> Result<Option<ProviderProfile>, CatalogApiError> {
        let mut tx = self.pool.begin().await?;
        let profile = profiles::set_approval(profile_id, approved, &mut tx).await?;
        tx.commit().await?;
        Ok(profile)
    }
}

impl AccountManagement for SqliteDatabase {
    async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let user = users::fetch_user(user_id, &mut conn).await?;
        Ok(user)
    }

    async fn fetch_users(&self, filter: UserQueryFilter) -> Result<Vec<User>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let users = users::fetch_users(filter, &mut conn).await?;
        Ok(users)
    }

    async fn insert_user(&self, user: NewUser) -> Result<User, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let email = user.email.clone();
        let user = match users::insert_user(user, &mut tx).await {
            Ok(user) => user,
            Err(e) if is_unique_violation(&e) => return Err(AccountApiError::UserAlreadyExists(email)),
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        Ok(user)
    }

    async fn set_user_active(&self, user_id: i64, active: bool) -> Result<Option<User>, AccountApiError> {
        let mut tx = self.pool.begin().await?;
        let user = users::set_active(user_id, active, &mut tx).await?;
        tx.commit().await?;
        Ok(user)
    }

    async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let order = orders::fetch_order(order_id, &mut conn).await?;
        Ok(order)
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let items = orders::fetch_order_items(order_id, &mut conn).await?;
        Ok(items)
    }

    async fn search_orders(&self, filter: OrderQueryFilter, page: Pagination) -> Result<Page<Order>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(filter, page, &mut conn).await?;
        Ok(orders)
    }

    async fn fetch_payment_callbacks(&self, order_id: i64) -> Result<Vec<PaymentCallbackRecord>, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let callbacks = callbacks::fetch_callbacks_for_order(order_id, &mut conn).await?;
        Ok(callbacks)
    }

    async fn platform_analytics(&self) -> Result<PlatformAnalytics, AccountApiError> {
        let mut conn = self.pool.acquire().await?;
        let total_users = users::count_users(None, &mut conn).await?;
        let total_customers = users::count_users(Some(Role::Customer), &mut conn).await?;
        let total_providers = users::count_users(Some(Role::Provider), &mut conn).await?;
        let (total_products, approved_products) = products::product_counts(&mut conn).await?;
        let total_orders = orders::count_orders(&mut conn).await?;
        let total_revenue = orders::revenue(PaymentStatus::Completed, &mut conn).await?;
        Ok(PlatformAnalytics {
            total_users,
            total_customers,
            total_providers,
            total_products,
            approved_products,
            pending_products: total_products - approved_products,
            total_orders,
            total_revenue,
        })
    }
}

impl TicketManagement for SqliteDatabase {
    async fn insert_ticket(&self, ticket: NewSupportTicket) -> Result<SupportTicket, TicketApiError> {
        let mut tx = self.pool.begin().await?;
        let number = ticket.ticket_number.clone();
        let ticket = match tickets::insert_ticket(ticket, &mut tx).await {
            Ok(ticket) => ticket,
            Err(e) if is_unique_violation(&e) => return Err(TicketApiError::TicketNumberCollision(number)),
            Err(e) => return Err(e.into()),
        };
        tx.commit().await?;
        Ok(ticket)
    }

    async fn fetch_ticket(&self, ticket_id: i64) -> Result<Option<SupportTicket>, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let ticket = tickets::fetch_ticket(ticket_id, &mut conn).await?;
        Ok(ticket)
    }

    async fn fetch_tickets_for_customer(&self, customer_id: i64) -> Result<Vec<SupportTicket>, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let tickets = tickets::fetch_tickets_for_customer(customer_id, &mut conn).await?;
        Ok(tickets)
    }

    async fn fetch_tickets_by_status(&self, status: TicketStatus) -> Result<Vec<SupportTicket>, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let tickets = tickets::fetch_tickets_by_status(status, &mut conn).await?;
        Ok(tickets)
    }

    async fn fetch_ticket_responses(&self, ticket_id: i64) -> Result<Vec<TicketResponse>, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let responses = tickets::fetch_responses(ticket_id, &mut conn).await?;
        Ok(responses)
    }

    async fn insert_ticket_response(
        &self,
        ticket_id: i64,
        responder_id: i64,
        message: &str,
        resolve: bool,
    ) -> Result<TicketResponse, TicketApiError> {
        let mut tx = self.pool.begin().await?;
        if tickets::fetch_ticket(ticket_id, &mut tx).await?.is_none() {
            return Err(TicketApiError::NotFound(ticket_id));
        }
        let response = tickets::insert_response(ticket_id, responder_id, message, &mut tx).await?;
        if resolve {
            tickets::set_status(ticket_id, TicketStatus::Resolved, &mut tx).await?;
        }
        tx.commit().await?;
        Ok(response)
    }

    async fn order_belongs_to(&self, order_id: i64, customer_id: i64) -> Result<bool, TicketApiError> {
        let mut conn = self.pool.acquire().await?;
        let belongs = tickets::order_belongs_to(order_id, customer_id, &mut conn).await?;
        Ok(belongs)
    }
}
