use serde::{Deserialize, Serialize};

use crate::db_types::{Money, OrderStatus, PaymentStatus, Role};

//--------------------------------------      Pagination     ---------------------------------------------------------
/// 1-based page selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub const MAX_PER_PAGE: u32 = 100;

    /// Builds a page selection, clamping nonsense values rather than rejecting them.
    pub fn new(page: Option<u32>, per_page: Option<u32>, default_per_page: u32) -> Self {
        let page = page.unwrap_or(1).max(1);
        let per_page = per_page.unwrap_or(default_per_page).clamp(1, Self::MAX_PER_PAGE);
        Self { page, per_page }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Self { page: 1, per_page: 10 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub pages: i64,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let per_page = i64::from(pagination.per_page);
        let pages = (total + per_page - 1) / per_page;
        Self { items, total, page: pagination.page, per_page: pagination.per_page, pages }
    }

    pub fn map<U, F: FnMut(T) -> U>(self, f: F) -> Page<U> {
        Page {
            items: self.items.into_iter().map(f).collect(),
            total: self.total,
            page: self.page,
            per_page: self.per_page,
            pages: self.pages,
        }
    }
}

//--------------------------------------    ProductFilter    ---------------------------------------------------------
/// Catalogue search criteria. All filters are optional and are combined with AND.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProductFilter {
    /// Case-insensitive match against name or description
    pub search: Option<String>,
    pub min_price: Option<Money>,
    pub max_price: Option<Money>,
    pub min_wattage: Option<i64>,
    pub max_wattage: Option<i64>,
}

impl ProductFilter {
    pub fn is_empty(&self) -> bool {
        self.search.as_ref().map(|s| s.trim().is_empty()).unwrap_or(true) &&
            self.min_price.is_none() &&
            self.max_price.is_none() &&
            self.min_wattage.is_none() &&
            self.max_wattage.is_none()
    }

    pub fn with_search<S: Into<String>>(mut self, search: S) -> Self {
        self.search = Some(search.into());
        self
    }

    pub fn with_price_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_price = min;
        self.max_price = max;
        self
    }

    pub fn with_wattage_range(mut self, min: Option<i64>, max: Option<i64>) -> Self {
        self.min_wattage = min;
        self.max_wattage = max;
        self
    }
}

//--------------------------------------   OrderQueryFilter  ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub customer_id: Option<i64>,
    pub payment_status: Option<PaymentStatus>,
    pub order_status: Option<OrderStatus>,
}

impl OrderQueryFilter {
    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() && self.payment_status.is_none() && self.order_status.is_none()
    }

    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_payment_status(mut self, status: PaymentStatus) -> Self {
        self.payment_status = Some(status);
        self
    }
}

//--------------------------------------      Analytics      ---------------------------------------------------------
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct ProviderAnalytics {
    pub total_products: i64,
    pub approved_products: i64,
    pub pending_products: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct PlatformAnalytics {
    pub total_users: i64,
    pub total_customers: i64,
    pub total_providers: i64,
    pub total_products: i64,
    pub approved_products: i64,
    pub pending_products: i64,
    pub total_orders: i64,
    /// Sum of all orders whose payment has completed.
    pub total_revenue: Money,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UserQueryFilter {
    pub role: Option<Role>,
}
