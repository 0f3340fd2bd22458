use thiserror::Error;

use crate::db_types::{CartItem, CartLine};

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Product {0} is not available")]
    ProductUnavailable(i64),
    #[error("Insufficient stock. Only {available} left")]
    InsufficientStock { product_id: i64, available: i64 },
    #[error("Cart item {0} not found")]
    ItemNotFound(i64),
    #[error("Your cart already holds the maximum of {0} items")]
    CartFull(usize),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CartApiError {
    fn from(e: sqlx::Error) -> Self {
        CartApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// The customer's cart, joined with the live product records, oldest first.
    async fn fetch_cart_lines(&self, customer_id: i64) -> Result<Vec<CartLine>, CartApiError>;

    async fn fetch_cart_line(&self, customer_id: i64, item_id: i64) -> Result<Option<CartLine>, CartApiError>;

    /// Adds `quantity` of the product to the cart, merging with an existing line for the same product.
    async fn add_to_cart(&self, customer_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartApiError>;

    /// Returns `None` if the item does not exist or belongs to someone else.
    async fn set_cart_quantity(
        &self,
        customer_id: i64,
        item_id: i64,
        quantity: i64,
    ) -> Result<Option<CartItem>, CartApiError>;

    /// Returns `false` if the item does not exist or belongs to someone else.
    async fn remove_cart_item(&self, customer_id: i64, item_id: i64) -> Result<bool, CartApiError>;

    /// Returns the number of lines removed.
    async fn clear_cart(&self, customer_id: i64) -> Result<u64, CartApiError>;
}
