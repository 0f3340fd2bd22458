//! Customer carts. A cart is a staging area only: prices and availability are always read from the live product
//! records, and nothing in a cart is reserved until checkout.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::CartItem,
    order_objects::CartView,
    traits::{CartApiError, CartManagement},
};

pub struct CartApi<B> {
    db: B,
    max_items: usize,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?}, max {} items)", self.db, self.max_items)
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B, max_items: usize) -> Self {
        Self { db, max_items }
    }

    pub async fn view_cart(&self, customer_id: i64) -> Result<CartView, CartApiError> {
        let lines = self.db.fetch_cart_lines(customer_id).await?;
        Ok(CartView::new(lines))
    }

    /// Adds `quantity` of a product. Adding a product that is already in the cart increases that line's quantity.
    pub async fn add_item(&self, customer_id: i64, product_id: i64, quantity: i64) -> Result<CartItem, CartApiError> {
        if quantity < 1 {
            return Err(CartApiError::ValidationError("Quantity must be at least 1".into()));
        }
        let lines = self.db.fetch_cart_lines(customer_id).await?;
        let is_new_line = lines.iter().all(|l| l.product_id != product_id);
        if is_new_line && lines.len() >= self.max_items {
            debug!("🛒️ Cart of customer {customer_id} is full ({} lines)", lines.len());
            return Err(CartApiError::CartFull(self.max_items));
        }
        self.db.add_to_cart(customer_id, product_id, quantity).await
    }

    pub async fn update_quantity(&self, customer_id: i64, item_id: i64, quantity: i64) -> Result<CartItem, CartApiError> {
        if quantity < 1 {
            return Err(CartApiError::ValidationError("Quantity must be at least 1".into()));
        }
        self.db.set_cart_quantity(customer_id, item_id, quantity).await?.ok_or(CartApiError::ItemNotFound(item_id))
    }

    pub async fn remove_item(&self, customer_id: i64, item_id: i64) -> Result<(), CartApiError> {
        if self.db.remove_cart_item(customer_id, item_id).await? {
            Ok(())
        } else {
            Err(CartApiError::ItemNotFound(item_id))
        }
    }

    pub async fn clear_cart(&self, customer_id: i64) -> Result<u64, CartApiError> {
        self.db.clear_cart(customer_id).await
    }
}
