//! Products and provider profiles.
//!
//! Customers only ever see products that are both active and approved. Providers manage their own products once an
//! admin has approved their profile, and admins approve or reject both profiles and products.
use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{
        Money,
        NewProduct,
        NewProviderProfile,
        Product,
        ProviderProfile,
        UpdateProduct,
        UpdateProviderProfile,
    },
    helpers::require_text,
    traits::{
        data_objects::{Page, Pagination, ProductFilter, ProviderAnalytics},
        CatalogApiError,
        CatalogManagement,
    },
};

/// Upper bounds that keep `price × quantity` and order totals well inside the integer range.
pub const MAX_PRICE_UNITS: i64 = 100_000_000;
pub const MAX_STOCK_QUANTITY: i64 = 1_000_000;

pub struct CatalogApi<B> {
    db: B,
    products_per_page: u32,
}

impl<B: Debug> Debug for CatalogApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CatalogApi ({:?})", self.db)
    }
}

impl<B> CatalogApi<B>
where B: CatalogManagement
{
    pub fn new(db: B, products_per_page: u32) -> Self {
        Self { db, products_per_page }
    }

    //------------------------------------------  Customers  ------------------------------------------------------
    pub async fn browse_products(
        &self,
        filter: ProductFilter,
        page: Option<u32>,
        per_page: Option<u32>,
    ) -> Result<Page<Product>, CatalogApiError> {
        if let (Some(min), Some(max)) = (filter.min_price, filter.max_price) {
            if min > max {
                return Err(CatalogApiError::ValidationError("min_price cannot exceed max_price".into()));
            }
        }
        if let (Some(min), Some(max)) = (filter.min_wattage, filter.max_wattage) {
            if min > max {
                return Err(CatalogApiError::ValidationError("min_wattage cannot exceed max_wattage".into()));
            }
        }
        let page = Pagination::new(page, per_page, self.products_per_page);
        self.db.search_products(filter, page).await
    }

    /// A product as a customer sees it. Inactive or unapproved products do not exist from this point of view.
    pub async fn product_detail(&self, product_id: i64) -> Result<Product, CatalogApiError> {
        self.db
            .fetch_product(product_id)
            .await?
            .filter(Product::is_available)
            .ok_or_else(|| CatalogApiError::NotFound(format!("Product {product_id}")))
    }

    //------------------------------------------  Providers  ------------------------------------------------------
    pub async fn provider_products(&self, provider_id: i64) -> Result<Vec<Product>, CatalogApiError> {
        self.db.fetch_products_for_provider(provider_id).await
    }

    pub async fn provider_product(&self, provider_id: i64, product_id: i64) -> Result<Product, CatalogApiError> {
        self.db
            .fetch_product(product_id)
            .await?
            .filter(|p| p.provider_id == provider_id)
            .ok_or_else(|| CatalogApiError::NotFound(format!("Product {product_id}")))
    }

    /// New products start out active but unapproved.
    pub async fn create_product(&self, provider_id: i64, product: NewProduct) -> Result<Product, CatalogApiError> {
        match self.db.fetch_profile_for_user(provider_id).await? {
            Some(profile) if profile.is_approved => {},
            _ => return Err(CatalogApiError::ProfileNotApproved),
        }
        let product = validate_new_product(product)?;
        let product = self.db.insert_product(provider_id, product).await?;
        info!("🛍️ Provider {provider_id} listed product #{} ({})", product.id, product.name);
        Ok(product)
    }

    pub async fn update_product(
        &self,
        provider_id: i64,
        product_id: i64,
        update: UpdateProduct,
    ) -> Result<Product, CatalogApiError> {
        validate_product_update(&update)?;
        self.provider_product(provider_id, product_id).await?;
        self.db
            .update_product(product_id, update)
            .await?
            .ok_or_else(|| CatalogApiError::NotFound(format!("Product {product_id}")))
    }

    /// Deleting a product deactivates it and removes it from every cart. Orders keep referring to it.
    pub async fn delete_product(&self, provider_id: i64, product_id: i64) -> Result<Product, CatalogApiError> {
        self.provider_product(provider_id, product_id).await?;
        let product = self
            .db
            .deactivate_product(product_id)
            .await?
            .ok_or_else(|| CatalogApiError::NotFound(format!("Product {product_id}")))?;
        info!("🛍️ Provider {provider_id} withdrew product #{product_id}");
        Ok(product)
    }

    pub async fn provider_analytics(&self, provider_id: i64) -> Result<ProviderAnalytics, CatalogApiError> {
        self.db.provider_analytics(provider_id).await
    }

    pub async fn profile(&self, user_id: i64) -> Result<ProviderProfile, CatalogApiError> {
        self.db
            .fetch_profile_for_user(user_id)
            .await?
            .ok_or_else(|| CatalogApiError::NotFound("Provider profile".into()))
    }

    /// A provider has at most one profile, and it needs an admin's approval before products can be listed.
    pub async fn create_profile(
        &self,
        user_id: i64,
        profile: NewProviderProfile,
    ) -> Result<ProviderProfile, CatalogApiError> {
        let business_name = require_text("business_name", Some(profile.business_name.as_str()))
            .map_err(CatalogApiError::ValidationError)?;
        let profile = NewProviderProfile { business_name, ..profile };
        let profile = self.db.insert_profile(user_id, profile).await?;
        info!("🛍️ Provider {user_id} created profile #{} ({})", profile.id, profile.business_name);
        Ok(profile)
    }

    pub async fn update_profile(
        &self,
        user_id: i64,
        update: UpdateProviderProfile,
    ) -> Result<ProviderProfile, CatalogApiError> {
        if update.is_empty() {
            return Err(CatalogApiError::ValidationError("No fields to update".into()));
        }
        if update.business_name.as_ref().is_some_and(|n| n.trim().is_empty()) {
            return Err(CatalogApiError::ValidationError("business_name cannot be blank".into()));
        }
        self.db.update_profile(user_id, update).await?.ok_or_else(|| CatalogApiError::NotFound("Provider profile".into()))
    }

    //------------------------------------------   Admins    ------------------------------------------------------
    pub async fn profiles(&self, approved: bool) -> Result<Vec<ProviderProfile>, CatalogApiError> {
        self.db.fetch_profiles(approved).await
    }

    pub async fn set_profile_approval(
        &self,
        profile_id: i64,
        approved: bool,
    ) -> Result<ProviderProfile, CatalogApiError> {
        let profile = self
            .db
            .set_profile_approval(profile_id, approved)
            .await?
            .ok_or_else(|| CatalogApiError::NotFound(format!("Provider profile {profile_id}")))?;
        info!("🛍️ Provider profile #{profile_id} ({}) approved: {approved}", profile.business_name);
        Ok(profile)
    }

    pub async fn all_products(&self, only_unapproved: bool) -> Result<Vec<Product>, CatalogApiError> {
        self.db.fetch_all_products(only_unapproved).await
    }

    pub async fn set_product_approval(&self, product_id: i64, approved: bool) -> Result<Product, CatalogApiError> {
        let product = self
            .db
            .set_product_approval(product_id, approved)
            .await?
            .ok_or_else(|| CatalogApiError::NotFound(format!("Product {product_id}")))?;
        info!("🛍️ Product #{product_id} ({}) approved: {approved}", product.name);
        Ok(product)
    }
}

fn validate_new_product(product: NewProduct) -> Result<NewProduct, CatalogApiError> {
    use CatalogApiError::ValidationError;
    let name = require_text("name", Some(product.name.as_str())).map_err(ValidationError)?;
    let description = require_text("description", Some(product.description.as_str())).map_err(ValidationError)?;
    check_price(product.price)?;
    check_stock(product.stock_quantity)?;
    if product.wattage.is_some_and(|w| w < 0) {
        return Err(ValidationError("wattage cannot be negative".into()));
    }
    Ok(NewProduct { name, description, ..product })
}

fn validate_product_update(update: &UpdateProduct) -> Result<(), CatalogApiError> {
    use CatalogApiError::ValidationError;
    if update.is_empty() {
        return Err(ValidationError("No fields to update".into()));
    }
    if update.name.as_ref().is_some_and(|n| n.trim().is_empty()) {
        return Err(ValidationError("name cannot be blank".into()));
    }
    update.price.map(check_price).transpose()?;
    update.stock_quantity.map(check_stock).transpose()?;
    if update.wattage.is_some_and(|w| w < 0) {
        return Err(ValidationError("wattage cannot be negative".into()));
    }
    Ok(())
}

fn check_price(price: Money) -> Result<(), CatalogApiError> {
    if price.cents() <= 0 {
        return Err(CatalogApiError::ValidationError("price must be greater than zero".into()));
    }
    let max_price = Money::from_units(MAX_PRICE_UNITS);
    if price > max_price {
        return Err(CatalogApiError::ValidationError(format!("price cannot exceed {max_price}")));
    }
    Ok(())
}

fn check_stock(stock_quantity: i64) -> Result<(), CatalogApiError> {
    if stock_quantity < 0 {
        return Err(CatalogApiError::ValidationError("stock_quantity cannot be negative".into()));
    }
    if stock_quantity > MAX_STOCK_QUANTITY {
        return Err(CatalogApiError::ValidationError(format!("stock_quantity cannot exceed {MAX_STOCK_QUANTITY}")));
    }
    Ok(())
}
