use thiserror::Error;

use crate::{
    db_types::{NewProduct, NewProviderProfile, Product, ProviderProfile, UpdateProduct, UpdateProviderProfile},
    traits::data_objects::{Page, Pagination, ProductFilter, ProviderAnalytics},
};

#[derive(Debug, Clone, Error)]
pub enum CatalogApiError {
    #[error("{0}")]
    ValidationError(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("Provider profile must be approved first")]
    ProfileNotApproved,
    #[error("Profile already exists")]
    ProfileAlreadyExists,
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for CatalogApiError {
    fn from(e: sqlx::Error) -> Self {
        CatalogApiError::DatabaseError(e.to_string())
    }
}

/// Products and the provider profiles that own them.
#[allow(async_fn_in_trait)]
pub trait CatalogManagement {
    /// Active, approved products matching the filter, newest first.
    async fn search_products(&self, filter: ProductFilter, page: Pagination) -> Result<Page<Product>, CatalogApiError>;

    async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError>;

    async fn fetch_products_for_provider(&self, provider_id: i64) -> Result<Vec<Product>, CatalogApiError>;

    /// All products regardless of state, optionally only those awaiting approval.
    async fn fetch_all_products(&self, only_unapproved: bool) -> Result<Vec<Product>, CatalogApiError>;

    async fn insert_product(&self, provider_id: i64, product: NewProduct) -> Result<Product, CatalogApiError>;

    async fn update_product(&self, product_id: i64, update: UpdateProduct) -> Result<Option<Product>, CatalogApiError>;

    /// Deactivates the product and removes it from every cart. Order history keeps referring to it.
    async fn deactivate_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError>;

    async fn set_product_approval(&self, product_id: i64, approved: bool) -> Result<Option<Product>, CatalogApiError>;

    async fn provider_analytics(&self, provider_id: i64) -> Result<ProviderAnalytics, CatalogApiError>;

    async fn fetch_profile_for_user(&self, user_id: i64) -> Result<Option<ProviderProfile>, CatalogApiError>;

    async fn fetch_profiles(&self, approved: bool) -> Result<Vec<ProviderProfile>, CatalogApiError>;

    async fn insert_profile(
        &self,
        user_id: i64,
        profile: NewProviderProfile,
    ) -> Result<ProviderProfile, CatalogApiError>;

    async fn update_profile(
        &self,
        user_id: i64,
        update: UpdateProviderProfile,
    ) -> Result<Option<ProviderProfile>, CatalogApiError>;

    /// `profile_id` is the profile's own id, not the user id.
    async fn set_profile_approval(
        &self,
        profile_id: i64,
        approved: bool,
    ) -> Result<Option<ProviderProfile>, CatalogApiError>;
}
