use mockall::mock;
use serde_json::Value;
use solar_market_engine::{
    db_types::{NewProduct, NewProviderProfile, Product, ProviderProfile, UpdateProduct, UpdateProviderProfile},
    traits::{
        data_objects::{Page, Pagination, ProductFilter, ProviderAnalytics},
        CatalogApiError,
        CatalogManagement,
        GatewayError,
        PaymentGateway,
        PaymentInitiation,
        PaymentRequest,
    },
};

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        async fn initiate_payment(&self, request: PaymentRequest) -> Result<PaymentInitiation, GatewayError>;
        async fn query_status(&self, checkout_request_id: &str) -> Result<Value, GatewayError>;
    }
}

mock! {
    pub CatalogManager {}
    impl CatalogManagement for CatalogManager {
        async fn search_products(&self, filter: ProductFilter, page: Pagination) -> Result<Page<Product>, CatalogApiError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError>;
        async fn fetch_products_for_provider(&self, provider_id: i64) -> Result<Vec<Product>, CatalogApiError>;
        async fn fetch_all_products(&self, only_unapproved: bool) -> Result<Vec<Product>, CatalogApiError>;
        async fn insert_product(&self, provider_id: i64, product: NewProduct) -> Result<Product, CatalogApiError>;
        async fn update_product(&self, product_id: i64, update: UpdateProduct) -> Result<Option<Product>, CatalogApiError>;
        async fn deactivate_product(&self, product_id: i64) -> Result<Option<Product>, CatalogApiError>;
        async fn set_product_approval(&self, product_id: i64, approved: bool) -> Result<Option<Product>, CatalogApiError>;
        async fn provider_analytics(&self, provider_id: i64) -> Result<ProviderAnalytics, CatalogApiError>;
        async fn fetch_profile_for_user(&self, user_id: i64) -> Result<Option<ProviderProfile>, CatalogApiError>;
        async fn fetch_profiles(&self, approved: bool) -> Result<Vec<ProviderProfile>, CatalogApiError>;
        async fn insert_profile(&self, user_id: i64, profile: NewProviderProfile) -> Result<ProviderProfile, CatalogApiError>;
        async fn update_profile(&self, user_id: i64, update: UpdateProviderProfile) -> Result<Option<ProviderProfile>, CatalogApiError>;
        async fn set_profile_approval(&self, profile_id: i64, approved: bool) -> Result<Option<ProviderProfile>, CatalogApiError>;
    }
}

/// A gateway that must not be called.
pub fn idle_gateway() -> MockGateway {
    let mut gateway = MockGateway::new();
    gateway.expect_initiate_payment().never();
    gateway.expect_query_status().never();
    gateway
}
