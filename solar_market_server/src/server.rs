use std::time::Duration;

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer};
use log::*;
use mpesa_tools::MpesaApi;
use solar_market_engine::{
    traits::{AccountManagement, CatalogManagement, CheckoutManagement, PaymentGateway, TicketManagement},
    AccountApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
    SqliteDatabase,
    TicketApi,
};

use crate::{
    auth::TokenValidator,
    config::ServerConfig,
    errors::{json_error_handler, path_error_handler, query_error_handler, ServerError},
    integrations::mpesa::MpesaGateway,
    middleware::{CallbackGuardFactory, IdentityMiddlewareFactory},
    routes::*,
};

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    let db = SqliteDatabase::new_with_url(&config.database_url, 25)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let api = MpesaApi::new(config.mpesa.clone()).map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let gateway = MpesaGateway::new(api);
    if config.callback.secret.is_none() {
        warn!("🚨️ SLM_CALLBACK_SECRET is not set. Anyone who can reach the callback URL can settle orders.");
    }
    let srv = create_server_instance(config, db, gateway)?;
    srv.await.map_err(|e| ServerError::Unspecified(e.to_string()))
}

pub fn create_server_instance(
    config: ServerConfig,
    db: SqliteDatabase,
    gateway: MpesaGateway,
) -> Result<Server, ServerError> {
    let bind_to = (config.host.clone(), config.port);
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("slm::access_log"))
            .configure(|cfg| configure_app(cfg, &config, db.clone(), gateway.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind(bind_to)?
    .run();
    Ok(srv)
}

/// Registers the engine APIs, the extractor error handlers and every route on an app.
///
/// The callback scope must be registered before the `/api` scope. Otherwise the identity middleware would claim the
/// callback path and reject Daraja's unauthenticated requests.
pub fn configure_app<B, G>(cfg: &mut web::ServiceConfig, config: &ServerConfig, db: B, gateway: G)
where
    B: CheckoutManagement + CatalogManagement + AccountManagement + TicketManagement + Clone + 'static,
    G: PaymentGateway + 'static,
{
    let order_flow_api = OrderFlowApi::new(db.clone(), gateway).with_pricing(config.pricing);
    let cart_api = CartApi::new(db.clone(), config.max_cart_items);
    let catalog_api = CatalogApi::new(db.clone(), config.products_per_page);
    let account_api = AccountApi::new(db.clone(), config.orders_per_page);
    let ticket_api = TicketApi::new(db);
    let callback_scope = web::scope("/api/mpesa/callback")
        .wrap(CallbackGuardFactory::new(config.callback.clone(), config.use_x_forwarded_for, config.use_forwarded))
        .service(MpesaCallbackRoute::<B, G>::new());
    let api_scope = web::scope("/api")
        .wrap(IdentityMiddlewareFactory::new(TokenValidator::new(&config.auth)))
        .configure(marketplace_routes::<B, G>);
    cfg.app_data(web::Data::new(order_flow_api))
        .app_data(web::Data::new(cart_api))
        .app_data(web::Data::new(catalog_api))
        .app_data(web::Data::new(account_api))
        .app_data(web::Data::new(ticket_api))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .service(health)
        .service(callback_scope)
        .service(api_scope);
}

fn marketplace_routes<B, G>(cfg: &mut web::ServiceConfig)
where
    B: CheckoutManagement + CatalogManagement + AccountManagement + TicketManagement + 'static,
    G: PaymentGateway + 'static,
{
    cfg.service(MpesaQueryRoute::<B, G>::new())
        // Customers
        .service(BrowseProductsRoute::<B>::new())
        .service(ProductDetailRoute::<B>::new())
        .service(ViewCartRoute::<B>::new())
        .service(AddToCartRoute::<B>::new())
        .service(UpdateCartItemRoute::<B>::new())
        .service(RemoveCartItemRoute::<B>::new())
        .service(ClearCartRoute::<B>::new())
        .service(CheckoutRoute::<B, G>::new())
        .service(MyOrdersRoute::<B>::new())
        .service(MyOrderRoute::<B>::new())
        .service(MyTicketsRoute::<B>::new())
        .service(CreateTicketRoute::<B>::new())
        .service(MyTicketRoute::<B>::new())
        // Providers
        .service(MyProfileRoute::<B>::new())
        .service(CreateProfileRoute::<B>::new())
        .service(UpdateProfileRoute::<B>::new())
        .service(MyProductsRoute::<B>::new())
        .service(CreateProductRoute::<B>::new())
        .service(MyProductRoute::<B>::new())
        .service(UpdateProductRoute::<B>::new())
        .service(DeleteProductRoute::<B>::new())
        .service(OpenTicketsRoute::<B>::new())
        .service(RespondToTicketRoute::<B>::new())
        .service(ProviderAnalyticsRoute::<B>::new())
        // Admins
        .service(PendingProvidersRoute::<B>::new())
        .service(ApprovedProvidersRoute::<B>::new())
        .service(ApproveProviderRoute::<B>::new())
        .service(RejectProviderRoute::<B>::new())
        .service(PendingProductsRoute::<B>::new())
        .service(AllProductsRoute::<B>::new())
        .service(ApproveProductRoute::<B>::new())
        .service(RejectProductRoute::<B>::new())
        .service(UsersRoute::<B>::new())
        .service(CreateUserRoute::<B>::new())
        .service(ActivateUserRoute::<B>::new())
        .service(DeactivateUserRoute::<B>::new())
        .service(AllOrdersRoute::<B>::new())
        .service(OrderDetailRoute::<B>::new())
        .service(PlatformAnalyticsRoute::<B>::new());
}
