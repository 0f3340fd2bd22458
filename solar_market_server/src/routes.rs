//! Request handler definitions
//!
//! Define each route and its handler here.
//! Handlers that are more than a line or two MUST go into a separate module. Keep this module neat and tidy 🙏
//!
//! Every route under `/api` sits behind the identity middleware, and declares the roles that may call it with
//! `requires [...]`. The M-PESA callback is the exception. It is public, and is guarded by the callback guard instead.
//!
//! A note about performance:
//! Since each worker thread processes its requests sequentially, handlers which block the current thread will cause the
//! current worker to stop processing new requests. Any long, non-cpu-bound operation (e.g. I/O, database operations,
//! calls to Daraja) must be expressed as futures or asynchronous functions.
use actix_web::{get, web, HttpResponse, Responder};
use futures::StreamExt;
use log::*;
use mpesa_tools::StkCallbackEnvelope;
use solar_market_engine::{
    db_types::{NewProduct, NewProviderProfile, NewUser, Role, UpdateProduct, UpdateProviderProfile},
    order_objects::{CheckoutRequest, ReconciliationOutcome},
    sme_api::ticket_api::TicketRequest,
    traits::{AccountManagement, CartManagement, CatalogManagement, CheckoutManagement, PaymentGateway, TicketManagement},
    AccountApi,
    CartApi,
    CatalogApi,
    OrderFlowApi,
    TicketApi,
};

use crate::{
    auth::JwtClaims,
    data_objects::{
        AddToCartRequest,
        CallbackAck,
        CheckoutResponse,
        JsonResponse,
        OrderSearchParams,
        PageParams,
        ProductSearchParams,
        TicketReply,
        UpdateCartRequest,
        UserSearchParams,
    },
    errors::ServerError,
    integrations::mpesa::callback_from_stk,
};

// Web-actix cannot handle generics in handlers, so it's implemented manually using the `route!` macro
#[macro_export]
macro_rules! route {
    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+ where requires [$($roles:expr),+]) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>)
                    .wrap($crate::middleware::AclMiddlewareFactory::new(&[$($roles),+]));
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };

    ($name:ident => $method:ident $path:literal impl $($bounds:ident),+) => {
        paste::paste! { pub struct [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ >( $( core::marker::PhantomData<fn() -> [< T $bounds:camel> ] >,)+ );}
        paste::paste! { impl< $( [< T $bounds:camel> ],)+ > [<$name:camel Route>]< $( [< T $bounds:camel> ],)+ > {
            #[allow(clippy::new_without_default)]
            pub fn new() -> Self {
                Self($( core::marker::PhantomData::<fn() -> [< T $bounds:camel> ] >,)+)
            }
        }}
        paste::paste! { impl<$( [< T $bounds:camel >] , )+> actix_web::dev::HttpServiceFactory for [<$name:camel Route>]<$([<T $bounds:camel>],)+>
        where
            $([<T $bounds:camel>]: $bounds + 'static,)+
        {
            fn register(self, config: &mut actix_web::dev::AppService) {
                let res = actix_web::Resource::new($path)
                    .name(stringify!($name))
                    .guard(actix_web::guard::$method())
                    .to($name::< $( [< T $bounds:camel >], )+>);
                actix_web::dev::HttpServiceFactory::register(res, config);
            }
        }}
    };
}

// ----------------------------------------------   Health  ----------------------------------------------------
#[get("/health")]
pub async fn health() -> impl Responder {
    trace!("💻️ Received health check request");
    HttpResponse::Ok().body("👍️\n")
}

//----------------------------------------------   M-PESA  ----------------------------------------------------
route!(mpesa_callback => Post "" impl CheckoutManagement, PaymentGateway);
/// Route handler for STK push results.
///
/// Daraja retries callbacks that are not acknowledged, so this handler always answers with the same acknowledgement.
/// Nothing that goes wrong locally, from an unparseable body to a database outage, is reported back to the gateway.
/// Those problems are only visible in the logs and in the callback audit trail.
pub async fn mpesa_callback<B, G>(payload: web::Payload, api: web::Data<OrderFlowApi<B, G>>) -> HttpResponse
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    trace!("💻️ Received M-PESA callback");
    let body = match read_callback_body(payload).await {
        Ok(body) => body,
        Err(e) => {
            error!("💻️ Could not read M-PESA callback body. {e}");
            return HttpResponse::Ok().json(CallbackAck::accepted());
        },
    };
    match StkCallbackEnvelope::from_slice(body.as_ref()) {
        Ok(envelope) => {
            let callback = callback_from_stk(envelope.callback());
            match api.reconcile_payment(&callback).await {
                Ok(ReconciliationOutcome::Applied(order)) => {
                    debug!("💻️ Callback {} settled order {}", callback.checkout_request_id, order.order_number)
                },
                Ok(outcome) => {
                    debug!("💻️ Callback {} was not applied. {:?}", callback.checkout_request_id, outcome.note())
                },
                Err(e) => error!("💻️ Could not reconcile callback {}. {e}", callback.checkout_request_id),
            }
        },
        Err(e) => {
            error!("💻️ Could not parse M-PESA callback. {e}. Body: {}", String::from_utf8_lossy(body.as_ref()));
        },
    }
    HttpResponse::Ok().json(CallbackAck::accepted())
}

/// Real callbacks are well under a kilobyte.
const MAX_CALLBACK_BYTES: usize = 64 * 1024;

/// Reads the raw body by hand, since the `Bytes` extractor answers oversized or broken bodies with its own error.
async fn read_callback_body(mut payload: web::Payload) -> Result<web::Bytes, String> {
    let mut body = web::BytesMut::new();
    while let Some(chunk) = payload.next().await {
        let chunk = chunk.map_err(|e| e.to_string())?;
        if body.len() + chunk.len() > MAX_CALLBACK_BYTES {
            return Err(format!("Body is larger than {MAX_CALLBACK_BYTES} bytes"));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body.freeze())
}

route!(mpesa_query => Get "/mpesa/query/{checkout_request_id}" impl CheckoutManagement, PaymentGateway where requires [Role::Customer, Role::Admin]);
/// Asks Daraja for the state of an STK push. Customers can only query payments for their own orders.
pub async fn mpesa_query<B, G>(
    claims: JwtClaims,
    path: web::Path<String>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    let checkout_request_id = path.into_inner();
    debug!("💻️ GET payment status of {checkout_request_id} for user {}", claims.sub);
    let status = api.query_payment_status(&checkout_request_id, claims.sub, claims.role).await?;
    Ok(HttpResponse::Ok().json(status))
}

//----------------------------------------------   Catalogue  ----------------------------------------------------
route!(browse_products => Get "/customer/products" impl CatalogManagement where requires [Role::Customer]);
pub async fn browse_products<B: CatalogManagement>(
    query: web::Query<ProductSearchParams>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = query.into_inner();
    debug!("💻️ GET products {params:?}");
    let products = api.browse_products(params.filter()?, params.page, params.per_page).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(product_detail => Get "/customer/products/{id}" impl CatalogManagement where requires [Role::Customer]);
pub async fn product_detail<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let id = path.into_inner();
    debug!("💻️ GET product #{id}");
    let product = api.product_detail(id).await?;
    Ok(HttpResponse::Ok().json(product))
}

//----------------------------------------------   Cart  ----------------------------------------------------
route!(view_cart => Get "/customer/cart" impl CartManagement where requires [Role::Customer]);
pub async fn view_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET cart for customer {}", claims.sub);
    let cart = api.view_cart(claims.sub).await?;
    Ok(HttpResponse::Ok().json(cart))
}

route!(add_to_cart => Post "/customer/cart/add" impl CartManagement where requires [Role::Customer]);
pub async fn add_to_cart<B: CartManagement>(
    claims: JwtClaims,
    body: web::Json<AddToCartRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let (product_id, quantity) = body.validate()?;
    debug!("💻️ POST add {quantity} x product #{product_id} to cart for customer {}", claims.sub);
    let item = api.add_item(claims.sub, product_id, quantity).await?;
    Ok(HttpResponse::Created().json(item))
}

route!(update_cart_item => Put "/customer/cart/update/{id}" impl CartManagement where requires [Role::Customer]);
pub async fn update_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateCartRequest>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    let quantity = body.quantity.ok_or_else(|| ServerError::ValidationError("quantity is required".into()))?;
    debug!("💻️ PUT cart item #{item_id} to {quantity} for customer {}", claims.sub);
    let item = api.update_quantity(claims.sub, item_id, quantity).await?;
    Ok(HttpResponse::Ok().json(item))
}

route!(remove_cart_item => Delete "/customer/cart/remove/{id}" impl CartManagement where requires [Role::Customer]);
pub async fn remove_cart_item<B: CartManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let item_id = path.into_inner();
    debug!("💻️ DELETE cart item #{item_id} for customer {}", claims.sub);
    api.remove_item(claims.sub, item_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Item removed from cart")))
}

route!(clear_cart => Delete "/customer/cart/clear" impl CartManagement where requires [Role::Customer]);
pub async fn clear_cart<B: CartManagement>(
    claims: JwtClaims,
    api: web::Data<CartApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ DELETE cart for customer {}", claims.sub);
    let removed = api.clear_cart(claims.sub).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success(format!("Cart cleared. {removed} items removed"))))
}

//----------------------------------------------   Checkout  ----------------------------------------------------
route!(checkout => Post "/customer/checkout" impl CheckoutManagement, PaymentGateway where requires [Role::Customer]);
/// Turns the customer's cart into an order.
///
/// For M-PESA orders the response carries the checkout request id, and the payment completes later, when Daraja calls
/// back. If Daraja cannot be reached, or refuses the request, the order is kept in the `failed` payment state and the
/// response is a 502 carrying the order and the gateway's explanation.
pub async fn checkout<B, G>(
    claims: JwtClaims,
    body: web::Json<CheckoutRequest>,
    api: web::Data<OrderFlowApi<B, G>>,
) -> Result<HttpResponse, ServerError>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    debug!("💻️ POST checkout for customer {}", claims.sub);
    let result = api.checkout(claims.sub, &body).await?;
    Ok(HttpResponse::Created().json(CheckoutResponse::from(result)))
}

//----------------------------------------------   Orders  ----------------------------------------------------
route!(my_orders => Get "/customer/orders" impl AccountManagement where requires [Role::Customer]);
pub async fn my_orders<B: AccountManagement>(
    claims: JwtClaims,
    query: web::Query<PageParams>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET orders for customer {}", claims.sub);
    let orders = api.customer_orders(claims.sub, query.page, query.per_page).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(my_order => Get "/customer/orders/{id}" impl AccountManagement where requires [Role::Customer]);
pub async fn my_order<B: AccountManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order #{order_id} for customer {}", claims.sub);
    let order = api.customer_order(claims.sub, order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

route!(all_orders => Get "/admin/orders" impl AccountManagement where requires [Role::Admin]);
pub async fn all_orders<B: AccountManagement>(
    query: web::Query<OrderSearchParams>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = query.into_inner();
    debug!("💻️ GET orders {params:?}");
    let orders = api.orders(params.filter(), params.page, params.per_page).await?;
    Ok(HttpResponse::Ok().json(orders))
}

route!(order_detail => Get "/admin/orders/{id}" impl AccountManagement where requires [Role::Admin]);
/// Includes the callbacks received for the order.
pub async fn order_detail<B: AccountManagement>(
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let order_id = path.into_inner();
    debug!("💻️ GET order detail for #{order_id}");
    let order = api.order_detail(order_id).await?;
    Ok(HttpResponse::Ok().json(order))
}

//----------------------------------------------   Tickets  ----------------------------------------------------
route!(my_tickets => Get "/customer/tickets" impl TicketManagement where requires [Role::Customer]);
pub async fn my_tickets<B: TicketManagement>(
    claims: JwtClaims,
    api: web::Data<TicketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET tickets for customer {}", claims.sub);
    let tickets = api.customer_tickets(claims.sub).await?;
    Ok(HttpResponse::Ok().json(tickets))
}

route!(create_ticket => Post "/customer/tickets" impl TicketManagement where requires [Role::Customer]);
pub async fn create_ticket<B: TicketManagement>(
    claims: JwtClaims,
    body: web::Json<TicketRequest>,
    api: web::Data<TicketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST ticket for customer {}", claims.sub);
    let ticket = api.create_ticket(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(ticket))
}

route!(my_ticket => Get "/customer/tickets/{id}" impl TicketManagement where requires [Role::Customer]);
pub async fn my_ticket<B: TicketManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<TicketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ticket_id = path.into_inner();
    debug!("💻️ GET ticket #{ticket_id} for customer {}", claims.sub);
    let ticket = api.customer_ticket(claims.sub, ticket_id).await?;
    Ok(HttpResponse::Ok().json(ticket))
}

route!(open_tickets => Get "/provider/tickets" impl TicketManagement where requires [Role::Provider]);
pub async fn open_tickets<B: TicketManagement>(api: web::Data<TicketApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET open tickets");
    let tickets = api.open_tickets().await?;
    Ok(HttpResponse::Ok().json(tickets))
}

route!(respond_to_ticket => Post "/provider/tickets/{id}/respond" impl TicketManagement where requires [Role::Provider]);
pub async fn respond_to_ticket<B: TicketManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<TicketReply>,
    api: web::Data<TicketApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let ticket_id = path.into_inner();
    debug!("💻️ POST response to ticket #{ticket_id} by provider {}", claims.sub);
    let response = api.respond(ticket_id, claims.sub, body.message.as_deref(), body.resolve).await?;
    Ok(HttpResponse::Created().json(response))
}

//----------------------------------------------   Provider  ----------------------------------------------------
route!(my_profile => Get "/provider/profile" impl CatalogManagement where requires [Role::Provider]);
pub async fn my_profile<B: CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET profile for provider {}", claims.sub);
    let profile = api.profile(claims.sub).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(create_profile => Post "/provider/profile" impl CatalogManagement where requires [Role::Provider]);
pub async fn create_profile<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<NewProviderProfile>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST profile for provider {}", claims.sub);
    let profile = api.create_profile(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(profile))
}

route!(update_profile => Put "/provider/profile" impl CatalogManagement where requires [Role::Provider]);
pub async fn update_profile<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<UpdateProviderProfile>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PUT profile for provider {}", claims.sub);
    let profile = api.update_profile(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(my_products => Get "/provider/products" impl CatalogManagement where requires [Role::Provider]);
pub async fn my_products<B: CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET products for provider {}", claims.sub);
    let products = api.provider_products(claims.sub).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(create_product => Post "/provider/products" impl CatalogManagement where requires [Role::Provider]);
pub async fn create_product<B: CatalogManagement>(
    claims: JwtClaims,
    body: web::Json<NewProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST product for provider {}", claims.sub);
    let product = api.create_product(claims.sub, body.into_inner()).await?;
    Ok(HttpResponse::Created().json(product))
}

route!(my_product => Get "/provider/products/{id}" impl CatalogManagement where requires [Role::Provider]);
pub async fn my_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ GET product #{product_id} for provider {}", claims.sub);
    let product = api.provider_product(claims.sub, product_id).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(update_product => Put "/provider/products/{id}" impl CatalogManagement where requires [Role::Provider]);
pub async fn update_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    body: web::Json<UpdateProduct>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ PUT product #{product_id} for provider {}", claims.sub);
    let product = api.update_product(claims.sub, product_id, body.into_inner()).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(delete_product => Delete "/provider/products/{id}" impl CatalogManagement where requires [Role::Provider]);
pub async fn delete_product<B: CatalogManagement>(
    claims: JwtClaims,
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let product_id = path.into_inner();
    debug!("💻️ DELETE product #{product_id} for provider {}", claims.sub);
    api.delete_product(claims.sub, product_id).await?;
    Ok(HttpResponse::Ok().json(JsonResponse::success("Product deleted")))
}

route!(provider_analytics => Get "/provider/analytics" impl CatalogManagement where requires [Role::Provider]);
pub async fn provider_analytics<B: CatalogManagement>(
    claims: JwtClaims,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET analytics for provider {}", claims.sub);
    let analytics = api.provider_analytics(claims.sub).await?;
    Ok(HttpResponse::Ok().json(analytics))
}

//----------------------------------------------   Admin  ----------------------------------------------------
route!(pending_providers => Get "/admin/providers/pending" impl CatalogManagement where requires [Role::Admin]);
pub async fn pending_providers<B: CatalogManagement>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET pending providers");
    let profiles = api.profiles(false).await?;
    Ok(HttpResponse::Ok().json(profiles))
}

route!(approved_providers => Get "/admin/providers/approved" impl CatalogManagement where requires [Role::Admin]);
pub async fn approved_providers<B: CatalogManagement>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET approved providers");
    let profiles = api.profiles(true).await?;
    Ok(HttpResponse::Ok().json(profiles))
}

route!(approve_provider => Put "/admin/providers/{id}/approve" impl CatalogManagement where requires [Role::Admin]);
pub async fn approve_provider<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    set_profile_approval(path.into_inner(), true, &api).await
}

route!(reject_provider => Put "/admin/providers/{id}/reject" impl CatalogManagement where requires [Role::Admin]);
pub async fn reject_provider<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    set_profile_approval(path.into_inner(), false, &api).await
}

async fn set_profile_approval<B: CatalogManagement>(
    profile_id: i64,
    approved: bool,
    api: &CatalogApi<B>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PUT provider profile #{profile_id} approved={approved}");
    let profile = api.set_profile_approval(profile_id, approved).await?;
    Ok(HttpResponse::Ok().json(profile))
}

route!(pending_products => Get "/admin/products/pending" impl CatalogManagement where requires [Role::Admin]);
pub async fn pending_products<B: CatalogManagement>(
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET pending products");
    let products = api.all_products(true).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(all_products => Get "/admin/products/all" impl CatalogManagement where requires [Role::Admin]);
pub async fn all_products<B: CatalogManagement>(api: web::Data<CatalogApi<B>>) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET all products");
    let products = api.all_products(false).await?;
    Ok(HttpResponse::Ok().json(products))
}

route!(approve_product => Put "/admin/products/{id}/approve" impl CatalogManagement where requires [Role::Admin]);
pub async fn approve_product<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    set_product_approval(path.into_inner(), true, &api).await
}

route!(reject_product => Put "/admin/products/{id}/reject" impl CatalogManagement where requires [Role::Admin]);
pub async fn reject_product<B: CatalogManagement>(
    path: web::Path<i64>,
    api: web::Data<CatalogApi<B>>,
) -> Result<HttpResponse, ServerError> {
    set_product_approval(path.into_inner(), false, &api).await
}

async fn set_product_approval<B: CatalogManagement>(
    product_id: i64,
    approved: bool,
    api: &CatalogApi<B>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ PUT product #{product_id} approved={approved}");
    let product = api.set_product_approval(product_id, approved).await?;
    Ok(HttpResponse::Ok().json(product))
}

route!(users => Get "/admin/users" impl AccountManagement where requires [Role::Admin]);
pub async fn users<B: AccountManagement>(
    query: web::Query<UserSearchParams>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let params = query.into_inner();
    debug!("💻️ GET users {params:?}");
    let users = api.users(params.into()).await?;
    Ok(HttpResponse::Ok().json(users))
}

route!(create_user => Post "/admin/users" impl AccountManagement where requires [Role::Admin]);
pub async fn create_user<B: AccountManagement>(
    body: web::Json<NewUser>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ POST user {}", body.email);
    let user = api.create_user(body.into_inner()).await?;
    Ok(HttpResponse::Created().json(user))
}

route!(activate_user => Put "/admin/users/{id}/activate" impl AccountManagement where requires [Role::Admin]);
pub async fn activate_user<B: AccountManagement>(
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💻️ PUT activate user #{user_id}");
    let user = api.activate_user(user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(deactivate_user => Put "/admin/users/{id}/deactivate" impl AccountManagement where requires [Role::Admin]);
pub async fn deactivate_user<B: AccountManagement>(
    path: web::Path<i64>,
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    let user_id = path.into_inner();
    debug!("💻️ PUT deactivate user #{user_id}");
    let user = api.deactivate_user(user_id).await?;
    Ok(HttpResponse::Ok().json(user))
}

route!(platform_analytics => Get "/admin/analytics" impl AccountManagement where requires [Role::Admin]);
pub async fn platform_analytics<B: AccountManagement>(
    api: web::Data<AccountApi<B>>,
) -> Result<HttpResponse, ServerError> {
    debug!("💻️ GET platform analytics");
    let analytics = api.platform_analytics().await?;
    Ok(HttpResponse::Ok().json(analytics))
}
