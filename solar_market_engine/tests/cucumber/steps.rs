use chrono::NaiveDate;
use cucumber::{given, then, when};
use solar_market_engine::{
    db_types::{Money, Role},
    order_objects::{CheckoutRequest, PaymentCallback},
    traits::{
        data_objects::{OrderQueryFilter, Pagination},
        AccountManagement,
        CartManagement,
        CheckoutError,
        GatewayError,
    },
};

use crate::{
    cucumber::{MarketSystem, MarketWorld},
    support::{add_product, add_provider, add_user, stock_of},
};

#[given("a fresh marketplace")]
async fn fresh_marketplace(world: &mut MarketWorld) {
    world.system = Some(MarketSystem::new().await);
}

#[given(expr = "the provider {string} sells {string} at {int} KES with {int} in stock")]
async fn provider_sells(world: &mut MarketWorld, provider: String, product: String, price: i64, stock: i64) {
    let provider_id = match world.providers.get(&provider) {
        Some(id) => *id,
        None => {
            let id = add_provider(&world.system().db, &format!("{provider}@example.co.ke")).await.id;
            world.providers.insert(provider.clone(), id);
            id
        },
    };
    let p = add_product(&world.system().db, provider_id, &product, price, stock).await;
    world.products.insert(product, p);
}

#[given(expr = "customer {string} exists")]
async fn customer_exists(world: &mut MarketWorld, name: String) {
    if !world.customers.contains_key(&name) {
        let id = add_user(&world.system().db, &format!("{name}@example.co.ke"), Role::Customer).await.id;
        world.customers.insert(name, id);
    }
}

#[given(expr = "customer {string} has {int} {string} in their cart")]
async fn customer_has_cart(world: &mut MarketWorld, name: String, quantity: i64, product: String) {
    customer_exists(world, name.clone()).await;
    let customer = world.customer(&name);
    let product_id = world.product(&product).id;
    world.system().db.add_to_cart(customer, product_id, quantity).await.expect("Error adding to cart");
}

#[given("the payment gateway is unreachable")]
async fn gateway_down(world: &mut MarketWorld) {
    world.system().gateway.fail_next(GatewayError::Network("connection refused".into()));
}

#[given(expr = "{string} checks out with {word}")]
#[when(expr = "{string} checks out with {word}")]
async fn checkout(world: &mut MarketWorld, name: String, method: String) {
    let customer = world.customer(&name);
    let request = CheckoutRequest::new(method.as_str(), "Tom Mboya Street, Nairobi", "0712345678");
    match world.system().api.checkout(customer, &request).await {
        Ok(result) => {
            world.last_order = Some(result.order);
            world.last_error = None;
        },
        Err(e) => {
            if let CheckoutError::PaymentInitiationFailed { order, .. } = &e {
                world.last_order = Some(order.as_ref().clone());
            }
            world.last_error = Some(e);
        },
    }
}

fn success_callback(checkout_request_id: String, merchant_request_id: String, amount: f64, receipt: String) -> PaymentCallback {
    PaymentCallback {
        checkout_request_id,
        merchant_request_id,
        result_code: 0,
        result_desc: "The service request is processed successfully.".into(),
        amount: Some(amount),
        receipt_number: Some(receipt),
        transaction_date: NaiveDate::from_ymd_opt(2023, 12, 15).and_then(|d| d.and_hms_opt(14, 30, 22)),
        phone_number: Some("254712345678".into()),
    }
}

async fn deliver(world: &mut MarketWorld, callback: PaymentCallback) {
    let outcome = world.system().api.reconcile_payment(&callback).await.expect("Reconciliation failed");
    world.last_outcome = Some(outcome);
}

#[when(expr = "the gateway reports success for the order with amount {int} and receipt {string}")]
async fn report_success(world: &mut MarketWorld, amount: i64, receipt: String) {
    let order = world.current_order().await;
    let checkout_id = order.mpesa_checkout_request_id.expect("Order has no checkout request id");
    let merchant_id = order.mpesa_merchant_request_id.unwrap_or_default();
    #[allow(clippy::cast_precision_loss)]
    let callback = success_callback(checkout_id, merchant_id, amount as f64, receipt);
    deliver(world, callback).await;
}

#[when(expr = "the gateway reports failure code {int} for the order")]
async fn report_failure(world: &mut MarketWorld, code: i64) {
    let order = world.current_order().await;
    let callback = PaymentCallback {
        checkout_request_id: order.mpesa_checkout_request_id.expect("Order has no checkout request id"),
        merchant_request_id: order.mpesa_merchant_request_id.unwrap_or_default(),
        result_code: code,
        result_desc: "Request cancelled by user".into(),
        amount: None,
        receipt_number: None,
        transaction_date: None,
        phone_number: None,
    };
    deliver(world, callback).await;
}

#[when(expr = "the gateway reports success for checkout request {string}")]
async fn report_unknown(world: &mut MarketWorld, checkout_id: String) {
    let callback = success_callback(checkout_id, "29115-0".into(), 4030.0, "XYZ999".into());
    deliver(world, callback).await;
}

#[then(expr = "checkout fails with {string}")]
async fn checkout_fails(world: &mut MarketWorld, message: String) {
    let err = world.last_error.as_ref().expect("Checkout did not fail");
    assert!(err.to_string().contains(&message), "Expected '{message}' in '{err}'");
}

#[then(expr = "there are {int} orders")]
async fn order_count(world: &mut MarketWorld, count: i64) {
    let page = world.system().db.search_orders(OrderQueryFilter::default(), Pagination::default()).await.unwrap();
    assert_eq!(page.total, count);
}

#[then(expr = "the order total is {int} KES")]
async fn order_total(world: &mut MarketWorld, total: i64) {
    assert_eq!(world.current_order().await.total_amount, Money::from_units(total));
}

#[then(expr = "the order payment status is {word}")]
async fn payment_status(world: &mut MarketWorld, status: String) {
    assert_eq!(world.current_order().await.payment_status.to_string(), status);
}

#[then(expr = "the order status is {word}")]
async fn order_status(world: &mut MarketWorld, status: String) {
    assert_eq!(world.current_order().await.order_status.to_string(), status);
}

#[then(expr = "the order receipt number is {string}")]
async fn receipt_number(world: &mut MarketWorld, receipt: String) {
    assert_eq!(world.current_order().await.mpesa_receipt_number, Some(receipt));
}

#[then(expr = "the order has {int} recorded callbacks")]
async fn recorded_callbacks(world: &mut MarketWorld, count: usize) {
    let order = world.current_order().await;
    let callbacks = world.system().db.fetch_payment_callbacks(order.id).await.unwrap();
    assert_eq!(callbacks.len(), count);
}

#[then(expr = "the callback outcome is {word}")]
async fn callback_outcome(world: &mut MarketWorld, outcome: String) {
    let actual = world.last_outcome.as_ref().expect("No callback has been delivered").callback_outcome();
    assert_eq!(actual.to_string(), outcome);
}

#[then(expr = "the gateway was asked for {int} KES")]
async fn gateway_amount(world: &mut MarketWorld, amount: i64) {
    let requests = world.system().gateway.requests();
    let last = requests.last().expect("The gateway was never called");
    assert_eq!(last.amount.whole_units_ceil(), amount);
}

#[then("the gateway was not called")]
async fn gateway_not_called(world: &mut MarketWorld) {
    assert!(world.system().gateway.requests().is_empty());
}

#[then(expr = "{string} has {int} in stock")]
async fn stock_level(world: &mut MarketWorld, product: String, stock: i64) {
    let id = world.product(&product).id;
    assert_eq!(stock_of(&world.system().db, id).await, stock);
}

#[then(expr = "the cart of {string} is empty")]
async fn cart_is_empty(world: &mut MarketWorld, name: String) {
    let customer = world.customer(&name);
    assert!(world.system().db.fetch_cart_lines(customer).await.unwrap().is_empty());
}
