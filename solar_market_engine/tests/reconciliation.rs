mod support;

use chrono::NaiveDate;
use solar_market_engine::{
    db_types::{CallbackOutcome, Money, Order, OrderStatus, PaymentStatus, Role},
    order_objects::{CheckoutRequest, PaymentCallback, ReconciliationOutcome},
    traits::{AccountManagement, CheckoutError},
    OrderFlowApi,
    SqliteDatabase,
};

use crate::support::*;

struct Fixture {
    url: String,
    db: SqliteDatabase,
    gateway: MockGateway,
    api: OrderFlowApi<SqliteDatabase, MockGateway>,
    customer: i64,
    product: i64,
}

impl Fixture {
    /// One M-PESA order for 2 x 1500, total 4030, awaiting its callback.
    async fn with_pending_order() -> (Self, Order) {
        let (url, db) = fresh_db().await;
        let gateway = MockGateway::default();
        let api = OrderFlowApi::new(db.clone(), gateway.clone());
        let customer = add_user(&db, "achieng@example.co.ke", Role::Customer).await.id;
        let provider = add_provider(&db, "jua@example.co.ke").await.id;
        let product = add_product(&db, provider, "Solar lamp", 1500, 10).await.id;
        fill_cart(&db, customer, product, 2).await;
        let request = CheckoutRequest::new("mpesa", "Nakuru", "0712345678");
        let order = api.checkout(customer, &request).await.expect("checkout failed").order;
        (Self { url, db, gateway, api, customer, product }, order)
    }

    async fn reload(&self, order: &Order) -> Order {
        self.db.fetch_order(order.id).await.unwrap().expect("order missing")
    }

    async fn finish(self) {
        drop(self.api);
        drop_db(&self.url, self.db).await;
    }
}

fn success_for(order: &Order, amount: f64) -> PaymentCallback {
    PaymentCallback {
        checkout_request_id: order.mpesa_checkout_request_id.clone().expect("no checkout request id"),
        merchant_request_id: order.mpesa_merchant_request_id.clone().expect("no merchant request id"),
        result_code: 0,
        result_desc: "The service request is processed successfully.".into(),
        amount: Some(amount),
        receipt_number: Some("ABC123".into()),
        transaction_date: NaiveDate::from_ymd_opt(2023, 12, 15).and_then(|d| d.and_hms_opt(14, 30, 22)),
        phone_number: Some("254712345678".into()),
    }
}

fn failure_for(order: &Order) -> PaymentCallback {
    PaymentCallback {
        result_code: 1,
        result_desc: "The balance is insufficient for the transaction.".into(),
        amount: None,
        receipt_number: None,
        transaction_date: None,
        phone_number: None,
        ..success_for(order, 0.0)
    }
}

#[tokio::test]
async fn successful_callback_completes_the_order() {
    let (fx, order) = Fixture::with_pending_order().await;
    assert_eq!(order.total_amount, Money::from_units(4030));

    let outcome = fx.api.reconcile_payment(&success_for(&order, 4030.0)).await.unwrap();
    assert!(matches!(outcome, ReconciliationOutcome::Applied(_)), "{outcome:?}");
    let paid = fx.reload(&order).await;
    assert_eq!(paid.payment_status, PaymentStatus::Completed);
    assert_eq!(paid.order_status, OrderStatus::Processing);
    assert_eq!(paid.mpesa_receipt_number.as_deref(), Some("ABC123"));
    assert_eq!(paid.mpesa_phone_number.as_deref(), Some("254712345678"));
    assert_eq!(paid.mpesa_transaction_date.map(|d| d.to_string()).as_deref(), Some("2023-12-15 14:30:22"));
    assert_eq!(paid.total_amount, order.total_amount);

    let trail = fx.db.fetch_payment_callbacks(order.id).await.unwrap();
    assert_eq!(trail.len(), 1);
    assert_eq!(trail[0].outcome, CallbackOutcome::Applied);
    assert_eq!(trail[0].result_code, Some(0));
    assert_eq!(trail[0].amount, Some(Money::from_units(4030)));
    assert_eq!(trail[0].receipt_number.as_deref(), Some("ABC123"));
    // Sold stock stays sold
    assert_eq!(stock_of(&fx.db, fx.product).await, 8);
    fx.finish().await;
}

#[tokio::test]
async fn repeated_callbacks_are_no_ops() {
    let (fx, order) = Fixture::with_pending_order().await;
    let callback = success_for(&order, 4030.0);
    fx.api.reconcile_payment(&callback).await.unwrap();
    let once = fx.reload(&order).await;

    let outcome = fx.api.reconcile_payment(&callback).await.unwrap();
    assert!(matches!(outcome, ReconciliationOutcome::Duplicate(_)), "{outcome:?}");
    let twice = fx.reload(&order).await;
    assert_eq!(once, twice);

    let trail = fx.db.fetch_payment_callbacks(order.id).await.unwrap();
    let outcomes = trail.iter().map(|c| c.outcome).collect::<Vec<_>>();
    assert_eq!(outcomes, vec![CallbackOutcome::Applied, CallbackOutcome::Duplicate]);
    fx.finish().await;
}

#[tokio::test]
async fn failed_payment_cancels_the_order_and_releases_stock() {
    let (fx, order) = Fixture::with_pending_order().await;
    assert_eq!(stock_of(&fx.db, fx.product).await, 8);

    let outcome = fx.api.reconcile_payment(&failure_for(&order)).await.unwrap();
    assert!(matches!(outcome, ReconciliationOutcome::Applied(_)), "{outcome:?}");
    let cancelled = fx.reload(&order).await;
    assert_eq!(cancelled.payment_status, PaymentStatus::Failed);
    assert_eq!(cancelled.order_status, OrderStatus::Cancelled);
    assert_eq!(
        cancelled.payment_failure_reason.as_deref(),
        Some("The balance is insufficient for the transaction.")
    );
    assert!(cancelled.mpesa_receipt_number.is_none());
    assert_eq!(stock_of(&fx.db, fx.product).await, 10);

    // A second failure notice must not release the stock again
    let outcome = fx.api.reconcile_payment(&failure_for(&order)).await.unwrap();
    assert!(matches!(outcome, ReconciliationOutcome::Duplicate(_)), "{outcome:?}");
    assert_eq!(stock_of(&fx.db, fx.product).await, 10);
    fx.finish().await;
}

#[tokio::test]
async fn contradicting_callback_is_an_anomaly() {
    let (fx, order) = Fixture::with_pending_order().await;
    fx.api.reconcile_payment(&success_for(&order, 4030.0)).await.unwrap();
    let outcome = fx.api.reconcile_payment(&failure_for(&order)).await.unwrap();
    assert!(matches!(outcome, ReconciliationOutcome::Conflict(_)), "{outcome:?}");
    let still_paid = fx.reload(&order).await;
    assert_eq!(still_paid.payment_status, PaymentStatus::Completed);
    assert_eq!(still_paid.order_status, OrderStatus::Processing);
    assert_eq!(stock_of(&fx.db, fx.product).await, 8);

    let trail = fx.db.fetch_payment_callbacks(order.id).await.unwrap();
    assert_eq!(trail[1].outcome, CallbackOutcome::Anomaly);
    assert!(trail[1].note.as_deref().unwrap_or_default().contains("contradicting"));
    fx.finish().await;
}

#[tokio::test]
async fn unknown_checkout_request_changes_nothing() {
    let (fx, order) = Fixture::with_pending_order().await;
    let mut callback = success_for(&order, 4030.0);
    callback.checkout_request_id = "ws_CO_DOES_NOT_EXIST".into();

    let outcome = fx.api.reconcile_payment(&callback).await.unwrap();
    assert_eq!(outcome, ReconciliationOutcome::Unmatched);
    assert_eq!(fx.reload(&order).await, order);
    assert!(fx.db.fetch_payment_callbacks(order.id).await.unwrap().is_empty());
    fx.finish().await;
}

#[tokio::test]
async fn amount_mismatch_is_flagged_but_applied() {
    let (fx, order) = Fixture::with_pending_order().await;
    let outcome = fx.api.reconcile_payment(&success_for(&order, 1.0)).await.unwrap();
    match &outcome {
        ReconciliationOutcome::AmountMismatch { requested, reported, .. } => {
            assert_eq!(*requested, Money::from_units(4030));
            assert_eq!(*reported, Some(Money::from_units(1)));
        },
        o => panic!("Unexpected outcome {o:?}"),
    }
    assert_eq!(fx.reload(&order).await.payment_status, PaymentStatus::Completed);
    let trail = fx.db.fetch_payment_callbacks(order.id).await.unwrap();
    assert_eq!(trail[0].outcome, CallbackOutcome::Anomaly);
    fx.finish().await;
}

#[tokio::test]
async fn concurrent_deliveries_apply_once() {
    let (fx, order) = Fixture::with_pending_order().await;
    let callback = success_for(&order, 4030.0);
    let (a, b, c) = tokio::join!(
        fx.api.reconcile_payment(&callback),
        fx.api.reconcile_payment(&callback),
        fx.api.reconcile_payment(&callback)
    );
    let outcomes = [a.unwrap(), b.unwrap(), c.unwrap()];
    let applied = outcomes.iter().filter(|o| matches!(o, ReconciliationOutcome::Applied(_))).count();
    let duplicates = outcomes.iter().filter(|o| matches!(o, ReconciliationOutcome::Duplicate(_))).count();
    assert_eq!((applied, duplicates), (1, 2), "{outcomes:?}");
    assert_eq!(fx.reload(&order).await.payment_status, PaymentStatus::Completed);
    fx.finish().await;
}

#[tokio::test]
async fn payment_status_queries_are_restricted_to_the_owner() {
    let (fx, order) = Fixture::with_pending_order().await;
    let checkout_id = order.mpesa_checkout_request_id.clone().unwrap();

    let status = fx.api.query_payment_status(&checkout_id, fx.customer, Role::Customer).await.unwrap();
    assert_eq!(status["CheckoutRequestID"], checkout_id.as_str());

    let stranger = add_user(&fx.db, "mallory@example.co.ke", Role::Customer).await.id;
    let err = fx.api.query_payment_status(&checkout_id, stranger, Role::Customer).await.unwrap_err();
    assert!(matches!(err, CheckoutError::NotFound(_)), "{err}");

    let admin = add_user(&fx.db, "admin@example.co.ke", Role::Admin).await.id;
    fx.api.query_payment_status(&checkout_id, admin, Role::Admin).await.unwrap();
    assert_eq!(fx.gateway.queries().len(), 2);
    fx.finish().await;
}
