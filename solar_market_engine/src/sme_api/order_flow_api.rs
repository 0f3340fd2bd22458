use std::{fmt::Debug, sync::Arc};

use log::*;
use serde_json::Value;

use crate::{
    db_types::{Money, NewOrder, NewOrderItem, NewPaymentCallback, Order, Role},
    helpers::{RandomReferences, ReferenceGenerator},
    order_objects::{
        CheckoutRequest,
        CheckoutResult,
        OrderQuote,
        PaymentCallback,
        PricingPolicy,
        ReconciliationOutcome,
        ValidCheckout,
    },
    traits::{CheckoutError, CheckoutManagement, PaymentGateway, PaymentRequest, Settlement},
};

/// How many fresh order numbers to try before giving up on a checkout.
pub const MAX_REFERENCE_ATTEMPTS: usize = 5;

/// `OrderFlowApi` is the primary API for the checkout-to-payment flow. It turns a customer's cart into an order,
/// asks the payment gateway to prompt the payer, and later reconciles the gateway's callback against the order.
pub struct OrderFlowApi<B, G> {
    db: B,
    gateway: G,
    policy: PricingPolicy,
    references: Arc<dyn ReferenceGenerator>,
}

impl<B, G> Debug for OrderFlowApi<B, G> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi ({:?})", self.policy)
    }
}

impl<B, G> OrderFlowApi<B, G> {
    pub fn new(db: B, gateway: G) -> Self {
        Self { db, gateway, policy: PricingPolicy::default(), references: Arc::new(RandomReferences) }
    }

    pub fn with_pricing(mut self, policy: PricingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_references(mut self, references: Arc<dyn ReferenceGenerator>) -> Self {
        self.references = references;
        self
    }

    pub fn pricing(&self) -> &PricingPolicy {
        &self.policy
    }

    pub fn db(&self) -> &B {
        &self.db
    }
}

impl<B, G> OrderFlowApi<B, G>
where
    B: CheckoutManagement,
    G: PaymentGateway,
{
    /// Converts the customer's cart into an order.
    ///
    /// The order and its line items are written in one transaction that also reserves stock, so a checkout either
    /// produces a complete order or nothing at all. Only then is the gateway contacted, because the remote call cannot
    /// take part in a local transaction.
    ///
    /// * For M-PESA, the gateway's correlation ids are stored on the order, which stays `pending` until the callback
    ///   arrives. If the gateway refuses or cannot be reached, the order is kept with a `failed` payment status and
    ///   [`CheckoutError::PaymentInitiationFailed`] is returned. The cart is left alone in that case so the customer
    ///   can try again.
    /// * Every other method is treated as paid out of band, and the order moves straight to `completed`/`processing`.
    pub async fn checkout(&self, customer_id: i64, request: &CheckoutRequest) -> Result<CheckoutResult, CheckoutError> {
        let checkout = request.validate()?;
        let lines = self.db.fetch_cart_lines(customer_id).await?;
        if lines.is_empty() {
            debug!("🛒️ Customer {customer_id} tried to check out an empty cart");
            return Err(CheckoutError::EmptyCart);
        }
        if let Some(line) = lines.iter().find(|l| !l.is_purchasable()) {
            debug!(
                "🛒️ Checkout for customer {customer_id} refused. {} has {} in stock, {} requested",
                line.name, line.stock_quantity, line.quantity
            );
            let product_name = line.name.clone();
            return Err(CheckoutError::InsufficientStock { product_id: line.product_id, product_name });
        }
        let quote = self.policy.quote(&lines)?;
        let items = lines.iter().map(NewOrderItem::from).collect::<Vec<_>>();
        let order = self.create_order(customer_id, &checkout, &quote, &items).await?;
        info!(
            "🛒️ Order {} created for customer {customer_id}. {} items, total {}, paying by {}",
            order.order_number,
            items.len(),
            order.total_amount,
            order.payment_method
        );
        if checkout.payment_method.is_asynchronous() {
            self.request_payment(order).await
        } else {
            let order = self.db.complete_offline_payment(order.id).await?;
            self.clear_cart(customer_id).await;
            Ok(CheckoutResult { order, payment: None })
        }
    }

    async fn create_order(
        &self,
        customer_id: i64,
        checkout: &ValidCheckout,
        quote: &OrderQuote,
        items: &[NewOrderItem],
    ) -> Result<Order, CheckoutError> {
        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let order = NewOrder {
                order_number: self.references.order_number(),
                customer_id,
                subtotal: quote.subtotal,
                shipping_fee: quote.shipping_fee,
                tax: quote.tax,
                total_amount: quote.total,
                payment_method: checkout.payment_method,
                shipping_address: checkout.shipping_address.clone(),
                phone_number: checkout.phone_number.clone(),
            };
            match self.db.create_order(order, items).await {
                Err(CheckoutError::OrderNumberCollision(n)) => {
                    warn!("🛒️ Order number {n} is already taken (attempt {attempt}). Generating another one.");
                },
                result => return result,
            }
        }
        error!("🛒️ Could not find an unused order number after {MAX_REFERENCE_ATTEMPTS} attempts");
        Err(CheckoutError::DatabaseError(format!(
            "Could not generate a unique order number after {MAX_REFERENCE_ATTEMPTS} attempts"
        )))
    }

    async fn request_payment(&self, order: Order) -> Result<CheckoutResult, CheckoutError> {
        let request = PaymentRequest {
            phone: order.phone_number.clone(),
            amount: order.total_amount,
            account_reference: order.order_number.to_string(),
            description: format!("Payment for order {}", order.order_number),
        };
        match self.gateway.initiate_payment(request).await {
            Ok(initiation) => {
                let order = self
                    .db
                    .attach_payment_request(order.id, &initiation.checkout_request_id, &initiation.merchant_request_id)
                    .await?;
                info!(
                    "🛒️ Payment prompt sent for order {}. Checkout request id {}",
                    order.order_number, initiation.checkout_request_id
                );
                self.clear_cart(order.customer_id).await;
                Ok(CheckoutResult { order, payment: Some(initiation) })
            },
            Err(e) => {
                warn!("🛒️ Payment initiation for order {} failed. {e}", order.order_number);
                let order = self.db.fail_payment_initiation(order.id, &e.to_string()).await?;
                Err(CheckoutError::PaymentInitiationFailed { order: Box::new(order), source: e })
            },
        }
    }

    // The order is already committed at this point, so a failure here must not fail the checkout.
    async fn clear_cart(&self, customer_id: i64) {
        match self.db.clear_cart(customer_id).await {
            Ok(n) => trace!("🛒️ Cleared {n} lines from the cart of customer {customer_id}"),
            Err(e) => error!("🛒️ Could not clear the cart of customer {customer_id}. {e}"),
        }
    }

    /// Applies a payment callback to the matching order, exactly once in effect.
    ///
    /// The state change is a compare-and-swap from `pending`, so concurrent or repeated deliveries of the same
    /// callback cannot both win. Every callback that gets this far is written to the audit trail along with the
    /// outcome. Only storage failures are returned as errors; the caller must still acknowledge the callback.
    pub async fn reconcile_payment(&self, callback: &PaymentCallback) -> Result<ReconciliationOutcome, CheckoutError> {
        let checkout_id = callback.checkout_request_id.as_str();
        let verdict = callback.verdict();
        let outcome = match self.db.settle_payment(checkout_id, &verdict).await? {
            Settlement::Applied(order) if callback.is_success() => {
                let requested = Money::from_units(order.total_amount.whole_units_ceil());
                let reported = callback.reported_amount();
                if reported == Some(requested) {
                    ReconciliationOutcome::Applied(order)
                } else {
                    ReconciliationOutcome::AmountMismatch { order, requested, reported }
                }
            },
            Settlement::Applied(order) => ReconciliationOutcome::Applied(order),
            Settlement::AlreadySettled(order) if order.payment_status == verdict.payment_status() => {
                ReconciliationOutcome::Duplicate(order)
            },
            Settlement::AlreadySettled(order) => ReconciliationOutcome::Conflict(order),
            Settlement::NotFound => ReconciliationOutcome::Unmatched,
        };
        match &outcome {
            ReconciliationOutcome::Applied(order) => info!(
                "🔄️ Order {} payment is now {} (checkout request {checkout_id})",
                order.order_number, order.payment_status
            ),
            ReconciliationOutcome::Duplicate(order) => {
                debug!("🔄️ Duplicate callback for order {} ignored", order.order_number)
            },
            ReconciliationOutcome::Unmatched => {
                warn!("🔄️ Received a callback for checkout request {checkout_id}, but no order carries that id")
            },
            anomaly => {
                warn!("🔄️ Callback anomaly for checkout request {checkout_id}. {}", anomaly.note().unwrap_or_default())
            },
        }
        self.record_callback(callback, &outcome).await;
        Ok(outcome)
    }

    async fn record_callback(&self, callback: &PaymentCallback, outcome: &ReconciliationOutcome) {
        let record = NewPaymentCallback {
            order_id: outcome.order().map(|o| o.id),
            checkout_request_id: callback.checkout_request_id.clone(),
            merchant_request_id: callback.merchant_request_id.clone(),
            result_code: Some(callback.result_code),
            result_desc: callback.result_desc.clone(),
            amount: callback.reported_amount(),
            receipt_number: callback.receipt_number.clone(),
            outcome: outcome.callback_outcome(),
            note: outcome.note(),
        };
        if let Err(e) = self.db.record_payment_callback(record).await {
            error!("🔄️ Could not record callback for checkout request {}. {e}", callback.checkout_request_id);
        }
    }

    /// Asks the gateway for the current state of a payment request.
    ///
    /// Customers may only query requests belonging to their own orders. Anyone else gets
    /// [`CheckoutError::NotFound`], so the endpoint cannot be used to probe for other customers' payments.
    pub async fn query_payment_status(
        &self,
        checkout_request_id: &str,
        user_id: i64,
        role: Role,
    ) -> Result<Value, CheckoutError> {
        if role != Role::Admin {
            match self.db.fetch_order_by_checkout_request_id(checkout_request_id).await? {
                Some(order) if order.customer_id == user_id => {},
                _ => return Err(CheckoutError::NotFound(format!("Payment request {checkout_request_id}"))),
            }
        }
        let status = self.gateway.query_status(checkout_request_id).await?;
        trace!("🛒️ Gateway status for {checkout_request_id}: {status}");
        Ok(status)
    }
}
