use chrono::NaiveDateTime;
use log::{debug, trace};
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Money, NewOrder, NewOrderItem, Order, OrderItem, PaymentStatus},
    traits::data_objects::{OrderQueryFilter, Page, Pagination},
};

/// Inserts a new order in the `pending`/`pending` state. This is not atomic. Embed the call in a transaction (together
/// with the line items) and pass `&mut tx` as the connection.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, sqlx::Error> {
    let order: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_id,
                subtotal,
                shipping_fee,
                tax,
                total_amount,
                payment_method,
                shipping_address,
                phone_number
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(order.customer_id)
    .bind(order.subtotal)
    .bind(order.shipping_fee)
    .bind(order.tax)
    .bind(order.total_amount)
    .bind(order.payment_method)
    .bind(order.shipping_address)
    .bind(order.phone_number)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Order [{}] inserted with id {}", order.order_number, order.id);
    Ok(order)
}

pub async fn insert_order_item(
    order_id: i64,
    item: &NewOrderItem,
    conn: &mut SqliteConnection,
) -> Result<OrderItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO order_items (order_id, product_id, product_name, quantity, unit_price)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .bind(item.product_id)
    .bind(&item.product_name)
    .bind(item.quantity)
    .bind(item.unit_price)
    .fetch_one(conn)
    .await
}

pub async fn fetch_order(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_order_by_checkout_request_id(
    checkout_request_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM orders WHERE mpesa_checkout_request_id = $1")
        .bind(checkout_request_id)
        .fetch_optional(conn)
        .await
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}

fn push_order_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &OrderQueryFilter) {
    if filter.is_empty() {
        return;
    }
    builder.push(" WHERE ");
    let mut where_clause = builder.separated(" AND ");
    if let Some(cid) = filter.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if let Some(status) = filter.payment_status {
        where_clause.push("payment_status = ");
        where_clause.push_bind_unseparated(status);
    }
    if let Some(status) = filter.order_status {
        where_clause.push("order_status = ");
        where_clause.push_bind_unseparated(status);
    }
}

/// Fetches orders according to the filter, newest first.
pub async fn search_orders(
    filter: OrderQueryFilter,
    page: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<Order>, sqlx::Error> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM orders");
    push_order_filter(&mut count_query, &filter);
    let total: i64 = count_query.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM orders");
    push_order_filter(&mut builder, &filter);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(page.limit());
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let orders = builder.build_query_as::<Order>().fetch_all(conn).await?;
    Ok(Page::new(orders, total, page))
}

/// Stores the gateway correlation ids. Only pending orders can be linked to a payment request.
pub async fn attach_payment_request(
    id: i64,
    checkout_request_id: &str,
    merchant_request_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET
                mpesa_checkout_request_id = $1,
                mpesa_merchant_request_id = $2,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $3 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(checkout_request_id)
    .bind(merchant_request_id)
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// `pending` -> `failed` for an order whose payment request never reached the payer. Returns `None` if the order is
/// not pending.
pub async fn fail_initiation(id: i64, reason: &str, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'failed',
                payment_failure_reason = $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(reason)
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// `pending` -> `completed`/`processing` for payment methods that need no confirmation.
pub async fn complete_offline(id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'completed',
                order_status = 'processing',
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// `pending` -> `completed`/`processing` on a successful payment callback. Returns `None` if no pending order carries
/// the checkout request id.
pub async fn complete_payment(
    checkout_request_id: &str,
    receipt_number: Option<&str>,
    transaction_date: Option<NaiveDateTime>,
    phone_number: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'completed',
                order_status = 'processing',
                mpesa_receipt_number = $1,
                mpesa_transaction_date = $2,
                mpesa_phone_number = $3,
                updated_at = CURRENT_TIMESTAMP
            WHERE mpesa_checkout_request_id = $4 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(receipt_number)
    .bind(transaction_date)
    .bind(phone_number)
    .bind(checkout_request_id)
    .fetch_optional(conn)
    .await
}

/// `pending` -> `failed`/`cancelled` on a failed payment callback. Returns `None` if no pending order carries the
/// checkout request id.
pub async fn cancel_payment(
    checkout_request_id: &str,
    reason: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE orders SET
                payment_status = 'failed',
                order_status = 'cancelled',
                payment_failure_reason = $1,
                updated_at = CURRENT_TIMESTAMP
            WHERE mpesa_checkout_request_id = $2 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(reason)
    .bind(checkout_request_id)
    .fetch_optional(conn)
    .await
}

pub async fn count_orders(conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM orders").fetch_one(conn).await
}

/// Sum of the totals of all orders with the given payment status.
pub async fn revenue(status: PaymentStatus, conn: &mut SqliteConnection) -> Result<Money, sqlx::Error> {
    let cents: i64 = sqlx::query_scalar("SELECT COALESCE(SUM(total_amount), 0) FROM orders WHERE payment_status = $1")
        .bind(status)
        .fetch_one(conn)
        .await?;
    Ok(Money::from_cents(cents))
}
