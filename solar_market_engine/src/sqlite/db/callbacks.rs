use sqlx::SqliteConnection;

use crate::db_types::{NewPaymentCallback, PaymentCallbackRecord};

pub async fn insert_callback(
    callback: NewPaymentCallback,
    conn: &mut SqliteConnection,
) -> Result<PaymentCallbackRecord, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO payment_callbacks (
                order_id,
                checkout_request_id,
                merchant_request_id,
                result_code,
                result_desc,
                amount,
                receipt_number,
                outcome,
                note
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING *;
        "#,
    )
    .bind(callback.order_id)
    .bind(callback.checkout_request_id)
    .bind(callback.merchant_request_id)
    .bind(callback.result_code)
    .bind(callback.result_desc)
    .bind(callback.amount)
    .bind(callback.receipt_number)
    .bind(callback.outcome)
    .bind(callback.note)
    .fetch_one(conn)
    .await
}

pub async fn fetch_callbacks_for_order(
    order_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<PaymentCallbackRecord>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM payment_callbacks WHERE order_id = $1 ORDER BY id ASC")
        .bind(order_id)
        .fetch_all(conn)
        .await
}
