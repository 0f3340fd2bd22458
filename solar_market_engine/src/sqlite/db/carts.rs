use sqlx::SqliteConnection;

use crate::db_types::{CartItem, CartLine};

const CART_LINE_SELECT: &str = r#"
    SELECT
        c.id, c.customer_id, c.product_id, c.quantity,
        p.name, p.price, p.image_url, p.stock_quantity, p.is_active, p.is_approved
    FROM cart_items c JOIN products p ON p.id = c.product_id
"#;

pub async fn fetch_cart_lines(customer_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, sqlx::Error> {
    let sql = format!("{CART_LINE_SELECT} WHERE c.customer_id = $1 ORDER BY c.id ASC");
    sqlx::query_as(&sql).bind(customer_id).fetch_all(conn).await
}

pub async fn fetch_cart_line(
    customer_id: i64,
    item_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartLine>, sqlx::Error> {
    let sql = format!("{CART_LINE_SELECT} WHERE c.customer_id = $1 AND c.id = $2");
    sqlx::query_as(&sql).bind(customer_id).bind(item_id).fetch_optional(conn).await
}

pub async fn fetch_cart_item_for_product(
    customer_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM cart_items WHERE customer_id = $1 AND product_id = $2")
        .bind(customer_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await
}

/// Inserts a cart line, or adds to the quantity of the existing line for the same product.
pub async fn upsert_cart_item(
    customer_id: i64,
    product_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<CartItem, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO cart_items (customer_id, product_id, quantity) VALUES ($1, $2, $3)
            ON CONFLICT (customer_id, product_id)
            DO UPDATE SET quantity = quantity + excluded.quantity, updated_at = CURRENT_TIMESTAMP
            RETURNING *;
        "#,
    )
    .bind(customer_id)
    .bind(product_id)
    .bind(quantity)
    .fetch_one(conn)
    .await
}

pub async fn count_cart_lines(customer_id: i64, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM cart_items WHERE customer_id = $1").bind(customer_id).fetch_one(conn).await
}

pub async fn set_quantity(
    customer_id: i64,
    item_id: i64,
    quantity: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<CartItem>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE cart_items SET quantity = $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND customer_id = $3
            RETURNING *;
        "#,
    )
    .bind(quantity)
    .bind(item_id)
    .bind(customer_id)
    .fetch_optional(conn)
    .await
}

pub async fn remove_item(customer_id: i64, item_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND customer_id = $2")
        .bind(item_id)
        .bind(customer_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn clear_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE customer_id = $1").bind(customer_id).execute(conn).await?;
    Ok(result.rows_affected())
}

/// Removes the product from every customer's cart.
pub async fn purge_product(product_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("DELETE FROM cart_items WHERE product_id = $1").bind(product_id).execute(conn).await?;
    Ok(result.rows_affected())
}
