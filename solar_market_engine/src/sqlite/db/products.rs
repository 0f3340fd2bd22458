use log::trace;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, UpdateProduct},
    traits::data_objects::{Page, Pagination, ProductFilter, ProviderAnalytics},
};

pub async fn insert_product(
    provider_id: i64,
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO products (
                provider_id,
                name,
                description,
                price,
                wattage,
                battery_capacity,
                solar_panel_type,
                lighting_duration,
                warranty_period,
                stock_quantity,
                image_url
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(provider_id)
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.wattage)
    .bind(product.battery_capacity)
    .bind(product.solar_panel_type)
    .bind(product.lighting_duration)
    .bind(product.warranty_period)
    .bind(product.stock_quantity)
    .bind(product.image_url)
    .fetch_one(conn)
    .await
}

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_products_for_provider(
    provider_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE provider_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(provider_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_all_products(only_unapproved: bool, conn: &mut SqliteConnection) -> Result<Vec<Product>, sqlx::Error> {
    let sql = if only_unapproved {
        "SELECT * FROM products WHERE is_approved = 0 ORDER BY created_at ASC, id ASC"
    } else {
        "SELECT * FROM products ORDER BY created_at DESC, id DESC"
    };
    sqlx::query_as(sql).fetch_all(conn).await
}

fn push_catalogue_filter(builder: &mut QueryBuilder<'_, Sqlite>, filter: &ProductFilter) {
    builder.push(" WHERE is_active = 1 AND is_approved = 1");
    if let Some(search) = filter.search.as_ref().map(|s| s.trim()).filter(|s| !s.is_empty()) {
        let pattern = format!("%{}%", search.to_lowercase());
        builder.push(" AND (LOWER(name) LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR LOWER(description) LIKE ");
        builder.push_bind(pattern);
        builder.push(")");
    }
    if let Some(min) = filter.min_price {
        builder.push(" AND price >= ");
        builder.push_bind(min);
    }
    if let Some(max) = filter.max_price {
        builder.push(" AND price <= ");
        builder.push_bind(max);
    }
    if let Some(min) = filter.min_wattage {
        builder.push(" AND wattage >= ");
        builder.push_bind(min);
    }
    if let Some(max) = filter.max_wattage {
        builder.push(" AND wattage <= ");
        builder.push_bind(max);
    }
}

/// Searches the customer-visible catalogue (active and approved products only).
pub async fn search_products(
    filter: ProductFilter,
    page: Pagination,
    conn: &mut SqliteConnection,
) -> Result<Page<Product>, sqlx::Error> {
    let mut count_query = QueryBuilder::new("SELECT COUNT(*) FROM products");
    push_catalogue_filter(&mut count_query, &filter);
    let total: i64 = count_query.build_query_scalar().fetch_one(&mut *conn).await?;

    let mut builder = QueryBuilder::new("SELECT * FROM products");
    push_catalogue_filter(&mut builder, &filter);
    builder.push(" ORDER BY created_at DESC, id DESC LIMIT ");
    builder.push_bind(page.limit());
    builder.push(" OFFSET ");
    builder.push_bind(page.offset());
    trace!("🗃️ Executing query: {}", builder.sql());
    let products = builder.build_query_as::<Product>().fetch_all(conn).await?;
    Ok(Page::new(products, total, page))
}

/// Only the fields present in `update` are changed.
pub async fn update_product(
    id: i64,
    update: UpdateProduct,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE products SET
                name = COALESCE($1, name),
                description = COALESCE($2, description),
                price = COALESCE($3, price),
                wattage = COALESCE($4, wattage),
                battery_capacity = COALESCE($5, battery_capacity),
                solar_panel_type = COALESCE($6, solar_panel_type),
                lighting_duration = COALESCE($7, lighting_duration),
                warranty_period = COALESCE($8, warranty_period),
                stock_quantity = COALESCE($9, stock_quantity),
                image_url = COALESCE($10, image_url),
                is_active = COALESCE($11, is_active),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $12
            RETURNING *;
        "#,
    )
    .bind(update.name)
    .bind(update.description)
    .bind(update.price)
    .bind(update.wattage)
    .bind(update.battery_capacity)
    .bind(update.solar_panel_type)
    .bind(update.lighting_duration)
    .bind(update.warranty_period)
    .bind(update.stock_quantity)
    .bind(update.image_url)
    .bind(update.is_active)
    .bind(id)
    .fetch_optional(conn)
    .await
}

pub async fn set_active(id: i64, active: bool, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("UPDATE products SET is_active = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(active)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn set_approval(id: i64, approved: bool, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("UPDATE products SET is_approved = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(approved)
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Takes `quantity` units out of stock, but only if the product is buyable and has enough stock left.
///
/// Returns `false` (and changes nothing) otherwise. This is the only place stock is decremented, and the guard in the
/// `WHERE` clause is what stops two concurrent checkouts from overselling.
pub async fn reserve_stock(product_id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE products SET stock_quantity = stock_quantity - $1, updated_at = CURRENT_TIMESTAMP
            WHERE id = $2 AND stock_quantity >= $1 AND is_active = 1 AND is_approved = 1
        "#,
    )
    .bind(quantity)
    .bind(product_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Puts the stock reserved by every line of the order back.
pub async fn release_stock_for_order(order_id: i64, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE products SET
                stock_quantity = stock_quantity + (
                    SELECT COALESCE(SUM(quantity), 0) FROM order_items
                    WHERE order_items.order_id = $1 AND order_items.product_id = products.id
                ),
                updated_at = CURRENT_TIMESTAMP
            WHERE id IN (SELECT product_id FROM order_items WHERE order_id = $1)
        "#,
    )
    .bind(order_id)
    .execute(conn)
    .await?;
    trace!("🗃️ Released stock for {} products of order {order_id}", result.rows_affected());
    Ok(result.rows_affected())
}

pub async fn provider_analytics(provider_id: i64, conn: &mut SqliteConnection) -> Result<ProviderAnalytics, sqlx::Error> {
    let (total, approved): (i64, i64) = sqlx::query_as(
        "SELECT COUNT(*), COALESCE(SUM(is_approved), 0) FROM products WHERE provider_id = $1",
    )
    .bind(provider_id)
    .fetch_one(conn)
    .await?;
    Ok(ProviderAnalytics { total_products: total, approved_products: approved, pending_products: total - approved })
}

/// Returns (total, approved) product counts across the platform.
pub async fn product_counts(conn: &mut SqliteConnection) -> Result<(i64, i64), sqlx::Error> {
    sqlx::query_as("SELECT COUNT(*), COALESCE(SUM(is_approved), 0) FROM products").fetch_one(conn).await
}
