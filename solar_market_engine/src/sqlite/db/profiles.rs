use sqlx::SqliteConnection;

use crate::db_types::{NewProviderProfile, ProviderProfile, UpdateProviderProfile};

pub async fn insert_profile(
    user_id: i64,
    profile: NewProviderProfile,
    conn: &mut SqliteConnection,
) -> Result<ProviderProfile, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO provider_profiles (user_id, business_name, business_description, business_address, tax_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(user_id)
    .bind(profile.business_name)
    .bind(profile.business_description)
    .bind(profile.business_address)
    .bind(profile.tax_id)
    .fetch_one(conn)
    .await
}

pub async fn fetch_profile_for_user(
    user_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ProviderProfile>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM provider_profiles WHERE user_id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn fetch_profiles(approved: bool, conn: &mut SqliteConnection) -> Result<Vec<ProviderProfile>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM provider_profiles WHERE is_approved = $1 ORDER BY created_at ASC, id ASC")
        .bind(approved)
        .fetch_all(conn)
        .await
}

/// Only the fields present in `update` are changed.
pub async fn update_profile(
    user_id: i64,
    update: UpdateProviderProfile,
    conn: &mut SqliteConnection,
) -> Result<Option<ProviderProfile>, sqlx::Error> {
    sqlx::query_as(
        r#"
            UPDATE provider_profiles SET
                business_name = COALESCE($1, business_name),
                business_description = COALESCE($2, business_description),
                business_address = COALESCE($3, business_address),
                tax_id = COALESCE($4, tax_id),
                updated_at = CURRENT_TIMESTAMP
            WHERE user_id = $5
            RETURNING *;
        "#,
    )
    .bind(update.business_name)
    .bind(update.business_description)
    .bind(update.business_address)
    .bind(update.tax_id)
    .bind(user_id)
    .fetch_optional(conn)
    .await
}

pub async fn set_approval(
    profile_id: i64,
    approved: bool,
    conn: &mut SqliteConnection,
) -> Result<Option<ProviderProfile>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE provider_profiles SET is_approved = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(approved)
    .bind(profile_id)
    .fetch_optional(conn)
    .await
}
