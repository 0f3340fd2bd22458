use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{NewUser, Role, User},
    traits::data_objects::UserQueryFilter,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, sqlx::Error> {
    let user = sqlx::query_as(
        r#"
            INSERT INTO users (email, full_name, phone, role)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(user.email.trim().to_lowercase())
    .bind(user.full_name)
    .bind(user.phone)
    .bind(user.role)
    .fetch_one(conn)
    .await?;
    Ok(user)
}

pub async fn fetch_user(id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_users(filter: UserQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<User>, sqlx::Error> {
    let mut builder = QueryBuilder::new("SELECT * FROM users");
    if let Some(role) = filter.role {
        builder.push(" WHERE role = ");
        builder.push_bind(role);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    builder.build_query_as::<User>().fetch_all(conn).await
}

pub async fn set_active(id: i64, active: bool, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("UPDATE users SET is_active = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
        .bind(active)
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn count_users(role: Option<Role>, conn: &mut SqliteConnection) -> Result<i64, sqlx::Error> {
    let count: i64 = match role {
        Some(role) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE role = $1").bind(role).fetch_one(conn).await?
        },
        None => sqlx::query_scalar("SELECT COUNT(*) FROM users").fetch_one(conn).await?,
    };
    Ok(count)
}
