use sqlx::SqliteConnection;

use crate::db_types::{NewSupportTicket, SupportTicket, TicketResponse, TicketStatus};

pub async fn insert_ticket(ticket: NewSupportTicket, conn: &mut SqliteConnection) -> Result<SupportTicket, sqlx::Error> {
    sqlx::query_as(
        r#"
            INSERT INTO support_tickets (ticket_number, customer_id, order_id, subject, message)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *;
        "#,
    )
    .bind(ticket.ticket_number)
    .bind(ticket.customer_id)
    .bind(ticket.order_id)
    .bind(ticket.subject)
    .bind(ticket.message)
    .fetch_one(conn)
    .await
}

pub async fn fetch_ticket(id: i64, conn: &mut SqliteConnection) -> Result<Option<SupportTicket>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM support_tickets WHERE id = $1").bind(id).fetch_optional(conn).await
}

pub async fn fetch_tickets_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<SupportTicket>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM support_tickets WHERE customer_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(customer_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_tickets_by_status(
    status: TicketStatus,
    conn: &mut SqliteConnection,
) -> Result<Vec<SupportTicket>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM support_tickets WHERE status = $1 ORDER BY created_at ASC, id ASC")
        .bind(status)
        .fetch_all(conn)
        .await
}

const RESPONSE_SELECT: &str = r#"
    SELECT r.id, r.ticket_id, r.responder_id, r.message, u.full_name AS responder_name, u.role AS responder_role,
        r.created_at
    FROM ticket_responses r LEFT JOIN users u ON u.id = r.responder_id
"#;

pub async fn fetch_responses(ticket_id: i64, conn: &mut SqliteConnection) -> Result<Vec<TicketResponse>, sqlx::Error> {
    let sql = format!("{RESPONSE_SELECT} WHERE r.ticket_id = $1 ORDER BY r.id ASC");
    sqlx::query_as(&sql).bind(ticket_id).fetch_all(conn).await
}

pub async fn insert_response(
    ticket_id: i64,
    responder_id: i64,
    message: &str,
    conn: &mut SqliteConnection,
) -> Result<TicketResponse, sqlx::Error> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO ticket_responses (ticket_id, responder_id, message) VALUES ($1, $2, $3) RETURNING id",
    )
    .bind(ticket_id)
    .bind(responder_id)
    .bind(message)
    .fetch_one(&mut *conn)
    .await?;
    let sql = format!("{RESPONSE_SELECT} WHERE r.id = $1");
    sqlx::query_as(&sql).bind(id).fetch_one(conn).await
}

pub async fn set_status(id: i64, status: TicketStatus, conn: &mut SqliteConnection) -> Result<u64, sqlx::Error> {
    let result = sqlx::query("UPDATE support_tickets SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2")
        .bind(status)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn order_belongs_to(order_id: i64, customer_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE id = $1 AND customer_id = $2")
        .bind(order_id)
        .bind(customer_id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}
