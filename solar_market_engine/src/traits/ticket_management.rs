use thiserror::Error;

use crate::db_types::{NewSupportTicket, SupportTicket, TicketNumber, TicketResponse, TicketStatus};

#[derive(Debug, Clone, Error)]
pub enum TicketApiError {
    #[error("{0}")]
    ValidationError(String),
    #[error("Ticket {0} not found")]
    NotFound(i64),
    #[error("Invalid order")]
    InvalidOrder,
    #[error("Ticket number {0} is already in use")]
    TicketNumberCollision(TicketNumber),
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for TicketApiError {
    fn from(e: sqlx::Error) -> Self {
        TicketApiError::DatabaseError(e.to_string())
    }
}

#[allow(async_fn_in_trait)]
pub trait TicketManagement {
    /// Fails with [`TicketApiError::TicketNumberCollision`] if the ticket number is taken.
    async fn insert_ticket(&self, ticket: NewSupportTicket) -> Result<SupportTicket, TicketApiError>;

    async fn fetch_ticket(&self, ticket_id: i64) -> Result<Option<SupportTicket>, TicketApiError>;

    /// Newest first.
    async fn fetch_tickets_for_customer(&self, customer_id: i64) -> Result<Vec<SupportTicket>, TicketApiError>;

    async fn fetch_tickets_by_status(&self, status: TicketStatus) -> Result<Vec<SupportTicket>, TicketApiError>;

    async fn fetch_ticket_responses(&self, ticket_id: i64) -> Result<Vec<TicketResponse>, TicketApiError>;

    /// Adds a response and optionally marks the ticket resolved, atomically.
    async fn insert_ticket_response(
        &self,
        ticket_id: i64,
        responder_id: i64,
        message: &str,
        resolve: bool,
    ) -> Result<TicketResponse, TicketApiError>;

    /// Whether `order_id` exists and belongs to `customer_id`.
    async fn order_belongs_to(&self, order_id: i64, customer_id: i64) -> Result<bool, TicketApiError>;
}
