//! Customer support tickets. Customers open tickets, optionally about one of their own orders; providers answer them.
use std::{fmt::Debug, sync::Arc};

use log::*;
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{NewSupportTicket, SupportTicket, TicketResponse, TicketStatus},
    helpers::{RandomReferences, ReferenceGenerator},
    traits::{TicketApiError, TicketManagement},
};

const MAX_REFERENCE_ATTEMPTS: usize = 5;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TicketRequest {
    pub subject: Option<String>,
    pub message: Option<String>,
    pub order_id: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketDetail {
    #[serde(flatten)]
    pub ticket: SupportTicket,
    pub responses: Vec<TicketResponse>,
}

pub struct TicketApi<B> {
    db: B,
    references: Arc<dyn ReferenceGenerator>,
}

impl<B: Debug> Debug for TicketApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "TicketApi ({:?})", self.db)
    }
}

impl<B> TicketApi<B>
where B: TicketManagement
{
    pub fn new(db: B) -> Self {
        Self { db, references: Arc::new(RandomReferences) }
    }

    pub fn with_references(mut self, references: Arc<dyn ReferenceGenerator>) -> Self {
        self.references = references;
        self
    }

    pub async fn create_ticket(
        &self,
        customer_id: i64,
        request: TicketRequest,
    ) -> Result<SupportTicket, TicketApiError> {
        let (subject, message) = match (trimmed(request.subject), trimmed(request.message)) {
            (Some(s), Some(m)) => (s, m),
            _ => return Err(TicketApiError::ValidationError("Subject and message are required".into())),
        };
        if let Some(order_id) = request.order_id {
            if !self.db.order_belongs_to(order_id, customer_id).await? {
                debug!("🎫️ Customer {customer_id} tried to open a ticket for order {order_id}, which is not theirs");
                return Err(TicketApiError::InvalidOrder);
            }
        }
        for attempt in 1..=MAX_REFERENCE_ATTEMPTS {
            let ticket = NewSupportTicket {
                ticket_number: self.references.ticket_number(),
                customer_id,
                order_id: request.order_id,
                subject: subject.clone(),
                message: message.clone(),
            };
            match self.db.insert_ticket(ticket).await {
                Ok(ticket) => {
                    info!("🎫️ Ticket {} opened by customer {customer_id}", ticket.ticket_number);
                    return Ok(ticket);
                },
                Err(TicketApiError::TicketNumberCollision(n)) => {
                    warn!("🎫️ Ticket number {n} is already taken (attempt {attempt}). Generating another one.");
                },
                Err(e) => return Err(e),
            }
        }
        Err(TicketApiError::DatabaseError(format!(
            "Could not generate a unique ticket number after {MAX_REFERENCE_ATTEMPTS} attempts"
        )))
    }

    /// Newest first.
    pub async fn customer_tickets(&self, customer_id: i64) -> Result<Vec<SupportTicket>, TicketApiError> {
        self.db.fetch_tickets_for_customer(customer_id).await
    }

    pub async fn customer_ticket(&self, customer_id: i64, ticket_id: i64) -> Result<TicketDetail, TicketApiError> {
        let ticket = self
            .db
            .fetch_ticket(ticket_id)
            .await?
            .filter(|t| t.customer_id == customer_id)
            .ok_or(TicketApiError::NotFound(ticket_id))?;
        let responses = self.db.fetch_ticket_responses(ticket_id).await?;
        Ok(TicketDetail { ticket, responses })
    }

    /// Every open ticket with its responses so far.
    pub async fn open_tickets(&self) -> Result<Vec<TicketDetail>, TicketApiError> {
        let tickets = self.db.fetch_tickets_by_status(TicketStatus::Open).await?;
        let mut result = Vec::with_capacity(tickets.len());
        for ticket in tickets {
            let responses = self.db.fetch_ticket_responses(ticket.id).await?;
            result.push(TicketDetail { ticket, responses });
        }
        Ok(result)
    }

    pub async fn respond(
        &self,
        ticket_id: i64,
        responder_id: i64,
        message: Option<&str>,
        resolve: bool,
    ) -> Result<TicketResponse, TicketApiError> {
        let message = trimmed(message.map(String::from))
            .ok_or_else(|| TicketApiError::ValidationError("Message is required".into()))?;
        let response = self.db.insert_ticket_response(ticket_id, responder_id, &message, resolve).await?;
        if resolve {
            info!("🎫️ Ticket #{ticket_id} resolved by user {responder_id}");
        }
        Ok(response)
    }
}

fn trimmed(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
