use rand::{distributions::Uniform, Rng};

use crate::db_types::{OrderNumber, TicketNumber};

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Source of customer-facing references for orders and support tickets.
///
/// Uniqueness is enforced by the database; callers must be prepared to ask for another reference when an insert
/// collides.
pub trait ReferenceGenerator: Send + Sync {
    fn order_number(&self) -> OrderNumber;
    fn ticket_number(&self) -> TicketNumber;
}

/// Uniformly random upper-case alphanumeric references.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomReferences;

impl RandomReferences {
    fn random_code(len: usize) -> String {
        let dist = Uniform::from(0..ALPHABET.len());
        rand::thread_rng().sample_iter(dist).take(len).map(|i| ALPHABET[i] as char).collect()
    }
}

impl ReferenceGenerator for RandomReferences {
    fn order_number(&self) -> OrderNumber {
        OrderNumber(format!("{}{}", OrderNumber::PREFIX, Self::random_code(OrderNumber::RANDOM_LEN)))
    }

    fn ticket_number(&self) -> TicketNumber {
        TicketNumber(format!("{}{}", TicketNumber::PREFIX, Self::random_code(TicketNumber::RANDOM_LEN)))
    }
}
