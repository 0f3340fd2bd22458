use actix_web::{
    error::{JsonPayloadError, PathError, QueryPayloadError, ResponseError},
    http::{header::ContentType, StatusCode},
    HttpRequest,
    HttpResponse,
};
use log::{debug, error};
use serde_json::json;
use solar_market_engine::{
    db_types::Order,
    traits::{AccountApiError, CartApiError, CatalogApiError, CheckoutError, TicketApiError},
};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Could not initialize server. {0}")]
    InitializeError(String),
    #[error("An error occurred on the backend of the server. {0}")]
    BackendError(String),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0} not found")]
    NoRecordFound(String),
    #[error("Authentication Error. {0}")]
    AuthenticationError(#[from] AuthError),
    #[error("Insufficient Permissions. {0}")]
    InsufficientPermissions(String),
    #[error("Payment gateway error. {0}")]
    GatewayError(String),
    #[error("Payment initiation failed")]
    PaymentInitiationFailed { order: Box<Order>, details: String },
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("UnspecifiedError. {0}")]
    Unspecified(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match self {
            Self::ValidationError(_) => StatusCode::BAD_REQUEST,
            Self::NoRecordFound(_) => StatusCode::NOT_FOUND,
            Self::AuthenticationError(_) => StatusCode::UNAUTHORIZED,
            Self::InsufficientPermissions(_) => StatusCode::FORBIDDEN,
            Self::GatewayError(_) => StatusCode::BAD_GATEWAY,
            Self::PaymentInitiationFailed { .. } => StatusCode::BAD_GATEWAY,
            Self::InitializeError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::BackendError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::IOError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ConfigurationError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Unspecified(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            Self::PaymentInitiationFailed { order, details } => {
                json!({ "error": self.to_string(), "details": details, "order": order })
            },
            _ => json!({ "error": self.to_string() }),
        };
        HttpResponse::build(self.status_code()).insert_header(ContentType::json()).body(body.to_string())
    }
}

#[derive(Debug, Clone, Error)]
pub enum AuthError {
    #[error("No access token provided.")]
    MissingToken,
    #[error("Access token is invalid. {0}")]
    InvalidToken(String),
    #[error("Access token has expired.")]
    ExpiredToken,
}

impl From<CheckoutError> for ServerError {
    fn from(e: CheckoutError) -> Self {
        match e {
            CheckoutError::ValidationError(_) | CheckoutError::EmptyCart | CheckoutError::InsufficientStock { .. } => {
                Self::ValidationError(e.to_string())
            },
            CheckoutError::NotFound(s) => Self::NoRecordFound(s),
            CheckoutError::GatewayError(e) => Self::GatewayError(e.to_string()),
            CheckoutError::PaymentInitiationFailed { order, source } => {
                Self::PaymentInitiationFailed { order, details: source.to_string() }
            },
            CheckoutError::OrderNumberCollision(_) |
            CheckoutError::PaymentStatusUpdateError(_) |
            CheckoutError::DatabaseError(_) => {
                error!("💻️ Checkout failed on the backend. {e}");
                Self::BackendError(e.to_string())
            },
        }
    }
}

impl From<CartApiError> for ServerError {
    fn from(e: CartApiError) -> Self {
        match e {
            CartApiError::ValidationError(s) => Self::ValidationError(s),
            CartApiError::InsufficientStock { .. } | CartApiError::CartFull(_) => Self::ValidationError(e.to_string()),
            CartApiError::ProductUnavailable(id) => Self::NoRecordFound(format!("Product {id}")),
            CartApiError::ItemNotFound(id) => Self::NoRecordFound(format!("Cart item {id}")),
            CartApiError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<CatalogApiError> for ServerError {
    fn from(e: CatalogApiError) -> Self {
        match e {
            CatalogApiError::ValidationError(s) => Self::ValidationError(s),
            CatalogApiError::NotFound(s) => Self::NoRecordFound(s),
            CatalogApiError::ProfileNotApproved => Self::InsufficientPermissions(e.to_string()),
            CatalogApiError::ProfileAlreadyExists => Self::ValidationError(e.to_string()),
            CatalogApiError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<AccountApiError> for ServerError {
    fn from(e: AccountApiError) -> Self {
        match e {
            AccountApiError::ValidationError(s) => Self::ValidationError(s),
            AccountApiError::NotFound(s) => Self::NoRecordFound(s),
            AccountApiError::UserAlreadyExists(_) | AccountApiError::CannotDeactivateAdmin => {
                Self::ValidationError(e.to_string())
            },
            AccountApiError::DatabaseError(s) => Self::BackendError(s),
        }
    }
}

impl From<TicketApiError> for ServerError {
    fn from(e: TicketApiError) -> Self {
        match e {
            TicketApiError::ValidationError(s) => Self::ValidationError(s),
            TicketApiError::NotFound(id) => Self::NoRecordFound(format!("Ticket {id}")),
            TicketApiError::InvalidOrder => Self::ValidationError(e.to_string()),
            TicketApiError::TicketNumberCollision(_) | TicketApiError::DatabaseError(_) => {
                Self::BackendError(e.to_string())
            },
        }
    }
}

//------------------------------------------  Extractor error handlers  -----------------------------------------------
// Malformed bodies, query strings and paths are the caller's problem and get the same JSON error shape as everything
// else.

pub fn json_error_handler(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting request body. {err}");
    ServerError::ValidationError(format!("Invalid request body. {err}")).into()
}

pub fn query_error_handler(err: QueryPayloadError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting query string. {err}");
    ServerError::ValidationError(format!("Invalid query parameters. {err}")).into()
}

pub fn path_error_handler(err: PathError, _req: &HttpRequest) -> actix_web::Error {
    debug!("💻️ Rejecting request path. {err}");
    ServerError::ValidationError(format!("Invalid request path. {err}")).into()
}
