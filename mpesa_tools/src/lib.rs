mod api;
mod callback;
mod config;
mod error;

pub mod data_objects;
pub mod helpers;

pub use api::MpesaApi;
pub use callback::{CallbackMetadata, MetadataItem, PaymentMetadata, StkCallback, StkCallbackBody, StkCallbackEnvelope};
pub use config::{MpesaConfig, MpesaEnvironment};
pub use error::MpesaApiError;
