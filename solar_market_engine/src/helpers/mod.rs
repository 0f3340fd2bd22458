mod references;
mod validation;

pub use references::{RandomReferences, ReferenceGenerator};
pub use validation::{clean_phone_number, is_valid_email, require_text};
