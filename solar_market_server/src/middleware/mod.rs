mod acl;
mod callback_guard;
mod identity;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use callback_guard::{CallbackGuardFactory, CallbackGuardService};
pub use identity::{IdentityMiddlewareFactory, IdentityMiddlewareService};
