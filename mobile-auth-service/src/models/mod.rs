//! Durable record types for the mobile auth service.

mod allowlist;
mod audit;
mod credential;
mod user;
mod verification;

pub use allowlist::AllowlistEntry;
pub use audit::{AuditAction, AuditEvent};
pub use credential::{Credential, CredentialDetail, DeliveryChannel};
pub use user::{RegistrationMethod, UserProfile};
pub use verification::{VerificationCode, CODE_MAX, CODE_MIN};
