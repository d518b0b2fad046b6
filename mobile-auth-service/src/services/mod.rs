pub mod delivery;
pub mod embed;
pub mod error;
pub mod guard;
pub mod magic_link;
pub mod otp;
mod profile;
pub mod secrets;
pub mod session;
pub mod tokens;

pub use delivery::{
    EmailProvider, MockEmailService, MockSmsService, SmsGateway, SmsProvider, SmtpMailer,
};
pub use embed::{embed_identity, EmbedGrant, EmbedRequest, EmbedService};
pub use error::ServiceError;
pub use guard::{Approval, IdentityGuard, StandingPolicy};
pub use magic_link::{IssuedLink, MagicLinkService, VerifiedLink};
pub use otp::OtpService;
pub use secrets::{EnvSecretSource, SecretCache, SecretSource, StaticSecrets};
pub use session::{IssuedSession, SessionService};
pub use tokens::{EmbedClaims, SessionClaims, TokenService, EMBED_KEY_ID, SESSION_KEY_ID};
