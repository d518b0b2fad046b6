pub mod auth;
pub mod embed;
pub mod phone;
