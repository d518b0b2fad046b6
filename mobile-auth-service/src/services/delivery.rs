//! Outbound delivery collaborators: magic-link email and SMS.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use lettre::{
    message::header::ContentType, transport::smtp::authentication::Credentials, Message,
    SmtpTransport, Transport,
};
use serde::Serialize;

use crate::config::{SmsConfig, SmtpConfig};
use crate::services::ServiceError;

#[async_trait]
pub trait EmailProvider: Send + Sync {
    async fn send_magic_link(&self, to_email: &str, link: &str) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait SmsProvider: Send + Sync {
    async fn send_magic_link(&self, to_phone: &str, link: &str) -> Result<(), ServiceError>;

    async fn send_verification_code(&self, to_phone: &str, code: &str)
        -> Result<(), ServiceError>;
}

// ============================================================================
// SMTP email
// ============================================================================

#[derive(Clone)]
pub struct SmtpMailer {
    mailer: SmtpTransport,
    from_email: String,
}

impl SmtpMailer {
    pub fn new(config: &SmtpConfig) -> Result<Self, ServiceError> {
        let creds = Credentials::new(config.user.clone(), config.password.clone());

        let mailer = SmtpTransport::relay(&config.host)
            .map_err(|e| ServiceError::Internal(anyhow::anyhow!(e.to_string())))?
            .credentials(creds)
            .port(config.port)
            .timeout(Some(Duration::from_secs(10)))
            .build();

        tracing::info!(host = %config.host, "Email delivery initialized");

        Ok(Self {
            mailer,
            from_email: config.from_email.clone(),
        })
    }
}

#[async_trait]
impl EmailProvider for SmtpMailer {
    async fn send_magic_link(&self, to_email: &str, link: &str) -> Result<(), ServiceError> {
        let plain = format!("Tap the link to sign in: {}\n\nIt expires in 15 minutes.", link);
        let html = format!(
            "<p>Tap the link to sign in:</p><p><a href=\"{link}\">Sign in</a></p>\
             <p>It expires in 15 minutes.</p>"
        );

        let email = Message::builder()
            .from(
                self.from_email
                    .parse()
                    .map_err(|e: lettre::address::AddressError| {
                        ServiceError::Internal(e.into())
                    })?,
            )
            .to(to_email
                .parse()
                .map_err(|e: lettre::address::AddressError| ServiceError::Internal(e.into()))?)
            .subject("Your sign-in link")
            .multipart(
                lettre::message::MultiPart::alternative()
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_PLAIN)
                            .body(plain),
                    )
                    .singlepart(
                        lettre::message::SinglePart::builder()
                            .header(ContentType::TEXT_HTML)
                            .body(html),
                    ),
            )
            .map_err(|e| ServiceError::Internal(e.into()))?;

        // Send in the blocking pool; SmtpTransport is synchronous.
        let mailer = self.mailer.clone();
        let result = tokio::task::spawn_blocking(move || mailer.send(&email))
            .await
            .map_err(|e| ServiceError::Internal(e.into()))?;

        match result {
            Ok(_) => {
                tracing::info!(to = %to_email, "Magic link email sent");
                Ok(())
            }
            Err(e) => {
                tracing::error!(to = %to_email, error = %e, "Failed to send magic link email");
                Err(ServiceError::Delivery(e.to_string()))
            }
        }
    }
}

// ============================================================================
// SMS gateway
// ============================================================================

/// JSON client for the SMS gateway's message endpoint.
#[derive(Clone)]
pub struct SmsGateway {
    http: reqwest::Client,
    api_url: String,
    api_key: String,
    from_number: String,
}

#[derive(Serialize)]
struct OutboundSms<'a> {
    from: &'a str,
    to: &'a str,
    text: String,
}

impl SmsGateway {
    pub fn new(config: &SmsConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            api_url: config.api_url.clone(),
            api_key: config.api_key.clone(),
            from_number: config.from_number.clone(),
        }
    }

    async fn send(&self, to_phone: &str, text: String) -> Result<(), ServiceError> {
        let body = OutboundSms {
            from: &self.from_number,
            to: to_phone,
            text,
        };

        let response = self
            .http
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| ServiceError::Delivery(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            tracing::error!(to = %to_phone, status = %status, "SMS gateway rejected message");
            return Err(ServiceError::Delivery(format!(
                "SMS gateway returned {}",
                status
            )));
        }

        tracing::info!(to = %to_phone, "SMS sent");
        Ok(())
    }
}

#[async_trait]
impl SmsProvider for SmsGateway {
    async fn send_magic_link(&self, to_phone: &str, link: &str) -> Result<(), ServiceError> {
        self.send(to_phone, format!("Tap to sign in: {}", link)).await
    }

    async fn send_verification_code(
        &self,
        to_phone: &str,
        code: &str,
    ) -> Result<(), ServiceError> {
        // The code itself is never logged.
        self.send(to_phone, format!("Your verification code is {}", code))
            .await
    }
}

// ============================================================================
// Mocks for tests
// ============================================================================

#[derive(Default)]
pub struct MockEmailService {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<bool>,
}

impl MockEmailService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }
}

#[async_trait]
impl EmailProvider for MockEmailService {
    async fn send_magic_link(&self, to_email: &str, link: &str) -> Result<(), ServiceError> {
        if *self.failing.lock().unwrap() {
            return Err(ServiceError::Delivery("injected email failure".to_string()));
        }
        self.sent
            .lock()
            .unwrap()
            .push((to_email.to_string(), link.to_string()));
        Ok(())
    }
}

#[derive(Default)]
pub struct MockSmsService {
    sent: Mutex<Vec<(String, String)>>,
    failing: Mutex<bool>,
}

impl MockSmsService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn set_failing(&self, failing: bool) {
        *self.failing.lock().unwrap() = failing;
    }

    async fn record(&self, to_phone: &str, text: String) -> Result<(), ServiceError> {
        if *self.failing.lock().unwrap() {
            return Err(ServiceError::Delivery("injected sms failure".to_string()));
        }
        self.sent.lock().unwrap().push((to_phone.to_string(), text));
        Ok(())
    }
}

#[async_trait]
impl SmsProvider for MockSmsService {
    async fn send_magic_link(&self, to_phone: &str, link: &str) -> Result<(), ServiceError> {
        self.record(to_phone, link.to_string()).await
    }

    async fn send_verification_code(
        &self,
        to_phone: &str,
        code: &str,
    ) -> Result<(), ServiceError> {
        self.record(to_phone, code.to_string()).await
    }
}
