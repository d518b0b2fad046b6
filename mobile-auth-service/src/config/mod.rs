use serde::Deserialize;
use service_core::config as core_config;
use service_core::error::AppError;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    #[serde(flatten)]
    pub common: core_config::Config,
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub mongodb: MongoConfig,
    pub smtp: SmtpConfig,
    pub sms: SmsConfig,
    pub secrets: SecretsConfig,
    pub security: SecurityConfig,
    pub auth: AuthPolicyConfig,
    pub embed: EmbedConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            other => Err(format!("Unknown environment: {}", other)),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoConfig {
    pub uri: String,
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub from_email: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmsConfig {
    pub api_url: String,
    pub api_key: String,
    pub from_number: String,
}

/// Names under which the two signing secrets are fetched from the secret
/// source.
#[derive(Debug, Clone, Deserialize)]
pub struct SecretsConfig {
    pub session_secret_name: String,
    pub embed_secret_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// Pre-shared key for platform-signed requests (phone endpoints and the
    /// SMS handoff). Also the HMAC key for the email signature proof.
    pub mobile_api_key: String,
    /// Emails in this domain are approved without an allow-list lookup.
    pub trusted_domain: String,
    /// Base for the deep link placed in magic-link messages.
    pub link_base_url: String,
}

/// Lifecycle policy constants. The refresh threshold is policy, not a
/// security boundary.
#[derive(Debug, Clone, Deserialize)]
pub struct AuthPolicyConfig {
    pub magic_link_ttl_seconds: i64,
    pub otp_ttl_seconds: i64,
    pub session_ttl_days: i64,
    pub refresh_threshold_days: i64,
    pub embed_ttl_seconds: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct EmbedConfig {
    pub base_url: String,
    pub issuer: String,
    pub audience: String,
    pub version: String,
    pub account_type: String,
    pub default_teams: Vec<String>,
    /// Marker inserted into the email local part for the embed identity.
    pub tag: String,
}

impl AuthConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let common_config = core_config::Config::load()?;

        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = AuthConfig {
            common: common_config,
            environment,
            service_name: get_env("SERVICE_NAME", Some("mobile-auth-service"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            mongodb: MongoConfig {
                uri: get_env("MONGODB_URI", None, is_prod)?,
                database: get_env("MONGODB_DATABASE", Some("mobile_auth"), is_prod)?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", None, is_prod)?,
                port: get_env_parsed("SMTP_PORT", Some("587"), is_prod)?,
                user: get_env("SMTP_USER", None, is_prod)?,
                password: get_env("SMTP_PASSWORD", None, is_prod)?,
                from_email: get_env("SMTP_FROM_EMAIL", None, is_prod)?,
            },
            sms: SmsConfig {
                api_url: get_env("SMS_API_URL", None, is_prod)?,
                api_key: get_env("SMS_API_KEY", None, is_prod)?,
                from_number: get_env("SMS_FROM_NUMBER", None, is_prod)?,
            },
            secrets: SecretsConfig {
                session_secret_name: get_env(
                    "SESSION_SECRET_NAME",
                    Some("MOBILE_SESSION_SECRET"),
                    is_prod,
                )?,
                embed_secret_name: get_env(
                    "EMBED_SECRET_NAME",
                    Some("MOBILE_EMBED_SECRET"),
                    is_prod,
                )?,
            },
            security: SecurityConfig {
                mobile_api_key: get_env("MOBILE_API_KEY", None, is_prod)?,
                trusted_domain: get_env(
                    "TRUSTED_DOMAIN",
                    Some("sigmacomputing.com"),
                    is_prod,
                )?,
                link_base_url: get_env("LINK_BASE_URL", None, is_prod)?,
            },
            auth: AuthPolicyConfig {
                magic_link_ttl_seconds: get_env_parsed(
                    "MAGIC_LINK_TTL_SECONDS",
                    Some("900"),
                    is_prod,
                )?,
                otp_ttl_seconds: get_env_parsed("OTP_TTL_SECONDS", Some("300"), is_prod)?,
                session_ttl_days: get_env_parsed("SESSION_TTL_DAYS", Some("30"), is_prod)?,
                refresh_threshold_days: get_env_parsed(
                    "REFRESH_THRESHOLD_DAYS",
                    Some("7"),
                    is_prod,
                )?,
                embed_ttl_seconds: get_env_parsed("EMBED_TTL_SECONDS", Some("3600"), is_prod)?,
            },
            embed: EmbedConfig {
                base_url: get_env("EMBED_BASE_URL", None, is_prod)?,
                issuer: get_env("EMBED_ISSUER", Some("mobile-auth-service"), is_prod)?,
                audience: get_env("EMBED_AUDIENCE", Some("sigmacomputing"), is_prod)?,
                version: get_env("EMBED_VERSION", Some("1.1"), is_prod)?,
                account_type: get_env("EMBED_ACCOUNT_TYPE", Some("viewer"), is_prod)?,
                default_teams: get_env("EMBED_DEFAULT_TEAMS", Some("mobile-embed"), is_prod)?
                    .split(',')
                    .map(|s| s.trim().to_string())
                    .filter(|s| !s.is_empty())
                    .collect(),
                tag: get_env("EMBED_TAG", Some("embed"), is_prod)?,
            },
        };

        Ok(config)
    }
}

/// Read an environment variable. In prod, missing values with no default are
/// a startup failure; in dev the default is applied.
fn get_env(name: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(name) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => match default {
            Some(value) => {
                if is_prod {
                    tracing::warn!(var = %name, "Using default for prod configuration value");
                }
                Ok(value.to_string())
            }
            None => Err(AppError::ConfigError(anyhow::anyhow!(
                "Missing required environment variable: {}",
                name
            ))),
        },
    }
}

fn get_env_parsed<T>(name: &str, default: Option<&str>, is_prod: bool) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw = get_env(name, default, is_prod)?;
    raw.parse().map_err(|e| {
        AppError::ConfigError(anyhow::anyhow!("Invalid value for {}: {}", name, e))
    })
}
