use std::env;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has an invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct GatewaySettings {
    pub base_url: String,
    pub secret_key: String,
    pub timeout: Duration,
    pub currency: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone)]
pub struct WebhookSettings {
    pub secret: String,
    pub tolerance: Duration,
}

#[derive(Debug, Clone)]
pub struct ReconcileSettings {
    pub interval: Duration,
    pub max_attempts: i32,
    pub stale_claim_after: Duration,
    pub retention: Duration,
}

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub gateway: GatewaySettings,
    pub webhook: WebhookSettings,
    pub reconcile: ReconcileSettings,
    pub notification_url: Option<String>,
}

impl Settings {
    /// Reads settings from the process environment (after `.env` is loaded).
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let vars = Vars(&lookup);

        Ok(Settings {
            database_url: vars.required("DATABASE_URL")?,
            host: vars.or("HOST", "0.0.0.0"),
            port: vars.parsed("PORT", 8080)?,
            gateway: GatewaySettings {
                base_url: vars.or("PAYMENT_GATEWAY_BASE_URL", "https://api.stripe.com"),
                secret_key: vars.required("PAYMENT_GATEWAY_SECRET_KEY")?,
                timeout: Duration::from_millis(vars.parsed("PAYMENT_GATEWAY_TIMEOUT_MS", 10_000)?),
                currency: vars.or("CHECKOUT_CURRENCY", "inr"),
                success_url: vars.required("CHECKOUT_SUCCESS_URL")?,
                cancel_url: vars.required("CHECKOUT_CANCEL_URL")?,
            },
            webhook: WebhookSettings {
                secret: vars.required("PAYMENT_WEBHOOK_SECRET")?,
                tolerance: Duration::from_secs(vars.parsed("PAYMENT_WEBHOOK_TOLERANCE_SECS", 300)?),
            },
            reconcile: ReconcileSettings {
                interval: Duration::from_secs(vars.parsed("RECONCILE_INTERVAL_SECS", 60)?),
                max_attempts: vars.parsed("RECONCILE_MAX_ATTEMPTS", 5)?,
                stale_claim_after: Duration::from_secs(
                    vars.parsed("RECONCILE_STALE_CLAIM_SECS", 300)?,
                ),
                retention: Duration::from_secs(
                    vars.parsed::<u64>("IDEMPOTENCY_RETENTION_DAYS", 30)? * 24 * 60 * 60,
                ),
            },
            notification_url: vars.optional("NOTIFICATION_WEBHOOK_URL"),
        })
    }
}

struct Vars<'a, F>(&'a F);

impl<F> Vars<'_, F>
where
    F: Fn(&str) -> Option<String>,
{
    fn optional(&self, name: &'static str) -> Option<String> {
        (self.0)(name).filter(|v| !v.trim().is_empty())
    }

    fn required(&self, name: &'static str) -> Result<String, ConfigError> {
        self.optional(name).ok_or(ConfigError::Missing(name))
    }

    fn or(&self, name: &'static str, default: &str) -> String {
        self.optional(name).unwrap_or_else(|| default.to_string())
    }

    fn parsed<T: FromStr>(&self, name: &'static str, default: T) -> Result<T, ConfigError> {
        match self.optional(name) {
            None => Ok(default),
            Some(value) => value
                .trim()
                .parse()
                .map_err(|_| ConfigError::Invalid { name, value }),
        }
    }
}
