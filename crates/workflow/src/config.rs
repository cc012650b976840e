//! Runtime configuration for the workflow crate.
//!
//! Loaded from environment variables; the hosting bot binary is
//! expected to call `dotenvy::dotenv()` before [`WorkflowConfig::from_env`].

use crate::delivery::TelegramDelivery;

/// Defaults for the retention windows, in days.
const DEFAULT_NOTIFICATION_RETENTION_DAYS: i32 = 30;
const DEFAULT_ACCESS_LOG_RETENTION_DAYS: i32 = 90;

/// Configuration for delivery and retention.
#[derive(Debug, Clone)]
pub struct WorkflowConfig {
    /// Telegram Bot API token.
    pub bot_token: String,
    /// Override of the Bot API base URL (local test servers).
    pub api_base: Option<String>,
    /// How long handled notifications are kept before cleanup.
    pub notification_retention_days: i32,
    /// How long access-control audit rows are kept before cleanup.
    pub access_log_retention_days: i32,
}

impl WorkflowConfig {
    /// Load configuration from environment variables.
    ///
    /// Returns `None` if `TELEGRAM_BOT_TOKEN` is not set, signalling
    /// that delivery is not configured.
    ///
    /// | Variable                          | Required | Default |
    /// |-----------------------------------|----------|---------|
    /// | `TELEGRAM_BOT_TOKEN`              | yes      | —       |
    /// | `TELEGRAM_API_BASE`               | no       | —       |
    /// | `NOTIFICATION_RETENTION_DAYS`     | no       | `30`    |
    /// | `ACCESS_LOG_RETENTION_DAYS`       | no       | `90`    |
    pub fn from_env() -> Option<Self> {
        let bot_token = std::env::var("TELEGRAM_BOT_TOKEN").ok()?;
        Some(Self {
            bot_token,
            api_base: std::env::var("TELEGRAM_API_BASE").ok(),
            notification_retention_days: std::env::var("NOTIFICATION_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_NOTIFICATION_RETENTION_DAYS),
            access_log_retention_days: std::env::var("ACCESS_LOG_RETENTION_DAYS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_ACCESS_LOG_RETENTION_DAYS),
        })
    }

    /// Build the production delivery channel from this configuration.
    pub fn delivery_channel(&self) -> TelegramDelivery {
        match &self.api_base {
            Some(base) => TelegramDelivery::with_api_base(&self.bot_token, base),
            None => TelegramDelivery::new(&self.bot_token),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
