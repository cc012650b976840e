//! Message delivery channels.
//!
//! [`DeliveryChannel`] is the seam between the dispatcher and the
//! outside world. [`TelegramDelivery`] posts to the Telegram Bot API
//! with exponential-backoff retry (1 s, 2 s, 4 s); [`MockDelivery`]
//! records messages in memory for tests.

use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use fiberdesk_core::types::TelegramId;
use serde::Serialize;

/// Retry delays in seconds (exponential backoff: 1s, 2s, 4s).
const RETRY_DELAYS_SECS: [u64; 3] = [1, 2, 4];

/// HTTP request timeout for a single delivery attempt.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Telegram Bot API base URL.
const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// One inline keyboard button. Rendered one per row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InlineButton {
    pub text: String,
    pub callback_data: String,
}

impl InlineButton {
    pub fn new(text: impl Into<String>, callback_data: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            callback_data: callback_data.into(),
        }
    }
}

/// Error type for delivery failures.
#[derive(Debug, thiserror::Error)]
pub enum DeliveryError {
    /// The underlying HTTP request failed (network, DNS, timeout, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The Bot API returned a non-2xx status code.
    #[error("Telegram API returned HTTP {0}")]
    HttpStatus(u16),

    /// The recipient cannot be reached (test double rejection).
    #[error("Recipient {0} unreachable")]
    Unreachable(TelegramId),
}

/// A channel able to deliver a text message with an optional inline
/// keyboard to a Telegram chat.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn send(
        &self,
        chat_id: TelegramId,
        text: &str,
        keyboard: &[InlineButton],
    ) -> Result<(), DeliveryError>;
}

// ---------------------------------------------------------------------------
// TelegramDelivery
// ---------------------------------------------------------------------------

/// Delivers messages through the Telegram Bot API `sendMessage` method.
pub struct TelegramDelivery {
    client: reqwest::Client,
    api_base: String,
    token: String,
}

impl TelegramDelivery {
    /// Create a delivery channel with a pre-configured HTTP client.
    pub fn new(token: impl Into<String>) -> Self {
        Self::with_api_base(token, TELEGRAM_API_BASE)
    }

    /// Create a channel against a non-default API base (local test
    /// servers).
    pub fn with_api_base(token: impl Into<String>, api_base: impl Into<String>) -> Self {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to build reqwest HTTP client");
        Self {
            client,
            api_base: api_base.into(),
            token: token.into(),
        }
    }

    /// Execute a single `sendMessage` call and check the response status.
    async fn try_send(&self, payload: &serde_json::Value) -> Result<(), DeliveryError> {
        let url = format!("{}/bot{}/sendMessage", self.api_base, self.token);
        let response = self.client.post(&url).json(payload).send().await?;
        if !response.status().is_success() {
            return Err(DeliveryError::HttpStatus(response.status().as_u16()));
        }
        Ok(())
    }

    fn build_payload(
        chat_id: TelegramId,
        text: &str,
        keyboard: &[InlineButton],
    ) -> serde_json::Value {
        let mut payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
        });
        if !keyboard.is_empty() {
            let rows: Vec<Vec<&InlineButton>> = keyboard.iter().map(|b| vec![b]).collect();
            payload["reply_markup"] = serde_json::json!({ "inline_keyboard": rows });
        }
        payload
    }
}

#[async_trait]
impl DeliveryChannel for TelegramDelivery {
    /// Deliver with retry: up to 3 backoff retries before the final
    /// attempt. Returns `Ok(())` on the first successful attempt.
    async fn send(
        &self,
        chat_id: TelegramId,
        text: &str,
        keyboard: &[InlineButton],
    ) -> Result<(), DeliveryError> {
        let payload = Self::build_payload(chat_id, text, keyboard);

        let mut last_err: Option<DeliveryError> = None;

        for (attempt, delay_secs) in RETRY_DELAYS_SECS.iter().enumerate() {
            match self.try_send(&payload).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    tracing::warn!(
                        attempt = attempt + 1,
                        chat_id,
                        error = %e,
                        "Telegram delivery attempt failed, retrying"
                    );
                    last_err = Some(e);
                    tokio::time::sleep(Duration::from_secs(*delay_secs)).await;
                }
            }
        }

        // Final attempt after the last backoff.
        match self.try_send(&payload).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(chat_id, error = %e, "Telegram delivery failed after all retries");
                Err(last_err.unwrap_or(e))
            }
        }
    }
}

// ---------------------------------------------------------------------------
// MockDelivery
// ---------------------------------------------------------------------------

/// A message captured by [`MockDelivery`].
#[derive(Debug, Clone)]
pub struct SentMessage {
    pub chat_id: TelegramId,
    pub text: String,
    pub keyboard: Vec<InlineButton>,
}

/// In-memory delivery channel for tests: records every message and can
/// be told to fail for specific chat ids.
#[derive(Default)]
pub struct MockDelivery {
    sent: Mutex<Vec<SentMessage>>,
    failing: Mutex<Vec<TelegramId>>,
}

impl MockDelivery {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every send to `chat_id` fail with `Unreachable`.
    pub fn fail_for(&self, chat_id: TelegramId) {
        self.failing.lock().unwrap().push(chat_id);
    }

    /// All messages sent so far, in order.
    pub fn sent(&self) -> Vec<SentMessage> {
        self.sent.lock().unwrap().clone()
    }

    /// Messages sent to one chat.
    pub fn sent_to(&self, chat_id: TelegramId) -> Vec<SentMessage> {
        self.sent()
            .into_iter()
            .filter(|m| m.chat_id == chat_id)
            .collect()
    }
}

#[async_trait]
impl DeliveryChannel for MockDelivery {
    async fn send(
        &self,
        chat_id: TelegramId,
        text: &str,
        keyboard: &[InlineButton],
    ) -> Result<(), DeliveryError> {
        if self.failing.lock().unwrap().contains(&chat_id) {
            return Err(DeliveryError::Unreachable(chat_id));
        }
        self.sent.lock().unwrap().push(SentMessage {
            chat_id,
            text: text.to_string(),
            keyboard: keyboard.to_vec(),
        });
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
