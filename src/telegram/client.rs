// Outbound Bot API client. Every call has a bounded timeout and one
// retry on transient failure; persistent failure surfaces as an error
// the caller logs and swallows, so the user simply gets no response.

use std::time::Duration;

use serde::Deserialize;
use serde_json::{json, Value};
use thiserror::Error;
use tracing::warn;

use crate::metrics;

/// Per-request timeout for outbound calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("transport error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("telegram api error: {0}")]
    Telegram(String),
}

#[derive(Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Thin typed wrapper over the Bot API methods this bot needs.
#[derive(Debug, Clone)]
pub struct BotApi {
    http: reqwest::Client,
    base: String,
}

impl BotApi {
    pub fn new(token: &str) -> BotApi {
        BotApi::with_base(&format!("https://api.telegram.org/bot{token}"))
    }

    /// Point the client at a different API base. Used by tests.
    pub fn with_base(base: &str) -> BotApi {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("failed to build http client");
        BotApi {
            http,
            base: base.trim_end_matches('/').to_string(),
        }
    }

    pub async fn send_message(
        &self,
        chat_id: i64,
        text: &str,
        reply_markup: Option<Value>,
    ) -> Result<(), ApiError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = reply_markup {
            payload["reply_markup"] = markup;
        }
        self.call("sendMessage", &payload).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        reply_markup: Option<Value>,
    ) -> Result<(), ApiError> {
        let mut payload = json!({
            "chat_id": chat_id,
            "message_id": message_id,
            "text": text,
            "parse_mode": "HTML",
        });
        if let Some(markup) = reply_markup {
            payload["reply_markup"] = markup;
        }
        self.call("editMessageText", &payload).await
    }

    pub async fn answer_callback_query(
        &self,
        callback_query_id: &str,
        text: Option<&str>,
    ) -> Result<(), ApiError> {
        let mut payload = json!({ "callback_query_id": callback_query_id });
        if let Some(text) = text {
            payload["text"] = Value::from(text);
        }
        self.call("answerCallbackQuery", &payload).await
    }

    /// POST one method call, retrying once on a transient failure.
    async fn call(&self, method: &str, payload: &Value) -> Result<(), ApiError> {
        match self.call_once(method, payload).await {
            Err(ApiError::Http(e)) if is_transient(&e) => {
                metrics::TRANSPORT_RETRIES_TOTAL.inc();
                warn!(method, error = %e, "transient transport failure, retrying once");
                self.call_once(method, payload).await
            }
            other => other,
        }
        .inspect_err(|_| metrics::TRANSPORT_FAILURES_TOTAL.inc())
    }

    async fn call_once(&self, method: &str, payload: &Value) -> Result<(), ApiError> {
        let response = self
            .http
            .post(format!("{}/{}", self.base, method))
            .json(payload)
            .send()
            .await?;
        let body: ApiResponse = response.json().await?;
        if body.ok {
            Ok(())
        } else {
            Err(ApiError::Telegram(
                body.description.unwrap_or_else(|| "unknown error".into()),
            ))
        }
    }
}

fn is_transient(error: &reqwest::Error) -> bool {
    error.is_timeout() || error.is_connect()
}
