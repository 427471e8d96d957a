//! WebDriver wire protocol plumbing.

use courtres_driver::{DriverError, Result};
use reqwest::{Client, Method};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

/// Key under which W3C element references are returned.
pub(crate) const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Sends commands to one WebDriver endpoint.
#[derive(Debug, Clone)]
pub(crate) struct Wire {
    client: Client,
    base: String,
}

impl Wire {
    pub(crate) fn new(base: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DriverError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
        })
    }

    /// Same connection, commands rooted at `path`.
    pub(crate) fn scoped(&self, path: &str) -> Self {
        Self {
            client: self.client.clone(),
            base: format!("{}/{}", self.base, path.trim_start_matches('/')),
        }
    }

    pub(crate) async fn get(&self, path: &str) -> Result<Value> {
        self.send(Method::GET, path, None).await
    }

    pub(crate) async fn post(&self, path: &str, body: Value) -> Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<Value> {
        self.send(Method::DELETE, path, None).await
    }

    async fn send(&self, method: Method, path: &str, body: Option<Value>) -> Result<Value> {
        let url = if path.is_empty() {
            self.base.clone()
        } else {
            format!("{}/{}", self.base, path)
        };
        debug!(%method, %url, "webdriver command");

        let mut request = self.client.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| DriverError::Transport(e.to_string()))?;
        let status = response.status();
        let payload: Value = response
            .json()
            .await
            .map_err(|e| DriverError::Protocol(format!("unreadable response ({status}): {e}")))?;

        let value = payload.get("value").cloned().unwrap_or(Value::Null);
        if status.is_success() {
            Ok(value)
        } else {
            Err(error_from(&value))
        }
    }
}

/// Map a W3C error object onto [`DriverError`].
pub(crate) fn error_from(value: &Value) -> DriverError {
    let code = value.get("error").and_then(Value::as_str).unwrap_or("unknown error");
    let message = value
        .get("message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match code {
        "no such element" | "stale element reference" | "no such frame" => {
            DriverError::NotFound(message)
        }
        "element click intercepted" | "element not interactable" | "invalid element state" => {
            DriverError::NotInteractable {
                locator: String::new(),
                reason: message,
            }
        }
        "timeout" | "script timeout" => DriverError::Timeout {
            what: message,
            timeout: Duration::ZERO,
        },
        "invalid session id" => DriverError::SessionClosed,
        _ => DriverError::Protocol(format!("{code}: {message}")),
    }
}

/// Element reference from a find result.
pub(crate) fn element_ref(value: &Value) -> Option<String> {
    value.get(ELEMENT_KEY).and_then(Value::as_str).map(str::to_string)
}

/// JSON argument form of an element reference.
pub(crate) fn element_arg(reference: &str) -> Value {
    serde_json::json!({ ELEMENT_KEY: reference })
}
