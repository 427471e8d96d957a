//! WebDriver connection settings.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// How to reach the WebDriver endpoint and what kind of browser to ask for.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WebDriverConfig {
    /// Endpoint base URL, e.g. `http://localhost:4444`
    pub url: String,

    /// Run the browser without a window
    pub headless: bool,

    /// Window size in CSS pixels
    pub window: (u32, u32),

    /// Budget for opening the session
    #[serde(with = "millis")]
    pub connect_timeout: Duration,

    /// Default budget for a non-forced click to become actionable
    #[serde(with = "millis")]
    pub action_timeout: Duration,

    /// Budget for load-state waits
    #[serde(with = "millis")]
    pub load_timeout: Duration,

    /// Class the site uses to mark a pressed option button
    pub selected_class: String,
}

impl Default for WebDriverConfig {
    fn default() -> Self {
        Self {
            url: "http://localhost:4444".to_string(),
            headless: true,
            window: (1280, 900),
            connect_timeout: Duration::from_secs(60),
            action_timeout: Duration::from_secs(30),
            load_timeout: Duration::from_secs(30),
            selected_class: "primary".to_string(),
        }
    }
}

impl WebDriverConfig {
    /// Capabilities payload for `POST /session`.
    pub(crate) fn capabilities(&self) -> serde_json::Value {
        let mut args = vec![
            format!("--window-size={},{}", self.window.0, self.window.1),
            "--disable-dev-shm-usage".to_string(),
            "--no-first-run".to_string(),
        ];
        if self.headless {
            args.push("--headless=new".to_string());
        }

        serde_json::json!({
            "capabilities": {
                "alwaysMatch": {
                    "browserName": "chrome",
                    "pageLoadStrategy": "normal",
                    "goog:chromeOptions": { "args": args },
                }
            }
        })
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        Ok(Duration::from_millis(u64::deserialize(deserializer)?))
    }
}
