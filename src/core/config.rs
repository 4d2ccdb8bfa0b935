use std::env;
use std::time::Duration;

const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 60;
const DEFAULT_SESSION_IDLE_SECS: u64 = 60 * 60;

fn positive_secs(value: Option<String>, default: u64) -> u64 {
    value
        .and_then(|v| v.trim().parse::<u64>().ok())
        .filter(|secs| *secs > 0)
        .unwrap_or(default)
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub openai_model: String,
    pub openai_api_hostname: String,
    pub openai_api_key: String,
    pub request_timeout_secs: u64,
    // Sessions untouched for this long are dropped
    pub session_idle_secs: u64,
    pub web_ui_path: String,
}

impl AppConfig {
    /// Build the config from any key/value lookup. `Default` uses the
    /// process environment.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let openai_api_hostname = lookup("SNAPCOOK_LLM_HOST")
            .unwrap_or_else(|| "https://api.openai.com".to_string());
        let openai_api_key =
            lookup("OPENAI_API_KEY").unwrap_or_else(|| "thiswontworkforopenai".to_string());
        let openai_model = lookup("SNAPCOOK_LLM_MODEL").unwrap_or_else(|| "gpt-4o".to_string());
        let request_timeout_secs = positive_secs(
            lookup("SNAPCOOK_REQUEST_TIMEOUT_SECS"),
            DEFAULT_REQUEST_TIMEOUT_SECS,
        );
        let session_idle_secs = positive_secs(
            lookup("SNAPCOOK_SESSION_IDLE_SECS"),
            DEFAULT_SESSION_IDLE_SECS,
        );
        let web_ui_path = lookup("SNAPCOOK_WEB_UI_PATH").unwrap_or_else(|| "./web-ui".to_string());

        Self {
            openai_model,
            openai_api_hostname,
            openai_api_key,
            request_timeout_secs,
            session_idle_secs,
            web_ui_path,
        }
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn session_idle(&self) -> Duration {
        Duration::from_secs(self.session_idle_secs)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }
}
