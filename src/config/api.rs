use std::env;

pub const DEFAULT_API_BASE_URL: &str = "https://reqres.in/api";

/// Where the users API lives and how to reach it
#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub base_url: String,
    /// Sent as `x-api-key` on every request when set
    pub api_key: Option<String>,
}

impl ApiConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            api_key: None,
        }
    }

    pub fn from_env() -> Self {
        let base_url = env::var("API_BASE_URL")
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_key = env::var("API_KEY").ok().filter(|value| !value.is_empty());

        Self { base_url, api_key }
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE_URL)
    }
}
