//! HTTP client for the hosted users API
//!
//! This module wraps the four calls the front-end needs (login, list users by
//! page, update user, delete user) behind the [`UsersApi`] trait, so the users
//! service and the HTTP handlers can be driven by a mock in tests.
//!
//! The client is deliberately lenient about HTTP status codes: login, list and
//! update bodies are decoded and returned no matter what status the server sent.
//! Only transport failures and undecodable bodies are reported as errors.
//! Delete is the exception and reports the 2xx flag instead of a body.
//!
//! # Example
//!
//! ```rust,no_run
//! use userdesk::config::api::ApiConfig;
//! use userdesk::services::{ReqresClient, UsersApi};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = ReqresClient::new(&ApiConfig::from_env())?;
//!
//! let page = client.list_users(1).await?;
//! for user in page.data {
//!     println!("{} <{}>", user.full_name(), user.email);
//! }
//! # Ok(())
//! # }
//! ```

use crate::config::api::ApiConfig;
use crate::models::{LoginCredentials, LoginResponse, UserUpdate, UsersPage};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

/// Errors that can occur while talking to the users API
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),

    #[error("Invalid API key header value")]
    InvalidApiKey,

    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    #[error("Response body could not be decoded: {0}")]
    Decode(#[from] serde_json::Error),
}

/// The operations the front-end performs against the users API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait UsersApi: Send + Sync {
    /// Posts the credentials and returns the response body verbatim.
    /// Callers must check `error` and the presence of `token`.
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError>;

    /// Fetches one page of users
    async fn list_users(&self, page: u32) -> Result<UsersPage, ApiError>;

    /// Sends the changed fields and returns whatever the server echoed back
    async fn update_user(
        &self,
        id: i64,
        update: &UserUpdate,
    ) -> Result<serde_json::Value, ApiError>;

    /// Deletes a user and returns whether the server answered with a 2xx status
    async fn delete_user(&self, id: i64) -> Result<bool, ApiError>;
}

/// [`UsersApi`] implementation over reqwest, for reqres-compatible servers
///
/// # Thread Safety
///
/// ReqresClient is cheap to clone and safe to share across threads; the
/// underlying reqwest::Client pools connections internally.
#[derive(Clone, Debug)]
pub struct ReqresClient {
    client: reqwest::Client,
    base_url: String,
}

impl ReqresClient {
    /// Builds a client for the configured base URL.
    ///
    /// No request timeout is set and requests are never retried.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        reqwest::Url::parse(&config.base_url)
            .map_err(|e| ApiError::InvalidBaseUrl(format!("{}: {}", config.base_url, e)))?;

        let mut default_headers = HeaderMap::new();
        if let Some(api_key) = &config.api_key {
            let value = HeaderValue::from_str(api_key).map_err(|_| ApiError::InvalidApiKey)?;
            default_headers.insert("x-api-key", value);
        }

        let client = reqwest::Client::builder()
            .default_headers(default_headers)
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn decode_body<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, ApiError> {
        let status = response.status();
        if !status.is_success() {
            // The body is still used as-is, the status is only reported
            warn!("{} answered with status {}", response.url(), status);
        }

        let text = response.text().await?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[async_trait]
impl UsersApi for ReqresClient {
    async fn login(&self, credentials: &LoginCredentials) -> Result<LoginResponse, ApiError> {
        let url = self.endpoint("login");
        debug!("POST {}", url);

        let response = self.client.post(&url).json(credentials).send().await?;
        Self::decode_body(response).await
    }

    async fn list_users(&self, page: u32) -> Result<UsersPage, ApiError> {
        let url = self.endpoint("users");
        debug!("GET {}?page={}", url, page);

        let response = self
            .client
            .get(&url)
            .query(&[("page", page)])
            .send()
            .await?;
        Self::decode_body(response).await
    }

    async fn update_user(
        &self,
        id: i64,
        update: &UserUpdate,
    ) -> Result<serde_json::Value, ApiError> {
        let url = self.endpoint(&format!("users/{}", id));
        debug!("PUT {}", url);

        let response = self.client.put(&url).json(update).send().await?;
        Self::decode_body(response).await
    }

    async fn delete_user(&self, id: i64) -> Result<bool, ApiError> {
        let url = self.endpoint(&format!("users/{}", id));
        debug!("DELETE {}", url);

        let response = self.client.delete(&url).send().await?;
        Ok(response.status().is_success())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_invalid_base_url() {
        let config = ApiConfig::new("not a url");
        let result = ReqresClient::new(&config);
        assert!(matches!(result, Err(ApiError::InvalidBaseUrl(_))));
    }

    #[test]
    fn test_endpoint_joins_without_double_slash() {
        let client = ReqresClient::new(&ApiConfig::new("https://reqres.in/api/")).unwrap();
        assert_eq!(client.base_url(), "https://reqres.in/api");
        assert_eq!(client.endpoint("/users/2"), "https://reqres.in/api/users/2");
        assert_eq!(client.endpoint("login"), "https://reqres.in/api/login");
    }

    #[test]
    fn test_rejects_api_key_with_newline() {
        let mut config = ApiConfig::new("https://reqres.in/api");
        config.api_key = Some("bad\nkey".to_string());
        let result = ReqresClient::new(&config);
        assert!(matches!(result, Err(ApiError::InvalidApiKey)));
    }
}
