//! API client for the LabRig REST API.
//!
//! Thin bearer-token HTTP helpers plus the login flow. Commands print raw
//! response bodies through the output module, so helpers return the body
//! as-is instead of deserializing into domain types.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::auth::expiry;
use crate::config::Config;

use super::ApiError;

/// HTTP request timeout in seconds. Reservation setup can hold a request for
/// a while, so this is generous.
const REQUEST_TIMEOUT_SECS: u64 = 60;

#[derive(Debug)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }
}

#[derive(Debug, Deserialize)]
struct LoginResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<i64>,
}

/// Client for the LabRig API.
/// Clone is cheap - reqwest::Client shares its connection pool internally.
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    api_base: String,
    api_prefix: String,
    rewrite_localhost: bool,
}

impl ApiClient {
    pub fn new(config: &Config) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            // Lab deployments commonly run on self-signed certificates;
            // verification is opt-in via verify_tls.
            .danger_accept_invalid_certs(!config.verify_tls)
            .build()?;

        Ok(Self {
            http,
            api_base: config.api_base.clone(),
            api_prefix: config.api_prefix.clone(),
            rewrite_localhost: config.rewrite_localhost,
        })
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}{}", self.api_base, self.api_prefix, path)
        } else {
            format!("{}{}/{}", self.api_base, self.api_prefix, path)
        }
    }

    /// Whether a machine host should be rewritten to the docker gateway name
    /// before registration.
    pub fn should_rewrite(&self, host: &str) -> bool {
        if !self.rewrite_localhost {
            return false;
        }
        let host = host.trim().to_ascii_lowercase();
        host == "localhost" || host == "127.0.0.1"
    }

    async fn collect(response: reqwest::Response) -> Result<ApiResponse, ApiError> {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        debug!(%status, bytes = body.len(), "api response");
        Ok(ApiResponse { status, body })
    }

    pub async fn get(&self, path: &str, token: Option<&str>) -> Result<ApiResponse, ApiError> {
        let mut req = self.http.get(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Self::collect(req.send().await?).await
    }

    pub async fn get_with_query(
        &self,
        path: &str,
        token: Option<&str>,
        query: &[(&str, String)],
    ) -> Result<ApiResponse, ApiError> {
        let mut req = self.http.get(self.url(path)).query(query);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Self::collect(req.send().await?).await
    }

    pub async fn post_json<B: Serialize>(
        &self,
        path: &str,
        token: Option<&str>,
        body: &B,
    ) -> Result<ApiResponse, ApiError> {
        let mut req = self.http.post(self.url(path)).json(body);
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Self::collect(req.send().await?).await
    }

    pub async fn delete(&self, path: &str, token: Option<&str>) -> Result<ApiResponse, ApiError> {
        let mut req = self.http.delete(self.url(path));
        if let Some(token) = token {
            req = req.bearer_auth(token);
        }
        Self::collect(req.send().await?).await
    }

    /// Authenticate and return the token with its derived expiry.
    ///
    /// The server may declare `expires_in`; otherwise the expiry is derived
    /// from the token itself or a fallback window (see `auth::expiry`).
    pub async fn login(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(String, DateTime<Utc>), ApiError> {
        #[derive(Serialize)]
        struct LoginRequest<'a> {
            username: &'a str,
            password: &'a str,
        }

        let response = self
            .post_json("/login", None, &LoginRequest { username, password })
            .await?;
        if response.status != StatusCode::OK {
            return Err(ApiError::LoginFailed {
                status: response.status.as_u16(),
                body: response.body,
            });
        }

        let data: LoginResponse = serde_json::from_str(&response.body)
            .map_err(|err| ApiError::InvalidResponse(format!("login response: {err}")))?;
        if data.access_token.is_empty() {
            return Err(ApiError::InvalidResponse(
                "login: empty access_token".to_string(),
            ));
        }

        let expires_at = expiry::derive(data.expires_in, &data.access_token);
        Ok((data.access_token, expires_at))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base: &str, prefix: &str) -> ApiClient {
        let mut cfg = Config::default();
        cfg.api_base = base.to_string();
        cfg.api_prefix = prefix.to_string();
        ApiClient::new(&cfg).expect("client")
    }

    #[test]
    fn test_url_joins_base_prefix_and_path() {
        let c = client("https://lab.example.com", "/v1");
        assert_eq!(c.url("/machines"), "https://lab.example.com/v1/machines");
        assert_eq!(c.url("machines"), "https://lab.example.com/v1/machines");
    }

    #[test]
    fn test_url_without_prefix() {
        let c = client("https://lab.example.com", "");
        assert_eq!(c.url("/whoami"), "https://lab.example.com/whoami");
    }

    #[test]
    fn test_should_rewrite_only_localhost_forms() {
        let c = client("https://lab.example.com", "");
        assert!(c.should_rewrite("localhost"));
        assert!(c.should_rewrite(" LOCALHOST "));
        assert!(c.should_rewrite("127.0.0.1"));
        assert!(!c.should_rewrite("lab-node-3"));
        assert!(!c.should_rewrite("127.0.0.2"));
    }

    #[test]
    fn test_rewrite_disabled_by_config() {
        let mut cfg = Config::default();
        cfg.rewrite_localhost = false;
        let c = ApiClient::new(&cfg).expect("client");
        assert!(!c.should_rewrite("localhost"));
    }

    #[test]
    fn test_login_response_parses_without_expires_in() {
        let data: LoginResponse =
            serde_json::from_str(r#"{"access_token":"tok"}"#).expect("parse");
        assert_eq!(data.access_token, "tok");
        assert_eq!(data.expires_in, None);
    }
}
