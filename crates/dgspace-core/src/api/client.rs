//! HTTP gateway for every call to the portal backend.
//!
//! All requests leave through `ApiClient::send`, which attaches the stored
//! bearer credential and inspects every response for an expired session.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::{header, Client, Method, Response, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use crate::auth::Profile;

use super::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint, relative to the API base URL
const LOGIN_PATH: &str = "/auth/login";

/// Current user's profile, relative to the API base URL
const PROFILE_PATH: &str = "/profile";

/// Default HTTP request timeout in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// The gateway's view of the session it serves.
///
/// Implemented by the auth controller's shared state so the gateway can read
/// the credential and end the session without owning the controller.
pub trait SessionHooks: Send + Sync {
    /// Credential to attach to the next outgoing request.
    fn credential(&self) -> Option<String>;

    /// Called synchronously when a request other than login gets a 401.
    fn session_expired(&self);
}

#[derive(Debug, Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

/// Successful login payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: Profile,
}

#[derive(Debug, Deserialize)]
struct ProfileResponse {
    user: Profile,
}

/// API client for the portal backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    hooks: Arc<dyn SessionHooks>,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration, hooks: Arc<dyn SessionHooks>) -> Result<Self> {
        let mut default_headers = header::HeaderMap::new();
        default_headers.insert(
            header::ACCEPT,
            header::HeaderValue::from_static("application/json"),
        );

        let client = Client::builder()
            .timeout(timeout)
            .default_headers(default_headers)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            hooks,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// Outbound interception: the bearer header, when a credential is stored.
    fn auth_headers(&self) -> Result<Option<header::HeaderMap>, ApiError> {
        let Some(token) = self.hooks.credential() else {
            return Ok(None);
        };
        let mut headers = header::HeaderMap::new();
        let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidResponse("stored token is not a valid header value".to_string()))?;
        headers.insert(header::AUTHORIZATION, value);
        Ok(Some(headers))
    }

    /// Inbound interception: on any call but the login exchange a 401 ends
    /// the session, whether or not a credential went out with it. Every
    /// other failure is passed through.
    async fn check_response(&self, response: Response, session_call: bool) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && session_call {
            warn!(url = %response.url(), "Request rejected as unauthorized, ending session");
            self.hooks.session_expired();
            return Err(ApiError::SessionExpired);
        }

        let body = response.text().await.unwrap_or_default();
        Err(ApiError::from_status(status, &body))
    }

    /// Send a request through the gateway.
    pub async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Response, ApiError> {
        self.dispatch(method, path, body, true).await
    }

    async fn dispatch<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        session_call: bool,
    ) -> Result<Response, ApiError> {
        let url = self.url(path);
        let mut request = self.client.request(method.clone(), &url);

        // The login exchange never carries the stored credential.
        let auth_headers = if session_call { self.auth_headers()? } else { None };
        let authenticated = auth_headers.is_some();
        if let Some(headers) = auth_headers {
            request = request.headers(headers);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        debug!(%method, url = %url, authenticated, "Sending request");
        let response = request.send().await?;
        self.check_response(response, session_call).await
    }

    async fn parse<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        let url = response.url().to_string();
        let text = response.text().await?;
        serde_json::from_str(&text)
            .map_err(|e| ApiError::InvalidResponse(format!("{} from {}", e, url)))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.send::<()>(Method::GET, path, None).await?;
        Self::parse(response).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let response = self.send(Method::POST, path, Some(body)).await?;
        Self::parse(response).await
    }

    // ===== Endpoints =====

    /// Exchange email and password for a credential and profile
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest { email, password };
        let response = self.dispatch(Method::POST, LOGIN_PATH, Some(&body), false).await?;
        Self::parse(response).await
    }

    /// Fetch the signed-in user's profile
    pub async fn fetch_profile(&self) -> Result<Profile, ApiError> {
        let response: ProfileResponse = self.get(PROFILE_PATH).await?;
        Ok(response.user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    struct FixedHooks {
        token: Mutex<Option<String>>,
        expired: AtomicUsize,
    }

    impl SessionHooks for FixedHooks {
        fn credential(&self) -> Option<String> {
            self.token.lock().unwrap().clone()
        }

        fn session_expired(&self) {
            self.expired.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn client(token: Option<&str>) -> ApiClient {
        let hooks = Arc::new(FixedHooks {
            token: Mutex::new(token.map(str::to_string)),
            expired: AtomicUsize::new(0),
        });
        ApiClient::new("http://localhost:5000/api/", Duration::from_secs(5), hooks).unwrap()
    }

    #[test]
    fn test_url_joins_without_double_slash() {
        let api = client(None);
        assert_eq!(api.base_url(), "http://localhost:5000/api");
        assert_eq!(api.url("/auth/login"), "http://localhost:5000/api/auth/login");
        assert_eq!(api.url("profile"), "http://localhost:5000/api/profile");
    }

    #[test]
    fn test_auth_headers_only_with_credential() {
        assert!(client(None).auth_headers().unwrap().is_none());

        let headers = client(Some("abc")).auth_headers().unwrap().unwrap();
        assert_eq!(headers.get(header::AUTHORIZATION).unwrap(), "Bearer abc");
    }

    #[test]
    fn test_auth_headers_reject_unprintable_token() {
        assert!(client(Some("bad\ntoken")).auth_headers().is_err());
    }
}
