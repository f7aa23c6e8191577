use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::Mutex;

use tavle_common::models::auth::{LoginRequest, RefreshRequest, RefreshResponse, TokenPair};

use crate::error::{AuthError, SessionError, DEFAULT_LOGIN_ERROR};
use crate::token_store::TokenStore;
use crate::transport::{ApiRequest, ApiResponse, ApiTransport, Method};

pub const LOGIN_PATH: &str = "/api/login/";
pub const REFRESH_PATH: &str = "/api/refresh-token/";

/// Owns the access/refresh token pair and gates every authorized call.
///
/// A call that hits a 401 triggers exactly one refresh followed by exactly
/// one replay; the control flow below is straight-line, so the at-most-once
/// contract holds structurally. `refresh_lock` keeps concurrent callers
/// from racing the refresh endpoint.
#[derive(Clone)]
pub struct SessionManager {
    transport: Arc<dyn ApiTransport>,
    store: Arc<dyn TokenStore>,
    csrf_token: Option<Arc<str>>,
    refresh_lock: Arc<Mutex<()>>,
}

impl SessionManager {
    pub fn new(transport: Arc<dyn ApiTransport>, store: Arc<dyn TokenStore>) -> Self {
        Self {
            transport,
            store,
            csrf_token: None,
            refresh_lock: Arc::new(Mutex::new(())),
        }
    }

    /// The login endpoint sits behind CSRF protection; when a token is
    /// configured it is sent as the `X-CSRFToken` header.
    pub fn with_csrf_token(mut self, token: &str) -> Self {
        self.csrf_token = Some(Arc::from(token));
        self
    }

    pub fn is_logged_in(&self) -> bool {
        self.store.access_token().is_some()
    }

    /// Exchange credentials for a token pair and persist it.
    #[tracing::instrument(skip(self, password))]
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, AuthError> {
        let mut request = ApiRequest::post(
            LOGIN_PATH,
            &LoginRequest {
                username: username.to_string(),
                password: password.to_string(),
            },
        );
        if let Some(csrf) = &self.csrf_token {
            request = request.with_header("X-CSRFToken", csrf);
        }

        let response = self
            .transport
            .send(request)
            .await
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        if !response.is_success() {
            let message = response
                .error_message()
                .unwrap_or_else(|| DEFAULT_LOGIN_ERROR.to_string());
            tracing::warn!("Login rejected for '{}': {}", username, message);
            return Err(AuthError::Rejected(message));
        }

        let pair: TokenPair = response
            .parse()
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;
        self.store
            .set_pair(&pair.access, &pair.refresh)
            .map_err(|e| AuthError::Unreachable(e.to_string()))?;

        tracing::info!("Logged in as '{}'", username);
        Ok(pair)
    }

    /// Send an authorized request, transparently recovering from an
    /// expired access token once.
    ///
    /// - No stored access token: fails with [`SessionError::NoToken`]
    ///   without touching the network.
    /// - 401: one refresh, one replay. A 401 on the replay is
    ///   [`SessionError::RequestFailed`], never a second refresh.
    /// - Refresh failure: both tokens cleared,
    ///   [`SessionError::RefreshFailed`].
    /// - Any other failure: [`SessionError::RequestFailed`], no refresh.
    #[tracing::instrument(skip(self, body))]
    pub async fn authorized_request(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<ApiResponse, SessionError> {
        let Some(access) = self.store.access_token() else {
            return Err(SessionError::NoToken);
        };

        let request = ApiRequest {
            method,
            path: path.to_string(),
            bearer: Some(access),
            headers: Vec::new(),
            body,
        };

        let response = self
            .transport
            .send(request.clone())
            .await
            .map_err(|e| SessionError::request_failed(None, e.to_string()))?;

        if response.status != 401 {
            return Self::finish(path, response);
        }

        tracing::debug!("Access token rejected for {}; refreshing", path);
        let new_access = match self.refresh_access_token().await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!("Token refresh failed: {}", e);
                if let Err(e) = self.store.clear() {
                    tracing::error!("Failed to clear token store: {}", e);
                }
                return Err(SessionError::RefreshFailed);
            }
        };

        let replay = request.with_bearer(&new_access);
        let response = self
            .transport
            .send(replay)
            .await
            .map_err(|e| SessionError::request_failed(None, e.to_string()))?;

        // A second 401 lands here as a plain request failure
        Self::finish(path, response)
    }

    /// GET without a body.
    pub async fn authorized_get(&self, path: &str) -> Result<ApiResponse, SessionError> {
        self.authorized_request(Method::Get, path, None).await
    }

    /// POST with a JSON body.
    pub async fn authorized_post<T: Serialize>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<ApiResponse, SessionError> {
        self.authorized_request(
            Method::Post,
            path,
            Some(serde_json::to_value(body).unwrap_or(Value::Null)),
        )
        .await
    }

    /// Clear both tokens. Idempotent.
    pub fn logout(&self) -> Result<()> {
        self.store.clear().context("Failed to clear token store")?;
        tracing::info!("Logged out");
        Ok(())
    }

    /// Exchange the stored refresh token for a new access token and
    /// persist it. At most one refresh runs at a time per session.
    async fn refresh_access_token(&self) -> Result<String> {
        let _guard = self.refresh_lock.lock().await;

        let refresh = match self.store.refresh_token() {
            Some(token) => token,
            None => bail!("No refresh token stored"),
        };

        let request = ApiRequest::post(
            REFRESH_PATH,
            &RefreshRequest {
                refresh_token: refresh,
            },
        );
        let response = self
            .transport
            .send(request)
            .await
            .context("Failed to reach refresh endpoint")?;

        if !response.is_success() {
            bail!("Refresh endpoint returned {}", response.status);
        }

        let parsed: RefreshResponse = response
            .parse()
            .context("Failed to parse refresh response")?;
        self.store
            .set_access_token(&parsed.access_token)
            .context("Failed to persist refreshed access token")?;

        tracing::debug!("Access token refreshed");
        Ok(parsed.access_token)
    }

    fn finish(path: &str, response: ApiResponse) -> Result<ApiResponse, SessionError> {
        if response.is_success() {
            Ok(response)
        } else {
            let message = response
                .error_message()
                .unwrap_or_else(|| format!("Server returned {} for {}", response.status, path));
            Err(SessionError::request_failed(Some(response.status), message))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token_store::MemoryTokenStore;
    use async_trait::async_trait;

    /// Transport that fails the test if the network is touched at all.
    struct NoNetwork;

    #[async_trait]
    impl ApiTransport for NoNetwork {
        async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
            panic!("Unexpected network call to {}", request.path);
        }
    }

    fn session_without_tokens() -> SessionManager {
        SessionManager::new(Arc::new(NoNetwork), Arc::new(MemoryTokenStore::new()))
    }

    #[tokio::test]
    async fn test_no_token_short_circuits_without_network() {
        let session = session_without_tokens();
        let result = session.authorized_get("/api/theme/").await;
        assert!(matches!(result, Err(SessionError::NoToken)));
    }

    #[tokio::test]
    async fn test_logout_is_idempotent() {
        let session = session_without_tokens();
        session.logout().unwrap();
        session.logout().unwrap();
        assert!(!session.is_logged_in());
    }
}
