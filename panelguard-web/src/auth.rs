//! Request authentication
//!
//! Extractors that resolve the caller's session from the `session_id`
//! cookie, the peer address and the `User-Agent` header.

use crate::AppState;
use axum::{
    extract::{ConnectInfo, FromRef, FromRequestParts},
    http::{
        header::{COOKIE, USER_AGENT},
        request::Parts,
        StatusCode,
    },
    response::{IntoResponse, Json, Response},
};
use panelguard_applications::{Session, SessionError};
use panelguard_core::Role;
use std::convert::Infallible;
use std::net::SocketAddr;
use tracing::{debug, warn};

/// Authentication failures
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("Invalid username or password")]
    InvalidCredentials,

    #[error("Not logged in")]
    NotLoggedIn,

    #[error("Session expired, please log in again")]
    SessionExpired,

    #[error("Session could not be created")]
    SessionCreation,
}

impl From<SessionError> for AuthError {
    fn from(error: SessionError) -> Self {
        match error {
            SessionError::NoCookie | SessionError::NotFound => AuthError::NotLoggedIn,
            SessionError::Expired | SessionError::FingerprintMismatch => AuthError::SessionExpired,
            SessionError::TokenGenFailed(_) | SessionError::InvalidData => {
                AuthError::SessionCreation
            }
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, error_code) = match self {
            AuthError::InvalidCredentials => (StatusCode::UNAUTHORIZED, "invalid_credentials"),
            AuthError::NotLoggedIn => (StatusCode::UNAUTHORIZED, "not_logged_in"),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "session_expired"),
            AuthError::SessionCreation => {
                (StatusCode::INTERNAL_SERVER_ERROR, "session_creation_failed")
            }
        };

        (
            status,
            Json(serde_json::json!({
                "error": error_code,
                "message": self.to_string(),
            })),
        )
            .into_response()
    }
}

/// Role too low for the requested operation
#[derive(Debug)]
pub struct PermissionDenied {
    pub required: Role,
    pub username: String,
}

impl IntoResponse for PermissionDenied {
    fn into_response(self) -> Response {
        (
            StatusCode::FORBIDDEN,
            Json(serde_json::json!({
                "error": "permission_denied",
                "message": format!(
                    "User '{}' needs the {} role for this operation",
                    self.username, self.required
                ),
                "required_role": self.required,
            })),
        )
            .into_response()
    }
}

/// Reject sessions whose role is below `required`
pub fn require_role(session: &Session, required: Role) -> Result<(), PermissionDenied> {
    if session.role.is_insufficient_for(required) {
        debug!(
            username = %session.username,
            role = %session.role,
            required = %required,
            "Permission denied"
        );
        return Err(PermissionDenied {
            required,
            username: session.username.clone(),
        });
    }
    Ok(())
}

/// Network identity of the caller used for session fingerprinting
#[derive(Debug, Clone, Default)]
pub struct ClientInfo {
    /// Peer IP address, without the port
    pub address: String,
    pub user_agent: String,
    /// Every `Cookie` header joined with `; `
    pub cookie_header: String,
}

impl<S> FromRequestParts<S> for ClientInfo
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let address = match ConnectInfo::<SocketAddr>::from_request_parts(parts, state).await {
            Ok(ConnectInfo(addr)) => addr.ip().to_string(),
            Err(_) => {
                warn!("Peer address unavailable; fingerprinting on user agent only");
                String::new()
            }
        };

        let user_agent = parts
            .headers
            .get(USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();

        let cookie_header = parts
            .headers
            .get_all(COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect::<Vec<_>>()
            .join("; ");

        Ok(Self {
            address,
            user_agent,
            cookie_header,
        })
    }
}

/// The validated session of the caller. Extraction refreshes the heartbeat.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub Session);

impl<S> FromRequestParts<S> for CurrentSession
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let app_state = AppState::from_ref(state);
        let client = match ClientInfo::from_request_parts(parts, state).await {
            Ok(client) => client,
            Err(never) => match never {},
        };

        let session = app_state
            .services
            .sessions()
            .validate_session(&client.cookie_header, &client.address, &client.user_agent)
            .await?;
        Ok(CurrentSession(session))
    }
}
