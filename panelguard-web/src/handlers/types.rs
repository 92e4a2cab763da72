//! Request and response bodies

use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use panelguard_applications::{LockError, LockType, ResourceLock, Session};
use panelguard_core::Role;
use serde::{Deserialize, Serialize};
use tracing::error;

/// Health check response
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
    pub version: String,
    pub active_sessions: usize,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// The logged-in operator
#[derive(Debug, Serialize, Deserialize)]
pub struct UserResponse {
    pub username: String,
    pub role: Role,
}

impl From<&Session> for UserResponse {
    fn from(session: &Session) -> Self {
        Self {
            username: session.username.clone(),
            role: session.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AcquireLockRequest {
    pub lock_type: LockType,
}

/// Lock state of one resource as seen by the caller
#[derive(Debug, Serialize, Deserialize)]
pub struct LockResponse {
    pub resource_id: String,
    pub locked: bool,
    pub owner: Option<String>,
    pub lock_type: Option<LockType>,
    /// Whether the caller's session holds the lock
    pub mine: bool,
}

impl LockResponse {
    pub fn free(resource_id: &str) -> Self {
        Self {
            resource_id: resource_id.to_string(),
            locked: false,
            owner: None,
            lock_type: None,
            mine: false,
        }
    }

    pub fn held(lock: &ResourceLock, viewer: &Session) -> Self {
        Self {
            resource_id: lock.resource_id.clone(),
            locked: true,
            owner: Some(lock.username.clone()),
            lock_type: Some(lock.lock_type),
            mine: lock.is_owned_by(&viewer.session_id),
        }
    }
}

/// Error body for lock endpoints
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

impl ApiError {
    pub fn new<S: Into<String>>(status: StatusCode, code: &'static str, message: S) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "lock_state_unknown", message)
    }
}

impl From<LockError> for ApiError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::Conflict { holder, .. } => Self::new(
                StatusCode::CONFLICT,
                "resource_busy",
                format!("busy, held by {}", holder),
            ),
            LockError::NotFound { resource_id } => Self::new(
                StatusCode::NOT_FOUND,
                "lock_not_found",
                format!("No lock on {} held by this session", resource_id),
            ),
            LockError::InvalidInput { message } => {
                Self::new(StatusCode::BAD_REQUEST, "invalid_input", message)
            }
            LockError::Storage(e) => {
                error!(error = %e, "Lock storage failure");
                Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "storage_failure",
                    "Lock storage is unavailable",
                )
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            self.status,
            Json(serde_json::json!({
                "error": self.code,
                "message": self.message,
            })),
        )
            .into_response()
    }
}
