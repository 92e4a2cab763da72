//! Resource lock handlers
//!
//! Status is visible to every logged-in operator; taking or dropping a lock
//! needs at least the manager role.

use super::types::{AcquireLockRequest, ApiError, LockResponse};
use crate::auth::{require_role, CurrentSession, PermissionDenied};
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Json, Response},
};
use panelguard_applications::LockStatus;
use panelguard_core::Role;

/// Minimum role for editing a lockable resource
pub const EDIT_ROLE: Role = Role::Manager;

pub async fn lock_status(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(resource_id): Path<String>,
) -> Result<Json<LockResponse>, ApiError> {
    match state.services.locks().lock_status(&resource_id).await {
        LockStatus::Free => Ok(Json(LockResponse::free(&resource_id))),
        LockStatus::Held(lock) => Ok(Json(LockResponse::held(&lock, &session))),
        LockStatus::Unknown => Err(ApiError::unavailable(format!(
            "Lock state of {} is unknown",
            resource_id
        ))),
    }
}

pub async fn acquire_lock(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(resource_id): Path<String>,
    Json(request): Json<AcquireLockRequest>,
) -> Result<Json<LockResponse>, Response> {
    require_role(&session, EDIT_ROLE).map_err(PermissionDenied::into_response)?;

    let lock = state
        .services
        .locks()
        .try_acquire_lock(&resource_id, request.lock_type, &session)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;
    Ok(Json(LockResponse::held(&lock, &session)))
}

pub async fn release_lock(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    Path(resource_id): Path<String>,
) -> Result<Json<LockResponse>, Response> {
    require_role(&session, EDIT_ROLE).map_err(PermissionDenied::into_response)?;

    state
        .services
        .locks()
        .try_release_lock(&resource_id, &session.session_id)
        .await
        .map_err(|e| ApiError::from(e).into_response())?;
    Ok(Json(LockResponse::free(&resource_id)))
}
