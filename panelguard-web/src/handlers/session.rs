//! Login, logout and current-user handlers

use super::types::{LoginRequest, UserResponse};
use crate::auth::{AuthError, ClientInfo, CurrentSession};
use crate::AppState;
use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Json},
};
use panelguard_applications::session::{cleared_session_cookie, session_cookie};
use tracing::{info, warn};

/// Check credentials and start a session. The token is only ever sent back
/// in the `Set-Cookie` header.
pub async fn login(
    State(state): State<AppState>,
    client: ClientInfo,
    Json(request): Json<LoginRequest>,
) -> Result<impl IntoResponse, AuthError> {
    let account = state
        .services
        .users()
        .authenticate(&request.username, &request.password)
        .ok_or_else(|| {
            info!(username = %request.username, address = %client.address, "Failed login");
            AuthError::InvalidCredentials
        })?;

    let session = state
        .services
        .sessions()
        .create_session(
            &account.username,
            account.role,
            &client.address,
            &client.user_agent,
        )
        .await
        .map_err(|e| {
            warn!(username = %account.username, error = %e, "Could not create session");
            AuthError::from(e)
        })?;

    let cookie = session_cookie(
        &session.session_id,
        state.cookie_max_age_secs(),
        state.https_only(),
    );
    Ok(([(SET_COOKIE, cookie)], Json(UserResponse::from(&session))))
}

/// End the caller's session, if any, and clear the cookie
pub async fn logout(State(state): State<AppState>, client: ClientInfo) -> impl IntoResponse {
    let removed = state
        .services
        .sessions()
        .invalidate_session_cookie(&client.cookie_header)
        .await;

    (
        [(SET_COOKIE, cleared_session_cookie(state.https_only()))],
        Json(serde_json::json!({ "logged_out": removed })),
    )
}

/// Who is logged in on this session
pub async fn current_user(CurrentSession(session): CurrentSession) -> Json<UserResponse> {
    Json(UserResponse::from(&session))
}
