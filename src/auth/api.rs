//! Authentication API Endpoints
//! Mission: Expose the account lifecycle over HTTP

use crate::auth::middleware::{require_role, token_from_headers};
use crate::auth::models::{
    AccountResponse, AccountRole, Claims, DeleteAccountRequest, LoginRequest, SignupRequest,
};
use crate::auth::service::{AuthError, AuthService};
use axum::{
    extract::State,
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension, Json,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{error, warn};

/// Shared handler state.
#[derive(Clone)]
pub struct AuthState {
    pub service: Arc<AuthService>,
}

impl AuthState {
    pub fn new(service: Arc<AuthService>) -> Self {
        Self { service }
    }
}

/// Roles allowed to operate on their own session. A DELETED-role token is
/// refused even before the live account is consulted.
const ACTIVE_ROLES: [AccountRole; 2] = [AccountRole::User, AccountRole::Seller];

/// Signup - POST /api/user/signup
pub async fn signup(
    State(state): State<AuthState>,
    Json(payload): Json<SignupRequest>,
) -> Result<Json<AccountResponse>, AuthError> {
    let created = state.service.signup(
        &payload.email,
        &payload.password,
        &payload.role,
        payload.profile,
    )?;
    Ok(Json(created))
}

/// Login - POST /api/user/login
///
/// On success the token travels back in the `Authorization` response header
/// and the public profile in the body, as the original API did it.
pub async fn login(
    State(state): State<AuthState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Response, AuthError> {
    let outcome = state.service.login(&payload.email, &payload.password)?;

    let bearer = format!("Bearer {}", outcome.token);
    Ok(([(header::AUTHORIZATION, bearer)], Json(outcome.account)).into_response())
}

/// Logout - POST /api/user/logout (protected)
pub async fn logout(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
) -> Result<Json<serde_json::Value>, AuthError> {
    require_role(&claims, &ACTIVE_ROLES).map_err(|_| AuthError::AccountDeleted)?;

    let token = token_from_headers(&headers).ok_or(AuthError::InvalidToken)?;
    state.service.logout(&token)?;

    Ok(Json(json!({ "message": "Logged out" })))
}

/// Account deletion - DELETE /api/user/delete (protected)
///
/// Soft-deletes the token holder's account after the body re-confirms its
/// email and password.
pub async fn delete_account(
    State(state): State<AuthState>,
    Extension(claims): Extension<Claims>,
    headers: HeaderMap,
    Json(payload): Json<DeleteAccountRequest>,
) -> Result<Json<serde_json::Value>, AuthError> {
    require_role(&claims, &ACTIVE_ROLES).map_err(|_| AuthError::AccountDeleted)?;

    let token = token_from_headers(&headers).ok_or(AuthError::InvalidToken)?;
    state
        .service
        .delete_account(&token, &payload.email, &payload.password)?;

    Ok(Json(json!({ "message": "Account deleted" })))
}

/// Current identity - GET /api/user/me (protected)
///
/// Returns the live account state, which may differ from the role frozen
/// into the token.
pub async fn me(
    State(state): State<AuthState>,
    headers: HeaderMap,
) -> Result<Json<AccountResponse>, AuthError> {
    let token = token_from_headers(&headers).ok_or(AuthError::InvalidToken)?;
    let account = state.service.resolve_identity(&token)?;
    Ok(Json(AccountResponse::from_account(&account)))
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AuthError::DuplicateAccount => {
                (StatusCode::CONFLICT, "An account with this email already exists")
            }
            AuthError::InvalidRole => (StatusCode::BAD_REQUEST, "Unknown account role"),
            AuthError::AccountNotFound => (StatusCode::NOT_FOUND, "No account matches this email"),
            AuthError::AccountLocked => (
                StatusCode::FORBIDDEN,
                "Account locked after too many failed login attempts",
            ),
            AuthError::InvalidCredentials => {
                (StatusCode::UNAUTHORIZED, "Invalid email or password")
            }
            AuthError::AccountDeleted => {
                (StatusCode::FORBIDDEN, "This account has been deleted")
            }
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthError::Storage(e) => {
                error!(error = %e, "Storage failure during auth request");
                (StatusCode::INTERNAL_SERVER_ERROR, "Storage unavailable")
            }
        };

        if status != StatusCode::INTERNAL_SERVER_ERROR {
            warn!(status = status.as_u16(), "Auth request rejected: {}", self);
        }

        (status, Json(json!({ "error": message }))).into_response()
    }
}
