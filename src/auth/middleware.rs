//! Authorization Filter
//! Mission: Gate protected routes on token validity, revocation, and expiry

use crate::auth::jwt::TokenCodec;
use crate::auth::models::{AccountRole, Claims};
use crate::auth::revocation::RevocationStore;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

/// Header the client resubmits its token in, as the original API defined it.
/// `Authorization: Bearer <token>` is accepted as a standard-convention
/// fallback.
pub const AUTH_HEADER: &str = "X-Auth-Token";

/// Shared state for the authorization filter.
#[derive(Clone)]
pub struct AuthGate {
    pub codec: Arc<TokenCodec>,
    pub revocations: RevocationStore,
}

impl AuthGate {
    pub fn new(codec: Arc<TokenCodec>, revocations: RevocationStore) -> Self {
        Self { codec, revocations }
    }

    /// Fail-closed token check: decode, then revocation, then expiry.
    fn authorize(&self, token: &str) -> Result<Claims, AuthGateError> {
        let claims = self
            .codec
            .decode(token)
            .map_err(|_| AuthGateError::InvalidToken)?;

        if self.revocations.is_revoked(token) {
            return Err(AuthGateError::RevokedToken);
        }
        if self.codec.is_expired(&claims) {
            return Err(AuthGateError::ExpiredToken);
        }

        Ok(claims)
    }
}

/// Pull the token out of the request headers: the custom header first, the
/// standard `Authorization: Bearer` form second.
pub fn token_from_headers(headers: &axum::http::HeaderMap) -> Option<String> {
    let custom = headers
        .get(AUTH_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let bearer = headers
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|s| s.strip_prefix("Bearer "))
        .map(|t| t.to_string());

    custom.or(bearer)
}

fn extract_token(req: &Request) -> Option<String> {
    token_from_headers(req.headers())
}

/// Middleware for protected routes. Rejects requests without a valid,
/// unrevoked, unexpired token; otherwise attaches the claims to the request
/// for downstream role checks.
pub async fn auth_middleware(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Result<Response, AuthGateError> {
    let token = extract_token(&req).ok_or(AuthGateError::MissingToken)?;
    let claims = gate.authorize(&token)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Middleware for public routes: requests pass through anonymously, but a
/// valid token still attaches claims when one is presented.
pub async fn optional_auth_middleware(
    State(gate): State<AuthGate>,
    mut req: Request,
    next: Next,
) -> Response {
    if let Some(token) = extract_token(&req) {
        if let Ok(claims) = gate.authorize(&token) {
            req.extensions_mut().insert(claims);
        }
    }

    next.run(req).await
}

/// Route-level role contract: the authenticated principal must hold one of
/// `allowed`. Route→role mapping itself lives with the router configuration.
pub fn require_role(claims: &Claims, allowed: &[AccountRole]) -> Result<(), AuthGateError> {
    if allowed.contains(&claims.role) {
        Ok(())
    } else {
        Err(AuthGateError::Forbidden)
    }
}

/// Filter rejections. Every variant fails the request closed.
#[derive(Debug, PartialEq, Eq)]
pub enum AuthGateError {
    MissingToken,
    InvalidToken,
    RevokedToken,
    ExpiredToken,
    Forbidden,
}

impl IntoResponse for AuthGateError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthGateError::MissingToken => (StatusCode::UNAUTHORIZED, "Missing auth token"),
            AuthGateError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid token"),
            AuthGateError::RevokedToken => (StatusCode::UNAUTHORIZED, "Token has been revoked"),
            AuthGateError::ExpiredToken => (StatusCode::UNAUTHORIZED, "Token has expired"),
            AuthGateError::Forbidden => (StatusCode::FORBIDDEN, "Insufficient role"),
        };

        (status, message).into_response()
    }
}
