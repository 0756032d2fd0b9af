//! Middleware for bearer token validation
//!
//! Shared by every service that exposes protected routes: it only needs the
//! `TokenService`, so it is layered with `from_fn_with_state` independent of
//! the router's own state.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::Response,
};
use common::Tier;
use tracing::debug;
use uuid::Uuid;

use crate::{
    error::AuthError,
    jwt::{TokenPayload, TokenService, extract_token_from_header},
};

/// Authenticated caller, as asserted by a valid access token
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    /// Tier at token issuance; entitlement decisions re-read it from storage
    pub tier: Tier,
}

impl From<TokenPayload> for AuthUser {
    fn from(payload: TokenPayload) -> Self {
        Self {
            id: payload.user_id,
            email: payload.email,
            tier: payload.tier,
        }
    }
}

/// Extract and validate the access token from the Authorization header
pub async fn auth_middleware(
    State(token_service): State<TokenService>,
    mut req: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let token = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(extract_token_from_header)
        .ok_or(AuthError::Unauthorized)?;

    let payload = token_service.verify_token(token).ok_or_else(|| {
        debug!("Rejected bearer token on {}", req.uri().path());
        AuthError::Unauthorized
    })?;

    // Add the caller to request extensions for use in handlers
    req.extensions_mut().insert(AuthUser::from(payload));

    Ok(next.run(req).await)
}
