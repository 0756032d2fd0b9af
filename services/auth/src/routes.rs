//! Authentication service routes

use axum::{
    Extension, Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    middleware,
    response::IntoResponse,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    AppState,
    error::{AuthError, AuthResult},
    middleware::{AuthUser, auth_middleware},
    models::{NewUser, User, UserProfile},
    password,
    validation::{normalize_email, validate_email},
};

/// Name of the httpOnly cookie holding the refresh token
pub const REFRESH_COOKIE: &str = "refreshToken";

/// Request for signup and login
#[derive(Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Response for signup, login and refresh
#[derive(Serialize)]
pub struct SessionResponse {
    pub success: bool,
    pub user: UserProfile,
    pub token: String,
}

/// Response for the current-user endpoint
#[derive(Serialize)]
pub struct ProfileResponse {
    pub success: bool,
    pub user: UserProfile,
}

/// Create the router for the authentication service
pub fn create_router(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/api/auth/me", get(me))
        .route_layer(middleware::from_fn_with_state(
            state.token_service.clone(),
            auth_middleware,
        ));

    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/signup", post(signup))
        .route("/api/auth/login", post(login))
        .route("/api/auth/refresh", post(refresh_token))
        .route("/api/auth/logout", post(logout))
        .merge(protected_routes)
        .with_state(state)
}

/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "auth-service"
    }))
}

/// Build the refresh cookie; its lifetime matches the token it carries
fn refresh_cookie(state: &AppState, refresh_token: String) -> Cookie<'static> {
    let max_age = i64::try_from(state.token_service.refresh_token_expiry()).unwrap_or(i64::MAX);

    Cookie::build((REFRESH_COOKIE, refresh_token))
        .http_only(true)
        .secure(state.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::seconds(max_age))
        .path("/")
        .build()
}

/// Issue a token pair for `user` and attach the refresh cookie
fn start_session(
    state: &AppState,
    jar: CookieJar,
    user: &User,
) -> AuthResult<(CookieJar, SessionResponse)> {
    let pair = state
        .token_service
        .generate_token_pair(&user.token_payload())?;

    let jar = jar.add(refresh_cookie(state, pair.refresh_token));
    let response = SessionResponse {
        success: true,
        user: user.profile(),
        token: pair.access_token,
    };

    Ok((jar, response))
}

/// Account signup endpoint
pub async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);

    validate_email(&email).map_err(AuthError::BadRequest)?;
    state
        .password_policy
        .validate_password_strength(&payload.password)
        .map_err(AuthError::BadRequest)?;

    if state.user_store.find_by_email(&email).await?.is_some() {
        return Err(AuthError::Conflict(
            "An account with this email already exists".to_string(),
        ));
    }

    let plaintext = payload.password;
    let password_hash = tokio::task::spawn_blocking(move || password::hash_password(&plaintext))
        .await
        .map_err(anyhow::Error::from)??;

    let new_user = NewUser {
        email,
        password_hash: Some(password_hash),
    };
    let user = state.user_store.create(&new_user).await?.ok_or_else(|| {
        AuthError::Conflict("An account with this email already exists".to_string())
    })?;

    info!("Created account {} ({})", user.id, user.email);

    let (jar, response) = start_session(&state, jar, &user)?;
    Ok((StatusCode::CREATED, jar, Json(response)))
}

/// User login endpoint
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> AuthResult<impl IntoResponse> {
    let Json(payload) = payload?;
    let email = normalize_email(&payload.email);

    if email.is_empty() || payload.password.is_empty() {
        return Err(AuthError::BadRequest(
            "Email and password are required".to_string(),
        ));
    }

    let Some(user) = state.user_store.find_by_email(&email).await? else {
        warn!("Login attempt for unknown email: {}", email);
        return Err(AuthError::InvalidCredentials);
    };

    let Some(stored_hash) = user.password_hash.clone() else {
        warn!("Password login attempted for account without password: {}", user.id);
        return Err(AuthError::InvalidCredentials);
    };

    let plaintext = payload.password;
    let matches = tokio::task::spawn_blocking(move || {
        password::verify_password(&plaintext, &stored_hash)
    })
    .await
    .map_err(anyhow::Error::from)?;

    if !matches {
        warn!("Failed login for user {}", user.id);
        return Err(AuthError::InvalidCredentials);
    }

    info!("User {} logged in", user.id);

    let (jar, response) = start_session(&state, jar, &user)?;
    Ok((StatusCode::OK, jar, Json(response)))
}

/// Mint a new access token from the refresh cookie
///
/// The user is re-read from storage so tier changes since login are
/// reflected in the new token.
pub async fn refresh_token(
    State(state): State<AppState>,
    jar: CookieJar,
) -> AuthResult<impl IntoResponse> {
    let cookie_value = jar
        .get(REFRESH_COOKIE)
        .map(|cookie| cookie.value().to_owned())
        .ok_or(AuthError::Unauthorized)?;

    let payload = state
        .token_service
        .verify_refresh_token(&cookie_value)
        .ok_or(AuthError::Unauthorized)?;

    let user = state
        .user_store
        .find_by_id(payload.user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    let token = state
        .token_service
        .generate_access_token(&user.token_payload())?;

    info!("Refreshed access token for user {}", user.id);

    Ok((
        StatusCode::OK,
        Json(SessionResponse {
            success: true,
            user: user.profile(),
            token,
        }),
    ))
}

/// Logout endpoint
///
/// Tokens are stateless, so logging out only drops the refresh cookie.
pub async fn logout(jar: CookieJar) -> impl IntoResponse {
    let jar = jar.remove(Cookie::build((REFRESH_COOKIE, "")).path("/"));

    (
        StatusCode::OK,
        jar,
        Json(serde_json::json!({
            "success": true,
            "message": "Logged out successfully"
        })),
    )
}

/// Current user endpoint
pub async fn me(
    State(state): State<AppState>,
    Extension(auth_user): Extension<AuthUser>,
) -> AuthResult<impl IntoResponse> {
    let user = state
        .user_store
        .find_by_id(auth_user.id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User not found".to_string()))?;

    Ok(Json(ProfileResponse {
        success: true,
        user: user.profile(),
    }))
}
