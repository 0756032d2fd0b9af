//! End-to-end tests for the subscription and usage routes against in-memory stores

use std::sync::Arc;

use api::{
    AppState, limits::LimitPolicy, repositories::MemoryUsageStore, routes::create_router,
};
use auth::{
    jwt::{JwtConfig, TokenService},
    models::{NewUser, User},
    repositories::{MemoryUserRepository, UserStore},
};
use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
};
use chrono::{Duration, TimeZone, Utc};
use common::{Tier, clock::ManualClock};
use serde_json::{Value, json};
use tower::ServiceExt;

struct TestApp {
    router: Router,
    users: MemoryUserRepository,
    usage: MemoryUsageStore,
    tokens: TokenService,
    clock: ManualClock,
}

fn test_app() -> TestApp {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 3, 28, 16, 0, 0).unwrap());
    let tokens = TokenService::new(
        JwtConfig {
            access_secret: "test-access-secret".to_string(),
            refresh_secret: "test-refresh-secret".to_string(),
            access_token_expiry: 900,
            refresh_token_expiry: 604800,
        },
        Arc::new(clock.clone()),
    )
    .unwrap();
    let users = MemoryUserRepository::new();
    let usage = MemoryUsageStore::new(Arc::new(clock.clone()));

    let state = AppState::new(
        tokens.clone(),
        Arc::new(users.clone()),
        Arc::new(usage.clone()),
        Arc::new(LimitPolicy::standard()),
    );

    TestApp {
        router: create_router(state),
        users,
        usage,
        tokens,
        clock,
    }
}

/// Register a user directly in the store and issue an access token for it
async fn user_with_token(app: &TestApp, email: &str) -> (User, String) {
    let user = app
        .users
        .create(&NewUser {
            email: email.to_string(),
            password_hash: None,
        })
        .await
        .unwrap()
        .unwrap();
    let token = app
        .tokens
        .generate_access_token(&user.token_payload())
        .unwrap();
    (user, token)
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

fn post(uri: &str, token: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .body(Body::empty())
        .unwrap()
}

async fn sync(app: &TestApp, token: &str, body: Value) -> (StatusCode, Value) {
    send(app, post("/api/usage/sync", token, body)).await
}

async fn check(app: &TestApp, token: &str, kind: &str) -> (StatusCode, Value) {
    send(
        app,
        post("/api/subscription/check-limit", token, json!({ "type": kind })),
    )
    .await
}

#[tokio::test]
async fn health_is_public() {
    let app = test_app();
    let request = Request::builder().uri("/health").body(Body::empty()).unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn protected_routes_require_a_valid_access_token() {
    let app = test_app();

    let request = Request::builder()
        .method("POST")
        .uri("/api/subscription/check-limit")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(json!({ "type": "recipes" }).to_string()))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/usage", "not-a-token")).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let request = Request::builder()
        .uri("/api/usage")
        .header(header::AUTHORIZATION, "Token abc")
        .body(Body::empty())
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn expired_access_token_is_rejected() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "baker@example.com").await;

    app.clock.advance(Duration::seconds(899));
    let (status, _) = send(&app, get("/api/usage", &token)).await;
    assert_eq!(status, StatusCode::OK);

    app.clock.advance(Duration::seconds(1));
    let (status, _) = send(&app, get("/api/usage", &token)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn check_limit_denies_free_user_at_recipe_ceiling() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "baker@example.com").await;
    sync(&app, &token, json!({ "recipes": 5 })).await;

    let (status, body) = check(&app, &token, "recipes").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "allowed": false,
            "limit": 5,
            "used": 5,
            "remaining": 0,
            "message": "You've reached your free plan limit of 5 recipes"
        })
    );
}

#[tokio::test]
async fn check_limit_reports_remaining_orders() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "baker@example.com").await;
    sync(&app, &token, json!({ "orders": 2 })).await;

    let (status, body) = check(&app, &token, "orders").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);
    assert_eq!(body["limit"], 15);
    assert_eq!(body["used"], 2);
    assert_eq!(body["remaining"], 13);
    assert_eq!(body["message"], "13 orders remaining");
}

#[tokio::test]
async fn check_limit_uses_live_tier_not_token_tier() {
    let app = test_app();
    let (user, token) = user_with_token(&app, "baker@example.com").await;
    sync(&app, &token, json!({ "customers": 50 })).await;

    let (_, body) = check(&app, &token, "customers").await;
    assert_eq!(body["allowed"], false);

    // Upgrade after the token was issued; the token still says free
    assert!(app.users.set_tier(user.id, Tier::Pro).await);

    let (status, body) = check(&app, &token, "customers").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["allowed"], true);
    assert_eq!(body["limit"], Value::Null);
    assert_eq!(body["remaining"], Value::Null);
    assert_eq!(body["message"], "Unlimited customers");
}

#[tokio::test]
async fn check_limit_rejects_missing_or_unknown_type() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "baker@example.com").await;

    let (status, body) = check(&app, &token, "widgets").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "Invalid type. Must be one of: recipes, orders, customers, inventory"
    );

    let (status, body) = send(
        &app,
        post("/api/subscription/check-limit", &token, json!({})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "type is required");

    let request = Request::builder()
        .method("POST")
        .uri("/api/subscription/check-limit")
        .header(header::AUTHORIZATION, format!("Bearer {}", token))
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"type\":"))
        .unwrap();
    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn deleted_account_gets_not_found() {
    let app = test_app();
    let (user, token) = user_with_token(&app, "baker@example.com").await;
    assert!(app.users.remove(user.id).await);

    let (status, body) = check(&app, &token, "recipes").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    let (status, _) = send(&app, get("/api/subscription/limits", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, get("/api/usage", &token)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = sync(&app, &token, json!({ "recipes": 3 })).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "User not found");

    for uri in ["/api/usage/increment", "/api/usage/decrement"] {
        let (status, _) = send(&app, post(uri, &token, json!({ "type": "recipes" }))).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", uri);
    }

    // Nothing may be written for an account that no longer exists
    assert_eq!(app.usage.record_count().await, 0);
}

#[tokio::test]
async fn limits_endpoint_reflects_tier() {
    let app = test_app();
    let (user, token) = user_with_token(&app, "baker@example.com").await;

    let (status, body) = send(&app, get("/api/subscription/limits", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["tier"], "free");
    assert_eq!(
        body["limits"],
        json!({
            "recipes": 5,
            "ordersPerMonth": 15,
            "customers": 10,
            "inventoryItems": 20
        })
    );
    assert_eq!(body["features"]["profitReports"], false);
    assert_eq!(body["features"]["prioritySupport"], false);

    app.users.set_tier(user.id, Tier::Pro).await;
    let (_, body) = send(&app, get("/api/subscription/limits", &token)).await;
    assert_eq!(body["tier"], "pro");
    assert_eq!(body["limits"]["recipes"], Value::Null);
    assert_eq!(body["limits"]["inventoryItems"], Value::Null);
    assert_eq!(body["features"]["advancedAnalytics"], true);
}

#[tokio::test]
async fn usage_starts_at_zero() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "baker@example.com").await;

    let (status, body) = send(&app, get("/api/usage", &token)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(
        body["usage"],
        json!({
            "recipes": 0,
            "ordersThisMonth": 0,
            "customers": 0,
            "inventoryItems": 0
        })
    );
    assert_eq!(app.usage.record_count().await, 0);
}

#[tokio::test]
async fn increment_and_decrement_adjust_one_counter() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "baker@example.com").await;

    for _ in 0..3 {
        let (status, _) = send(
            &app,
            post("/api/usage/increment", &token, json!({ "type": "inventory" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(
        &app,
        post("/api/usage/decrement", &token, json!({ "type": "inventory" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"]["inventoryItems"], 2);
    assert_eq!(body["usage"]["recipes"], 0);

    // Decrementing an empty counter is a no-op, not an error
    let (status, body) = send(
        &app,
        post("/api/usage/decrement", &token, json!({ "type": "recipes" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["usage"]["recipes"], 0);

    let (status, _) = send(
        &app,
        post("/api/usage/increment", &token, json!({ "type": "ingredients" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn sync_overwrites_server_counts() {
    let app = test_app();
    let (_, token) = user_with_token(&app, "baker@example.com").await;
    for _ in 0..8 {
        send(
            &app,
            post("/api/usage/increment", &token, json!({ "type": "orders" })),
        )
        .await;
    }

    let (status, body) = sync(
        &app,
        &token,
        json!({ "recipes": 3, "orders": 1, "customers": 4, "inventory": 0 }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["message"], "Usage synced successfully");
    assert_eq!(
        body["usage"],
        json!({
            "recipes": 3,
            "ordersThisMonth": 1,
            "customers": 4,
            "inventoryItems": 0
        })
    );

    let (status, body) = sync(&app, &token, json!({ "recipes": -2 })).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["error"],
        "recipes must be a non-negative integer no greater than 2147483647"
    );

    // Rejected sync leaves the stored snapshot untouched
    let (_, body) = send(&app, get("/api/usage", &token)).await;
    assert_eq!(body["usage"]["recipes"], 3);
}

#[tokio::test]
async fn usage_resets_at_month_boundary() {
    let app = test_app();
    let (user, token) = user_with_token(&app, "baker@example.com").await;
    sync(&app, &token, json!({ "orders": 15 })).await;

    let (_, body) = check(&app, &token, "orders").await;
    assert_eq!(body["allowed"], false);

    // The old token has expired by April; issue a fresh one
    app.clock.set(Utc.with_ymd_and_hms(2024, 4, 1, 0, 0, 0).unwrap());
    let token = app
        .tokens
        .generate_access_token(&user.token_payload())
        .unwrap();

    let (_, body) = check(&app, &token, "orders").await;
    assert_eq!(body["allowed"], true);
    assert_eq!(body["used"], 0);
    assert_eq!(body["remaining"], 15);
}

#[tokio::test]
async fn users_do_not_see_each_others_usage() {
    let app = test_app();
    let (_, alice) = user_with_token(&app, "alice@example.com").await;
    let (_, bob) = user_with_token(&app, "bob@example.com").await;

    sync(&app, &alice, json!({ "recipes": 5 })).await;

    let (_, body) = check(&app, &bob, "recipes").await;
    assert_eq!(body["allowed"], true);
    assert_eq!(body["used"], 0);
}
