mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
};
use tower::ServiceExt;

use cherry_quota_server::models::Tier;

use common::{
    action_request, build_app, json_body, test_config, token_for, DownStore, HangingStore,
    MemoryStore,
};

// 2024-05-02T00:00:00Z
const NEXT_MIDNIGHT: i64 = 1_714_608_000;

#[tokio::test]
async fn test_health_check() {
    let app = build_app(test_config(), Arc::new(MemoryStore::default()));

    let response = app
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_readiness_reflects_store_health() {
    let healthy = build_app(test_config(), Arc::new(MemoryStore::default()));
    let response = healthy
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let degraded = build_app(test_config(), Arc::new(DownStore));
    let response = degraded
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let body = json_body(response).await;
    assert_eq!(body["checks"]["counter_store"], "unhealthy");
}

#[tokio::test]
async fn test_readiness_gives_up_on_hanging_store() {
    let mut config = test_config();
    config.store_timeout_ms = 50;
    let app = build_app(config, Arc::new(HangingStore));
    let started = Instant::now();

    let response = app
        .oneshot(Request::builder().uri("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert!(started.elapsed() < Duration::from_secs(5));
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body = json_body(response).await;
    assert_eq!(body["status"], "degraded");
    assert_eq!(body["checks"]["counter_store"], "unhealthy");
}

#[tokio::test]
async fn test_action_requires_token() {
    let app = build_app(test_config(), Arc::new(MemoryStore::default()));

    let response = app
        .oneshot(action_request("/api/v1/barista/draft", None, "hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_action_rejects_foreign_token() {
    let app = build_app(test_config(), Arc::new(MemoryStore::default()));
    let forged = cherry_quota_server::auth::JwtService::new("other-secret")
        .generate_access_token("u1", Tier::Pro)
        .unwrap();

    let response = app
        .oneshot(action_request("/api/v1/barista/draft", Some(&forged), "hello"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_accepted_action_reports_quota() {
    let app = build_app(test_config(), Arc::new(MemoryStore::default()));
    let token = token_for("u1", Tier::Free);

    let response = app
        .oneshot(action_request("/api/v1/barista/outline", Some(&token), "a post about tea"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-quota-daily-limit"], "20");
    assert_eq!(headers["x-quota-daily-used"], "1");
    assert_eq!(headers["x-quota-daily-remaining"], "19");
    assert_eq!(headers["x-quota-reset"], NEXT_MIDNIGHT.to_string().as_str());

    let body = json_body(response).await;
    assert_eq!(body["action"], "outline");
    assert_eq!(body["kind"], "barista");
    assert_eq!(body["status"], "accepted");
    assert_eq!(body["quota"]["remaining"], 19);
    assert_eq!(body["quota"]["resets_at"], NEXT_MIDNIGHT);
}

#[tokio::test]
async fn test_image_limit_then_upgrade_hint() {
    let store = Arc::new(MemoryStore::default());
    let app = build_app(test_config(), store.clone());
    let token = token_for("u1", Tier::Free);

    for expected_remaining in [2, 1, 0] {
        let response = app
            .clone()
            .oneshot(action_request("/api/v1/images/generate", Some(&token), "a cherry tree"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["quota"]["remaining"], expected_remaining);
    }

    let response = app
        .oneshot(action_request("/api/v1/images/generate", Some(&token), "a cherry tree"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    assert_eq!(response.headers()[header::RETRY_AFTER], "43200");

    let body = json_body(response).await;
    assert_eq!(body["kind"], "image");
    assert_eq!(body["limit"], 3);
    assert_eq!(body["count"], 4);
    assert_eq!(body["remaining"], 0);
    assert_eq!(
        body["upgrade_hint"],
        "Upgrade to Plus for 20 image generations per day"
    );
    assert_eq!(store.count("rl:image:u1:2024-05-01"), 4);
}

#[tokio::test]
async fn test_top_tier_gets_no_upgrade_hint() {
    let mut config = test_config();
    config.tiers.pro.image_daily = 1;
    let app = build_app(config, Arc::new(MemoryStore::default()));
    let token = token_for("u1", Tier::Pro);

    for _ in 0..2 {
        app.clone()
            .oneshot(action_request("/api/v1/images/generate", Some(&token), "sunset"))
            .await
            .unwrap();
    }
    let response = app
        .oneshot(action_request("/api/v1/images/generate", Some(&token), "sunset"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert!(body["upgrade_hint"].is_null());
    assert_eq!(body["count"], 3);
}

#[tokio::test]
async fn test_zero_limit_rejects_first_call() {
    let mut config = test_config();
    config.tiers.free.barista_daily = 0;
    let app = build_app(config, Arc::new(MemoryStore::default()));
    let token = token_for("u1", Tier::Free);

    let response = app
        .oneshot(action_request("/api/v1/barista/idea", Some(&token), "something"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    let body = json_body(response).await;
    assert_eq!(body["count"], 1);
}

#[tokio::test]
async fn test_barista_actions_share_one_counter() {
    let store = Arc::new(MemoryStore::default());
    let app = build_app(test_config(), store.clone());
    let token = token_for("u1", Tier::Free);

    for action in ["draft", "outline", "polish", "idea"] {
        let uri = format!("/api/v1/barista/{action}");
        let response = app
            .clone()
            .oneshot(action_request(&uri, Some(&token), "text"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    assert_eq!(store.count("rl:barista:u1:2024-05-01"), 4);
    assert_eq!(store.count("rl:image:u1:2024-05-01"), 0);
}

#[tokio::test]
async fn test_invalid_requests_are_not_charged() {
    let store = Arc::new(MemoryStore::default());
    let app = build_app(test_config(), store.clone());
    let token = token_for("u1", Tier::Free);

    let response = app
        .clone()
        .oneshot(action_request("/api/v1/barista/draft", Some(&token), "   "))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let response = app
        .oneshot(action_request("/api/v1/barista/summarize", Some(&token), "text"))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert_eq!(store.count("rl:barista:u1:2024-05-01"), 0);
}

#[tokio::test]
async fn test_store_outage_keeps_gating_locally() {
    let app = build_app(test_config(), Arc::new(DownStore));
    let token = token_for("u1", Tier::Free);

    let mut statuses = Vec::new();
    for _ in 0..4 {
        let response = app
            .clone()
            .oneshot(action_request("/api/v1/images/generate", Some(&token), "fox"))
            .await
            .unwrap();
        statuses.push(response.status());
    }

    assert_eq!(
        statuses,
        vec![
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::OK,
            StatusCode::TOO_MANY_REQUESTS
        ]
    );

    let response = app
        .oneshot(Request::builder().uri("/metrics").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let metrics = String::from_utf8(bytes.to_vec()).unwrap();
    assert!(metrics.contains("quota_store_fallbacks_total 4"));
}

#[tokio::test]
async fn test_users_do_not_share_counters() {
    let mut config = test_config();
    config.tiers.free.image_daily = 1;
    let app = build_app(config, Arc::new(MemoryStore::default()));

    for user in ["u1", "u2"] {
        let token = token_for(user, Tier::Free);
        let response = app
            .clone()
            .oneshot(action_request("/api/v1/images/generate", Some(&token), "owl"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
