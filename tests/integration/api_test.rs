// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::TestContext;
use axum::http::StatusCode;
use axum_test::TestServer;
use chrono::{Duration, Utc};
use reportrs::application::use_cases::schedule_preview::SchedulePreviewUseCase;
use reportrs::presentation::middleware::auth_middleware::AuthState;
use reportrs::presentation::routes::routes;
use serde_json::json;
use std::sync::Arc;
use uuid::Uuid;

const API_TOKEN: &str = "test-token";

fn create_server(ctx: &TestContext) -> TestServer {
    let app = routes(
        Arc::new(ctx.dispatcher()),
        SchedulePreviewUseCase::new(ctx.calculator),
        AuthState::new(Some(API_TOKEN.to_string())),
    );
    TestServer::new(app).unwrap()
}

#[tokio::test]
async fn test_public_endpoints() {
    let ctx = TestContext::new().await;
    let server = create_server(&ctx);

    let response = server.get("/health").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    assert_eq!(response.text(), "OK");

    let response = server.get("/v1/version").await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["name"], "reportrs");
}

#[tokio::test]
async fn test_protected_endpoints_require_token() {
    let ctx = TestContext::new().await;
    let server = create_server(&ctx);

    let response = server.post("/v1/dispatch").await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);

    let response = server
        .post("/v1/dispatch")
        .add_header("Authorization", "Bearer wrong-token")
        .await;
    assert_eq!(response.status_code(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_dispatch_endpoint_returns_summary() {
    let ctx = TestContext::new().await;
    ctx.mock_generation_ok("Scheduled body").await;
    let server = create_server(&ctx);

    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let report = ctx
        .insert_due_report(owner, "Due", (7, 0), Some(Utc::now() - Duration::hours(1)))
        .await;

    let response = server
        .post("/v1/dispatch")
        .add_header("Authorization", format!("Bearer {}", API_TOKEN))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["processed"], 1);
    assert_eq!(body["succeeded"], 1);
    assert_eq!(body["results"][0]["report_id"], report.id.to_string());

    let response = server
        .post("/v1/dispatch")
        .add_header("Authorization", format!("Bearer {}", API_TOKEN))
        .await;
    let body: serde_json::Value = response.json();
    assert_eq!(body["processed"], 0);
    assert_eq!(body["message"], "No reports due");
}

#[tokio::test]
async fn test_run_endpoint() {
    let ctx = TestContext::new().await;
    ctx.mock_generation_ok("Manual body").await;
    let server = create_server(&ctx);

    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let report = ctx.insert_due_report(owner, "Runnable", (7, 0), None).await;

    let response = server
        .post(&format!("/v1/reports/{}/run", report.id))
        .add_header("Authorization", format!("Bearer {}", API_TOKEN))
        .json(&json!({ "user_id": owner }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], true);
    assert_eq!(body["content"], "Manual body");
    assert_eq!(body["delivered"], 1);

    let response = server
        .post(&format!("/v1/reports/{}/run", report.id))
        .add_header("Authorization", format!("Bearer {}", API_TOKEN))
        .json(&json!({ "user_id": Uuid::new_v4() }))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    let body: serde_json::Value = response.json();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Report not found or access denied");
}

#[tokio::test]
async fn test_schedule_preview_endpoint() {
    let ctx = TestContext::new().await;
    let server = create_server(&ctx);

    let response = server
        .post("/v1/schedules/preview")
        .add_header("Authorization", format!("Bearer {}", API_TOKEN))
        .json(&json!({
            "frequency": "monthly",
            "time_of_day": "09:00",
            "day_of_period": 31,
            "from": "2025-01-31T15:00:00Z",
            "count": 3
        }))
        .await;
    assert_eq!(response.status_code(), StatusCode::OK);

    let body: serde_json::Value = response.json();
    assert_eq!(body["timezone"], "America/New_York");
    let fire_at: Vec<&str> = body["occurrences"]
        .as_array()
        .unwrap()
        .iter()
        .map(|o| o["fire_at"].as_str().unwrap())
        .collect();
    // Day 31 clamps to the last day of shorter months
    assert_eq!(
        fire_at,
        vec![
            "2025-02-28T14:00:00Z",
            "2025-03-31T13:00:00Z",
            "2025-04-30T13:00:00Z"
        ]
    );
}

#[tokio::test]
async fn test_schedule_preview_rejects_invalid_input() {
    let ctx = TestContext::new().await;
    let server = create_server(&ctx);

    let response = server
        .post("/v1/schedules/preview")
        .add_header("Authorization", format!("Bearer {}", API_TOKEN))
        .json(&json!({ "frequency": "hourly", "time_of_day": "09:00" }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);

    let response = server
        .post("/v1/schedules/preview")
        .add_header("Authorization", format!("Bearer {}", API_TOKEN))
        .json(&json!({ "frequency": "daily", "time_of_day": "09:00", "count": 50 }))
        .await;
    assert_eq!(response.status_code(), StatusCode::BAD_REQUEST);
}
