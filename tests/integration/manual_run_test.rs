// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{reference_now, FailingDeliveries, TestContext};
use chrono::{Duration, Utc};
use reportrs::application::use_cases::report_dispatcher::{DispatchError, DispatchOptions};
use reportrs::domain::models::delivery::DeliveryStatus;
use reportrs::domain::models::report::ScheduledReport;
use std::sync::Arc;
use wiremock::matchers::method;
use wiremock::{Mock, ResponseTemplate};

#[tokio::test]
async fn test_run_now_delivers_and_keeps_schedule() {
    let ctx = TestContext::new().await;
    ctx.mock_generation_ok("On demand").await;

    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let next = reference_now() + Duration::days(1);
    let report = ctx
        .insert_due_report(owner, "Weekly review", (7, 0), Some(next))
        .await;

    let before = Utc::now();
    let response = ctx.dispatcher().run_now(report.id, owner).await.unwrap();

    assert!(response.success);
    assert_eq!(response.report_id, report.id);
    assert_eq!(response.content, "On demand");
    assert_eq!(response.delivered, 1);
    assert!(response.failed_recipients.is_empty());

    let stored = ctx.reload(report.id).await;
    assert_eq!(stored.next_fire_at, Some(next));
    assert!(stored.last_fired_at.unwrap() >= before);

    let deliveries = ctx.deliveries_for(report.id).await;
    assert_eq!(deliveries.len(), 1);
    assert!(deliveries[0].is_manual_run);
    assert!(deliveries[0].metadata.is_manual_run);
    assert_eq!(deliveries[0].status, DeliveryStatus::Sent);

    let requests = ctx.generator.received_requests().await.unwrap();
    let body: serde_json::Value = serde_json::from_slice(&requests[0].body).unwrap();
    assert_eq!(body["is_manual_run"], true);
}

#[tokio::test]
async fn test_run_now_works_for_manual_reports() {
    let ctx = TestContext::new().await;
    ctx.mock_generation_ok("Ad hoc").await;

    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let report = ctx
        .insert_report(ScheduledReport::new(owner, "Ad hoc", "Prompt"))
        .await;

    let response = ctx.dispatcher().run_now(report.id, owner).await.unwrap();
    assert!(response.success);

    let stored = ctx.reload(report.id).await;
    assert!(stored.last_fired_at.is_some());
    assert!(stored.next_fire_at.is_none());

    let body: serde_json::Value =
        serde_json::from_slice(&ctx.generator.received_requests().await.unwrap()[0].body)
            .unwrap();
    assert!(body["report_frequency"].is_null());
}

#[tokio::test]
async fn test_run_now_rejects_other_users() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string("unused"))
        .expect(0)
        .mount(&ctx.generator)
        .await;

    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let stranger = ctx.insert_user(None, Some("stranger@example.com")).await;
    let report = ctx
        .insert_report(ScheduledReport::new(owner, "Private", "Prompt"))
        .await;

    let err = ctx
        .dispatcher()
        .run_now(report.id, stranger)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::ReportNotFound));

    let err = ctx
        .dispatcher()
        .run_now(uuid::Uuid::new_v4(), owner)
        .await
        .unwrap_err();
    assert!(matches!(err, DispatchError::ReportNotFound));
}

#[tokio::test]
async fn test_run_now_generation_failure_is_an_error() {
    let ctx = TestContext::new().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .mount(&ctx.generator)
        .await;

    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let report = ctx
        .insert_report(ScheduledReport::new(owner, "Down", "Prompt"))
        .await;

    let err = ctx.dispatcher().run_now(report.id, owner).await.unwrap_err();
    assert!(matches!(err, DispatchError::Generation(_)));

    let stored = ctx.reload(report.id).await;
    assert!(stored.last_fired_at.is_none());
    assert!(ctx.deliveries_for(report.id).await.is_empty());
}

#[tokio::test]
async fn test_run_now_partial_delivery_reports_failure() {
    let ctx = TestContext::new().await;
    ctx.mock_generation_ok("Team body").await;

    let team_id = ctx.insert_team("Research").await;
    let owner = ctx.insert_user(Some(team_id), Some("owner@example.com")).await;
    let broken = ctx.insert_user(Some(team_id), Some("broken@example.com")).await;

    let mut report = ScheduledReport::new(owner, "Team run", "Prompt");
    report.is_team_report = true;
    let report = ctx.insert_report(report).await;

    let deliveries = Arc::new(FailingDeliveries {
        inner: ctx.deliveries.clone(),
        fail_for: vec![broken],
    });
    let dispatcher =
        ctx.dispatcher_with(ctx.generation_service(), deliveries, DispatchOptions::default());

    let response = dispatcher.run_now(report.id, owner).await.unwrap();
    assert!(!response.success);
    assert_eq!(response.delivered, 1);
    assert_eq!(response.failed_recipients, vec![broken]);
    assert_eq!(response.content, "Team body");

    let stored = ctx.reload(report.id).await;
    assert!(stored.last_fired_at.is_none());
}
