// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::{reference_now, TestContext};
use chrono::Duration;
use reportrs::domain::models::delivery::{DeliveryMetadata, DeliveryRecord, DeliveryStatus};
use reportrs::domain::repositories::delivery_repository::DeliveryRepository;
use reportrs::domain::repositories::directory_repository::DirectoryRepository;
use reportrs::domain::repositories::report_repository::{ReportRepository, RepositoryError};
use reportrs::infrastructure::repositories::directory_repo_impl::DirectoryRepositoryImpl;
use uuid::Uuid;

#[tokio::test]
async fn test_claim_is_exclusive_until_expiry() {
    let ctx = TestContext::new().await;
    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let now = reference_now();
    let report = ctx
        .insert_due_report(owner, "Claimed", (7, 0), Some(now - Duration::hours(1)))
        .await;

    let ttl = Duration::minutes(10);
    let first = Uuid::new_v4();
    let second = Uuid::new_v4();

    assert!(ctx.reports.try_claim(report.id, first, now, ttl).await.unwrap());
    assert!(!ctx.reports.try_claim(report.id, second, now, ttl).await.unwrap());

    // A claimed report is hidden from the scan
    assert!(ctx.reports.find_due(now, 10).await.unwrap().is_empty());

    // An expired claim can be taken over
    let later = now + Duration::minutes(11);
    assert!(ctx.reports.try_claim(report.id, second, later, ttl).await.unwrap());

    let stored = ctx.reload(report.id).await;
    assert_eq!(stored.claim_token, Some(second));
    assert_eq!(stored.claimed_until, Some(later + ttl));
}

#[tokio::test]
async fn test_claim_requires_due_report() {
    let ctx = TestContext::new().await;
    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let now = reference_now();
    let future = ctx
        .insert_due_report(owner, "Future", (7, 0), Some(now + Duration::hours(1)))
        .await;

    assert!(!ctx
        .reports
        .try_claim(future.id, Uuid::new_v4(), now, Duration::minutes(10))
        .await
        .unwrap());
}

#[tokio::test]
async fn test_complete_and_release_require_the_claim_token() {
    let ctx = TestContext::new().await;
    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let now = reference_now();
    let report = ctx
        .insert_due_report(owner, "Tokens", (7, 0), Some(now - Duration::hours(1)))
        .await;

    let token = Uuid::new_v4();
    assert!(ctx
        .reports
        .try_claim(report.id, token, now, Duration::minutes(10))
        .await
        .unwrap());

    let next = now + Duration::days(1);
    let err = ctx
        .reports
        .complete_occurrence(report.id, Uuid::new_v4(), now, next)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let err = ctx
        .reports
        .release_claim(report.id, Uuid::new_v4())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    ctx.reports
        .complete_occurrence(report.id, token, now, next)
        .await
        .unwrap();
    let stored = ctx.reload(report.id).await;
    assert_eq!(stored.last_fired_at, Some(now));
    assert_eq!(stored.next_fire_at, Some(next));
    assert!(stored.claim_token.is_none());

    // The claim is gone once the occurrence completed
    let err = ctx.reports.release_claim(report.id, token).await.unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));
}

#[tokio::test]
async fn test_arm_only_sets_missing_next_fire() {
    let ctx = TestContext::new().await;
    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let report = ctx.insert_due_report(owner, "Unarmed", (7, 0), None).await;

    let unarmed = ctx.reports.find_unarmed(10, 0).await.unwrap();
    assert_eq!(unarmed.len(), 1);

    let first = reference_now() + Duration::hours(1);
    assert!(ctx.reports.arm(report.id, first).await.unwrap());
    assert!(!ctx
        .reports
        .arm(report.id, first + Duration::days(1))
        .await
        .unwrap());

    assert_eq!(ctx.reload(report.id).await.next_fire_at, Some(first));
    assert!(ctx.reports.find_unarmed(10, 0).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_record_manual_run_missing_report() {
    let ctx = TestContext::new().await;
    let err = ctx
        .reports
        .record_manual_run(Uuid::new_v4(), reference_now())
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));
}

fn sample_record(report_id: Uuid, recipient: Uuid) -> DeliveryRecord {
    let metadata = DeliveryMetadata {
        report_id,
        title: "Sample".to_string(),
        report_schedule: Some("07:00".to_string()),
        report_frequency: Some("daily".to_string()),
        is_manual_run: false,
        executed_at: reference_now(),
        is_team_report: false,
        created_by_user_id: None,
        created_by_name: None,
    };
    DeliveryRecord::pending(
        recipient,
        Some("r@example.com".to_string()),
        "Body".to_string(),
        metadata,
        reference_now(),
    )
}

#[tokio::test]
async fn test_delivery_transitions_once() {
    let ctx = TestContext::new().await;
    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let report = ctx.insert_due_report(owner, "Deliveries", (7, 0), None).await;

    let record = ctx
        .deliveries
        .insert(&sample_record(report.id, owner))
        .await
        .unwrap();
    assert_eq!(record.status, DeliveryStatus::Pending);

    ctx.deliveries
        .transition(record.id, DeliveryStatus::Sent, None)
        .await
        .unwrap();

    let err = ctx
        .deliveries
        .transition(record.id, DeliveryStatus::Failed, Some("late".to_string()))
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Conflict(_)));

    let err = ctx
        .deliveries
        .transition(Uuid::new_v4(), DeliveryStatus::Sent, None)
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::NotFound));

    let stored = ctx.deliveries_for(report.id).await;
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].status, DeliveryStatus::Sent);
    assert_eq!(stored[0].metadata.title, "Sample");
    assert_eq!(stored[0].recipient_email.as_deref(), Some("r@example.com"));
}

#[tokio::test]
async fn test_directory_lookups() {
    let ctx = TestContext::new().await;
    let team_id = ctx.insert_team("Platform").await;
    let with_email = ctx.insert_user(Some(team_id), Some("a@example.com")).await;
    let blank = ctx.insert_user(Some(team_id), Some("  ")).await;

    let directory = DirectoryRepositoryImpl::new(ctx.db.clone());

    let user = directory.find_user(with_email).await.unwrap().unwrap();
    assert_eq!(user.email.as_deref(), Some("a@example.com"));
    assert_eq!(user.team_id, Some(team_id));

    let user = directory.find_user(blank).await.unwrap().unwrap();
    assert!(user.email.is_none());

    assert!(directory.find_user(Uuid::new_v4()).await.unwrap().is_none());
    assert_eq!(
        directory.find_team(team_id).await.unwrap().unwrap().name,
        "Platform"
    );

    let members = directory.list_team_members(team_id).await.unwrap();
    assert_eq!(members.len(), 2);
}
