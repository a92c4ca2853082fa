// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::helpers::TestContext;
use chrono::{Duration, Utc};
use reportrs::domain::models::delivery::DeliveryStatus;
use reportrs::utils::errors::WorkerError;
use reportrs::workers::dispatch_worker::DispatchWorker;
use reportrs::workers::Worker;
use sea_orm::ConnectionTrait;
use std::sync::Arc;

#[tokio::test]
async fn test_worker_run_fires_due_reports() {
    let ctx = TestContext::new().await;
    ctx.mock_generation_ok("Polled body").await;

    let owner = ctx.insert_user(None, Some("owner@example.com")).await;
    let report = ctx
        .insert_due_report(owner, "Polled", (7, 0), Some(Utc::now() - Duration::hours(2)))
        .await;

    let worker = DispatchWorker::new(
        Arc::new(ctx.dispatcher()),
        std::time::Duration::from_secs(60),
    );
    assert_eq!(worker.name(), "dispatch_worker");

    worker.run().await.unwrap();

    let deliveries = ctx.deliveries_for(report.id).await;
    assert_eq!(deliveries.len(), 1);
    assert_eq!(deliveries[0].status, DeliveryStatus::Sent);

    let stored = ctx.reload(report.id).await;
    assert!(stored.next_fire_at.unwrap() > Utc::now());

    // A second pass finds nothing left to fire
    worker.run().await.unwrap();
    assert_eq!(ctx.deliveries_for(report.id).await.len(), 1);
}

#[tokio::test]
async fn test_worker_run_surfaces_dispatch_errors() {
    let ctx = TestContext::new().await;
    ctx.db
        .execute_unprepared("DROP TABLE scheduled_reports")
        .await
        .unwrap();

    let worker = DispatchWorker::new(
        Arc::new(ctx.dispatcher()),
        std::time::Duration::from_secs(60),
    );
    let err = worker.run().await.unwrap_err();
    assert!(matches!(err, WorkerError::Dispatch(_)));
    assert!(err.to_string().starts_with("分发错误"));
}
