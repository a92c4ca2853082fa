// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::report_dispatcher::ReportDispatcher;
use crate::utils::errors::WorkerError;
use crate::workers::Worker;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

/// 进程内分发触发器
///
/// 按固定间隔调用与 `POST /v1/dispatch` 相同的入口，
/// 与外部触发并存时由租约保证不重复处理
pub struct DispatchWorker {
    dispatcher: Arc<ReportDispatcher>,
    interval: Duration,
}

impl DispatchWorker {
    pub fn new(dispatcher: Arc<ReportDispatcher>, interval: Duration) -> Self {
        Self {
            dispatcher,
            interval,
        }
    }

    /// 循环运行，直到任务被中止
    pub async fn run_forever(&self) {
        info!(
            "Dispatch worker started with interval {:?}",
            self.interval
        );

        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            interval.tick().await;

            if let Err(e) = self.run().await {
                error!("Dispatch pass failed: {}", e);
            }
        }
    }

    /// 启动后台运行
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(async move {
            self.run_forever().await;
        })
    }
}

#[async_trait]
impl Worker for DispatchWorker {
    async fn run(&self) -> Result<(), WorkerError> {
        let summary = self.dispatcher.dispatch_due().await?;
        debug!(
            "{} pass: processed={}, skipped={}",
            self.name(),
            summary.processed,
            summary.skipped
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "dispatch_worker"
    }
}
