// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::{
    application::dto::{
        dispatch_summary::{DispatchSummaryDto, OccurrenceResultDto},
        run_report::RunReportResponseDto,
    },
    config::settings::DispatchSettings,
    domain::{
        models::{delivery::DeliveryMetadata, report::ScheduleError, report::ScheduledReport},
        repositories::report_repository::{ReportRepository, RepositoryError},
        services::{
            delivery_persister::{DeliveryPersister, DeliveryReport},
            generation_service::{GenerationError, GenerationRequest, GenerationService},
            recipient_resolver::{OwnerLookupError, RecipientResolver},
            reschedule_manager::{RescheduleError, RescheduleManager},
        },
    },
};
use chrono::{DateTime, Utc};
use futures::{stream, FutureExt, StreamExt};
use metrics::counter;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Report not found or access denied")]
    ReportNotFound,
    #[error(transparent)]
    Owner(#[from] OwnerLookupError),
    #[error("Invalid schedule: {0}")]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Generation(#[from] GenerationError),
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

impl From<RescheduleError> for DispatchError {
    fn from(err: RescheduleError) -> Self {
        match err {
            RescheduleError::Schedule(e) => DispatchError::Schedule(e),
            RescheduleError::Repository(e) => DispatchError::Repository(e),
        }
    }
}

/// 分发运行参数
#[derive(Debug, Clone, Copy)]
pub struct DispatchOptions {
    pub batch_size: u64,
    pub concurrency: usize,
    pub claim_ttl: chrono::Duration,
}

impl From<&DispatchSettings> for DispatchOptions {
    fn from(settings: &DispatchSettings) -> Self {
        Self {
            batch_size: settings.batch_size.max(1),
            concurrency: settings.concurrency.max(1),
            claim_ttl: chrono::Duration::seconds(settings.claim_ttl_secs as i64),
        }
    }
}

impl Default for DispatchOptions {
    fn default() -> Self {
        Self {
            batch_size: 100,
            concurrency: 4,
            claim_ttl: chrono::Duration::minutes(10),
        }
    }
}

/// 一次执行（生成 + 投递）的产出
struct Execution {
    content: String,
    deliveries: DeliveryReport,
}

enum Processed {
    /// 已被其他工作器认领
    Skipped,
    Done(OccurrenceResultDto),
}

/// 报告分发用例
///
/// 扫描到期报告，逐个认领后执行 解析接收者 → 生成 → 投递 → 重新调度。
/// 不同报告并发处理，单个报告内部严格顺序执行
#[derive(Clone)]
pub struct ReportDispatcher {
    reports: Arc<dyn ReportRepository>,
    resolver: RecipientResolver,
    generator: Arc<dyn GenerationService>,
    persister: DeliveryPersister,
    rescheduler: RescheduleManager,
    options: DispatchOptions,
}

impl ReportDispatcher {
    pub fn new(
        reports: Arc<dyn ReportRepository>,
        resolver: RecipientResolver,
        generator: Arc<dyn GenerationService>,
        persister: DeliveryPersister,
        rescheduler: RescheduleManager,
        options: DispatchOptions,
    ) -> Self {
        Self {
            reports,
            resolver,
            generator,
            persister,
            rescheduler,
            options,
        }
    }

    /// 以当前时间执行一轮分发
    pub async fn dispatch_due(&self) -> Result<DispatchSummaryDto, DispatchError> {
        self.dispatch_due_at(Utc::now()).await
    }

    /// 以给定的参考时刻执行一轮分发
    ///
    /// 可重入：并发调用通过租约保证同一次触发只被处理一次
    ///
    /// # 参数
    ///
    /// * `now` - 本轮的参考时刻，用于到期判断。认领、执行和计算下一次触发
    ///   使用认领时刻，即 `now` 加上本轮已经过的时间
    ///
    /// # 返回值
    ///
    /// * `Ok(DispatchSummaryDto)` - 本轮汇总，单个报告失败不会使整轮失败
    /// * `Err(DispatchError)` - 到期扫描失败
    pub async fn dispatch_due_at(
        &self,
        now: DateTime<Utc>,
    ) -> Result<DispatchSummaryDto, DispatchError> {
        counter!("report_dispatch_passes_total").increment(1);
        let started = Instant::now();

        let armed = self.arm_unscheduled(now).await?;
        let due = self.reports.find_due(now, self.options.batch_size).await?;
        if !due.is_empty() {
            info!("Dispatch pass at {}: {} reports due", now, due.len());
        }

        let processed: Vec<Processed> = stream::iter(due)
            .map(|report| self.process_guarded(report, now, started))
            .buffered(self.options.concurrency)
            .collect()
            .await;

        let mut skipped = 0;
        let mut results = Vec::with_capacity(processed.len());
        for outcome in processed {
            match outcome {
                Processed::Skipped => skipped += 1,
                Processed::Done(result) => results.push(result),
            }
        }

        let summary = DispatchSummaryDto::from_results(now, armed, skipped, results);
        info!(
            "Dispatch pass complete: armed={}, processed={}, succeeded={}, failed={}, skipped={}",
            summary.armed, summary.processed, summary.succeeded, summary.failed, summary.skipped
        );
        Ok(summary)
    }

    /// 立即运行报告
    ///
    /// 只更新 `last_fired_at`（仅在全部投递成功时），不影响 `next_fire_at`
    ///
    /// # 参数
    ///
    /// * `report_id` - 报告ID
    /// * `owner_id` - 发起用户，必须是报告所有者
    pub async fn run_now(
        &self,
        report_id: Uuid,
        owner_id: Uuid,
    ) -> Result<RunReportResponseDto, DispatchError> {
        let report = self
            .reports
            .find_by_id_and_owner(report_id, owner_id)
            .await?
            .ok_or(DispatchError::ReportNotFound)?;

        let now = Utc::now();
        info!("Manual run of report {} requested by {}", report.id, owner_id);

        let execution = match self.execute(&report, true, now).await {
            Ok(execution) => execution,
            Err(e) => {
                error!("Manual run of report {} failed: {}", report.id, e);
                counter!("report_manual_runs_total", "outcome" => "failed").increment(1);
                return Err(e);
            }
        };

        let success = execution.deliveries.all_succeeded();
        if success {
            self.rescheduler.record_manual_run(report.id, now).await?;
            counter!("report_manual_runs_total", "outcome" => "succeeded").increment(1);
        } else {
            warn!(
                "Manual run of report {} partially failed: {}",
                report.id,
                execution
                    .deliveries
                    .failure_summary()
                    .unwrap_or_default()
            );
            counter!("report_manual_runs_total", "outcome" => "failed").increment(1);
        }

        Ok(RunReportResponseDto {
            success,
            report_id: report.id,
            delivered: execution.deliveries.delivered(),
            failed_recipients: execution.deliveries.failed_recipients(),
            content: execution.content,
        })
    }

    /// 为缺少 `next_fire_at` 的报告计算首次触发
    ///
    /// 无法布防的行仍留在未布防集合中，翻页时跳过它们，避免阻塞较新的报告
    async fn arm_unscheduled(&self, now: DateTime<Utc>) -> Result<usize, DispatchError> {
        let limit = self.options.batch_size;
        let mut armed = 0;
        let mut stuck = 0u64;

        loop {
            let page = self.reports.find_unarmed(limit, stuck).await?;
            let fetched = page.len() as u64;

            for report in page {
                match self.rescheduler.arm(&report, now).await {
                    Ok(Some(_)) => armed += 1,
                    Ok(None) => debug!("Report {} was armed concurrently", report.id),
                    Err(e) => {
                        warn!("Cannot arm report {}: {}", report.id, e);
                        stuck += 1;
                    }
                }
            }

            if fetched < limit || armed as u64 >= limit {
                break;
            }
        }

        Ok(armed)
    }

    /// 单个报告的边界：任何 panic 都被捕获并记录为失败
    async fn process_guarded(
        &self,
        report: ScheduledReport,
        now: DateTime<Utc>,
        started: Instant,
    ) -> Processed {
        let report_id = report.id;
        let title = report.title.clone();
        let token = Uuid::new_v4();

        match AssertUnwindSafe(self.process(report, token, now, started))
            .catch_unwind()
            .await
        {
            Ok(processed) => processed,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Processing of report {} panicked: {}", report_id, message);
                self.rescheduler.abandon(report_id, token).await;
                counter!("report_occurrences_total", "outcome" => "failed").increment(1);
                Processed::Done(OccurrenceResultDto::failed(
                    report_id,
                    &title,
                    format!("Report processing panicked: {}", message),
                ))
            }
        }
    }

    async fn process(
        &self,
        report: ScheduledReport,
        token: Uuid,
        now: DateTime<Utc>,
        started: Instant,
    ) -> Processed {
        // The lease starts when the claim is taken, not when the pass started
        let claimed_at = now
            + chrono::Duration::from_std(started.elapsed())
                .unwrap_or_else(|_| chrono::Duration::zero());

        match self
            .reports
            .try_claim(report.id, token, claimed_at, self.options.claim_ttl)
            .await
        {
            Ok(true) => {}
            Ok(false) => {
                debug!("Report {} already claimed by another worker", report.id);
                counter!("report_claim_conflicts_total").increment(1);
                counter!("report_occurrences_total", "outcome" => "skipped").increment(1);
                return Processed::Skipped;
            }
            Err(e) => {
                error!("Failed to claim report {}: {}", report.id, e);
                counter!("report_occurrences_total", "outcome" => "failed").increment(1);
                return Processed::Done(OccurrenceResultDto::failed(
                    report.id,
                    &report.title,
                    e.to_string(),
                ));
            }
        }

        let result = self.fire(&report, token, claimed_at).await;
        if result.success {
            counter!("report_occurrences_total", "outcome" => "succeeded").increment(1);
        } else {
            // Leaves next_fire_at untouched so the next pass selects the report again
            self.rescheduler.abandon(report.id, token).await;
            counter!("report_occurrences_total", "outcome" => "failed").increment(1);
        }
        Processed::Done(result)
    }

    async fn fire(
        &self,
        report: &ScheduledReport,
        token: Uuid,
        claimed_at: DateTime<Utc>,
    ) -> OccurrenceResultDto {
        if let Err(e) = report.schedule() {
            error!("Report {} has an invalid schedule: {}", report.id, e);
            return OccurrenceResultDto::failed(
                report.id,
                &report.title,
                DispatchError::from(e).to_string(),
            );
        }

        let execution = match self.execute(report, false, claimed_at).await {
            Ok(execution) => execution,
            Err(e) => {
                error!("Occurrence of report {} failed: {}", report.id, e);
                return OccurrenceResultDto::failed(report.id, &report.title, e.to_string());
            }
        };

        let deliveries = execution.deliveries;
        let mut result = OccurrenceResultDto {
            report_id: report.id,
            report_title: report.title.clone(),
            success: false,
            error: None,
            next_fire_at: None,
            delivered: deliveries.delivered(),
            failed_recipients: deliveries.failed_recipients(),
        };

        if !deliveries.all_succeeded() {
            let summary = deliveries.failure_summary().unwrap_or_default();
            error!("Occurrence of report {} failed: {}", report.id, summary);
            result.error = Some(summary);
            return result;
        }

        match self.rescheduler.complete(report, token, claimed_at).await {
            Ok(next) => {
                result.success = true;
                result.next_fire_at = Some(next);
            }
            Err(e) => {
                error!("Failed to reschedule report {}: {}", report.id, e);
                result.error = Some(DispatchError::from(e).to_string());
            }
        }
        result
    }

    /// 解析接收者 → 生成 → 投递
    async fn execute(
        &self,
        report: &ScheduledReport,
        is_manual_run: bool,
        executed_at: DateTime<Utc>,
    ) -> Result<Execution, DispatchError> {
        let owner = self.resolver.owner_context(report.owner_id).await?;
        let recipients = self.resolver.resolve(&owner, report).await;

        let request = GenerationRequest::for_report(report, &owner, is_manual_run, executed_at);
        let content = self.generator.generate(&request).await?;

        let metadata = DeliveryMetadata {
            report_id: report.id,
            title: report.title.clone(),
            report_schedule: report.schedule_time.clone(),
            report_frequency: report.schedule_frequency.clone(),
            is_manual_run,
            executed_at,
            is_team_report: report.is_team_report,
            created_by_user_id: report.created_by_user_id,
            created_by_name: if report.is_team_report {
                owner.name.clone()
            } else {
                None
            },
        };

        let deliveries = self
            .persister
            .persist(&content, &metadata, &recipients, executed_at)
            .await;

        Ok(Execution {
            content,
            deliveries,
        })
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
#[path = "report_dispatcher_test.rs"]
mod tests;
