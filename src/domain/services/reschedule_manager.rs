// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::report::{ScheduleError, ScheduledReport};
use crate::domain::repositories::report_repository::{ReportRepository, RepositoryError};
use crate::domain::services::recurrence_calculator::RecurrenceCalculator;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 重新调度错误
#[derive(Error, Debug)]
pub enum RescheduleError {
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 重新调度管理器
///
/// 负责触发完成后推进 `next_fire_at`、失败时释放租约、
/// 以及为新建的定时报告计算首次触发时间
#[derive(Clone)]
pub struct RescheduleManager {
    repo: Arc<dyn ReportRepository>,
    calculator: RecurrenceCalculator,
}

impl RescheduleManager {
    pub fn new(repo: Arc<dyn ReportRepository>, calculator: RecurrenceCalculator) -> Self {
        Self { repo, calculator }
    }

    /// 完成一次触发
    ///
    /// 写入 `last_fired_at = now`，按日程计算下一次触发时间，并在同一更新中释放租约
    ///
    /// # 参数
    ///
    /// * `report` - 已认领的报告
    /// * `token` - 租约令牌
    /// * `now` - 本轮分发的参考时刻
    ///
    /// # 返回值
    ///
    /// 新的下一次触发时间
    pub async fn complete(
        &self,
        report: &ScheduledReport,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>, RescheduleError> {
        let schedule = report.schedule()?;
        let next = self.calculator.next_fire_instant(&schedule, now)?;

        self.repo
            .complete_occurrence(report.id, token, now, next)
            .await?;

        info!(
            "Report {} rescheduled: next occurrence at {}",
            report.id, next
        );
        Ok(next)
    }

    /// 放弃本次触发
    ///
    /// 触发时间保持不变，仅释放租约，下一轮扫描会再次选中该报告
    pub async fn abandon(&self, report_id: Uuid, token: Uuid) {
        match self.repo.release_claim(report_id, token).await {
            Ok(()) => debug!("Released claim on report {}", report_id),
            Err(e) => warn!(
                "Failed to release claim on report {}; it will expire: {}",
                report_id, e
            ),
        }
    }

    /// 为尚未设置触发时间的定时报告计算首次触发时间
    ///
    /// # 返回值
    ///
    /// * `Ok(Some(instant))` - 已设置
    /// * `Ok(None)` - 报告不参与调度，或其他调用方已先行设置
    pub async fn arm(
        &self,
        report: &ScheduledReport,
        now: DateTime<Utc>,
    ) -> Result<Option<DateTime<Utc>>, RescheduleError> {
        if !report.is_dispatchable() {
            return Ok(None);
        }

        let schedule = report.schedule()?;
        let next = self.calculator.next_fire_instant(&schedule, now)?;

        if self.repo.arm(report.id, next).await? {
            info!("Report {} armed: first occurrence at {}", report.id, next);
            Ok(Some(next))
        } else {
            Ok(None)
        }
    }

    /// 记录一次成功的手动运行，`next_fire_at` 不受影响
    pub async fn record_manual_run(
        &self,
        report_id: Uuid,
        now: DateTime<Utc>,
    ) -> Result<(), RescheduleError> {
        self.repo.record_manual_run(report_id, now).await?;
        Ok(())
    }
}
