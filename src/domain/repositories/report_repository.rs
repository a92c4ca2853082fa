// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::report::ScheduledReport;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::DbErr;
use thiserror::Error;
use uuid::Uuid;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 条件更新未命中（租约丢失或状态已变化）
    #[error("Conflict: {0}")]
    Conflict(String),
}

/// 定时报告仓库特质
///
/// 定义定时报告数据访问接口。引擎只写入触发时间与租约列
#[async_trait]
pub trait ReportRepository: Send + Sync {
    /// 创建报告
    async fn create(&self, report: &ScheduledReport) -> Result<ScheduledReport, RepositoryError>;
    /// 根据ID查找报告
    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledReport>, RepositoryError>;
    /// 根据ID和所有者查找报告
    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<ScheduledReport>, RepositoryError>;
    /// 查找到期报告
    ///
    /// 仅返回定时、激活、`next_fire_at <= now` 且未被有效租约占用的报告，
    /// 按 `next_fire_at` 升序排列
    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<ScheduledReport>, RepositoryError>;
    /// 查找尚未计算首次触发时间的定时报告
    ///
    /// 按创建时间升序分页，`offset` 用于跳过无法布防的行
    async fn find_unarmed(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ScheduledReport>, RepositoryError>;
    /// 原子地认领一个到期报告
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 认领成功
    /// * `Ok(false)` - 报告已被其他工作器认领或不再到期
    async fn try_claim(
        &self,
        id: Uuid,
        token: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, RepositoryError>;
    /// 完成一次触发：推进触发时间并释放租约
    async fn complete_occurrence(
        &self,
        id: Uuid,
        token: Uuid,
        fired_at: DateTime<Utc>,
        next_fire_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    /// 释放租约，不修改触发时间
    async fn release_claim(&self, id: Uuid, token: Uuid) -> Result<(), RepositoryError>;
    /// 记录手动运行，只更新 `last_fired_at`
    async fn record_manual_run(
        &self,
        id: Uuid,
        fired_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError>;
    /// 为未调度的报告设置首次触发时间
    ///
    /// # 返回值
    ///
    /// * `Ok(false)` - 报告已被其他调用方设置
    async fn arm(&self, id: Uuid, next_fire_at: DateTime<Utc>) -> Result<bool, RepositoryError>;
}
