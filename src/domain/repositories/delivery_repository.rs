// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::report_repository::RepositoryError;
use crate::domain::models::delivery::{DeliveryRecord, DeliveryStatus};
use async_trait::async_trait;
use uuid::Uuid;

/// 投递记录仓库特质
#[async_trait]
pub trait DeliveryRepository: Send + Sync {
    /// 写入投递记录
    async fn insert(&self, record: &DeliveryRecord) -> Result<DeliveryRecord, RepositoryError>;
    /// 将待发送记录迁移到终态
    ///
    /// 记录不处于 `Pending` 时返回 `RepositoryError::Conflict`
    async fn transition(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        error: Option<String>,
    ) -> Result<(), RepositoryError>;
    /// 查询报告的全部投递记录
    async fn find_by_report(&self, report_id: Uuid) -> Result<Vec<DeliveryRecord>, RepositoryError>;
}
