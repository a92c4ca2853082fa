// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::delivery::{DeliveryMetadata, DeliveryRecord, DeliveryStatus};
use crate::domain::models::directory::Recipient;
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::report_repository::RepositoryError;
use chrono::{DateTime, Utc};
use futures::future::join_all;
use metrics::counter;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, warn};
use uuid::Uuid;

/// 单个接收者的投递结果
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DeliveryOutcome {
    pub recipient_user_id: Uuid,
    pub recipient_email: Option<String>,
    /// 已写入的投递记录ID
    pub delivery_id: Option<Uuid>,
    pub status: DeliveryStatus,
    pub error: Option<String>,
}

impl DeliveryOutcome {
    pub fn is_sent(&self) -> bool {
        self.status == DeliveryStatus::Sent
    }
}

/// 一次触发的投递汇总
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DeliveryReport {
    pub outcomes: Vec<DeliveryOutcome>,
}

impl DeliveryReport {
    /// 所有接收者都已写入成功
    pub fn all_succeeded(&self) -> bool {
        !self.outcomes.is_empty() && self.outcomes.iter().all(DeliveryOutcome::is_sent)
    }

    pub fn delivered(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_sent()).count()
    }

    /// 失败接收者的用户ID
    pub fn failed_recipients(&self) -> Vec<Uuid> {
        self.outcomes
            .iter()
            .filter(|o| !o.is_sent())
            .map(|o| o.recipient_user_id)
            .collect()
    }

    /// 汇总的失败原因
    pub fn failure_summary(&self) -> Option<String> {
        let failed: Vec<String> = self
            .outcomes
            .iter()
            .filter(|o| !o.is_sent())
            .map(|o| {
                format!(
                    "{}: {}",
                    o.recipient_user_id,
                    o.error.as_deref().unwrap_or("unknown error")
                )
            })
            .collect();

        if failed.is_empty() {
            None
        } else {
            Some(format!(
                "Failed to deliver to {} of {} recipients ({})",
                failed.len(),
                self.outcomes.len(),
                failed.join("; ")
            ))
        }
    }
}

/// 投递持久化器
///
/// 为每个接收者独立写入一条投递记录，所有写入都会被尝试，
/// 单个接收者失败不影响其他接收者
#[derive(Clone)]
pub struct DeliveryPersister {
    repo: Arc<dyn DeliveryRepository>,
    write_timeout: Duration,
}

impl DeliveryPersister {
    /// 创建新的投递持久化器
    ///
    /// # 参数
    ///
    /// * `repo` - 投递记录仓库
    /// * `write_timeout` - 单个接收者写入的超时
    pub fn new(repo: Arc<dyn DeliveryRepository>, write_timeout: Duration) -> Self {
        Self {
            repo,
            write_timeout,
        }
    }

    /// 为接收者列表写入投递记录
    ///
    /// # 参数
    ///
    /// * `content` - 报告正文
    /// * `metadata` - 投递元数据
    /// * `recipients` - 接收者
    /// * `fired_at` - 触发时刻
    ///
    /// # 返回值
    ///
    /// 每个接收者一条结果
    pub async fn persist(
        &self,
        content: &str,
        metadata: &DeliveryMetadata,
        recipients: &[Recipient],
        fired_at: DateTime<Utc>,
    ) -> DeliveryReport {
        let writes = recipients
            .iter()
            .map(|recipient| self.persist_one(content, metadata, recipient, fired_at));

        DeliveryReport {
            outcomes: join_all(writes).await,
        }
    }

    async fn persist_one(
        &self,
        content: &str,
        metadata: &DeliveryMetadata,
        recipient: &Recipient,
        fired_at: DateTime<Utc>,
    ) -> DeliveryOutcome {
        let Some(email) = recipient.email.clone() else {
            return self.record_missing_email(metadata, recipient, fired_at).await;
        };

        let record = DeliveryRecord::pending(
            recipient.user_id,
            Some(email.clone()),
            content.to_string(),
            metadata.clone(),
            fired_at,
        );
        let delivery_id = record.id;

        let result = tokio::time::timeout(self.write_timeout, async {
            self.repo.insert(&record).await?;
            self.repo
                .transition(delivery_id, DeliveryStatus::Sent, None)
                .await?;
            Ok::<(), RepositoryError>(())
        })
        .await;

        let failure = match result {
            Ok(Ok(())) => {
                counter!("report_deliveries_total", "status" => "sent").increment(1);
                return DeliveryOutcome {
                    recipient_user_id: recipient.user_id,
                    recipient_email: Some(email),
                    delivery_id: Some(delivery_id),
                    status: DeliveryStatus::Sent,
                    error: None,
                };
            }
            Ok(Err(e)) => e.to_string(),
            Err(_) => format!("Delivery write timed out after {:?}", self.write_timeout),
        };

        error!(
            "Failed to deliver report {} to user {}: {}",
            metadata.report_id, recipient.user_id, failure
        );
        counter!("report_deliveries_total", "status" => "failed").increment(1);

        // A record left pending by a failed transition is finalized when possible
        if let Err(e) = self
            .repo
            .transition(delivery_id, DeliveryStatus::Failed, Some(failure.clone()))
            .await
        {
            if !matches!(e, RepositoryError::NotFound) {
                warn!("Could not mark delivery {} as failed: {}", delivery_id, e);
            }
        }

        DeliveryOutcome {
            recipient_user_id: recipient.user_id,
            recipient_email: Some(email),
            delivery_id: None,
            status: DeliveryStatus::Failed,
            error: Some(failure),
        }
    }

    async fn record_missing_email(
        &self,
        metadata: &DeliveryMetadata,
        recipient: &Recipient,
        fired_at: DateTime<Utc>,
    ) -> DeliveryOutcome {
        let reason = "Recipient has no email address".to_string();
        warn!(
            "Skipping delivery of report {} to user {}: {}",
            metadata.report_id, recipient.user_id, reason
        );
        counter!("report_deliveries_total", "status" => "failed").increment(1);

        let record = DeliveryRecord::failed(
            recipient.user_id,
            None,
            reason.clone(),
            metadata.clone(),
            fired_at,
        );
        let delivery_id =
            match tokio::time::timeout(self.write_timeout, self.repo.insert(&record)).await {
                Ok(Ok(stored)) => Some(stored.id),
                Ok(Err(e)) => {
                    warn!("Could not record failed delivery for {}: {}", recipient.user_id, e);
                    None
                }
                Err(_) => None,
            };

        DeliveryOutcome {
            recipient_user_id: recipient.user_id,
            recipient_email: None,
            delivery_id,
            status: DeliveryStatus::Failed,
            error: Some(reason),
        }
    }
}

#[cfg(test)]
#[path = "delivery_persister_test.rs"]
mod tests;
