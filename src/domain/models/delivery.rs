// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 投递状态
///
/// 记录写入后只允许从 `Pending` 迁移到终态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Sent,
    Failed,
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeliveryStatus::Pending => write!(f, "pending"),
            DeliveryStatus::Sent => write!(f, "sent"),
            DeliveryStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for DeliveryStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(DeliveryStatus::Pending),
            "sent" => Ok(DeliveryStatus::Sent),
            "failed" => Ok(DeliveryStatus::Failed),
            other => Err(format!("Unknown delivery status: {}", other)),
        }
    }
}

/// 投递附带的报告元数据
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryMetadata {
    pub report_id: Uuid,
    pub title: String,
    pub report_schedule: Option<String>,
    pub report_frequency: Option<String>,
    pub is_manual_run: bool,
    pub executed_at: DateTime<Utc>,
    pub is_team_report: bool,
    pub created_by_user_id: Option<Uuid>,
    /// 团队报告时为所有者姓名
    pub created_by_name: Option<String>,
}

/// 投递记录
///
/// 每个 (触发, 接收者) 对应一行
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryRecord {
    pub id: Uuid,
    pub report_id: Uuid,
    pub recipient_user_id: Uuid,
    pub recipient_email: Option<String>,
    pub status: DeliveryStatus,
    pub content: Option<String>,
    pub error: Option<String>,
    pub is_manual_run: bool,
    pub metadata: DeliveryMetadata,
    /// 所属触发的时间
    pub fired_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl DeliveryRecord {
    /// 创建待发送的投递记录
    pub fn pending(
        recipient_user_id: Uuid,
        recipient_email: Option<String>,
        content: String,
        metadata: DeliveryMetadata,
        fired_at: DateTime<Utc>,
    ) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            report_id: metadata.report_id,
            recipient_user_id,
            recipient_email,
            status: DeliveryStatus::Pending,
            content: Some(content),
            error: None,
            is_manual_run: metadata.is_manual_run,
            metadata,
            fired_at,
            created_at: now,
            updated_at: now,
        }
    }

    /// 创建失败的投递记录
    pub fn failed(
        recipient_user_id: Uuid,
        recipient_email: Option<String>,
        error: String,
        metadata: DeliveryMetadata,
        fired_at: DateTime<Utc>,
    ) -> Self {
        let mut record = Self::pending(
            recipient_user_id,
            recipient_email,
            String::new(),
            metadata,
            fired_at,
        );
        record.status = DeliveryStatus::Failed;
        record.content = None;
        record.error = Some(error);
        record
    }
}
