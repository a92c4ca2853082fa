// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::directory::OwnerContext;
use crate::domain::models::report::ScheduledReport;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// 生成服务错误
#[derive(Error, Debug)]
pub enum GenerationError {
    /// 非 2xx 响应
    #[error("Generation service returned {status}: {body}")]
    Status { status: u16, body: String },
    /// 请求超时
    #[error("Generation service timed out after {0:?}")]
    Timeout(Duration),
    /// 网络或连接错误
    #[error("Generation service transport error: {0}")]
    Transport(String),
    /// 响应体读取失败
    #[error("Failed to read generation response: {0}")]
    Decode(String),
}

impl GenerationError {
    /// 指标标签
    pub fn reason(&self) -> &'static str {
        match self {
            GenerationError::Status { .. } => "http_error",
            GenerationError::Timeout(_) => "timeout",
            GenerationError::Transport(_) => "network_error",
            GenerationError::Decode(_) => "decode_error",
        }
    }
}

/// 发送给生成服务的请求体
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub prompt: String,
    pub user_id: Uuid,
    pub user_email: String,
    /// 缺省为邮箱
    pub user_name: String,
    pub team_id: Option<Uuid>,
    /// 没有团队时为空字符串
    pub team_name: String,
    pub role: String,
    pub view_financial: bool,
    pub report_title: String,
    pub report_schedule: Option<String>,
    pub report_frequency: Option<String>,
    pub is_manual_run: bool,
    pub is_team_report: bool,
    pub created_by_user_id: Option<Uuid>,
    pub executed_at: DateTime<Utc>,
}

impl GenerationRequest {
    /// 由报告和所有者上下文组装请求
    ///
    /// # 参数
    ///
    /// * `report` - 报告
    /// * `owner` - 所有者上下文
    /// * `is_manual_run` - 是否为用户触发的立即运行
    /// * `executed_at` - 触发时刻
    pub fn for_report(
        report: &ScheduledReport,
        owner: &OwnerContext,
        is_manual_run: bool,
        executed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            prompt: report.prompt.clone(),
            user_id: owner.user_id,
            user_email: owner.email.clone(),
            user_name: owner
                .name
                .clone()
                .filter(|name| !name.trim().is_empty())
                .unwrap_or_else(|| owner.email.clone()),
            team_id: owner.team_id,
            team_name: owner.team_name.clone().unwrap_or_default(),
            role: owner.role.clone(),
            view_financial: owner.view_financial,
            report_title: report.title.clone(),
            report_schedule: report.schedule_time.clone(),
            report_frequency: report.schedule_frequency.clone(),
            is_manual_run,
            is_team_report: report.is_team_report,
            created_by_user_id: report.created_by_user_id,
            executed_at,
        }
    }
}

/// 内容生成服务特质
///
/// 外部生成服务的边界，一次调用对应一次触发，不做重试
#[async_trait]
pub trait GenerationService: Send + Sync {
    /// 生成报告正文
    ///
    /// # 参数
    ///
    /// * `request` - 生成请求
    ///
    /// # 返回值
    ///
    /// * `Ok(String)` - 报告正文
    /// * `Err(GenerationError)` - 生成失败
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError>;
}

#[cfg(test)]
#[path = "generation_service_test.rs"]
mod tests;
