// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 单个报告在本轮分发中的结果
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccurrenceResultDto {
    pub report_id: Uuid,
    pub report_title: String,
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// 成功后推进到的下一次触发时间
    #[serde(skip_serializing_if = "Option::is_none")]
    pub next_fire_at: Option<DateTime<Utc>>,
    pub delivered: usize,
    pub failed_recipients: Vec<Uuid>,
}

impl OccurrenceResultDto {
    pub fn failed(report_id: Uuid, report_title: &str, error: impl Into<String>) -> Self {
        Self {
            report_id,
            report_title: report_title.to_string(),
            success: false,
            error: Some(error.into()),
            next_fire_at: None,
            delivered: 0,
            failed_recipients: Vec::new(),
        }
    }
}

/// 一轮分发的汇总
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchSummaryDto {
    pub success: bool,
    pub message: String,
    pub checked_at: DateTime<Utc>,
    /// 本轮首次计算触发时间的报告数
    pub armed: usize,
    /// 本轮认领并处理的报告数
    pub processed: usize,
    pub succeeded: usize,
    pub failed: usize,
    /// 被其他工作器先行认领的到期报告数
    pub skipped: usize,
    pub results: Vec<OccurrenceResultDto>,
}

impl DispatchSummaryDto {
    /// 由各报告结果汇总
    pub fn from_results(
        checked_at: DateTime<Utc>,
        armed: usize,
        skipped: usize,
        results: Vec<OccurrenceResultDto>,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.success).count();
        let failed = results.len() - succeeded;
        let message = if results.is_empty() {
            "No reports due".to_string()
        } else {
            format!(
                "Processed {} reports: {} succeeded, {} failed",
                results.len(),
                succeeded,
                failed
            )
        };

        Self {
            success: true,
            message,
            checked_at,
            armed,
            processed: results.len(),
            succeeded,
            failed,
            skipped,
            results,
        }
    }
}
