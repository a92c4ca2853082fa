// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// 立即运行请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct RunReportRequestDto {
    /// 发起运行的用户，必须是报告所有者
    pub user_id: Uuid,
}

/// 立即运行结果
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct RunReportResponseDto {
    pub success: bool,
    pub report_id: Uuid,
    pub content: String,
    pub delivered: usize,
    pub failed_recipients: Vec<Uuid>,
}
