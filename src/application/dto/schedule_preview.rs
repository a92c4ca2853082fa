// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 预览返回的最大触发次数
pub const MAX_PREVIEW_COUNT: usize = 10;

/// 日程预览请求
#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct SchedulePreviewRequestDto {
    #[validate(length(min = 1))]
    pub frequency: String,
    /// HH:MM
    #[validate(length(min = 4, max = 8))]
    pub time_of_day: String,
    #[validate(range(min = 0, max = 31))]
    pub day_of_period: Option<i32>,
    /// 参考时刻，缺省为当前时间
    pub from: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 10))]
    pub count: Option<usize>,
}

/// 单次触发的预览
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct PreviewOccurrenceDto {
    pub fire_at: DateTime<Utc>,
    /// 民用时区下的本地时间（RFC 3339）
    pub local: String,
}

/// 日程预览结果
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SchedulePreviewResponseDto {
    pub timezone: String,
    pub from: DateTime<Utc>,
    pub occurrences: Vec<PreviewOccurrenceDto>,
}
