// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::schedule_preview::{
    PreviewOccurrenceDto, SchedulePreviewRequestDto, SchedulePreviewResponseDto, MAX_PREVIEW_COUNT,
};
use crate::domain::models::report::{Frequency, Schedule, ScheduleError, TimeOfDay};
use crate::domain::services::recurrence_calculator::RecurrenceCalculator;
use chrono::Utc;

/// 日程预览用例
///
/// 与分发共用同一个触发时间计算器
#[derive(Debug, Clone, Copy)]
pub struct SchedulePreviewUseCase {
    calculator: RecurrenceCalculator,
}

impl SchedulePreviewUseCase {
    pub fn new(calculator: RecurrenceCalculator) -> Self {
        Self { calculator }
    }

    /// 计算接下来的若干次触发时刻
    pub fn preview(
        &self,
        request: &SchedulePreviewRequestDto,
    ) -> Result<SchedulePreviewResponseDto, ScheduleError> {
        let frequency: Frequency = request.frequency.parse()?;
        let time_of_day: TimeOfDay = request.time_of_day.parse()?;
        let schedule = Schedule::new(frequency, time_of_day, request.day_of_period)?;

        let from = request.from.unwrap_or_else(Utc::now);
        let count = request.count.unwrap_or(1).clamp(1, MAX_PREVIEW_COUNT);

        let occurrences = self
            .calculator
            .upcoming(&schedule, from, count)?
            .into_iter()
            .map(|fire_at| PreviewOccurrenceDto {
                fire_at,
                local: self.calculator.to_civil(fire_at).to_rfc3339(),
            })
            .collect();

        Ok(SchedulePreviewResponseDto {
            timezone: self.calculator.timezone().name().to_string(),
            from,
            occurrences,
        })
    }
}
