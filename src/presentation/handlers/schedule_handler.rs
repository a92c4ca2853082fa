// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::schedule_preview::{
    SchedulePreviewRequestDto, SchedulePreviewResponseDto,
};
use crate::application::use_cases::schedule_preview::SchedulePreviewUseCase;
use crate::presentation::errors::AppError;
use axum::{Extension, Json};
use validator::Validate;

/// 预览日程接下来的触发时刻
pub async fn preview_schedule(
    Extension(use_case): Extension<SchedulePreviewUseCase>,
    Json(payload): Json<SchedulePreviewRequestDto>,
) -> Result<Json<SchedulePreviewResponseDto>, AppError> {
    payload.validate()?;
    let preview = use_case.preview(&payload)?;
    Ok(Json(preview))
}
