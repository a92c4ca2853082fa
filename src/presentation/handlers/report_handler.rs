// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::run_report::{RunReportRequestDto, RunReportResponseDto};
use crate::application::use_cases::report_dispatcher::ReportDispatcher;
use crate::presentation::errors::AppError;
use axum::{extract::Path, Extension, Json};
use std::sync::Arc;
use uuid::Uuid;
use validator::Validate;

/// 立即运行报告
///
/// 仅报告所有者可以运行，其他情况返回 404
pub async fn run_report(
    Extension(dispatcher): Extension<Arc<ReportDispatcher>>,
    Path(report_id): Path<Uuid>,
    Json(payload): Json<RunReportRequestDto>,
) -> Result<Json<RunReportResponseDto>, AppError> {
    payload.validate()?;
    let response = dispatcher.run_now(report_id, payload.user_id).await?;
    Ok(Json(response))
}
