// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::dto::dispatch_summary::DispatchSummaryDto;
use crate::application::use_cases::report_dispatcher::ReportDispatcher;
use crate::presentation::errors::AppError;
use axum::{Extension, Json};
use std::sync::Arc;

/// 外部触发一轮分发
///
/// 参考时刻由服务端取当前时间
pub async fn dispatch(
    Extension(dispatcher): Extension<Arc<ReportDispatcher>>,
) -> Result<Json<DispatchSummaryDto>, AppError> {
    let summary = dispatcher.dispatch_due().await?;
    Ok(Json(summary))
}
