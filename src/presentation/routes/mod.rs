// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::application::use_cases::report_dispatcher::ReportDispatcher;
use crate::application::use_cases::schedule_preview::SchedulePreviewUseCase;
use crate::presentation::handlers::{dispatch_handler, report_handler, schedule_handler};
use crate::presentation::middleware::auth_middleware::{auth_middleware, AuthState};
use axum::{
    routing::{get, post},
    Extension, Json, Router,
};
use serde_json::{json, Value};
use std::sync::Arc;

/// 创建应用路由
///
/// # 参数
///
/// * `dispatcher` - 报告分发用例
/// * `preview` - 日程预览用例
/// * `auth_state` - 受保护接口的认证状态
///
/// # 返回值
///
/// 返回配置好的路由
pub fn routes(
    dispatcher: Arc<ReportDispatcher>,
    preview: SchedulePreviewUseCase,
    auth_state: AuthState,
) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health_check))
        .route("/v1/version", get(version));

    let protected_routes = Router::new()
        .route("/v1/dispatch", post(dispatch_handler::dispatch))
        .route("/v1/reports/{id}/run", post(report_handler::run_report))
        .route(
            "/v1/schedules/preview",
            post(schedule_handler::preview_schedule),
        )
        .layer(axum::middleware::from_fn_with_state(
            auth_state,
            auth_middleware,
        ))
        .layer(Extension(dispatcher))
        .layer(Extension(preview));

    Router::new().merge(public_routes).merge(protected_routes)
}

/// 健康检查端点
///
/// # 返回值
///
/// 返回"OK"字符串
pub async fn health_check() -> &'static str {
    "OK"
}

/// 版本信息端点
pub async fn version() -> Json<Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
