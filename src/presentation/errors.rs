// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::error;

use crate::application::use_cases::report_dispatcher::DispatchError;
use crate::domain::models::report::ScheduleError;
use crate::domain::repositories::report_repository::RepositoryError;
use crate::domain::services::recipient_resolver::OwnerLookupError;

/// 应用错误类型
///
/// 封装所有可能的应用层错误，提供统一的错误处理接口
#[derive(Debug)]
pub struct AppError(anyhow::Error);

impl AppError {
    fn status(&self) -> StatusCode {
        if let Some(err) = self.0.downcast_ref::<DispatchError>() {
            return match err {
                DispatchError::ReportNotFound => StatusCode::NOT_FOUND,
                DispatchError::Owner(OwnerLookupError::NotFound) => StatusCode::NOT_FOUND,
                DispatchError::Owner(OwnerLookupError::MissingEmail(_)) => {
                    StatusCode::UNPROCESSABLE_ENTITY
                }
                DispatchError::Generation(_) => StatusCode::BAD_GATEWAY,
                DispatchError::Schedule(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DispatchError::Owner(OwnerLookupError::Repository(_))
                | DispatchError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }

        if let Some(err) = self.0.downcast_ref::<RepositoryError>() {
            return match err {
                RepositoryError::NotFound => StatusCode::NOT_FOUND,
                RepositoryError::Conflict(_) => StatusCode::CONFLICT,
                RepositoryError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            };
        }

        if self.0.downcast_ref::<ScheduleError>().is_some()
            || self.0.downcast_ref::<validator::ValidationErrors>().is_some()
        {
            return StatusCode::BAD_REQUEST;
        }

        StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_message = self.0.to_string();

        if status.is_server_error() {
            error!("Request failed with {}: {:#}", status, self.0);
        }

        let body = Json(json!({ "success": false, "error": error_message }));
        (status, body).into_response()
    }
}

impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self(err.into())
    }
}
