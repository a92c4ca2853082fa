// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use axum::{
    extract::{Request, State},
    http::{header, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// 认证状态
#[derive(Clone, Default)]
pub struct AuthState {
    /// 受保护接口的 Bearer 令牌，未配置时所有受保护请求都被拒绝
    pub api_token: Option<Arc<str>>,
}

impl AuthState {
    pub fn new(api_token: Option<String>) -> Self {
        Self {
            api_token: api_token
                .filter(|t| !t.trim().is_empty())
                .map(|t| Arc::from(t.as_str())),
        }
    }
}

/// 认证中间件
///
/// 验证请求中的 Bearer 令牌
///
/// # 参数
///
/// * `state` - 认证状态
/// * `req` - HTTP请求
/// * `next` - 下一个中间件
///
/// # 返回值
///
/// * `Ok(Response)` - 认证成功的响应
/// * `Err(StatusCode)` - 认证失败的状态码
pub async fn auth_middleware(
    State(state): State<AuthState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let path = req.uri().path();
    debug!("AuthMiddleware processing path: {}", path);
    if path == "/health" || path == "/v1/version" {
        return Ok(next.run(req).await);
    }

    let Some(expected) = state.api_token.as_deref() else {
        warn!("Rejecting {}: no API token configured", path);
        return Err(StatusCode::UNAUTHORIZED);
    };

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .and_then(|header| header.strip_prefix("Bearer "))
        .ok_or(StatusCode::UNAUTHORIZED)?;

    if token != expected {
        warn!("Invalid API token for {}", path);
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(next.run(req).await)
}

#[cfg(test)]
#[path = "auth_middleware_test.rs"]
mod tests;
