// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::GenerationSettings;
use crate::domain::services::generation_service::{
    GenerationError, GenerationRequest, GenerationService,
};
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use hmac::{Hmac, Mac};
use metrics::{counter, histogram};
use reqwest::header;
use sha2::Sha256;
use std::time::{Duration, Instant};
use tracing::{debug, error};
use url::Url;

type HmacSha256 = Hmac<Sha256>;

/// 错误信息中保留的响应体长度
const MAX_ERROR_BODY_CHARS: usize = 512;

/// 基于 HTTP 的生成服务实现
pub struct GenerationServiceImpl {
    /// HTTP 客户端
    client: reqwest::Client,
    /// 生成服务地址
    endpoint: Url,
    /// 单次请求超时
    timeout: Duration,
    /// 可选签名密钥
    signing_secret: Option<String>,
}

impl GenerationServiceImpl {
    /// 创建新的生成服务实现
    ///
    /// # 参数
    ///
    /// * `endpoint` - 生成服务地址
    /// * `timeout` - 单次请求超时
    /// * `signing_secret` - 可选 HMAC 签名密钥
    ///
    /// # 返回值
    ///
    /// * `Ok(GenerationServiceImpl)` - 客户端
    /// * `Err(GenerationError)` - HTTP 客户端初始化失败
    pub fn new(
        endpoint: Url,
        timeout: Duration,
        signing_secret: Option<String>,
    ) -> Result<Self, GenerationError> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            header::HeaderValue::from_static("Reportrs-Generation/0.1.0"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| GenerationError::Transport(e.to_string()))?;

        Ok(Self {
            client,
            endpoint,
            timeout,
            signing_secret: signing_secret.filter(|s| !s.is_empty()),
        })
    }

    /// 根据配置创建生成服务实现
    ///
    /// 未配置地址属于启动期致命错误
    pub fn from_settings(settings: &GenerationSettings) -> anyhow::Result<Self> {
        let raw = settings
            .endpoint_url
            .as_deref()
            .filter(|u| !u.trim().is_empty())
            .ok_or_else(|| anyhow!("generation.endpoint_url is not configured"))?;
        let endpoint = Url::parse(raw)
            .with_context(|| format!("generation.endpoint_url is not a valid URL: {}", raw))?;

        Ok(Self::new(
            endpoint,
            Duration::from_secs(settings.timeout_secs),
            settings.signing_secret.clone(),
        )?)
    }

    /// 为请求体生成签名
    fn sign(&self, payload: &str, timestamp: i64) -> Option<String> {
        let secret = self.signing_secret.as_ref()?;
        let message = format!("{}.{}", timestamp, payload);
        let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
        mac.update(message.as_bytes());
        Some(hex::encode(mac.finalize().into_bytes()))
    }

    fn classify(&self, err: reqwest::Error) -> GenerationError {
        if err.is_timeout() {
            GenerationError::Timeout(self.timeout)
        } else {
            GenerationError::Transport(err.to_string())
        }
    }

    async fn send(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        let payload =
            serde_json::to_string(request).map_err(|e| GenerationError::Decode(e.to_string()))?;

        let mut builder = self
            .client
            .post(self.endpoint.clone())
            .header(header::CONTENT_TYPE, "application/json");

        let timestamp = chrono::Utc::now().timestamp();
        if let Some(signature) = self.sign(&payload, timestamp) {
            builder = builder
                .header("X-Reportrs-Signature", signature)
                .header("X-Reportrs-Timestamp", timestamp.to_string());
        }

        let response = builder
            .body(payload)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        let text = response.text().await.map_err(|e| {
            if e.is_timeout() {
                GenerationError::Timeout(self.timeout)
            } else {
                GenerationError::Decode(e.to_string())
            }
        })?;

        if !status.is_success() {
            return Err(GenerationError::Status {
                status: status.as_u16(),
                body: text.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        Ok(extract_output(&text))
    }
}

/// 提取报告正文
///
/// JSON 响应中的非空字符串 `output` 字段会被解包，其他情况原样返回
pub fn extract_output(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|value| {
            value
                .get("output")
                .and_then(|output| output.as_str())
                .filter(|output| !output.is_empty())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.to_string())
}

#[async_trait]
impl GenerationService for GenerationServiceImpl {
    async fn generate(&self, request: &GenerationRequest) -> Result<String, GenerationError> {
        debug!(
            "Calling generation service for report '{}' (manual: {})",
            request.report_title, request.is_manual_run
        );

        let start = Instant::now();
        let result = self.send(request).await;
        histogram!("report_generation_duration_seconds").record(start.elapsed().as_secs_f64());

        if let Err(e) = &result {
            error!(
                "Generation failed for report '{}': {}",
                request.report_title, e
            );
            counter!("report_generation_failures_total", "reason" => e.reason()).increment(1);
        }

        result
    }
}

#[cfg(test)]
#[path = "generation_service_impl_test.rs"]
mod tests;
