// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::utils::errors::WorkerError;
use async_trait::async_trait;

/// Worker trait定义
///
/// 后台工作器的单次执行单元，调度循环由实现方负责
#[async_trait]
pub trait Worker: Send + Sync {
    /// 执行一次
    async fn run(&self) -> Result<(), WorkerError>;

    /// 获取工作器名称，用于日志
    fn name(&self) -> &str;
}
