// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工具模块
///
/// 提供日志初始化与工作器错误类型
pub mod errors;
pub mod telemetry;
