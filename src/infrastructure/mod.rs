// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 包含的子模块：
/// - 数据库（database）：数据库连接和实体映射
/// - 指标（metrics）：Prometheus 导出器
/// - 仓库实现（repositories）：领域仓库接口的 SeaORM 实现
/// - 服务（services）：外部生成服务的 HTTP 客户端
///
/// 基础设施层依赖于领域层的抽象接口，不反向依赖
pub mod database;
pub mod metrics;
pub mod repositories;
pub mod services;
