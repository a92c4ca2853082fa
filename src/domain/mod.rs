// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域层模块
///
/// 该模块包含报告分发引擎的核心业务逻辑，包括：
/// - 领域模型（models）：报告、日程、投递与目录
/// - 仓库接口（repositories）：数据持久化抽象接口
/// - 服务（services）：触发时间计算、接收者解析、生成、投递与重新调度
///
/// 领域层不依赖于任何外部实现
pub mod models;
pub mod repositories;
pub mod services;
