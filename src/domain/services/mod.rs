// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 该模块包含报告分发引擎的核心业务逻辑：
/// - 触发时间计算（recurrence_calculator）：唯一的日程到 UTC 时刻换算
/// - 接收者解析（recipient_resolver）：所有者上下文与团队成员展开
/// - 内容生成（generation_service）：外部生成服务的边界
/// - 投递持久化（delivery_persister）：按接收者独立写入投递记录
/// - 重新调度（reschedule_manager）：推进触发时间与租约释放
pub mod delivery_persister;
pub mod generation_service;
pub mod recipient_resolver;
pub mod recurrence_calculator;
pub mod reschedule_manager;
