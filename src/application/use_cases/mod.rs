// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 用例模块
///
/// - 报告分发（report_dispatcher）：到期扫描与立即运行
/// - 日程预览（schedule_preview）：按共享计算器预览触发时刻
pub mod report_dispatcher;
pub mod schedule_preview;
