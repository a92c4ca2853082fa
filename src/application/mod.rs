// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 应用程序模块
///
/// 编排领域服务完成分发、立即运行与日程预览
pub mod dto;
pub mod use_cases;
