// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// - 报告（report）：定时报告与日程
/// - 投递（delivery）：每个接收者一条的投递记录
/// - 目录（directory）：用户、团队与接收者
pub mod delivery;
pub mod directory;
pub mod report;
