// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义领域层的数据访问契约，具体实现由基础设施层提供：
/// - 报告仓库（report_repository）：到期扫描、租约与触发时间
/// - 投递仓库（delivery_repository）：投递记录
/// - 目录仓库（directory_repository）：用户与团队（只读）
pub mod delivery_repository;
pub mod directory_repository;
pub mod report_repository;
