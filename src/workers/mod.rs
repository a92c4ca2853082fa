// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 提供可选的进程内定时分发
pub mod dispatch_worker;
pub mod worker;

pub use worker::Worker;
