// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 中间件模块
///
/// 提供受保护接口的 Bearer 令牌认证
pub mod auth_middleware;
