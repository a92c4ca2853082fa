// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::report_repository::RepositoryError;
use crate::domain::models::directory::{Team, UserProfile};
use async_trait::async_trait;
use uuid::Uuid;

/// 用户与团队目录（只读）
#[async_trait]
pub trait DirectoryRepository: Send + Sync {
    /// 查找用户
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, RepositoryError>;
    /// 查找团队
    async fn find_team(&self, id: Uuid) -> Result<Option<Team>, RepositoryError>;
    /// 列出团队当前成员
    async fn list_team_members(&self, team_id: Uuid) -> Result<Vec<UserProfile>, RepositoryError>;
}
