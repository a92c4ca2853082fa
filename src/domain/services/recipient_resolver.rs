// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::directory::{OwnerContext, Recipient};
use crate::domain::models::report::ScheduledReport;
use crate::domain::repositories::directory_repository::DirectoryRepository;
use crate::domain::repositories::report_repository::RepositoryError;
use std::sync::Arc;
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// 所有者身份查询错误
#[derive(Error, Debug)]
pub enum OwnerLookupError {
    /// 用户不存在
    #[error("User not found")]
    NotFound,
    /// 用户没有邮箱，无法作为接收者
    #[error("User {0} has no email address")]
    MissingEmail(Uuid),
    /// 目录查询失败
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// 接收者解析器
///
/// 负责组装报告所有者上下文并把报告展开为接收者列表
#[derive(Clone)]
pub struct RecipientResolver {
    directory: Arc<dyn DirectoryRepository>,
}

impl RecipientResolver {
    /// 创建新的接收者解析器
    ///
    /// # 参数
    ///
    /// * `directory` - 用户与团队目录
    pub fn new(directory: Arc<dyn DirectoryRepository>) -> Self {
        Self { directory }
    }

    /// 查询报告所有者上下文
    ///
    /// 团队名称查询失败不会影响触发，团队名退化为空
    ///
    /// # 参数
    ///
    /// * `owner_id` - 所有者ID
    ///
    /// # 返回值
    ///
    /// * `Ok(OwnerContext)` - 所有者上下文
    /// * `Err(OwnerLookupError)` - 所有者不存在、没有邮箱或目录查询失败
    pub async fn owner_context(&self, owner_id: Uuid) -> Result<OwnerContext, OwnerLookupError> {
        let user = self
            .directory
            .find_user(owner_id)
            .await?
            .ok_or(OwnerLookupError::NotFound)?;

        let email = user
            .email
            .clone()
            .filter(|e| !e.trim().is_empty())
            .ok_or(OwnerLookupError::MissingEmail(owner_id))?;

        let team_name = match user.team_id {
            Some(team_id) => match self.directory.find_team(team_id).await {
                Ok(team) => team.map(|t| t.name),
                Err(e) => {
                    warn!("Failed to load team {} for user {}: {}", team_id, owner_id, e);
                    None
                }
            },
            None => None,
        };

        Ok(OwnerContext {
            user_id: user.id,
            email,
            name: user.name,
            team_id: user.team_id,
            team_name,
            role: user.role,
            view_financial: user.view_financial,
        })
    }

    /// 解析报告的接收者
    ///
    /// 团队成员查询失败时只投递给所有者，不让整次触发失败
    ///
    /// # 参数
    ///
    /// * `owner` - 所有者上下文
    /// * `report` - 报告
    ///
    /// # 返回值
    ///
    /// 至少包含一个接收者的列表
    pub async fn resolve(&self, owner: &OwnerContext, report: &ScheduledReport) -> Vec<Recipient> {
        if !report.is_team_report {
            return vec![owner.as_recipient()];
        }

        let Some(team_id) = owner.team_id else {
            debug!(
                "Team report {} owner {} has no team, delivering to owner only",
                report.id, owner.user_id
            );
            return vec![owner.as_recipient()];
        };

        match self.directory.list_team_members(team_id).await {
            Ok(members) if !members.is_empty() => {
                debug!(
                    "Team report {} resolved to {} members of team {}",
                    report.id,
                    members.len(),
                    team_id
                );
                members.into_iter().map(Recipient::from).collect()
            }
            Ok(_) => {
                warn!(
                    "Team {} has no members for report {}, delivering to owner only",
                    team_id, report.id
                );
                vec![owner.as_recipient()]
            }
            Err(e) => {
                warn!(
                    "Failed to load members of team {} for report {}: {}. Delivering to owner only",
                    team_id, report.id, e
                );
                vec![owner.as_recipient()]
            }
        }
    }
}

#[cfg(test)]
#[path = "recipient_resolver_test.rs"]
mod tests;
