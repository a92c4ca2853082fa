// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// 缺省团队角色
pub const DEFAULT_ROLE: &str = "member";

/// 用户资料（只读）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: Option<String>,
    pub name: Option<String>,
    pub team_id: Option<Uuid>,
    pub role: String,
    pub view_financial: bool,
}

/// 团队（只读）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Team {
    pub id: Uuid,
    pub name: String,
}

/// 报告所有者在触发时刻的上下文
///
/// 由目录数据组装，团队信息查询失败时退化为空团队名
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OwnerContext {
    pub user_id: Uuid,
    pub email: String,
    pub name: Option<String>,
    pub team_id: Option<Uuid>,
    pub team_name: Option<String>,
    pub role: String,
    pub view_financial: bool,
}

impl OwnerContext {
    /// 所有者本人作为接收者
    pub fn as_recipient(&self) -> Recipient {
        Recipient {
            user_id: self.user_id,
            email: Some(self.email.clone()),
            name: self.name.clone(),
        }
    }
}

/// 投递接收者
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Recipient {
    pub user_id: Uuid,
    /// 没有邮箱的成员仍会被解析，其投递记录为失败
    pub email: Option<String>,
    pub name: Option<String>,
}

impl From<UserProfile> for Recipient {
    fn from(user: UserProfile) -> Self {
        Self {
            user_id: user.id,
            email: user.email,
            name: user.name,
        }
    }
}
