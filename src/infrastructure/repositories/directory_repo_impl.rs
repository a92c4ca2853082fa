// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::directory::{Team, UserProfile, DEFAULT_ROLE};
use crate::domain::repositories::directory_repository::DirectoryRepository;
use crate::domain::repositories::report_repository::RepositoryError;
use crate::infrastructure::database::entities::{team, user};
use async_trait::async_trait;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 用户与团队目录的只读实现
#[derive(Clone)]
pub struct DirectoryRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl DirectoryRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

#[async_trait]
impl DirectoryRepository for DirectoryRepositoryImpl {
    async fn find_user(&self, id: Uuid) -> Result<Option<UserProfile>, RepositoryError> {
        let model = user::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model.map(Into::into))
    }

    async fn find_team(&self, id: Uuid) -> Result<Option<Team>, RepositoryError> {
        let model = team::Entity::find_by_id(id).one(self.db.as_ref()).await?;
        Ok(model.map(|m| Team {
            id: m.id,
            name: m.name,
        }))
    }

    async fn list_team_members(&self, team_id: Uuid) -> Result<Vec<UserProfile>, RepositoryError> {
        let models = user::Entity::find()
            .filter(user::Column::TeamId.eq(team_id))
            .order_by_asc(user::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }
}

impl From<user::Model> for UserProfile {
    fn from(model: user::Model) -> Self {
        Self {
            id: model.id,
            email: model.email.filter(|e| !e.trim().is_empty()),
            name: model.name,
            team_id: model.team_id,
            role: model.role.unwrap_or_else(|| DEFAULT_ROLE.to_string()),
            view_financial: model.view_financial.unwrap_or(true),
        }
    }
}
