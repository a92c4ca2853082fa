// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::delivery::{DeliveryMetadata, DeliveryRecord, DeliveryStatus};
use crate::domain::repositories::delivery_repository::DeliveryRepository;
use crate::domain::repositories::report_repository::RepositoryError;
use crate::infrastructure::database::entities::report_delivery::{self, SeaDeliveryStatus};
use async_trait::async_trait;
use chrono::Utc;
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 投递记录仓库实现
#[derive(Clone)]
pub struct DeliveryRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl DeliveryRepositoryImpl {
    /// 创建新的投递记录仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<DeliveryStatus> for SeaDeliveryStatus {
    fn from(status: DeliveryStatus) -> Self {
        match status {
            DeliveryStatus::Pending => SeaDeliveryStatus::Pending,
            DeliveryStatus::Sent => SeaDeliveryStatus::Sent,
            DeliveryStatus::Failed => SeaDeliveryStatus::Failed,
        }
    }
}

impl From<SeaDeliveryStatus> for DeliveryStatus {
    fn from(status: SeaDeliveryStatus) -> Self {
        match status {
            SeaDeliveryStatus::Pending => DeliveryStatus::Pending,
            SeaDeliveryStatus::Sent => DeliveryStatus::Sent,
            SeaDeliveryStatus::Failed => DeliveryStatus::Failed,
        }
    }
}

#[async_trait]
impl DeliveryRepository for DeliveryRepositoryImpl {
    async fn insert(&self, record: &DeliveryRecord) -> Result<DeliveryRecord, RepositoryError> {
        let metadata = serde_json::to_value(&record.metadata)
            .map_err(|e| RepositoryError::Database(DbErr::Json(e.to_string())))?;

        let active_model = report_delivery::ActiveModel {
            id: Set(record.id),
            report_id: Set(record.report_id),
            recipient_user_id: Set(record.recipient_user_id),
            recipient_email: Set(record.recipient_email.clone()),
            status: Set(record.status.into()),
            content: Set(record.content.clone()),
            error: Set(record.error.clone()),
            is_manual_run: Set(record.is_manual_run),
            metadata: Set(metadata),
            fired_at: Set(record.fired_at.into()),
            created_at: Set(record.created_at.into()),
            updated_at: Set(record.updated_at.into()),
        };

        report_delivery::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await?;

        Ok(record.clone())
    }

    async fn transition(
        &self,
        id: Uuid,
        status: DeliveryStatus,
        error: Option<String>,
    ) -> Result<(), RepositoryError> {
        let now: DateTimeWithTimeZone = Utc::now().into();
        let result = report_delivery::Entity::update_many()
            .col_expr(
                report_delivery::Column::Status,
                Expr::value(SeaDeliveryStatus::from(status)),
            )
            .col_expr(report_delivery::Column::Error, Expr::value(error))
            .col_expr(report_delivery::Column::UpdatedAt, Expr::value(now))
            .filter(report_delivery::Column::Id.eq(id))
            .filter(report_delivery::Column::Status.eq(SeaDeliveryStatus::Pending))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 1 {
            return Ok(());
        }

        // Distinguish a missing row from one already in a terminal state
        match report_delivery::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?
        {
            Some(model) => Err(RepositoryError::Conflict(format!(
                "delivery {} is already {}",
                id,
                DeliveryStatus::from(model.status)
            ))),
            None => Err(RepositoryError::NotFound),
        }
    }

    async fn find_by_report(&self, report_id: Uuid) -> Result<Vec<DeliveryRecord>, RepositoryError> {
        let models = report_delivery::Entity::find()
            .filter(report_delivery::Column::ReportId.eq(report_id))
            .order_by_asc(report_delivery::Column::FiredAt)
            .order_by_asc(report_delivery::Column::CreatedAt)
            .all(self.db.as_ref())
            .await?;

        models.into_iter().map(DeliveryRecord::try_from).collect()
    }
}

impl TryFrom<report_delivery::Model> for DeliveryRecord {
    type Error = RepositoryError;

    fn try_from(model: report_delivery::Model) -> Result<Self, Self::Error> {
        let metadata: DeliveryMetadata = serde_json::from_value(model.metadata)
            .map_err(|e| RepositoryError::Database(DbErr::Json(e.to_string())))?;

        Ok(Self {
            id: model.id,
            report_id: model.report_id,
            recipient_user_id: model.recipient_user_id,
            recipient_email: model.recipient_email,
            status: model.status.into(),
            content: model.content,
            error: model.error,
            is_manual_run: model.is_manual_run,
            metadata,
            fired_at: model.fired_at.into(),
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        })
    }
}
