// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::report::{ScheduleType, ScheduledReport};
use crate::domain::repositories::report_repository::{ReportRepository, RepositoryError};
use crate::infrastructure::database::entities::scheduled_report::{self, SeaScheduleType};
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use sea_orm::prelude::DateTimeWithTimeZone;
use sea_orm::sea_query::Expr;
use sea_orm::*;
use std::sync::Arc;
use uuid::Uuid;

/// 定时报告仓库实现
///
/// 租约通过条件更新实现：只有仍然到期且未被有效租约占用的行会被更新，
/// `rows_affected == 1` 即认领成功
#[derive(Clone)]
pub struct ReportRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ReportRepositoryImpl {
    /// 创建新的定时报告仓库实现
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// 到期且可认领的条件
    fn due_condition(now: DateTimeWithTimeZone) -> Condition {
        Condition::all()
            .add(scheduled_report::Column::ScheduleType.eq(SeaScheduleType::Scheduled))
            .add(scheduled_report::Column::IsActive.eq(true))
            .add(scheduled_report::Column::NextRunAt.is_not_null())
            .add(scheduled_report::Column::NextRunAt.lte(now))
            .add(
                Condition::any()
                    .add(scheduled_report::Column::ClaimedUntil.is_null())
                    .add(scheduled_report::Column::ClaimedUntil.lte(now)),
            )
    }
}

impl From<ScheduleType> for SeaScheduleType {
    fn from(schedule_type: ScheduleType) -> Self {
        match schedule_type {
            ScheduleType::Manual => SeaScheduleType::Manual,
            ScheduleType::Scheduled => SeaScheduleType::Scheduled,
        }
    }
}

impl From<SeaScheduleType> for ScheduleType {
    fn from(schedule_type: SeaScheduleType) -> Self {
        match schedule_type {
            SeaScheduleType::Manual => ScheduleType::Manual,
            SeaScheduleType::Scheduled => ScheduleType::Scheduled,
        }
    }
}

/// 统一以 UTC 偏移写入时间列
fn to_db(instant: DateTime<Utc>) -> DateTimeWithTimeZone {
    instant.into()
}

#[async_trait]
impl ReportRepository for ReportRepositoryImpl {
    async fn create(&self, report: &ScheduledReport) -> Result<ScheduledReport, RepositoryError> {
        let active_model: scheduled_report::ActiveModel = report.clone().into();

        scheduled_report::Entity::insert(active_model)
            .exec(self.db.as_ref())
            .await?;

        Ok(report.clone())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<ScheduledReport>, RepositoryError> {
        let model = scheduled_report::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_by_id_and_owner(
        &self,
        id: Uuid,
        owner_id: Uuid,
    ) -> Result<Option<ScheduledReport>, RepositoryError> {
        let model = scheduled_report::Entity::find_by_id(id)
            .filter(scheduled_report::Column::UserId.eq(owner_id))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_due(
        &self,
        now: DateTime<Utc>,
        limit: u64,
    ) -> Result<Vec<ScheduledReport>, RepositoryError> {
        let models = scheduled_report::Entity::find()
            .filter(Self::due_condition(to_db(now)))
            .order_by_asc(scheduled_report::Column::NextRunAt)
            .order_by_asc(scheduled_report::Column::Id)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn find_unarmed(
        &self,
        limit: u64,
        offset: u64,
    ) -> Result<Vec<ScheduledReport>, RepositoryError> {
        let models = scheduled_report::Entity::find()
            .filter(scheduled_report::Column::ScheduleType.eq(SeaScheduleType::Scheduled))
            .filter(scheduled_report::Column::IsActive.eq(true))
            .filter(scheduled_report::Column::NextRunAt.is_null())
            .order_by_asc(scheduled_report::Column::CreatedAt)
            .order_by_asc(scheduled_report::Column::Id)
            .offset(offset)
            .limit(limit)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Into::into).collect())
    }

    async fn try_claim(
        &self,
        id: Uuid,
        token: Uuid,
        now: DateTime<Utc>,
        ttl: Duration,
    ) -> Result<bool, RepositoryError> {
        let result = scheduled_report::Entity::update_many()
            .col_expr(
                scheduled_report::Column::ClaimedUntil,
                Expr::value(to_db(now + ttl)),
            )
            .col_expr(scheduled_report::Column::ClaimToken, Expr::value(token))
            .filter(scheduled_report::Column::Id.eq(id))
            .filter(Self::due_condition(to_db(now)))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }

    async fn complete_occurrence(
        &self,
        id: Uuid,
        token: Uuid,
        fired_at: DateTime<Utc>,
        next_fire_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = scheduled_report::Entity::update_many()
            .col_expr(
                scheduled_report::Column::LastRunAt,
                Expr::value(to_db(fired_at)),
            )
            .col_expr(
                scheduled_report::Column::NextRunAt,
                Expr::value(to_db(next_fire_at)),
            )
            .col_expr(
                scheduled_report::Column::ClaimedUntil,
                Expr::value(Option::<DateTimeWithTimeZone>::None),
            )
            .col_expr(
                scheduled_report::Column::ClaimToken,
                Expr::value(Option::<Uuid>::None),
            )
            .col_expr(
                scheduled_report::Column::UpdatedAt,
                Expr::value(to_db(Utc::now())),
            )
            .filter(scheduled_report::Column::Id.eq(id))
            .filter(scheduled_report::Column::ClaimToken.eq(token))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::Conflict(format!(
                "claim on report {} is no longer held",
                id
            )));
        }

        Ok(())
    }

    async fn release_claim(&self, id: Uuid, token: Uuid) -> Result<(), RepositoryError> {
        let result = scheduled_report::Entity::update_many()
            .col_expr(
                scheduled_report::Column::ClaimedUntil,
                Expr::value(Option::<DateTimeWithTimeZone>::None),
            )
            .col_expr(
                scheduled_report::Column::ClaimToken,
                Expr::value(Option::<Uuid>::None),
            )
            .filter(scheduled_report::Column::Id.eq(id))
            .filter(scheduled_report::Column::ClaimToken.eq(token))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::Conflict(format!(
                "claim on report {} is no longer held",
                id
            )));
        }

        Ok(())
    }

    async fn record_manual_run(
        &self,
        id: Uuid,
        fired_at: DateTime<Utc>,
    ) -> Result<(), RepositoryError> {
        let result = scheduled_report::Entity::update_many()
            .col_expr(
                scheduled_report::Column::LastRunAt,
                Expr::value(to_db(fired_at)),
            )
            .col_expr(
                scheduled_report::Column::UpdatedAt,
                Expr::value(to_db(Utc::now())),
            )
            .filter(scheduled_report::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    async fn arm(&self, id: Uuid, next_fire_at: DateTime<Utc>) -> Result<bool, RepositoryError> {
        let result = scheduled_report::Entity::update_many()
            .col_expr(
                scheduled_report::Column::NextRunAt,
                Expr::value(to_db(next_fire_at)),
            )
            .col_expr(
                scheduled_report::Column::UpdatedAt,
                Expr::value(to_db(Utc::now())),
            )
            .filter(scheduled_report::Column::Id.eq(id))
            .filter(scheduled_report::Column::ScheduleType.eq(SeaScheduleType::Scheduled))
            .filter(scheduled_report::Column::NextRunAt.is_null())
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected == 1)
    }
}

impl From<scheduled_report::Model> for ScheduledReport {
    fn from(model: scheduled_report::Model) -> Self {
        Self {
            id: model.id,
            owner_id: model.user_id,
            created_by_user_id: model.created_by_user_id,
            title: model.title,
            prompt: model.prompt,
            schedule_type: model.schedule_type.into(),
            schedule_frequency: model.schedule_frequency,
            schedule_time: model.schedule_time,
            schedule_day: model.schedule_day,
            is_active: model.is_active,
            is_team_report: model.is_team_report,
            last_fired_at: model.last_run_at.map(Into::into),
            next_fire_at: model.next_run_at.map(Into::into),
            claimed_until: model.claimed_until.map(Into::into),
            claim_token: model.claim_token,
            created_at: model.created_at.into(),
            updated_at: model.updated_at.into(),
        }
    }
}

impl From<ScheduledReport> for scheduled_report::ActiveModel {
    fn from(report: ScheduledReport) -> Self {
        Self {
            id: Set(report.id),
            user_id: Set(report.owner_id),
            created_by_user_id: Set(report.created_by_user_id),
            title: Set(report.title),
            prompt: Set(report.prompt),
            schedule_type: Set(report.schedule_type.into()),
            schedule_frequency: Set(report.schedule_frequency),
            schedule_time: Set(report.schedule_time),
            schedule_day: Set(report.schedule_day),
            is_active: Set(report.is_active),
            is_team_report: Set(report.is_team_report),
            last_run_at: Set(report.last_fired_at.map(to_db)),
            next_run_at: Set(report.next_fire_at.map(to_db)),
            claimed_until: Set(report.claimed_until.map(to_db)),
            claim_token: Set(report.claim_token),
            created_at: Set(to_db(report.created_at)),
            updated_at: Set(to_db(report.updated_at)),
        }
    }
}
