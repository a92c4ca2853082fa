// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum SeaScheduleType {
    #[sea_orm(string_value = "manual")]
    Manual,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
}

/// 定时报告数据库实体模型
///
/// 对应 scheduled_reports 表。`last_run_at`/`next_run_at` 对应领域模型的
/// `last_fired_at`/`next_fire_at`
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "scheduled_reports")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub user_id: Uuid,
    pub created_by_user_id: Option<Uuid>,
    pub title: String,
    #[sea_orm(column_type = "Text")]
    pub prompt: String,
    pub schedule_type: SeaScheduleType,
    pub schedule_frequency: Option<String>,
    pub schedule_time: Option<String>,
    pub schedule_day: Option<i32>,
    pub is_active: bool,
    pub is_team_report: bool,
    pub last_run_at: Option<DateTimeWithTimeZone>,
    pub next_run_at: Option<DateTimeWithTimeZone>,
    pub claimed_until: Option<DateTimeWithTimeZone>,
    pub claim_token: Option<Uuid>,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    Owner,
    #[sea_orm(has_many = "super::report_delivery::Entity")]
    Deliveries,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Owner.def()
    }
}

impl Related<super::report_delivery::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Deliveries.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
