// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScheduledReports::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScheduledReports::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScheduledReports::UserId).uuid().not_null())
                    .col(ColumnDef::new(ScheduledReports::CreatedByUserId).uuid())
                    .col(ColumnDef::new(ScheduledReports::Title).string().not_null())
                    .col(ColumnDef::new(ScheduledReports::Prompt).text().not_null())
                    .col(
                        ColumnDef::new(ScheduledReports::ScheduleType)
                            .string()
                            .not_null()
                            .default("manual"),
                    )
                    .col(ColumnDef::new(ScheduledReports::ScheduleFrequency).string())
                    .col(ColumnDef::new(ScheduledReports::ScheduleTime).string())
                    .col(ColumnDef::new(ScheduledReports::ScheduleDay).integer())
                    .col(
                        ColumnDef::new(ScheduledReports::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(ScheduledReports::IsTeamReport)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ScheduledReports::LastRunAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScheduledReports::NextRunAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ScheduledReports::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ScheduledReports::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        // Scanner lookup: scheduled + active + oldest next_run_at first
        manager
            .create_index(
                Index::create()
                    .name("idx_scheduled_reports_due")
                    .table(ScheduledReports::Table)
                    .col(ScheduledReports::ScheduleType)
                    .col(ScheduledReports::IsActive)
                    .col(ScheduledReports::NextRunAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scheduled_reports_user_id")
                    .table(ScheduledReports::Table)
                    .col(ScheduledReports::UserId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScheduledReports::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScheduledReports {
    Table,
    Id,
    UserId,
    CreatedByUserId,
    Title,
    Prompt,
    ScheduleType,
    ScheduleFrequency,
    ScheduleTime,
    ScheduleDay,
    IsActive,
    IsTeamReport,
    LastRunAt,
    NextRunAt,
    CreatedAt,
    UpdatedAt,
}
