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
        // SQLite accepts a single alter option per statement
        manager
            .alter_table(
                Table::alter()
                    .table(ScheduledReports::Table)
                    .add_column(
                        ColumnDef::new(ScheduledReports::ClaimedUntil).timestamp_with_time_zone(),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(ScheduledReports::Table)
                    .add_column(ColumnDef::new(ScheduledReports::ClaimToken).uuid())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .alter_table(
                Table::alter()
                    .table(ScheduledReports::Table)
                    .drop_column(ScheduledReports::ClaimToken)
                    .to_owned(),
            )
            .await?;

        manager
            .alter_table(
                Table::alter()
                    .table(ScheduledReports::Table)
                    .drop_column(ScheduledReports::ClaimedUntil)
                    .to_owned(),
            )
            .await
    }
}

#[derive(DeriveIden)]
enum ScheduledReports {
    Table,
    ClaimedUntil,
    ClaimToken,
}
