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
                    .table(ReportDeliveries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ReportDeliveries::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ReportDeliveries::ReportId).uuid().not_null())
                    .col(
                        ColumnDef::new(ReportDeliveries::RecipientUserId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ReportDeliveries::RecipientEmail).string())
                    .col(
                        ColumnDef::new(ReportDeliveries::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ReportDeliveries::Content).text())
                    .col(ColumnDef::new(ReportDeliveries::Error).text())
                    .col(
                        ColumnDef::new(ReportDeliveries::IsManualRun)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(ReportDeliveries::Metadata).json().not_null())
                    .col(
                        ColumnDef::new(ReportDeliveries::FiredAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(ReportDeliveries::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(ReportDeliveries::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_report_deliveries_report_fired")
                    .table(ReportDeliveries::Table)
                    .col(ReportDeliveries::ReportId)
                    .col(ReportDeliveries::FiredAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ReportDeliveries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ReportDeliveries {
    Table,
    Id,
    ReportId,
    RecipientUserId,
    RecipientEmail,
    Status,
    Content,
    Error,
    IsManualRun,
    Metadata,
    FiredAt,
    CreatedAt,
    UpdatedAt,
}
