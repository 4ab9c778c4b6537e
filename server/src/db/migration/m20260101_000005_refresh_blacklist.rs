// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(RefreshBlacklist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(RefreshBlacklist::Jti)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(RefreshBlacklist::BlacklistedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(RefreshBlacklist::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum RefreshBlacklist {
    Table,
    Jti,
    BlacklistedAt,
}
