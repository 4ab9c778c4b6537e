// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::m20260101_000001_player::Player;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(GameRequest::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(GameRequest::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(GameRequest::Requester).uuid().not_null())
                    .col(ColumnDef::new(GameRequest::Opponent).uuid().not_null())
                    .col(
                        ColumnDef::new(GameRequest::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(
                        ColumnDef::new(GameRequest::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GameRequest::Table, GameRequest::Requester)
                            .to(Player::Table, Player::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(GameRequest::Table, GameRequest::Opponent)
                            .to(Player::Table, Player::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(GameRequest::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum GameRequest {
    Table,
    Id,
    Requester,
    Opponent,
    Status,
    CreatedAt,
}
