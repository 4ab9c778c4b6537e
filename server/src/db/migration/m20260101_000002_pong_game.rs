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
                    .table(PongGame::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(PongGame::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(PongGame::Player1).uuid().not_null())
                    .col(ColumnDef::new(PongGame::Player2).uuid().not_null())
                    .col(
                        ColumnDef::new(PongGame::Player1Score)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PongGame::Player2Score)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(PongGame::Status)
                            .string_len(16)
                            .not_null()
                            .default("PENDING"),
                    )
                    .col(ColumnDef::new(PongGame::Winner).uuid())
                    .col(
                        ColumnDef::new(PongGame::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PongGame::Table, PongGame::Player1)
                            .to(Player::Table, Player::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PongGame::Table, PongGame::Player2)
                            .to(Player::Table, Player::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PongGame::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum PongGame {
    Table,
    Id,
    Player1,
    Player2,
    Player1Score,
    Player2Score,
    Status,
    Winner,
    CreatedAt,
}
