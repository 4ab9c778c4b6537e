// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

use super::m20260101_000001_player::Player;
use super::m20260101_000002_pong_game::PongGame;
use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tournament::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tournament::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tournament::Player1).uuid().not_null())
                    .col(ColumnDef::new(Tournament::Player2).uuid().not_null())
                    .col(ColumnDef::new(Tournament::Player3).uuid().not_null())
                    .col(ColumnDef::new(Tournament::Player4).uuid().not_null())
                    .col(ColumnDef::new(Tournament::Winner).uuid())
                    .col(
                        ColumnDef::new(Tournament::Status)
                            .string_len(16)
                            .not_null()
                            .default("IN_PROGRESS"),
                    )
                    .col(
                        ColumnDef::new(Tournament::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Tournament::Table, Tournament::Player1)
                            .to(Player::Table, Player::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Tournament::Table, Tournament::Player2)
                            .to(Player::Table, Player::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Tournament::Table, Tournament::Player3)
                            .to(Player::Table, Player::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Tournament::Table, Tournament::Player4)
                            .to(Player::Table, Player::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(TournamentGame::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TournamentGame::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TournamentGame::TournamentId)
                            .uuid()
                            .not_null(),
                    )
                    .col(ColumnDef::new(TournamentGame::GameId).uuid().not_null())
                    .col(
                        ColumnDef::new(TournamentGame::Slot)
                            .string_len(8)
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TournamentGame::Table, TournamentGame::TournamentId)
                            .to(Tournament::Table, Tournament::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(TournamentGame::Table, TournamentGame::GameId)
                            .to(PongGame::Table, PongGame::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TournamentGame::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Tournament::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
pub enum Tournament {
    Table,
    Id,
    Player1,
    Player2,
    Player3,
    Player4,
    Winner,
    Status,
    CreatedAt,
}

#[derive(Iden)]
enum TournamentGame {
    Table,
    Id,
    TournamentId,
    GameId,
    Slot,
}
