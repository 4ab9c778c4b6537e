// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Minimal stand-ins for the block-list and friend-graph tables the
//! core's store traits read (§3); the CRUD that populates them is out of
//! scope (§1) and lives elsewhere.

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
                    .table(Block::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Block::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Block::Player).uuid().not_null())
                    .col(ColumnDef::new(Block::Blocked).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Block::Table, Block::Player)
                            .to(Player::Table, Player::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Block::Table, Block::Blocked)
                            .to(Player::Table, Player::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Friendship::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Friendship::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Friendship::PlayerA).uuid().not_null())
                    .col(ColumnDef::new(Friendship::PlayerB).uuid().not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .from(Friendship::Table, Friendship::PlayerA)
                            .to(Player::Table, Player::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(Friendship::Table, Friendship::PlayerB)
                            .to(Player::Table, Player::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Friendship::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Block::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Block {
    Table,
    Id,
    Player,
    Blocked,
}

#[derive(Iden)]
enum Friendship {
    Table,
    Id,
    PlayerA,
    PlayerB,
}
