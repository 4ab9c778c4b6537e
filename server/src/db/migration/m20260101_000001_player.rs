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
                    .table(Player::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(Player::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(Player::Username).text().not_null())
                    .col(ColumnDef::new(Player::PasswordHash).text().not_null())
                    .col(
                        ColumnDef::new(Player::Online)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Player::Wins).integer().not_null().default(0))
                    .col(
                        ColumnDef::new(Player::Losses)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Player::TwoFactorEnabled)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Player::TwoFactorSecret).text())
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_player_username")
                    .table(Player::Table)
                    .col(Player::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(PlayerBackupCode::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PlayerBackupCode::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(PlayerBackupCode::PlayerId).uuid().not_null())
                    .col(
                        ColumnDef::new(PlayerBackupCode::CodeHash)
                            .text()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PlayerBackupCode::Used)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(PlayerBackupCode::Table, PlayerBackupCode::PlayerId)
                            .to(Player::Table, Player::Id),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PlayerBackupCode::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Player::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Player {
    Table,
    Id,
    Username,
    PasswordHash,
    Online,
    Wins,
    Losses,
    TwoFactorEnabled,
    TwoFactorSecret,
}

#[derive(Iden)]
enum PlayerBackupCode {
    Table,
    Id,
    PlayerId,
    CodeHash,
    Used,
}
