// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Only the fields the core reads/writes (§3): identity, presence, and
//! win/loss counters. Profile, avatar, and password fields belong to the
//! registration/profile surface this workspace does not own; they are not
//! modeled here.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "player")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub username: String,
    /// Argon2 PHC string. Registration/password-change themselves are out of
    /// scope (§1); this column exists only so `/auth/login` glue has
    /// something to verify against.
    pub password_hash: String,
    pub online: bool,
    pub wins: i32,
    pub losses: i32,
    pub two_factor_enabled: bool,
    #[sea_orm(column_type = "Text", nullable)]
    pub two_factor_secret: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::player_backup_code::Entity")]
    BackupCode,
}

impl Related<super::player_backup_code::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::BackupCode.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
