// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Friendship accept/reject is out of scope (§1); this entity exists only
//! so [`crate::db::stores::SeaUserStore::friends_of`] has something to
//! query for the hub's online/offline fan-out (§4.7).

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "friendship")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub player_a: Uuid,
    pub player_b: Uuid,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
