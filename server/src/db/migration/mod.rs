// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Schema migrations, grounded on the `sea-orm-migration` split seen in
//! `PocketRelay-Server`'s `migration` crate: one file per table, registered
//! in dependency order by [`Migrator`].

pub use sea_orm_migration::prelude::*;

mod m20260101_000001_player;
mod m20260101_000002_pong_game;
mod m20260101_000003_game_request;
mod m20260101_000004_tournament;
mod m20260101_000005_refresh_blacklist;
mod m20260101_000006_social;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260101_000001_player::Migration),
            Box::new(m20260101_000002_pong_game::Migration),
            Box::new(m20260101_000003_game_request::Migration),
            Box::new(m20260101_000004_tournament::Migration),
            Box::new(m20260101_000005_refresh_blacklist::Migration),
            Box::new(m20260101_000006_social::Migration),
        ]
    }
}
