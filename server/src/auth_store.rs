// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Credential verification and 2FA glue for `/auth/*` (spec.md §6). None of
//! this is part of the core (§1 puts password/registration handling out of
//! scope); it exists only so the login handler has something concrete to
//! call. Password hashing follows `PocketRelay-Server`'s
//! `utils::hashing` (Argon2, `password-hash`'s `PasswordHash` string form).

use argon2::password_hash::{self, rand_core::OsRng, PasswordHash, PasswordVerifier, SaltString};
use argon2::{Argon2, PasswordHasher};
use async_trait::async_trait;
use common::error::{CoreError, CoreResult};
use common::id::PlayerId;
use sea_orm::{ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use crate::db::entities::{player, player_backup_code};
use crate::totp;

pub fn hash_password(password: &str) -> password_hash::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(_) => false,
    }
}

/// Outcome of a successful password check: the player and whether the
/// login handler must stash tokens and demand a second factor (spec.md
/// §6's `POST /auth/login`).
pub struct Authenticated {
    pub player: PlayerId,
    pub username: String,
    pub two_factor_enabled: bool,
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn authenticate(&self, username: &str, password: &str) -> CoreResult<Authenticated>;
    async fn verify_second_factor(&self, player: PlayerId, code: &str) -> CoreResult<bool>;
    async fn consume_backup_code(&self, player: PlayerId, code: &str) -> CoreResult<bool>;
}

pub struct SeaCredentialStore {
    db: DatabaseConnection,
}

impl SeaCredentialStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    fn internal(e: sea_orm::DbErr) -> CoreError {
        CoreError::Internal(e.to_string())
    }
}

#[async_trait]
impl CredentialStore for SeaCredentialStore {
    async fn authenticate(&self, username: &str, password: &str) -> CoreResult<Authenticated> {
        let model = player::Entity::find()
            .filter(player::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(Self::internal)?
            .ok_or(CoreError::AuthInvalid)?;
        if !verify_password(password, &model.password_hash) {
            return Err(CoreError::AuthInvalid);
        }
        Ok(Authenticated {
            player: PlayerId(model.id),
            username: model.username,
            two_factor_enabled: model.two_factor_enabled,
        })
    }

    async fn verify_second_factor(&self, player: PlayerId, code: &str) -> CoreResult<bool> {
        let model = player::Entity::find_by_id(player.0)
            .one(&self.db)
            .await
            .map_err(Self::internal)?
            .ok_or(CoreError::NotFound("player"))?;
        let secret = match model.two_factor_secret {
            Some(s) => s,
            None => return Ok(false),
        };
        Ok(totp::verify(secret.as_bytes(), code))
    }

    async fn consume_backup_code(&self, player: PlayerId, code: &str) -> CoreResult<bool> {
        let candidates = player_backup_code::Entity::find()
            .filter(player_backup_code::Column::PlayerId.eq(player.0))
            .filter(player_backup_code::Column::Used.eq(false))
            .all(&self.db)
            .await
            .map_err(Self::internal)?;
        for candidate in candidates {
            if verify_password(code, &candidate.code_hash) {
                let mut active: player_backup_code::ActiveModel = candidate.into();
                active.used = Set(true);
                active.update(&self.db).await.map_err(Self::internal)?;
                return Ok(true);
            }
        }
        Ok(false)
    }
}
