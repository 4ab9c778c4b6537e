// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! sea-orm implementations of the trait boundary `pong-core` defines in
//! `pong_core::store`. This is the only place in the workspace that imports both
//! `core` and `sea_orm`; `core` itself never does (see `pong_core::store`'s
//! module doc).

use async_trait::async_trait;
use chrono::Utc;
use common::error::{CoreError, CoreResult};
use common::id::{GameId, PlayerId, RefreshId, RequestId, TournamentId};
use pong_core::store::{
    BlockListStore, FinalizeOutcome, GameHistoryEntry, GameRequestRecord, GameStore,
    RefreshBlacklist, RequestStatus, RequestStore, TournamentSlot, TournamentStore, UserStore,
};
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, TransactionTrait,
};

use crate::db::entities::{
    block, friendship, game_request, player, pong_game, refresh_blacklist, tournament,
    tournament_game,
};

fn internal(e: sea_orm::DbErr) -> CoreError {
    CoreError::Internal(e.to_string())
}

pub struct SeaUserStore {
    db: DatabaseConnection,
}

impl SeaUserStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserStore for SeaUserStore {
    async fn set_online(&self, player: PlayerId, online: bool) -> CoreResult<()> {
        let model = player::Entity::find_by_id(player.0)
            .one(&self.db)
            .await
            .map_err(internal)?
            .ok_or(CoreError::NotFound("player"))?;
        let mut active: player::ActiveModel = model.into();
        active.online = Set(online);
        active.update(&self.db).await.map_err(internal)?;
        Ok(())
    }

    async fn username(&self, player: PlayerId) -> CoreResult<String> {
        player::Entity::find_by_id(player.0)
            .one(&self.db)
            .await
            .map_err(internal)?
            .map(|m| m.username)
            .ok_or(CoreError::NotFound("player"))
    }

    async fn find_by_username(&self, username: &str) -> CoreResult<Option<PlayerId>> {
        Ok(player::Entity::find()
            .filter(player::Column::Username.eq(username))
            .one(&self.db)
            .await
            .map_err(internal)?
            .map(|m| PlayerId(m.id)))
    }

    async fn is_online(&self, player: PlayerId) -> CoreResult<bool> {
        player::Entity::find_by_id(player.0)
            .one(&self.db)
            .await
            .map_err(internal)?
            .map(|m| m.online)
            .ok_or(CoreError::NotFound("player"))
    }

    async fn friends_of(&self, player: PlayerId) -> CoreResult<Vec<PlayerId>> {
        let rows = friendship::Entity::find()
            .filter(
                friendship::Column::PlayerA
                    .eq(player.0)
                    .or(friendship::Column::PlayerB.eq(player.0)),
            )
            .all(&self.db)
            .await
            .map_err(internal)?;
        Ok(rows
            .into_iter()
            .map(|row| {
                if row.player_a == player.0 {
                    PlayerId(row.player_b)
                } else {
                    PlayerId(row.player_a)
                }
            })
            .collect())
    }
}

pub struct SeaBlockListStore {
    db: DatabaseConnection,
}

impl SeaBlockListStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl BlockListStore for SeaBlockListStore {
    async fn blocked_either_way(&self, a: PlayerId, b: PlayerId) -> CoreResult<bool> {
        let count = block::Entity::find()
            .filter(
                (block::Column::Player
                    .eq(a.0)
                    .and(block::Column::Blocked.eq(b.0)))
                .or(block::Column::Player
                    .eq(b.0)
                    .and(block::Column::Blocked.eq(a.0))),
            )
            .count(&self.db)
            .await
            .map_err(internal)?;
        Ok(count > 0)
    }
}

pub struct SeaGameStore {
    db: DatabaseConnection,
}

impl SeaGameStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl GameStore for SeaGameStore {
    async fn create_pending(&self, player1: PlayerId, player2: PlayerId) -> CoreResult<GameId> {
        let id = GameId::new();
        let active = pong_game::ActiveModel {
            id: Set(id.0),
            player1: Set(player1.0),
            player2: Set(player2.0),
            player1_score: Set(0),
            player2_score: Set(0),
            status: Set(pong_game::GameStatus::Pending),
            winner: Set(None),
            created_at: Set(Utc::now().into()),
        };
        active.insert(&self.db).await.map_err(internal)?;
        Ok(id)
    }

    async fn has_nonterminal_game(&self, player: PlayerId) -> CoreResult<bool> {
        let count = pong_game::Entity::find()
            .filter(
                (pong_game::Column::Player1
                    .eq(player.0)
                    .or(pong_game::Column::Player2.eq(player.0)))
                .and(pong_game::Column::Status.ne(pong_game::GameStatus::Finished)),
            )
            .count(&self.db)
            .await
            .map_err(internal)?;
        Ok(count > 0)
    }

    /// Row-locked and idempotent per §4.2: re-reads the row with `FOR
    /// UPDATE` inside one transaction so two racing disconnect paths (the
    /// spec's "double finalize" failure mode, §9) cannot both win.
    async fn finalize(
        &self,
        game_id: GameId,
        player1_score: u32,
        player2_score: u32,
        winner: PlayerId,
    ) -> CoreResult<FinalizeOutcome> {
        let txn = self.db.begin().await.map_err(internal)?;

        let row = pong_game::Entity::find_by_id(game_id.0)
            .lock_exclusive()
            .one(&txn)
            .await
            .map_err(internal)?
            .ok_or(CoreError::NotFound("pong game"))?;

        if row.status == pong_game::GameStatus::Finished {
            txn.commit().await.map_err(internal)?;
            return Ok(FinalizeOutcome {
                already_finished: true,
            });
        }

        let loser = if row.player1 == winner.0 {
            row.player2
        } else {
            row.player1
        };

        let mut active: pong_game::ActiveModel = row.into();
        active.status = Set(pong_game::GameStatus::Finished);
        active.player1_score = Set(player1_score as i32);
        active.player2_score = Set(player2_score as i32);
        active.winner = Set(Some(winner.0));
        active.update(&txn).await.map_err(internal)?;

        bump_counter(&txn, winner.0, true).await?;
        bump_counter(&txn, loser, false).await?;

        txn.commit().await.map_err(internal)?;
        Ok(FinalizeOutcome {
            already_finished: false,
        })
    }

    async fn history_for(&self, player: PlayerId) -> CoreResult<Vec<GameHistoryEntry>> {
        let rows = pong_game::Entity::find()
            .filter(
                pong_game::Column::Player1
                    .eq(player.0)
                    .or(pong_game::Column::Player2.eq(player.0)),
            )
            .order_by_desc(pong_game::Column::CreatedAt)
            .all(&self.db)
            .await
            .map_err(internal)?;
        Ok(rows
            .into_iter()
            .map(|row| GameHistoryEntry {
                game_id: GameId(row.id),
                player1: PlayerId(row.player1),
                player2: PlayerId(row.player2),
                player1_score: row.player1_score as u32,
                player2_score: row.player2_score as u32,
                winner: row.winner.map(PlayerId),
                created_at: row.created_at,
            })
            .collect())
    }
}

async fn bump_counter(
    txn: &sea_orm::DatabaseTransaction,
    player_id: uuid::Uuid,
    won: bool,
) -> CoreResult<()> {
    let model = player::Entity::find_by_id(player_id)
        .lock_exclusive()
        .one(txn)
        .await
        .map_err(internal)?
        .ok_or(CoreError::NotFound("player"))?;
    let mut active: player::ActiveModel = model.clone().into();
    if won {
        active.wins = Set(model.wins + 1);
    } else {
        active.losses = Set(model.losses + 1);
    }
    active.update(txn).await.map_err(internal)?;
    Ok(())
}

pub struct SeaRequestStore {
    db: DatabaseConnection,
}

impl SeaRequestStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

fn to_record(model: game_request::Model) -> GameRequestRecord {
    GameRequestRecord {
        id: RequestId(model.id),
        requester: PlayerId(model.requester),
        opponent: PlayerId(model.opponent),
        status: match model.status {
            game_request::RequestStatus::Pending => RequestStatus::Pending,
            game_request::RequestStatus::Accepted => RequestStatus::Accepted,
            game_request::RequestStatus::Rejected => RequestStatus::Rejected,
        },
    }
}

#[async_trait]
impl RequestStore for SeaRequestStore {
    async fn create_pending(
        &self,
        requester: PlayerId,
        opponent: PlayerId,
    ) -> CoreResult<RequestId> {
        let id = RequestId::new();
        let active = game_request::ActiveModel {
            id: Set(id.0),
            requester: Set(requester.0),
            opponent: Set(opponent.0),
            status: Set(game_request::RequestStatus::Pending),
            created_at: Set(Utc::now().into()),
        };
        active.insert(&self.db).await.map_err(internal)?;
        Ok(id)
    }

    async fn get(&self, id: RequestId) -> CoreResult<Option<GameRequestRecord>> {
        Ok(game_request::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(internal)?
            .map(to_record))
    }

    async fn has_pending(&self, player: PlayerId) -> CoreResult<bool> {
        let count = game_request::Entity::find()
            .filter(
                (game_request::Column::Requester
                    .eq(player.0)
                    .or(game_request::Column::Opponent.eq(player.0)))
                .and(game_request::Column::Status.eq(game_request::RequestStatus::Pending)),
            )
            .count(&self.db)
            .await
            .map_err(internal)?;
        Ok(count > 0)
    }

    async fn set_accepted(&self, id: RequestId, _game_id: GameId) -> CoreResult<()> {
        let model = game_request::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(internal)?
            .ok_or(CoreError::NotFound("game request"))?;
        let mut active: game_request::ActiveModel = model.into();
        active.status = Set(game_request::RequestStatus::Accepted);
        active.update(&self.db).await.map_err(internal)?;
        Ok(())
    }

    async fn set_rejected(&self, id: RequestId) -> CoreResult<()> {
        let model = game_request::Entity::find_by_id(id.0)
            .one(&self.db)
            .await
            .map_err(internal)?
            .ok_or(CoreError::NotFound("game request"))?;
        let mut active: game_request::ActiveModel = model.into();
        active.status = Set(game_request::RequestStatus::Rejected);
        active.update(&self.db).await.map_err(internal)?;
        Ok(())
    }

    async fn delete_pending_for(&self, player: PlayerId) -> CoreResult<Vec<RequestId>> {
        let rows = game_request::Entity::find()
            .filter(
                (game_request::Column::Requester
                    .eq(player.0)
                    .or(game_request::Column::Opponent.eq(player.0)))
                .and(game_request::Column::Status.eq(game_request::RequestStatus::Pending)),
            )
            .all(&self.db)
            .await
            .map_err(internal)?;
        let ids: Vec<RequestId> = rows.iter().map(|r| RequestId(r.id)).collect();
        for row in rows {
            let active: game_request::ActiveModel = row.into();
            active.delete(&self.db).await.map_err(internal)?;
        }
        Ok(ids)
    }
}

pub struct SeaTournamentStore {
    db: DatabaseConnection,
}

impl SeaTournamentStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl TournamentStore for SeaTournamentStore {
    async fn create_in_progress(&self, participants: [PlayerId; 4]) -> CoreResult<TournamentId> {
        let id = TournamentId::new();
        let active = tournament::ActiveModel {
            id: Set(id.0),
            player1: Set(participants[0].0),
            player2: Set(participants[1].0),
            player3: Set(participants[2].0),
            player4: Set(participants[3].0),
            winner: Set(None),
            status: Set(tournament::TournamentStatus::InProgress),
            created_at: Set(Utc::now().into()),
        };
        active.insert(&self.db).await.map_err(internal)?;
        Ok(id)
    }

    async fn attach_game(
        &self,
        tournament: TournamentId,
        game_id: GameId,
        slot: TournamentSlot,
    ) -> CoreResult<()> {
        let slot = match slot {
            TournamentSlot::Semi1 => tournament_game::TournamentSlot::Semi1,
            TournamentSlot::Semi2 => tournament_game::TournamentSlot::Semi2,
            TournamentSlot::Final => tournament_game::TournamentSlot::Final,
        };
        let active = tournament_game::ActiveModel {
            id: sea_orm::ActiveValue::NotSet,
            tournament_id: Set(tournament.0),
            game_id: Set(game_id.0),
            slot: Set(slot),
        };
        active.insert(&self.db).await.map_err(internal)?;
        Ok(())
    }

    async fn set_finished(&self, tournament: TournamentId, winner: PlayerId) -> CoreResult<()> {
        let model = tournament::Entity::find_by_id(tournament.0)
            .one(&self.db)
            .await
            .map_err(internal)?
            .ok_or(CoreError::NotFound("tournament"))?;
        let mut active: tournament::ActiveModel = model.into();
        active.winner = Set(Some(winner.0));
        active.status = Set(tournament::TournamentStatus::Finished);
        active.update(&self.db).await.map_err(internal)?;
        Ok(())
    }
}

pub struct SeaRefreshBlacklist {
    db: DatabaseConnection,
}

impl SeaRefreshBlacklist {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }
}

#[async_trait]
impl RefreshBlacklist for SeaRefreshBlacklist {
    async fn is_blacklisted(&self, jti: RefreshId) -> CoreResult<bool> {
        Ok(refresh_blacklist::Entity::find_by_id(jti.0)
            .one(&self.db)
            .await
            .map_err(internal)?
            .is_some())
    }

    async fn blacklist(&self, jti: RefreshId) -> CoreResult<()> {
        let active = refresh_blacklist::ActiveModel {
            jti: Set(jti.0),
            blacklisted_at: Set(Utc::now().into()),
        };
        // A jti can be blacklisted at most once in practice (rotation
        // consumes it immediately), but logout-after-rotation could race;
        // tolerate the resulting unique-constraint violation rather than
        // surfacing it.
        match active.insert(&self.db).await {
            Ok(_) => Ok(()),
            Err(e) => match e.sql_err() {
                Some(sea_orm::SqlErr::UniqueConstraintViolation(_)) => Ok(()),
                _ => Err(internal(e)),
            },
        }
    }
}
