// SPDX-FileCopyrightText: 2026 Cory Bear
// SPDX-License-Identifier: AGPL-3.0-or-later

//! Text-JSON control frames exchanged on the pong, matchmaking, tournament,
//! and notification sockets. The binary game-state frame (see [`crate::wire`])
//! is carried out-of-band from these.

use crate::id::{GameId, PlayerId, RequestId, TournamentId};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
pub struct PlayerSummary {
    pub username: String,
    pub avatar: Option<String>,
    pub role: &'static str,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct PlayerInfoData {
    pub current_player: PlayerSummary,
    pub opponent: Option<PlayerSummary>,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameOverReason {
    Natural,
    Forfeit,
}

/// Server -> client frames. Tagged on `status` to match the wire contract
/// verbatim; add variants here rather than inventing a second envelope.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ControlFrame {
    PlayerInfo {
        data: PlayerInfoData,
    },
    GameStart {
        game_id: GameId,
    },
    GameOver {
        winner: Option<PlayerId>,
        #[serde(skip_serializing_if = "Option::is_none")]
        reason: Option<GameOverReason>,
    },
    Matched {
        game_id: GameId,
    },
    Cancelled {
        message: String,
    },
}

/// Client -> server frame on the matchmaking socket. The pong socket instead
/// takes raw `"w"`/`"s"` text, handled directly by the session (see
/// `server::session`).
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum MatchmakingCommand {
    CancelMatchmaking,
}

/// Events the notification hub fans out, wrapped in a `message` envelope.
/// The hub itself treats the payload as opaque JSON; this enum exists so
/// producers and consumers inside this crate agree on shape for the event
/// kinds the core specifies.
#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HubEvent {
    FriendRequest,
    GameRequest {
        request_id: RequestId,
        requester_name: String,
        avatar: Option<String>,
    },
    GameRequestResponse {
        game_id: Option<GameId>,
    },
    Tournament {
        tournament_id: TournamentId,
    },
    OnlineStatus {
        username: String,
        online: bool,
    },
    ChatMessage {
        conversation_id: uuid::Uuid,
        data: serde_json::Value,
    },
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct HubEnvelope {
    pub message: HubEvent,
}

impl From<HubEvent> for HubEnvelope {
    fn from(message: HubEvent) -> Self {
        Self { message }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn matched_frame_serializes_per_contract() {
        let frame = ControlFrame::Matched {
            game_id: GameId::nil(),
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert_eq!(json["status"], "matched");
        assert!(json.get("game_id").is_some());
    }

    #[test]
    fn cancel_matchmaking_round_trips() {
        let raw = r#"{"action":"cancel_matchmaking"}"#;
        let cmd: MatchmakingCommand = serde_json::from_str(raw).unwrap();
        assert_eq!(cmd, MatchmakingCommand::CancelMatchmaking);
    }

    #[test]
    fn game_over_omits_reason_when_absent() {
        let frame = ControlFrame::GameOver {
            winner: None,
            reason: None,
        };
        let json = serde_json::to_value(&frame).unwrap();
        assert!(json.get("reason").is_none());
    }
}
