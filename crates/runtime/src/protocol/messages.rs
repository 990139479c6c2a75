//! Wire messages exchanged over a session connection.
//!
//! Every message is one JSON object per line, tagged by `"type"` in
//! kebab-case with camelCase fields:
//!
//! ```text
//! → {"type":"create-room","id":1,"characterId":"knight"}
//! ← {"type":"response","id":1,"success":true,"roomCode":"K7Q2ZD","isHost":true}
//! → {"type":"submit-move","id":2,"maneuver":"smash"}
//! ← {"type":"response","id":2,"success":true}
//! ← {"type":"moves-revealed","round":1,"hostMove":"smash","guestMove":"kick"}
//! ```
//!
//! Responses go to the requester only. Everything else is a room event.

use serde::{Deserialize, Serialize};

use super::RoomCode;

/// Seat in a room. The host created it; the guest joined it.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Role {
    Host,
    Guest,
}

impl Role {
    pub fn opponent(self) -> Self {
        match self {
            Self::Host => Self::Guest,
            Self::Guest => Self::Host,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default, Serialize, Deserialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RoomStatus {
    #[default]
    Waiting,
    Battle,
    Gameover,
}

/// One revealed move pair, kept so a reclaiming peer can replay the battle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevealedMoves {
    pub round: u32,
    pub host_move: String,
    pub guest_move: String,
}

/// Client → server request body.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientRequest {
    ListCharacters,
    CreateRoom { character_id: String },
    CreateInviteRoom { character_id: String },
    JoinRoom { room_code: String, character_id: String },
    ReclaimSeat { room_code: String, token: String },
    SubmitMove { maneuver: String },
    ReportDigest { round: u32, digest: String },
    /// Informational: the peer's local battle ended.
    GameOver { winner: Role },
    RequestRematch,
    AcceptRematch,
    LeaveRoom,
}

impl ClientRequest {
    pub fn kind(&self) -> &'static str {
        match self {
            Self::ListCharacters => "list-characters",
            Self::CreateRoom { .. } => "create-room",
            Self::CreateInviteRoom { .. } => "create-invite-room",
            Self::JoinRoom { .. } => "join-room",
            Self::ReclaimSeat { .. } => "reclaim-seat",
            Self::SubmitMove { .. } => "submit-move",
            Self::ReportDigest { .. } => "report-digest",
            Self::GameOver { .. } => "game-over",
            Self::RequestRematch => "request-rematch",
            Self::AcceptRematch => "accept-rematch",
            Self::LeaveRoom => "leave-room",
        }
    }
}

/// A request with its optional correlation id.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestEnvelope {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    #[serde(flatten)]
    pub request: ClientRequest,
}

impl RequestEnvelope {
    pub fn new(id: Option<u64>, request: ClientRequest) -> Self {
        Self { id, request }
    }
}

/// Successful response payload. Fields are present only where the request
/// produces them.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseBody {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room_code: Option<RoomCode>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_host: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host_character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub guest_character: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<RoomStatus>,
    /// Moves revealed so far, returned on seat reclamation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub history: Option<Vec<RevealedMoves>>,
    /// The reclaimer's own submitted but unrevealed move.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pending_move: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub characters: Option<Vec<String>>,
}

/// Server → client message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    Response {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        id: Option<u64>,
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        code: Option<String>,
        #[serde(flatten)]
        body: ResponseBody,
    },
    BattleStart {
        room_code: RoomCode,
        host_character: String,
        guest_character: String,
    },
    OpponentReady,
    MovesRevealed {
        round: u32,
        host_move: String,
        guest_move: String,
    },
    SyncMismatch {
        round: u32,
        host_digest: String,
        guest_digest: String,
    },
    RematchRequested,
    RematchStart,
    OpponentDisconnected {
        /// Set when the remaining guest now holds the host seat.
        promoted_to_host: bool,
    },
    OpponentReconnected,
    RoomClosed { reason: String },
}

impl ServerMessage {
    pub fn ok(id: Option<u64>, body: ResponseBody) -> Self {
        Self::Response {
            id,
            success: true,
            error: None,
            code: None,
            body,
        }
    }

    pub fn error(id: Option<u64>, code: &str, error: impl Into<String>) -> Self {
        Self::Response {
            id,
            success: false,
            error: Some(error.into()),
            code: Some(code.to_owned()),
            body: ResponseBody::default(),
        }
    }

    pub fn is_response(&self) -> bool {
        matches!(self, Self::Response { .. })
    }

    pub fn to_line(&self) -> serde_json::Result<String> {
        let mut line = serde_json::to_string(self)?;
        line.push('\n');
        Ok(line)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn requests_parse_from_kebab_case_tags() {
        let envelope: RequestEnvelope = serde_json::from_value(json!({
            "type": "join-room",
            "id": 4,
            "roomCode": "ab12cd",
            "characterId": "goblin"
        }))
        .unwrap();

        assert_eq!(envelope.id, Some(4));
        assert_eq!(
            envelope.request,
            ClientRequest::JoinRoom {
                room_code: "ab12cd".into(),
                character_id: "goblin".into(),
            }
        );

        let bare: RequestEnvelope =
            serde_json::from_str(r#"{"type":"accept-rematch"}"#).unwrap();
        assert_eq!(bare.id, None);
        assert_eq!(bare.request, ClientRequest::AcceptRematch);
    }

    #[test]
    fn responses_flatten_body_and_omit_empty_fields() {
        let message = ServerMessage::ok(
            Some(1),
            ResponseBody {
                room_code: RoomCode::parse("K7Q2ZD"),
                is_host: Some(true),
                ..Default::default()
            },
        );
        assert_eq!(
            serde_json::to_value(&message).unwrap(),
            json!({"type": "response", "id": 1, "success": true, "roomCode": "K7Q2ZD", "isHost": true})
        );

        let error = ServerMessage::error(None, "ROOM_FULL", "room is full");
        assert_eq!(
            serde_json::to_value(&error).unwrap(),
            json!({"type": "response", "success": false, "error": "room is full", "code": "ROOM_FULL"})
        );
    }

    #[test]
    fn events_use_camel_case_fields() {
        let line = ServerMessage::MovesRevealed {
            round: 3,
            host_move: "smash".into(),
            guest_move: "kick".into(),
        }
        .to_line()
        .unwrap();
        assert!(line.ends_with('\n'));

        let parsed: ServerMessage = serde_json::from_str(line.trim_end()).unwrap();
        assert_eq!(
            serde_json::to_value(&parsed).unwrap(),
            json!({"type": "moves-revealed", "round": 3, "hostMove": "smash", "guestMove": "kick"})
        );
    }
}
