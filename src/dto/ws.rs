//! WebSocket envelope: `{type, payload}` messages in both directions.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::dto::live::MatchSnapshot;

/// Messages accepted from scoring clients.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ClientMessage {
    /// First message on every connection: resolve the sender's identity.
    Identify {
        /// Opaque token handed to the identity resolver.
        token: String,
    },
    /// Join the room observing one match.
    JoinGame {
        /// Match to join.
        game_id: Uuid,
    },
    /// Leave the currently joined room.
    LeaveGame,
    /// Record one dart against the match.
    ThrowDart {
        /// Match the throw targets.
        game_id: Uuid,
        /// Segment 1-20, 25 for bull, or `null` for a miss.
        segment: Option<u8>,
        /// Ring multiplier 1-3.
        multiplier: u8,
    },
    /// Undo the most recent throw.
    UndoThrow {
        /// Match to undo against.
        game_id: Uuid,
    },
    /// Start the match (creator only).
    StartGame {
        /// Match to start.
        game_id: Uuid,
    },
    /// End the match early (creator only).
    EndGame {
        /// Match to end.
        game_id: Uuid,
    },
    /// Anything with an unrecognized `type`.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Envelope tags this enum decodes into a concrete variant.
    const KNOWN_TYPES: [&'static str; 7] = [
        "identify",
        "join_game",
        "leave_game",
        "throw_dart",
        "undo_throw",
        "start_game",
        "end_game",
    ];

    /// Decode a client envelope from its JSON text frame.
    ///
    /// An unrecognized `type` decodes to [`ClientMessage::Unknown`] whether
    /// or not a payload is attached (`#[serde(other)]` alone rejects unknown
    /// tags that carry one); malformed payloads for known types still error.
    pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
        match serde_json::from_str(text) {
            Ok(message) => Ok(message),
            Err(err) => {
                let value: serde_json::Value = serde_json::from_str(text)?;
                match value.get("type").and_then(serde_json::Value::as_str) {
                    Some(tag) if !Self::KNOWN_TYPES.contains(&tag) => Ok(ClientMessage::Unknown),
                    _ => Err(err),
                }
            }
        }
    }
}

/// Messages pushed to scoring clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Acknowledges a successful `identify`.
    Welcome {
        /// Resolved identity.
        user_id: Uuid,
        /// Resolved display name.
        name: String,
    },
    /// Full match snapshot, sent after every successful mutation and on join.
    GameState(MatchSnapshot),
    /// A throw was committed.
    ThrowRecorded {
        /// The appended throw.
        throw_id: Uuid,
        /// Participant the throw was applied to.
        player_id: Uuid,
        /// Display name of that participant.
        player_name: String,
        /// Segment hit, `null` for a miss.
        segment: Option<u8>,
        /// Ring multiplier.
        multiplier: u8,
        /// Face value.
        raw_value: u16,
        /// Whether the throw busted.
        is_bust: bool,
        /// Identity that entered the throw.
        entered_by: Uuid,
        /// Whether the throw finished the match.
        finished: bool,
    },
    /// The most recent throw was undone.
    ThrowUndone {
        /// The removed throw.
        throw_id: Uuid,
        /// Participant whose throw was removed.
        player_id: Uuid,
        /// Identity that requested the undo.
        undone_by: Uuid,
    },
    /// The match moved from Waiting to Playing.
    GameStarted {
        /// Match that started.
        game_id: Uuid,
    },
    /// The match finished with a winner.
    GameEnded {
        /// Match that ended.
        game_id: Uuid,
        /// Winning participant slot.
        winner_id: Uuid,
        /// Identity of the winning player.
        winner_user_id: Uuid,
        /// Why the match ended (`"won"`).
        reason: String,
    },
    /// The creator ended the match before completion.
    GameAbandoned {
        /// Match that was abandoned.
        game_id: Uuid,
        /// Identity that abandoned it.
        abandoned_by: Uuid,
    },
    /// A user joined the room.
    PlayerJoined {
        /// Joining identity.
        user_id: Uuid,
        /// Joining display name.
        user_name: String,
    },
    /// A user left the room (or its connection timed out).
    PlayerLeft {
        /// Leaving identity.
        user_id: Uuid,
        /// Leaving display name.
        user_name: String,
    },
    /// Per-operation failure, reported only to the offending connection.
    Error {
        /// Human-readable message.
        message: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_envelope_decodes_by_type() {
        let text = r#"{"type":"throw_dart","payload":{"game_id":"5a40c2ca-7f2b-4c3b-9a38-3f1c0f1df001","segment":20,"multiplier":3}}"#;
        match ClientMessage::from_json_str(text).unwrap() {
            ClientMessage::ThrowDart {
                segment,
                multiplier,
                ..
            } => {
                assert_eq!(segment, Some(20));
                assert_eq!(multiplier, 3);
            }
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn miss_is_a_null_segment() {
        let text = r#"{"type":"throw_dart","payload":{"game_id":"5a40c2ca-7f2b-4c3b-9a38-3f1c0f1df001","segment":null,"multiplier":1}}"#;
        match ClientMessage::from_json_str(text).unwrap() {
            ClientMessage::ThrowDart { segment, .. } => assert_eq!(segment, None),
            other => panic!("unexpected message {other:?}"),
        }
    }

    #[test]
    fn leave_game_needs_no_payload() {
        let text = r#"{"type":"leave_game"}"#;
        assert!(matches!(
            ClientMessage::from_json_str(text).unwrap(),
            ClientMessage::LeaveGame
        ));
    }

    #[test]
    fn unknown_types_decode_without_error() {
        // With and without a payload attached.
        let with_payload = r#"{"type":"dance","payload":{}}"#;
        assert!(matches!(
            ClientMessage::from_json_str(with_payload).unwrap(),
            ClientMessage::Unknown
        ));

        let without_payload = r#"{"type":"dance"}"#;
        assert!(matches!(
            ClientMessage::from_json_str(without_payload).unwrap(),
            ClientMessage::Unknown
        ));
    }

    #[test]
    fn malformed_payloads_for_known_types_still_error() {
        let text = r#"{"type":"throw_dart","payload":{"multiplier":"three"}}"#;
        assert!(ClientMessage::from_json_str(text).is_err());
    }

    #[test]
    fn server_envelope_carries_the_type_tag() {
        let message = ServerMessage::GameStarted {
            game_id: Uuid::new_v4(),
        };
        let json = serde_json::to_value(&message).unwrap();
        assert_eq!(json["type"], "game_started");
        assert!(json["payload"]["game_id"].is_string());
    }
}
