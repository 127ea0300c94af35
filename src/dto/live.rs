//! Projections of live match state shared by REST responses and broadcasts.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{format_system_time, validation::validate_display_name},
    scoring::{GameVariant, ScoreState},
    state::live_match::{LiveMatch, MatchStatus, Participant, ThrowRecord},
};

/// Payload used to bootstrap a brand-new live match.
#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateMatchRequest {
    /// Variant to play.
    pub variant: GameVariant,
    /// Player slots in throwing order; at least two.
    pub players: Vec<PlayerInput>,
    /// Identity of the creator, granted the start/end operations.
    pub created_by: Uuid,
}

impl Validate for CreateMatchRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if self.players.len() < 2 {
            let mut err = validator::ValidationError::new("players");
            err.message = Some("a match requires at least two players".into());
            errors.add("players", err);
        }
        for player in &self.players {
            if let Err(err) = validate_display_name(&player.name) {
                errors.add("players", err);
            }
        }

        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

/// Incoming player definition for the match bootstrap.
#[derive(Debug, Deserialize, ToSchema)]
pub struct PlayerInput {
    /// Identity of the player.
    pub user_id: Uuid,
    /// Display name shown to the room.
    pub name: String,
}

/// Full point-in-time projection of one live match.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct MatchSnapshot {
    /// Match identifier.
    pub id: Uuid,
    /// Game variant.
    pub variant: GameVariant,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Starting score for the 01 variants.
    pub starting_score: Option<u16>,
    /// Index of the participant whose turn it is.
    pub current_player_index: usize,
    /// Dart within the current turn, 1-3.
    pub current_dart: u8,
    /// Monotonic turn number.
    pub current_turn: u32,
    /// Identity that created the match.
    pub created_by: Uuid,
    /// RFC3339 creation timestamp.
    pub created_at: String,
    /// Winning participant, only when finished.
    pub winner_participant_id: Option<Uuid>,
    /// Participants in play order with their scoring fields.
    pub participants: Vec<ParticipantSnapshot>,
    /// Full ordered throw history.
    pub throws: Vec<ThrowSnapshot>,
}

/// Projection of one participant slot.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ParticipantSnapshot {
    /// Participant identifier within the match.
    pub id: Uuid,
    /// Identity occupying the slot.
    pub user_id: Uuid,
    /// Display name.
    pub name: String,
    /// Stable order position.
    pub order: usize,
    /// Variant-specific scoring fields.
    #[serde(flatten)]
    pub score: ScoreState,
}

/// Projection of one recorded throw.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ThrowSnapshot {
    /// Throw identifier.
    pub id: Uuid,
    /// Participant the throw was applied to.
    pub participant_id: Uuid,
    /// Turn the throw was recorded in.
    pub turn: u32,
    /// Dart within the turn.
    pub dart: u8,
    /// Segment hit, 25 for bull, `None` for a miss.
    pub segment: Option<u8>,
    /// Ring multiplier.
    pub multiplier: u8,
    /// Face value.
    pub raw_value: u16,
    /// Whether the throw busted.
    pub bust: bool,
    /// Identity that entered the throw.
    pub entered_by: Uuid,
}

impl From<(Uuid, &Participant)> for ParticipantSnapshot {
    fn from((id, participant): (Uuid, &Participant)) -> Self {
        Self {
            id,
            user_id: participant.user_id,
            name: participant.name.clone(),
            order: participant.order,
            score: participant.score.clone(),
        }
    }
}

impl From<&ThrowRecord> for ThrowSnapshot {
    fn from(record: &ThrowRecord) -> Self {
        Self {
            id: record.id,
            participant_id: record.participant_id,
            turn: record.turn,
            dart: record.dart,
            segment: record.segment,
            multiplier: record.multiplier,
            raw_value: record.raw_value,
            bust: record.bust,
            entered_by: record.entered_by,
        }
    }
}

impl From<&LiveMatch> for MatchSnapshot {
    fn from(live: &LiveMatch) -> Self {
        Self {
            id: live.id,
            variant: live.variant,
            status: live.status,
            starting_score: live.starting_score,
            current_player_index: live.cursor.player,
            current_dart: live.cursor.dart,
            current_turn: live.cursor.turn,
            created_by: live.created_by,
            created_at: format_system_time(live.created_at),
            winner_participant_id: live.winner,
            participants: live
                .participants
                .iter()
                .map(|(id, participant)| (*id, participant).into())
                .collect(),
            throws: live.throws.iter().map(Into::into).collect(),
        }
    }
}
