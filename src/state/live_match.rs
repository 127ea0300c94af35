//! In-memory model of one live match and its throw history.

use std::time::SystemTime;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    scoring::{GameVariant, ScoreState, ThrowEffect},
    state::sequencer::TurnCursor,
};

/// Lifecycle status of a live match. Transitions are one-way:
/// Waiting → Playing → Finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    /// Created, participants known, first dart not yet allowed.
    Waiting,
    /// Throws are being recorded.
    Playing,
    /// A winner was recorded or the creator abandoned the match.
    Finished,
}

impl MatchStatus {
    /// Lowercase name used in error messages and logs.
    pub fn as_str(self) -> &'static str {
        match self {
            MatchStatus::Waiting => "waiting",
            MatchStatus::Playing => "playing",
            MatchStatus::Finished => "finished",
        }
    }
}

/// One player's slot and scoring state within a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Participant {
    /// Identity of the player occupying this slot.
    pub user_id: Uuid,
    /// Display name captured at match creation.
    pub name: String,
    /// Stable order position assigned at creation.
    pub order: usize,
    /// Variant-specific scoring fields, mutated only by the rules engine.
    pub score: ScoreState,
}

/// One recorded dart.
///
/// The position in [`LiveMatch::throws`] is the sequence order: gap-free
/// while the match is live, appended by apply and popped by undo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThrowRecord {
    /// Identifier carried on broadcast events.
    pub id: Uuid,
    /// Participant the throw was applied to.
    pub participant_id: Uuid,
    /// Turn number the throw was recorded in.
    pub turn: u32,
    /// Dart within the turn, 1 through 3.
    pub dart: u8,
    /// Segment hit, 25 for bull, `None` for a miss.
    pub segment: Option<u8>,
    /// Ring multiplier 1-3.
    pub multiplier: u8,
    /// Face value of the dart.
    pub raw_value: u16,
    /// Whether the throw busted.
    pub bust: bool,
    /// Identity that entered the throw; may differ from the thrower when a
    /// shared device is doing the scoring.
    pub entered_by: Uuid,
    /// Reversible record of the scoring change, consumed by undo.
    pub effect: ThrowEffect,
}

/// One in-progress, co-scored dart game instance.
#[derive(Debug, Clone)]
pub struct LiveMatch {
    /// Match identifier.
    pub id: Uuid,
    /// Game variant the rules are dispatched on.
    pub variant: GameVariant,
    /// Lifecycle status.
    pub status: MatchStatus,
    /// Starting score for the 01 variants.
    pub starting_score: Option<u16>,
    /// Participants keyed by participant id, in play order.
    pub participants: IndexMap<Uuid, Participant>,
    /// Whose turn it is, which dart, which turn.
    pub cursor: TurnCursor,
    /// Winning participant, set only when the status is Finished.
    pub winner: Option<Uuid>,
    /// Identity that created the match; start/end are restricted to it.
    pub created_by: Uuid,
    /// Creation timestamp for auditing.
    pub created_at: SystemTime,
    /// Ordered throw history.
    pub throws: Vec<ThrowRecord>,
}

impl LiveMatch {
    /// Participant id and slot at the current cursor position.
    ///
    /// The cursor index is kept valid by construction (participants are
    /// never removed individually), so `None` only occurs on a corrupted
    /// record.
    pub fn current_participant(&self) -> Option<(Uuid, &Participant)> {
        self.participants
            .get_index(self.cursor.player)
            .map(|(id, participant)| (*id, participant))
    }

    /// Whether the given identity occupies one of the participant slots.
    pub fn is_participant(&self, user_id: Uuid) -> bool {
        self.participants
            .values()
            .any(|participant| participant.user_id == user_id)
    }

    /// Scoring states of every participant except `actor`, in play order.
    pub fn other_scores(&self, actor: Uuid) -> Vec<ScoreState> {
        self.participants
            .iter()
            .filter(|(id, _)| **id != actor)
            .map(|(_, participant)| participant.score.clone())
            .collect()
    }

    /// Remaining score at the start of the current turn for the acting
    /// participant of a 01 match.
    ///
    /// Derived by replaying the throw history rather than caching: the first
    /// committed throw of the current turn recorded the pre-throw remaining,
    /// and with no throws yet this turn the current remaining is the answer.
    pub fn turn_start_score(&self, actor: Uuid) -> Option<u16> {
        let first_of_turn = self
            .throws
            .iter()
            .find(|throw| throw.participant_id == actor && throw.turn == self.cursor.turn);

        match first_of_turn {
            Some(throw) => match throw.effect {
                ThrowEffect::X01 { remaining_before } => Some(remaining_before),
                _ => None,
            },
            None => match &self.participants.get(&actor)?.score {
                ScoreState::X01(score) => Some(score.remaining),
                _ => None,
            },
        }
    }
}
