//! In-memory store of live matches with atomic apply/undo operations.

use std::time::SystemTime;

use dashmap::DashMap;
use uuid::Uuid;

use crate::{
    error::EngineError,
    scoring::{self, Dart, GameVariant, ThrowOutcome},
    state::{
        live_match::{LiveMatch, MatchStatus, Participant, ThrowRecord},
        sequencer::TurnCursor,
    },
};

/// Player slot supplied when creating a match.
#[derive(Debug, Clone)]
pub struct NewParticipant {
    /// Identity of the player.
    pub user_id: Uuid,
    /// Display name shown to co-scorers.
    pub name: String,
}

/// Result of committing one throw.
#[derive(Debug, Clone)]
pub struct CommittedThrow {
    /// The appended throw record.
    pub record: ThrowRecord,
    /// Whether the throw finished the match.
    pub finished: bool,
    /// Full match state after the throw.
    pub state: LiveMatch,
}

/// Owns one in-memory record per live match.
///
/// The store itself only guards map-level access (via `DashMap` sharding);
/// total ordering of mutations per match is provided by the room actor that
/// is the sole caller for a given match id.
#[derive(Debug, Default)]
pub struct MatchStore {
    matches: DashMap<Uuid, LiveMatch>,
}

impl MatchStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a live match in the Waiting state.
    ///
    /// Participants keep the supplied order; variant-specific scoring fields
    /// are initialized per slot. Fewer than two participants is rejected.
    pub fn create(
        &self,
        variant: GameVariant,
        players: Vec<NewParticipant>,
        created_by: Uuid,
    ) -> Result<LiveMatch, EngineError> {
        if players.len() < 2 {
            return Err(EngineError::InvalidOperation(
                "a match requires at least two participants".into(),
            ));
        }

        let participants = players
            .into_iter()
            .enumerate()
            .map(|(order, player)| {
                (
                    Uuid::new_v4(),
                    Participant {
                        user_id: player.user_id,
                        name: player.name,
                        order,
                        score: variant.initial_score_state(),
                    },
                )
            })
            .collect();

        let live = LiveMatch {
            id: Uuid::new_v4(),
            variant,
            status: MatchStatus::Waiting,
            starting_score: variant.starting_score(),
            participants,
            cursor: TurnCursor::default(),
            winner: None,
            created_by,
            created_at: SystemTime::now(),
            throws: Vec::new(),
        };

        self.matches.insert(live.id, live.clone());
        Ok(live)
    }

    /// Clone the current state of a match.
    pub fn snapshot(&self, id: Uuid) -> Result<LiveMatch, EngineError> {
        self.matches
            .get(&id)
            .map(|entry| entry.clone())
            .ok_or(EngineError::NoSuchMatch(id))
    }

    /// Move a Waiting match to Playing. Restricted to the creator.
    pub fn start(&self, id: Uuid, by: Uuid) -> Result<LiveMatch, EngineError> {
        let mut entry = self.matches.get_mut(&id).ok_or(EngineError::NoSuchMatch(id))?;
        if entry.created_by != by {
            return Err(EngineError::NotAuthorized(
                "only the match creator can start it".into(),
            ));
        }
        if entry.status != MatchStatus::Waiting {
            return Err(EngineError::InvalidOperation(format!(
                "match is already {}",
                entry.status.as_str()
            )));
        }

        entry.status = MatchStatus::Playing;
        Ok(entry.clone())
    }

    /// Record one throw against the participant whose turn it is.
    ///
    /// The store, not the caller, resolves the acting participant from the
    /// turn cursor, so out-of-turn client input can never score for another
    /// player. `recorded_by` must be one of the match participants; it is
    /// kept on the record because shared-device scoring means the recorder
    /// and the thrower can differ.
    pub fn apply_throw(
        &self,
        id: Uuid,
        dart: Dart,
        recorded_by: Uuid,
    ) -> Result<CommittedThrow, EngineError> {
        let mut entry = self.matches.get_mut(&id).ok_or(EngineError::NoSuchMatch(id))?;
        let live = entry.value_mut();

        if live.status != MatchStatus::Playing {
            return Err(EngineError::MatchNotPlaying {
                id,
                status: live.status.as_str(),
            });
        }
        if !live.is_participant(recorded_by) {
            return Err(EngineError::NotAuthorized(
                "only match participants can record throws".into(),
            ));
        }
        let dart = dart.validate()?;

        let (actor_id, _) = live
            .current_participant()
            .ok_or_else(|| EngineError::InvalidOperation("turn cursor out of range".into()))?;
        let turn_start = live.turn_start_score(actor_id);
        let others = live.other_scores(actor_id);
        let variant = live.variant;
        let cursor = live.cursor;

        let actor = live
            .participants
            .get_mut(&actor_id)
            .ok_or(EngineError::NoSuchMatch(id))?;
        let ThrowOutcome {
            raw_value,
            bust,
            finished,
            effect,
        } = scoring::apply_throw(variant, &mut actor.score, &others, dart, turn_start)?;

        let record = ThrowRecord {
            id: Uuid::new_v4(),
            participant_id: actor_id,
            turn: cursor.turn,
            dart: cursor.dart,
            segment: dart.segment,
            multiplier: dart.multiplier,
            raw_value,
            bust,
            entered_by: recorded_by,
            effect,
        };
        live.throws.push(record.clone());

        // A bust forfeits the remaining darts of the turn.
        let player_count = live.participants.len();
        if bust {
            live.cursor.end_turn(player_count);
        } else {
            live.cursor.advance(player_count);
        }

        if finished {
            live.status = MatchStatus::Finished;
            live.winner = Some(actor_id);
        }

        Ok(CommittedThrow {
            record,
            finished,
            state: live.clone(),
        })
    }

    /// Remove and reverse the most recent throw.
    ///
    /// The cursor is restored first (exact inverse for a scoring throw, the
    /// record's stored position for a bust that forfeited the turn), then
    /// the throw's recorded effect is subtracted; undoing a winning throw
    /// reverts the match to Playing and clears the winner.
    pub fn undo_last_throw(&self, id: Uuid) -> Result<(ThrowRecord, LiveMatch), EngineError> {
        let mut entry = self.matches.get_mut(&id).ok_or(EngineError::NoSuchMatch(id))?;
        let live = entry.value_mut();

        if live.status == MatchStatus::Waiting {
            return Err(EngineError::MatchNotPlaying {
                id,
                status: live.status.as_str(),
            });
        }

        // Non-empty checked via NothingToUndo
        let record = match live.throws.pop() {
            Some(record) => record,
            None => return Err(EngineError::NothingToUndo),
        };

        let player_count = live.participants.len();
        if record.bust {
            let player = live
                .participants
                .get_index_of(&record.participant_id)
                .ok_or(EngineError::NoSuchMatch(id))?;
            live.cursor = TurnCursor {
                player,
                dart: record.dart,
                turn: record.turn,
            };
        } else {
            live.cursor.reverse(player_count);
        }

        let participant = live
            .participants
            .get_mut(&record.participant_id)
            .ok_or(EngineError::NoSuchMatch(id))?;
        scoring::revert_throw(&mut participant.score, record.effect)?;

        if live.status == MatchStatus::Finished {
            live.status = MatchStatus::Playing;
            live.winner = None;
        }

        Ok((record, live.clone()))
    }

    /// Finish a match early without a winner. Restricted to the creator.
    pub fn end(&self, id: Uuid, by: Uuid) -> Result<LiveMatch, EngineError> {
        let mut entry = self.matches.get_mut(&id).ok_or(EngineError::NoSuchMatch(id))?;
        if entry.created_by != by {
            return Err(EngineError::NotAuthorized(
                "only the match creator can end it".into(),
            ));
        }
        if entry.status == MatchStatus::Finished {
            return Err(EngineError::InvalidOperation(
                "match is already finished".into(),
            ));
        }

        entry.status = MatchStatus::Finished;
        Ok(entry.clone())
    }

    /// Discard all in-memory state for a match.
    pub fn remove(&self, id: Uuid) {
        self.matches.remove(&id);
    }

    /// Number of live matches currently held.
    pub fn len(&self) -> usize {
        self.matches.len()
    }

    /// Whether the store holds no matches.
    pub fn is_empty(&self) -> bool {
        self.matches.is_empty()
    }
}
