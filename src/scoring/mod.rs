//! Per-variant scoring rules for live dart matches.
//!
//! Everything in this module is a pure function over scoring state: no I/O,
//! no locking, no knowledge of rooms or connections. The match store is the
//! only caller and invokes these under its own serialization.

pub mod around_the_world;
pub mod cricket;
pub mod x01;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

pub use self::cricket::CricketNumber;

/// Supported game variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub enum GameVariant {
    /// Standard cricket on 15-20 and bull.
    #[serde(rename = "cricket")]
    Cricket,
    /// 301 double-out.
    #[serde(rename = "301")]
    X301,
    /// 501 double-out.
    #[serde(rename = "501")]
    X501,
    /// Around the world: 1 through 20, then bull.
    #[serde(rename = "around_the_world")]
    AroundTheWorld,
}

impl GameVariant {
    /// Starting score for the numeric variants, `None` otherwise.
    pub fn starting_score(self) -> Option<u16> {
        match self {
            GameVariant::X301 => Some(301),
            GameVariant::X501 => Some(501),
            GameVariant::Cricket | GameVariant::AroundTheWorld => None,
        }
    }

    /// Fresh per-participant scoring state for this variant.
    pub fn initial_score_state(self) -> ScoreState {
        match self {
            GameVariant::Cricket => ScoreState::Cricket(CricketScore::default()),
            GameVariant::X301 | GameVariant::X501 => ScoreState::X01(X01Score {
                // starting_score is always Some for the numeric variants
                remaining: self.starting_score().unwrap_or_default(),
            }),
            GameVariant::AroundTheWorld => {
                ScoreState::AroundTheWorld(AroundTheWorldScore { target: 1 })
            }
        }
    }
}

/// Board segment hit by the bull (inner and outer are not distinguished).
pub const BULL_SEGMENT: u8 = 25;

/// A single reported dart: which segment it landed in (or a miss) and the
/// ring multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct Dart {
    /// Segment number 1-20, 25 for bull, or `None` for a miss.
    pub segment: Option<u8>,
    /// Ring multiplier: 1 single, 2 double, 3 triple.
    pub multiplier: u8,
}

/// Rejection raised for a dart outside the legal input domain.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DartError {
    /// Segment is not 1-20, 25, or a miss.
    #[error("segment `{0}` is not a dartboard segment")]
    Segment(u8),
    /// Multiplier is not 1, 2, or 3.
    #[error("multiplier `{0}` is not 1, 2, or 3")]
    Multiplier(u8),
}

impl Dart {
    /// Check the dart against the legal input domain.
    pub fn validate(self) -> Result<Self, DartError> {
        if let Some(segment) = self.segment
            && !(1..=20).contains(&segment)
            && segment != BULL_SEGMENT
        {
            return Err(DartError::Segment(segment));
        }
        if !(1..=3).contains(&self.multiplier) {
            return Err(DartError::Multiplier(self.multiplier));
        }
        Ok(self)
    }

    /// Face value of the dart: segment times multiplier, zero for a miss.
    pub fn raw_value(self) -> u16 {
        match self.segment {
            Some(segment) => u16::from(segment) * u16::from(self.multiplier),
            None => 0,
        }
    }
}

/// Cricket scoring fields: marks on the seven numbers plus accumulated points.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CricketScore {
    /// Hit counts indexed by [`CricketNumber`], unbounded above.
    pub marks: [u32; 7],
    /// Points accumulated on numbers already closed by this participant.
    pub points: u32,
}

/// 01-variant scoring fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct X01Score {
    /// Score left to check out, within `[0, starting score]`.
    pub remaining: u16,
}

/// Around-the-world scoring fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct AroundTheWorldScore {
    /// Next number to hit: 1-20, 21 for bull, 22 once the sequence is done.
    pub target: u8,
}

/// Variant-specific scoring state carried by each participant.
///
/// Tagged so the rules dispatch is a plain `match` instead of any dynamic
/// field lookup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ScoreState {
    /// Cricket marks and points.
    Cricket(CricketScore),
    /// Remaining score for 301/501.
    X01(X01Score),
    /// Current target for around the world.
    AroundTheWorld(AroundTheWorldScore),
}

/// Exact reversible record of what one committed throw changed.
///
/// Stored alongside each throw so undo subtracts precisely what was added,
/// in O(1), without replaying history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThrowEffect {
    /// Marks and points this throw contributed on one cricket number.
    Cricket {
        /// Number the dart landed on, if it was a scoring number.
        number: Option<CricketNumber>,
        /// Marks added to that number.
        marks_added: u32,
        /// Points the throw earned (only the marks beyond the closing third).
        points_scored: u32,
    },
    /// Remaining score immediately before the throw, restored verbatim on undo.
    X01 {
        /// Pre-throw remaining score.
        remaining_before: u16,
    },
    /// Whether the throw advanced the target.
    AroundTheWorld {
        /// True when the dart hit the then-current target.
        hit: bool,
    },
}

/// Structured result of applying one throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrowOutcome {
    /// Face value of the dart.
    pub raw_value: u16,
    /// True when the throw busted (01 variants only).
    pub bust: bool,
    /// True when the throw completed the match for the acting participant.
    pub finished: bool,
    /// Reversible record of the state change.
    pub effect: ThrowEffect,
}

/// Raised when a participant's scoring state does not belong to the variant
/// being dispatched. The store initializes every participant from the match
/// variant, so this indicates corrupted state rather than bad client input.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("participant scoring state does not match the {variant:?} rules")]
pub struct StateMismatch {
    /// Variant the rules were dispatched for.
    pub variant: GameVariant,
}

/// Apply one validated throw to the acting participant's scoring state.
///
/// `others` are the remaining participants' states (cricket needs them for
/// field-closure and win detection). `turn_start` is the acting
/// participant's remaining score at the start of the current turn and is
/// only consulted by the 01 variants for bust restoration.
pub fn apply_throw(
    variant: GameVariant,
    actor: &mut ScoreState,
    others: &[ScoreState],
    dart: Dart,
    turn_start: Option<u16>,
) -> Result<ThrowOutcome, StateMismatch> {
    match (variant, actor) {
        (GameVariant::Cricket, ScoreState::Cricket(score)) => {
            let other_scores: Vec<&CricketScore> = others
                .iter()
                .filter_map(|state| match state {
                    ScoreState::Cricket(other) => Some(other),
                    _ => None,
                })
                .collect();
            if other_scores.len() != others.len() {
                return Err(StateMismatch { variant });
            }
            Ok(cricket::apply_throw(score, &other_scores, dart))
        }
        (GameVariant::X301 | GameVariant::X501, ScoreState::X01(score)) => {
            let turn_start = turn_start.unwrap_or(score.remaining);
            Ok(x01::apply_throw(score, dart, turn_start))
        }
        (GameVariant::AroundTheWorld, ScoreState::AroundTheWorld(score)) => {
            Ok(around_the_world::apply_throw(score, dart))
        }
        (variant, _) => Err(StateMismatch { variant }),
    }
}

/// Reverse the state change recorded by a throw's [`ThrowEffect`].
///
/// Exact inverse of [`apply_throw`] for the most recent throw; the store
/// only ever undoes in strict reverse order.
pub fn revert_throw(actor: &mut ScoreState, effect: ThrowEffect) -> Result<(), StateMismatch> {
    match (actor, effect) {
        (
            ScoreState::Cricket(score),
            ThrowEffect::Cricket {
                number,
                marks_added,
                points_scored,
            },
        ) => {
            cricket::revert_throw(score, number, marks_added, points_scored);
            Ok(())
        }
        (ScoreState::X01(score), ThrowEffect::X01 { remaining_before }) => {
            score.remaining = remaining_before;
            Ok(())
        }
        (ScoreState::AroundTheWorld(score), ThrowEffect::AroundTheWorld { hit }) => {
            around_the_world::revert_throw(score, hit);
            Ok(())
        }
        (ScoreState::Cricket(_), _) => Err(StateMismatch {
            variant: GameVariant::Cricket,
        }),
        (ScoreState::X01(_), _) => Err(StateMismatch {
            variant: GameVariant::X501,
        }),
        (ScoreState::AroundTheWorld(_), _) => Err(StateMismatch {
            variant: GameVariant::AroundTheWorld,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dart_validation_covers_the_board() {
        for segment in 1..=20u8 {
            assert!(
                Dart {
                    segment: Some(segment),
                    multiplier: 3
                }
                .validate()
                .is_ok()
            );
        }
        assert!(
            Dart {
                segment: Some(BULL_SEGMENT),
                multiplier: 2
            }
            .validate()
            .is_ok()
        );
        assert!(
            Dart {
                segment: None,
                multiplier: 1
            }
            .validate()
            .is_ok()
        );

        assert_eq!(
            Dart {
                segment: Some(21),
                multiplier: 1
            }
            .validate(),
            Err(DartError::Segment(21))
        );
        assert_eq!(
            Dart {
                segment: Some(20),
                multiplier: 0
            }
            .validate(),
            Err(DartError::Multiplier(0))
        );
        assert_eq!(
            Dart {
                segment: Some(20),
                multiplier: 4
            }
            .validate(),
            Err(DartError::Multiplier(4))
        );
    }

    #[test]
    fn raw_value_is_segment_times_multiplier() {
        let triple_twenty = Dart {
            segment: Some(20),
            multiplier: 3,
        };
        assert_eq!(triple_twenty.raw_value(), 60);

        let miss = Dart {
            segment: None,
            multiplier: 1,
        };
        assert_eq!(miss.raw_value(), 0);
    }

    #[test]
    fn initial_state_follows_variant() {
        assert_eq!(
            GameVariant::X301.initial_score_state(),
            ScoreState::X01(X01Score { remaining: 301 })
        );
        assert_eq!(
            GameVariant::X501.initial_score_state(),
            ScoreState::X01(X01Score { remaining: 501 })
        );
        assert_eq!(
            GameVariant::AroundTheWorld.initial_score_state(),
            ScoreState::AroundTheWorld(AroundTheWorldScore { target: 1 })
        );
        match GameVariant::Cricket.initial_score_state() {
            ScoreState::Cricket(score) => {
                assert_eq!(score.marks, [0; 7]);
                assert_eq!(score.points, 0);
            }
            other => panic!("unexpected state {other:?}"),
        }
    }

    #[test]
    fn mismatched_state_is_rejected() {
        let mut wrong = ScoreState::X01(X01Score { remaining: 301 });
        let dart = Dart {
            segment: Some(20),
            multiplier: 1,
        };
        let err = apply_throw(GameVariant::Cricket, &mut wrong, &[], dart, None).unwrap_err();
        assert_eq!(
            err,
            StateMismatch {
                variant: GameVariant::Cricket
            }
        );
    }

    #[test]
    fn variant_wire_names() {
        assert_eq!(
            serde_json::to_string(&GameVariant::X301).unwrap(),
            "\"301\""
        );
        assert_eq!(
            serde_json::to_string(&GameVariant::Cricket).unwrap(),
            "\"cricket\""
        );
        assert_eq!(
            serde_json::from_str::<GameVariant>("\"around_the_world\"").unwrap(),
            GameVariant::AroundTheWorld
        );
    }
}
