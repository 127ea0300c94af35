//! Around-the-world rules: hit 1 through 20 in order, then the bull.

use super::{AroundTheWorldScore, BULL_SEGMENT, Dart, ThrowEffect, ThrowOutcome};

/// Target value that represents the bull.
pub const BULL_TARGET: u8 = 21;
/// Target value reached once the full sequence is complete.
pub const DONE_TARGET: u8 = 22;

/// Segment the given target requires, or `None` once the sequence is done.
fn required_segment(target: u8) -> Option<u8> {
    match target {
        1..=20 => Some(target),
        BULL_TARGET => Some(BULL_SEGMENT),
        _ => None,
    }
}

/// Apply a throw: the multiplier is accepted but ignored, only the segment
/// matters. A hit advances the target; reaching 22 completes the sequence.
pub fn apply_throw(actor: &mut AroundTheWorldScore, dart: Dart) -> ThrowOutcome {
    let hit = match (dart.segment, required_segment(actor.target)) {
        (Some(segment), Some(required)) => segment == required,
        _ => false,
    };

    if hit {
        actor.target += 1;
    }

    ThrowOutcome {
        raw_value: dart.raw_value(),
        bust: false,
        finished: actor.target >= DONE_TARGET,
        effect: ThrowEffect::AroundTheWorld { hit },
    }
}

/// Step the target back when the undone throw actually advanced it.
///
/// The hit flag stored per throw keeps the reversal exact: undoing a miss
/// never moves the target, so repeated undos cannot double-reverse.
pub fn revert_throw(actor: &mut AroundTheWorldScore, hit: bool) {
    if hit && actor.target > 1 {
        actor.target -= 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dart(segment: u8, multiplier: u8) -> Dart {
        Dart {
            segment: Some(segment),
            multiplier,
        }
    }

    #[test]
    fn hitting_the_target_advances_it() {
        let mut actor = AroundTheWorldScore { target: 1 };
        let outcome = apply_throw(&mut actor, dart(1, 1));

        assert_eq!(actor.target, 2);
        assert_eq!(outcome.effect, ThrowEffect::AroundTheWorld { hit: true });
        assert!(!outcome.finished);
    }

    #[test]
    fn multiplier_is_ignored_for_hit_detection() {
        let mut actor = AroundTheWorldScore { target: 7 };
        let outcome = apply_throw(&mut actor, dart(7, 3));

        assert_eq!(actor.target, 8);
        assert_eq!(outcome.effect, ThrowEffect::AroundTheWorld { hit: true });
    }

    #[test]
    fn wrong_segment_and_miss_do_not_advance() {
        let mut actor = AroundTheWorldScore { target: 5 };

        apply_throw(&mut actor, dart(6, 1));
        assert_eq!(actor.target, 5);

        let outcome = apply_throw(
            &mut actor,
            Dart {
                segment: None,
                multiplier: 1,
            },
        );
        assert_eq!(actor.target, 5);
        assert_eq!(outcome.effect, ThrowEffect::AroundTheWorld { hit: false });
    }

    #[test]
    fn bull_completes_the_sequence() {
        let mut actor = AroundTheWorldScore {
            target: BULL_TARGET,
        };
        let outcome = apply_throw(&mut actor, dart(BULL_SEGMENT, 1));

        assert_eq!(actor.target, DONE_TARGET);
        assert!(outcome.finished);
    }

    #[test]
    fn twenty_does_not_satisfy_the_bull_target() {
        let mut actor = AroundTheWorldScore {
            target: BULL_TARGET,
        };
        let outcome = apply_throw(&mut actor, dart(20, 1));

        assert_eq!(actor.target, BULL_TARGET);
        assert!(!outcome.finished);
    }

    #[test]
    fn revert_only_steps_back_after_a_hit() {
        let mut actor = AroundTheWorldScore { target: 9 };

        revert_throw(&mut actor, false);
        assert_eq!(actor.target, 9);

        revert_throw(&mut actor, true);
        assert_eq!(actor.target, 8);
    }

    #[test]
    fn apply_then_revert_round_trips() {
        let mut actor = AroundTheWorldScore { target: 12 };
        let outcome = apply_throw(&mut actor, dart(12, 2));
        let ThrowEffect::AroundTheWorld { hit } = outcome.effect else {
            panic!("around-the-world throw must record its effect");
        };

        revert_throw(&mut actor, hit);
        assert_eq!(actor.target, 12);
    }
}
