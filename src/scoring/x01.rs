//! 301/501 rules: double-out checkout with whole-turn bust restoration.

use super::{Dart, ThrowEffect, ThrowOutcome, X01Score};

/// Apply a throw to a 01-variant participant.
///
/// `turn_start` is the participant's remaining score at the start of the
/// current turn; a bust rewinds to it, blanking out any earlier darts of the
/// same turn. Bust conditions, in order: the throw would go below zero, land
/// on exactly 1 (no finish exists), or reach zero without a double.
pub fn apply_throw(actor: &mut X01Score, dart: Dart, turn_start: u16) -> ThrowOutcome {
    let raw_value = dart.raw_value();
    let remaining_before = actor.remaining;
    let after = i32::from(actor.remaining) - i32::from(raw_value);

    let bust = after < 0 || after == 1 || (after == 0 && dart.multiplier != 2);

    if bust {
        actor.remaining = turn_start;
    } else {
        // after is within [0, u16::MAX] here
        actor.remaining = after as u16;
    }

    ThrowOutcome {
        raw_value,
        bust,
        finished: !bust && actor.remaining == 0,
        effect: ThrowEffect::X01 { remaining_before },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scoring::BULL_SEGMENT;

    fn dart(segment: u8, multiplier: u8) -> Dart {
        Dart {
            segment: Some(segment),
            multiplier,
        }
    }

    #[test]
    fn plain_scoring_subtracts_raw_value() {
        let mut actor = X01Score { remaining: 501 };
        let outcome = apply_throw(&mut actor, dart(20, 3), 501);

        assert_eq!(actor.remaining, 441);
        assert!(!outcome.bust);
        assert!(!outcome.finished);
        assert_eq!(outcome.effect, ThrowEffect::X01 { remaining_before: 501 });
    }

    #[test]
    fn double_twenty_checks_out_forty() {
        let mut actor = X01Score { remaining: 40 };
        let outcome = apply_throw(&mut actor, dart(20, 2), 40);

        assert_eq!(actor.remaining, 0);
        assert!(!outcome.bust);
        assert!(outcome.finished);
    }

    #[test]
    fn bull_double_checks_out_fifty() {
        let mut actor = X01Score { remaining: 50 };
        let outcome = apply_throw(&mut actor, dart(BULL_SEGMENT, 2), 50);

        assert_eq!(actor.remaining, 0);
        assert!(outcome.finished);
    }

    #[test]
    fn going_below_zero_busts_back_to_turn_start() {
        // Turn start 32, first dart already committed elsewhere: remaining 32,
        // D20 overshoots by 8.
        let mut actor = X01Score { remaining: 32 };
        let outcome = apply_throw(&mut actor, dart(20, 2), 32);

        // -8 would be the result; the whole turn is voided.
        assert!(outcome.bust);
        assert!(!outcome.finished);
        assert_eq!(actor.remaining, 32);
    }

    #[test]
    fn bust_rewinds_earlier_darts_of_the_same_turn() {
        let mut actor = X01Score { remaining: 100 };

        let first = apply_throw(&mut actor, dart(20, 3), 100);
        assert!(!first.bust);
        assert_eq!(actor.remaining, 40);

        // T20 from 40 would land on -20; the whole turn rewinds to 100.
        let second = apply_throw(&mut actor, dart(20, 3), 100);
        assert!(second.bust);
        assert_eq!(actor.remaining, 100);
        assert_eq!(second.effect, ThrowEffect::X01 { remaining_before: 40 });
    }

    #[test]
    fn landing_on_one_busts() {
        let mut actor = X01Score { remaining: 21 };
        let outcome = apply_throw(&mut actor, dart(20, 1), 21);

        assert!(outcome.bust);
        assert_eq!(actor.remaining, 21);
    }

    #[test]
    fn reaching_zero_without_a_double_busts() {
        let mut actor = X01Score { remaining: 60 };
        let outcome = apply_throw(&mut actor, dart(20, 3), 60);

        assert!(outcome.bust);
        assert!(!outcome.finished);
        assert_eq!(actor.remaining, 60);
    }

    #[test]
    fn miss_subtracts_nothing() {
        let mut actor = X01Score { remaining: 301 };
        let outcome = apply_throw(
            &mut actor,
            Dart {
                segment: None,
                multiplier: 1,
            },
            301,
        );

        assert_eq!(actor.remaining, 301);
        assert!(!outcome.bust);
    }

    #[test]
    fn committed_remaining_stays_in_range() {
        let mut actor = X01Score { remaining: 301 };
        let throws = [dart(20, 3), dart(19, 3), dart(20, 3), dart(20, 3)];
        for throw in throws {
            let turn_start = actor.remaining;
            let outcome = apply_throw(&mut actor, throw, turn_start);
            if !outcome.bust {
                assert!(actor.remaining <= 301);
            }
        }
    }
}
