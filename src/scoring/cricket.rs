//! Cricket rules: marks on 15-20 and bull, points past the closing third.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::{BULL_SEGMENT, CricketScore, Dart, ThrowEffect, ThrowOutcome};

/// Marks needed before a number counts as closed.
const CLOSING_MARKS: u32 = 3;

/// The seven scoring numbers of cricket, in board order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum CricketNumber {
    /// Segment 15.
    Fifteen,
    /// Segment 16.
    Sixteen,
    /// Segment 17.
    Seventeen,
    /// Segment 18.
    Eighteen,
    /// Segment 19.
    Nineteen,
    /// Segment 20.
    Twenty,
    /// The bull (segment 25).
    Bull,
}

impl CricketNumber {
    /// All seven numbers, in marks-array order.
    pub const ALL: [CricketNumber; 7] = [
        CricketNumber::Fifteen,
        CricketNumber::Sixteen,
        CricketNumber::Seventeen,
        CricketNumber::Eighteen,
        CricketNumber::Nineteen,
        CricketNumber::Twenty,
        CricketNumber::Bull,
    ];

    /// Map a board segment onto a cricket number, if it is one.
    pub fn from_segment(segment: u8) -> Option<Self> {
        match segment {
            15 => Some(CricketNumber::Fifteen),
            16 => Some(CricketNumber::Sixteen),
            17 => Some(CricketNumber::Seventeen),
            18 => Some(CricketNumber::Eighteen),
            19 => Some(CricketNumber::Nineteen),
            20 => Some(CricketNumber::Twenty),
            BULL_SEGMENT => Some(CricketNumber::Bull),
            _ => None,
        }
    }

    /// Point value of one scoring mark on this number.
    pub fn value(self) -> u32 {
        match self {
            CricketNumber::Fifteen => 15,
            CricketNumber::Sixteen => 16,
            CricketNumber::Seventeen => 17,
            CricketNumber::Eighteen => 18,
            CricketNumber::Nineteen => 19,
            CricketNumber::Twenty => 20,
            CricketNumber::Bull => 25,
        }
    }

    /// Position of this number in the marks array.
    pub fn index(self) -> usize {
        self as usize
    }
}

impl CricketScore {
    /// Marks held on one number.
    pub fn marks_on(&self, number: CricketNumber) -> u32 {
        self.marks[number.index()]
    }

    /// Whether this participant has closed the given number.
    pub fn has_closed(&self, number: CricketNumber) -> bool {
        self.marks_on(number) >= CLOSING_MARKS
    }

    /// Whether all seven numbers are closed.
    pub fn all_closed(&self) -> bool {
        self.marks.iter().all(|&marks| marks >= CLOSING_MARKS)
    }
}

/// Apply a throw to `actor`, consulting `others` for field closure and win
/// detection.
///
/// Marks accumulate uncapped. Points are awarded only for marks beyond the
/// actor's closing third, and only while at least one other participant has
/// the number open. The actor wins immediately once all seven numbers are
/// closed and their point total strictly exceeds every other participant's.
pub fn apply_throw(actor: &mut CricketScore, others: &[&CricketScore], dart: Dart) -> ThrowOutcome {
    let raw_value = dart.raw_value();
    let number = dart.segment.and_then(CricketNumber::from_segment);

    let (marks_added, points_scored) = match number {
        Some(number) => {
            let before = actor.marks_on(number);
            let marks_added = u32::from(dart.multiplier);
            let after = before + marks_added;

            let closed_by_field = others.iter().all(|other| other.has_closed(number));
            let scoring_marks = if closed_by_field {
                0
            } else {
                after.saturating_sub(before.max(CLOSING_MARKS))
            };

            actor.marks[number.index()] = after;
            actor.points += scoring_marks * number.value();

            (marks_added, scoring_marks * number.value())
        }
        // Misses and non-cricket segments change nothing.
        None => (0, 0),
    };

    let finished =
        actor.all_closed() && others.iter().all(|other| other.points < actor.points);

    ThrowOutcome {
        raw_value,
        bust: false,
        finished,
        effect: ThrowEffect::Cricket {
            number,
            marks_added,
            points_scored,
        },
    }
}

/// Subtract exactly what [`apply_throw`] added.
pub fn revert_throw(
    actor: &mut CricketScore,
    number: Option<CricketNumber>,
    marks_added: u32,
    points_scored: u32,
) {
    if let Some(number) = number {
        let slot = &mut actor.marks[number.index()];
        *slot = slot.saturating_sub(marks_added);
    }
    actor.points = actor.points.saturating_sub(points_scored);
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

    fn score_with(number: CricketNumber, marks: u32) -> CricketScore {
        let mut score = CricketScore::default();
        score.marks[number.index()] = marks;
        score
    }

    #[test]
    fn triple_past_the_closing_third_scores_the_excess() {
        // P1 holds 2 marks on 20, P2 has it open: a triple closes and
        // scores the two surplus marks.
        let mut actor = score_with(CricketNumber::Twenty, 2);
        let other = CricketScore::default();

        let outcome = apply_throw(&mut actor, &[&other], dart(20, 3));

        assert_eq!(actor.marks_on(CricketNumber::Twenty), 5);
        assert_eq!(actor.points, 40);
        assert!(!outcome.finished);
        assert_eq!(
            outcome.effect,
            ThrowEffect::Cricket {
                number: Some(CricketNumber::Twenty),
                marks_added: 3,
                points_scored: 40,
            }
        );
    }

    #[test]
    fn marks_below_the_closing_third_score_nothing() {
        let mut actor = CricketScore::default();
        let other = CricketScore::default();

        apply_throw(&mut actor, &[&other], dart(20, 2));

        assert_eq!(actor.marks_on(CricketNumber::Twenty), 2);
        assert_eq!(actor.points, 0);
    }

    #[test]
    fn field_closed_numbers_score_nothing() {
        let mut actor = score_with(CricketNumber::Nineteen, 3);
        let other = score_with(CricketNumber::Nineteen, 4);

        let outcome = apply_throw(&mut actor, &[&other], dart(19, 3));

        assert_eq!(actor.marks_on(CricketNumber::Nineteen), 6);
        assert_eq!(actor.points, 0);
        assert_eq!(
            outcome.effect,
            ThrowEffect::Cricket {
                number: Some(CricketNumber::Nineteen),
                marks_added: 3,
                points_scored: 0,
            }
        );
    }

    #[test]
    fn bull_scores_twenty_five_per_surplus_mark() {
        let mut actor = score_with(CricketNumber::Bull, 3);
        let other = CricketScore::default();

        apply_throw(&mut actor, &[&other], dart(BULL_SEGMENT, 2));

        assert_eq!(actor.marks_on(CricketNumber::Bull), 5);
        assert_eq!(actor.points, 50);
    }

    #[test]
    fn non_cricket_segments_and_misses_are_inert() {
        let mut actor = CricketScore::default();
        let other = CricketScore::default();

        apply_throw(&mut actor, &[&other], dart(14, 3));
        apply_throw(
            &mut actor,
            &[&other],
            Dart {
                segment: None,
                multiplier: 1,
            },
        );

        assert_eq!(actor, CricketScore::default());
    }

    #[test]
    fn closing_everything_with_the_lead_wins() {
        let mut actor = CricketScore {
            marks: [3, 3, 3, 3, 3, 3, 2],
            points: 60,
        };
        let other = CricketScore {
            marks: [3; 7],
            points: 10,
        };

        let outcome = apply_throw(&mut actor, &[&other], dart(BULL_SEGMENT, 1));

        assert!(actor.all_closed());
        assert!(outcome.finished);
    }

    #[test]
    fn closing_everything_without_the_lead_does_not_win() {
        let mut actor = CricketScore {
            marks: [3, 3, 3, 3, 3, 3, 2],
            points: 0,
        };
        let other = CricketScore {
            marks: [0; 7],
            points: 100,
        };

        let outcome = apply_throw(&mut actor, &[&other], dart(BULL_SEGMENT, 1));

        assert!(actor.all_closed());
        assert!(!outcome.finished);
    }

    #[test]
    fn tied_points_do_not_win() {
        let mut actor = CricketScore {
            marks: [3, 3, 3, 3, 3, 3, 2],
            points: 50,
        };
        let other = CricketScore {
            marks: [3; 7],
            points: 50,
        };

        let outcome = apply_throw(&mut actor, &[&other], dart(BULL_SEGMENT, 1));
        assert!(!outcome.finished);
    }

    #[test]
    fn revert_restores_marks_and_points_exactly() {
        let mut actor = score_with(CricketNumber::Twenty, 2);
        let other = CricketScore::default();
        let before = actor.clone();

        let outcome = apply_throw(&mut actor, &[&other], dart(20, 3));
        let ThrowEffect::Cricket {
            number,
            marks_added,
            points_scored,
        } = outcome.effect
        else {
            panic!("cricket throw must record a cricket effect");
        };

        revert_throw(&mut actor, number, marks_added, points_scored);
        assert_eq!(actor, before);
    }

    #[test]
    fn marks_never_decrease_across_committed_throws() {
        let mut actor = CricketScore::default();
        let other = CricketScore::default();
        let mut last = 0;

        for multiplier in [1, 3, 2, 1] {
            apply_throw(&mut actor, &[&other], dart(18, multiplier));
            let marks = actor.marks_on(CricketNumber::Eighteen);
            assert!(marks >= last);
            last = marks;
        }
    }
}
