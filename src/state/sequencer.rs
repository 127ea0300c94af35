//! Turn sequencing: the (player index, dart-in-turn, turn number) cursor.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Position of a match within its turn rotation.
///
/// Both transitions are pure and deterministic; the room serialization
/// guarantees each is applied exactly once per committed or undone throw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct TurnCursor {
    /// Index of the participant whose turn it is.
    pub player: usize,
    /// Dart within the current turn, 1 through 3.
    pub dart: u8,
    /// Turn number, monotonic from 1; increments on each player change.
    pub turn: u32,
}

impl Default for TurnCursor {
    fn default() -> Self {
        Self {
            player: 0,
            dart: 1,
            turn: 1,
        }
    }
}

impl TurnCursor {
    /// Step forward after a committed throw: dart 1→2→3, then the next
    /// player (wrapping) on dart 1 of the next turn.
    pub fn advance(&mut self, player_count: usize) {
        if self.dart < 3 {
            self.dart += 1;
        } else {
            self.dart = 1;
            self.player = (self.player + 1) % player_count;
            self.turn += 1;
        }
    }

    /// Forfeit the remaining darts of the current turn: dart 1 of the next
    /// player, wherever the cursor stood. Used when a throw busts; undoing
    /// such a throw restores the cursor from the throw record instead of
    /// [`reverse`](Self::reverse).
    pub fn end_turn(&mut self, player_count: usize) {
        self.dart = 1;
        self.player = (self.player + 1) % player_count;
        self.turn += 1;
    }

    /// Exact inverse of [`advance`](Self::advance) for undo of a committed
    /// scoring throw. The turn number never drops below 1.
    pub fn reverse(&mut self, player_count: usize) {
        if self.dart > 1 {
            self.dart -= 1;
        } else {
            self.dart = 3;
            self.player = (self.player + player_count - 1) % player_count;
            self.turn = self.turn.saturating_sub(1).max(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_darts_then_the_next_player() {
        let mut cursor = TurnCursor::default();

        cursor.advance(2);
        assert_eq!(
            cursor,
            TurnCursor {
                player: 0,
                dart: 2,
                turn: 1
            }
        );

        cursor.advance(2);
        cursor.advance(2);
        assert_eq!(
            cursor,
            TurnCursor {
                player: 1,
                dart: 1,
                turn: 2
            }
        );
    }

    #[test]
    fn full_rotation_returns_to_the_first_player() {
        // 3 × P advances from (0, 1, T) must land on (0, 1, T + P).
        for players in 2..=4usize {
            let mut cursor = TurnCursor::default();
            for _ in 0..3 * players {
                cursor.advance(players);
            }
            assert_eq!(
                cursor,
                TurnCursor {
                    player: 0,
                    dart: 1,
                    turn: 1 + players as u32
                }
            );
        }
    }

    #[test]
    fn reverse_inverts_advance_at_every_position() {
        let players = 3;
        let mut cursor = TurnCursor::default();

        // Walk a few full rotations, checking the inverse at each step,
        // including the dart=1 wraparounds.
        for _ in 0..3 * players * 2 {
            let before = cursor;
            cursor.advance(players);
            let mut back = cursor;
            back.reverse(players);
            assert_eq!(back, before);
        }
    }

    #[test]
    fn end_turn_jumps_to_the_next_player_from_any_dart() {
        for dart in 1..=3u8 {
            let mut cursor = TurnCursor {
                player: 1,
                dart,
                turn: 4,
            };
            cursor.end_turn(3);
            assert_eq!(
                cursor,
                TurnCursor {
                    player: 2,
                    dart: 1,
                    turn: 5
                }
            );
        }
    }

    #[test]
    fn end_turn_wraps_the_player_index() {
        let mut cursor = TurnCursor {
            player: 1,
            dart: 2,
            turn: 7,
        };
        cursor.end_turn(2);
        assert_eq!(
            cursor,
            TurnCursor {
                player: 0,
                dart: 1,
                turn: 8
            }
        );
    }

    #[test]
    fn reverse_wraps_to_the_previous_player() {
        let mut cursor = TurnCursor {
            player: 0,
            dart: 1,
            turn: 4,
        };
        cursor.reverse(3);
        assert_eq!(
            cursor,
            TurnCursor {
                player: 2,
                dart: 3,
                turn: 3
            }
        );
    }

    #[test]
    fn turn_number_never_drops_below_one() {
        let mut cursor = TurnCursor::default();
        cursor.reverse(2);
        assert_eq!(cursor.turn, 1);
    }
}
