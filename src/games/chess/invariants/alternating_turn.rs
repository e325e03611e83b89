//! Alternating turn invariant: white, black, white, black, ...

use super::super::{Position, Side};
use super::Invariant;

/// Invariant: side to move follows history parity.
///
/// White moves first, so white is to move exactly when an even number of
/// moves has been applied.
pub struct AlternatingTurnInvariant;

impl Invariant<Position> for AlternatingTurnInvariant {
    fn holds(position: &Position) -> bool {
        let expected = if position.history().len() % 2 == 0 {
            Side::White
        } else {
            Side::Black
        };
        position.side_to_move() == expected
    }

    fn description() -> &'static str {
        "Sides alternate (white, black, white, ...)"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::chess::Move;

    #[test]
    fn test_initial_position_holds() {
        assert!(AlternatingTurnInvariant::holds(&Position::new()));
    }

    #[test]
    fn test_holds_after_each_move() {
        let mut position = Position::new();
        for m in ["d2d4", "d7d5", "c2c4", "e7e6", "b1c3"] {
            position.apply(m.parse::<Move>().unwrap()).unwrap();
            assert!(AlternatingTurnInvariant::holds(&position));
        }
        assert_eq!(position.side_to_move(), Side::Black);
    }
}
