//! First-class invariants for chess positions.
//!
//! Invariants are logical properties that must hold after every move the
//! coordinator applies. They are testable independently and document what
//! the position model guarantees.

/// A logical property that must hold for a given state.
pub trait Invariant<S> {
    /// Checks if the invariant holds for the given state.
    fn holds(state: &S) -> bool;

    /// Human-readable description of the invariant.
    fn description() -> &'static str;
}

/// Violation of an invariant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    /// Description of the violated invariant.
    pub description: String,
}

impl InvariantViolation {
    /// Creates a new invariant violation.
    pub fn new(description: impl Into<String>) -> Self {
        Self {
            description: description.into(),
        }
    }
}

/// A set of invariants that can be checked together.
///
/// Implemented for tuples so sets compose as type aliases.
pub trait InvariantSet<S> {
    /// Checks all invariants in the set, collecting every violation.
    fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>>;
}

/// Implements [`InvariantSet`] for a tuple of the given type parameters.
macro_rules! invariant_tuple {
    ($($inv:ident),+) => {
        impl<S, $($inv),+> InvariantSet<S> for ($($inv,)+)
        where
            $($inv: Invariant<S>,)+
        {
            fn check_all(state: &S) -> Result<(), Vec<InvariantViolation>> {
                let violations: Vec<InvariantViolation> = [$(($inv::holds(state), $inv::description())),+]
                    .into_iter()
                    .filter(|(holds, _)| !holds)
                    .map(|(_, description)| InvariantViolation::new(description))
                    .collect();

                if violations.is_empty() {
                    Ok(())
                } else {
                    Err(violations)
                }
            }
        }
    };
}

invariant_tuple!(A);
invariant_tuple!(A, B);
invariant_tuple!(A, B, C);
invariant_tuple!(A, B, C, D);

pub mod alternating_turn;
pub mod pawn_placement;
pub mod single_king;

pub use alternating_turn::AlternatingTurnInvariant;
pub use pawn_placement::PawnPlacementInvariant;
pub use single_king::SingleKingInvariant;

/// All position invariants as a composable set.
pub type ChessInvariants = (
    AlternatingTurnInvariant,
    SingleKingInvariant,
    PawnPlacementInvariant,
);
