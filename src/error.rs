use thiserror::Error;

use crate::value::ValueKind;

/// Errors raised by the planning engine.
///
/// An unreachable goal is not an error: the planner reports it as an empty plan.
/// `SearchExhausted` is kept separate so callers can tell "no plan exists" apart
/// from "the search gave up".
///
/// # Examples
///
/// ```
/// use goap_planner::GoapError;
///
/// let err = GoapError::SearchExhausted { goal: "reach_ten".into(), expansions: 50 };
/// assert_eq!(
///     format!("{}", err),
///     "Search for goal 'reach_ten' exhausted its budget after 50 expansions"
/// );
/// ```
#[derive(Error, Debug)]
pub enum GoapError {
    /// A precondition produced something other than a boolean
    #[error("Precondition on '{key}' of action '{action}' returned {kind} instead of a boolean")]
    InvalidPredicateResult {
        action: String,
        key: String,
        kind: ValueKind,
    },

    /// The node budget configured on the planner ran out before the goal was reached
    #[error("Search for goal '{goal}' exhausted its budget after {expansions} expansions")]
    SearchExhausted { goal: String, expansions: usize },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for planning operations
pub type Result<T> = std::result::Result<T, GoapError>;
