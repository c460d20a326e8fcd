//! # Goals
//!
//! A [`Goal`] names a target [`State`] and knows how far a candidate state is from it.
//! The distance doubles as the planner's heuristic; [`Goal::evaluate`] is the exact
//! termination test.
//!
//! ```
//! use goap_planner::{Goal, State};
//!
//! let goal = Goal::new("reach_ten").with_target("value", 10);
//!
//! assert_eq!(goal.distance(&State::new().with("value", 6)), 4.0);
//! assert!(goal.evaluate(&State::new().with("value", 10)));
//! // Extra keys make the states different.
//! assert!(!goal.evaluate(&State::new().with("value", 10).with("spare", 0)));
//! ```
//!
//! ## Admissibility
//!
//! The planner only returns shortest plans when every distance function never
//! overestimates the number of remaining actions. The engine does not check this.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::{State, Value};

/// Per-key cost between the candidate's value (`None` when the key is missing) and
/// the target value.
pub type DistanceFn = Arc<dyn Fn(Option<&Value>, &Value) -> f64 + Send + Sync>;

/// Stock distance metrics.
pub mod metric {
    use crate::Value;

    /// Absolute numeric difference when both sides are numeric, 1.0 otherwise.
    ///
    /// This is the default metric for keys without a registered distance.
    pub fn absolute_difference(current: Option<&Value>, target: &Value) -> f64 {
        match (current.and_then(Value::as_f64), target.as_f64()) {
            (Some(x), Some(y)) => (x - y).abs(),
            _ => 1.0,
        }
    }

    /// Flat cost of 1.0 for any differing value.
    pub fn unit(_current: Option<&Value>, _target: &Value) -> f64 {
        1.0
    }
}

/// A named target partial state.
#[derive(Clone)]
pub struct Goal {
    name: String,
    final_state: State,
    distances: HashMap<String, DistanceFn>,
}

impl Goal {
    pub fn new(name: impl Into<String>) -> Self {
        Self::from_state(name, State::new())
    }

    pub fn from_state(name: impl Into<String>, final_state: State) -> Self {
        Self {
            name: name.into(),
            final_state,
            distances: HashMap::new(),
        }
    }

    /// Adds `key = value` to the target state.
    pub fn with_target(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.final_state.set(key, value);
        self
    }

    /// Overrides the distance function for `key`.
    ///
    /// ```
    /// use goap_planner::{Goal, State, goal::metric};
    ///
    /// let goal = Goal::new("open")
    ///     .with_target("door", "open")
    ///     .set_distance("door", metric::unit);
    ///
    /// assert_eq!(goal.distance(&State::new().with("door", "closed")), 1.0);
    /// ```
    pub fn set_distance<F>(mut self, key: impl Into<String>, distance: F) -> Self
    where
        F: Fn(Option<&Value>, &Value) -> f64 + Send + Sync + 'static,
    {
        self.distances.insert(key.into(), Arc::new(distance));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn final_state(&self) -> &State {
        &self.final_state
    }

    /// Sums the per-key distance over every target key whose value differs.
    ///
    /// Never negative; zero whenever [`evaluate`](Goal::evaluate) holds.
    pub fn distance(&self, state: &State) -> f64 {
        self.final_state
            .iter()
            .map(|(key, target)| {
                let current = state.get(key);
                if current == Some(target) {
                    return 0.0;
                }
                let cost = match self.distances.get(key) {
                    Some(distance) => distance(current, target),
                    None => metric::absolute_difference(current, target),
                };
                // NaN and negative costs both clamp to zero.
                cost.max(0.0)
            })
            .sum()
    }

    /// True iff `state` holds exactly the target key/value pairs.
    pub fn evaluate(&self, state: &State) -> bool {
        *state == self.final_state
    }
}

impl fmt::Debug for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut overridden: Vec<_> = self.distances.keys().collect();
        overridden.sort();
        f.debug_struct("Goal")
            .field("name", &self.name)
            .field("final_state", &self.final_state)
            .field("distances", &overridden)
            .finish()
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.name, self.final_state)
    }
}
