//! # Planner
//!
//! The planner picks the first goal that does not hold yet and runs an
//! [`AStarSearch`] for it over the given actions.
//!
//! ```
//! use goap_planner::{Action, Goal, Planner, State};
//!
//! let mut increment = Action::new("increment");
//! increment
//!     .add_precondition("value", |v| v.as_i64().map_or(false, |n| n > 5))
//!     .add_effect("value", |v| v.as_i64().unwrap_or_default() + 1);
//!
//! let goals = vec![Goal::new("reach_ten").with_target("value", 10)];
//! let state = State::new().with("value", 6);
//!
//! let plan = Planner::new("demo").plan(&state, &goals, &[increment]).unwrap();
//! assert_eq!(plan.len(), 4);
//! ```
//!
//! ## Reading the result
//!
//! * `Ok` with a non-empty plan: apply the actions in order.
//! * `Ok` with an empty plan: every goal already holds, or the selected goal cannot be
//!   reached with these actions. Callers tell the two apart by evaluating the goals.
//! * `Err(GoapError::SearchExhausted)`: the configured budget ran out before an answer.

use log::{debug, info};

use crate::search::{AStarSearch, SearchOutcome};
use crate::{Action, GoapError, Goal, Result, State};

/// Configuration for the planner
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlannerConfig {
    /// Maximum number of node expansions per search. `None` removes the limit.
    pub max_expansions: Option<usize>,
}

impl Default for PlannerConfig {
    fn default() -> Self {
        Self {
            max_expansions: Some(10_000),
        }
    }
}

/// Stateless planning front end. All search state lives inside one [`plan`](Planner::plan) call.
#[derive(Debug, Clone)]
pub struct Planner {
    name: String,
    config: PlannerConfig,
}

impl Planner {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_config(name, PlannerConfig::default())
    }

    pub fn with_config(name: impl Into<String>, config: PlannerConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Plans for the first goal, in list order, that `current_state` does not satisfy.
    pub fn plan(
        &self,
        current_state: &State,
        goals: &[Goal],
        actions: &[Action],
    ) -> Result<Vec<Action>> {
        let Some(goal) = goals.iter().find(|g| !g.evaluate(current_state)) else {
            debug!("Planner {}: all goals already hold", self.name);
            return Ok(Vec::new());
        };

        info!(
            "Planner {}: planning for goal {} from {}",
            self.name,
            goal.name(),
            current_state
        );

        let search = AStarSearch::new(self.config.max_expansions);
        match search.search(actions, current_state, goal)? {
            SearchOutcome::Found { plan, .. } => Ok(plan),
            SearchOutcome::Unreachable { .. } => {
                info!(
                    "Planner {}: goal {} is unreachable with {} actions",
                    self.name,
                    goal.name(),
                    actions.len()
                );
                Ok(Vec::new())
            }
            SearchOutcome::Exhausted { stats } => Err(GoapError::SearchExhausted {
                goal: goal.name().to_string(),
                expansions: stats.expanded,
            }),
        }
    }
}
