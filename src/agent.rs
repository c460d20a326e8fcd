//! # Agent
//!
//! The [`Agent`] owns the live world [`State`] and drives plan, execute, re-evaluate
//! cycles until its goal list is empty or it stops making progress.
//!
//! ```
//! use goap_planner::{Agent, Goal, Planner, RunOutcome};
//!
//! let mut agent = Agent::new("counter", Planner::new("astar"));
//! agent.state.set("value", 6);
//! agent
//!     .action("increment")
//!     .add_precondition("value", |v| v.as_i64().map_or(false, |n| n > 5))
//!     .add_effect("value", |v| v.as_i64().unwrap_or_default() + 1);
//! agent.add_goal(Goal::new("reach_ten").with_target("value", 10));
//!
//! assert_eq!(agent.run().unwrap(), RunOutcome::Completed);
//! assert_eq!(agent.state.get("value").and_then(|v| v.as_i64()), Some(10));
//! assert!(agent.goals().is_empty());
//! ```

use log::{info, warn};

use crate::{Action, Goal, Planner, Result, State};

/// How a call to [`Agent::run`] ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// Every goal was reached and retired
    Completed,
    /// A cycle made no progress towards the named goal
    Stalled { goal: String },
    /// [`AgentConfig::max_cycles`] cycles ran with goals still pending
    CycleLimit { cycles: usize },
}

/// Run-loop settings for an [`Agent`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AgentConfig {
    /// Upper bound on plan/execute cycles per run. `None` runs until the goal list
    /// empties or a cycle stalls, which never happens if effects keep changing the
    /// state without satisfying the goal.
    pub max_cycles: Option<usize>,
}

/// A planning agent with exclusive ownership of its world state.
#[derive(Debug)]
pub struct Agent {
    name: String,
    planner: Planner,
    config: AgentConfig,
    /// The authoritative world model. Only the agent's own run loop mutates it.
    pub state: State,
    actions: Vec<Action>,
    goals: Vec<Goal>,
}

impl Agent {
    pub fn new(name: impl Into<String>, planner: Planner) -> Self {
        Self::with_config(name, planner, AgentConfig::default())
    }

    pub fn with_config(name: impl Into<String>, planner: Planner, config: AgentConfig) -> Self {
        Self {
            name: name.into(),
            planner,
            config,
            state: State::new(),
            actions: Vec::new(),
            goals: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Registers a new empty action and returns it for configuration.
    pub fn action(&mut self, name: impl Into<String>) -> &mut Action {
        let idx = self.actions.len();
        self.actions.push(Action::new(name));
        &mut self.actions[idx]
    }

    pub fn add_action(&mut self, action: Action) -> &mut Self {
        self.actions.push(action);
        self
    }

    pub fn add_goal(&mut self, goal: Goal) -> &mut Self {
        self.goals.push(goal);
        self
    }

    pub fn actions(&self) -> &[Action] {
        &self.actions
    }

    pub fn goals(&self) -> &[Goal] {
        &self.goals
    }

    pub fn config(&self) -> &AgentConfig {
        &self.config
    }

    /// Plans and executes until every goal holds.
    ///
    /// Returns [`RunOutcome::Stalled`] instead of looping when the planner finds no
    /// plan for a pending goal, or when a cycle changes neither the state nor the
    /// goal list. Returns [`RunOutcome::CycleLimit`] once the configured cycle cap
    /// is spent.
    pub fn run(&mut self) -> Result<RunOutcome> {
        let mut cycle = 0;
        while !self.goals.is_empty() {
            if let Some(outcome) = self.check_cycle_limit(cycle) {
                return Ok(outcome);
            }
            cycle += 1;
            let plan = self.next_plan(cycle)?;

            let before = self.state.clone();
            for action in &plan {
                if !action.apply(&mut self.state)? {
                    warn!(
                        "Agent {}: action {} no longer eligible, skipped",
                        self.name, action.name
                    );
                }
            }

            if let Some(outcome) = self.end_cycle(&plan, &before) {
                return Ok(outcome);
            }
        }

        info!("Agent {}: all goals achieved, state {}", self.name, self.state);
        Ok(RunOutcome::Completed)
    }

    /// Like [`run`](Agent::run), executing each action through
    /// [`Action::apply_async`], one at a time and in plan order.
    pub async fn run_async(&mut self) -> Result<RunOutcome> {
        let mut cycle = 0;
        while !self.goals.is_empty() {
            if let Some(outcome) = self.check_cycle_limit(cycle) {
                return Ok(outcome);
            }
            cycle += 1;
            let plan = self.next_plan(cycle)?;

            let before = self.state.clone();
            for action in &plan {
                if !action.apply_async(&mut self.state).await? {
                    warn!(
                        "Agent {}: action {} no longer eligible, skipped",
                        self.name, action.name
                    );
                }
            }

            if let Some(outcome) = self.end_cycle(&plan, &before) {
                return Ok(outcome);
            }
        }

        info!("Agent {}: all goals achieved, state {}", self.name, self.state);
        Ok(RunOutcome::Completed)
    }

    fn check_cycle_limit(&self, cycles: usize) -> Option<RunOutcome> {
        let limit = self.config.max_cycles?;
        if cycles < limit {
            return None;
        }
        warn!(
            "Agent {}: stopped after {} cycles with {} goal(s) pending",
            self.name,
            cycles,
            self.goals.len()
        );
        Some(RunOutcome::CycleLimit { cycles })
    }

    fn next_plan(&self, cycle: usize) -> Result<Vec<Action>> {
        let plan = self.planner.plan(&self.state, &self.goals, &self.actions)?;
        let steps: Vec<_> = plan.iter().map(|a| a.name.as_str()).collect();
        info!(
            "Agent {}: cycle {} plan [{}]",
            self.name,
            cycle,
            steps.join(" -> ")
        );
        Ok(plan)
    }

    /// Retires satisfied goals and decides whether the loop must stop early.
    fn end_cycle(&mut self, plan: &[Action], before: &State) -> Option<RunOutcome> {
        let pending = self.goals.len();
        let state = &self.state;
        self.goals.retain(|goal| !goal.evaluate(state));
        let retired = pending - self.goals.len();
        if retired > 0 {
            info!("Agent {}: retired {} goal(s)", self.name, retired);
        }

        let stuck = plan.is_empty() || (retired == 0 && self.state == *before);
        match self.goals.first() {
            Some(goal) if stuck => {
                warn!(
                    "Agent {}: no progress towards goal {} in state {}",
                    self.name,
                    goal.name(),
                    self.state
                );
                Some(RunOutcome::Stalled {
                    goal: goal.name().to_string(),
                })
            }
            _ => None,
        }
    }
}
