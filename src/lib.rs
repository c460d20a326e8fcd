mod action;
mod agent;
mod error;
pub mod goal;
mod planner;
mod search;
mod state;
mod value;
mod visualizer;

pub use action::{
    qualifier, Action, AsyncEffect, AsyncPredicate, FnEffect, FnPredicate, Qualifier,
};
pub use agent::{Agent, AgentConfig, RunOutcome};
pub use error::{GoapError, Result};
pub use goal::{DistanceFn, Goal};
pub use planner::{Planner, PlannerConfig};
pub use search::{AStarSearch, SearchOutcome, SearchStats};
pub use state::{State, StateKey};
pub use value::{Value, ValueKind};
pub use visualizer::PlanVisualizer;
