//! A* search over the states reachable by applying actions.
//!
//! Every action costs 1, so `g` is the number of actions taken so far. The heuristic
//! `h` is the goal's [`distance`](crate::Goal::distance). Ties on `f = g + h` are broken
//! by insertion order, which keeps the search deterministic for a fixed input.

use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashSet};

use log::{debug, trace};

use crate::state::StateKey;
use crate::{Action, Goal, Result, State};

/// Counters collected during one search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes popped from the open set and expanded
    pub expanded: usize,
    /// Successor nodes pushed onto the open set
    pub generated: usize,
}

/// How a search ended.
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// The goal was reached by this action sequence
    Found {
        plan: Vec<Action>,
        stats: SearchStats,
    },
    /// The open set ran dry: no sequence of the given actions reaches the goal
    Unreachable { stats: SearchStats },
    /// The expansion budget ran out first
    Exhausted { stats: SearchStats },
}

/// A node in the search space.
struct Node {
    state: State,
    key: StateKey,
    /// Index of the parent node
    parent: Option<usize>,
    /// Index of the action that led here from the parent
    action: Option<usize>,
    g_cost: usize,
    h_cost: f64,
}

impl Node {
    fn f_cost(&self) -> f64 {
        self.g_cost as f64 + self.h_cost
    }
}

/// Open-set entry ordered by `f`, then by insertion sequence.
#[derive(Debug, Clone, Copy)]
struct NodeWrapper {
    idx: usize,
    f_cost: f64,
    seq: usize,
}

impl PartialEq for NodeWrapper {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for NodeWrapper {}

impl PartialOrd for NodeWrapper {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeWrapper {
    fn cmp(&self, other: &Self) -> Ordering {
        self.f_cost
            .total_cmp(&other.f_cost)
            .then(self.seq.cmp(&other.seq))
    }
}

/// Search state local to one call.
struct SearchContext {
    nodes: Vec<Node>,
    open_set: BinaryHeap<Reverse<NodeWrapper>>,
    closed_set: HashSet<StateKey>,
    next_seq: usize,
    stats: SearchStats,
}

impl SearchContext {
    fn new(initial_state: &State, goal: &Goal) -> Self {
        let mut context = Self {
            nodes: Vec::new(),
            open_set: BinaryHeap::new(),
            closed_set: HashSet::new(),
            next_seq: 0,
            stats: SearchStats::default(),
        };
        let start = initial_state.substate(&[]);
        let h_cost = goal.distance(&start);
        context.push(Node {
            key: start.canonical_key(),
            state: start,
            parent: None,
            action: None,
            g_cost: 0,
            h_cost,
        });
        context
    }

    fn push(&mut self, node: Node) {
        let idx = self.nodes.len();
        self.open_set.push(Reverse(NodeWrapper {
            idx,
            f_cost: node.f_cost(),
            seq: self.next_seq,
        }));
        self.next_seq += 1;
        self.nodes.push(node);
    }

    /// Pops the cheapest node whose state has not been closed yet.
    fn next_node(&mut self) -> Option<usize> {
        while let Some(Reverse(wrapper)) = self.open_set.pop() {
            if !self.closed_set.contains(&self.nodes[wrapper.idx].key) {
                return Some(wrapper.idx);
            }
        }
        None
    }

    fn expand(&mut self, idx: usize, actions: &[Action], goal: &Goal) -> Result<()> {
        self.closed_set.insert(self.nodes[idx].key.clone());
        self.stats.expanded += 1;

        let g_cost = self.nodes[idx].g_cost + 1;
        for (action_idx, action) in actions.iter().enumerate() {
            if !action.plannable(&self.nodes[idx].state)? {
                continue;
            }
            let successor = action.project(&self.nodes[idx].state);
            let key = successor.canonical_key();
            if self.closed_set.contains(&key) {
                continue;
            }
            let h_cost = goal.distance(&successor);
            trace!(
                "Generated {} via {} (g={}, h={})",
                successor,
                action.name,
                g_cost,
                h_cost
            );
            self.push(Node {
                state: successor,
                key,
                parent: Some(idx),
                action: Some(action_idx),
                g_cost,
                h_cost,
            });
            self.stats.generated += 1;
        }
        Ok(())
    }

    /// Walks parent links back to the start and returns the actions in order.
    fn reconstruct_path(&self, node_idx: usize, actions: &[Action]) -> Vec<Action> {
        let mut path = Vec::new();
        let mut current = Some(node_idx);

        while let Some(idx) = current {
            let node = &self.nodes[idx];
            if let Some(action_idx) = node.action {
                path.push(actions[action_idx].clone());
            }
            current = node.parent;
        }

        path.reverse();
        path
    }
}

/// A* search with an optional expansion budget.
#[derive(Debug, Clone, Copy, Default)]
pub struct AStarSearch {
    max_expansions: Option<usize>,
}

impl AStarSearch {
    /// `None` lets the search run until the open set is empty.
    pub fn new(max_expansions: Option<usize>) -> Self {
        Self { max_expansions }
    }

    /// Finds a shortest action sequence turning `initial_state` into the goal state.
    ///
    /// Successors are projected copies, so `initial_state` is never touched. Async
    /// preconditions are assumed to hold while planning.
    /// A precondition contract violation aborts the search and is returned as is.
    pub fn search(
        &self,
        actions: &[Action],
        initial_state: &State,
        goal: &Goal,
    ) -> Result<SearchOutcome> {
        let mut context = SearchContext::new(initial_state, goal);

        while let Some(idx) = context.next_node() {
            if goal.evaluate(&context.nodes[idx].state) {
                let plan = context.reconstruct_path(idx, actions);
                debug!(
                    "Goal {} reached in {} steps ({} expanded, {} generated)",
                    goal.name(),
                    plan.len(),
                    context.stats.expanded,
                    context.stats.generated
                );
                return Ok(SearchOutcome::Found {
                    plan,
                    stats: context.stats,
                });
            }

            if let Some(limit) = self.max_expansions {
                if context.stats.expanded >= limit {
                    debug!("Goal {}: expansion budget of {} spent", goal.name(), limit);
                    return Ok(SearchOutcome::Exhausted {
                        stats: context.stats,
                    });
                }
            }

            context.expand(idx, actions, goal)?;
        }

        debug!(
            "Goal {} unreachable ({} expanded, {} generated)",
            goal.name(),
            context.stats.expanded,
            context.stats.generated
        );
        Ok(SearchOutcome::Unreachable {
            stats: context.stats,
        })
    }
}
