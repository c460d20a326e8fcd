//! # Actions
//!
//! An [`Action`] is a named operation with guarded preconditions and effects, each
//! bound to one state key. Preconditions decide whether the action is eligible on a
//! state; effects transform the values at their keys when it is.
//!
//! ```
//! use goap_planner::{Action, State};
//!
//! let mut increment = Action::new("increment");
//! increment
//!     .add_precondition("value", |v| v.as_i64().map_or(false, |n| n > 5))
//!     .add_effect("value", |v| v.as_i64().unwrap_or_default() + 1);
//!
//! let state = State::new().with("value", 6);
//! let next = increment.simulate(&state).unwrap();
//!
//! assert_eq!(next, State::new().with("value", 7));
//! assert_eq!(state, State::new().with("value", 6)); // untouched
//! ```
//!
//! ## Contracts
//!
//! * A precondition must produce a boolean. Checks registered through
//!   [`Action::add_value_precondition`] may produce any [`Value`]; anything other than
//!   `Value::Bool` fails with [`GoapError::InvalidPredicateResult`].
//! * An effect must produce a value of the same [`ValueKind`](crate::ValueKind) as the
//!   one it replaces. Results of another kind are dropped and the key keeps its value;
//!   the drop is reported with `log::warn!`.
//! * A precondition on a key missing from the state is false. An effect on a missing
//!   key does nothing.
//!
//! ## Asynchronous checks and effects
//!
//! Preconditions and effects that need to suspend implement [`AsyncPredicate`] and
//! [`AsyncEffect`]. They are awaited by [`Action::eligible_async`],
//! [`Action::simulate_async`] and [`Action::apply_async`].
//!
//! The synchronous path cannot check an async precondition, so [`Action::eligible`],
//! [`Action::simulate`] and [`Action::apply`] treat an action carrying one as not
//! eligible. The planner instead assumes async preconditions hold and projects only the
//! synchronous effects; execution through the async path confirms the guess.

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use log::{trace, warn};

use crate::{GoapError, Result, State, Value};

/// Combines the results of all preconditions into an eligibility decision.
pub type Qualifier = fn(&[bool]) -> bool;

/// Stock qualifiers.
pub mod qualifier {
    /// Every precondition must hold.
    pub fn all(results: &[bool]) -> bool {
        results.iter().all(|r| *r)
    }

    /// At least one precondition must hold.
    pub fn any(results: &[bool]) -> bool {
        results.iter().any(|r| *r)
    }
}

/// A precondition that needs to suspend, e.g. to ask an external service.
#[async_trait]
pub trait AsyncPredicate: Send + Sync {
    /// Inspects the current value at the bound key. Must resolve to `Value::Bool`.
    async fn check(&self, value: Value) -> Value;
}

/// An effect that needs to suspend to compute the new value of its key.
#[async_trait]
pub trait AsyncEffect: Send + Sync {
    async fn transform(&self, value: Value) -> Value;
}

/// Adapts an async closure into an [`AsyncPredicate`].
///
/// ```
/// use goap_planner::{Action, FnPredicate, Value};
///
/// let mut deploy = Action::new("deploy");
/// deploy.add_async_precondition(
///     "build",
///     FnPredicate::new(|v: Value| async move { v.as_str() == Some("green") }),
/// );
/// ```
pub struct FnPredicate<F> {
    func: F,
}

impl<F, Fut> FnPredicate<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut> AsyncPredicate for FnPredicate<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = bool> + Send,
{
    async fn check(&self, value: Value) -> Value {
        Value::Bool((self.func)(value).await)
    }
}

/// Adapts an async closure into an [`AsyncEffect`].
pub struct FnEffect<F> {
    func: F,
}

impl<F, Fut, R> FnEffect<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send,
    R: Into<Value>,
{
    pub fn new(func: F) -> Self {
        Self { func }
    }
}

#[async_trait]
impl<F, Fut, R> AsyncEffect for FnEffect<F>
where
    F: Fn(Value) -> Fut + Send + Sync,
    Fut: Future<Output = R> + Send,
    R: Into<Value>,
{
    async fn transform(&self, value: Value) -> Value {
        (self.func)(value).await.into()
    }
}

type PredicateFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;
type TransformFn = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

#[derive(Clone)]
struct Precondition {
    key: String,
    predicate: PredicateFn,
}

impl Precondition {
    fn check(&self, action: &str, state: &State) -> Result<bool> {
        let Some(value) = state.get(&self.key) else {
            trace!("Action {}: precondition key '{}' is missing", action, self.key);
            return Ok(false);
        };
        expect_bool(action, &self.key, (self.predicate)(value))
    }
}

#[derive(Clone)]
struct Effect {
    key: String,
    transform: TransformFn,
}

impl Effect {
    fn run(&self, action: &str, state: &mut State) {
        let Some(current) = state.get(&self.key) else {
            trace!("Action {}: effect key '{}' is missing", action, self.key);
            return;
        };
        let result = (self.transform)(current);
        write_back(action, &self.key, state, result);
    }
}

#[derive(Clone)]
struct AsyncPrecondition {
    key: String,
    predicate: Arc<dyn AsyncPredicate>,
}

#[derive(Clone)]
struct AsyncEffectEntry {
    key: String,
    effect: Arc<dyn AsyncEffect>,
}

fn expect_bool(action: &str, key: &str, result: Value) -> Result<bool> {
    match result {
        Value::Bool(b) => Ok(b),
        other => Err(GoapError::InvalidPredicateResult {
            action: action.to_string(),
            key: key.to_string(),
            kind: other.kind(),
        }),
    }
}

fn write_back(action: &str, key: &str, state: &mut State, result: Value) {
    let Some(expected) = state.get(key).map(Value::kind) else {
        return;
    };
    if result.kind() == expected {
        state.set(key, result);
    } else {
        warn!(
            "Action {}: effect on '{}' returned {} but the key holds {}; result dropped",
            action,
            key,
            result.kind(),
            expected
        );
    }
}

/// A named operation over a [`State`].
///
/// Actions are cheap to clone: predicates and effects are shared behind `Arc`.
/// Registration methods return `&mut Self` so calls can be chained, and they keep
/// registration order.
#[derive(Clone)]
pub struct Action {
    /// The name of the action
    pub name: String,
    preconditions: Vec<Precondition>,
    effects: Vec<Effect>,
    async_preconditions: Vec<AsyncPrecondition>,
    async_effects: Vec<AsyncEffectEntry>,
    qualifier: Qualifier,
}

impl Action {
    /// Creates an action with no preconditions, no effects and the
    /// [`qualifier::all`] policy.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            preconditions: Vec::new(),
            effects: Vec::new(),
            async_preconditions: Vec::new(),
            async_effects: Vec::new(),
            qualifier: qualifier::all,
        }
    }

    /// Registers a guard on `key`.
    pub fn add_precondition<F>(&mut self, key: impl Into<String>, predicate: F) -> &mut Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        self.add_value_precondition(key, move |value: &Value| predicate(value))
    }

    /// Registers a dynamically typed guard on `key`.
    ///
    /// The check may produce any value; a non-boolean result fails eligibility with
    /// [`GoapError::InvalidPredicateResult`].
    ///
    /// ```
    /// use goap_planner::{Action, GoapError, State, Value};
    ///
    /// let mut broken = Action::new("broken");
    /// broken.add_value_precondition("value", |v| v.clone());
    ///
    /// let state = State::new().with("value", 3);
    /// assert!(matches!(
    ///     broken.eligible(&state),
    ///     Err(GoapError::InvalidPredicateResult { .. })
    /// ));
    /// ```
    pub fn add_value_precondition<F, R>(&mut self, key: impl Into<String>, check: F) -> &mut Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.preconditions.push(Precondition {
            key: key.into(),
            predicate: Arc::new(move |value: &Value| -> Value { check(value).into() }),
        });
        self
    }

    /// Registers a transformation of the value at `key`.
    pub fn add_effect<F, R>(&mut self, key: impl Into<String>, transform: F) -> &mut Self
    where
        F: Fn(&Value) -> R + Send + Sync + 'static,
        R: Into<Value>,
    {
        self.effects.push(Effect {
            key: key.into(),
            transform: Arc::new(move |value: &Value| -> Value { transform(value).into() }),
        });
        self
    }

    pub fn add_async_precondition<P>(&mut self, key: impl Into<String>, predicate: P) -> &mut Self
    where
        P: AsyncPredicate + 'static,
    {
        self.async_preconditions.push(AsyncPrecondition {
            key: key.into(),
            predicate: Arc::new(predicate),
        });
        self
    }

    /// Registers an effect that suspends.
    ///
    /// Async effects of one action run concurrently, so they should touch disjoint
    /// keys. When two of them share a key the one registered last wins.
    pub fn add_async_effect<E>(&mut self, key: impl Into<String>, effect: E) -> &mut Self
    where
        E: AsyncEffect + 'static,
    {
        self.async_effects.push(AsyncEffectEntry {
            key: key.into(),
            effect: Arc::new(effect),
        });
        self
    }

    /// Replaces the policy combining precondition results.
    pub fn with_qualifier(&mut self, qualifier: Qualifier) -> &mut Self {
        self.qualifier = qualifier;
        self
    }

    /// Keys guarded by synchronous preconditions, in registration order.
    pub fn precondition_keys(&self) -> impl Iterator<Item = &str> {
        self.preconditions.iter().map(|p| p.key.as_str())
    }

    /// Keys written by synchronous effects, in registration order.
    pub fn effect_keys(&self) -> impl Iterator<Item = &str> {
        self.effects.iter().map(|e| e.key.as_str())
    }

    /// Evaluates the preconditions under an explicit qualifier.
    ///
    /// Every precondition is evaluated before the qualifier runs. An action without
    /// preconditions always runs; an action with async preconditions never runs here.
    pub fn will_run_given(&self, state: &State, qualifier: Qualifier) -> Result<bool> {
        if !self.async_preconditions.is_empty() {
            trace!(
                "Action {}: async preconditions need the async path",
                self.name
            );
            return Ok(false);
        }
        if self.preconditions.is_empty() {
            return Ok(true);
        }
        let results = self.check_sync(state)?;
        Ok(qualifier(&results))
    }

    /// Planning-time eligibility: synchronous preconditions are evaluated and every
    /// async precondition is assumed to hold.
    pub(crate) fn plannable(&self, state: &State) -> Result<bool> {
        if self.preconditions.is_empty() {
            return Ok(true);
        }
        let mut results = self.check_sync(state)?;
        results.extend(self.async_preconditions.iter().map(|_| true));
        Ok((self.qualifier)(&results))
    }

    /// Copy of `state` with the synchronous effects applied, without checking
    /// eligibility.
    pub(crate) fn project(&self, state: &State) -> State {
        let mut mutation = state.substate(&[]);
        self.run_effects(&mut mutation);
        mutation
    }

    fn check_sync(&self, state: &State) -> Result<Vec<bool>> {
        self.preconditions
            .iter()
            .map(|p| p.check(&self.name, state))
            .collect()
    }

    /// Whether the action may run on `state` under its own qualifier.
    pub fn eligible(&self, state: &State) -> Result<bool> {
        self.will_run_given(state, self.qualifier)
    }

    /// Returns the state this action would produce, leaving `state` untouched.
    ///
    /// If the action is not eligible the result is an unchanged copy.
    pub fn simulate(&self, state: &State) -> Result<State> {
        let mut mutation = state.substate(&[]);
        if self.eligible(&mutation)? {
            self.run_effects(&mut mutation);
        }
        Ok(mutation)
    }

    /// Runs the action on `state` in place. Returns whether it was eligible.
    pub fn apply(&self, state: &mut State) -> Result<bool> {
        if !self.eligible(state)? {
            return Ok(false);
        }
        self.run_effects(state);
        Ok(true)
    }

    /// Like [`eligible`](Action::eligible), also awaiting the async preconditions in
    /// registration order.
    pub async fn eligible_async(&self, state: &State) -> Result<bool> {
        if self.preconditions.is_empty() && self.async_preconditions.is_empty() {
            return Ok(true);
        }
        let mut results = self.check_sync(state)?;

        for precondition in &self.async_preconditions {
            let Some(value) = state.get(&precondition.key) else {
                results.push(false);
                continue;
            };
            let outcome = precondition.predicate.check(value.clone()).await;
            results.push(expect_bool(&self.name, &precondition.key, outcome)?);
        }

        Ok((self.qualifier)(&results))
    }

    /// Async counterpart of [`simulate`](Action::simulate).
    ///
    /// Synchronous effects run first, in order. Async effects are then launched
    /// together against the resulting values and written back once all of them finish.
    pub async fn simulate_async(&self, state: &State) -> Result<State> {
        let mut mutation = state.substate(&[]);
        if self.eligible_async(&mutation).await? {
            self.run_effects_async(&mut mutation).await;
        }
        Ok(mutation)
    }

    /// Async counterpart of [`apply`](Action::apply).
    pub async fn apply_async(&self, state: &mut State) -> Result<bool> {
        if !self.eligible_async(state).await? {
            return Ok(false);
        }
        self.run_effects_async(state).await;
        Ok(true)
    }

    fn run_effects(&self, state: &mut State) {
        for effect in &self.effects {
            effect.run(&self.name, state);
        }
    }

    async fn run_effects_async(&self, state: &mut State) {
        self.run_effects(state);

        let inputs: Vec<(&AsyncEffectEntry, Value)> = self
            .async_effects
            .iter()
            .filter_map(|entry| state.get(&entry.key).map(|v| (entry, v.clone())))
            .collect();

        let results = join_all(inputs.into_iter().map(|(entry, current)| async move {
            (entry.key.as_str(), entry.effect.transform(current).await)
        }))
        .await;

        for (key, result) in results {
            write_back(&self.name, key, state, result);
        }
    }
}

impl fmt::Debug for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Action")
            .field("name", &self.name)
            .field("preconditions", &self.precondition_keys().collect::<Vec<_>>())
            .field("effects", &self.effect_keys().collect::<Vec<_>>())
            .field("async_preconditions", &self.async_preconditions.len())
            .field("async_effects", &self.async_effects.len())
            .finish()
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}
