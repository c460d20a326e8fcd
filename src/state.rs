//! # World State
//!
//! A [`State`] is a snapshot of the world: a mapping from symbolic keys to typed
//! [`Value`]s. The same type describes the agent's live world model, the private
//! states explored by the planner, and a goal's target.
//!
//! Two states are equal only when they hold exactly the same key/value pairs. A state
//! carrying extra keys is never equal to a smaller one, even if the shared keys agree.
//!
//! ```
//! use goap_planner::State;
//!
//! let mut world = State::new();
//! world.set("value", 6);
//! world.set("door_open", false);
//!
//! let target = State::new().with("value", 6);
//! assert_ne!(world, target);
//! assert_eq!(world.substate(&["value"]), target);
//! ```

use std::collections::BTreeMap;
use std::fmt;

use crate::value::Value;

/// The ordered item list identifying a state during search.
pub type StateKey = Vec<(String, Value)>;

/// A keyed snapshot of the world.
///
/// Keys are kept in sorted order, which makes iteration order and
/// [`canonical_key`](State::canonical_key) independent of insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct State {
    values: BTreeMap<String, Value>,
}

impl State {
    pub fn new() -> Self {
        Self {
            values: BTreeMap::new(),
        }
    }

    /// Builder form of [`set`](State::set).
    ///
    /// ```
    /// use goap_planner::{State, Value};
    ///
    /// let state = State::new().with("hp", 10).with("armed", true);
    /// assert_eq!(state.get("hp"), Some(&Value::Int(10)));
    /// ```
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    /// Sets the value at `key`, replacing any previous value.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(|k| k.as_str())
    }

    /// Iterates over key/value pairs in canonical (sorted) key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// Returns an independent copy holding only the requested keys.
    ///
    /// An empty key list copies every key. Requested keys that are not present are
    /// ignored. Mutating the result never affects `self`, and vice versa.
    ///
    /// ```
    /// use goap_planner::State;
    ///
    /// let state = State::new().with("a", 1).with("b", 2);
    ///
    /// let mut copy = state.substate(&[]);
    /// copy.set("a", 100);
    /// assert_eq!(state.get("a").and_then(|v| v.as_i64()), Some(1));
    ///
    /// let only_b = state.substate(&["b", "missing"]);
    /// assert_eq!(only_b.len(), 1);
    /// ```
    pub fn substate(&self, keys: &[&str]) -> State {
        if keys.is_empty() {
            return self.clone();
        }
        let values = keys
            .iter()
            .filter_map(|key| {
                self.values
                    .get_key_value(*key)
                    .map(|(k, v)| (k.clone(), v.clone()))
            })
            .collect();
        State { values }
    }

    /// The ordered items of this state, used as the visited-set key during search.
    pub fn canonical_key(&self) -> StateKey {
        self.values
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }
}

impl<K, V> FromIterator<(K, V)> for State
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut state = State::new();
        for (key, value) in iter {
            state.set(key, value);
        }
        state
    }
}

impl fmt::Display for State {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.values.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {}", key, value)?;
        }
        write!(f, "}}")
    }
}
