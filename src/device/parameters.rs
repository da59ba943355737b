//! Shared device parameter store.
//!
//! A typed key-value register of the device's current observed and derived
//! state.  Sensors write, actors read, and the link thread applies backend
//! commands, all concurrently.
//!
//! ## Locking
//!
//! Every key owns its own `RwLock`.  The outer map lock is only held long
//! enough to look up (or create) a key's slot, never while a value is read
//! or written, so the render thread and the scheduler thread do not contend
//! on unrelated keys.  Multi-key writes lock their slots in name order.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{Deserialize, Serialize};

/// Well-known parameter names.
pub mod keys {
    /// Buzzer muted by the operator (bool).
    pub const SILENT: &str = "silent";
    /// Global alarm raised by the backend (bool).
    pub const ALARM: &str = "alarm";
    /// Most recent distance reading in metres (float).
    pub const CURRENT_DISTANCE_M: &str = "current_distance_m";
    /// Silent button currently held past the hold time (bool).
    pub const BUTTON_HELD: &str = "button_held";
}

/// Parameter value (union of supported types).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Float(f64),
    Text(String),
    /// Structured record.
    Record(serde_json::Map<String, serde_json::Value>),
}

impl ParamValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl From<bool> for ParamValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<f64> for ParamValue {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for ParamValue {
    fn from(v: &str) -> Self {
        Self::Text(v.to_owned())
    }
}

impl From<String> for ParamValue {
    fn from(v: String) -> Self {
        Self::Text(v)
    }
}

type Slot = Arc<RwLock<ParamValue>>;

/// Concurrent parameter store with per-key atomicity.
#[derive(Default)]
pub struct ParameterStore {
    slots: RwLock<HashMap<String, Slot>>,
}

impl ParameterStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current value of `name`, or `default` if it was never set.
    pub fn get(&self, name: &str, default: ParamValue) -> ParamValue {
        match self.slot(name) {
            Some(slot) => read(&slot).clone(),
            None => default,
        }
    }

    /// Boolean value of `name`; `default` if unset or of another type.
    pub fn get_bool(&self, name: &str, default: bool) -> bool {
        self.slot(name)
            .and_then(|slot| read(&slot).as_bool())
            .unwrap_or(default)
    }

    /// Float value of `name`; `default` if unset or of another type.
    pub fn get_float(&self, name: &str, default: f64) -> f64 {
        self.slot(name)
            .and_then(|slot| read(&slot).as_float())
            .unwrap_or(default)
    }

    /// Text value of `name`; `default` if unset or of another type.
    pub fn get_text(&self, name: &str, default: &str) -> String {
        self.slot(name)
            .and_then(|slot| read(&slot).as_text().map(str::to_owned))
            .unwrap_or_else(|| default.to_owned())
    }

    pub fn contains(&self, name: &str) -> bool {
        read(&self.slots).contains_key(name)
    }

    /// Replace the value of `name`.
    pub fn set(&self, name: &str, value: impl Into<ParamValue>) {
        let value = value.into();
        match self.slot(name) {
            Some(slot) => *write(&slot) = value,
            None => {
                let slot = self.slot_or_insert(name, || value.clone());
                *write(&slot) = value;
            }
        }
    }

    /// Atomic read-modify-write of a single key.  `f` receives the current
    /// value (or `default`) and returns the new one, which is also returned
    /// to the caller.  No other writer of `name` can interleave.
    pub fn update(
        &self,
        name: &str,
        default: ParamValue,
        f: impl FnOnce(ParamValue) -> ParamValue,
    ) -> ParamValue {
        let slot = self.slot_or_insert(name, || default);
        let mut guard = write(&slot);
        let next = f(guard.clone());
        *guard = next.clone();
        next
    }

    /// Write several keys so that no reader of any of them observes a value
    /// from before the call once any of them shows a value from after it.
    pub fn set_many(&self, entries: &[(&str, ParamValue)]) {
        let mut ordered: Vec<&(&str, ParamValue)> = entries.iter().collect();
        ordered.sort_by(|a, b| a.0.cmp(b.0));
        ordered.dedup_by(|a, b| a.0 == b.0);

        let slots: Vec<Slot> = ordered
            .iter()
            .map(|(name, value)| self.slot_or_insert(name, || value.clone()))
            .collect();
        let mut guards: Vec<RwLockWriteGuard<'_, ParamValue>> =
            slots.iter().map(|slot| write(slot)).collect();

        for (guard, (_, value)) in guards.iter_mut().zip(ordered) {
            **guard = value.clone();
        }
    }

    /// Read several keys under their locks, acquired in name order.
    pub fn get_many(&self, names: &[&str]) -> Vec<Option<ParamValue>> {
        let mut order: Vec<usize> = (0..names.len()).collect();
        order.sort_by(|&a, &b| names[a].cmp(names[b]));

        let slots: Vec<Option<Slot>> = names.iter().map(|n| self.slot(n)).collect();
        let mut guards: Vec<Option<RwLockReadGuard<'_, ParamValue>>> =
            (0..names.len()).map(|_| None).collect();
        for i in order {
            guards[i] = slots[i].as_ref().map(|slot| read(slot));
        }

        guards.iter().map(|g| g.as_ref().map(|v| (**v).clone())).collect()
    }

    /// Copy of every parameter, sorted by name.
    pub fn snapshot(&self) -> Vec<(String, ParamValue)> {
        let slots: Vec<(String, Slot)> = read(&self.slots)
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect();
        let mut out: Vec<(String, ParamValue)> = slots
            .into_iter()
            .map(|(k, slot)| {
                let value = read(&slot).clone();
                (k, value)
            })
            .collect();
        out.sort_by(|a, b| a.0.cmp(&b.0));
        out
    }

    // ── Internal ──────────────────────────────────────────────────

    fn slot(&self, name: &str) -> Option<Slot> {
        read(&self.slots).get(name).cloned()
    }

    fn slot_or_insert(&self, name: &str, init: impl FnOnce() -> ParamValue) -> Slot {
        if let Some(slot) = self.slot(name) {
            return slot;
        }
        Arc::clone(
            write(&self.slots)
                .entry(name.to_owned())
                .or_insert_with(|| Arc::new(RwLock::new(init()))),
        )
    }
}

// A writer that panicked mid-assignment cannot leave a torn `ParamValue`
// behind (assignment is a single move), so poisoned locks are recovered.
fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
