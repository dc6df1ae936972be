// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Named state sources and per-cycle dirty flags.
//!
//! A source is a named producer of external state (time, power, network…).
//! Its contract is "evaluate, decide dirty, publish": the producer reads the
//! outside world from an [`IoHandler`](crate::reactor::IoHandler) callback and
//! publishes into the shared [`Sources`] registry, which flags the name dirty
//! only when the value actually changed. The dirty set is consumed exactly
//! once per reactor batch.

use std::collections::{BTreeMap, BTreeSet};

/// A published source value.
///
/// The vocabulary is deliberately small; widgets pick out what they render
/// and ignore the rest.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SourceValue {
    /// Free-form display text, e.g. a formatted clock.
    Text(String),
    /// Power-supply state.
    Power {
        /// External power is connected.
        plugged: bool,
        /// The battery is charging.
        charging: bool,
        /// Battery capacity in percent, 0–100.
        capacity: u8,
    },
    /// Names of currently active network interfaces.
    Networks(Vec<String>),
}

#[derive(Debug)]
struct Entry {
    value: SourceValue,
    dirty: bool,
}

/// Registry of named source values with per-name dirty flags.
#[derive(Debug, Default)]
pub struct Sources {
    entries: BTreeMap<String, Entry>,
}

impl Sources {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes a value under `name`.
    ///
    /// The name goes dirty — and this returns true — only when the value
    /// differs from what was last published. The first publish of a name
    /// always counts as a change.
    pub fn publish(&mut self, name: &str, value: SourceValue) -> bool {
        match self.entries.get_mut(name) {
            Some(entry) => {
                if entry.value == value {
                    return false;
                }
                entry.value = value;
                entry.dirty = true;
                true
            }
            None => {
                self.entries.insert(
                    name.to_owned(),
                    Entry { value, dirty: true },
                );
                true
            }
        }
    }

    /// Last published value for `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SourceValue> {
        self.entries.get(name).map(|entry| &entry.value)
    }

    /// Whether any name in `deps` is currently dirty.
    #[must_use]
    pub fn is_dirty(&self, deps: &BTreeSet<String>) -> bool {
        deps.iter()
            .any(|name| self.entries.get(name).is_some_and(|entry| entry.dirty))
    }

    /// Drains the dirty set: returns every currently dirty name and clears
    /// all flags. Called once per reactor batch so that every source that
    /// changed in one wakeup is observed together.
    pub fn take_dirty(&mut self) -> BTreeSet<String> {
        let mut dirty = BTreeSet::new();
        for (name, entry) in &mut self.entries {
            if entry.dirty {
                entry.dirty = false;
                dirty.insert(name.clone());
            }
        }
        dirty
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deps(names: &[&str]) -> BTreeSet<String> {
        names.iter().map(|name| (*name).to_owned()).collect()
    }

    #[test]
    fn first_publish_marks_dirty() {
        let mut sources = Sources::new();
        assert!(
            sources.publish("time", SourceValue::Text("12:00".into())),
            "first publish is a change"
        );
        assert!(sources.is_dirty(&deps(&["time"])), "flag set");
    }

    #[test]
    fn republishing_the_same_value_is_not_a_change() {
        let mut sources = Sources::new();
        sources.publish("time", SourceValue::Text("12:00".into()));
        let _ = sources.take_dirty();

        assert!(
            !sources.publish("time", SourceValue::Text("12:00".into())),
            "identical value must not dirty the source"
        );
        assert!(sources.take_dirty().is_empty(), "no dirty names");
    }

    #[test]
    fn take_dirty_drains_all_flags_at_once() {
        let mut sources = Sources::new();
        sources.publish(
            "power",
            SourceValue::Power {
                plugged: true,
                charging: true,
                capacity: 80,
            },
        );
        sources.publish("network", SourceValue::Networks(vec!["wlan0".into()]));

        let dirty = sources.take_dirty();
        assert_eq!(dirty, deps(&["network", "power"]), "both names reported");
        assert!(sources.take_dirty().is_empty(), "flags cleared");
    }

    #[test]
    fn dirtiness_check_is_set_intersection() {
        let mut sources = Sources::new();
        sources.publish("power", SourceValue::Text("80%".into()));

        assert!(
            sources.is_dirty(&deps(&["power", "network"])),
            "overlapping set"
        );
        assert!(!sources.is_dirty(&deps(&["time", "date"])), "disjoint set");
        assert!(!sources.is_dirty(&deps(&[])), "empty set");
    }
}
