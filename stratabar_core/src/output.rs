// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The `Unnamed → Named` display-output lifecycle.
//!
//! An output is created when the compositor advertises its global, but its
//! human-readable name arrives later through an asynchronous protocol event.
//! Until then the output is held here in a transient state and excluded from
//! panel placement: draws and output-selection predicates only ever see named
//! outputs. The transition happens exactly once; later name events for the
//! same output are ignored.
//!
//! Entries are keyed by the registry global name (a `u32` the compositor
//! chose), since that is the only identity an output has before naming and
//! the key removal events use.

use std::collections::BTreeMap;

/// Result of a name-assignment attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NameOutcome {
    /// The output transitioned `Unnamed → Named`.
    Named,
    /// The output already had a name; the event was ignored.
    AlreadyNamed,
    /// No output is registered under that global.
    Unknown,
}

#[derive(Debug)]
struct DirectoryEntry<T> {
    name: Option<String>,
    payload: T,
}

/// Directory of display outputs keyed by registry global.
#[derive(Debug)]
pub struct OutputDirectory<T> {
    entries: BTreeMap<u32, DirectoryEntry<T>>,
}

impl<T> Default for OutputDirectory<T> {
    fn default() -> Self {
        Self {
            entries: BTreeMap::new(),
        }
    }
}

impl<T> OutputDirectory<T> {
    /// Creates an empty directory.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new, still unnamed output under `global`.
    ///
    /// Returns false (and keeps the existing entry) if the global is already
    /// present, which would indicate a compositor protocol violation.
    pub fn insert(&mut self, global: u32, payload: T) -> bool {
        if self.entries.contains_key(&global) {
            return false;
        }
        self.entries.insert(
            global,
            DirectoryEntry {
                name: None,
                payload,
            },
        );
        true
    }

    /// Applies the one-shot naming event.
    pub fn assign_name(&mut self, global: u32, name: impl Into<String>) -> NameOutcome {
        match self.entries.get_mut(&global) {
            None => NameOutcome::Unknown,
            Some(entry) if entry.name.is_some() => NameOutcome::AlreadyNamed,
            Some(entry) => {
                entry.name = Some(name.into());
                NameOutcome::Named
            }
        }
    }

    /// Removes an output, returning its name (if it ever got one) and
    /// payload for teardown.
    pub fn remove(&mut self, global: u32) -> Option<(Option<String>, T)> {
        self.entries
            .remove(&global)
            .map(|entry| (entry.name, entry.payload))
    }

    /// Payload access by global, named or not.
    pub fn get_mut(&mut self, global: u32) -> Option<&mut T> {
        self.entries.get_mut(&global).map(|entry| &mut entry.payload)
    }

    /// Looks up a named output, returning its global and payload.
    pub fn find_by_name_mut(&mut self, name: &str) -> Option<(u32, &mut T)> {
        self.entries
            .iter_mut()
            .find(|(_, entry)| entry.name.as_deref() == Some(name))
            .map(|(global, entry)| (*global, &mut entry.payload))
    }

    /// Whether a named output with this name exists.
    #[must_use]
    pub fn contains_name(&self, name: &str) -> bool {
        self.entries
            .values()
            .any(|entry| entry.name.as_deref() == Some(name))
    }

    /// Names of all named outputs, in global order.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        self.entries
            .values()
            .filter_map(|entry| entry.name.clone())
            .collect()
    }

    /// Iterates named outputs only.
    pub fn named_mut(&mut self) -> impl Iterator<Item = (&str, &mut T)> {
        self.entries.values_mut().filter_map(|entry| {
            entry
                .name
                .as_deref()
                .map(|name| (name, &mut entry.payload))
        })
    }

    /// Total entry count, including unnamed outputs.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn naming_transitions_exactly_once() {
        let mut directory = OutputDirectory::new();
        assert!(directory.insert(7, "payload"), "insert");

        assert_eq!(directory.assign_name(7, "DP-1"), NameOutcome::Named);
        assert_eq!(
            directory.assign_name(7, "DP-2"),
            NameOutcome::AlreadyNamed,
            "second name event must be ignored"
        );
        assert!(directory.contains_name("DP-1"), "first name kept");
        assert!(!directory.contains_name("DP-2"), "second name dropped");
    }

    #[test]
    fn unnamed_outputs_are_invisible_to_drawing() {
        let mut directory = OutputDirectory::new();
        directory.insert(1, "unnamed");
        directory.insert(2, "named");
        directory.assign_name(2, "HDMI-A-1");

        assert_eq!(directory.names(), vec!["HDMI-A-1".to_owned()]);
        assert_eq!(directory.named_mut().count(), 1, "only named iterated");
        assert!(
            directory.find_by_name_mut("HDMI-A-1").is_some(),
            "named output addressable"
        );
        assert_eq!(directory.len(), 2, "unnamed output still tracked");
    }

    #[test]
    fn naming_an_unknown_global_is_reported() {
        let mut directory = OutputDirectory::<()>::new();
        assert_eq!(directory.assign_name(9, "DP-1"), NameOutcome::Unknown);
    }

    #[test]
    fn duplicate_global_is_rejected() {
        let mut directory = OutputDirectory::new();
        assert!(directory.insert(3, 1));
        assert!(!directory.insert(3, 2), "duplicate global rejected");
        assert_eq!(directory.get_mut(3), Some(&mut 1), "original kept");
    }

    #[test]
    fn removal_yields_name_and_payload_for_teardown() {
        let mut directory = OutputDirectory::new();
        directory.insert(4, "surfaces");
        directory.assign_name(4, "eDP-1");

        let (name, payload) = directory.remove(4).expect("entry");
        assert_eq!(name.as_deref(), Some("eDP-1"), "name returned");
        assert_eq!(payload, "surfaces", "payload returned");
        assert!(directory.is_empty(), "entry gone");
    }
}
