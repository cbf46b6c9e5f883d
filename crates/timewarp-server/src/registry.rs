// Copyright 2026 U.S. Federal Government (in countries where recognized)
// SPDX-License-Identifier: Apache-2.0

//! The collection of registered timers.

use crate::error::RegistryError;
use crate::timer::Timer;

/// A timer together with its registry id.
#[derive(Clone, Debug)]
struct RegistryEntry {
    id: u32,
    timer: Timer,
}

/// An ordered collection of timers keyed by a stable, never-reused id.
///
/// Ids are assigned monotonically on insertion and remain valid until the
/// timer is explicitly deleted; deleting one timer never disturbs the ids of
/// the others. Iteration order is insertion order.
#[derive(Clone, Debug, Default)]
pub struct TimerRegistry {
    next_id: u32,
    entries: Vec<RegistryEntry>,
}

impl TimerRegistry {
    /// Create an empty registry.
    pub fn new() -> TimerRegistry {
        TimerRegistry::default()
    }

    /// Append a timer and return its assigned id.
    pub fn add(&mut self, timer: Timer) -> u32 {
        let id = self.next_id;
        self.next_id += 1;
        self.entries.push(RegistryEntry { id, timer });
        id
    }

    /// Look up a timer by id.
    pub fn get(&self, id: u32) -> Option<&Timer> {
        self.entries
            .iter()
            .find(|entry| entry.id == id)
            .map(|entry| &entry.timer)
    }

    /// Look up a timer by id for mutation.
    pub fn get_mut(&mut self, id: u32) -> Option<&mut Timer> {
        self.entries
            .iter_mut()
            .find(|entry| entry.id == id)
            .map(|entry| &mut entry.timer)
    }

    /// Remove a timer by id.
    ///
    /// The id is retired permanently; later insertions keep counting from
    /// the high-water mark.
    pub fn delete(&mut self, id: u32) -> Result<(), RegistryError> {
        match self.entries.iter().position(|entry| entry.id == id) {
            Some(index) => {
                self.entries.remove(index);
                Ok(())
            }
            None => Err(RegistryError::NotFound { id }),
        }
    }

    /// Iterate over all `(id, timer)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (u32, &Timer)> {
        self.entries.iter().map(|entry| (entry.id, &entry.timer))
    }

    /// Number of registered timers.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry holds no timers.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tick every registered timer once.
    pub fn tick_all(&mut self) {
        for entry in &mut self.entries {
            entry.timer.tick();
        }
    }
}
