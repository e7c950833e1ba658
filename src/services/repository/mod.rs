//! In-memory occurrence list owned by the timeline screen.
//!
//! Moves are applied optimistically; a snapshot taken before the gesture is
//! the only way back when the calendar store rejects the change.

use anyhow::{anyhow, Result};

use crate::models::occurrence::{EventOccurrence, OccurrencePatch};

/// Full copy of the occurrence list at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct OccurrenceSnapshot {
    occurrences: Vec<EventOccurrence>,
    revision: u64,
}

impl OccurrenceSnapshot {
    pub fn occurrences(&self) -> &[EventOccurrence] {
        &self.occurrences
    }

    /// Revision of the repository when the snapshot was taken
    pub fn revision(&self) -> u64 {
        self.revision
    }
}

#[derive(Debug, Default)]
pub struct OccurrenceRepository {
    occurrences: Vec<EventOccurrence>,
    revision: u64,
}

impl OccurrenceRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_occurrences(occurrences: Vec<EventOccurrence>) -> Self {
        Self {
            occurrences,
            revision: 0,
        }
    }

    pub fn all(&self) -> &[EventOccurrence] {
        &self.occurrences
    }

    pub fn get(&self, id: &str) -> Option<&EventOccurrence> {
        self.occurrences.iter().find(|occurrence| occurrence.id == id)
    }

    pub fn len(&self) -> usize {
        self.occurrences.len()
    }

    pub fn is_empty(&self) -> bool {
        self.occurrences.is_empty()
    }

    /// Bumped on every mutation; layouts cache against it.
    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> OccurrenceSnapshot {
        OccurrenceSnapshot {
            occurrences: self.occurrences.clone(),
            revision: self.revision,
        }
    }

    /// Replace everything, e.g. after loading a new date range.
    pub fn replace_all(&mut self, occurrences: Vec<EventOccurrence>) {
        self.occurrences = occurrences;
        self.revision += 1;
    }

    /// Merge a further page of results; records with a known id are replaced.
    pub fn append(&mut self, occurrences: Vec<EventOccurrence>) {
        for occurrence in occurrences {
            match self
                .occurrences
                .iter_mut()
                .find(|existing| existing.id == occurrence.id)
            {
                Some(existing) => *existing = occurrence,
                None => self.occurrences.push(occurrence),
            }
        }
        self.revision += 1;
    }

    /// Patch one occurrence in place. Invalid results leave the list untouched.
    pub fn apply(&mut self, id: &str, patch: &OccurrencePatch) -> Result<()> {
        let slot = self
            .occurrences
            .iter_mut()
            .find(|occurrence| occurrence.id == id)
            .ok_or_else(|| anyhow!("Occurrence '{}' is not loaded", id))?;

        let updated = slot
            .patched(patch)
            .map_err(|e| anyhow!("Invalid patch for '{}': {}", id, e))?;
        *slot = updated;
        self.revision += 1;
        Ok(())
    }

    /// Restore a snapshot wholesale. Later edits are discarded.
    pub fn rollback(&mut self, snapshot: OccurrenceSnapshot) {
        log::debug!(
            "Rolling back occurrences from revision {} to snapshot of revision {}",
            self.revision,
            snapshot.revision
        );
        self.occurrences = snapshot.occurrences;
        self.revision += 1;
    }
}
