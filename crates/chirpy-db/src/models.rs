use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use chirpy_types::models::{Chirp, User};

use crate::{DbError, Result};

/// The single document persisted on disk.
///
/// Maps are keyed by id and ordered, so serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub chirps: BTreeMap<u64, Chirp>,
    pub users: BTreeMap<u64, User>,
    #[serde(default)]
    pub sequences: Sequences,
}

/// Highest id handed out so far for each map. Deleted ids are never reused.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequences {
    pub chirps: u64,
    pub users: u64,
}

impl Document {
    /// Reserve the next chirp id. Must be called inside a write.
    pub fn next_chirp_id(&mut self) -> Result<u64> {
        let id = next_id(self.sequences.chirps, &self.chirps)?;
        self.sequences.chirps = id;
        Ok(id)
    }

    /// Reserve the next user id. Must be called inside a write.
    pub fn next_user_id(&mut self) -> Result<u64> {
        let id = next_id(self.sequences.users, &self.users)?;
        self.sequences.users = id;
        Ok(id)
    }
}

fn next_id<V>(last_assigned: u64, existing: &BTreeMap<u64, V>) -> Result<u64> {
    let max_key = existing.keys().next_back().copied().unwrap_or(0);
    last_assigned
        .max(max_key)
        .checked_add(1)
        .ok_or_else(|| DbError::Validation("id space exhausted".into()))
}
