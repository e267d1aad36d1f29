use serde::Deserialize;
use tracing::debug;

use chirpy_types::models::Chirp;

use crate::profanity::mask_profanity;
use crate::{Database, DbError, Result};

pub const MAX_CHIRP_LENGTH: usize = 140;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Optional restrictions for [`Database::list_chirps`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ChirpFilter {
    pub author_id: Option<u64>,
    pub sort: SortOrder,
}

impl Database {
    // -- Chirps --

    pub fn create_chirp(&self, body: &str, author_id: u64) -> Result<Chirp> {
        let length = body.chars().count();
        if length > MAX_CHIRP_LENGTH {
            return Err(DbError::Validation(format!(
                "chirp is too long ({length} characters, max {MAX_CHIRP_LENGTH})"
            )));
        }

        let body = mask_profanity(body);

        let chirp = self.write(|doc| {
            let chirp = Chirp {
                id: doc.next_chirp_id()?,
                body,
                author_id,
            };
            doc.chirps.insert(chirp.id, chirp.clone());
            Ok(chirp)
        })?;

        debug!(chirp_id = chirp.id, author_id, "chirp created");
        Ok(chirp)
    }

    pub fn get_chirp(&self, id: u64) -> Result<Chirp> {
        self.read(|doc| {
            doc.chirps
                .get(&id)
                .cloned()
                .ok_or_else(|| DbError::NotFound(format!("chirp {id}")))
        })
    }

    /// Chirps in id order, optionally restricted to one author.
    pub fn list_chirps(&self, filter: ChirpFilter) -> Result<Vec<Chirp>> {
        // BTreeMap iteration is already ascending by id.
        let mut chirps: Vec<Chirp> = self.read(|doc| {
            Ok(doc
                .chirps
                .values()
                .filter(|c| filter.author_id.is_none_or(|author| c.author_id == author))
                .cloned()
                .collect())
        })?;

        if filter.sort == SortOrder::Desc {
            chirps.reverse();
        }
        Ok(chirps)
    }

    /// Delete a chirp on behalf of `requesting_user_id`, who must be its author.
    pub fn delete_chirp(&self, id: u64, requesting_user_id: u64) -> Result<()> {
        self.write(|doc| {
            let chirp = doc
                .chirps
                .get(&id)
                .ok_or_else(|| DbError::NotFound(format!("chirp {id}")))?;

            if chirp.author_id != requesting_user_id {
                return Err(DbError::Forbidden(format!(
                    "user {requesting_user_id} is not the author of chirp {id}"
                )));
            }

            doc.chirps.remove(&id);
            Ok(())
        })?;

        debug!(chirp_id = id, user_id = requesting_user_id, "chirp deleted");
        Ok(())
    }
}
