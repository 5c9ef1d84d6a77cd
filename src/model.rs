use serde::{Deserialize, Serialize};

use crate::camelot::CamelotCode;
use crate::error::EngineError;

/// Major/minor mode, serialized lowercase ("major"/"minor") to match the
/// track dataset schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Major,
    Minor,
}

/// One track in the input collection. All fields are required — a missing
/// field is a parse error, never a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Track {
    /// Unique id within the collection.
    pub id: String,
    pub title: String,
    pub artist: String,
    /// Pitch class, 0 = C … 11 = B.
    pub key: u8,
    pub mode: Mode,
    /// Tempo in beats per minute, > 0.
    pub bpm: f64,
    /// Normalized energy, [0, 1].
    pub energy: f64,
    /// Normalized danceability, [0, 1].
    pub danceability: f64,
    /// Popularity, [0, 100].
    pub popularity: u8,
}

impl Track {
    /// Camelot code derived from key and mode. Only valid after `validate`.
    pub fn camelot(&self) -> CamelotCode {
        CamelotCode::from_key(self.key, self.mode)
    }

    /// Check every numeric field against its declared domain.
    pub fn validate(&self) -> Result<(), EngineError> {
        let fail = |reason: String| EngineError::InvalidTrackData {
            id: self.id.clone(),
            reason,
        };
        if self.key > 11 {
            return Err(fail(format!("key {} outside pitch classes 0-11", self.key)));
        }
        if !self.bpm.is_finite() || self.bpm <= 0.0 {
            return Err(fail(format!("bpm {} must be a positive number", self.bpm)));
        }
        if !self.energy.is_finite() || !(0.0..=1.0).contains(&self.energy) {
            return Err(fail(format!("energy {} outside [0, 1]", self.energy)));
        }
        if !self.danceability.is_finite() || !(0.0..=1.0).contains(&self.danceability) {
            return Err(fail(format!(
                "danceability {} outside [0, 1]",
                self.danceability
            )));
        }
        if self.popularity > 100 {
            return Err(fail(format!(
                "popularity {} outside [0, 100]",
                self.popularity
            )));
        }
        Ok(())
    }
}
