//! Track collection loading — the external "load" step in front of the
//! sequence/justify pipeline. One JSON array of track objects; schema is
//! enforced by serde (missing fields are errors, not defaults) and domain
//! validation happens in the sequencer before any scoring.

use std::path::Path;

use crate::error::EngineError;
use crate::model::Track;

/// Read a JSON array of tracks from `path`.
pub fn load_tracks(path: &Path) -> Result<Vec<Track>, EngineError> {
    let contents = std::fs::read_to_string(path).map_err(|source| EngineError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let tracks: Vec<Track> =
        serde_json::from_str(&contents).map_err(|source| EngineError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    log::info!("Loaded {} tracks from {}", tracks.len(), path.display());
    Ok(tracks)
}
