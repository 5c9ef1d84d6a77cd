use std::path::PathBuf;

use directories::ProjectDirs;
use serde::Deserialize;

use crate::error::EngineError;

/// Weights for the combined transition score. Defaults sum to 1.0 so the
/// combined score stays in [0, 1].
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub harmonic: f64,
    pub tempo: f64,
    pub energy: f64,
    pub popularity: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            harmonic: 0.40,
            tempo: 0.30,
            energy: 0.20,
            popularity: 0.10,
        }
    }
}

/// Target energy curve over the set: linear rise from `start` to `peak` at
/// `peak_position`, then linear descent to `end` at the close.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EnergyArc {
    pub start: f64,
    pub peak: f64,
    /// Normalized position of the peak, [0, 1].
    pub peak_position: f64,
    pub end: f64,
}

impl Default for EnergyArc {
    fn default() -> Self {
        Self {
            start: 0.40,
            peak: 0.90,
            peak_position: 0.75,
            end: 0.50,
        }
    }
}

impl EnergyArc {
    /// Target energy at normalized position `p` (clamped to [0, 1]).
    pub fn target(&self, p: f64) -> f64 {
        let p = p.clamp(0.0, 1.0);
        if p <= self.peak_position {
            if self.peak_position == 0.0 {
                return self.peak;
            }
            self.start + (self.peak - self.start) * (p / self.peak_position)
        } else {
            let descent = (p - self.peak_position) / (1.0 - self.peak_position);
            self.peak + (self.end - self.peak) * descent
        }
    }
}

/// Engine configuration: all the tunable constants of the compatibility
/// model in one place. Defaults are the documented values the tests assert
/// against; a TOML file may override any subset.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub weights: ScoreWeights,
    pub arc: EnergyArc,
    /// Popularity bonus applies within this radius of the arc peak.
    pub peak_window: f64,
    /// Transitions with a combined score below this are flagged as weak.
    pub weak_threshold: f64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            weights: ScoreWeights::default(),
            arc: EnergyArc::default(),
            peak_window: 0.15,
            weak_threshold: 0.50,
        }
    }
}

impl EngineConfig {
    /// Reject weight sets and arc shapes the scoring model can't use.
    pub fn validate(&self) -> Result<(), EngineError> {
        let w = &self.weights;
        let all = [w.harmonic, w.tempo, w.energy, w.popularity];
        if all.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(EngineError::InvalidConfig(
                "score weights must be finite and non-negative".into(),
            ));
        }
        if all.iter().sum::<f64>() <= 0.0 {
            return Err(EngineError::InvalidConfig(
                "at least one score weight must be positive".into(),
            ));
        }
        if !(0.0..=1.0).contains(&self.arc.peak_position) {
            return Err(EngineError::InvalidConfig(format!(
                "arc peak_position {} outside [0, 1]",
                self.arc.peak_position
            )));
        }
        for (name, v) in [
            ("arc start", self.arc.start),
            ("arc peak", self.arc.peak),
            ("arc end", self.arc.end),
        ] {
            if !(0.0..=1.0).contains(&v) {
                return Err(EngineError::InvalidConfig(format!(
                    "{name} {v} outside [0, 1]"
                )));
            }
        }
        if !(0.0..=1.0).contains(&self.peak_window) {
            return Err(EngineError::InvalidConfig(format!(
                "peak_window {} outside [0, 1]",
                self.peak_window
            )));
        }
        Ok(())
    }
}

/// Application configuration loaded from a TOML config file.
/// All fields have defaults — the config file is optional.
#[derive(Debug, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    /// Engine tunables ([engine] table in the file).
    pub engine: EngineConfig,
}

impl AppConfig {
    /// Load config from `~/.config/mixplan/config.toml`, or from an explicit
    /// path. Returns defaults if the file doesn't exist; logs a warning if it
    /// exists but can't be parsed.
    pub fn load(explicit: Option<&PathBuf>) -> Self {
        let path = explicit.cloned().or_else(Self::config_path);
        match path {
            Some(path) if path.exists() => match std::fs::read_to_string(&path) {
                Ok(contents) => match toml::from_str::<AppConfig>(&contents) {
                    Ok(config) => {
                        log::info!("Loaded config from {}", path.display());
                        config
                    }
                    Err(e) => {
                        log::warn!("Failed to parse {}: {}. Using defaults.", path.display(), e);
                        Self::default()
                    }
                },
                Err(e) => {
                    log::warn!("Failed to read {}: {}. Using defaults.", path.display(), e);
                    Self::default()
                }
            },
            _ => {
                log::debug!("No config file found, using defaults");
                Self::default()
            }
        }
    }

    fn config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", crate::APP_NAME)
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }
}
