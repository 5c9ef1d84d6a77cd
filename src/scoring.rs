//! Pairwise compatibility scoring: harmonic, tempo, energy-arc fit, and
//! popularity placement. Every function here is a deterministic pure
//! function of its inputs — the sequencer and the justifier both rely on
//! re-invoking these producing identical numbers.

use serde::Serialize;

use crate::camelot::CamelotCode;
use crate::config::{EnergyArc, EngineConfig};
use crate::model::Track;

/// Tempo delta (fraction of the faster tempo) that still counts as directly
/// mixable without pitch adjustment.
pub const TEMPO_MIXABLE: f64 = 0.06;

/// Tempo delta at which the tempo score bottoms out at 0.0.
pub const TEMPO_LIMIT: f64 = 0.25;

/// Component scores for one candidate transition, all in [0, 1] except
/// `combined` which is bounded by the weight sum.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ScoreBreakdown {
    pub harmonic: f64,
    pub tempo: f64,
    /// Relative BPM gap behind the tempo score. A full tempo score with a
    /// gap above the mixable tolerance means a half/double-time pairing;
    /// stored so justification text never re-derives it from the tracks.
    pub tempo_delta: f64,
    pub energy_fit: f64,
    pub popularity_bonus: f64,
    pub combined: f64,
}

/// Harmonic compatibility from Camelot wheel distance: 1.0 for the same
/// code, down to 0.0 for a clash (distance 3).
pub fn harmonic_score(a: CamelotCode, b: CamelotCode) -> f64 {
    1.0 - f64::from(a.distance(&b)) / 3.0
}

/// True if one tempo sits within the mixable tolerance of exactly twice the
/// other (half/double-time mixing).
pub fn is_half_double(bpm_a: f64, bpm_b: f64) -> bool {
    let near_double = |fast: f64, slow: f64| {
        let doubled = slow * 2.0;
        (fast - doubled).abs() / fast.max(doubled) <= TEMPO_MIXABLE
    };
    near_double(bpm_a, bpm_b) || near_double(bpm_b, bpm_a)
}

/// Relative tempo gap as a fraction of the faster tempo. Symmetric.
pub fn tempo_delta(bpm_a: f64, bpm_b: f64) -> f64 {
    (bpm_a - bpm_b).abs() / bpm_a.max(bpm_b)
}

/// Tempo compatibility: 1.0 within ~6% (or at half/double time), linear
/// decay to 0.0 at a 25% gap. Symmetric, clamped to [0, 1].
pub fn tempo_score(bpm_a: f64, bpm_b: f64) -> f64 {
    let delta = tempo_delta(bpm_a, bpm_b);
    if delta <= TEMPO_MIXABLE || is_half_double(bpm_a, bpm_b) {
        return 1.0;
    }
    ((TEMPO_LIMIT - delta) / (TEMPO_LIMIT - TEMPO_MIXABLE)).clamp(0.0, 1.0)
}

/// How closely a track's energy matches the target arc at position `p`.
pub fn energy_fit(energy: f64, p: f64, arc: &EnergyArc) -> f64 {
    (1.0 - (energy - arc.target(p)).abs()).clamp(0.0, 1.0)
}

/// Popularity bonus, non-zero only inside the peak window. The weight
/// constant is applied in the combined sum, not here, so the stored bonus
/// stays recomputable as popularity/100.
pub fn popularity_bonus(popularity: u8, p: f64, cfg: &EngineConfig) -> f64 {
    if (p - cfg.arc.peak_position).abs() <= cfg.peak_window {
        f64::from(popularity) / 100.0
    } else {
        0.0
    }
}

/// Full breakdown for placing `candidate` right after `current`, with the
/// candidate landing at normalized position `p`.
pub fn score_candidate(
    current: &Track,
    candidate: &Track,
    p: f64,
    cfg: &EngineConfig,
) -> ScoreBreakdown {
    let harmonic = harmonic_score(current.camelot(), candidate.camelot());
    let tempo = tempo_score(current.bpm, candidate.bpm);
    let energy = energy_fit(candidate.energy, p, &cfg.arc);
    let pop = popularity_bonus(candidate.popularity, p, cfg);

    let w = &cfg.weights;
    let combined =
        w.harmonic * harmonic + w.tempo * tempo + w.energy * energy + w.popularity * pop;

    ScoreBreakdown {
        harmonic,
        tempo,
        tempo_delta: tempo_delta(current.bpm, candidate.bpm),
        energy_fit: energy,
        popularity_bonus: pop,
        combined,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;

    fn make_track(id: &str, key: u8, mode: Mode, bpm: f64, energy: f64, pop: u8) -> Track {
        Track {
            id: id.to_string(),
            title: id.to_string(),
            artist: "test".to_string(),
            key,
            mode,
            bpm,
            energy,
            danceability: 0.5,
            popularity: pop,
        }
    }

    #[test]
    fn test_harmonic_score_ladder() {
        let c = |n, m| CamelotCode { number: n, minor: m };
        assert_eq!(harmonic_score(c(8, true), c(8, true)), 1.0);
        let relative = harmonic_score(c(8, true), c(8, false));
        let adjacent = harmonic_score(c(8, true), c(9, true));
        assert!((relative - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(relative, adjacent);
        assert!((harmonic_score(c(8, true), c(10, true)) - 1.0 / 3.0).abs() < 1e-12);
        assert_eq!(harmonic_score(c(8, true), c(3, false)), 0.0);
    }

    #[test]
    fn test_tempo_identical_and_close() {
        assert_eq!(tempo_score(120.0, 120.0), 1.0);
        // 120 vs 122: ~1.6% apart, inside the mixable band.
        assert_eq!(tempo_score(120.0, 122.0), 1.0);
    }

    #[test]
    fn test_tempo_linear_decay() {
        // 120 vs 100: delta = 20/120 ≈ 0.1667, between 0.06 and 0.25.
        let s = tempo_score(120.0, 100.0);
        let expected = (0.25 - 20.0 / 120.0) / (0.25 - 0.06);
        assert!((s - expected).abs() < 1e-12);
        assert!(s > 0.0 && s < 1.0);
        // Beyond the limit: 100 vs 140 is a 28.6% gap.
        assert_eq!(tempo_score(100.0, 140.0), 0.0);
    }

    #[test]
    fn test_tempo_symmetric_and_bounded() {
        let pairs = [(120.0, 100.0), (90.0, 178.0), (60.0, 200.0), (128.0, 128.0)];
        for (a, b) in pairs {
            assert_eq!(tempo_score(a, b), tempo_score(b, a));
            assert!((0.0..=1.0).contains(&tempo_score(a, b)));
        }
    }

    #[test]
    fn test_tempo_half_double_override() {
        // 170 vs 85 is exactly double: full match despite the 50% delta.
        assert_eq!(tempo_score(170.0, 85.0), 1.0);
        // 174 vs 86: 174 is within 6% of 172, still half-time mixable.
        assert_eq!(tempo_score(174.0, 86.0), 1.0);
        // 150 vs 100 is neither close nor a half/double pairing.
        assert!(tempo_score(150.0, 100.0) < 1.0);
    }

    #[test]
    fn test_energy_fit_exact_and_monotone() {
        let arc = EnergyArc::default();
        let target = arc.target(0.5);
        assert_eq!(energy_fit(target, 0.5, &arc), 1.0);

        // Score strictly decreases as the miss grows.
        let close = energy_fit(target + 0.05, 0.5, &arc);
        let far = energy_fit(target + 0.2, 0.5, &arc);
        assert!(close < 1.0);
        assert!(far < close);
    }

    #[test]
    fn test_popularity_bonus_window() {
        let cfg = EngineConfig::default();
        // Peak at 0.75, radius 0.15: p = 0.70 is inside, p = 0.30 is not.
        assert_eq!(popularity_bonus(90, 0.70, &cfg), 0.9);
        assert_eq!(popularity_bonus(90, 0.75, &cfg), 0.9);
        assert_eq!(popularity_bonus(90, 0.30, &cfg), 0.0);
        assert_eq!(popularity_bonus(90, 0.91, &cfg), 0.0);
        assert_eq!(popularity_bonus(50, 0.88, &cfg), 0.5);
    }

    #[test]
    fn test_breakdown_stores_tempo_delta() {
        let cfg = EngineConfig::default();
        // Half/double pair: full tempo score, but the stored delta keeps
        // the 50% gap visible for the justifier.
        let a = make_track("a", 9, Mode::Minor, 85.0, 0.4, 50);
        let b = make_track("b", 9, Mode::Minor, 170.0, 0.5, 50);
        let s = score_candidate(&a, &b, 0.5, &cfg);
        assert_eq!(s.tempo, 1.0);
        assert!((s.tempo_delta - 0.5).abs() < 1e-12);
        assert!(s.tempo_delta > TEMPO_MIXABLE);

        // Close-tempo pair: same full score, delta inside the tolerance.
        let c = make_track("c", 9, Mode::Minor, 88.0, 0.5, 50);
        let s2 = score_candidate(&a, &c, 0.5, &cfg);
        assert_eq!(s2.tempo, 1.0);
        assert!(s2.tempo_delta <= TEMPO_MIXABLE);
        assert_eq!(tempo_delta(85.0, 170.0), tempo_delta(170.0, 85.0));
    }

    #[test]
    fn test_combined_is_weighted_sum() {
        let cfg = EngineConfig::default();
        let a = make_track("a", 9, Mode::Minor, 120.0, 0.5, 80);
        let b = make_track("b", 9, Mode::Minor, 122.0, 0.6, 70);

        let s = score_candidate(&a, &b, 0.5, &cfg);
        assert_eq!(s.harmonic, 1.0);
        assert_eq!(s.tempo, 1.0);
        assert_eq!(s.popularity_bonus, 0.0); // outside the peak window

        let w = &cfg.weights;
        let expected = w.harmonic + w.tempo + w.energy * s.energy_fit;
        assert!((s.combined - expected).abs() < 1e-12);
    }

    #[test]
    fn test_score_candidate_deterministic() {
        let cfg = EngineConfig::default();
        let a = make_track("a", 4, Mode::Major, 126.0, 0.8, 92);
        let b = make_track("b", 5, Mode::Major, 102.0, 0.76, 88);
        assert_eq!(
            score_candidate(&a, &b, 0.7, &cfg),
            score_candidate(&a, &b, 0.7, &cfg)
        );
    }
}
