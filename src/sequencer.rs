//! Greedy nearest-neighbor set construction. O(N²): at each step every
//! unplaced track is scored against the last-placed one and the best
//! candidate wins. No backtracking — a locally poor choice stands, and the
//! justifier flags it rather than the sequencer rejecting it.

use std::collections::HashSet;

use serde::Serialize;

use crate::config::EngineConfig;
use crate::error::EngineError;
use crate::model::Track;
use crate::scoring::{self, ScoreBreakdown};

/// One scored move from `from_id` to `to_id`. Immutable once recorded;
/// the justifier reads these numbers back instead of rescoring.
#[derive(Debug, Clone, Serialize)]
pub struct Transition {
    pub from_id: String,
    pub to_id: String,
    /// Normalized position of the incoming track, 0.0–1.0.
    pub position: f64,
    #[serde(flatten)]
    pub scores: ScoreBreakdown,
}

/// The built set: a permutation of the input collection plus one transition
/// per consecutive pair.
#[derive(Debug, Clone, Serialize)]
pub struct Sequence {
    pub tracks: Vec<Track>,
    pub transitions: Vec<Transition>,
}

/// Validate a collection before any scoring: non-empty, unique ids, every
/// numeric field in its declared domain. Fail fast — no partial sequence.
pub fn validate(tracks: &[Track]) -> Result<(), EngineError> {
    if tracks.is_empty() {
        return Err(EngineError::EmptyCollection);
    }
    let mut seen = HashSet::with_capacity(tracks.len());
    for track in tracks {
        track.validate()?;
        if !seen.insert(track.id.as_str()) {
            return Err(EngineError::DuplicateTrackId(track.id.clone()));
        }
    }
    Ok(())
}

/// Build the set. Deterministic: identical input yields an identical
/// sequence, scores included. Never fails on valid input — even a
/// worst-score candidate gets placed.
pub fn sequence(tracks: &[Track], cfg: &EngineConfig) -> Result<Sequence, EngineError> {
    validate(tracks)?;
    cfg.validate()?;

    let n = tracks.len();
    let mut remaining: Vec<Track> = tracks.to_vec();

    // Anchor: lowest energy opens the set, ties broken by lowest id.
    let anchor_idx = lowest_energy_index(&remaining);
    let anchor = remaining.remove(anchor_idx);
    log::debug!(
        "anchor: \"{}\" ({}, energy {:.2})",
        anchor.title,
        anchor.id,
        anchor.energy
    );

    let mut ordered = Vec::with_capacity(n);
    let mut transitions = Vec::with_capacity(n.saturating_sub(1));
    ordered.push(anchor);

    while !remaining.is_empty() {
        // Position the next track will occupy. remaining is non-empty, so
        // n >= 2 and the divisor is positive.
        let position = ordered.len() as f64 / (n - 1) as f64;
        let current = &ordered[ordered.len() - 1];

        let (best_idx, best_scores) = pick_best(current, &remaining, position, cfg);
        let chosen = remaining.remove(best_idx);

        transitions.push(Transition {
            from_id: current.id.clone(),
            to_id: chosen.id.clone(),
            position,
            scores: best_scores,
        });
        ordered.push(chosen);
    }

    log::info!(
        "sequenced {} tracks, {} transitions",
        ordered.len(),
        transitions.len()
    );

    Ok(Sequence {
        tracks: ordered,
        transitions,
    })
}

/// Index of the lowest-energy track, ties by lowest id. Energies are finite
/// after validation, so the comparison is total.
fn lowest_energy_index(tracks: &[Track]) -> usize {
    let mut best = 0;
    for i in 1..tracks.len() {
        let ord = tracks[i]
            .energy
            .total_cmp(&tracks[best].energy)
            .then_with(|| tracks[i].id.cmp(&tracks[best].id));
        if ord.is_lt() {
            best = i;
        }
    }
    best
}

/// Score every candidate and return the maximizer. Ties go to the higher
/// popularity, then the lower id, so output is reproducible.
fn pick_best(
    current: &Track,
    remaining: &[Track],
    position: f64,
    cfg: &EngineConfig,
) -> (usize, ScoreBreakdown) {
    let mut best_idx = 0;
    let mut best = scoring::score_candidate(current, &remaining[0], position, cfg);

    for (idx, candidate) in remaining.iter().enumerate().skip(1) {
        let scores = scoring::score_candidate(current, candidate, position, cfg);
        let ord = scores
            .combined
            .total_cmp(&best.combined)
            .then_with(|| candidate.popularity.cmp(&remaining[best_idx].popularity))
            .then_with(|| remaining[best_idx].id.cmp(&candidate.id));
        if ord.is_gt() {
            best_idx = idx;
            best = scores;
        }
    }

    (best_idx, best)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Mode;

    fn make_track(id: &str, key: u8, mode: Mode, bpm: f64, energy: f64, pop: u8) -> Track {
        Track {
            id: id.to_string(),
            title: format!("Track {id}"),
            artist: "test".to_string(),
            key,
            mode,
            bpm,
            energy,
            danceability: 0.5,
            popularity: pop,
        }
    }

    fn demo_collection() -> Vec<Track> {
        vec![
            make_track("t1", 9, Mode::Minor, 122.0, 0.42, 55),
            make_track("t2", 9, Mode::Minor, 124.0, 0.55, 70),
            make_track("t3", 4, Mode::Minor, 126.0, 0.68, 85),
            make_track("t4", 4, Mode::Major, 128.0, 0.82, 95),
            make_track("t5", 11, Mode::Major, 127.0, 0.90, 88),
            make_track("t6", 6, Mode::Major, 120.0, 0.60, 60),
            make_track("t7", 1, Mode::Minor, 100.0, 0.35, 40),
        ]
    }

    #[test]
    fn test_empty_collection_fails() {
        let err = sequence(&[], &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::EmptyCollection));
    }

    #[test]
    fn test_duplicate_ids_fail_before_scoring() {
        let mut tracks = demo_collection();
        tracks[3].id = "t1".into();
        let err = sequence(&tracks, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::DuplicateTrackId(id) if id == "t1"));
    }

    #[test]
    fn test_invalid_track_fails() {
        let mut tracks = demo_collection();
        tracks[2].bpm = -10.0;
        let err = sequence(&tracks, &EngineConfig::default()).unwrap_err();
        assert!(matches!(err, EngineError::InvalidTrackData { .. }));
    }

    #[test]
    fn test_single_track_has_no_transitions() {
        let tracks = vec![make_track("solo", 0, Mode::Major, 120.0, 0.5, 50)];
        let seq = sequence(&tracks, &EngineConfig::default()).unwrap();
        assert_eq!(seq.tracks.len(), 1);
        assert!(seq.transitions.is_empty());
    }

    #[test]
    fn test_output_is_permutation() {
        let tracks = demo_collection();
        let seq = sequence(&tracks, &EngineConfig::default()).unwrap();

        assert_eq!(seq.tracks.len(), tracks.len());
        assert_eq!(seq.transitions.len(), tracks.len() - 1);

        let mut input_ids: Vec<&str> = tracks.iter().map(|t| t.id.as_str()).collect();
        let mut output_ids: Vec<&str> = seq.tracks.iter().map(|t| t.id.as_str()).collect();
        input_ids.sort();
        output_ids.sort();
        assert_eq!(input_ids, output_ids);
    }

    #[test]
    fn test_transitions_link_consecutive_tracks() {
        let seq = sequence(&demo_collection(), &EngineConfig::default()).unwrap();
        for (i, tr) in seq.transitions.iter().enumerate() {
            assert_eq!(tr.from_id, seq.tracks[i].id);
            assert_eq!(tr.to_id, seq.tracks[i + 1].id);
            let expected_pos = (i + 1) as f64 / (seq.tracks.len() - 1) as f64;
            assert!((tr.position - expected_pos).abs() < 1e-12);
        }
    }

    #[test]
    fn test_anchor_is_lowest_energy() {
        let seq = sequence(&demo_collection(), &EngineConfig::default()).unwrap();
        assert_eq!(seq.tracks[0].id, "t7"); // energy 0.35
    }

    #[test]
    fn test_anchor_tie_breaks_by_id() {
        let tracks = vec![
            make_track("b", 0, Mode::Major, 120.0, 0.3, 50),
            make_track("a", 2, Mode::Major, 121.0, 0.3, 50),
        ];
        let seq = sequence(&tracks, &EngineConfig::default()).unwrap();
        assert_eq!(seq.tracks[0].id, "a");
    }

    #[test]
    fn test_deterministic_across_runs() {
        let tracks = demo_collection();
        let cfg = EngineConfig::default();
        let a = sequence(&tracks, &cfg).unwrap();
        let b = sequence(&tracks, &cfg).unwrap();

        let ids_a: Vec<_> = a.tracks.iter().map(|t| &t.id).collect();
        let ids_b: Vec<_> = b.tracks.iter().map(|t| &t.id).collect();
        assert_eq!(ids_a, ids_b);
        for (x, y) in a.transitions.iter().zip(&b.transitions) {
            assert_eq!(x.scores, y.scores);
        }
        // Byte-identical serialized output.
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_tie_break_prefers_higher_popularity() {
        // Two identical candidates except popularity and id: the scorer
        // sees equal combined scores, so popularity must decide.
        let tracks = vec![
            make_track("start", 9, Mode::Minor, 120.0, 0.2, 10),
            make_track("low", 9, Mode::Minor, 120.0, 0.6, 30),
            make_track("high", 9, Mode::Minor, 120.0, 0.6, 90),
        ];
        let seq = sequence(&tracks, &EngineConfig::default()).unwrap();
        assert_eq!(seq.tracks[1].id, "high");
    }

    #[test]
    fn test_tie_break_falls_back_to_lower_id() {
        let tracks = vec![
            make_track("start", 9, Mode::Minor, 120.0, 0.2, 10),
            make_track("zz", 9, Mode::Minor, 120.0, 0.6, 50),
            make_track("aa", 9, Mode::Minor, 120.0, 0.6, 50),
        ];
        let seq = sequence(&tracks, &EngineConfig::default()).unwrap();
        assert_eq!(seq.tracks[1].id, "aa");
    }

    #[test]
    fn test_worst_candidates_still_placed() {
        // Mutually clashing keys and far-apart tempos: the greedy pass must
        // still place everything rather than reject.
        let tracks = vec![
            make_track("a", 0, Mode::Major, 80.0, 0.2, 10),
            make_track("b", 6, Mode::Minor, 135.0, 0.9, 20),
            make_track("c", 1, Mode::Major, 200.0, 0.1, 30),
        ];
        let seq = sequence(&tracks, &EngineConfig::default()).unwrap();
        assert_eq!(seq.tracks.len(), 3);
        assert_eq!(seq.transitions.len(), 2);
    }

    #[test]
    fn test_compatible_pair_scores_near_max() {
        // Spec scenario: 8A/120 into 8A/122 — same code, ~1.6% tempo gap.
        let tracks = vec![
            make_track("a", 9, Mode::Minor, 120.0, 0.5, 50),
            make_track("b", 9, Mode::Minor, 122.0, 0.6, 50),
        ];
        let seq = sequence(&tracks, &EngineConfig::default()).unwrap();
        let tr = &seq.transitions[0];
        assert_eq!(tr.scores.harmonic, 1.0);
        assert_eq!(tr.scores.tempo, 1.0);
        // Harmonic + tempo weights alone put this at 0.70 of a 1.0 maximum.
        assert!(tr.scores.combined > 0.8);
    }
}
