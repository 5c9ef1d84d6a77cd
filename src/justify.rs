//! Turns a built sequence into the final report: per-transition
//! natural-language justifications plus set-level summary metrics. Pure
//! read of the sequence — every number in the text comes from the scores
//! the sequencer stored, never a fresh computation.

use std::fmt;

use serde::Serialize;

use crate::camelot::Harmony;
use crate::config::EngineConfig;
use crate::model::Track;
use crate::scoring::{self, ScoreBreakdown, TEMPO_MIXABLE};
use crate::sequencer::Sequence;

/// A transition annotated with its justification text.
#[derive(Debug, Clone, Serialize)]
pub struct JustifiedTransition {
    pub from_id: String,
    pub to_id: String,
    pub position: f64,
    #[serde(flatten)]
    pub scores: ScoreBreakdown,
    pub justification: String,
}

/// Overall shape of the realized energy curve, judged by thirds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArcShape {
    /// Middle third is the hottest — the classic DJ arc.
    Peaked,
    /// Energy keeps climbing to the end.
    Building,
    /// Energy winds down from the open.
    Descending,
    Flat,
}

impl fmt::Display for ArcShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ArcShape::Peaked => "peaked (rises then cools down)",
            ArcShape::Building => "building (climbs to the close)",
            ArcShape::Descending => "descending (winds down)",
            ArcShape::Flat => "flat",
        };
        f.write_str(s)
    }
}

/// Aggregate metrics over the whole set.
#[derive(Debug, Clone, Serialize)]
pub struct SetSummary {
    pub track_count: usize,
    pub mean_harmonic: f64,
    pub mean_tempo: f64,
    pub mean_energy_fit: f64,
    pub mean_combined: f64,
    /// Transitions with a combined score below the configured threshold.
    pub weak_transitions: usize,
    /// Track sitting nearest the configured arc peak.
    pub peak_track_id: String,
    pub peak_track_popularity: u8,
    /// The popularity bonus term recorded for the peak track's placement.
    pub peak_popularity_bonus: f64,
    pub bpm_min: f64,
    pub bpm_max: f64,
    pub mean_bpm: f64,
    pub mean_energy: f64,
    pub arc_shape: ArcShape,
}

/// The engine's final output record: ordered ids, annotated transitions,
/// summary block.
#[derive(Debug, Clone, Serialize)]
pub struct SetReport {
    pub order: Vec<String>,
    pub transitions: Vec<JustifiedTransition>,
    pub summary: SetSummary,
}

/// Annotate a completed sequence. Pure function; the sequence is not
/// modified and may be reused or discarded by the caller.
pub fn justify(seq: &Sequence, cfg: &EngineConfig) -> SetReport {
    let transitions: Vec<JustifiedTransition> = seq
        .transitions
        .iter()
        .enumerate()
        .map(|(i, tr)| JustifiedTransition {
            from_id: tr.from_id.clone(),
            to_id: tr.to_id.clone(),
            position: tr.position,
            scores: tr.scores,
            justification: transition_text(&seq.tracks[i], &seq.tracks[i + 1], tr.position, &tr.scores, cfg),
        })
        .collect();

    let summary = summarize(seq, cfg);
    log::info!(
        "justified {} transitions, {} flagged weak",
        transitions.len(),
        summary.weak_transitions
    );

    SetReport {
        order: seq.tracks.iter().map(|t| t.id.clone()).collect(),
        transitions,
        summary,
    }
}

/// One-sentence rationale naming the components that drove the choice.
fn transition_text(
    from: &Track,
    to: &Track,
    position: f64,
    scores: &ScoreBreakdown,
    cfg: &EngineConfig,
) -> String {
    let mut parts = vec![
        harmonic_phrase(from, to, scores),
        tempo_phrase(from, to, scores),
        energy_phrase(to, position, scores, cfg),
    ];
    if scores.popularity_bonus > 0.0 {
        parts.push(format!(
            "peak-window slot for a crowd favorite (popularity {}/100)",
            to.popularity
        ));
    }

    let body = parts.join("; ");
    if scores.combined < cfg.weak_threshold {
        format!(
            "Weak transition ({:.2} combined): {}.",
            scores.combined, body
        )
    } else {
        format!("{}. Combined score {:.2}.", capitalize(&body), scores.combined)
    }
}

fn harmonic_phrase(from: &Track, to: &Track, scores: &ScoreBreakdown) -> String {
    let a = from.camelot();
    let b = to.camelot();
    let detail = match a.harmony(&b) {
        Harmony::Perfect => "matching key keeps the blend seamless",
        Harmony::Relative => "relative major/minor swap shifts the mood",
        Harmony::Adjacent => "one step on the wheel, a smooth mix",
        Harmony::Creative => "two steps on the wheel, a creative stretch",
        Harmony::Clash => "keys clash, mix short or over percussion",
    };
    format!(
        "{} ({} \u{2192} {}, harmonic {:.2})",
        detail, a, b, scores.harmonic
    )
}

fn tempo_phrase(from: &Track, to: &Track, scores: &ScoreBreakdown) -> String {
    let detail = if scores.tempo >= 1.0 {
        if scores.tempo_delta > TEMPO_MIXABLE {
            "tempos pair at half/double time"
        } else {
            "tempo within mixing tolerance"
        }
    } else if scores.tempo > 0.0 {
        "tempo gap is bridgeable with pitch adjustment"
    } else {
        "hard tempo jump"
    };
    format!(
        "{} ({:.1} \u{2192} {:.1} BPM, tempo {:.2})",
        detail, from.bpm, to.bpm, scores.tempo
    )
}

fn energy_phrase(
    to: &Track,
    position: f64,
    scores: &ScoreBreakdown,
    cfg: &EngineConfig,
) -> String {
    let phase = if position <= cfg.arc.peak_position {
        "ramping toward the peak"
    } else {
        "easing off the peak"
    };
    let quality = if scores.energy_fit >= 0.9 {
        "rides the arc"
    } else if scores.energy_fit >= 0.7 {
        "close to the arc"
    } else {
        "drifts off the arc"
    };
    format!(
        "energy {:.2} {} while {} (fit {:.2})",
        to.energy, quality, phase, scores.energy_fit
    )
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) => c.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

fn summarize(seq: &Sequence, cfg: &EngineConfig) -> SetSummary {
    let n = seq.tracks.len();
    let tn = seq.transitions.len();

    let mean = |f: fn(&ScoreBreakdown) -> f64| {
        if tn == 0 {
            0.0
        } else {
            seq.transitions.iter().map(|t| f(&t.scores)).sum::<f64>() / tn as f64
        }
    };

    let weak = seq
        .transitions
        .iter()
        .filter(|t| t.scores.combined < cfg.weak_threshold)
        .count();

    // Track whose normalized position lands nearest the configured peak;
    // earlier track wins a tie.
    let peak_idx = if n == 1 {
        0
    } else {
        let mut best = 0;
        let mut best_gap = f64::INFINITY;
        for i in 0..n {
            let gap = (i as f64 / (n - 1) as f64 - cfg.arc.peak_position).abs();
            if gap < best_gap {
                best = i;
                best_gap = gap;
            }
        }
        best
    };
    let peak_track = &seq.tracks[peak_idx];
    // Anchor has no incoming transition; its bonus is what the scorer
    // would have recorded at position 0.
    let peak_bonus = if peak_idx == 0 {
        scoring::popularity_bonus(peak_track.popularity, 0.0, cfg)
    } else {
        seq.transitions[peak_idx - 1].scores.popularity_bonus
    };

    let bpm_min = seq.tracks.iter().map(|t| t.bpm).fold(f64::INFINITY, f64::min);
    let bpm_max = seq
        .tracks
        .iter()
        .map(|t| t.bpm)
        .fold(f64::NEG_INFINITY, f64::max);
    let mean_bpm = seq.tracks.iter().map(|t| t.bpm).sum::<f64>() / n as f64;
    let mean_energy = seq.tracks.iter().map(|t| t.energy).sum::<f64>() / n as f64;

    SetSummary {
        track_count: n,
        mean_harmonic: mean(|s| s.harmonic),
        mean_tempo: mean(|s| s.tempo),
        mean_energy_fit: mean(|s| s.energy_fit),
        mean_combined: mean(|s| s.combined),
        weak_transitions: weak,
        peak_track_id: peak_track.id.clone(),
        peak_track_popularity: peak_track.popularity,
        peak_popularity_bonus: peak_bonus,
        bpm_min,
        bpm_max,
        mean_bpm,
        mean_energy,
        arc_shape: arc_shape(&seq.tracks),
    }
}

/// Classify the realized energy curve by comparing thirds of the set.
/// Fewer than three tracks can't express a shape and report as flat.
fn arc_shape(tracks: &[Track]) -> ArcShape {
    let n = tracks.len();
    if n < 3 {
        return ArcShape::Flat;
    }
    let third = (n / 3).max(1);
    let avg = |slice: &[Track]| -> f64 {
        if slice.is_empty() {
            0.0
        } else {
            slice.iter().map(|t| t.energy).sum::<f64>() / slice.len() as f64
        }
    };
    let first = avg(&tracks[..third.min(n)]);
    let middle = avg(&tracks[third.min(n)..(2 * third).min(n)]);
    let last = avg(&tracks[(2 * third).min(n)..]);

    const EPS: f64 = 1e-9;
    if middle > first + EPS && middle > last + EPS {
        ArcShape::Peaked
    } else if last > first + EPS {
        ArcShape::Building
    } else if first > last + EPS {
        ArcShape::Descending
    } else {
        ArcShape::Flat
    }
}
