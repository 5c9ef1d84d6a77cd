use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use mixplan::config::AppConfig;
use mixplan::justify::SetReport;
use mixplan::model::Track;
use mixplan::sequencer::Sequence;

#[derive(Parser)]
#[command(name = "mixplan", version, about = "DJ set sequencer — harmonic, tempo, and energy-aware track ordering")]
struct Cli {
    /// Path to a TOML config file (defaults to the XDG config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build an ordered set from a track collection and explain every transition
    Sequence {
        /// JSON file holding the track collection (array of track objects)
        input: PathBuf,

        /// Print the full report as JSON instead of tables
        #[arg(long)]
        json: bool,

        /// Write the JSON report to a file (in addition to console output)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Print the full justification for every transition
        #[arg(long)]
        explain: bool,
    },

    /// Score one candidate transition between two tracks
    Score {
        /// JSON file holding the track collection
        input: PathBuf,

        /// Id of the playing track
        from_id: String,

        /// Id of the candidate next track
        to_id: String,

        /// Normalized set position of the candidate, 0.0-1.0
        #[arg(short, long, default_value = "0.5")]
        position: f64,
    },

    /// Show each track's Camelot code and its compatible neighbor codes
    Keys {
        /// JSON file holding the track collection
        input: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Set up logging based on verbosity
    let log_level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load config file (optional, defaults if missing)
    let config = AppConfig::load(cli.config.as_ref());
    let engine = config.engine;
    engine
        .validate()
        .context("Config file contains invalid engine settings")?;

    match cli.command {
        Commands::Sequence {
            input,
            json,
            output,
            explain,
        } => {
            let tracks = mixplan::loader::load_tracks(&input)
                .with_context(|| format!("Failed to load tracks from {}", input.display()))?;
            let seq = mixplan::sequencer::sequence(&tracks, &engine)
                .context("Sequencing failed")?;
            let report = mixplan::justify::justify(&seq, &engine);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_set(&seq, &report, explain);
            }

            if let Some(path) = output {
                let contents = serde_json::to_string_pretty(&report)?;
                std::fs::write(&path, contents)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                println!();
                println!("Report written to {}", path.display());
            }
        }

        Commands::Score {
            input,
            from_id,
            to_id,
            position,
        } => {
            let tracks = mixplan::loader::load_tracks(&input)
                .with_context(|| format!("Failed to load tracks from {}", input.display()))?;
            mixplan::sequencer::validate(&tracks).context("Invalid track collection")?;
            let from = find_track(&tracks, &from_id)?;
            let to = find_track(&tracks, &to_id)?;
            anyhow::ensure!(
                (0.0..=1.0).contains(&position),
                "position {position} outside 0.0-1.0"
            );

            let s = mixplan::scoring::score_candidate(from, to, position, &engine);
            println!(
                "Transition: {} — {}  \u{2192}  {} — {}",
                from.artist, from.title, to.artist, to.title
            );
            println!();
            println!(
                "  Harmonic:    {:.2}  ({} \u{2192} {})",
                s.harmonic,
                from.camelot(),
                to.camelot()
            );
            println!(
                "  Tempo:       {:.2}  ({:.1} \u{2192} {:.1} BPM)",
                s.tempo, from.bpm, to.bpm
            );
            println!(
                "  Energy fit:  {:.2}  (energy {:.2}, arc target {:.2} at p={:.2})",
                s.energy_fit,
                to.energy,
                engine.arc.target(position),
                position
            );
            println!(
                "  Popularity:  {:.2}  ({}/100, peak window {:.2}±{:.2})",
                s.popularity_bonus, to.popularity, engine.arc.peak_position, engine.peak_window
            );
            println!();
            println!("  Combined:    {:.2}", s.combined);
        }

        Commands::Keys { input } => {
            let tracks = mixplan::loader::load_tracks(&input)
                .with_context(|| format!("Failed to load tracks from {}", input.display()))?;
            mixplan::sequencer::validate(&tracks).context("Invalid track collection")?;
            println!(
                "{:<20} {:<20} {:>4}  {:<10} {}",
                "Track", "Artist", "Key", "Relative", "Adjacent"
            );
            println!("{}", "-".repeat(70));
            for t in &tracks {
                let (code, relative, adjacent) = t.camelot().compatible_codes();
                println!(
                    "{:<20} {:<20} {:>4}  {:<10} {}, {}",
                    truncate(&t.title, 19),
                    truncate(&t.artist, 19),
                    code.to_string(),
                    relative.to_string(),
                    adjacent[0],
                    adjacent[1]
                );
            }
        }
    }

    Ok(())
}

fn find_track<'a>(tracks: &'a [Track], id: &str) -> Result<&'a Track> {
    tracks
        .iter()
        .find(|t| t.id == id)
        .with_context(|| format!("No track with id \"{id}\" in the collection"))
}

/// Print the ordered set, transition one-liners, and the summary block.
fn print_set(seq: &Sequence, report: &SetReport, explain: bool) {
    println!(
        "{:<3} {:<26} {:<18} {:>6} {:>4} {:>6} {:>4}",
        "#", "Track", "Artist", "BPM", "Key", "Energy", "Pop"
    );
    println!("{}", "-".repeat(74));
    for (i, t) in seq.tracks.iter().enumerate() {
        println!(
            "{:<3} {:<26} {:<18} {:>6.1} {:>4} {:>6.2} {:>4}",
            i + 1,
            truncate(&t.title, 25),
            truncate(&t.artist, 17),
            t.bpm,
            t.camelot().to_string(),
            t.energy,
            t.popularity
        );
    }

    if !report.transitions.is_empty() {
        println!();
        println!("Transitions:");
        for (i, tr) in report.transitions.iter().enumerate() {
            println!(
                "  {:>2}\u{2192}{:<2} harmonic {:.2}  tempo {:.2}  energy {:.2}  pop {:.2}  | combined {:.2}",
                i + 1,
                i + 2,
                tr.scores.harmonic,
                tr.scores.tempo,
                tr.scores.energy_fit,
                tr.scores.popularity_bonus,
                tr.scores.combined
            );
            if explain {
                println!("       {}", tr.justification);
            }
        }
    }

    let s = &report.summary;
    println!();
    println!("Set summary:");
    println!("  Tracks:             {}", s.track_count);
    println!("  Mean harmonic:      {:.2}", s.mean_harmonic);
    println!("  Mean tempo:         {:.2}", s.mean_tempo);
    println!("  Mean energy fit:    {:.2}", s.mean_energy_fit);
    println!("  Mean combined:      {:.2}", s.mean_combined);
    println!("  Weak transitions:   {}", s.weak_transitions);
    println!(
        "  Peak track:         {} (popularity {}/100, bonus {:.2})",
        s.peak_track_id, s.peak_track_popularity, s.peak_popularity_bonus
    );
    println!("  BPM range:          {:.0} - {:.0} (mean {:.1})", s.bpm_min, s.bpm_max, s.mean_bpm);
    println!("  Mean energy:        {:.2}", s.mean_energy);
    println!("  Energy arc:         {}", s.arc_shape);
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}\u{2026}")
    } else {
        s.to_string()
    }
}
