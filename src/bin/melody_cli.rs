use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use melody_tracker::analysis::{
    cents_offset, hz_to_midi, midi_to_hz, midi_to_note_name, midi_to_solfege, Note,
    OfflineSegmenter,
};
use melody_tracker::config::AppConfig;
use melody_tracker::engine::{
    PitchHistory, PitchPoint, PitchTracker, PlaybackFrameSource, SystemTimeSource,
};
use melody_tracker::error::{log_input_error, InputError};
use melody_tracker::fixtures::{
    read_wav, render, write_wav, ExpectationDiff, NoteExpectations, SignalPart,
    DEFAULT_NOISE_SEED,
};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "melody_cli",
    about = "Pitch tracking and note segmentation harness for melody_tracker"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    Json,
    Table,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Segment a WAV file into notes and optionally compare against expectations
    Segment {
        #[arg(long)]
        input: PathBuf,
        /// JSON configuration (defaults apply when omitted)
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        expect: Option<PathBuf>,
        #[arg(long)]
        output: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Replay a WAV file through the streaming tracker, one JSON point per line
    Track {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        config: Option<PathBuf>,
        #[arg(long)]
        max_points: Option<usize>,
        #[arg(long, default_value_t = 0.0)]
        start_offset: f64,
    },
    /// Render a synthetic WAV fixture from tone/rest/noise parts
    Synth {
        #[arg(long)]
        output: PathBuf,
        /// e.g. tone:220:1.0, rest:0.2, noise:0.5
        #[arg(long = "part", required = true)]
        parts: Vec<SignalPart>,
        #[arg(long, default_value_t = 44_100)]
        sample_rate: u32,
        #[arg(long, default_value_t = DEFAULT_NOISE_SEED)]
        seed: u64,
    },
    /// Convert between frequency, MIDI number and note names
    #[command(group(ArgGroup::new("value").required(true).args(["hz", "midi"])))]
    Convert {
        #[arg(long)]
        hz: Option<f32>,
        #[arg(long)]
        midi: Option<f32>,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {err:?}");
            ExitCode::from(1)
        }
    }
}

fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Segment {
            input,
            config,
            expect,
            output,
            format,
        } => run_segment(&input, config.as_deref(), expect, output, format),
        Commands::Track {
            input,
            config,
            max_points,
            start_offset,
        } => run_track(&input, config.as_deref(), max_points, start_offset),
        Commands::Synth {
            output,
            parts,
            sample_rate,
            seed,
        } => run_synth(&output, &parts, sample_rate, seed),
        Commands::Convert { hz, midi } => run_convert(hz, midi),
    }
}

fn load_config(path: Option<&Path>) -> Result<AppConfig> {
    let config = match path {
        Some(path) => AppConfig::load_from_file(path),
        None => AppConfig::default(),
    };
    config.validate().context("validating configuration")?;
    Ok(config)
}

fn log_failure<T>(result: Result<T, InputError>, context: &str) -> Result<T, InputError> {
    result.map_err(|err| {
        log_input_error(&err, context);
        err
    })
}

fn load_input(path: &Path) -> Result<(Vec<f32>, u32)> {
    log_failure(read_wav(path), "read_wav")
        .with_context(|| format!("loading {}", path.display()))
}

fn run_segment(
    input: &Path,
    config_path: Option<&Path>,
    expect: Option<PathBuf>,
    output_path: Option<PathBuf>,
    format: OutputFormat,
) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let (samples, sample_rate) = load_input(input)?;

    let segmenter = OfflineSegmenter::new(config.segmenter, config.yin)?;
    let notes = segmenter
        .segment(&samples, sample_rate)
        .with_context(|| format!("segmenting {}", input.display()))?;

    let rendered = match format {
        OutputFormat::Json => {
            let report = SegmentReport {
                input: &input.display().to_string(),
                sample_rate,
                note_count: notes.len(),
                notes: &notes,
            };
            serde_json::to_string_pretty(&report)?
        }
        OutputFormat::Table => note_table(&notes),
    };

    if let Some(path) = output_path {
        fs::write(&path, rendered).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{rendered}");
    }

    match expect {
        Some(path) => {
            let expectations = log_failure(NoteExpectations::load(&path), "load_expectations")?;
            match expectations.verify(&notes) {
                Ok(()) => Ok(ExitCode::from(0)),
                Err(diff) => {
                    emit_diff(&diff)?;
                    Ok(ExitCode::from(2))
                }
            }
        }
        None => Ok(ExitCode::from(0)),
    }
}

fn note_table(notes: &[Note]) -> String {
    let mut lines = vec![format!(
        "{:>3}  {:>8}  {:>8}  {:>4}  {:<4}  {:<4}",
        "#", "start", "duration", "midi", "name", "solfege"
    )];
    for (idx, note) in notes.iter().enumerate() {
        let midi = note.midi as f32;
        lines.push(format!(
            "{:>3}  {:>8.3}  {:>8.3}  {:>4}  {:<4}  {:<4}",
            idx,
            note.start,
            note.duration,
            note.midi,
            midi_to_note_name(midi),
            midi_to_solfege(midi)
        ));
    }
    lines.join("\n")
}

fn run_track(
    input: &Path,
    config_path: Option<&Path>,
    max_points: Option<usize>,
    start_offset: f64,
) -> Result<ExitCode> {
    let config = load_config(config_path)?;
    let (samples, sample_rate) = load_input(input)?;

    let source =
        PlaybackFrameSource::realtime(samples, sample_rate, config.tracker.tick_interval_ms);
    let tracker = PitchTracker::new(
        config.yin,
        config.tracker.clone(),
        source,
        Arc::new(SystemTimeSource::new()),
    )?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("building tokio runtime")?;

    let mut history = PitchHistory::new(config.tracker.history_secs);
    let emitted = runtime.block_on(async {
        let mut stream = tracker.start(start_offset)?;
        let mut emitted = 0usize;
        while let Some(point) = stream.recv().await {
            println!("{}", serde_json::to_string(&TrackLine::from(point))?);
            history.push(point);
            emitted += 1;
            if max_points.is_some_and(|max| emitted >= max) {
                tracker.stop();
                break;
            }
        }
        anyhow::Ok(emitted)
    })?;

    tracing::info!(
        emitted,
        retained = history.len(),
        voiced = history.iter().filter(|p| p.frequency_hz.is_some()).count(),
        dropped = tracker.dropped_points(),
        "tracking finished"
    );
    Ok(ExitCode::from(0))
}

fn run_synth(output: &Path, parts: &[SignalPart], sample_rate: u32, seed: u64) -> Result<ExitCode> {
    let samples = render(parts, sample_rate, seed);
    log_failure(write_wav(output, &samples, sample_rate), "write_wav")
        .with_context(|| format!("writing {}", output.display()))?;
    tracing::info!(
        samples = samples.len(),
        sample_rate,
        path = %output.display(),
        "wrote synthetic fixture"
    );
    Ok(ExitCode::from(0))
}

fn run_convert(hz: Option<f32>, midi: Option<f32>) -> Result<ExitCode> {
    let midi = match (hz, midi) {
        (Some(hz), _) => {
            hz_to_midi(hz).with_context(|| format!("{hz} Hz has no pitch (must be > 0)"))?
        }
        (None, Some(midi)) => midi,
        (None, None) => anyhow::bail!("one of --hz or --midi is required"),
    };

    let frequency_hz = hz.unwrap_or_else(|| midi_to_hz(midi));
    let report = ConvertReport {
        frequency_hz,
        midi,
        nearest_midi: midi.round() as i32,
        name: midi_to_note_name(midi),
        solfege: midi_to_solfege(midi),
        cents: cents_offset(frequency_hz),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn emit_diff(diff: &ExpectationDiff) -> Result<()> {
    let json = serde_json::to_string_pretty(&diff.to_json())?;
    eprintln!("{json}");
    Ok(())
}

#[derive(Serialize)]
struct SegmentReport<'a> {
    input: &'a str,
    sample_rate: u32,
    note_count: usize,
    notes: &'a [Note],
}

#[derive(Serialize)]
struct TrackLine {
    #[serde(flatten)]
    point: PitchPoint,
    note: Option<String>,
}

impl From<PitchPoint> for TrackLine {
    fn from(point: PitchPoint) -> Self {
        let note = point
            .frequency_hz
            .and_then(hz_to_midi)
            .map(midi_to_note_name);
        Self { point, note }
    }
}

#[derive(Serialize)]
struct ConvertReport {
    frequency_hz: f32,
    midi: f32,
    nearest_midi: i32,
    name: String,
    solfege: &'static str,
    cents: Option<f32>,
}
