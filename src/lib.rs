// Alchemist - Audio Sample Splitter
// Module declarations and command-line entry point

use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

pub mod audio;
pub mod commands;
pub mod events;
pub mod export;
pub mod pipeline;
pub mod state;

use commands::{CommandError, CommandResult, ListSamplesInput};
use audio::SpectrumStrategy;
use export::{ExportFormat, ExportSettings};
use pipeline::AnalysisParams;

#[derive(Parser, Debug)]
#[command(name = "alchemist")]
#[command(about = "Split recordings into classified samples and export them as WAV", long_about = None)]
struct Cli {
    /// Sample library file (default: app data directory)
    #[arg(short = 'l', long, global = true)]
    library: Option<PathBuf>,

    /// Verbose logging
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Detect, classify and store the samples in a WAV recording
    Analyze(AnalyzeArgs),

    /// Export stored samples of a recording
    Export(ExportArgs),

    /// List samples in the library
    List(ListArgs),

    /// Rename a sample
    Rename { id: String, name: String },

    /// Add a tag to a sample
    Tag { id: String, tag: String },

    /// Remove a tag from a sample
    Untag { id: String, tag: String },

    /// Toggle a sample's favorite flag
    Favorite { id: String },

    /// Split a sample at an offset in seconds from its start
    Split { id: String, offset: f64 },

    /// Merge two or more samples into one
    Merge {
        #[arg(required = true, num_args = 2..)]
        ids: Vec<String>,
    },

    /// Delete a sample from the library
    Remove { id: String },
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    /// WAV file to analyze
    input: PathBuf,

    /// Analysis parameters as JSON; flags below override it
    #[arg(long)]
    params: Option<PathBuf>,

    /// Detection sensitivity 0-100 (default: 50)
    #[arg(short = 's', long)]
    sensitivity: Option<f32>,

    /// Explicit detection threshold, overrides sensitivity
    #[arg(long)]
    threshold: Option<f32>,

    /// Minimum sample length in milliseconds (default: 100)
    #[arg(long)]
    min_length: Option<f32>,

    /// Envelope attack in milliseconds (default: 10)
    #[arg(long)]
    attack_ms: Option<f32>,

    /// Envelope release in milliseconds (default: 100)
    #[arg(long)]
    release_ms: Option<f32>,

    /// Classifier spectrum: magnitude_approx, or fft when built with it
    #[arg(long)]
    spectrum: Option<String>,

    /// Append a JSONL progress trace to this file
    #[arg(long)]
    trace: Option<PathBuf>,

    /// Print the full result as JSON
    #[arg(long)]
    json: bool,

    /// Don't store detected samples in the library
    #[arg(long)]
    no_save: bool,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Recording the samples were cut from
    input: PathBuf,

    /// Output directory
    #[arg(short = 'o', long)]
    output: PathBuf,

    /// Export only these sample ids (can be specified multiple times)
    #[arg(long = "id")]
    ids: Vec<String>,

    /// Output format (wav, mp3, ogg, flac)
    #[arg(long, default_value = "wav")]
    format: String,

    /// Sample rate written to the WAV header
    #[arg(long, default_value = "44100")]
    sample_rate: u32,

    /// Requested bit depth; output is 16-bit PCM
    #[arg(long, default_value = "16")]
    bit_depth: u16,

    /// Skip peak normalization
    #[arg(long)]
    no_normalize: bool,

    /// Filename pattern with {name}, {type}, {index}, {duration}
    #[arg(long, default_value = "{type}_{index}_{name}")]
    pattern: String,

    /// Write WAV when another format is requested
    #[arg(long)]
    wav_fallback: bool,

    /// Append a JSONL progress trace to this file
    #[arg(long)]
    trace: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Name contains this text
    #[arg(long)]
    search: Option<String>,

    /// Restrict to a sample type (can be specified multiple times)
    #[arg(long = "type")]
    types: Vec<String>,

    /// Require a tag (can be specified multiple times)
    #[arg(long = "tag")]
    tags: Vec<String>,

    /// Only favorites
    #[arg(long)]
    favorites: bool,
}

impl AnalyzeArgs {
    fn analysis_params(&self) -> CommandResult<AnalysisParams> {
        let mut params = match self.params {
            Some(ref path) => AnalysisParams::from_json_file(path)?,
            None => AnalysisParams::default(),
        };
        if let Some(sensitivity) = self.sensitivity {
            params.sensitivity = sensitivity;
        }
        if let Some(threshold) = self.threshold {
            params.threshold = Some(threshold);
        }
        if let Some(min_length) = self.min_length {
            params.min_length_ms = min_length;
        }
        if let Some(attack_ms) = self.attack_ms {
            params.attack_ms = attack_ms;
        }
        if let Some(release_ms) = self.release_ms {
            params.release_ms = release_ms;
        }
        if let Some(ref spectrum) = self.spectrum {
            params.spectrum = parse_spectrum(spectrum)?;
        }
        params.validate()?;
        Ok(params)
    }
}

fn parse_spectrum(name: &str) -> CommandResult<SpectrumStrategy> {
    serde_json::from_value(serde_json::Value::String(name.trim().to_lowercase().replace('-', "_")))
        .map_err(|_| CommandError::from(format!("Unknown or unavailable spectrum: {}", name)))
}

impl ExportArgs {
    fn export_settings(&self) -> CommandResult<ExportSettings> {
        let format: ExportFormat = serde_json::from_value(serde_json::Value::String(
            self.format.to_lowercase(),
        ))
        .map_err(|_| CommandError::from(format!("Unknown export format: {}", self.format)))?;

        Ok(ExportSettings {
            format,
            sample_rate: self.sample_rate,
            bit_depth: self.bit_depth,
            normalize: !self.no_normalize,
            naming_pattern: self.pattern.clone(),
            wav_fallback: self.wav_fallback,
        })
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> CommandResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Parse arguments, install logging and run the requested command
pub fn run() -> CommandResult<()> {
    let cli = Cli::parse();

    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    let library_path = match cli.library {
        Some(path) => path,
        None => state::default_library_path()?,
    };

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;

    runtime.block_on(dispatch(cli.command, &library_path))
}

async fn dispatch(command: Command, library_path: &Path) -> CommandResult<()> {
    match command {
        Command::Analyze(args) => {
            let params = args.analysis_params()?;
            let result = commands::analyze_file(commands::AnalyzeInput {
                audio_path: args.input.clone(),
                params,
                trace_path: args.trace.clone(),
                library_path: (!args.no_save).then(|| library_path.to_path_buf()),
            })
            .await?;

            if args.json {
                print_json(&result)?;
            } else {
                for sample in &result.samples {
                    println!(
                        "{}  {:>7.3}s  {:>6.3}s  {:<6}  {}",
                        sample.id,
                        sample.start,
                        sample.duration,
                        sample.sample_type.as_str(),
                        sample.name
                    );
                }
            }
            log::info!("Found {} samples", result.samples.len());
        }
        Command::Export(args) => {
            let settings = args.export_settings()?;
            let report = commands::export_samples(commands::ExportInput {
                audio_path: args.input,
                library_path: library_path.to_path_buf(),
                out_dir: args.output,
                ids: args.ids,
                settings,
                trace_path: args.trace,
            })
            .await?;

            for file in &report.exported {
                println!("{}", file.path.display());
            }
            for failure in &report.failed {
                log::error!("{}: {}", failure.name, failure.error);
            }
            if !report.is_complete() {
                return Err(CommandError::from(format!(
                    "{} of {} samples failed to export",
                    report.failed.len(),
                    report.failed.len() + report.exported.len()
                )));
            }
        }
        Command::List(args) => {
            let samples = commands::list_samples(
                library_path,
                ListSamplesInput {
                    text: args.search,
                    types: args.types,
                    tags: args.tags,
                    favorites_only: args.favorites,
                },
            )?;
            print_json(&samples)?;
        }
        Command::Rename { id, name } => {
            print_json(&commands::rename_sample(library_path, &id, &name)?)?;
        }
        Command::Tag { id, tag } => {
            print_json(&commands::tag_sample(library_path, &id, &tag, false)?)?;
        }
        Command::Untag { id, tag } => {
            print_json(&commands::tag_sample(library_path, &id, &tag, true)?)?;
        }
        Command::Favorite { id } => {
            print_json(&commands::favorite_sample(library_path, &id, None)?)?;
        }
        Command::Split { id, offset } => {
            print_json(&commands::split_sample(library_path, &id, offset)?)?;
        }
        Command::Merge { ids } => {
            print_json(&commands::merge_samples(library_path, &ids)?)?;
        }
        Command::Remove { id } => {
            print_json(&commands::remove_sample(library_path, &id)?)?;
        }
    }
    Ok(())
}
