use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use color_midi::calibration::CalibrationProfile;
use color_midi::color::{ColorPalette, RawSample, SampleNormalizer};
use color_midi::config::AppConfig;
use color_midi::engine::ColorPipeline;
use color_midi::fixtures::{self, run_fixture, verify, FixtureRunOptions, FixtureSpec};
use color_midi::scale::{transpose, NoteMapping, ScaleKind};
use serde::Serialize;

#[derive(Parser, Debug)]
#[command(
    name = "color_midi_cli",
    about = "Simulation and inspection harness for the color-to-MIDI instrument core"
)]
struct Cli {
    /// JSON configuration file (defaults are used when absent or invalid)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a fixture script through the control loop and check its MIDI
    Simulate {
        /// Built-in fixture id or path to a fixture JSON file
        #[arg(long)]
        fixture: String,
        /// Maximum +/- counts of random noise added to every reading
        #[arg(long, default_value_t = 0)]
        jitter: u16,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Classify one raw reading against the default profile
    Classify {
        #[arg(long)]
        red: u16,
        #[arg(long)]
        green: u16,
        #[arg(long)]
        blue: u16,
        #[arg(long, default_value_t = u16::MAX)]
        clear: u16,
        /// Sensing channel whose default octave is applied
        #[arg(long, default_value_t = 0)]
        channel: usize,
    },
    /// Print the default configuration and calibration profile
    DumpDefaults,
    /// List the built-in fixtures
    ListFixtures,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

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
    let config = cli
        .config
        .as_ref()
        .map(AppConfig::load_from_file)
        .unwrap_or_default();

    match cli.command {
        Commands::Simulate {
            fixture,
            jitter,
            seed,
            output,
        } => run_simulate(&config, &fixture, FixtureRunOptions { jitter, seed }, output),
        Commands::Classify {
            red,
            green,
            blue,
            clear,
            channel,
        } => run_classify(&config, RawSample::new(red, green, blue, clear), channel),
        Commands::DumpDefaults => run_dump_defaults(&config),
        Commands::ListFixtures => run_list_fixtures(),
    }
}

fn run_simulate(
    config: &AppConfig,
    fixture: &str,
    options: FixtureRunOptions,
    output_path: Option<PathBuf>,
) -> Result<ExitCode> {
    let spec = FixtureSpec::load(fixture)?;
    let run = run_fixture(&spec, config, options)
        .with_context(|| format!("running fixture {}", fixture))?;
    let validation = verify(&spec, &run);

    let report = SimulationReport {
        fixture: &spec.id,
        run: &run,
        validation: &validation,
    };
    let json = serde_json::to_string_pretty(&report)?;
    if let Some(path) = output_path {
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
    } else {
        println!("{json}");
    }

    if validation.has_mismatches() {
        Ok(ExitCode::from(2))
    } else {
        Ok(ExitCode::from(0))
    }
}

fn run_classify(config: &AppConfig, raw: RawSample, channel: usize) -> Result<ExitCode> {
    let palette = ColorPalette::standard();
    let pipeline = ColorPipeline::with_kind(
        palette,
        SampleNormalizer::new(config.calibration.clear_full_scale),
        config.instrument.scale,
        config.instrument.root_note,
    );
    let mut profile = CalibrationProfile::default_for(pipeline.palette());
    profile.normalize = config.calibration.normalize;

    let octave = config
        .instrument
        .channels
        .get(channel)
        .map(|settings| settings.octave)
        .with_context(|| format!("no settings for channel {}", channel))?;

    let calibrated = pipeline.normalize(&raw, &profile);
    let slot = pipeline.classify(&raw, &profile);
    let note = slot.map(|slot| match pipeline.mapper().map_slot(slot) {
        NoteMapping::Note(note) => NoteMapping::Note(transpose(note, octave)),
        NoteMapping::Silence => NoteMapping::Silence,
    });

    let report = ClassifyReport {
        raw,
        calibrated: [calibrated.r, calibrated.g, calibrated.b],
        slot,
        color: slot.map(|slot| pipeline.color_name(slot)),
        note,
        scale: config.instrument.scale,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_dump_defaults(config: &AppConfig) -> Result<ExitCode> {
    let palette = ColorPalette::standard();
    let report = DefaultsReport {
        config,
        palette: palette.names(),
        profile: CalibrationProfile::default_for(&palette),
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(ExitCode::from(0))
}

fn run_list_fixtures() -> Result<ExitCode> {
    for spec in fixtures::builtin_fixtures()? {
        match &spec.description {
            Some(description) => println!("{} - {}", spec.id, description),
            None => println!("{}", spec.id),
        }
    }
    Ok(ExitCode::from(0))
}

#[derive(Serialize)]
struct SimulationReport<'a> {
    fixture: &'a str,
    run: &'a fixtures::FixtureRun,
    validation: &'a fixtures::FixtureValidation,
}

#[derive(Serialize)]
struct ClassifyReport<'a> {
    raw: RawSample,
    calibrated: [f32; 3],
    slot: Option<usize>,
    color: Option<&'a str>,
    note: Option<NoteMapping>,
    scale: ScaleKind,
}

#[derive(Serialize)]
struct DefaultsReport<'a> {
    config: &'a AppConfig,
    palette: &'a [String],
    profile: CalibrationProfile,
}
