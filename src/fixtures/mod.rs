//! Scripted sensor fixtures for running the instrument without hardware.
//!
//! A fixture is a JSON script of scheduler rounds. Each round lists what every
//! sensing channel reads (`null` for an unavailable sensor), optional input
//! events delivered at the start of the round, and optionally the MIDI
//! messages the round must produce. Built-in fixtures live in the crate's
//! `fixtures/` directory and are embedded at compile time.

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

use crate::calibration::default_reference;
use crate::color::RawSample;
use crate::config::MAX_CHANNELS;
use crate::engine::midi::MidiMessage;
use crate::input::InputEvent;
use crate::scale::ScaleKind;

pub mod runner;
pub mod validation;

pub use runner::{run_fixture, FixtureRun, FixtureRunOptions, RoundRecord};
pub use validation::{verify, FixtureMismatch, FixtureValidation};

/// Built-in fixtures bundled with the crate sources.
const BUILTIN_FIXTURES: &[(&str, &str)] = &[
    (
        "basic_scale",
        include_str!("../../fixtures/basic_scale.json"),
    ),
    (
        "sensor_dropout",
        include_str!("../../fixtures/sensor_dropout.json"),
    ),
    (
        "menu_changes",
        include_str!("../../fixtures/menu_changes.json"),
    ),
];

/// What one channel reads during a round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FixtureReading {
    /// Name of a built-in reference color, read at full brightness
    Color(String),
    Raw(RawSample),
}

impl FixtureReading {
    pub fn to_raw(&self) -> Result<RawSample> {
        match self {
            FixtureReading::Raw(raw) => Ok(*raw),
            FixtureReading::Color(name) => {
                let reference = default_reference(name)
                    .with_context(|| format!("unknown reference color {:?}", name))?;
                Ok(RawSample::new(
                    reference.r as u16,
                    reference.g as u16,
                    reference.b as u16,
                    u16::MAX,
                ))
            }
        }
    }
}

/// One scheduler round of a fixture script
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureRound {
    /// One entry per sensing channel; `null` = sensor unavailable
    pub readings: Vec<Option<FixtureReading>>,
    #[serde(default)]
    pub input: Vec<InputEvent>,
    /// MIDI the round must produce, in order; unchecked when absent
    #[serde(default)]
    pub expected_midi: Option<Vec<MidiMessage>>,
}

/// Declarative description of a runnable fixture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FixtureSpec {
    pub id: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_channel_count")]
    pub channel_count: usize,
    #[serde(default)]
    pub scale: Option<ScaleKind>,
    #[serde(default)]
    pub root_note: Option<u8>,
    pub rounds: Vec<FixtureRound>,
}

fn default_channel_count() -> usize {
    MAX_CHANNELS
}

impl FixtureSpec {
    /// Parse a fixture from JSON and validate it.
    pub fn from_json(data: &str) -> Result<Self> {
        let spec: FixtureSpec =
            serde_json::from_str(data).context("failed to parse fixture JSON")?;
        spec.validate()?;
        Ok(spec)
    }

    /// Load a fixture from a file path or by built-in id.
    pub fn load(name_or_path: &str) -> Result<Self> {
        let path = Path::new(name_or_path);
        if path.is_file() {
            let contents = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read fixture {}", path.display()))?;
            return Self::from_json(&contents);
        }

        match BUILTIN_FIXTURES.iter().find(|(id, _)| *id == name_or_path) {
            Some((_, contents)) => Self::from_json(contents),
            None => bail!(
                "unknown fixture {:?} (built-in: {})",
                name_or_path,
                builtin_fixture_ids().join(", ")
            ),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.id.trim().is_empty() {
            bail!("fixture id cannot be empty");
        }
        if !(1..=MAX_CHANNELS).contains(&self.channel_count) {
            bail!(
                "fixture {} channel_count must be 1-{}, got {}",
                self.id,
                MAX_CHANNELS,
                self.channel_count
            );
        }
        if self.rounds.is_empty() {
            bail!("fixture {} must contain at least one round", self.id);
        }
        for (i, round) in self.rounds.iter().enumerate() {
            if round.readings.len() != self.channel_count {
                bail!(
                    "fixture {} round {} has {} readings for {} channels",
                    self.id,
                    i,
                    round.readings.len(),
                    self.channel_count
                );
            }
            for reading in round.readings.iter().flatten() {
                reading
                    .to_raw()
                    .with_context(|| format!("fixture {} round {}", self.id, i))?;
            }
        }
        Ok(())
    }
}

/// Ids of the fixtures embedded in the crate
pub fn builtin_fixture_ids() -> Vec<&'static str> {
    BUILTIN_FIXTURES.iter().map(|(id, _)| *id).collect()
}

/// Every built-in fixture, parsed
pub fn builtin_fixtures() -> Result<Vec<FixtureSpec>> {
    BUILTIN_FIXTURES
        .iter()
        .map(|(_, contents)| FixtureSpec::from_json(contents))
        .collect()
}
