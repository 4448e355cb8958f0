//! Fixture execution: drives an `InstrumentHandle` with simulated peripherals
//! and a stub clock, one scripted round at a time.

use std::sync::Arc;

use anyhow::{anyhow, bail, Result};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::color::{ColorPalette, RawSample};
use crate::config::AppConfig;
use crate::engine::backend::{Peripherals, StubTimeSource, TimeSource};
use crate::engine::midi::MidiMessage;
use crate::engine::InstrumentHandle;
use crate::fixtures::FixtureSpec;
use crate::storage::MemoryStorage;
use crate::telemetry::TelemetrySnapshot;

/// Knobs for a fixture run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureRunOptions {
    /// Maximum +/- counts added to each color channel of every reading
    pub jitter: u16,
    pub seed: u64,
}

/// MIDI produced during one fixture round
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: usize,
    pub started_ms: u64,
    pub midi: Vec<MidiMessage>,
}

/// Everything observed while running a fixture
#[derive(Debug, Clone, Serialize)]
pub struct FixtureRun {
    pub id: String,
    pub options: FixtureRunOptions,
    pub rounds: Vec<RoundRecord>,
    pub telemetry: TelemetrySnapshot,
}

/// Run a fixture script to completion
///
/// `config` supplies scheduler timing and calibration settings; the fixture
/// overrides channel count, scale and root note. Storage starts empty, so
/// every channel uses the built-in default profile.
pub fn run_fixture(
    spec: &FixtureSpec,
    config: &AppConfig,
    options: FixtureRunOptions,
) -> Result<FixtureRun> {
    spec.validate()?;

    let mut config = config.clone();
    config.scheduler.channel_count = spec.channel_count;
    if let Some(scale) = spec.scale {
        config.instrument.scale = scale;
    }
    if let Some(root_note) = spec.root_note {
        config.instrument.root_note = root_note;
    }

    let (io, rig, midi, _observer) = Peripherals::simulated(spec.channel_count);
    let clock = Arc::new(StubTimeSource::new());
    let time_source: Arc<dyn TimeSource> = clock.clone();
    let (mut handle, mut input) = InstrumentHandle::new(
        config.clone(),
        ColorPalette::standard(),
        io,
        Box::new(MemoryStorage::new()),
        time_source,
    )
    .map_err(|err| anyhow!("failed to build instrument: {}", err))?;

    let mut rng = StdRng::seed_from_u64(options.seed);
    let max_iterations = config.scheduler.round_interval_ms
        + (config.scheduler.settle_ms + 1) * spec.channel_count as u64
        + 2;

    let mut rounds = Vec::with_capacity(spec.rounds.len());
    for (index, round) in spec.rounds.iter().enumerate() {
        for (channel, reading) in round.readings.iter().enumerate() {
            let raw = match reading {
                Some(reading) => Some(apply_jitter(reading.to_raw()?, options.jitter, &mut rng)),
                None => None,
            };
            rig.set_reading(channel, raw);
            rig.set_available(channel, raw.is_some());
        }
        for event in &round.input {
            if !input.push(event.clone()) {
                log::warn!("[Fixture] Input event dropped: {:?}", event);
            }
        }

        let started_ms = clock.now_ms();
        let mut completed = false;
        for _ in 0..max_iterations {
            let report = handle.run_once();
            clock.advance(1);
            if report.tick.round_completed {
                completed = true;
                break;
            }
        }
        if !completed {
            bail!(
                "fixture {} round {} did not complete within {} ms",
                spec.id,
                index,
                max_iterations
            );
        }

        rounds.push(RoundRecord {
            round: index,
            started_ms,
            midi: midi.take(),
        });
    }

    tracing::debug!(fixture = %spec.id, rounds = rounds.len(), "[Fixture] Run complete");

    Ok(FixtureRun {
        id: spec.id.clone(),
        options,
        rounds,
        telemetry: handle.telemetry(),
    })
}

fn apply_jitter(raw: RawSample, jitter: u16, rng: &mut StdRng) -> RawSample {
    if jitter == 0 {
        return raw;
    }
    let range = i32::from(jitter);
    let mut shift = |value: u16| {
        let offset = rng.gen_range(-range..=range);
        (i32::from(value) + offset).clamp(0, i32::from(u16::MAX)) as u16
    };
    RawSample::new(
        shift(raw.red),
        shift(raw.green),
        shift(raw.blue),
        raw.clear,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_is_bounded_and_seeded() {
        let raw = RawSample::new(1000, 2000, 65530, 40000);
        let mut a = StdRng::seed_from_u64(7);
        let mut b = StdRng::seed_from_u64(7);

        let first = apply_jitter(raw, 50, &mut a);
        let second = apply_jitter(raw, 50, &mut b);

        assert_eq!(first, second);
        assert!((950..=1050).contains(&first.red));
        assert!((1950..=2050).contains(&first.green));
        assert!(first.blue >= 65480);
        assert_eq!(first.clear, 40000);
    }

    #[test]
    fn zero_jitter_is_identity() {
        let raw = RawSample::new(1, 2, 3, 4);
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(apply_jitter(raw, 0, &mut rng), raw);
    }
}
