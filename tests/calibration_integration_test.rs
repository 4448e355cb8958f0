//! Calibration workflow integration tests
//!
//! Calibrates a channel through the public InstrumentHandle API and checks
//! that the new centroids drive classification, survive a restart and can be
//! copied to other channels.

use std::sync::Arc;

use color_midi::engine::backend::{
    RecordingMidi, RecordingObserver, SimulatedRig, StatusEvent, StubTimeSource, TimeSource,
};
use color_midi::telemetry::MetricEvent;
use color_midi::{
    AppConfig, CalibrationError, CalibrationTarget, ColorPalette, InputEvent, InputProducer,
    InstrumentHandle, MemoryStorage, MidiMessage, Peripherals, RawSample, Rgb,
};

struct Instrument {
    handle: InstrumentHandle,
    input: InputProducer,
    rig: SimulatedRig,
    midi: RecordingMidi,
    observer: RecordingObserver,
    clock: Arc<StubTimeSource>,
}

fn build(storage: &MemoryStorage) -> Instrument {
    let (io, rig, midi, observer) = Peripherals::simulated(4);
    let clock = Arc::new(StubTimeSource::new());
    let time_source: Arc<dyn TimeSource> = clock.clone();
    let (handle, input) = InstrumentHandle::new(
        AppConfig::default(),
        ColorPalette::standard(),
        io,
        Box::new(storage.clone()),
        time_source,
    )
    .expect("default configuration is valid");

    Instrument {
        handle,
        input,
        rig,
        midi,
        observer,
        clock,
    }
}

/// Run one calibration step without letting the scheduler read anything
fn calibrate(instrument: &mut Instrument, channel: usize, target: CalibrationTarget) {
    instrument
        .handle
        .request_calibration(channel, target)
        .expect("request accepted");
    let report = instrument.handle.run_once();
    assert!(
        matches!(report.calibration, Some(Ok(_))),
        "calibration failed: {:?}",
        report.calibration
    );
}

fn run_for(instrument: &mut Instrument, ms: u64) {
    for _ in 0..ms {
        instrument.handle.run_once();
        instrument.clock.advance(1);
    }
}

const TEAL: RawSample = RawSample {
    red: 9000,
    green: 30000,
    blue: 29000,
    clear: 50000,
};

#[test]
fn test_full_calibration_drives_classification() {
    let storage = MemoryStorage::new();
    let mut instrument = build(&storage);

    instrument
        .rig
        .set_dark_reading(0, Some(RawSample::new(500, 400, 300, 0)));
    calibrate(&mut instrument, 0, CalibrationTarget::DarkOffset);

    instrument
        .rig
        .set_reading(0, Some(RawSample::new(20500, 10400, 5300, 60000)));
    calibrate(&mut instrument, 0, CalibrationTarget::WhiteReference);

    instrument.rig.set_reading(0, Some(TEAL));
    calibrate(&mut instrument, 0, CalibrationTarget::Color(3));

    let profile = instrument.handle.store().profile(0).unwrap().clone();
    assert_eq!(profile.dark_offset, Rgb::new(500.0, 400.0, 300.0));
    let mean = 35000.0 / 3.0;
    assert!((profile.gain.r - mean / 20000.0).abs() < 1e-3);
    assert!((profile.gain.g - mean / 10000.0).abs() < 1e-3);
    assert!((profile.gain.b - mean / 5000.0).abs() < 1e-3);
    assert!(profile.is_calibrated);

    // Calibrated color now maps to slot 3 (major degree 3 = +5), channel A octave 1
    instrument.midi.take();
    run_for(&mut instrument, 5);
    assert_eq!(
        instrument.midi.take(),
        vec![
            MidiMessage::NoteOff {
                channel: 3,
                note: 0,
                velocity: 0
            },
            MidiMessage::NoteOn {
                channel: 3,
                note: 60 + 5 - 36,
                velocity: 127
            },
        ]
    );

    assert_eq!(storage.snapshot().profiles.get(&0), Some(&profile));
}

#[test]
fn test_progress_reported_for_each_sample() {
    let storage = MemoryStorage::new();
    let mut instrument = build(&storage);
    instrument.rig.set_reading(1, Some(TEAL));

    calibrate(&mut instrument, 1, CalibrationTarget::Color(0));

    let steps: Vec<usize> = instrument
        .observer
        .events()
        .iter()
        .filter_map(|e| match e {
            StatusEvent::CalibrationProgress { channel: 1, step } => Some(*step),
            _ => None,
        })
        .collect();
    let samples = AppConfig::default().calibration.samples_per_step;
    assert_eq!(steps, (0..=samples).collect::<Vec<_>>());
}

#[test]
fn test_calibration_survives_restart_and_copies() {
    let storage = MemoryStorage::new();
    let calibrated = {
        let mut instrument = build(&storage);
        instrument.rig.set_reading(0, Some(TEAL));
        calibrate(&mut instrument, 0, CalibrationTarget::Color(3));
        instrument.handle.store().profile(0).unwrap().clone()
    };

    let mut instrument = build(&storage);
    assert_eq!(instrument.handle.store().profile(0), Some(&calibrated));
    assert!(!instrument.handle.store().profile(2).unwrap().is_calibrated);

    instrument.input.push(InputEvent::CopyProfile {
        source: 0,
        targets: vec![2],
    });
    instrument.rig.set_reading(2, Some(TEAL));
    run_for(&mut instrument, 5);

    assert_eq!(instrument.handle.store().profile(2), Some(&calibrated));
    // Channel C: MIDI 7, no transposition
    assert!(instrument.midi.messages().contains(&MidiMessage::NoteOn {
        channel: 7,
        note: 65,
        velocity: 127
    }));
    assert_eq!(storage.snapshot().profiles.get(&2), Some(&calibrated));
}

#[test]
fn test_unavailable_sensor_commits_nothing() {
    let storage = MemoryStorage::new();
    let mut instrument = build(&storage);
    instrument.rig.set_available(1, false);
    let before = instrument.handle.store().clone();

    instrument
        .handle
        .request_calibration(1, CalibrationTarget::WhiteReference)
        .unwrap();
    let report = instrument.handle.run_once();

    assert_eq!(
        report.calibration,
        Some(Err(CalibrationError::SensorUnavailable { channel: 1 }))
    );
    assert_eq!(instrument.handle.store(), &before);
    assert!(!instrument.handle.calibration().is_pending());
    assert!(instrument.handle.telemetry().recent.iter().any(|e| matches!(
        e,
        MetricEvent::CalibrationFinished {
            channel: 1,
            success: false,
            ..
        }
    )));
}

#[test]
fn test_second_request_rejected_while_pending() {
    let storage = MemoryStorage::new();
    let mut instrument = build(&storage);

    instrument
        .handle
        .request_calibration(0, CalibrationTarget::DarkOffset)
        .unwrap();
    assert_eq!(
        instrument
            .handle
            .request_calibration(1, CalibrationTarget::DarkOffset),
        Err(CalibrationError::AlreadyInProgress)
    );
}
