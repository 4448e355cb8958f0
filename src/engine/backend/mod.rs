//! Collaborator ports for the instrument core.
//!
//! The core talks to hardware only through these narrow traits: the sensor
//! on the currently selected bus channel, the bus selector, the MIDI output,
//! the display/status observer and a millisecond clock. Real drivers live
//! outside this crate; `simulated` provides deterministic stand-ins.

use std::time::Instant;

use crate::calibration::{CalibrationProgress, CalibrationTarget};
use crate::color::RawSample;
use crate::engine::midi::MidiOutput;

mod simulated;
pub use simulated::{
    RecordingMidi, RecordingObserver, RigOperation, SimulatedRig, StatusEvent, StubTimeSource,
};

/// Photometric sensor on the currently selected bus channel
pub trait ColorSensor: Send {
    /// One read; `None` when the sensor did not answer
    fn read(&mut self) -> Option<RawSample>;

    fn is_available(&self) -> bool;

    /// Switch the sensor's illumination LED
    fn set_illumination(&mut self, on: bool);
}

/// Shared-bus channel multiplexer; best effort, no return values
pub trait BusSelector: Send {
    fn select(&mut self, channel: usize);

    fn disable_all(&mut self);
}

/// One-way notifications for the display; never queried by the core
pub trait StatusObserver: Send {
    fn on_calibration_start(&mut self, _channel: usize, _target: CalibrationTarget) {}

    fn on_calibration_progress(&mut self, _channel: usize, _progress: &CalibrationProgress) {}

    /// Latest classified color and emitted note for a sensing channel
    fn on_channel_update(&mut self, _channel: usize, _color: &str, _note: u8) {}

    fn on_encoder(&mut self, _delta: i32) {}

    fn on_panic(&mut self) {}
}

/// Observer that ignores everything
#[derive(Debug, Default, Clone, Copy)]
pub struct NullObserver;

impl StatusObserver for NullObserver {}

/// Trait representing a monotonic millisecond clock.
pub trait TimeSource: Send + Sync {
    fn now_ms(&self) -> u64;
}

/// Default time source backed by `Instant::now`.
pub struct SystemTimeSource {
    start: Instant,
}

impl SystemTimeSource {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }
}

impl Default for SystemTimeSource {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for SystemTimeSource {
    fn now_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }
}

/// The hardware-facing ports the control loop drives every tick
pub struct Peripherals {
    pub sensor: Box<dyn ColorSensor>,
    pub bus: Box<dyn BusSelector>,
    pub midi: Box<dyn MidiOutput>,
    pub observer: Box<dyn StatusObserver>,
}

impl Peripherals {
    pub fn new(
        sensor: Box<dyn ColorSensor>,
        bus: Box<dyn BusSelector>,
        midi: Box<dyn MidiOutput>,
        observer: Box<dyn StatusObserver>,
    ) -> Self {
        Self {
            sensor,
            bus,
            midi,
            observer,
        }
    }

    /// Wire a simulated rig, a recording MIDI port and a recording observer
    ///
    /// The returned handles share state with the boxed ports.
    pub fn simulated(channel_count: usize) -> (Self, SimulatedRig, RecordingMidi, RecordingObserver) {
        let rig = SimulatedRig::new(channel_count);
        let midi = RecordingMidi::new();
        let observer = RecordingObserver::new();
        let peripherals = Self::new(
            Box::new(rig.clone()),
            Box::new(rig.clone()),
            Box::new(midi.clone()),
            Box::new(observer.clone()),
        );
        (peripherals, rig, midi, observer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_system_time_source_is_monotonic() {
        let clock = SystemTimeSource::new();
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
    }

    #[test]
    fn test_null_observer_accepts_everything() {
        let mut observer = NullObserver;
        observer.on_encoder(3);
        observer.on_panic();
        observer.on_channel_update(0, "Red", 60);
    }
}
