use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationProgress, CalibrationTarget};
use crate::color::RawSample;
use crate::engine::midi::{MidiMessage, MidiOutput};

use super::{BusSelector, ColorSensor, StatusObserver, TimeSource};

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|e| e.into_inner())
}

/// Bus and sensor traffic recorded by [`SimulatedRig`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RigOperation {
    Select { channel: usize },
    DisableAll,
    Read { channel: Option<usize>, ok: bool },
    Illumination { on: bool },
}

#[derive(Debug)]
struct RigState {
    selected: Option<usize>,
    illumination: bool,
    readings: Vec<Option<RawSample>>,
    dark_readings: Vec<Option<RawSample>>,
    available: Vec<bool>,
    log: Vec<RigOperation>,
}

/// Simulated sensor array on a multiplexed bus.
///
/// Readings are sticky: a channel keeps returning its last configured sample
/// until changed. While illumination is off a channel's dark reading (if set)
/// is returned instead. Clones share one rig, so tests keep a handle while
/// the instrument owns boxed copies as its sensor and bus.
#[derive(Debug, Clone)]
pub struct SimulatedRig {
    state: Arc<Mutex<RigState>>,
}

impl SimulatedRig {
    pub fn new(channel_count: usize) -> Self {
        Self {
            state: Arc::new(Mutex::new(RigState {
                selected: None,
                illumination: true,
                readings: vec![None; channel_count],
                dark_readings: vec![None; channel_count],
                available: vec![true; channel_count],
                log: Vec::new(),
            })),
        }
    }

    /// Set (or clear with `None`) what a channel reads under illumination
    pub fn set_reading(&self, channel: usize, reading: Option<RawSample>) {
        if let Some(slot) = lock(&self.state).readings.get_mut(channel) {
            *slot = reading;
        }
    }

    /// Set what a channel reads while illumination is off
    pub fn set_dark_reading(&self, channel: usize, reading: Option<RawSample>) {
        if let Some(slot) = lock(&self.state).dark_readings.get_mut(channel) {
            *slot = reading;
        }
    }

    pub fn set_available(&self, channel: usize, available: bool) {
        if let Some(slot) = lock(&self.state).available.get_mut(channel) {
            *slot = available;
        }
    }

    pub fn selected(&self) -> Option<usize> {
        lock(&self.state).selected
    }

    pub fn illumination(&self) -> bool {
        lock(&self.state).illumination
    }

    pub fn operations(&self) -> Vec<RigOperation> {
        lock(&self.state).log.clone()
    }

    pub fn take_operations(&self) -> Vec<RigOperation> {
        std::mem::take(&mut lock(&self.state).log)
    }
}

impl ColorSensor for SimulatedRig {
    fn read(&mut self) -> Option<RawSample> {
        let mut state = lock(&self.state);
        let channel = state.selected;
        let reading = channel.and_then(|ch| {
            if !state.available.get(ch).copied().unwrap_or(false) {
                return None;
            }
            let dark = if state.illumination {
                None
            } else {
                state.dark_readings.get(ch).copied().flatten()
            };
            dark.or_else(|| state.readings.get(ch).copied().flatten())
        });
        state.log.push(RigOperation::Read {
            channel,
            ok: reading.is_some(),
        });
        reading
    }

    fn is_available(&self) -> bool {
        let state = lock(&self.state);
        state
            .selected
            .and_then(|ch| state.available.get(ch).copied())
            .unwrap_or(false)
    }

    fn set_illumination(&mut self, on: bool) {
        let mut state = lock(&self.state);
        state.illumination = on;
        state.log.push(RigOperation::Illumination { on });
    }
}

impl BusSelector for SimulatedRig {
    fn select(&mut self, channel: usize) {
        let mut state = lock(&self.state);
        state.selected = Some(channel);
        state.log.push(RigOperation::Select { channel });
    }

    fn disable_all(&mut self) {
        let mut state = lock(&self.state);
        state.selected = None;
        state.log.push(RigOperation::DisableAll);
    }
}

/// MIDI output that records every message
#[derive(Debug, Clone, Default)]
pub struct RecordingMidi {
    messages: Arc<Mutex<Vec<MidiMessage>>>,
}

impl RecordingMidi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn messages(&self) -> Vec<MidiMessage> {
        lock(&self.messages).clone()
    }

    /// Return and clear the recorded messages
    pub fn take(&self) -> Vec<MidiMessage> {
        std::mem::take(&mut *lock(&self.messages))
    }
}

impl MidiOutput for RecordingMidi {
    fn send(&mut self, message: MidiMessage) {
        lock(&self.messages).push(message);
    }
}

/// Notification recorded by [`RecordingObserver`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum StatusEvent {
    CalibrationStarted {
        channel: usize,
        target: CalibrationTarget,
    },
    CalibrationProgress {
        channel: usize,
        step: usize,
    },
    ChannelUpdate {
        channel: usize,
        color: String,
        note: u8,
    },
    Encoder {
        delta: i32,
    },
    Panic,
}

/// Status observer that records every notification
#[derive(Debug, Clone, Default)]
pub struct RecordingObserver {
    events: Arc<Mutex<Vec<StatusEvent>>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        lock(&self.events).clone()
    }

    pub fn take(&self) -> Vec<StatusEvent> {
        std::mem::take(&mut *lock(&self.events))
    }

    fn push(&self, event: StatusEvent) {
        lock(&self.events).push(event);
    }
}

impl StatusObserver for RecordingObserver {
    fn on_calibration_start(&mut self, channel: usize, target: CalibrationTarget) {
        self.push(StatusEvent::CalibrationStarted { channel, target });
    }

    fn on_calibration_progress(&mut self, channel: usize, progress: &CalibrationProgress) {
        self.push(StatusEvent::CalibrationProgress {
            channel,
            step: progress.step(),
        });
    }

    fn on_channel_update(&mut self, channel: usize, color: &str, note: u8) {
        self.push(StatusEvent::ChannelUpdate {
            channel,
            color: color.to_string(),
            note,
        });
    }

    fn on_encoder(&mut self, delta: i32) {
        self.push(StatusEvent::Encoder { delta });
    }

    fn on_panic(&mut self) {
        self.push(StatusEvent::Panic);
    }
}

/// Deterministic time source for tests and simulation.
///
/// Time only moves when told to via `advance`/`set`, or by `step_ms` on every
/// `now_ms()` call when constructed with [`StubTimeSource::with_step`].
#[derive(Debug, Default)]
pub struct StubTimeSource {
    now_ms: AtomicU64,
    step_ms: u64,
}

impl StubTimeSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clock that advances by `step_ms` after every read
    pub fn with_step(step_ms: u64) -> Self {
        Self {
            now_ms: AtomicU64::new(0),
            step_ms,
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn set(&self, ms: u64) {
        self.now_ms.store(ms, Ordering::SeqCst);
    }
}

impl TimeSource for StubTimeSource {
    fn now_ms(&self) -> u64 {
        self.now_ms.fetch_add(self.step_ms, Ordering::SeqCst)
    }
}
