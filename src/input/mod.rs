// Input module - discrete control events for the main loop
//
// Encoder ticks and button presses are captured outside the core (already
// debounced) and pushed into a bounded single-consumer queue. The control
// loop drains the queue once per iteration; nothing in the core knows who
// the producer is.

pub mod queue;

pub use queue::{InputConsumer, InputProducer, InputQueue};

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationTarget;
use crate::scale::ScaleKind;

/// One already-debounced control event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputEvent {
    /// Rotary encoder movement in detents (signed)
    Encoder { delta: i32 },
    /// All-notes-off request
    Panic,
    RequestCalibration {
        channel: usize,
        target: CalibrationTarget,
    },
    CopyProfile { source: usize, targets: Vec<usize> },
    SetMidiChannel { channel: usize, midi_channel: u8 },
    SetOctave { channel: usize, octave: u8 },
    SetVelocity { channel: usize, velocity: u8 },
    SetRootNote { root_note: u8 },
    SelectScale { scale: ScaleKind },
}
