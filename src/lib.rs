// Color MIDI Core - color-sensor instrument engine
// Round-robin sensor polling, nearest-centroid classification and
// edge-triggered MIDI emission in a single cooperative control loop

// Module declarations
pub mod analysis;
pub mod calibration;
pub mod color;
pub mod config;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod input;
pub mod managers;
pub mod scale;
pub mod storage;
pub mod telemetry;

// Re-exports for convenience
pub use calibration::{CalibrationProfile, CalibrationStore, CalibrationTarget};
pub use color::{ColorPalette, RawSample, Rgb, SlotIndex};
pub use config::{AppConfig, ChannelSettings, InstrumentSettings};
pub use engine::{InstrumentHandle, LoopReport, MidiMessage, MidiOutput, Peripherals};
pub use error::{CalibrationError, ErrorCode, InstrumentError, StorageError};
pub use input::{InputEvent, InputProducer};
pub use scale::{NoteMapping, ScaleKind, ScaleMapper};
pub use storage::{JsonFileStorage, MemoryStorage, ProfileStorage};
