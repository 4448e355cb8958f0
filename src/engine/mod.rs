//! Engine module housing the instrument core.
//!
//! `backend` defines the collaborator ports and their simulated stand-ins,
//! `pipeline`, `voice` and `scheduler` turn sensor reads into MIDI, and
//! `core` ties them together in the `InstrumentHandle` control loop.

pub mod backend;
pub mod core;
pub mod midi;
pub mod pipeline;
pub mod scheduler;
pub mod voice;

pub use backend::{
    BusSelector, ColorSensor, NullObserver, Peripherals, StatusObserver, StubTimeSource,
    SystemTimeSource, TimeSource,
};
pub use self::core::{InstrumentHandle, LoopReport};
pub use midi::{all_notes_off, MidiMessage, MidiOutput};
pub use pipeline::ColorPipeline;
pub use scheduler::{ChannelRead, ChannelScheduler, SchedulerPhase, TickReport};
pub use voice::{ChannelRuntimeState, NoteTransition};
