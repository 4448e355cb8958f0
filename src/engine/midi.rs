//! MIDI messages and the output port.
//!
//! Channel numbers are the user-facing 1-16 values assigned in the menu.
//! Channel 0 is reserved: silence note-ons are routed there so no audible
//! voice is held. Byte framing belongs to the transport implementation.

use serde::{Deserialize, Serialize};

/// Controller number of the "All Notes Off" channel mode message
pub const ALL_NOTES_OFF_CONTROLLER: u8 = 123;

/// Output channel that receives silence note-ons
pub const SILENCE_MIDI_CHANNEL: u8 = 0;

/// Note number used for silence and for "no previous note"
pub const SILENCE_NOTE: u8 = 0;

/// Lowest and highest assignable output channel
pub const MIDI_CHANNELS: std::ops::RangeInclusive<u8> = 1..=16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MidiMessage {
    NoteOn { channel: u8, note: u8, velocity: u8 },
    NoteOff { channel: u8, note: u8, velocity: u8 },
    ControlChange { channel: u8, controller: u8, value: u8 },
}

impl MidiMessage {
    pub fn channel(&self) -> u8 {
        match self {
            MidiMessage::NoteOn { channel, .. }
            | MidiMessage::NoteOff { channel, .. }
            | MidiMessage::ControlChange { channel, .. } => *channel,
        }
    }
}

/// Outbound MIDI transport
pub trait MidiOutput: Send {
    fn send(&mut self, message: MidiMessage);

    fn note_on(&mut self, note: u8, velocity: u8, channel: u8) {
        self.send(MidiMessage::NoteOn {
            channel,
            note,
            velocity,
        });
    }

    fn note_off(&mut self, note: u8, velocity: u8, channel: u8) {
        self.send(MidiMessage::NoteOff {
            channel,
            note,
            velocity,
        });
    }

    fn control_change(&mut self, controller: u8, value: u8, channel: u8) {
        self.send(MidiMessage::ControlChange {
            channel,
            controller,
            value,
        });
    }
}

/// Broadcast "All Notes Off" on every assignable channel
///
/// Touches no per-channel runtime state, so it is safe at any scheduler phase.
pub fn all_notes_off(midi: &mut dyn MidiOutput) {
    for channel in MIDI_CHANNELS {
        midi.control_change(ALL_NOTES_OFF_CONTROLLER, 0, channel);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Collect(Vec<MidiMessage>);

    impl MidiOutput for Collect {
        fn send(&mut self, message: MidiMessage) {
            self.0.push(message);
        }
    }

    #[test]
    fn test_all_notes_off_covers_sixteen_channels() {
        let mut midi = Collect::default();
        all_notes_off(&mut midi);

        assert_eq!(midi.0.len(), 16);
        for (i, message) in midi.0.iter().enumerate() {
            assert_eq!(
                *message,
                MidiMessage::ControlChange {
                    channel: i as u8 + 1,
                    controller: 123,
                    value: 0
                }
            );
        }
    }

    #[test]
    fn test_default_methods_build_messages() {
        let mut midi = Collect::default();
        midi.note_on(60, 100, 3);
        midi.note_off(60, 0, 3);

        assert_eq!(
            midi.0,
            vec![
                MidiMessage::NoteOn {
                    channel: 3,
                    note: 60,
                    velocity: 100
                },
                MidiMessage::NoteOff {
                    channel: 3,
                    note: 60,
                    velocity: 0
                },
            ]
        );
        assert_eq!(midi.0[0].channel(), 3);
    }

    #[test]
    fn test_message_json_shape() {
        let json = serde_json::to_value(MidiMessage::NoteOn {
            channel: 2,
            note: 64,
            velocity: 127,
        })
        .unwrap();
        assert_eq!(json["type"], "note_on");
        assert_eq!(json["note"], 64);
    }
}
