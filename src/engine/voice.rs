// Voice - per-channel edge-triggered note emission
//
// Each sensing channel is a monophonic voice. A new classification only
// produces MIDI traffic when the slot differs from the previous one, and
// then always as a note-off for the previous note followed by a note-on for
// the new one.

use serde::{Deserialize, Serialize};

use crate::color::SlotIndex;
use crate::config::ChannelSettings;
use crate::engine::midi::{MidiMessage, SILENCE_MIDI_CHANNEL, SILENCE_NOTE};
use crate::scale::{transpose, NoteMapping, ScaleMapper};

/// The off/on pair produced by one color change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteTransition {
    pub slot: SlotIndex,
    pub note_off: MidiMessage,
    pub note_on: MidiMessage,
}

impl NoteTransition {
    /// Note carried by the note-on
    pub fn note(&self) -> u8 {
        match self.note_on {
            MidiMessage::NoteOn { note, .. } => note,
            _ => SILENCE_NOTE,
        }
    }

    pub fn is_silence(&self) -> bool {
        self.note_on.channel() == SILENCE_MIDI_CHANNEL
    }

    pub fn messages(&self) -> [MidiMessage; 2] {
        [self.note_off, self.note_on]
    }
}

/// Runtime state of one sensing channel's voice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRuntimeState {
    last_slot: Option<SlotIndex>,
    last_note: Option<u8>,
    settings: ChannelSettings,
}

impl ChannelRuntimeState {
    pub fn new(settings: ChannelSettings) -> Self {
        Self {
            last_slot: None,
            last_note: None,
            settings,
        }
    }

    /// Feed one classification result
    ///
    /// `None` or a repeat of the previous slot produces nothing. Otherwise the
    /// previous note (note 0 if there was none) is turned off on the assigned
    /// channel and the new note is turned on. Silence turns on note 0 on the
    /// reserved channel without octave transposition.
    pub fn observe(&mut self, slot: Option<SlotIndex>, mapper: &ScaleMapper) -> Option<NoteTransition> {
        let slot = slot?;
        if self.last_slot == Some(slot) {
            return None;
        }

        let note_off = MidiMessage::NoteOff {
            channel: self.settings.midi_channel,
            note: self.last_note.unwrap_or(SILENCE_NOTE),
            velocity: 0,
        };

        let (note, channel) = match mapper.map_slot(slot) {
            NoteMapping::Silence => (SILENCE_NOTE, SILENCE_MIDI_CHANNEL),
            NoteMapping::Note(mapped) => (
                transpose(mapped, self.settings.octave),
                self.settings.midi_channel,
            ),
        };
        let note_on = MidiMessage::NoteOn {
            channel,
            note,
            velocity: self.settings.velocity,
        };

        self.last_slot = Some(slot);
        self.last_note = Some(note);

        Some(NoteTransition {
            slot,
            note_off,
            note_on,
        })
    }

    pub fn last_slot(&self) -> Option<SlotIndex> {
        self.last_slot
    }

    pub fn last_note(&self) -> Option<u8> {
        self.last_note
    }

    pub fn settings(&self) -> &ChannelSettings {
        &self.settings
    }

    pub fn set_settings(&mut self, settings: ChannelSettings) {
        self.settings = settings;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::ColorPalette;
    use crate::scale::{ScaleDefinition, ScaleKind, ScaleStep};

    fn triad_mapper() -> ScaleMapper {
        let steps = [0, 4, 7].iter().map(|o| ScaleStep::Offset(*o)).collect();
        ScaleMapper::new(ScaleDefinition::new("triad", steps).unwrap(), 60)
    }

    fn off(channel: u8, note: u8) -> MidiMessage {
        MidiMessage::NoteOff {
            channel,
            note,
            velocity: 0,
        }
    }

    fn on(channel: u8, note: u8, velocity: u8) -> MidiMessage {
        MidiMessage::NoteOn {
            channel,
            note,
            velocity,
        }
    }

    #[test]
    fn test_blue_example_maps_to_67() {
        let mut voice = ChannelRuntimeState::new(ChannelSettings::new(1, 4, 100));
        let transition = voice.observe(Some(2), &triad_mapper()).unwrap();

        assert_eq!(transition.note(), 67);
        assert_eq!(transition.messages(), [off(1, 0), on(1, 67, 100)]);
    }

    #[test]
    fn test_edge_trigger_sequence() {
        let mapper = triad_mapper();
        let mut voice = ChannelRuntimeState::new(ChannelSettings::new(5, 4, 90));
        let (a, b) = (0, 1);

        let mut emitted = Vec::new();
        for slot in [a, a, b, b, a] {
            if let Some(t) = voice.observe(Some(slot), &mapper) {
                emitted.extend(t.messages());
            }
        }

        assert_eq!(
            emitted,
            vec![
                off(5, 0),
                on(5, 60, 90),
                off(5, 60),
                on(5, 64, 90),
                off(5, 64),
                on(5, 60, 90),
            ]
        );
    }

    #[test]
    fn test_repeat_is_silent() {
        let mapper = triad_mapper();
        let mut voice = ChannelRuntimeState::new(ChannelSettings::new(1, 4, 127));
        assert!(voice.observe(Some(1), &mapper).is_some());
        assert!(voice.observe(Some(1), &mapper).is_none());
        assert_eq!(voice.last_note(), Some(64));
    }

    #[test]
    fn test_no_classification_leaves_state() {
        let mapper = triad_mapper();
        let mut voice = ChannelRuntimeState::new(ChannelSettings::new(1, 4, 127));
        voice.observe(Some(0), &mapper);
        let before = voice.clone();

        assert!(voice.observe(None, &mapper).is_none());
        assert_eq!(voice, before);
    }

    #[test]
    fn test_octave_transposition() {
        let mapper = triad_mapper();
        let mut voice = ChannelRuntimeState::new(ChannelSettings::new(3, 1, 127));
        let transition = voice.observe(Some(1), &mapper).unwrap();
        // 64 + (1 - 4) * 12
        assert_eq!(transition.note(), 28);
    }

    #[test]
    fn test_silence_routes_to_reserved_channel() {
        let palette = ColorPalette::standard();
        let mapper = ScaleMapper::new(ScaleDefinition::for_kind(ScaleKind::Major, &palette), 60);
        let mut voice = ChannelRuntimeState::new(ChannelSettings::new(12, 6, 110));

        voice.observe(Some(4), &mapper);
        let transition = voice.observe(Some(9), &mapper).unwrap();

        assert!(transition.is_silence());
        // Green = 60 + 7, octave 6 adds 24
        assert_eq!(
            transition.messages(),
            [off(12, 91), on(SILENCE_MIDI_CHANNEL, 0, 110)]
        );
        assert_eq!(voice.last_note(), Some(0));

        // Leaving silence turns off note 0 on the assigned channel
        let transition = voice.observe(Some(0), &mapper).unwrap();
        assert_eq!(transition.note_off, off(12, 0));
        assert_eq!(transition.note_on, on(12, 84, 110));
    }

    #[test]
    fn test_settings_change_keeps_history() {
        let mapper = triad_mapper();
        let mut voice = ChannelRuntimeState::new(ChannelSettings::new(1, 4, 127));
        voice.observe(Some(2), &mapper);
        voice.set_settings(ChannelSettings::new(9, 5, 64));

        assert_eq!(voice.last_slot(), Some(2));
        let transition = voice.observe(Some(0), &mapper).unwrap();
        assert_eq!(transition.messages(), [off(9, 67), on(9, 72, 64)]);
    }
}
