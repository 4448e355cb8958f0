// Scale module - color slot to MIDI note mapping
//
// A ScaleDefinition holds one step per palette slot. A step is either a
// semitone offset from the root note or the tagged Silence marker, so a
// legitimate offset of 0 can never be mistaken for "stop sounding".
//
// The mapper never fails: out-of-range slots and unknown names fall back to
// the root note, and every produced note is clamped to 0-127.

use serde::{Deserialize, Serialize};

use crate::color::{ColorPalette, SlotIndex};
use crate::error::InstrumentError;

/// Octave setting that leaves mapped notes untransposed
pub const NEUTRAL_OCTAVE: u8 = 4;

/// Degrees of the major scale within one octave
const MAJOR_INTERVALS: [i8; 7] = [0, 2, 4, 5, 7, 9, 11];

/// Degrees of the natural minor scale within one octave
const MINOR_INTERVALS: [i8; 7] = [0, 2, 3, 5, 7, 8, 10];

/// One entry of a scale definition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScaleStep {
    /// Semitones above the root note
    Offset(i8),
    /// "Stop sounding" marker for the background color
    Silence,
}

/// Built-in scales selectable from the menu
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleKind {
    Major,
    Minor,
}

impl ScaleKind {
    fn intervals(&self) -> &'static [i8; 7] {
        match self {
            ScaleKind::Major => &MAJOR_INTERVALS,
            ScaleKind::Minor => &MINOR_INTERVALS,
        }
    }

    /// Get human-readable name for display
    pub fn display_name(&self) -> &'static str {
        match self {
            ScaleKind::Major => "Major",
            ScaleKind::Minor => "Minor",
        }
    }

    /// Semitone offset of the n-th ascending degree, continuing into higher octaves
    pub fn degree_offset(&self, degree: usize) -> i8 {
        let intervals = self.intervals();
        let octave = (degree / intervals.len()) as i8;
        intervals[degree % intervals.len()] + octave * 12
    }
}

/// Ordered per-slot scale steps
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScaleDefinition {
    name: String,
    steps: Vec<ScaleStep>,
}

impl ScaleDefinition {
    /// Create a validated scale
    ///
    /// # Errors
    /// `InstrumentError::InvalidScale` when there are no steps or more than one
    /// `Silence` step.
    pub fn new(name: impl Into<String>, steps: Vec<ScaleStep>) -> Result<Self, InstrumentError> {
        if steps.is_empty() {
            return Err(InstrumentError::InvalidScale {
                reason: "scale has no steps".to_string(),
            });
        }
        let silences = steps.iter().filter(|s| **s == ScaleStep::Silence).count();
        if silences > 1 {
            return Err(InstrumentError::InvalidScale {
                reason: format!("{} silence steps, at most one allowed", silences),
            });
        }

        Ok(Self {
            name: name.into(),
            steps,
        })
    }

    /// Lay a built-in scale over a palette
    ///
    /// Non-silence slots receive ascending scale degrees in slot order; the
    /// palette's silence slot receives `Silence`.
    pub fn for_kind(kind: ScaleKind, palette: &ColorPalette) -> Self {
        let mut degree = 0;
        let steps = (0..palette.len())
            .map(|slot| {
                if palette.is_silence(slot) {
                    ScaleStep::Silence
                } else {
                    let step = ScaleStep::Offset(kind.degree_offset(degree));
                    degree += 1;
                    step
                }
            })
            .collect();

        Self {
            name: kind.display_name().to_string(),
            steps,
        }
    }

    /// Verify slot count and silence slot agree with the palette
    pub fn check_against(&self, palette: &ColorPalette) -> Result<(), InstrumentError> {
        if self.steps.len() != palette.len() {
            return Err(InstrumentError::TableMismatch {
                table: "scale",
                expected: palette.len(),
                actual: self.steps.len(),
            });
        }
        if self.silence_slot() != palette.silence_slot() {
            return Err(InstrumentError::InvalidScale {
                reason: format!(
                    "silence step at {:?}, palette silence slot is {:?}",
                    self.silence_slot(),
                    palette.silence_slot()
                ),
            });
        }
        Ok(())
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn steps(&self) -> &[ScaleStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn step(&self, slot: SlotIndex) -> Option<ScaleStep> {
        self.steps.get(slot).copied()
    }

    pub fn silence_slot(&self) -> Option<SlotIndex> {
        self.steps.iter().position(|s| *s == ScaleStep::Silence)
    }
}

/// Result of mapping a slot through a scale
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "note", rename_all = "snake_case")]
pub enum NoteMapping {
    Note(u8),
    Silence,
}

/// Maps classified color slots to MIDI notes for the active scale and root
#[derive(Debug, Clone, PartialEq)]
pub struct ScaleMapper {
    scale: ScaleDefinition,
    root_note: u8,
}

impl ScaleMapper {
    pub fn new(scale: ScaleDefinition, root_note: u8) -> Self {
        Self {
            scale,
            root_note: root_note.min(127),
        }
    }

    /// Map a slot index to a note or silence
    ///
    /// Out-of-range slots map to the root note.
    pub fn map_slot(&self, slot: SlotIndex) -> NoteMapping {
        match self.scale.step(slot) {
            Some(ScaleStep::Silence) => NoteMapping::Silence,
            Some(ScaleStep::Offset(offset)) => NoteMapping::Note(clamp_note(
                i32::from(self.root_note) + i32::from(offset),
            )),
            None => NoteMapping::Note(self.root_note),
        }
    }

    /// Compatibility lookup for callers that only have a color name
    ///
    /// Unknown names map to the root note.
    pub fn map_name(&self, name: &str, palette: &ColorPalette) -> NoteMapping {
        match palette.slot_for_name(name) {
            Some(slot) => self.map_slot(slot),
            None => NoteMapping::Note(self.root_note),
        }
    }

    pub fn scale(&self) -> &ScaleDefinition {
        &self.scale
    }

    /// Swap the active scale wholesale
    pub fn set_scale(&mut self, scale: ScaleDefinition) {
        self.scale = scale;
    }

    pub fn root_note(&self) -> u8 {
        self.root_note
    }

    pub fn set_root_note(&mut self, root_note: u8) {
        self.root_note = root_note.min(127);
    }
}

/// Apply an octave setting: `clamp(note + (octave - 4) * 12, 0, 127)`
pub fn transpose(note: u8, octave: u8) -> u8 {
    let shift = (i32::from(octave) - i32::from(NEUTRAL_OCTAVE)) * 12;
    clamp_note(i32::from(note) + shift)
}

fn clamp_note(value: i32) -> u8 {
    value.clamp(0, 127) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rgb_palette() -> ColorPalette {
        ColorPalette::new(
            vec!["Red".to_string(), "Green".to_string(), "Blue".to_string()],
            None,
        )
        .unwrap()
    }

    fn offsets(values: &[i8]) -> Vec<ScaleStep> {
        values.iter().map(|v| ScaleStep::Offset(*v)).collect()
    }

    #[test]
    fn test_major_for_standard_palette() {
        let scale = ScaleDefinition::for_kind(ScaleKind::Major, &ColorPalette::standard());
        let mut expected = offsets(&[0, 2, 4, 5, 7, 9, 11, 12, 14]);
        expected.push(ScaleStep::Silence);

        assert_eq!(scale.steps(), expected.as_slice());
        assert_eq!(scale.silence_slot(), Some(9));
        assert!(scale.check_against(&ColorPalette::standard()).is_ok());
    }

    #[test]
    fn test_minor_degrees() {
        let degrees: Vec<i8> = (0..8).map(|d| ScaleKind::Minor.degree_offset(d)).collect();
        assert_eq!(degrees, vec![0, 2, 3, 5, 7, 8, 10, 12]);
    }

    #[test]
    fn test_new_rejects_two_silences() {
        let result = ScaleDefinition::new(
            "bad",
            vec![ScaleStep::Silence, ScaleStep::Offset(0), ScaleStep::Silence],
        );
        assert!(matches!(result, Err(InstrumentError::InvalidScale { .. })));
        assert!(ScaleDefinition::new("empty", Vec::new()).is_err());
    }

    #[test]
    fn test_check_against_length_mismatch() {
        let scale = ScaleDefinition::new("triad", offsets(&[0, 4, 7])).unwrap();
        assert_eq!(
            scale.check_against(&ColorPalette::standard()),
            Err(InstrumentError::TableMismatch {
                table: "scale",
                expected: 10,
                actual: 3
            })
        );
        assert!(scale.check_against(&rgb_palette()).is_ok());
    }

    #[test]
    fn test_check_against_silence_mismatch() {
        let scale = ScaleDefinition::new(
            "triad",
            vec![ScaleStep::Offset(0), ScaleStep::Silence, ScaleStep::Offset(7)],
        )
        .unwrap();
        assert!(scale.check_against(&rgb_palette()).is_err());
    }

    #[test]
    fn test_map_slot_adds_offset_to_root() {
        let scale = ScaleDefinition::new("triad", offsets(&[0, 4, 7])).unwrap();
        let mapper = ScaleMapper::new(scale, 60);

        assert_eq!(mapper.map_slot(0), NoteMapping::Note(60));
        assert_eq!(mapper.map_slot(1), NoteMapping::Note(64));
        assert_eq!(mapper.map_slot(2), NoteMapping::Note(67));
    }

    #[test]
    fn test_map_slot_silence_is_tagged() {
        let mapper = ScaleMapper::new(
            ScaleDefinition::for_kind(ScaleKind::Major, &ColorPalette::standard()),
            60,
        );
        assert_eq!(mapper.map_slot(0), NoteMapping::Note(60));
        assert_eq!(mapper.map_slot(9), NoteMapping::Silence);
    }

    #[test]
    fn test_map_slot_out_of_range_is_root() {
        let scale = ScaleDefinition::new("triad", offsets(&[0, 4, 7])).unwrap();
        let mapper = ScaleMapper::new(scale, 62);
        assert_eq!(mapper.map_slot(3), NoteMapping::Note(62));
        assert_eq!(mapper.map_slot(usize::MAX), NoteMapping::Note(62));
    }

    #[test]
    fn test_map_slot_clamps() {
        let scale = ScaleDefinition::new("wide", offsets(&[100, -100])).unwrap();
        let mapper = ScaleMapper::new(scale, 60);
        assert_eq!(mapper.map_slot(0), NoteMapping::Note(127));
        assert_eq!(mapper.map_slot(1), NoteMapping::Note(0));
    }

    #[test]
    fn test_notes_in_range_for_every_root() {
        let palette = ColorPalette::standard();
        for kind in [ScaleKind::Major, ScaleKind::Minor] {
            let scale = ScaleDefinition::for_kind(kind, &palette);
            for root in 0..=127u8 {
                let mapper = ScaleMapper::new(scale.clone(), root);
                for slot in 0..palette.len() {
                    match (mapper.map_slot(slot), scale.step(slot)) {
                        (NoteMapping::Note(note), Some(ScaleStep::Offset(offset))) => {
                            let unclamped = i32::from(root) + i32::from(offset);
                            assert!(note <= 127);
                            if unclamped <= 127 {
                                assert_eq!(i32::from(note), unclamped);
                            }
                        }
                        (NoteMapping::Silence, Some(ScaleStep::Silence)) => {}
                        other => panic!("unexpected mapping {:?}", other),
                    }
                }
            }
        }
    }

    #[test]
    fn test_map_name_matches_map_slot() {
        let palette = ColorPalette::standard();
        let mapper = ScaleMapper::new(ScaleDefinition::for_kind(ScaleKind::Minor, &palette), 57);

        for (slot, name) in palette.names().iter().enumerate() {
            assert_eq!(mapper.map_name(name, &palette), mapper.map_slot(slot));
        }
        assert_eq!(mapper.map_name("Brown", &palette), NoteMapping::Note(57));
    }

    #[test]
    fn test_transpose() {
        assert_eq!(transpose(60, 4), 60);
        assert_eq!(transpose(60, 1), 24);
        assert_eq!(transpose(60, 6), 84);
        assert_eq!(transpose(10, 0), 0);
        assert_eq!(transpose(120, 9), 127);
    }

    #[test]
    fn test_scale_kind_serde() {
        assert_eq!(serde_json::to_string(&ScaleKind::Minor).unwrap(), "\"minor\"");
        let kind: ScaleKind = serde_json::from_str("\"major\"").unwrap();
        assert_eq!(kind, ScaleKind::Major);
    }
}
