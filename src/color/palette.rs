// ColorPalette - the ordered set of color slots an instrument recognizes
//
// Slot order is shared by the centroid table and the scale steps; the palette
// is the single length source those tables are validated against.

use serde::{Deserialize, Serialize};

use crate::error::InstrumentError;

/// Position in the ordered color/centroid/scale tables
pub type SlotIndex = usize;

/// Upper bound on slots per palette
pub const MAX_COLOR_SLOTS: usize = 16;

/// Names of the standard ten-color palette, in slot order
pub const STANDARD_COLOR_NAMES: [&str; 10] = [
    "LightBlue",
    "Orange",
    "Pink",
    "Yellow",
    "Green",
    "Red",
    "Black",
    "DarkBlue",
    "Purple",
    "White",
];

/// Slot of the background color in the standard palette
pub const STANDARD_SILENCE_SLOT: SlotIndex = 9;

/// Ordered color slot names plus the optional silence slot
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColorPalette {
    names: Vec<String>,
    silence_slot: Option<SlotIndex>,
}

impl ColorPalette {
    /// Create a validated palette
    ///
    /// # Errors
    /// `InstrumentError::InvalidPalette` when the palette is empty, larger than
    /// [`MAX_COLOR_SLOTS`], repeats a name, or names a silence slot past the end.
    pub fn new(names: Vec<String>, silence_slot: Option<SlotIndex>) -> Result<Self, InstrumentError> {
        if names.is_empty() {
            return Err(InstrumentError::InvalidPalette {
                reason: "palette has no slots".to_string(),
            });
        }
        if names.len() > MAX_COLOR_SLOTS {
            return Err(InstrumentError::InvalidPalette {
                reason: format!("{} slots exceeds limit of {}", names.len(), MAX_COLOR_SLOTS),
            });
        }
        for (i, name) in names.iter().enumerate() {
            if names[..i].contains(name) {
                return Err(InstrumentError::InvalidPalette {
                    reason: format!("duplicate color name {:?}", name),
                });
            }
        }
        if let Some(slot) = silence_slot {
            if slot >= names.len() {
                return Err(InstrumentError::InvalidPalette {
                    reason: format!("silence slot {} past end of {} slots", slot, names.len()),
                });
            }
        }

        Ok(Self {
            names,
            silence_slot,
        })
    }

    /// The ten-color instrument palette with White as the silence slot
    pub fn standard() -> Self {
        Self {
            names: STANDARD_COLOR_NAMES.iter().map(|n| n.to_string()).collect(),
            silence_slot: Some(STANDARD_SILENCE_SLOT),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn name(&self, slot: SlotIndex) -> Option<&str> {
        self.names.get(slot).map(String::as_str)
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn silence_slot(&self) -> Option<SlotIndex> {
        self.silence_slot
    }

    pub fn is_silence(&self, slot: SlotIndex) -> bool {
        self.silence_slot == Some(slot)
    }

    /// Exact, case-sensitive linear scan for a slot name
    pub fn slot_for_name(&self, name: &str) -> Option<SlotIndex> {
        self.names.iter().position(|n| n == name)
    }
}

impl Default for ColorPalette {
    fn default() -> Self {
        Self::standard()
    }
}
