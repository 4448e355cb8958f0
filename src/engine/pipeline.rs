// ColorPipeline - the per-read signal chain
//
// raw reading → SampleNormalizer → classifier → ScaleMapper. The palette,
// scale and every profile's centroid table are checked against each other
// when the pipeline is built and whenever the scale is swapped.

use crate::analysis::classify;
use crate::calibration::CalibrationProfile;
use crate::color::{CalibratedSample, ColorPalette, RawSample, SampleNormalizer, SlotIndex};
use crate::error::InstrumentError;
use crate::scale::{ScaleDefinition, ScaleKind, ScaleMapper};

#[derive(Debug, Clone)]
pub struct ColorPipeline {
    palette: ColorPalette,
    normalizer: SampleNormalizer,
    mapper: ScaleMapper,
}

impl ColorPipeline {
    /// Build a pipeline whose scale fits the palette
    ///
    /// # Errors
    /// `TableMismatch` or `InvalidScale` when the scale does not line up with
    /// the palette slot for slot.
    pub fn new(
        palette: ColorPalette,
        normalizer: SampleNormalizer,
        mapper: ScaleMapper,
    ) -> Result<Self, InstrumentError> {
        mapper.scale().check_against(&palette)?;
        Ok(Self {
            palette,
            normalizer,
            mapper,
        })
    }

    /// Pipeline using a built-in scale laid over the palette
    pub fn with_kind(
        palette: ColorPalette,
        normalizer: SampleNormalizer,
        kind: ScaleKind,
        root_note: u8,
    ) -> Self {
        let scale = ScaleDefinition::for_kind(kind, &palette);
        Self {
            mapper: ScaleMapper::new(scale, root_note),
            palette,
            normalizer,
        }
    }

    /// Verify a profile's centroid table has one entry per palette slot
    pub fn check_profile(&self, profile: &CalibrationProfile) -> Result<(), InstrumentError> {
        if profile.matches_palette(&self.palette) {
            Ok(())
        } else {
            Err(InstrumentError::TableMismatch {
                table: "centroid table",
                expected: self.palette.len(),
                actual: profile.slot_count(),
            })
        }
    }

    pub fn normalize(&self, raw: &RawSample, profile: &CalibrationProfile) -> CalibratedSample {
        self.normalizer.normalize(raw, profile)
    }

    /// Normalize and classify one reading
    pub fn classify(&self, raw: &RawSample, profile: &CalibrationProfile) -> Option<SlotIndex> {
        classify(&self.normalize(raw, profile), profile)
    }

    /// Swap the active scale after checking it against the palette
    pub fn set_scale(&mut self, scale: ScaleDefinition) -> Result<(), InstrumentError> {
        scale.check_against(&self.palette)?;
        self.mapper.set_scale(scale);
        Ok(())
    }

    pub fn set_root_note(&mut self, root_note: u8) {
        self.mapper.set_root_note(root_note);
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    pub fn normalizer(&self) -> &SampleNormalizer {
        &self.normalizer
    }

    pub fn mapper(&self) -> &ScaleMapper {
        &self.mapper
    }

    /// Display name of a slot, "?" when out of range
    pub fn color_name(&self, slot: SlotIndex) -> &str {
        self.palette.name(slot).unwrap_or("?")
    }
}
