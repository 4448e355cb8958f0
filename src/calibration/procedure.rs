// CalibrationProcedure - sample-accumulate-average loop
//
// A procedure targets one measurement (dark offset, white reference or a
// color centroid) and accepts exactly `samples_needed` samples. Finalizing a
// complete procedure yields a CalibrationOutcome holding the averaged triple;
// applying the outcome is the only way a procedure mutates a profile, so an
// abandoned procedure commits nothing.

use crate::calibration::profile::CalibrationProfile;
use crate::calibration::progress::{CalibrationProgress, CalibrationTarget};
use crate::color::Rgb;
use crate::error::CalibrationError;

/// Default number of sampling iterations per calibration run
pub const DEFAULT_SAMPLES_PER_STEP: usize = 20;

/// CalibrationProcedure manages one sample collection run
#[derive(Debug, Clone)]
pub struct CalibrationProcedure {
    target: CalibrationTarget,
    samples_needed: usize,
    samples_collected: usize,
    /// Running channel sums, kept in f64 so twenty 16-bit reads stay exact
    sum: [f64; 3],
}

impl CalibrationProcedure {
    /// Create a new calibration procedure
    ///
    /// # Arguments
    /// * `target` - What the averaged triple will be written into
    /// * `samples_needed` - Number of samples to accumulate (at least 1)
    pub fn new(target: CalibrationTarget, samples_needed: usize) -> Self {
        Self {
            target,
            samples_needed: samples_needed.max(1),
            samples_collected: 0,
            sum: [0.0; 3],
        }
    }

    /// Create with default configuration (20 samples)
    pub fn new_default(target: CalibrationTarget) -> Self {
        Self::new(target, DEFAULT_SAMPLES_PER_STEP)
    }

    /// Accumulate one sample
    ///
    /// # Returns
    /// * `Ok(CalibrationProgress)` - Progress after accepting the sample
    /// * `Err(CalibrationError::AlreadyComplete)` - All samples already collected
    pub fn add_sample(&mut self, sample: Rgb) -> Result<CalibrationProgress, CalibrationError> {
        if self.is_complete() {
            return Err(CalibrationError::AlreadyComplete {
                samples_needed: self.samples_needed,
            });
        }

        self.sum[0] += f64::from(sample.r);
        self.sum[1] += f64::from(sample.g);
        self.sum[2] += f64::from(sample.b);
        self.samples_collected += 1;

        Ok(self.progress())
    }

    /// Get current calibration progress
    pub fn progress(&self) -> CalibrationProgress {
        CalibrationProgress::new(self.target, self.samples_collected, self.samples_needed)
    }

    pub fn is_complete(&self) -> bool {
        self.samples_collected >= self.samples_needed
    }

    /// Average the accumulated samples
    ///
    /// # Returns
    /// * `Ok(CalibrationOutcome)` - Averaged triple for the target
    /// * `Err(CalibrationError::InsufficientSamples)` - Run did not finish
    pub fn finalize(&self) -> Result<CalibrationOutcome, CalibrationError> {
        if !self.is_complete() {
            return Err(CalibrationError::InsufficientSamples {
                required: self.samples_needed,
                collected: self.samples_collected,
            });
        }

        let n = self.samples_collected as f64;
        let average = Rgb::new(
            (self.sum[0] / n) as f32,
            (self.sum[1] / n) as f32,
            (self.sum[2] / n) as f32,
        );

        Ok(CalibrationOutcome {
            target: self.target,
            average,
        })
    }

    /// Discard accumulated samples, keeping the target
    pub fn reset(&mut self) {
        self.samples_collected = 0;
        self.sum = [0.0; 3];
    }

    pub fn target(&self) -> CalibrationTarget {
        self.target
    }

    pub fn samples_needed(&self) -> usize {
        self.samples_needed
    }
}

/// Result of a finished calibration run
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibrationOutcome {
    pub target: CalibrationTarget,
    pub average: Rgb,
}

impl CalibrationOutcome {
    /// Write the averaged triple into a profile
    ///
    /// Dark runs replace the dark offset, white runs recompute all gains and
    /// color runs overwrite the target slot's centroid.
    pub fn apply(&self, profile: &mut CalibrationProfile) -> Result<(), CalibrationError> {
        match self.target {
            CalibrationTarget::DarkOffset => profile.set_dark_offset(self.average),
            CalibrationTarget::WhiteReference => profile.set_white_reference(self.average),
            CalibrationTarget::Color(slot) => profile.set_centroid(slot, self.average)?,
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "procedure_tests.rs"]
mod tests;
