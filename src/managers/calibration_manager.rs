// CalibrationManager: Focused manager for the calibration workflow
//
// Single Responsibility: hold at most one pending calibration request and run
// it to completion when the control loop gets to it.
//
// A run is a bounded loop of `samples_per_step` sensor reads. It always
// finishes and clears the pending request; results are committed to the
// channel's profile only when every read succeeded.

use crate::calibration::{
    CalibrationOutcome, CalibrationProcedure, CalibrationStore, CalibrationTarget,
};
use crate::config::CalibrationConfig;
use crate::engine::backend::Peripherals;
use crate::engine::pipeline::ColorPipeline;
use crate::error::{log_calibration_error, log_storage_error, CalibrationError};
use crate::storage::ProfileStorage;

/// A queued calibration run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationRequest {
    pub channel: usize,
    pub target: CalibrationTarget,
}

/// Manages the pending calibration request and executes it
///
/// # Example
/// ```ignore
/// manager.request(0, CalibrationTarget::WhiteReference, &store)?;
/// // ... later, once per loop iteration ...
/// if let Some(result) = manager.run_pending(&mut io, &mut store, &pipeline, storage) {
///     // result: Ok(outcome) or the reason nothing was committed
/// }
/// ```
pub struct CalibrationManager {
    pending: Option<CalibrationRequest>,
    samples_per_step: usize,
}

impl CalibrationManager {
    pub fn new(config: &CalibrationConfig) -> Self {
        Self {
            pending: None,
            samples_per_step: config.samples_per_step,
        }
    }

    /// Queue a calibration run
    ///
    /// # Errors
    /// - `AlreadyInProgress` while another request is pending
    /// - `InvalidChannel` for a channel without a profile
    /// - `InvalidSlot` for a color target outside the centroid table
    pub fn request(
        &mut self,
        channel: usize,
        target: CalibrationTarget,
        store: &CalibrationStore,
    ) -> Result<(), CalibrationError> {
        if self.pending.is_some() {
            return Err(CalibrationError::AlreadyInProgress);
        }
        let profile = store.profile(channel).ok_or(CalibrationError::InvalidChannel {
            channel,
            channel_count: store.channel_count(),
        })?;
        if let CalibrationTarget::Color(slot) = target {
            if slot >= profile.slot_count() {
                return Err(CalibrationError::InvalidSlot {
                    slot,
                    slot_count: profile.slot_count(),
                });
            }
        }

        log::info!(
            "[Calibration] Queued {} on channel {}",
            target.display_name(),
            channel
        );
        self.pending = Some(CalibrationRequest { channel, target });
        Ok(())
    }

    pub fn pending(&self) -> Option<CalibrationRequest> {
        self.pending
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// Drop the pending request without running it
    pub fn cancel(&mut self) -> Option<CalibrationRequest> {
        self.pending.take()
    }

    pub fn samples_per_step(&self) -> usize {
        self.samples_per_step
    }

    /// Run the pending request, if any
    ///
    /// # Returns
    /// * `None` - Nothing was pending
    /// * `Some(Ok(outcome))` - Averaged triple applied and write-back requested
    /// * `Some(Err(_))` - Run finished but nothing was committed
    pub fn run_pending(
        &mut self,
        io: &mut Peripherals,
        store: &mut CalibrationStore,
        pipeline: &ColorPipeline,
        storage: &mut dyn ProfileStorage,
    ) -> Option<Result<CalibrationOutcome, CalibrationError>> {
        let request = self.pending.take()?;
        let result = self.run(request, io, store, pipeline, storage);
        if let Err(err) = &result {
            log_calibration_error(err, &format!("calibration run on channel {}", request.channel));
        }
        Some(result)
    }

    fn run(
        &self,
        request: CalibrationRequest,
        io: &mut Peripherals,
        store: &mut CalibrationStore,
        pipeline: &ColorPipeline,
        storage: &mut dyn ProfileStorage,
    ) -> Result<CalibrationOutcome, CalibrationError> {
        let CalibrationRequest { channel, target } = request;
        let invalid_channel = CalibrationError::InvalidChannel {
            channel,
            channel_count: store.channel_count(),
        };
        let active = store
            .profile(channel)
            .cloned()
            .ok_or_else(|| invalid_channel.clone())?;

        let mut procedure = CalibrationProcedure::new(target, self.samples_per_step);
        io.observer.on_calibration_start(channel, target);
        io.observer
            .on_calibration_progress(channel, &procedure.progress());

        io.bus.select(channel);
        if target.needs_dark() {
            io.sensor.set_illumination(false);
        }

        for _ in 0..procedure.samples_needed() {
            let reading = if io.sensor.is_available() {
                io.sensor.read()
            } else {
                None
            };
            if let Some(raw) = reading {
                let sample = if target.uses_raw_samples() {
                    raw.rgb()
                } else {
                    pipeline.normalize(&raw, &active)
                };
                if let Err(err) = procedure.add_sample(sample) {
                    log_calibration_error(&err, "calibration sampling");
                }
            }
            io.observer
                .on_calibration_progress(channel, &procedure.progress());
        }

        if target.needs_dark() {
            io.sensor.set_illumination(true);
        }
        io.bus.disable_all();

        let progress = procedure.progress();
        if progress.samples_collected == 0 {
            return Err(CalibrationError::SensorUnavailable { channel });
        }
        let outcome = procedure.finalize()?;

        let profile = store.profile_mut(channel).ok_or(invalid_channel)?;
        outcome.apply(profile)?;

        if let Err(err) = store.persist(channel, storage) {
            log_storage_error(&err, "calibration write-back");
        }

        log::info!(
            "[Calibration] {} on channel {} -> ({:.1}, {:.1}, {:.1})",
            target.display_name(),
            channel,
            outcome.average.r,
            outcome.average.g,
            outcome.average.b
        );
        Ok(outcome)
    }
}

#[cfg(test)]
#[path = "calibration_manager_tests.rs"]
mod tests;
