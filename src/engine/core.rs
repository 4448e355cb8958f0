//! InstrumentHandle: root of the cooperative control loop.
//!
//! The handle owns every piece of instrument state (profiles, per-channel
//! voices, scheduler phase, pending calibration) and the peripherals it
//! drives. One call to [`InstrumentHandle::run_once`] is one loop iteration;
//! the caller decides how often to call it.

use std::sync::Arc;

use crate::calibration::{CalibrationOutcome, CalibrationStore, CalibrationTarget};
use crate::color::{ColorPalette, SampleNormalizer};
use crate::config::{
    check_midi_channel, check_midi_value, check_octave, check_velocity, AppConfig,
    ChannelSettings, InstrumentSettings,
};
use crate::engine::backend::{Peripherals, TimeSource};
use crate::engine::midi::{all_notes_off, ALL_NOTES_OFF_CONTROLLER};
use crate::engine::pipeline::ColorPipeline;
use crate::engine::scheduler::{ChannelRead, ChannelScheduler, TickReport};
use crate::error::{
    log_calibration_error, log_instrument_error, log_storage_error, CalibrationError,
    InstrumentError,
};
use crate::input::{InputConsumer, InputEvent, InputProducer, InputQueue};
use crate::managers::CalibrationManager;
use crate::scale::{ScaleDefinition, ScaleKind};
use crate::storage::ProfileStorage;
use crate::telemetry::{DiagnosticError, TelemetryHub, TelemetrySnapshot};

/// Summary of one loop iteration.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LoopReport {
    pub timestamp_ms: u64,
    pub events_handled: usize,
    pub panicked: bool,
    pub tick: TickReport,
    /// Result of the calibration run executed this iteration, if any
    pub calibration: Option<Result<CalibrationOutcome, CalibrationError>>,
}

/// InstrumentHandle orchestrates scheduler, calibration, input and storage.
pub struct InstrumentHandle {
    config: AppConfig,
    io: Peripherals,
    storage: Box<dyn ProfileStorage>,
    time_source: Arc<dyn TimeSource>,
    pipeline: ColorPipeline,
    store: CalibrationStore,
    scheduler: ChannelScheduler,
    calibration: CalibrationManager,
    input: InputConsumer,
    settings: InstrumentSettings,
    telemetry: TelemetryHub,
}

impl InstrumentHandle {
    /// Build the instrument and hand back the producer side of its input queue.
    ///
    /// Channel settings, root note and scale come from storage when it holds
    /// a valid document, otherwise from `config`. Profiles are loaded per
    /// channel and fall back to defaults individually.
    pub fn new(
        config: AppConfig,
        palette: ColorPalette,
        io: Peripherals,
        storage: Box<dyn ProfileStorage>,
        time_source: Arc<dyn TimeSource>,
    ) -> Result<(Self, InputProducer), InstrumentError> {
        config.validate()?;
        if palette.is_empty() {
            return Err(InstrumentError::InvalidPalette {
                reason: "palette has no colors".to_string(),
            });
        }

        let channel_count = config.scheduler.channel_count;
        let settings = Self::resolve_settings(&config, storage.as_ref(), channel_count);

        let mut store = CalibrationStore::load(storage.as_ref(), channel_count, &palette);
        for profile in store.profiles_mut().iter_mut().filter(|p| !p.is_calibrated) {
            profile.normalize = config.calibration.normalize;
        }

        let pipeline = ColorPipeline::with_kind(
            palette,
            SampleNormalizer::new(config.calibration.clear_full_scale),
            settings.scale,
            settings.root_note,
        );
        let scheduler = ChannelScheduler::new(&config.scheduler, &settings.channels);
        let calibration = CalibrationManager::new(&config.calibration);
        let (producer, input) = InputQueue::new(config.instrument.input_queue_capacity);
        let telemetry = TelemetryHub::new(channel_count, 256);

        log::info!(
            "[Instrument] Ready: {} channels, {} scale, root {}",
            channel_count,
            settings.scale.display_name(),
            settings.root_note
        );

        let handle = Self {
            config,
            io,
            storage,
            time_source,
            pipeline,
            store,
            scheduler,
            calibration,
            input,
            settings,
            telemetry,
        };
        Ok((handle, producer))
    }

    fn resolve_settings(
        config: &AppConfig,
        storage: &dyn ProfileStorage,
        channel_count: usize,
    ) -> InstrumentSettings {
        let defaults = InstrumentSettings::from_config(&config.instrument, channel_count);
        if !storage.is_valid() {
            log::info!("[Storage] No valid settings stored, using configuration");
            return defaults;
        }

        match storage.load_settings() {
            Ok(stored) => match stored.validate() {
                Ok(()) => {
                    let channels = (0..channel_count)
                        .map(|i| stored.channels.get(i).copied().unwrap_or(defaults.channels[i]))
                        .collect();
                    InstrumentSettings {
                        channels,
                        root_note: stored.root_note,
                        scale: stored.scale,
                    }
                }
                Err(err) => {
                    log_instrument_error(&err, "stored settings");
                    defaults
                }
            },
            Err(err) => {
                log_storage_error(&err, "settings load");
                defaults
            }
        }
    }

    // ========================================================================
    // CONTROL LOOP
    // ========================================================================

    /// One cooperative iteration: input, panic, scheduler tick, calibration.
    pub fn run_once(&mut self) -> LoopReport {
        let now_ms = self.time_source.now_ms();

        let drained = self.input.drain();
        if drained.dropped > 0 {
            log::warn!("[Input] {} events dropped on overflow", drained.dropped);
            self.telemetry.record_dropped_input(drained.dropped);
        }

        let events_handled = drained.events.len();
        let mut panic_requested = false;
        for event in drained.events {
            if event == InputEvent::Panic {
                panic_requested = true;
            } else {
                self.handle_event(event);
            }
        }

        if panic_requested {
            self.panic();
        }

        let tick = self
            .scheduler
            .tick(now_ms, &mut self.io, &self.store, &self.pipeline);
        self.record_tick(&tick, now_ms);

        let calibration = self.run_calibration();
        if calibration.is_some() {
            let now_ms = self.time_source.now_ms();
            self.scheduler.reselect(now_ms, &mut self.io);
        }

        LoopReport {
            timestamp_ms: now_ms,
            events_handled,
            panicked: panic_requested,
            tick,
            calibration,
        }
    }

    fn handle_event(&mut self, event: InputEvent) {
        match event {
            InputEvent::Encoder { delta } => self.io.observer.on_encoder(delta),
            InputEvent::Panic => self.panic(),
            InputEvent::RequestCalibration { channel, target } => {
                if let Err(err) = self.request_calibration(channel, target) {
                    log_calibration_error(&err, "calibration request");
                    self.telemetry
                        .record_error(DiagnosticError::CalibrationRejected, err.to_string());
                }
            }
            InputEvent::CopyProfile { source, targets } => {
                if let Err(err) = self.copy_profile(source, &targets) {
                    log_calibration_error(&err, "profile copy");
                    self.telemetry
                        .record_error(DiagnosticError::CopyRejected, err.to_string());
                }
            }
            InputEvent::SetMidiChannel {
                channel,
                midi_channel,
            } => {
                let result = self.set_midi_channel(channel, midi_channel);
                self.report_setting(result, "set midi channel");
            }
            InputEvent::SetOctave { channel, octave } => {
                let result = self.set_octave(channel, octave);
                self.report_setting(result, "set octave");
            }
            InputEvent::SetVelocity { channel, velocity } => {
                let result = self.set_velocity(channel, velocity);
                self.report_setting(result, "set velocity");
            }
            InputEvent::SetRootNote { root_note } => {
                let result = self.set_root_note(root_note);
                self.report_setting(result, "set root note");
            }
            InputEvent::SelectScale { scale } => {
                let result = self.select_scale(scale);
                self.report_setting(result, "select scale");
            }
        }
    }

    fn report_setting(&self, result: Result<(), InstrumentError>, context: &str) {
        if let Err(err) = result {
            log_instrument_error(&err, context);
            self.telemetry
                .record_error(DiagnosticError::InvalidSetting, err.to_string());
        }
    }

    fn record_tick(&self, tick: &TickReport, now_ms: u64) {
        if let Some(read) = &tick.read {
            let color = match read {
                ChannelRead::Emitted { transition, .. } => self.pipeline.color_name(transition.slot),
                _ => "",
            };
            self.telemetry.record_read(read, color, now_ms);
        }
        if tick.round_completed {
            self.telemetry.record_round(now_ms);
        }
    }

    fn run_calibration(&mut self) -> Option<Result<CalibrationOutcome, CalibrationError>> {
        let request = self.calibration.pending()?;
        let result = self.calibration.run_pending(
            &mut self.io,
            &mut self.store,
            &self.pipeline,
            self.storage.as_mut(),
        )?;

        let detail = result.as_ref().err().map(|err| err.to_string());
        self.telemetry
            .record_calibration(request.channel, request.target, detail);
        Some(result)
    }

    // ========================================================================
    // DIRECT OPERATIONS
    // ========================================================================

    /// All-notes-off on every MIDI channel
    ///
    /// Runtime state is left as is, so the next color change still turns off
    /// the note the channel believes is sounding.
    pub fn panic(&mut self) {
        all_notes_off(self.io.midi.as_mut());
        self.io.observer.on_panic();
        self.telemetry.record_panic(self.time_source.now_ms());
        log::info!("[Instrument] Panic: all notes off");
    }

    /// Queue a calibration run; it executes during the next `run_once`
    pub fn request_calibration(
        &mut self,
        channel: usize,
        target: CalibrationTarget,
    ) -> Result<(), CalibrationError> {
        self.calibration.request(channel, target, &self.store)
    }

    /// Copy one channel's calibration onto others and persist the targets
    pub fn copy_profile(&mut self, source: usize, targets: &[usize]) -> Result<(), CalibrationError> {
        self.store.copy_profile(source, targets)?;
        for &target in targets.iter().filter(|&&t| t != source) {
            if let Err(err) = self.store.persist(target, self.storage.as_mut()) {
                log_storage_error(&err, "profile copy write-back");
                self.telemetry
                    .record_error(DiagnosticError::StorageWrite, err.to_string());
            }
        }
        Ok(())
    }

    /// Reassign a channel's MIDI output channel
    ///
    /// Notes still sounding on the old channel are cut with All Notes Off.
    pub fn set_midi_channel(&mut self, channel: usize, midi_channel: u8) -> Result<(), InstrumentError> {
        check_midi_channel(midi_channel)?;
        let previous = self.channel_settings(channel)?.midi_channel;
        if previous != midi_channel {
            self.io
                .midi
                .control_change(ALL_NOTES_OFF_CONTROLLER, 0, previous);
        }
        self.update_channel(channel, |s| s.midi_channel = midi_channel)
    }

    pub fn set_octave(&mut self, channel: usize, octave: u8) -> Result<(), InstrumentError> {
        check_octave(octave)?;
        self.update_channel(channel, |s| s.octave = octave)
    }

    pub fn set_velocity(&mut self, channel: usize, velocity: u8) -> Result<(), InstrumentError> {
        check_velocity(velocity)?;
        self.update_channel(channel, |s| s.velocity = velocity)
    }

    pub fn set_root_note(&mut self, root_note: u8) -> Result<(), InstrumentError> {
        check_midi_value("root_note", root_note)?;
        self.pipeline.set_root_note(root_note);
        self.settings.root_note = root_note;
        self.persist_settings();
        Ok(())
    }

    pub fn select_scale(&mut self, kind: ScaleKind) -> Result<(), InstrumentError> {
        let scale = ScaleDefinition::for_kind(kind, self.pipeline.palette());
        self.pipeline.set_scale(scale)?;
        self.settings.scale = kind;
        self.persist_settings();
        log::info!("[Instrument] Scale set to {}", kind.display_name());
        Ok(())
    }

    fn channel_settings(&self, channel: usize) -> Result<ChannelSettings, InstrumentError> {
        self.settings
            .channels
            .get(channel)
            .copied()
            .ok_or(InstrumentError::InvalidChannel {
                channel,
                channel_count: self.settings.channels.len(),
            })
    }

    fn update_channel(
        &mut self,
        channel: usize,
        apply: impl FnOnce(&mut ChannelSettings),
    ) -> Result<(), InstrumentError> {
        let mut updated = self.channel_settings(channel)?;
        apply(&mut updated);

        self.settings.channels[channel] = updated;
        if let Some(voice) = self.scheduler.voice_mut(channel) {
            voice.set_settings(updated);
        }
        self.persist_settings();
        Ok(())
    }

    fn persist_settings(&mut self) {
        if let Err(err) = self.storage.save_settings(&self.settings) {
            log_storage_error(&err, "settings write-back");
            self.telemetry
                .record_error(DiagnosticError::StorageWrite, err.to_string());
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn settings(&self) -> &InstrumentSettings {
        &self.settings
    }

    pub fn store(&self) -> &CalibrationStore {
        &self.store
    }

    pub fn scheduler(&self) -> &ChannelScheduler {
        &self.scheduler
    }

    pub fn pipeline(&self) -> &ColorPipeline {
        &self.pipeline
    }

    pub fn calibration(&self) -> &CalibrationManager {
        &self.calibration
    }

    pub fn storage(&self) -> &dyn ProfileStorage {
        self.storage.as_ref()
    }

    pub fn telemetry(&self) -> TelemetrySnapshot {
        self.telemetry.snapshot()
    }

    pub fn now_ms(&self) -> u64 {
        self.time_source.now_ms()
    }
}
