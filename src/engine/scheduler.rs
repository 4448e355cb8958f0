// ChannelScheduler - cooperative round-robin polling of the sensing channels
//
// Phases:
//   Waiting                     between rounds, until round_interval_ms has
//                               passed since the previous round started
//   Selecting { channel, since } bus switched, waiting settle_ms
//
// The tick whose settle guard passes also performs READING (poll, normalize,
// classify, emit) and ADVANCE (select the next channel, or disable the bus
// and return to Waiting after the last one). A tick never sleeps.

use crate::calibration::CalibrationStore;
use crate::color::SlotIndex;
use crate::config::{ChannelSettings, SchedulerConfig};
use crate::engine::backend::Peripherals;
use crate::engine::pipeline::ColorPipeline;
use crate::engine::voice::{ChannelRuntimeState, NoteTransition};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerPhase {
    Waiting,
    Selecting { channel: usize, since: u64 },
}

/// What happened on a channel during READING
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelRead {
    /// Sensor unavailable; runtime state untouched
    Skipped { channel: usize },
    /// Read succeeded but produced no MIDI traffic
    Unchanged {
        channel: usize,
        slot: Option<SlotIndex>,
    },
    Emitted {
        channel: usize,
        transition: NoteTransition,
    },
}

/// Outcome of one scheduler tick
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TickReport {
    pub read: Option<ChannelRead>,
    /// The last channel of a round was just read and the bus disabled
    pub round_completed: bool,
}

pub struct ChannelScheduler {
    phase: SchedulerPhase,
    settle_ms: u64,
    round_interval_ms: u64,
    last_round_start: Option<u64>,
    voices: Vec<ChannelRuntimeState>,
}

impl ChannelScheduler {
    /// One voice per entry of `settings`
    pub fn new(config: &SchedulerConfig, settings: &[ChannelSettings]) -> Self {
        Self {
            phase: SchedulerPhase::Waiting,
            settle_ms: config.settle_ms,
            round_interval_ms: config.round_interval_ms,
            last_round_start: None,
            voices: settings.iter().copied().map(ChannelRuntimeState::new).collect(),
        }
    }

    /// Advance the state machine by at most one channel read
    pub fn tick(
        &mut self,
        now_ms: u64,
        io: &mut Peripherals,
        store: &CalibrationStore,
        pipeline: &ColorPipeline,
    ) -> TickReport {
        if self.voices.is_empty() {
            return TickReport::default();
        }

        if self.phase == SchedulerPhase::Waiting {
            let due = self
                .last_round_start
                .map_or(true, |start| now_ms.saturating_sub(start) >= self.round_interval_ms);
            if !due {
                return TickReport::default();
            }
            self.last_round_start = Some(now_ms);
            self.enter_selecting(0, now_ms, io);
        }

        let SchedulerPhase::Selecting { channel, since } = self.phase else {
            return TickReport::default();
        };
        if now_ms.saturating_sub(since) < self.settle_ms {
            return TickReport::default();
        }

        let read = self.read_channel(channel, io, store, pipeline);

        let next = channel + 1;
        let round_completed = next >= self.voices.len();
        if round_completed {
            io.bus.disable_all();
            self.phase = SchedulerPhase::Waiting;
            tracing::debug!(channels = self.voices.len(), "[Scheduler] Round complete");
        } else {
            self.enter_selecting(next, now_ms, io);
        }

        TickReport {
            read: Some(read),
            round_completed,
        }
    }

    fn enter_selecting(&mut self, channel: usize, now_ms: u64, io: &mut Peripherals) {
        io.bus.select(channel);
        self.phase = SchedulerPhase::Selecting {
            channel,
            since: now_ms,
        };
    }

    fn read_channel(
        &mut self,
        channel: usize,
        io: &mut Peripherals,
        store: &CalibrationStore,
        pipeline: &ColorPipeline,
    ) -> ChannelRead {
        let reading = if io.sensor.is_available() {
            io.sensor.read()
        } else {
            None
        };
        let (Some(raw), Some(profile)) = (reading, store.profile(channel)) else {
            tracing::debug!(channel, "[Scheduler] Sensor unavailable, skipping");
            return ChannelRead::Skipped { channel };
        };

        let slot = pipeline.classify(&raw, profile);
        let Some(voice) = self.voices.get_mut(channel) else {
            return ChannelRead::Skipped { channel };
        };

        match voice.observe(slot, pipeline.mapper()) {
            Some(transition) => {
                for message in transition.messages() {
                    io.midi.send(message);
                }
                let color = pipeline.color_name(transition.slot);
                io.observer
                    .on_channel_update(channel, color, transition.note());
                tracing::debug!(
                    channel,
                    color,
                    note = transition.note(),
                    "[Scheduler] Color change"
                );
                ChannelRead::Emitted {
                    channel,
                    transition,
                }
            }
            None => ChannelRead::Unchanged { channel, slot },
        }
    }

    /// Re-select the channel being settled after something else used the bus
    ///
    /// Restarts the settle wait; a no-op between rounds.
    pub fn reselect(&mut self, now_ms: u64, io: &mut Peripherals) {
        if let SchedulerPhase::Selecting { channel, .. } = self.phase {
            self.enter_selecting(channel, now_ms, io);
        }
    }

    pub fn phase(&self) -> SchedulerPhase {
        self.phase
    }

    pub fn channel_count(&self) -> usize {
        self.voices.len()
    }

    pub fn voice(&self, channel: usize) -> Option<&ChannelRuntimeState> {
        self.voices.get(channel)
    }

    pub fn voice_mut(&mut self, channel: usize) -> Option<&mut ChannelRuntimeState> {
        self.voices.get_mut(channel)
    }

    pub fn voices(&self) -> &[ChannelRuntimeState] {
        &self.voices
    }
}

#[cfg(test)]
#[path = "scheduler_tests.rs"]
mod tests;
