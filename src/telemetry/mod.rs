//! Telemetry collector for the control loop.
//!
//! The collector keeps a bounded history of metric events plus running
//! totals. Per-channel note counters sit next to it in `TelemetryHub`, which
//! is what `InstrumentHandle` owns.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use crate::calibration::CalibrationTarget;
use crate::engine::scheduler::ChannelRead;

pub mod events;

pub use events::{DiagnosticError, MetricEvent};

/// Snapshot of collector state for CLI reporting.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TelemetrySnapshot {
    pub recent: Vec<MetricEvent>,
    pub total_events: u64,
    pub dropped_events: u64,
    #[serde(default)]
    pub notes_per_channel: Vec<u64>,
    #[serde(default)]
    pub rounds_completed: u64,
}

/// Collector retaining a bounded history of metrics.
pub struct TelemetryCollector {
    history: Mutex<VecDeque<MetricEvent>>,
    history_capacity: usize,
    total_events: AtomicU64,
    dropped_history: AtomicU64,
}

impl TelemetryCollector {
    pub fn new(history_capacity: usize) -> Self {
        let history_capacity = history_capacity.max(1);
        Self {
            history: Mutex::new(VecDeque::with_capacity(history_capacity)),
            history_capacity,
            total_events: AtomicU64::new(0),
            dropped_history: AtomicU64::new(0),
        }
    }

    pub fn publish(&self, event: MetricEvent) {
        self.total_events.fetch_add(1, Ordering::Relaxed);
        let mut history = self.history();
        if history.len() == self.history_capacity {
            history.pop_front();
            self.dropped_history.fetch_add(1, Ordering::Relaxed);
        }
        history.push_back(event);
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        TelemetrySnapshot {
            recent: self.history().iter().cloned().collect(),
            total_events: self.total_events.load(Ordering::Relaxed),
            dropped_events: self.dropped_history.load(Ordering::Relaxed),
            notes_per_channel: Vec::new(),
            rounds_completed: 0,
        }
    }

    fn history(&self) -> MutexGuard<'_, VecDeque<MetricEvent>> {
        self.history.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new(256)
    }
}

/// Collector plus derived per-channel counters.
pub struct TelemetryHub {
    collector: TelemetryCollector,
    notes_per_channel: Mutex<Vec<u64>>,
    rounds_completed: AtomicU64,
}

impl TelemetryHub {
    pub fn new(channel_count: usize, history_capacity: usize) -> Self {
        Self {
            collector: TelemetryCollector::new(history_capacity),
            notes_per_channel: Mutex::new(vec![0; channel_count]),
            rounds_completed: AtomicU64::new(0),
        }
    }

    pub fn collector(&self) -> &TelemetryCollector {
        &self.collector
    }

    pub fn snapshot(&self) -> TelemetrySnapshot {
        let mut snapshot = self.collector.snapshot();
        snapshot.notes_per_channel = self.notes().clone();
        snapshot.rounds_completed = self.rounds_completed.load(Ordering::Relaxed);
        snapshot
    }

    /// Record the outcome of one scheduler read
    pub fn record_read(&self, read: &ChannelRead, color: &str, timestamp_ms: u64) {
        match read {
            ChannelRead::Emitted {
                channel,
                transition,
            } => {
                if let Some(count) = self.notes().get_mut(*channel) {
                    *count += 1;
                }
                self.collector.publish(MetricEvent::NoteEmitted {
                    channel: *channel,
                    color: color.to_string(),
                    note: transition.note(),
                    silence: transition.is_silence(),
                    timestamp_ms,
                });
            }
            ChannelRead::Skipped { channel } => {
                self.collector.publish(MetricEvent::ChannelSkipped {
                    channel: *channel,
                    timestamp_ms,
                });
            }
            ChannelRead::Unchanged { .. } => {}
        }
    }

    pub fn record_round(&self, timestamp_ms: u64) {
        let round = self.rounds_completed.fetch_add(1, Ordering::Relaxed) + 1;
        self.collector.publish(MetricEvent::RoundCompleted {
            round,
            timestamp_ms,
        });
    }

    pub fn record_calibration(
        &self,
        channel: usize,
        target: CalibrationTarget,
        error: Option<String>,
    ) {
        self.collector.publish(MetricEvent::CalibrationFinished {
            channel,
            target,
            success: error.is_none(),
            detail: error,
        });
    }

    pub fn record_panic(&self, timestamp_ms: u64) {
        self.collector.publish(MetricEvent::Panic { timestamp_ms });
    }

    pub fn record_dropped_input(&self, count: u64) {
        if count > 0 {
            self.collector.publish(MetricEvent::InputDropped { count });
        }
    }

    pub fn record_error(&self, code: DiagnosticError, context: impl Into<String>) {
        self.collector.publish(MetricEvent::Error {
            code,
            context: context.into(),
        });
    }

    fn notes(&self) -> MutexGuard<'_, Vec<u64>> {
        self.notes_per_channel
            .lock()
            .unwrap_or_else(|e| e.into_inner())
    }
}

impl Default for TelemetryHub {
    fn default() -> Self {
        Self::new(crate::config::MAX_CHANNELS, 256)
    }
}
