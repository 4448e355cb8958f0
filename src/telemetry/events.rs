//! Telemetry event types describing what the control loop did, exposed to
//! the CLI and fixture reports.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationTarget;

/// Diagnostic error codes surfaced via telemetry metrics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticError {
    StorageWrite,
    InvalidSetting,
    CopyRejected,
    CalibrationRejected,
}

/// Metric events covering note traffic, scheduling and calibration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", content = "payload", rename_all = "snake_case")]
pub enum MetricEvent {
    NoteEmitted {
        channel: usize,
        color: String,
        note: u8,
        silence: bool,
        timestamp_ms: u64,
    },
    ChannelSkipped {
        channel: usize,
        timestamp_ms: u64,
    },
    RoundCompleted {
        round: u64,
        timestamp_ms: u64,
    },
    CalibrationFinished {
        channel: usize,
        target: CalibrationTarget,
        success: bool,
        detail: Option<String>,
    },
    Panic {
        timestamp_ms: u64,
    },
    InputDropped {
        count: u64,
    },
    Error {
        code: DiagnosticError,
        context: String,
    },
}

impl MetricEvent {
    /// Short label of the variant, matching its serialized tag
    pub fn kind(&self) -> &'static str {
        match self {
            MetricEvent::NoteEmitted { .. } => "note_emitted",
            MetricEvent::ChannelSkipped { .. } => "channel_skipped",
            MetricEvent::RoundCompleted { .. } => "round_completed",
            MetricEvent::CalibrationFinished { .. } => "calibration_finished",
            MetricEvent::Panic { .. } => "panic",
            MetricEvent::InputDropped { .. } => "input_dropped",
            MetricEvent::Error { .. } => "error",
        }
    }
}
