use serde::Serialize;

use crate::engine::midi::MidiMessage;
use crate::fixtures::{FixtureRun, FixtureSpec};

/// A round whose MIDI differs from the script's expectation
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureMismatch {
    pub round: usize,
    pub message: String,
    pub expected: Vec<MidiMessage>,
    pub observed: Vec<MidiMessage>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FixtureValidation {
    pub id: String,
    pub rounds_checked: usize,
    pub mismatches: Vec<FixtureMismatch>,
}

impl FixtureValidation {
    pub fn has_mismatches(&self) -> bool {
        !self.mismatches.is_empty()
    }
}

/// Compare each checked round's MIDI with the run
pub fn verify(spec: &FixtureSpec, run: &FixtureRun) -> FixtureValidation {
    let mut rounds_checked = 0;
    let mut mismatches = Vec::new();

    for (index, round) in spec.rounds.iter().enumerate() {
        let Some(expected) = &round.expected_midi else {
            continue;
        };
        rounds_checked += 1;

        let observed = run
            .rounds
            .get(index)
            .map(|record| record.midi.clone())
            .unwrap_or_default();
        if *expected == observed {
            continue;
        }

        let message = match expected
            .iter()
            .zip(&observed)
            .position(|(e, o)| e != o)
        {
            Some(at) => format!("round {} differs at message {}", index, at),
            None => format!(
                "round {} produced {} messages (expected {})",
                index,
                observed.len(),
                expected.len()
            ),
        };
        mismatches.push(FixtureMismatch {
            round: index,
            message,
            expected: expected.clone(),
            observed,
        });
    }

    FixtureValidation {
        id: spec.id.clone(),
        rounds_checked,
        mismatches,
    }
}
