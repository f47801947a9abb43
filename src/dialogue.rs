//! Conversation state machine for collecting the five generator fields.
//!
//! Transitions are pure functions of the current state and the user's text,
//! so the flow can be exercised without a Telegram connection. The bot layer
//! stores the state per chat and performs the side effects.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};

use crate::errors::GenerationError;
use crate::generator::{
    parse_letters, parse_mid_digits, parse_number, parse_series_list, GenerationJob, Mode,
};

/// Files and figures of a finished TXT to CSV conversion awaiting delivery
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CsvJob {
    pub source_path: PathBuf,
    pub csv_path: PathBuf,
    pub default_name: String,
    pub records: usize,
    pub csv_bytes: u64,
}

impl CsvJob {
    /// Paths of the temporary files owned by this job
    pub fn paths(&self) -> [&PathBuf; 2] {
        [&self.source_path, &self.csv_path]
    }
}

/// Represents the conversation state of one chat
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeneratorState {
    /// No conversation started yet, free text is ignored
    #[default]
    Idle,
    AwaitingPrefix {
        mode: Mode,
    },
    AwaitingMid {
        mode: Mode,
        prefix: String,
    },
    AwaitingSeries {
        mode: Mode,
        prefix: String,
        mid: String,
    },
    AwaitingStart {
        mode: Mode,
        prefix: String,
        mid: String,
        series: Vec<String>,
    },
    AwaitingEnd {
        mode: Mode,
        prefix: String,
        mid: String,
        series: Vec<String>,
        start: u32,
    },
    AwaitingConfirmation {
        job: GenerationJob,
    },
    AwaitingCsvUpload,
    AwaitingCsvChoice {
        job: CsvJob,
    },
    AwaitingCsvName {
        job: CsvJob,
    },
    /// Cancelled by the user, free text is ignored until a new command
    Cancelled,
}

impl GeneratorState {
    /// One-based step number of the generator flow, if in it
    pub fn step(&self) -> Option<u8> {
        match self {
            GeneratorState::AwaitingPrefix { .. } => Some(1),
            GeneratorState::AwaitingMid { .. } => Some(2),
            GeneratorState::AwaitingSeries { .. } => Some(3),
            GeneratorState::AwaitingStart { .. } => Some(4),
            GeneratorState::AwaitingEnd { .. } => Some(5),
            _ => None,
        }
    }

    /// Temporary CSV job owned by this state, if any
    pub fn csv_job(&self) -> Option<&CsvJob> {
        match self {
            GeneratorState::AwaitingCsvChoice { job } | GeneratorState::AwaitingCsvName { job } => {
                Some(job)
            }
            _ => None,
        }
    }
}

/// Type alias for the per-chat dialogue
pub type GeneratorDialogue = Dialogue<GeneratorState, InMemStorage<GeneratorState>>;

/// Options that change the shape of the flow
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FlowOptions {
    pub confirm_before_generate: bool,
    pub max_batch_series: usize,
}

impl Default for FlowOptions {
    fn default() -> Self {
        Self {
            confirm_before_generate: false,
            max_batch_series: crate::config::DEFAULT_MAX_BATCH_SERIES,
        }
    }
}

/// Result of feeding one text message to the state machine
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Transition {
    /// Field accepted, the conversation moves to the given state
    Advanced(GeneratorState),
    /// Field rejected, the conversation stays where it is
    Rejected(GenerationError),
    /// All fields collected and confirmation required
    Confirm(GenerationJob),
    /// All fields collected, generate now and reset
    Completed(GenerationJob),
    /// No generator step is active
    Ignored,
}

/// Initial state for `/start` and `/batch`
pub fn start(mode: Mode) -> GeneratorState {
    GeneratorState::AwaitingPrefix { mode }
}

/// State after `/cancel`, whatever the current state was
pub fn cancel() -> GeneratorState {
    GeneratorState::Cancelled
}

/// Apply one user answer to the current state
pub fn advance(state: &GeneratorState, input: &str, options: &FlowOptions) -> Transition {
    match state {
        GeneratorState::AwaitingPrefix { mode } => match parse_letters(input) {
            Ok(prefix) => Transition::Advanced(GeneratorState::AwaitingMid {
                mode: *mode,
                prefix,
            }),
            Err(e) => Transition::Rejected(e.into()),
        },
        GeneratorState::AwaitingMid { mode, prefix } => match parse_mid_digits(input) {
            Ok(mid) => Transition::Advanced(GeneratorState::AwaitingSeries {
                mode: *mode,
                prefix: prefix.clone(),
                mid,
            }),
            Err(e) => Transition::Rejected(e.into()),
        },
        GeneratorState::AwaitingSeries { mode, prefix, mid } => {
            let series = match mode {
                Mode::Single => parse_letters(input).map(|series| vec![series]),
                Mode::Batch => parse_series_list(input, options.max_batch_series),
            };
            match series {
                Ok(series) => Transition::Advanced(GeneratorState::AwaitingStart {
                    mode: *mode,
                    prefix: prefix.clone(),
                    mid: mid.clone(),
                    series,
                }),
                Err(e) => Transition::Rejected(e.into()),
            }
        }
        GeneratorState::AwaitingStart {
            mode,
            prefix,
            mid,
            series,
        } => match parse_number(input) {
            Ok(start) => Transition::Advanced(GeneratorState::AwaitingEnd {
                mode: *mode,
                prefix: prefix.clone(),
                mid: mid.clone(),
                series: series.clone(),
                start,
            }),
            Err(e) => Transition::Rejected(e.into()),
        },
        GeneratorState::AwaitingEnd {
            mode,
            prefix,
            mid,
            series,
            start,
        } => {
            let end = match parse_number(input) {
                Ok(end) => end,
                Err(e) => return Transition::Rejected(e.into()),
            };
            match GenerationJob::build(*mode, prefix, mid, series, *start, end) {
                Ok(job) if options.confirm_before_generate => Transition::Confirm(job),
                Ok(job) => Transition::Completed(job),
                Err(e) => Transition::Rejected(e),
            }
        }
        GeneratorState::Idle
        | GeneratorState::Cancelled
        | GeneratorState::AwaitingConfirmation { .. }
        | GeneratorState::AwaitingCsvUpload
        | GeneratorState::AwaitingCsvChoice { .. }
        | GeneratorState::AwaitingCsvName { .. } => Transition::Ignored,
    }
}
