//! UI Builder module for creating keyboards and formatting messages
//!
//! Every message is assembled from single-line Fluent messages joined by
//! blank lines, and is sent with HTML parse mode.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};
use teloxide::utils::html;

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::dialogue::{CsvJob, GeneratorState};
use crate::errors::{ConversionError, FieldError, GenerationError};
use crate::generator::{GenerationJob, Mode, NUMBER_DIGITS_LEN};

// Callback data of the inline buttons
pub const CALLBACK_GENERATE: &str = "generate";
pub const CALLBACK_CANCEL_GENERATION: &str = "cancel_gen";
pub const CALLBACK_CSV_DEFAULT: &str = "csv_use_default";
pub const CALLBACK_CSV_RENAME: &str = "csv_rename";
pub const CALLBACK_CSV_CANCEL: &str = "csv_cancel";

fn join(parts: &[String]) -> String {
    parts.join("\n\n")
}

/// Format a count with thousands separators, `12345` becomes `12,345`
pub fn format_count(count: usize) -> String {
    let digits = count.to_string();
    let mut result = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            result.push(',');
        }
        result.push(c);
    }
    result
}

/// Format a byte size as megabytes with two decimals
pub fn format_megabytes(bytes: u64) -> String {
    format!("{:.2}", bytes as f64 / (1024.0 * 1024.0))
}

fn hashes() -> String {
    "#".repeat(NUMBER_DIGITS_LEN)
}

/// Greeting sent by `/start` and `/batch`, ending with the first prompt
pub fn welcome_message(mode: Mode, language_code: Option<&str>) -> String {
    let (title, description) = match mode {
        Mode::Single => ("welcome-single-title", "welcome-single-description"),
        Mode::Batch => ("welcome-batch-title", "welcome-batch-description"),
    };
    join(&[
        t_lang(title, language_code),
        t_lang(description, language_code),
        t_lang("step-1-prompt", language_code),
        t_lang("step-1-example", language_code),
        t_lang("cancel-hint", language_code),
    ])
}

fn step_three_prompt(mode: Mode, language_code: Option<&str>) -> [String; 2] {
    match mode {
        Mode::Single => [
            t_lang("step-3-prompt", language_code),
            t_lang("step-3-example", language_code),
        ],
        Mode::Batch => [
            t_lang("step-3-batch-prompt", language_code),
            t_lang("step-3-batch-example", language_code),
        ],
    }
}

/// Acknowledgement of the previous answer followed by the prompt for `state`.
///
/// Returns `None` for states outside the five-step flow.
pub fn next_step_message(state: &GeneratorState, language_code: Option<&str>) -> Option<String> {
    let parts = match state {
        GeneratorState::AwaitingPrefix { mode } => {
            return Some(welcome_message(*mode, language_code));
        }
        GeneratorState::AwaitingMid { prefix, .. } => vec![
            t_args_lang("step-1-complete", &[("prefix", prefix)], language_code),
            t_lang("step-2-prompt", language_code),
            t_lang("step-2-example", language_code),
        ],
        GeneratorState::AwaitingSeries { mode, prefix, mid } => {
            let pattern = format!("{prefix}{mid}XX{}", hashes());
            let [prompt, example] = step_three_prompt(*mode, language_code);
            vec![
                t_args_lang("step-2-complete", &[("mid", mid)], language_code),
                t_args_lang("current-format", &[("pattern", &pattern)], language_code),
                prompt,
                example,
            ]
        }
        GeneratorState::AwaitingStart {
            mode,
            prefix,
            mid,
            series,
        } => {
            let (complete, pattern) = match mode {
                Mode::Single => {
                    let series = series.first().map(String::as_str).unwrap_or_default();
                    (
                        t_args_lang("step-3-complete", &[("series", series)], language_code),
                        format!("{prefix}{mid}{series}{}", hashes()),
                    )
                }
                Mode::Batch => {
                    let count = series.len().to_string();
                    (
                        t_args_lang(
                            "step-3-batch-complete",
                            &[("series", &series.join(", ")), ("count", &count)],
                            language_code,
                        ),
                        format!("{prefix}{mid}[SERIES]{}", hashes()),
                    )
                }
            };
            vec![
                complete,
                t_args_lang("current-format", &[("pattern", &pattern)], language_code),
                t_lang("step-4-prompt", language_code),
                t_lang("step-4-example", language_code),
            ]
        }
        GeneratorState::AwaitingEnd { start, .. } => {
            let start = format!("{start:04}");
            vec![
                t_args_lang("step-4-complete", &[("start", &start)], language_code),
                t_lang("step-5-prompt", language_code),
                t_lang("step-5-example", language_code),
            ]
        }
        _ => return None,
    };
    Some(join(&parts))
}

/// Error reply for a rejected answer; the prompt of the current step is repeated
pub fn rejection_message(
    state: &GeneratorState,
    error: &GenerationError,
    language_code: Option<&str>,
) -> String {
    let example = match state.step() {
        Some(1) => "AB",
        Some(2) => "12",
        Some(3) => "CD",
        Some(4) => "0001",
        _ => "1000",
    };

    match error {
        GenerationError::Range { start, end } => join(&[
            t_lang("invalid-range-title", language_code),
            t_args_lang(
                "invalid-range",
                &[("start", &format!("{start:04}")), ("end", &format!("{end:04}"))],
                language_code,
            ),
        ]),
        GenerationError::Validation(field) => {
            let detail = match field {
                FieldError::Letters { expected } => t_args_lang(
                    "invalid-letters",
                    &[("count", &expected.to_string()), ("example", example)],
                    language_code,
                ),
                FieldError::Digits { expected } => t_args_lang(
                    "invalid-digits",
                    &[("count", &expected.to_string()), ("example", example)],
                    language_code,
                ),
                FieldError::NoSeries => t_lang("invalid-no-series", language_code),
                FieldError::TooManySeries { count, max } => t_args_lang(
                    "invalid-too-many-series",
                    &[("count", &count.to_string()), ("max", &max.to_string())],
                    language_code,
                ),
            };
            join(&[t_lang("invalid-input-title", language_code), detail])
        }
    }
}

/// Summary shown before generation when confirmation is enabled
pub fn summary_message(job: &GenerationJob, language_code: Option<&str>) -> String {
    let (first, last) = job.first_and_last();
    let series = job.series().join(", ");
    let lines = [
        t_args_lang("summary-format", &[("pattern", &job.pattern())], language_code),
        t_args_lang(
            "summary-series",
            &[("series", &series), ("count", &job.series().len().to_string())],
            language_code,
        ),
        t_args_lang(
            "summary-range",
            &[
                ("start", &format!("{:04}", job.start())),
                ("end", &format!("{:04}", job.end())),
            ],
            language_code,
        ),
        t_args_lang("summary-total", &[("count", &format_count(job.total()))], language_code),
    ]
    .join("\n");

    join(&[
        t_lang("summary-title", language_code),
        lines,
        t_args_lang("summary-examples", &[("first", &first), ("last", &last)], language_code),
        t_lang("summary-question", language_code),
    ])
}

/// Generate / Cancel buttons under the summary
pub fn create_confirmation_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![vec![
        InlineKeyboardButton::callback(t_lang("button-generate", language_code), CALLBACK_GENERATE),
        InlineKeyboardButton::callback(
            t_lang("button-cancel", language_code),
            CALLBACK_CANCEL_GENERATION,
        ),
    ]])
}

/// Caption attached to the generated document
pub fn generation_caption(job: &GenerationJob, size_bytes: u64, language_code: Option<&str>) -> String {
    let mut lines = vec![
        t_lang("caption-title", language_code),
        t_args_lang("caption-total", &[("count", &format_count(job.total()))], language_code),
        t_args_lang("caption-format", &[("pattern", &job.pattern())], language_code),
    ];
    if job.mode() == Mode::Batch {
        lines.push(t_args_lang(
            "caption-series",
            &[("series", &job.series().join(", "))],
            language_code,
        ));
    }
    lines.push(t_args_lang(
        "caption-range",
        &[
            ("start", &format!("{:04}", job.start())),
            ("end", &format!("{:04}", job.end())),
        ],
        language_code,
    ));
    lines.push(t_args_lang(
        "caption-size",
        &[("size", &format_megabytes(size_bytes))],
        language_code,
    ));
    lines.join("\n")
}

/// Closing message after the document was delivered
pub fn completion_message(job: &GenerationJob, language_code: Option<&str>) -> String {
    let count = format_count(job.total());
    match job.mode() {
        Mode::Single => t_args_lang("generation-complete", &[("count", &count)], language_code),
        Mode::Batch => t_args_lang(
            "batch-complete",
            &[("count", &count), ("series", &job.series().len().to_string())],
            language_code,
        ),
    }
}

/// Usage text for `/help`
pub fn help_message(language_code: Option<&str>) -> String {
    let commands = ["help-start", "help-batch", "help-txt2csv", "help-help", "help-cancel"]
        .iter()
        .map(|key| t_lang(key, language_code))
        .collect::<Vec<_>>()
        .join("\n");

    join(&[
        t_lang("help-title", language_code),
        t_lang("help-format", language_code),
        t_lang("help-example", language_code),
        t_lang("help-csv", language_code),
        format!("{}\n{}", t_lang("help-commands", language_code), commands),
    ])
}

/// Introduction sent by `/txt2csv`
pub fn csv_intro_message(language_code: Option<&str>) -> String {
    join(&[
        t_lang("csv-title", language_code),
        t_lang("csv-description", language_code),
        t_lang("csv-upload-prompt", language_code),
    ])
}

/// Conversion summary with the rename question
pub fn csv_converted_message(job: &CsvJob, language_code: Option<&str>) -> String {
    let stats = [
        t_args_lang("csv-records", &[("count", &format_count(job.records))], language_code),
        t_lang("csv-format", language_code),
        t_args_lang("csv-size", &[("size", &format_megabytes(job.csv_bytes))], language_code),
    ]
    .join("\n");

    join(&[
        t_lang("csv-converted-title", language_code),
        stats,
        t_args_lang(
            "csv-default-name",
            &[("name", &html::escape(&job.default_name))],
            language_code,
        ),
        t_lang("csv-rename-question", language_code),
    ])
}

/// Default name / Rename / Cancel buttons after a conversion
pub fn create_csv_choice_keyboard(language_code: Option<&str>) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(vec![
        vec![
            InlineKeyboardButton::callback(
                t_lang("button-csv-default", language_code),
                CALLBACK_CSV_DEFAULT,
            ),
            InlineKeyboardButton::callback(
                t_lang("button-csv-rename", language_code),
                CALLBACK_CSV_RENAME,
            ),
        ],
        vec![InlineKeyboardButton::callback(
            t_lang("button-cancel", language_code),
            CALLBACK_CSV_CANCEL,
        )],
    ])
}

/// Caption attached to the converted CSV
pub fn csv_caption(job: &CsvJob, file_name: &str, language_code: Option<&str>) -> String {
    [
        t_lang("csv-converted-title", language_code),
        t_args_lang("csv-records", &[("count", &format_count(job.records))], language_code),
        t_args_lang("csv-filename", &[("name", &html::escape(file_name))], language_code),
        t_args_lang("csv-size", &[("size", &format_megabytes(job.csv_bytes))], language_code),
    ]
    .join("\n")
}

/// User-facing explanation of a failed conversion
pub fn conversion_error_message(
    error: &ConversionError,
    max_upload_bytes: u64,
    language_code: Option<&str>,
) -> String {
    match error {
        ConversionError::EmptyInput => t_lang("csv-empty", language_code),
        ConversionError::NoRecords => t_lang("csv-no-records", language_code),
        ConversionError::InvalidEncoding => t_lang("csv-invalid-encoding", language_code),
        ConversionError::NotText => t_lang("csv-not-text", language_code),
        ConversionError::TooLarge { .. } => t_args_lang(
            "csv-too-large",
            &[("max", &format!("{}", max_upload_bytes / (1024 * 1024)))],
            language_code,
        ),
        ConversionError::Io(_) | ConversionError::Csv(_) => t_lang("csv-error", language_code),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1,000");
        assert_eq!(format_count(500_000), "500,000");
        assert_eq!(format_count(1_234_567), "1,234,567");
    }

    #[test]
    fn test_format_megabytes() {
        assert_eq!(format_megabytes(0), "0.00");
        assert_eq!(format_megabytes(1024 * 1024), "1.00");
        assert_eq!(format_megabytes(110_000), "0.10");
    }

    #[test]
    fn test_next_step_message_shows_pattern() {
        let state = GeneratorState::AwaitingStart {
            mode: Mode::Batch,
            prefix: "AB".to_string(),
            mid: "12".to_string(),
            series: vec!["CD".to_string(), "EF".to_string()],
        };
        let message = next_step_message(&state, Some("en")).unwrap();
        assert!(message.contains("AB12[SERIES]####"));
        assert!(message.contains("CD, EF"));
        assert!(next_step_message(&GeneratorState::Idle, Some("en")).is_none());
    }

    #[test]
    fn test_rejection_message_uses_step_example() {
        let state = GeneratorState::AwaitingMid {
            mode: Mode::Single,
            prefix: "AB".to_string(),
        };
        let error = GenerationError::from(FieldError::Digits { expected: 2 });
        let message = rejection_message(&state, &error, Some("en"));
        assert!(message.contains("<code>12</code>"));

        let error = GenerationError::Range { start: 5, end: 3 };
        let message = rejection_message(&state, &error, Some("en"));
        assert!(message.contains("0005"));
        assert!(message.contains("0003"));
    }

    #[test]
    fn test_confirmation_keyboard_callbacks() {
        let keyboard = create_confirmation_keyboard(Some("en"));
        assert_eq!(keyboard.inline_keyboard.len(), 1);
        assert_eq!(keyboard.inline_keyboard[0].len(), 2);
    }
}
