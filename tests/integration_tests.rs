//! End-to-end checks of the conversation, generator, writer and converter
//! working together, without a Telegram connection.

use std::io::Write;
use tempfile::NamedTempFile;
use vehicle_numbers::artifact::write_numbers;
use vehicle_numbers::bot::dialogue_manager::{cleanup_csv_job, prepare_csv_job};
use vehicle_numbers::csv_converter::sanitize_csv_name;
use vehicle_numbers::dialogue::{advance, start, FlowOptions, GeneratorState, Transition};
use vehicle_numbers::errors::ConversionError;
use vehicle_numbers::generator::{GenerationJob, Mode};

fn run_conversation(mode: Mode, answers: &[&str], options: &FlowOptions) -> Transition {
    let mut state: GeneratorState = start(mode);
    let (last, rest) = answers.split_last().expect("at least one answer");
    for answer in rest {
        state = match advance(&state, answer, options) {
            Transition::Advanced(next) => next,
            other => panic!("unexpected transition for {answer:?}: {other:?}"),
        };
    }
    advance(&state, last, options)
}

fn completed(transition: Transition) -> GenerationJob {
    match transition {
        Transition::Completed(job) => job,
        other => panic!("expected a completed conversation, got {other:?}"),
    }
}

/// The reference example: ab / 12 / cd / 0001 / 0050
#[test]
fn test_conversation_to_file_workflow() {
    let options = FlowOptions::default();
    let job = completed(run_conversation(
        Mode::Single,
        &["ab", "12", "cd", "0001", "0050"],
        &options,
    ));
    assert_eq!(job.file_name(), "vehicle_numbers_AB12CD.txt");

    let artifact = write_numbers(job.numbers()).unwrap();
    let content = std::fs::read_to_string(artifact.path()).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines.len(), 50);
    assert_eq!(lines.first(), Some(&"AB12CD0001"));
    assert_eq!(lines.last(), Some(&"AB12CD0050"));

    let path = artifact.path().to_path_buf();
    artifact.remove().unwrap();
    assert!(!path.exists());
}

#[test]
fn test_batch_conversation_to_file_workflow() {
    let options = FlowOptions::default();
    let job = completed(run_conversation(
        Mode::Batch,
        &["ab", "12", "CD,EF", "0001", "0003"],
        &options,
    ));

    let artifact = write_numbers(job.numbers()).unwrap();
    assert_eq!(artifact.line_count(), 6);
    let content = std::fs::read_to_string(artifact.path()).unwrap();
    assert_eq!(
        content,
        "AB12CD0001\nAB12CD0002\nAB12CD0003\nAB12EF0001\nAB12EF0002\nAB12EF0003\n"
    );
}

#[test]
fn test_confirmation_defers_generation() {
    let options = FlowOptions {
        confirm_before_generate: true,
        ..FlowOptions::default()
    };
    match run_conversation(Mode::Single, &["ab", "12", "cd", "0001", "0002"], &options) {
        Transition::Confirm(job) => {
            let state = GeneratorState::AwaitingConfirmation { job };
            // Free text does not bypass the buttons
            assert_eq!(advance(&state, "0002", &options), Transition::Ignored);
        }
        other => panic!("expected confirmation, got {other:?}"),
    }
}

#[test]
fn test_full_range_stays_in_order() {
    let options = FlowOptions::default();
    let job = completed(run_conversation(
        Mode::Single,
        &["zz", "99", "yy", "0000", "9999"],
        &options,
    ));
    assert_eq!(job.total(), 10_000);
    for (n, plate) in job.numbers().enumerate() {
        assert_eq!(plate, format!("ZZ99YY{n:04}"));
    }
}

#[test]
fn test_txt_to_csv_workflow() {
    let mut source = NamedTempFile::new().unwrap();
    writeln!(source, "CG13AA0010 - 7389247318").unwrap();
    writeln!(source, "broken line").unwrap();
    writeln!(source, "CG13AA0011 - 7389247319 - extra").unwrap();
    let (_, source_path) = source.keep().unwrap();

    let job = prepare_csv_job(source_path, "Contacts.TXT").unwrap();
    assert_eq!(job.records, 2);
    assert_eq!(job.default_name, "Contacts.csv");

    let csv = std::fs::read_to_string(&job.csv_path).unwrap();
    assert_eq!(
        csv,
        "Number,Vehicle Number\n7389247318,CG13AA0010\n7389247319,CG13AA0011\n"
    );
    assert_eq!(sanitize_csv_name("march report"), Some("march report.csv".to_string()));

    cleanup_csv_job(&job);
    assert!(!job.csv_path.exists());
}

#[test]
fn test_txt_to_csv_empty_upload() {
    let source = NamedTempFile::new().unwrap();
    let err = prepare_csv_job(source.path().to_path_buf(), "empty.txt").unwrap_err();
    assert!(matches!(err, ConversionError::EmptyInput));
    assert!(err.is_recoverable());
}

#[test]
fn test_txt_to_csv_non_utf8_upload_keeps_converter_waiting() {
    let mut source = NamedTempFile::new().unwrap();
    source
        .write_all(b"CG13AA0010 - 7389247318\n\xff\xfe caf\xe9 - 1\n")
        .unwrap();

    let err = prepare_csv_job(source.path().to_path_buf(), "latin1.txt").unwrap_err();
    assert!(matches!(err, ConversionError::InvalidEncoding));
    assert!(err.is_recoverable());
}

/// Conversations of different chats do not share anything
#[tokio::test]
async fn test_concurrent_user_workflows() {
    let handles: Vec<_> = ["aa", "bb", "cc", "dd"]
        .into_iter()
        .map(|series| {
            tokio::spawn(async move {
                let options = FlowOptions::default();
                let job = completed(run_conversation(
                    Mode::Single,
                    &["ab", "12", series, "0001", "0100"],
                    &options,
                ));
                let artifact = write_numbers(job.numbers()).unwrap();
                let content = std::fs::read_to_string(artifact.path()).unwrap();
                (series.to_uppercase(), content)
            })
        })
        .collect();

    for handle in handles {
        let (series, content) = handle.await.unwrap();
        assert_eq!(content.lines().count(), 100);
        assert!(content.lines().all(|line| line[4..6] == series));
    }
}
