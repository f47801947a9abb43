use anyhow::Result;
use std::path::PathBuf;
use teloxide::dispatching::dialogue::{Dialogue, InMemStorage};
use teloxide::types::ChatId;
use tempfile::NamedTempFile;

use vehicle_numbers::dialogue::{
    advance, cancel, start, CsvJob, FlowOptions, GeneratorState, Transition,
};
use vehicle_numbers::bot::dialogue_manager::discard_pending_files;
use vehicle_numbers::errors::{FieldError, GenerationError};
use vehicle_numbers::generator::{GenerationJob, Mode};

fn answer(state: &GeneratorState, input: &str, options: &FlowOptions) -> GeneratorState {
    match advance(state, input, options) {
        Transition::Advanced(next) => next,
        other => panic!("expected {input:?} to be accepted, got {other:?}"),
    }
}

/// Walk the whole single-series conversation
#[tokio::test]
async fn test_single_conversation_reaches_done() -> Result<()> {
    let options = FlowOptions::default();

    let state = start(Mode::Single);
    let state = answer(&state, " ab ", &options);
    assert_eq!(
        state,
        GeneratorState::AwaitingMid {
            mode: Mode::Single,
            prefix: "AB".to_string()
        }
    );
    let state = answer(&state, "12", &options);
    let state = answer(&state, "cd", &options);
    let state = answer(&state, "0001", &options);

    match advance(&state, "0050", &options) {
        Transition::Completed(job) => {
            let numbers: Vec<String> = job.numbers().collect();
            assert_eq!(numbers.len(), 50);
            assert_eq!(numbers[0], "AB12CD0001");
            assert_eq!(numbers[49], "AB12CD0050");
        }
        other => panic!("expected completion, got {other:?}"),
    }

    Ok(())
}

/// Invalid answers re-prompt the same step
#[tokio::test]
async fn test_invalid_answers_are_rejected_at_each_step() -> Result<()> {
    let options = FlowOptions::default();
    let mut state = start(Mode::Single);

    for (bad, good) in [("A", "ab"), ("1a", "12"), ("c", "cd"), ("12a4", "0005")] {
        let transition = advance(&state, bad, &options);
        assert!(matches!(transition, Transition::Rejected(_)), "{bad:?} was accepted");
        state = answer(&state, good, &options);
    }

    assert_eq!(
        advance(&state, "0003", &options),
        Transition::Rejected(GenerationError::Range { start: 5, end: 3 })
    );
    assert_eq!(
        advance(&state, "003", &options),
        Transition::Rejected(FieldError::Digits { expected: 4 }.into())
    );
    assert!(matches!(advance(&state, "0005", &options), Transition::Completed(_)));

    Ok(())
}

/// Cancel is reachable from every state and silences free text
#[tokio::test]
async fn test_cancel_from_any_state() -> Result<()> {
    let options = FlowOptions::default();
    let mut state = start(Mode::Batch);

    for input in ["ab", "12", "cd ef", "0001"] {
        let cancelled = cancel();
        assert_eq!(advance(&cancelled, input, &options), Transition::Ignored);
        state = answer(&state, input, &options);
    }
    assert_eq!(state.step(), Some(5));

    Ok(())
}

fn kept_temp_file() -> Result<PathBuf> {
    let (_, path) = NamedTempFile::new()?.keep()?;
    Ok(path)
}

fn pending_csv_job() -> Result<CsvJob> {
    Ok(CsvJob {
        source_path: kept_temp_file()?,
        csv_path: kept_temp_file()?,
        default_name: "numbers.csv".to_string(),
        records: 1,
        csv_bytes: 10,
    })
}

/// Cancelling a pending conversion deletes both of its files
#[tokio::test]
async fn test_cancel_discards_pending_csv_files() -> Result<()> {
    let options = FlowOptions::default();

    for pending in [
        GeneratorState::AwaitingCsvChoice {
            job: pending_csv_job()?,
        },
        GeneratorState::AwaitingCsvName {
            job: pending_csv_job()?,
        },
    ] {
        let job = pending.csv_job().cloned().expect("state owns a job");
        assert!(job.source_path.exists() && job.csv_path.exists());

        let dialogue = Dialogue::new(InMemStorage::<GeneratorState>::new(), ChatId(1));
        dialogue.update(pending).await?;

        discard_pending_files(&dialogue).await?;
        dialogue.update(cancel()).await?;

        assert!(!job.source_path.exists());
        assert!(!job.csv_path.exists());
        let state = dialogue.get().await?.expect("state stored");
        assert_eq!(state, GeneratorState::Cancelled);
        assert_eq!(advance(&state, "report", &options), Transition::Ignored);
    }

    Ok(())
}

/// Cancelling a state without files leaves nothing behind and still cancels
#[tokio::test]
async fn test_cancel_from_confirmation() -> Result<()> {
    let options = FlowOptions {
        confirm_before_generate: true,
        ..FlowOptions::default()
    };
    let mut state = start(Mode::Single);
    for input in ["ab", "12", "cd", "0001"] {
        state = answer(&state, input, &options);
    }
    let job = match advance(&state, "0010", &options) {
        Transition::Confirm(job) => job,
        other => panic!("expected a confirmation, got {other:?}"),
    };

    let dialogue = Dialogue::new(InMemStorage::<GeneratorState>::new(), ChatId(2));
    dialogue
        .update(GeneratorState::AwaitingConfirmation { job })
        .await?;

    discard_pending_files(&dialogue).await?;
    dialogue.update(cancel()).await?;

    assert_eq!(dialogue.get().await?, Some(GeneratorState::Cancelled));
    assert_eq!(advance(&cancel(), "0010", &options), Transition::Ignored);

    Ok(())
}

#[tokio::test]
async fn test_batch_series_limit() -> Result<()> {
    let options = FlowOptions {
        max_batch_series: 2,
        ..FlowOptions::default()
    };
    let state = answer(&answer(&start(Mode::Batch), "ab", &options), "12", &options);

    assert_eq!(
        advance(&state, "CD EF GH", &options),
        Transition::Rejected(FieldError::TooManySeries { count: 3, max: 2 }.into())
    );
    assert_eq!(
        advance(&state, "1, 2, 3", &options),
        Transition::Rejected(FieldError::NoSeries.into())
    );

    let next = answer(&state, "cd;cd, ef", &options);
    match next {
        GeneratorState::AwaitingStart { series, .. } => assert_eq!(series, vec!["CD", "EF"]),
        other => panic!("unexpected state {other:?}"),
    }

    Ok(())
}

/// Dialogue states can be serialized/deserialized with serde_json
#[tokio::test]
async fn test_dialogue_state_serialization() -> Result<()> {
    let job = GenerationJob::build(Mode::Single, "AB", "12", &["CD".to_string()], 1, 10)?;
    let states = vec![
        GeneratorState::Idle,
        GeneratorState::AwaitingEnd {
            mode: Mode::Batch,
            prefix: "AB".to_string(),
            mid: "12".to_string(),
            series: vec!["CD".to_string(), "EF".to_string()],
            start: 7,
        },
        GeneratorState::AwaitingConfirmation { job },
        GeneratorState::AwaitingCsvName {
            job: CsvJob {
                source_path: "/tmp/upload.txt".into(),
                csv_path: "/tmp/converted.csv".into(),
                default_name: "upload.csv".to_string(),
                records: 3,
                csv_bytes: 120,
            },
        },
        GeneratorState::Cancelled,
    ];

    for state in states {
        let json = serde_json::to_string(&state)?;
        let restored: GeneratorState = serde_json::from_str(&json)?;
        assert_eq!(restored, state);
    }

    Ok(())
}

#[tokio::test]
async fn test_csv_job_paths_are_owned_by_state() -> Result<()> {
    let job = CsvJob {
        source_path: "/tmp/a.txt".into(),
        csv_path: "/tmp/a.csv".into(),
        default_name: "a.csv".to_string(),
        records: 1,
        csv_bytes: 30,
    };
    let state = GeneratorState::AwaitingCsvChoice { job: job.clone() };
    assert_eq!(state.csv_job(), Some(&job));
    assert_eq!(GeneratorState::AwaitingCsvUpload.csv_job(), None);
    assert_eq!(job.paths().len(), 2);

    Ok(())
}
