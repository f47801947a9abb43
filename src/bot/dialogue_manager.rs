//! Dialogue Manager module for applying state transitions and their side effects

use anyhow::Result;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use teloxide::prelude::*;
use teloxide::types::ParseMode;
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::{t_args_lang, t_lang};

use crate::artifact::write_numbers;
use crate::config::Settings;
use crate::csv_converter::{convert_file, default_csv_name, sanitize_csv_name, CSV_EXTENSION};
use crate::dialogue::{advance, CsvJob, GeneratorDialogue, GeneratorState, Transition};
use crate::errors::ConversionError;
use crate::generator::GenerationJob;

use super::delivery::send_document_with_retry;
use super::ui_builder::{
    completion_message, create_confirmation_keyboard, csv_caption, format_count,
    generation_caption, next_step_message, rejection_message, summary_message,
};

/// Send an HTML message
pub async fn send_html(bot: &Bot, chat_id: ChatId, text: String) -> Result<Message> {
    Ok(bot
        .send_message(chat_id, text)
        .parse_mode(ParseMode::Html)
        .await?)
}

/// Feed one answer of the five-step flow to the state machine
pub async fn handle_generation_input(
    bot: &Bot,
    msg: &Message,
    dialogue: GeneratorDialogue,
    state: GeneratorState,
    text: &str,
    settings: &Settings,
    language_code: Option<&str>,
) -> Result<()> {
    let chat_id = msg.chat.id;

    match advance(&state, text, &settings.flow_options()) {
        Transition::Advanced(next) => {
            debug!(user_id = %chat_id, step = ?next.step(), "Answer accepted");
            let prompt = next_step_message(&next, language_code);
            dialogue.update(next).await?;
            if let Some(prompt) = prompt {
                send_html(bot, chat_id, prompt).await?;
            }
        }
        Transition::Rejected(error) => {
            debug!(user_id = %chat_id, step = ?state.step(), error = %error, "Answer rejected");
            send_html(bot, chat_id, rejection_message(&state, &error, language_code)).await?;
        }
        Transition::Confirm(job) => {
            debug!(user_id = %chat_id, total = job.total(), "Awaiting generation confirmation");
            bot.send_message(chat_id, summary_message(&job, language_code))
                .parse_mode(ParseMode::Html)
                .reply_markup(create_confirmation_keyboard(language_code))
                .await?;
            dialogue
                .update(GeneratorState::AwaitingConfirmation { job })
                .await?;
        }
        Transition::Completed(job) => {
            run_generation(bot, chat_id, dialogue, job, settings, language_code).await?;
        }
        Transition::Ignored => {
            debug!(user_id = %chat_id, "Ignoring text outside of a conversation");
        }
    }

    Ok(())
}

/// Generate the numbers of `job`, deliver the file and reset the conversation
pub async fn run_generation(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: GeneratorDialogue,
    job: GenerationJob,
    settings: &Settings,
    language_code: Option<&str>,
) -> Result<()> {
    // The conversation resets whatever the delivery outcome
    dialogue.exit().await?;

    info!(
        user_id = %chat_id,
        pattern = %job.pattern(),
        series = job.series().len(),
        total = job.total(),
        "Generating vehicle numbers"
    );
    send_html(bot, chat_id, t_lang("generating", language_code)).await?;

    let writer_job = job.clone();
    let written = tokio::task::spawn_blocking(move || write_numbers(writer_job.numbers())).await?;
    let artifact = match written {
        Ok(artifact) => artifact,
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to write generated numbers");
            send_html(bot, chat_id, t_lang("error-generation-failed", language_code)).await?;
            return Ok(());
        }
    };

    let caption = generation_caption(&job, artifact.size_bytes(), language_code);
    let delivery = send_document_with_retry(
        bot,
        chat_id,
        artifact.path(),
        &job.file_name(),
        &caption,
        &settings.retry,
    )
    .await;

    let lines = artifact.line_count();
    if let Err(e) = artifact.remove() {
        warn!(user_id = %chat_id, error = %e, "Failed to remove generated file");
    }

    match delivery {
        Ok(_) => {
            info!(user_id = %chat_id, lines, "Vehicle numbers delivered");
            send_html(bot, chat_id, completion_message(&job, language_code)).await?;
        }
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to deliver generated numbers");
            send_html(bot, chat_id, t_lang("error-delivery-failed", language_code)).await?;
        }
    }

    Ok(())
}

/// Convert a downloaded text file into a temporary CSV.
///
/// The source file is left in place; on success both paths belong to the
/// returned job.
pub fn prepare_csv_job(source_path: PathBuf, upload_name: &str) -> Result<CsvJob, ConversionError> {
    let csv_file = tempfile::Builder::new()
        .prefix("converted_")
        .suffix(CSV_EXTENSION)
        .tempfile()?;
    let (_, csv_path) = csv_file.keep().map_err(|e| ConversionError::Io(e.error))?;

    let converted = convert_file(&source_path, &csv_path).and_then(|records| {
        let csv_bytes = std::fs::metadata(&csv_path)?.len();
        Ok((records, csv_bytes))
    });

    match converted {
        Ok((records, csv_bytes)) => Ok(CsvJob {
            source_path,
            csv_path,
            default_name: default_csv_name(upload_name),
            records,
            csv_bytes,
        }),
        Err(e) => {
            remove_temp_file(&csv_path);
            Err(e)
        }
    }
}

/// Delete a temporary file, logging anything but a missing file
pub fn remove_temp_file(path: &Path) {
    match std::fs::remove_file(path) {
        Ok(()) => debug!(temp_path = %path.display(), "Temporary file cleaned up"),
        Err(e) if e.kind() == ErrorKind::NotFound => {}
        Err(e) => {
            error!(temp_path = %path.display(), error = %e, "Failed to clean up temporary file")
        }
    }
}

/// Delete both temporary files of a conversion
pub fn cleanup_csv_job(job: &CsvJob) {
    for path in job.paths() {
        remove_temp_file(path);
    }
}

/// Delete the temporary files owned by the current state, if any
pub async fn discard_pending_files(dialogue: &GeneratorDialogue) -> Result<()> {
    if let Some(state) = dialogue.get().await? {
        if let Some(job) = state.csv_job() {
            cleanup_csv_job(job);
        }
    }
    Ok(())
}

/// Handle the new file name typed after choosing to rename
pub async fn handle_csv_name_input(
    bot: &Bot,
    msg: &Message,
    dialogue: GeneratorDialogue,
    job: CsvJob,
    text: &str,
    settings: &Settings,
    language_code: Option<&str>,
) -> Result<()> {
    match sanitize_csv_name(text) {
        Some(file_name) => {
            debug!(user_id = %msg.chat.id, file_name = %file_name, "CSV renamed");
            send_csv(bot, msg.chat.id, dialogue, job, &file_name, settings, language_code).await
        }
        None => {
            send_html(bot, msg.chat.id, t_lang("csv-rename-invalid", language_code)).await?;
            Ok(())
        }
    }
}

/// Deliver the converted CSV under `file_name`, then clean up and reset
pub async fn send_csv(
    bot: &Bot,
    chat_id: ChatId,
    dialogue: GeneratorDialogue,
    job: CsvJob,
    file_name: &str,
    settings: &Settings,
    language_code: Option<&str>,
) -> Result<()> {
    dialogue.exit().await?;

    let caption = csv_caption(&job, file_name, language_code);
    let delivery = send_document_with_retry(
        bot,
        chat_id,
        &job.csv_path,
        file_name,
        &caption,
        &settings.retry,
    )
    .await;
    cleanup_csv_job(&job);

    match delivery {
        Ok(_) => {
            info!(user_id = %chat_id, records = job.records, file_name, "CSV delivered");
            let count = format_count(job.records);
            send_html(
                bot,
                chat_id,
                t_args_lang("csv-complete", &[("count", &count)], language_code),
            )
            .await?;
        }
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to deliver CSV");
            send_html(bot, chat_id, t_lang("csv-delivery-failed", language_code)).await?;
        }
    }

    Ok(())
}
