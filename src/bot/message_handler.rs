//! Message Handler module for processing incoming Telegram messages

use anyhow::Result;
use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::{Document, ParseMode};
use tracing::{debug, error, info, warn};

// Import localization
use crate::localization::t_lang;

use crate::config::Settings;
use crate::csv_converter::{is_text_upload, TEXT_EXTENSION};
use crate::dialogue::{GeneratorDialogue, GeneratorState};
use crate::errors::ConversionError;

// Import dialogue manager functions
use super::dialogue_manager::{
    handle_csv_name_input, handle_generation_input, prepare_csv_job, remove_temp_file, send_html,
};

// Import UI builder functions
use super::ui_builder::{conversion_error_message, create_csv_choice_keyboard, csv_converted_message};

/// Language code of the message sender, if Telegram provides one
pub fn message_language(msg: &Message) -> Option<&str> {
    msg.from
        .as_ref()
        .and_then(|user| user.language_code.as_deref())
}

/// Text that looks like a bot command, including ones the bot does not know
pub fn is_command_like(text: &str) -> bool {
    text.trim_start().starts_with('/')
}

/// Download a Telegram file into a temporary file that outlives this call.
///
/// The caller owns the returned path and must delete it.
pub async fn download_file(bot: &Bot, file_id: teloxide::types::FileId) -> Result<PathBuf> {
    let file = bot.get_file(file_id).await?;
    let url = format!(
        "https://api.telegram.org/file/bot{}/{}",
        bot.token(),
        file.path
    );

    let response = reqwest::get(&url).await?.error_for_status()?;
    let bytes = response.bytes().await?;

    let mut temp_file = tempfile::Builder::new()
        .prefix("upload_")
        .suffix(TEXT_EXTENSION)
        .tempfile()?;
    temp_file.as_file_mut().write_all(&bytes)?;
    let (_, path) = temp_file.keep()?;

    Ok(path)
}

/// Entry point for every non-command message
pub async fn message_handler(
    bot: Bot,
    msg: Message,
    dialogue: GeneratorDialogue,
    settings: Arc<Settings>,
) -> Result<()> {
    let state = dialogue.get().await?.unwrap_or_default();

    if let Some(document) = msg.document() {
        return handle_document(&bot, &msg, document, dialogue, state, &settings).await;
    }

    match msg.text() {
        Some(text) => handle_text_message(&bot, &msg, text, dialogue, state, &settings).await,
        None => {
            debug!(user_id = %msg.chat.id, "Ignoring unsupported message kind");
            Ok(())
        }
    }
}

async fn handle_text_message(
    bot: &Bot,
    msg: &Message,
    text: &str,
    dialogue: GeneratorDialogue,
    state: GeneratorState,
    settings: &Settings,
) -> Result<()> {
    debug!(user_id = %msg.chat.id, message_length = text.len(), "Received text message from user");
    let language_code = message_language(msg);

    if is_command_like(text) {
        debug!(user_id = %msg.chat.id, "Ignoring unknown command");
        return Ok(());
    }

    match state {
        GeneratorState::AwaitingCsvName { job } => {
            handle_csv_name_input(bot, msg, dialogue, job, text, settings, language_code).await
        }
        GeneratorState::AwaitingCsvUpload => {
            send_html(bot, msg.chat.id, t_lang("csv-upload-expected", language_code)).await?;
            Ok(())
        }
        GeneratorState::AwaitingCsvChoice { .. } | GeneratorState::AwaitingConfirmation { .. } => {
            send_html(bot, msg.chat.id, t_lang("use-buttons", language_code)).await?;
            Ok(())
        }
        state => {
            handle_generation_input(bot, msg, dialogue, state, text, settings, language_code).await
        }
    }
}

async fn handle_document(
    bot: &Bot,
    msg: &Message,
    document: &Document,
    dialogue: GeneratorDialogue,
    state: GeneratorState,
    settings: &Settings,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let language_code = message_language(msg);

    if state != GeneratorState::AwaitingCsvUpload {
        debug!(user_id = %chat_id, "Ignoring document outside of the converter flow");
        return Ok(());
    }

    let upload_name = document.file_name.clone().unwrap_or_default();
    let size = u64::from(document.file.size);
    info!(user_id = %chat_id, file_name = %upload_name, size, "Received text file for conversion");

    let rejection = if !is_text_upload(&upload_name) {
        Some(ConversionError::NotText)
    } else if size > settings.max_upload_bytes {
        Some(ConversionError::TooLarge {
            size,
            limit: settings.max_upload_bytes,
        })
    } else {
        None
    };
    if let Some(error) = rejection {
        warn!(user_id = %chat_id, error = %error, "Upload rejected");
        let reply = conversion_error_message(&error, settings.max_upload_bytes, language_code);
        send_html(bot, chat_id, reply).await?;
        return Ok(());
    }

    send_html(bot, chat_id, t_lang("csv-processing", language_code)).await?;

    let source_path = match download_file(bot, document.file.id.clone()).await {
        Ok(path) => {
            debug!(user_id = %chat_id, temp_path = %path.display(), "Upload downloaded successfully");
            path
        }
        Err(e) => {
            error!(user_id = %chat_id, error = %e, "Failed to download upload");
            dialogue.exit().await?;
            send_html(bot, chat_id, t_lang("csv-error", language_code)).await?;
            return Ok(());
        }
    };

    let blocking_source = source_path.clone();
    let converted =
        tokio::task::spawn_blocking(move || prepare_csv_job(blocking_source, &upload_name)).await?;

    match converted {
        Ok(job) => {
            info!(user_id = %chat_id, records = job.records, "Text file converted to CSV");
            let summary = csv_converted_message(&job, language_code);
            dialogue
                .update(GeneratorState::AwaitingCsvChoice { job })
                .await?;
            bot.send_message(chat_id, summary)
                .parse_mode(ParseMode::Html)
                .reply_markup(create_csv_choice_keyboard(language_code))
                .await?;
        }
        Err(e) => {
            remove_temp_file(&source_path);
            let reply = conversion_error_message(&e, settings.max_upload_bytes, language_code);
            if e.is_recoverable() {
                warn!(user_id = %chat_id, error = %e, "Conversion rejected, awaiting another file");
            } else {
                error!(user_id = %chat_id, error = %e, "Conversion failed");
                dialogue.exit().await?;
            }
            send_html(bot, chat_id, reply).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_commands_are_not_answers() {
        assert!(is_command_like("/foo"));
        assert!(is_command_like("  /start@other_bot"));
        assert!(!is_command_like("AB"));
        assert!(!is_command_like("12/34"));
        assert!(!is_command_like(""));
    }
}
