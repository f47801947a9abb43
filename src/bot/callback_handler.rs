//! Callback Handler module for processing inline keyboard callback queries

use anyhow::Result;
use std::sync::Arc;
use teloxide::prelude::*;
use tracing::{debug, warn};

// Import localization
use crate::localization::t_lang;

use crate::config::Settings;
use crate::dialogue::{cancel, GeneratorDialogue, GeneratorState};

use super::dialogue_manager::{cleanup_csv_job, run_generation, send_csv, send_html};
use super::ui_builder::{
    CALLBACK_CANCEL_GENERATION, CALLBACK_CSV_CANCEL, CALLBACK_CSV_DEFAULT, CALLBACK_CSV_RENAME,
    CALLBACK_GENERATE,
};

/// Handle callback queries from inline keyboards
pub async fn callback_handler(
    bot: Bot,
    q: CallbackQuery,
    dialogue: GeneratorDialogue,
    settings: Arc<Settings>,
) -> Result<()> {
    debug!(user_id = %q.from.id, data = ?q.data, "Received callback query from user");

    // Acknowledge first so the client stops its loading indicator
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(msg) = &q.message else {
        return Ok(());
    };
    let chat_id = msg.chat().id;
    let language_code = q.from.language_code.as_deref();
    let data = q.data.as_deref().unwrap_or("");

    let dialogue_state = dialogue.get().await?.unwrap_or_default();
    debug!(user_id = %chat_id, dialogue_state = ?dialogue_state.step(), "Retrieved dialogue state");

    // The buttons are single-use
    if let Err(e) = bot.edit_message_reply_markup(chat_id, msg.id()).await {
        debug!(user_id = %chat_id, error = %e, "Could not remove inline keyboard");
    }

    match (dialogue_state, data) {
        (GeneratorState::AwaitingConfirmation { job }, CALLBACK_GENERATE) => {
            run_generation(&bot, chat_id, dialogue, job, &settings, language_code).await?;
        }
        (GeneratorState::AwaitingConfirmation { .. }, CALLBACK_CANCEL_GENERATION) => {
            dialogue.update(cancel()).await?;
            send_html(&bot, chat_id, t_lang("generation-cancelled", language_code)).await?;
        }
        (GeneratorState::AwaitingCsvChoice { job }, CALLBACK_CSV_DEFAULT) => {
            let file_name = job.default_name.clone();
            send_csv(&bot, chat_id, dialogue, job, &file_name, &settings, language_code).await?;
        }
        (GeneratorState::AwaitingCsvChoice { job }, CALLBACK_CSV_RENAME) => {
            dialogue
                .update(GeneratorState::AwaitingCsvName { job })
                .await?;
            send_html(&bot, chat_id, t_lang("csv-rename-prompt", language_code)).await?;
        }
        (GeneratorState::AwaitingCsvChoice { job }, CALLBACK_CSV_CANCEL) => {
            cleanup_csv_job(&job);
            dialogue.update(cancel()).await?;
            send_html(&bot, chat_id, t_lang("csv-cancelled", language_code)).await?;
        }
        (state, data) => {
            warn!(user_id = %chat_id, data, step = ?state.step(), "Stale or unknown callback ignored");
        }
    }

    Ok(())
}
