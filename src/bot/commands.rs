//! Bot commands and their handler

use anyhow::Result;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::info;

// Import localization
use crate::localization::t_lang;

use crate::dialogue::{cancel, start, GeneratorDialogue, GeneratorState};
use crate::generator::Mode;

use super::dialogue_manager::{discard_pending_files, send_html};
use super::message_handler::message_language;
use super::ui_builder::{csv_intro_message, help_message, welcome_message};

#[derive(BotCommands, Clone, Debug, PartialEq, Eq)]
#[command(rename_rule = "lowercase", description = "Vehicle number generator commands:")]
pub enum Command {
    #[command(description = "generate numbers for one series")]
    Start,
    #[command(description = "generate numbers for several series")]
    Batch,
    #[command(description = "convert a TXT file to CSV")]
    Txt2csv,
    #[command(description = "show usage")]
    Help,
    #[command(description = "cancel the current operation")]
    Cancel,
}

pub async fn command_handler(
    bot: Bot,
    msg: Message,
    cmd: Command,
    dialogue: GeneratorDialogue,
) -> Result<()> {
    let chat_id = msg.chat.id;
    let language_code = message_language(&msg);
    info!(user_id = %chat_id, command = ?cmd, "Received command");

    match cmd {
        Command::Start | Command::Batch => {
            let mode = if cmd == Command::Batch {
                Mode::Batch
            } else {
                Mode::Single
            };
            discard_pending_files(&dialogue).await?;
            dialogue.update(start(mode)).await?;
            send_html(&bot, chat_id, welcome_message(mode, language_code)).await?;
        }
        Command::Txt2csv => {
            discard_pending_files(&dialogue).await?;
            dialogue.update(GeneratorState::AwaitingCsvUpload).await?;
            send_html(&bot, chat_id, csv_intro_message(language_code)).await?;
        }
        Command::Help => {
            send_html(&bot, chat_id, help_message(language_code)).await?;
        }
        Command::Cancel => {
            discard_pending_files(&dialogue).await?;
            dialogue.update(cancel()).await?;
            send_html(&bot, chat_id, t_lang("cancelled", language_code)).await?;
        }
    }

    Ok(())
}
