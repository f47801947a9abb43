//! Bot module for handling Telegram interactions
//!
//! This module is split into several submodules:
//! - `commands`: Command definitions and the command handler
//! - `message_handler`: Handles incoming text and document messages
//! - `callback_handler`: Handles inline keyboard callback queries
//! - `ui_builder`: Creates keyboards and formats messages
//! - `dialogue_manager`: Applies dialogue state transitions and their side effects
//! - `delivery`: Sends documents with retry

pub mod callback_handler;
pub mod commands;
pub mod delivery;
pub mod dialogue_manager;
pub mod message_handler;
pub mod ui_builder;

use teloxide::dispatching::dialogue::{self, InMemStorage};
use teloxide::dispatching::UpdateHandler;
use teloxide::prelude::*;

use crate::dialogue::GeneratorState;

// Re-export main handler functions for use in main.rs
pub use callback_handler::callback_handler;
pub use commands::{command_handler, Command};
pub use message_handler::message_handler;

/// Update routing: commands first, then free messages, then button presses.
///
/// Expects `InMemStorage<GeneratorState>` and `Arc<Settings>` as dependencies.
pub fn schema() -> UpdateHandler<anyhow::Error> {
    let commands = teloxide::filter_command::<Command, _>().endpoint(command_handler);

    let messages = Update::filter_message()
        .branch(commands)
        .branch(dptree::endpoint(message_handler));

    let callbacks = Update::filter_callback_query().endpoint(callback_handler);

    dialogue::enter::<Update, InMemStorage<GeneratorState>, GeneratorState, _>()
        .branch(messages)
        .branch(callbacks)
}
