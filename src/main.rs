use anyhow::{Context, Result};
use std::sync::Arc;
use teloxide::dispatching::dialogue::InMemStorage;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use vehicle_numbers::bot::{schema, Command};
use vehicle_numbers::config::{load_token, LogFormat, Settings};
use vehicle_numbers::dialogue::GeneratorState;

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter).with_target(false);

    match format {
        LogFormat::Json => builder.json().init(),
        LogFormat::Plain => builder.init(),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let settings = Settings::from_env().context("Invalid configuration")?;
    init_logging(settings.log_format);

    info!("Starting vehicle number generator bot");

    let token = load_token().context("Failed to load bot token")?;
    let bot = Bot::new(token);

    // An invalid token is fatal
    let me = bot
        .get_me()
        .await
        .context("Telegram rejected the bot token")?;
    info!(
        username = %me.username(),
        confirm_before_generate = settings.confirm_before_generate,
        max_batch_series = settings.max_batch_series,
        "Bot authenticated"
    );

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        warn!(error = %e, "Failed to register bot commands");
    }

    info!("Starting dispatcher");

    Dispatcher::builder(bot, schema())
        .dependencies(dptree::deps![
            InMemStorage::<GeneratorState>::new(),
            Arc::new(settings)
        ])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
