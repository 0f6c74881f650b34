use anyhow::Result;
use std::sync::Arc;
use std::time::Duration;
use support_relay_bot::bot::{self, BotState, Command};
use support_relay_bot::config::AppConfig;
use support_relay_bot::db::{self, PgOrderSource};
use support_relay_bot::dialogue::ConversationTracker;
use support_relay_bot::errors::error_logging;
use support_relay_bot::localization;
use support_relay_bot::observability;
use support_relay_bot::poller::OrderPoller;
use support_relay_bot::registry::SupportSessionRegistry;
use support_relay_bot::relay::SupportRelay;
use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file first
    dotenvy::dotenv().ok();

    // Load and validate configuration early
    let config = AppConfig::from_env()?;
    config.validate()?;

    // Create database connection pool
    let pool = db::connect_pool(&config.database).await?;

    // Initialize complete observability stack with health checks (metrics, tracing, logging)
    observability::init_observability(
        &config.observability,
        Some(pool.clone()),
        Some(config.bot.token.clone()),
    )
    .await?;
    info!("{}", config.summary());

    // Initialize localization manager
    let localization_manager = localization::create_localization_manager()?;

    // Initialize the bot with custom client configuration for better reliability
    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(config.bot.http_timeout_secs))
        .build()?;
    let bot = Bot::with_client(config.bot.token.clone(), client);
    info!(
        timeout_secs = config.bot.http_timeout_secs,
        "Bot initialized"
    );

    if let Err(e) = bot.set_my_commands(Command::bot_commands()).await {
        error_logging::log_network_error(&e, "set_my_commands", None, None);
    }

    let channel = Arc::new(bot.clone());

    let relay = Arc::new(SupportRelay::new(
        Arc::clone(&channel),
        Arc::clone(&localization_manager),
        config.support.support_chat_id(),
        config.support.team(),
        ConversationTracker::new(config.support.request_ttl()),
        SupportSessionRegistry::new(config.support.session_capacity),
    ));

    // Initialize the order watermark right away, then keep polling in the background
    let mut poller = OrderPoller::new(
        PgOrderSource::new(pool.clone()),
        Arc::clone(&channel),
        Arc::clone(&localization_manager),
        config.notification_chat_id(),
    );
    if let Err(e) = poller.run_cycle().await {
        error_logging::log_database_error(&e, "initialize_order_watermark", None);
    }
    tokio::spawn(poller.run(config.poller.initial_delay(), config.poller.interval()));
    info!(
        chat_id = %config.notification_chat_id(),
        interval_secs = config.poller.interval_secs,
        "Order poller started"
    );

    let state = Arc::new(BotState::new(
        relay,
        Arc::clone(&localization_manager),
        &config.bot.website_url,
    )?);

    let handler = dptree::entry()
        .branch(
            Update::filter_message()
                .branch(dptree::entry().filter_command::<Command>().endpoint({
                    let state = Arc::clone(&state);
                    move |bot: Bot, msg: Message, cmd: Command| {
                        let state = Arc::clone(&state);
                        async move { bot::command_handler(bot, msg, cmd, state).await }
                    }
                }))
                .branch(dptree::endpoint({
                    let state = Arc::clone(&state);
                    move |bot: Bot, msg: Message| {
                        let state = Arc::clone(&state);
                        async move { bot::message_handler(bot, msg, state).await }
                    }
                })),
        )
        .branch(Update::filter_callback_query().endpoint({
            let state = Arc::clone(&state);
            move |bot: Bot, q: CallbackQuery| {
                let state = Arc::clone(&state);
                async move { bot::callback_handler(bot, q, state).await }
            }
        }));

    info!("Starting dispatcher");
    Dispatcher::builder(bot, handler)
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    Ok(())
}
