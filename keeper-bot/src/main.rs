mod events;
mod notices;

use std::env;
use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use poise::serenity_prelude as serenity;
use tracing::{debug, error, info, warn};
use tracing_subscriber::Layer;
use tracing_subscriber::filter::{LevelFilter, filter_fn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rustls::crypto::ring::default_provider;

use keeper_core::{Data, Error};
use keeper_eventlog::EventLogDispatcher;
use keeper_storage::impls::guild_config::increment_statistic;
use keeper_storage::model::guild_config::Statistic;
use keeper_storage::{CacheService, Storage};

const DEFAULT_MESSAGE_CACHE_SIZE: u64 = 500;
const CACHE_KEY_PREFIX: &str = "keeper";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load the .env file
    dotenvy::dotenv().ok();

    let data_dir = PathBuf::from(env::var("DATA_DIR").unwrap_or_else(|_| "data".to_owned()));
    std::fs::create_dir_all(&data_dir)?;

    let debug_logging = env_bool("LOG_DEBUG", false);
    let console_level = if debug_logging {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    let fmt_layer = tracing_subscriber::fmt::layer().with_filter(filter_fn(move |metadata| {
        let target = metadata.target();

        if *metadata.level() > console_level {
            return false;
        }

        !(target.starts_with("serenity::gateway::bridge::shard_manager")
            || target.starts_with("serenity::gateway::bridge::shard_runner"))
    }));

    let error_log = OpenOptions::new()
        .create(true)
        .append(true)
        .open(data_dir.join("error_logs.txt"))?;
    let error_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(Mutex::new(error_log))
        .with_filter(LevelFilter::ERROR);

    tracing_subscriber::registry()
        .with(fmt_layer)
        .with(error_layer)
        .init();

    default_provider()
        .install_default()
        .map_err(|_| anyhow::anyhow!("failed to install rustls ring provider"))?;

    let token = env::var("DISCORD_TOKEN")?;
    let dev_guild_id = match env::var("DISCORD_GUILD_ID") {
        Ok(raw) if !raw.trim().is_empty() => Some(raw.trim().parse::<u64>()?),
        _ => None,
    };

    let cache = if env_bool("CONFIG_CACHE_ENABLED", true) {
        info!("Configuration cache enabled.");
        CacheService::memory(CACHE_KEY_PREFIX)
    } else {
        info!("Configuration cache disabled (set CONFIG_CACHE_ENABLED=true to enable).");
        CacheService::disabled(CACHE_KEY_PREFIX)
    };

    let storage = Storage::open(&data_dir, cache).await?;
    info!(data_dir = %data_dir.display(), "Storage ready.");

    let message_cache_size = env_u64("MESSAGE_CACHE_SIZE", DEFAULT_MESSAGE_CACHE_SIZE);
    let journal_capacity = usize::try_from(message_cache_size).unwrap_or(usize::MAX);
    let event_log = EventLogDispatcher::new(storage.clone(), journal_capacity);
    info!(message_cache_size, "Event log dispatcher created.");

    let intents = serenity::GatewayIntents::GUILDS
        | serenity::GatewayIntents::GUILD_MESSAGES
        | serenity::GatewayIntents::MESSAGE_CONTENT
        | serenity::GatewayIntents::GUILD_MEMBERS
        | serenity::GatewayIntents::GUILD_VOICE_STATES;

    let framework = poise::Framework::builder()
        .options(poise::FrameworkOptions {
            commands: keeper_commands::commands(),
            event_handler: |ctx, event, framework, data| {
                Box::pin(handle_event(ctx, event, framework, data))
            },
            pre_command: |ctx| Box::pin(count_command(ctx)),
            on_error: |error| Box::pin(on_error(error)),
            prefix_options: poise::PrefixFrameworkOptions {
                prefix: Some(keeper_utils::COMMAND_PREFIX.to_string()),
                mention_as_prefix: false,
                ..Default::default()
            },
            ..Default::default()
        })
        .setup(move |ctx, ready, framework| {
            let storage = storage.clone();
            let event_log = event_log.clone();
            Box::pin(async move {
                info!(user = %ready.user.name, "Keeper is ready to serve!");

                match dev_guild_id {
                    Some(guild_id) => {
                        poise::builtins::register_in_guild(
                            ctx,
                            &framework.options().commands,
                            serenity::GuildId::new(guild_id),
                        )
                        .await?;
                    }
                    None => {
                        poise::builtins::register_globally(ctx, &framework.options().commands)
                            .await?;
                    }
                }

                let data = Data { storage, event_log };
                events::lifecycle::on_startup(ctx, ready, &data).await;

                Ok(data)
            })
        })
        .build();

    info!("Keeper is connecting...");

    let mut client = serenity::ClientBuilder::new(token, intents)
        .framework(framework)
        .await?;

    client.start().await?;
    Ok(())
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

fn env_u64(key: &str, default: u64) -> u64 {
    match env::var(key) {
        Ok(value) => value.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

async fn count_command(ctx: keeper_core::Context<'_>) {
    let Some(guild_id) = ctx.guild_id() else {
        return;
    };

    if increment_statistic(&ctx.data().storage, guild_id.get(), Statistic::CommandsUsed)
        .await
        .is_none()
    {
        warn!(guild_id = guild_id.get(), "failed to count command usage");
    }
}

async fn on_error(error: poise::FrameworkError<'_, Data, Error>) {
    match error {
        poise::FrameworkError::Command { error, ctx, .. } => {
            let command = ctx.command().qualified_name.clone();
            error!(?error, %command, "command error");

            let embed = keeper_utils::embed::error_embed(
                "Command Error",
                "⚠️ Something went wrong. The issue has been logged and will be fixed soon.",
            );
            let _ = ctx
                .send(poise::CreateReply::default().ephemeral(true).embed(embed))
                .await;

            if let Some(guild_id) = ctx.guild_id() {
                let report =
                    notices::error_report_embed(&format!("Command: {command}"), &error.to_string());
                notices::send_to_ticket_logs(ctx.http(), ctx.data(), guild_id.get(), report).await;
            }
        }
        poise::FrameworkError::ArgumentParse { ctx, input, .. } => {
            let usage = format!(
                "Usage: `{}{}`",
                keeper_utils::COMMAND_PREFIX,
                ctx.command().qualified_name
            );
            let description = if let Some(input) = input {
                format!("Invalid argument: `{}`\n{}", input, usage)
            } else {
                format!("Missing required argument.\n{}", usage)
            };

            let _ = ctx.say(description).await;
        }
        poise::FrameworkError::UnknownCommand { .. } => {
            debug!("unknown command invocation");
        }
        other => {
            error!(?other, "framework error");
        }
    }
}

async fn handle_event(
    ctx: &serenity::Context,
    event: &serenity::FullEvent,
    _framework: poise::FrameworkContext<'_, Data, Error>,
    data: &Data,
) -> Result<(), Error> {
    match event {
        serenity::FullEvent::Ready { .. } => {
            events::lifecycle::on_ready(ctx, data).await;
        }
        serenity::FullEvent::GuildCreate { guild, is_new, .. } => {
            events::lifecycle::on_guild_create(ctx, data, guild, *is_new).await;
        }
        serenity::FullEvent::GuildDelete { incomplete, .. } => {
            events::lifecycle::on_guild_delete(data, incomplete).await;
        }
        _ => {}
    }

    data.event_log.handle(event).await;

    Ok(())
}
