use anyhow::Context;
use campus_commands::commands;
use campus_db::{reaction_roles::ReactionRoles, Db};
use poise::serenity_prelude::GatewayIntents;

use campus_util::{config::Config, emojis::EmojiTable, prelude::Ctx, UserData};
use serenity::all::OnlineStatus;
use std::sync::Arc;
use tracing::Level;

mod error_handling;
pub mod events;
mod logging;

use crate::logging::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let span = tracing::span!(Level::DEBUG, "main");
    let _enter = span.enter();

    let config = Config::from_environment().context("Failed to load configuration")?;

    let db = Db::new().await.context("Failed to initialize database")?;
    db.run_migrations().await.context("Failed to run migrations")?;

    let reaction_roles = ReactionRoles::load(&config.reaction_roles_path).await?;
    let emojis = EmojiTable::load(&config.emojis_path).await?;

    let config = Arc::new(config);
    let user_data = UserData {
        config: config.clone(),
        db: Arc::new(db),
        reaction_roles: Arc::new(reaction_roles),
        emojis: Arc::new(emojis),
    };

    let framework_options = poise::FrameworkOptions {
        commands: commands::all_commands(),
        on_error: |err| Box::pin(error_handling::on_error(err)),
        skip_checks_for_owners: true,
        pre_command: |ctx| Box::pin(pre_command(ctx)),
        owners: config.owners.clone(),
        event_handler: |ctx, event, framework, data| {
            Box::pin(events::handle_event(ctx, event, framework, data))
        },
        prefix_options: poise::PrefixFrameworkOptions {
            prefix: Some("!".into()),
            edit_tracker: Some(Arc::new(poise::EditTracker::for_timespan(
                std::time::Duration::from_secs(10),
            ))),
            execute_untracked_edits: true,
            execute_self_messages: false,
            case_insensitive_commands: true,
            ..Default::default()
        },
        ..Default::default()
    };

    let framework = poise::Framework::builder()
        .options(framework_options)
        .setup(move |_ctx, _ready, _framework| Box::pin(async move { Ok(user_data) }))
        .build();

    let gateway_intents = GatewayIntents::non_privileged()
        | GatewayIntents::GUILD_MEMBERS
        | GatewayIntents::MESSAGE_CONTENT;

    let mut client = serenity::Client::builder(&config.discord_token, gateway_intents)
        .framework(framework)
        .status(OnlineStatus::Online)
        .await
        .context("Error creating client")?;

    client.start().await?;

    Ok(())
}

async fn pre_command(ctx: Ctx<'_>) {
    let content = match ctx {
        poise::Context::Application(_) => ctx.invocation_string(),
        poise::Context::Prefix(prefix) => prefix.msg.content.to_string(),
    };

    tracing::info!(
        command_name = ctx.command().qualified_name.as_str(),
        invocation = ctx.invocation_string(),
        msg.content = %content,
        msg.author = %ctx.author().tag(),
        msg.author_id = %ctx.author().id,
        msg.id = %ctx.id(),
        msg.channel_id = %ctx.channel_id(),
        "{} invoked by {}",
        ctx.command().name,
        ctx.author().tag()
    );
}
