use std::collections::HashSet;

use anyhow::Result;
use campus_db::reaction_roles::{EmojiKey, ReactionMatch};
use campus_util::{log_error, prelude::Error, UserData};
use serenity::model::prelude::*;

use serenity::client;

mod reaction_add;
mod reaction_remove;
pub mod ready;

pub async fn handle_event(
    ctx: &client::Context,
    event: &serenity::all::FullEvent,
    _framework: poise::FrameworkContext<'_, UserData, Error>,
    data: &UserData,
) -> Result<()> {
    use serenity::all::FullEvent::*;
    let result = match event {
        Ready { data_about_bot } => ready::ready(ctx, data, data_about_bot).await,
        ReactionAdd { add_reaction } => reaction_add::reaction_add(ctx, data, add_reaction).await,
        ReactionRemove { removed_reaction } => {
            reaction_remove::reaction_remove(ctx, data, removed_reaction).await
        }
        _ => Ok(()),
    };

    log_error!(format!("Error while handling {} event", event.snake_case_name()), result);
    Ok(())
}

/// Figure out whether a reaction belongs to a reaction role.
/// Reactions outside of guilds and those made by the bot itself never do.
async fn match_reaction_role(
    ctx: &client::Context,
    data: &UserData,
    event: &Reaction,
) -> Result<Option<(GuildId, UserId, ReactionMatch)>> {
    let (Some(guild_id), Some(user_id)) = (event.guild_id, event.user_id) else {
        return Ok(None);
    };
    if user_id == ctx.cache.current_user().id {
        return Ok(None);
    }
    let Some(emoji) = EmojiKey::from_reaction(&event.emoji) else { return Ok(None) };

    let role_ids = guild_role_ids(ctx, guild_id).await?;
    let result = data
        .reaction_roles
        .match_reaction(guild_id, event.message_id, &emoji, |role| role_ids.contains(&role))
        .await?;
    Ok(Some((guild_id, user_id, result)))
}

/// Ids of all roles of a guild, from the cache if possible.
async fn guild_role_ids(ctx: &client::Context, guild_id: GuildId) -> Result<HashSet<RoleId>> {
    let cached: Option<HashSet<RoleId>> =
        ctx.cache.guild(guild_id).map(|guild| guild.roles.keys().copied().collect());
    match cached {
        Some(role_ids) => Ok(role_ids),
        None => Ok(guild_id.roles(&ctx.http).await?.into_keys().collect()),
    }
}
