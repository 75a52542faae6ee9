use std::time::Duration;

use anyhow::Context;
use campus_db::reaction_roles::{EmojiKey, ReactionRoleError, ReactionRoles};
use campus_util::{embeds, emojis::EmojiTable, log_error};
use poise::{
    serenity_prelude::{GuildId, Message, MessageId, ReactionType, Role},
    CreateReply,
};

use super::*;

const REACTION_PROMPT_TIMEOUT: Duration = Duration::from_secs(60);

/// Grant roles to members that react to a message
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    aliases("rr"),
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES",
    custom_data = "CmdMeta { perms: PermissionLevel::Mod }",
    subcommands("reactionrole_add", "reactionrole_remove")
)]
pub async fn reactionrole(ctx: Ctx<'_>) -> Res<()> {
    ctx.say_error("Invalid command passed.").await?;
    Ok(())
}

/// Add a reaction role
///
/// Without a game, you get asked to react with the emoji to use.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "add",
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES",
    custom_data = "CmdMeta { perms: PermissionLevel::Mod }"
)]
pub async fn reactionrole_add(
    ctx: Ctx<'_>,
    #[description = "Message members react to (link or ID)"] message: Message,
    #[description = "Role to grant"] role: Role,
    #[autocomplete = "autocomplete_game"]
    #[description = "Game whose emoji to use"]
    game: Option<String>,
) -> Res<()> {
    let guild_id = ctx.guild_id().context("Not in a guild")?;
    let emojis = ctx.get_emojis();

    let (reaction, emoji, prompt) = match resolve_game_reaction(&emojis, game.as_deref())? {
        Some((reaction, emoji)) => (reaction, emoji, None),
        None => {
            let prompt = ctx
                .reply_embed(embeds::base_embed().description(
                    "React to this message with the reaction you want to use for the reaction role.",
                ))
                .await?;
            let prompt_msg = prompt.message().await?.into_owned();
            let reaction = prompt_msg
                .await_reaction(ctx.serenity_context())
                .author_id(ctx.author().id)
                .timeout(REACTION_PROMPT_TIMEOUT)
                .await;
            match resolve_prompted_reaction(reaction.map(|r| r.emoji))? {
                Some((reaction, emoji)) => (reaction, emoji, Some(prompt)),
                None => {
                    prompt
                        .edit(
                            ctx,
                            CreateReply::default().embed(embeds::make_error_embed(
                                "Reaction role setup has been cancelled. You took too long to choose a valid reaction.",
                            )),
                        )
                        .await?;
                    return Ok(());
                }
            }
        }
    };

    let reaction_roles = ctx.get_reaction_roles();
    ensure_rule_unused(&reaction_roles, guild_id, message.id, &emoji).await?;

    message
        .react(ctx.serenity_context(), reaction.clone())
        .await
        .user_error("Failed to react to that message")?;
    let id = match reaction_roles
        .add_rule(guild_id, message.id, message.channel_id, emoji, role.id)
        .await
    {
        Ok(id) => id,
        Err(err) => {
            log_error!(
                "Failed to take back reaction of unsaved reaction role",
                message.delete_reaction(ctx.serenity_context(), None, reaction).await
            );
            return Err(err);
        }
    };

    let embed = embeds::base_embed()
        .description("Successfully created the reaction role!")
        .field("ID", format!("`{}`", id), true);
    match prompt {
        Some(prompt) => {
            prompt.edit(ctx, CreateReply::default().embed(embed)).await?;
        }
        None => {
            ctx.reply_embed(embed).await?;
        }
    }
    Ok(())
}

/// Remove a reaction role
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    rename = "remove",
    required_permissions = "MANAGE_ROLES",
    required_bot_permissions = "MANAGE_ROLES",
    custom_data = "CmdMeta { perms: PermissionLevel::Mod }"
)]
pub async fn reactionrole_remove(
    ctx: Ctx<'_>,
    #[autocomplete = "autocomplete_rule_id"]
    #[description = "ID of the reaction role"]
    id: String,
) -> Res<()> {
    let guild_id = ctx.guild_id().context("Not in a guild")?;
    let reaction_roles = ctx.get_reaction_roles();

    let Some(rule) = reaction_roles.remove_rule(guild_id, &id).await? else {
        ctx.say_error(format!("No reaction role with ID `{}` found.", id)).await?;
        return Ok(());
    };

    let reaction = ctx.get_emojis().reaction_for(&rule.emoji);
    log_error!(
        "Failed to remove reaction of removed reaction role",
        rule.channel_id
            .delete_reaction(ctx.serenity_context(), rule.message_id, None, reaction)
            .await
    );

    ctx.say_success(format!("Reaction role with ID `{}` removed successfully!", id)).await?;
    Ok(())
}

/// The reaction of the given game. `None` when no game was given and the user has to be asked for one.
fn resolve_game_reaction(
    emojis: &EmojiTable,
    game: Option<&str>,
) -> Result<Option<(ReactionType, EmojiKey)>, UserErr> {
    let Some(game) = game else { return Ok(None) };
    let reaction = emojis.game(game).ok_or_else(|| UserErr::Other(format!("`{}` is invalid!", game)))?;
    let emoji = EmojiKey::from_reaction(&reaction).user_error("That reaction can't be used")?;
    Ok(Some((reaction, emoji)))
}

/// The reaction picked in answer to the prompt. `None` when the prompt timed out.
fn resolve_prompted_reaction(
    reaction: Option<ReactionType>,
) -> Result<Option<(ReactionType, EmojiKey)>, UserErr> {
    let Some(reaction) = reaction else { return Ok(None) };
    let emoji = EmojiKey::from_reaction(&reaction).user_error("That reaction can't be used")?;
    Ok(Some((reaction, emoji)))
}

async fn ensure_rule_unused(
    reaction_roles: &ReactionRoles,
    guild_id: GuildId,
    message_id: MessageId,
    emoji: &EmojiKey,
) -> Result<(), UserErr> {
    match reaction_roles.find_rule(guild_id, message_id, emoji).await {
        Some(existing) => Err(UserErr::Other(ReactionRoleError::Duplicate(existing.id).to_string())),
        None => Ok(()),
    }
}

async fn autocomplete_game(ctx: Ctx<'_>, partial: &str) -> Vec<String> {
    let partial = partial.to_lowercase();
    ctx.get_emojis()
        .game_keys()
        .filter(|key| key.to_lowercase().starts_with(&partial))
        .map(|key| key.to_string())
        .collect()
}

async fn autocomplete_rule_id(ctx: Ctx<'_>, partial: &str) -> Vec<String> {
    let Some(guild_id) = ctx.guild_id() else { return Vec::new() };
    ctx.get_reaction_roles()
        .rules(guild_id)
        .await
        .into_iter()
        .map(|rule| rule.id)
        .filter(|id| id.starts_with(partial))
        .collect()
}
