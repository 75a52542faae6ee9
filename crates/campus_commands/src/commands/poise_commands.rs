use poise::serenity_prelude::Command as ApplicationCommand;

use super::*;

/// Unregister all slash commands (be careful)
///
/// Slash commands have to be explicitly registered with discord.
/// To remove them again, you can use this command.
#[poise::command(
    slash_command,
    prefix_command,
    custom_data = "CmdMeta { perms: PermissionLevel::Mod }",
    hide_in_help
)]
pub async fn delete(
    ctx: Ctx<'_>,
    #[description = "global"]
    #[flag]
    global: bool,
) -> Res<()> {
    if global {
        let global_commands = ApplicationCommand::get_global_commands(ctx.serenity_context()).await?;
        for command in &global_commands {
            tracing::debug!(deleted_command_name = %command.name, "Deleting global application command {}", command.name);
            ApplicationCommand::delete_global_command(ctx.serenity_context(), command.id).await?;
        }

        ctx.say_success(format!(
            "Deleted global commands: {}",
            global_commands.iter().map(|x| x.name.to_string()).join(", ")
        ))
        .await?;
    } else if let Some(guild_id) = ctx.guild_id() {
        let commands = guild_id.get_commands(ctx.serenity_context()).await?;
        for command in &commands {
            tracing::debug!(deleted_command_name = %command.name, "Deleting application command {}", command.name);
            guild_id.delete_command(ctx.serenity_context(), command.id).await?;
        }
        ctx.say_success(format!(
            "Deleted application commands: {}",
            commands.iter().map(|x| x.name.to_string()).join(", ")
        ))
        .await?;
    }
    Ok(())
}

/// Register all slash commands with discords API
///
/// Slash commands have to be explicitly registered with discord, which you can do via this command.
#[poise::command(
    slash_command,
    prefix_command,
    custom_data = "CmdMeta { perms: PermissionLevel::Mod }",
    hide_in_help
)]
pub async fn register(
    ctx: Ctx<'_>,
    #[description = "global"]
    #[flag]
    global: bool,
) -> Res<()> {
    let new_commands = &ctx.framework().options().commands;
    if global {
        poise::builtins::register_globally(ctx.serenity_context(), new_commands).await?;
    } else if let Some(guild_id) = ctx.guild_id() {
        poise::builtins::register_in_guild(ctx.serenity_context(), new_commands, guild_id).await?;
    } else {
        abort_with!("Outside of a server, only global registration is possible");
    }

    ctx.say_success(format!(
        "Registered commands: {}",
        new_commands.iter().map(|x| x.name.as_str()).join(", ")
    ))
    .await?;

    Ok(())
}
