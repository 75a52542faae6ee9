use poise::serenity_prelude::CreateEmbed;
use campus_util::embeds;

use super::*;

/// Show this list
#[poise::command(slash_command, track_edits, prefix_command)]
pub async fn help(
    ctx: Ctx<'_>,
    #[description = "The command to get help for."]
    #[autocomplete = "poise::builtins::autocomplete_command"]
    command: Option<String>,
) -> Res<()> {
    let commands: Vec<_> = ctx
        .framework()
        .options()
        .commands
        .iter()
        .filter(|x| !x.hide_in_help && (x.slash_action.is_some() || x.prefix_action.is_some()))
        .collect();

    if let Some(desired_command) = command {
        let command = commands
            .iter()
            .find(|c| c.name == desired_command || c.aliases.contains(&desired_command))
            .user_error(&format!("Unknown command `{}`", desired_command))?;
        ctx.reply_embed(make_single_help_embed(command)).await?;
    } else {
        // only list what the user is allowed to run
        let available_commands = commands.into_iter().map(|cmd| async move {
            for check in &cmd.checks {
                match check(ctx).await {
                    Ok(true) => {}
                    Ok(false) => return None,
                    Err(e) => {
                        tracing::error!(error = %e, "Error while running check");
                    }
                }
            }
            Some(cmd)
        });
        let available_commands = futures::future::join_all(available_commands)
            .await
            .into_iter()
            .flatten()
            .collect_vec();

        ctx.reply_embed(make_full_help_embed(&available_commands)).await?;
    }
    Ok(())
}

fn make_single_help_embed(command: &Command<UserData, Error>) -> CreateEmbed {
    let mut e = embeds::base_embed().title(format!("Help for {}", command.name));
    if let Some(desc) = command.help_text.as_ref().or(command.description.as_ref()) {
        e = e.description(desc);
    }
    if !command.aliases.is_empty() {
        e = e.field("Aliases", command.aliases.iter().map(|a| format!("`{}`", a)).join(", "), false);
    }
    if !command.subcommands.is_empty() {
        let subcommands_text = command
            .subcommands
            .iter()
            .map(|subcommand| match &subcommand.description {
                Some(usage) => format!("**/{} {}** - {}", command.name, subcommand.name, usage),
                None => format!("**/{} {}**", command.name, subcommand.name),
            })
            .join("\n");
        e = e.field("Subcommands", subcommands_text, false);
    }
    e
}

fn make_full_help_embed(commands: &[&Command<UserData, Error>]) -> CreateEmbed {
    let fields = commands.iter().map(|command| {
        let name = format!("**/{}**", command.name);
        let description = command.description.clone().unwrap_or_else(|| "No description".to_string());
        (name, description, false)
    });
    embeds::base_embed().title("Help").fields(fields)
}
