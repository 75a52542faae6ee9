use campus_commands::commands;
use campus_db::reaction_roles::ReactionRoleError;
use poise::{
    serenity_prelude::{MemberParseError, RoleParseError, UserParseError},
    CreateReply, TooFewArguments, TooManyArguments,
};

use campus_util::{
    extensions::PoiseContextExt,
    log_error,
    prelude::{self, Ctx},
    UserData,
};

/// Handler passed to poise
pub async fn on_error(error: poise::FrameworkError<'_, UserData, prelude::Error>) {
    use poise::FrameworkError::*;
    if let Some(ctx) = error.ctx() {
        tracing::error!(
            error.message = %error,
            command_name = %ctx.command().qualified_name,
            invocation = %ctx.invocation_string(),
            author.tag = %ctx.author().tag(),
            "Error occured in context, more details will follow"
        );
    }
    match error {
        Command { error, ctx, .. } => {
            handle_command_error(ctx, error).await;
        }
        CommandPanic { payload, ctx, .. } => {
            tracing::error!(
                error.message = %payload.unwrap_or_default(),
                command_name = ctx.command().qualified_name,
                invocation = %ctx.invocation_string(),
                "Command panicked"
            );
        }
        ArgumentParse { input, ctx, error, .. } => {
            log_error!(handle_argument_parse_error(ctx, error, input).await);
        }
        CommandStructureMismatch { description, ctx, .. } => {
            log_error!(poise::Context::Application(ctx).say_error("Something went wrong").await);
            tracing::error!(
                error.message = "CommandStructureMismach",
                error.description = %description,
                invocation = %ctx.invocation_string(),
                "Error in command structure: {description}"
            );
        }
        MissingBotPermissions { missing_permissions, ctx, .. } => {
            log_error!(
                ctx.say_error(format!(
                    "It seems like I am lacking the {missing_permissions} permission",
                ))
                .await
            );
            tracing::error!(
                error.message = "Bot missing permissions",
                error.missing_permissions = %missing_permissions,
                command_name = ctx.command().qualified_name,
                invocation = %ctx.invocation_string(),
                author = ctx.author().tag(),
                "Bot missing permissions: {missing_permissions}",
            )
        }
        MissingUserPermissions { missing_permissions, ctx, .. } => {
            let message = match missing_permissions {
                Some(permissions) => format!("You need the {permissions} permission to do that"),
                None => "Missing permissions".to_string(),
            };
            log_error!(ctx.say_error(message).await);
            tracing::info!(
                error.message = "User missing permissions",
                error.missing_permissions = ?missing_permissions,
                author = ctx.author().tag(),
                invocation = %ctx.invocation_string(),
                "User missing permissions: {missing_permissions:?}",
            )
        }
        GuildOnly { ctx, .. } => {
            log_error!(ctx.say_error("This can only be ran in a server").await);
        }
        CommandCheckFailed { error, ctx, .. } => {
            if let Some(error) = error {
                log_error!(
                    ctx.say_error("Something went wrong while checking your permissions").await
                );
                tracing::error!(
                    error.message = %error,
                    command_name = %ctx.command().qualified_name.as_str(),
                    invocation = %ctx.invocation_string(),
                    "Error while running command check: {error}"
                );
            } else {
                log_error!(
                    ctx.send(
                        CreateReply::default().ephemeral(true).content("Insufficient permissions")
                    )
                    .await
                );
            }
        }
        UnknownCommand { msg, msg_content, prefix, .. } => {
            tracing::debug!(
                msg.id = %msg.id,
                msg.content = %msg_content,
                "Message starts with command prefix `{prefix}`, but wasn't a command",
            );
        }
        other => {
            if let Some(ctx) = other.ctx() {
                tracing::error!(
                    error.message = %other,
                    command.author.tag = ctx.author().tag(),
                    command_name = ctx.command().qualified_name,
                    invocation = %ctx.invocation_string(),
                    "unhandled error received from poise"
                );
            } else {
                tracing::error!(error.message = %other, "unhandled error received from poise");
            }
        }
    }
}

async fn handle_argument_parse_error(
    ctx: Ctx<'_>,
    error: Box<dyn std::error::Error + Send + Sync>,
    input: Option<String>,
) -> anyhow::Result<()> {
    let msg = if error.downcast_ref::<UserParseError>().is_some() {
        format!("I couldn't find any user '{}'", input.unwrap_or_default())
    } else if error.downcast_ref::<MemberParseError>().is_some() {
        format!("I couldn't find any member '{}'", input.unwrap_or_default())
    } else if error.downcast_ref::<RoleParseError>().is_some() {
        format!("I couldn't find any role '{}'", input.unwrap_or_default())
    } else if error.downcast_ref::<TooManyArguments>().is_some() {
        "Too many arguments".to_string()
    } else if error.downcast_ref::<TooFewArguments>().is_some() {
        "Too few arguments".to_string()
    } else if let Some(input) = input {
        format!("Malformed argument '{}'", input)
    } else {
        tracing::warn!(error.message = %error, "Unclear argument parse error: {error}");
        "Command used incorrectly".to_string()
    };
    ctx.say_error(msg).await?;
    Ok(())
}

async fn handle_command_error(ctx: Ctx<'_>, err: prelude::Error) {
    if let Some(inner_err) = err.downcast_ref::<commands::UserErr>() {
        let issue = inner_err.to_string();
        let _ = ctx.say_error(format!("Error: {issue}")).await;
        tracing::info!(
            user_error.message = %issue,
            command_name = %ctx.command().qualified_name.as_str(),
            invocation = %ctx.invocation_string(),
            "User error"
        );
    } else if let Some(inner_err) = err.downcast_ref::<ReactionRoleError>() {
        let issue = inner_err.to_string();
        let _ = ctx.say_error(issue.clone()).await;
        tracing::info!(
            user_error.message = %issue,
            command_name = %ctx.command().qualified_name.as_str(),
            "Reaction role error"
        );
    } else if let Some(inner_err) = err.downcast_ref::<serenity::Error>() {
        tracing::warn!(
            command_name = %ctx.command().qualified_name.as_str(),
            invocation = %ctx.invocation_string(),
            error.message = %err,
            error.root_cause = %err.root_cause(),
            error.inner = ?inner_err,
            "Serenity error [handling {}]: {err}",
            ctx.command().qualified_name,
        );
        match inner_err {
            serenity::Error::Model(err) => {
                let _ = ctx.say_error(err.to_string()).await;
            }
            _ => {
                let _ = ctx.say_error("Something went wrong").await;
            }
        }
    } else {
        let _ = ctx.say_error("Something went wrong").await;
        tracing::warn!(
            command_name = %ctx.command().qualified_name.as_str(),
            invocation = %ctx.invocation_string(),
            error.message = %err,
            error.root_cause = %err.root_cause(),
            error = format!("{err:#?}"),
            "Internal error [handling {}]: {err}",
            ctx.command().qualified_name,
        );
    }
}
