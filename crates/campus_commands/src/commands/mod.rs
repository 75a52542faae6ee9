use itertools::Itertools;
use poise::serenity_prelude::{Member, Mentionable, Permissions};
use poise::Command;
use campus_util::abort_with;
use campus_util::extensions::*;
use campus_util::prelude::*;
use campus_util::util;

pub mod errors;
pub use errors::*;

use crate::checks::PermissionLevel;

pub mod help;
pub mod memlist;
pub mod nick;
pub mod poise_commands;
pub mod profile;
pub mod reaction_role;
pub mod small;

pub fn all_commands() -> Vec<poise::Command<UserData, Error>> {
    let mut all_commands = vec![
        // General
        help::help(),
        small::invite(),
        profile::profile(),
        nick::nick(),
        memlist::memlist(),
        // Mod-only
        reaction_role::reactionrole(),
        poise_commands::register(),
        poise_commands::delete(),
    ];
    for command in all_commands.iter_mut() {
        preprocess_command(command);
    }
    all_commands
}

pub fn preprocess_command(command: &mut Command<UserData, anyhow::Error>) {
    if let Some(meta) = command.custom_data.downcast_ref::<CmdMeta>() {
        match meta.perms {
            PermissionLevel::Mod => {
                command.checks.push(|ctx| Box::pin(crate::checks::check_is_moderator(ctx)))
            }
            PermissionLevel::Verified => {
                command.checks.push(|ctx| Box::pin(crate::checks::check_is_verified(ctx)))
            }
            PermissionLevel::Linked => {
                command.checks.push(|ctx| Box::pin(crate::checks::check_is_linked(ctx)))
            }
            PermissionLevel::User => {}
        }
        command.default_member_permissions = match meta.perms {
            PermissionLevel::Mod => Permissions::MANAGE_ROLES,
            _ => Permissions::empty(),
        };
        command.category = Some(command.category.clone().unwrap_or_else(|| {
            match meta.perms {
                PermissionLevel::Mod => "Moderation",
                _ => "Member",
            }
            .to_string()
        }));
    }

    for subcommand in command.subcommands.iter_mut() {
        preprocess_command(subcommand);
    }
}

/// The given member, or the author of the command if there is none.
pub async fn member_or_self(ctx: Ctx<'_>, member: Option<Member>) -> Res<Member> {
    if let Some(member) = member {
        Ok(member)
    } else {
        Ok(ctx
            .author_member()
            .await
            .user_error("failed to fetch message author")?
            .into_owned())
    }
}

pub struct CmdMeta {
    perms: PermissionLevel,
}
