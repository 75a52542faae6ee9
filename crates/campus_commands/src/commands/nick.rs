use anyhow::Context;
use poise::serenity_prelude::EditMember;
use campus_util::embeds;

use super::*;

/// Set the nickname of a member to their first name, as found in the roster.
#[poise::command(
    slash_command,
    prefix_command,
    guild_only,
    required_bot_permissions = "MANAGE_NICKNAMES",
    custom_data = "CmdMeta { perms: PermissionLevel::Verified }"
)]
pub async fn nick(
    ctx: Ctx<'_>,
    #[description = "The member to rename, defaults to you"] member: Option<Member>,
) -> Res<()> {
    let mut member = member_or_self(ctx, member).await?;
    let config = ctx.get_config();

    if !config.owners.contains(&ctx.author().id) {
        let author = ctx
            .author_member()
            .await
            .user_error("failed to fetch message author")?
            .into_owned();
        let permissions = {
            let guild = ctx.guild().context("Not in a guild")?;
            guild.member_permissions(&author)
        };
        let (required, name) = if member.user.id == author.user.id {
            (Permissions::CHANGE_NICKNAME, "Change Nickname")
        } else {
            (Permissions::MANAGE_NICKNAMES, "Manage Nicknames")
        };
        if !permissions.contains(required) {
            abort_with!(UserErr::MissingPermissions(name));
        }
    }

    let db = ctx.get_db();
    let Some(name) = db.get_roster_name(member.user.id).await? else {
        ctx.reply_embed(
            embeds::base_embed()
                .description(format!("{} not found in the database", member.mention())),
        )
        .await?;
        return Ok(());
    };

    let old_nick = member.nick.clone();
    let new_nick = first_name(&name);
    member
        .edit(ctx.serenity_context(), EditMember::new().nickname(&new_nick))
        .await
        .context("Failed to change nickname")?;
    tracing::info!(user.id = %member.user.id, nick.old = ?old_nick, nick.new = %new_nick, "Changed nickname");

    ctx.reply_embed(embeds::base_embed().description(format!(
        "Changed the nick of {} from `{}` to `{}`",
        member.mention(),
        old_nick.as_deref().unwrap_or("None"),
        new_nick
    )))
    .await?;
    Ok(())
}

/// The first word of a roster name, capitalized.
fn first_name(name: &str) -> String {
    util::capitalize(name.split_whitespace().next().unwrap_or_default())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn first_name_is_capitalized_first_word() {
        assert_eq!(first_name("ADA LOVELACE"), "Ada");
        assert_eq!(first_name("grace hopper"), "Grace");
        assert_eq!(first_name("  nikola"), "Nikola");
        assert_eq!(first_name(""), "");
    }
}
