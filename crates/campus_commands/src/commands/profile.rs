use std::{collections::HashMap, time::Duration};

use campus_db::{roster::RosterRecord, Db};
use campus_util::{collect_interaction, embeds, log_error};
use poise::{
    serenity_prelude::{
        ButtonStyle, CreateActionRow, CreateButton, CreateEmbed, CreateEmbedFooter, CreateInteractionResponse,
        CreateInteractionResponseMessage, CreateMessage, RoleId, User, UserId,
    },
    CreateReply,
};

use crate::checks::check_is_moderator;

use super::*;

const PROFILE_PROMPT_TIMEOUT: Duration = Duration::from_secs(60);
const PROFILE_DELETE_TIMEOUT: Duration = Duration::from_secs(60);

/// Show the college profile of a member.
///
/// In a server you get to choose whether the profile is only shown to you or posted to the channel.
/// Looking at the profile of someone else is reserved to moderators.
#[poise::command(
    slash_command,
    prefix_command,
    aliases("p"),
    custom_data = "CmdMeta { perms: PermissionLevel::Linked }"
)]
pub async fn profile(
    ctx: Ctx<'_>,
    #[description = "The member whose profile to show"] user: Option<User>,
) -> Res<()> {
    let user = user.unwrap_or_else(|| ctx.author().clone());
    if user.id != ctx.author().id && !check_is_moderator(ctx).await? {
        abort_with!("Only moderators can look at the profile of someone else.");
    }

    let record = match find_record(&ctx.get_db(), user.id).await? {
        Ok(record) => record,
        Err(reply) => {
            ctx.say(reply).await?;
            return Ok(());
        }
    };

    let embed = make_profile_embed(ctx, &user, &record).await;

    if ctx.guild_id().is_none() {
        let msg = ctx.send(CreateReply::default().embed(embed)).await?.into_message().await?;
        log_error!(
            util::delete_on_reaction(
                ctx.serenity_context(),
                &msg,
                ctx.author().id,
                PROFILE_DELETE_TIMEOUT
            )
            .await
        );
        return Ok(());
    }

    let prompt = ctx
        .send(
            CreateReply::default()
                .content("Do you want your profile to be hidden or exposed?")
                .components(vec![CreateActionRow::Buttons(vec![
                    CreateButton::new("hidden").label("Hidden").style(ButtonStyle::Success),
                    CreateButton::new("exposed").label("Exposed").style(ButtonStyle::Danger),
                ])]),
        )
        .await?;
    let prompt_id = prompt.message().await?.id;

    let mut interactions = collect_interaction::await_component_interactions_by(
        ctx.serenity_context(),
        prompt_id,
        ctx.author().id,
        1,
        PROFILE_PROMPT_TIMEOUT,
    );
    let interaction = interactions.next(ctx.serenity_context()).await;

    match interaction {
        Some(interaction) if interaction.data.custom_id == "hidden" => {
            interaction
                .create_response(
                    ctx.serenity_context(),
                    CreateInteractionResponse::Message(
                        CreateInteractionResponseMessage::new().embed(embed).ephemeral(true),
                    ),
                )
                .await?;
            prompt.delete(ctx).await?;
            if let poise::Context::Prefix(prefix_ctx) = ctx {
                log_error!(prefix_ctx.msg.delete(ctx.serenity_context()).await);
            }
        }
        Some(interaction) => {
            interaction
                .create_response(ctx.serenity_context(), CreateInteractionResponse::Acknowledge)
                .await?;
            prompt.delete(ctx).await?;
            let msg = ctx
                .channel_id()
                .send_message(ctx.serenity_context(), CreateMessage::new().embed(embed))
                .await?;
            log_error!(
                util::delete_on_reaction(
                    ctx.serenity_context(),
                    &msg,
                    ctx.author().id,
                    PROFILE_DELETE_TIMEOUT
                )
                .await
            );
        }
        None => {
            tracing::debug!(user.id = %ctx.author().id, "Profile prompt timed out");
            prompt.delete(ctx).await?;
        }
    }
    Ok(())
}

const RECORD_NOT_FOUND: &str = "Record not found in the database.";

/// The roster record of a user, or the reply to send when they have none.
async fn find_record(db: &Db, user: UserId) -> Res<Result<RosterRecord, &'static str>> {
    Ok(db.get_roster_record(user).await?.ok_or(RECORD_NOT_FOUND))
}

async fn make_profile_embed(ctx: Ctx<'_>, user: &User, record: &RosterRecord) -> CreateEmbed {
    let emojis = ctx.get_emojis();
    let badge = if record.verified { emojis.utility("verified") } else { emojis.utility("not-verified") };

    let member = match ctx.guild_id() {
        Some(guild_id) => guild_id.member(ctx.serenity_context(), user.id).await.ok(),
        None => None,
    };

    let roles = match &member {
        Some(member) => {
            let role_names: HashMap<RoleId, String> = ctx
                .guild()
                .map(|guild| guild.roles.iter().map(|(id, role)| (*id, role.name.clone())).collect())
                .unwrap_or_default();
            let ignored = [record.section.as_str(), record.sub_section.as_str(), "@everyone"];
            role_summary(&member.roles, |id| role_names.get(&id).cloned(), &ignored)
        }
        None => "None".to_string(),
    };

    let description = format!(
        "**Roll Number:** {}\n**Section:** {}\n**Roles:** {}\n**Email:** {}",
        record.roll_number,
        record.section_label(),
        roles,
        record.email
    );

    let mut e = embeds::base_embed()
        .title(format!("{} {}", util::title_case(&record.name), badge).trim_end().to_string())
        .description(description)
        .author_user(format!("Profile of {}", user.tag()), user)
        .thumbnail(user.face());

    if let Some(member) = member {
        e = e.color_opt(member.colour(ctx.serenity_context()));
        if let Some(joined_at) = member.joined_at {
            e = e.footer(CreateEmbedFooter::new(format!(
                "Joined on {}",
                util::format_date_short(*joined_at)
            )));
        }
    }
    e
}

/// The mentions of the given roles, newest first, skipping roles whose name is ignored.
fn role_summary(
    roles: &[RoleId],
    role_name: impl Fn(RoleId) -> Option<String>,
    ignored: &[&str],
) -> String {
    let summary = roles
        .iter()
        .rev()
        .filter(|id| role_name(**id).map_or(true, |name| !ignored.contains(&name.as_str())))
        .map(|id| id.mention().to_string())
        .join(", ");
    if summary.is_empty() {
        "None".to_string()
    } else {
        summary
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn names() -> HashMap<RoleId, String> {
        [(1, "CS-A"), (2, "CS-A1"), (3, "Gamer"), (4, "Mentor"), (5, "@everyone")]
            .into_iter()
            .map(|(id, name)| (RoleId::new(id), name.to_string()))
            .collect()
    }

    #[test]
    fn role_summary_skips_section_roles() {
        let names = names();
        let roles = [1, 3, 2, 4].map(RoleId::new);
        assert_eq!(
            role_summary(&roles, |id| names.get(&id).cloned(), &["CS-A", "CS-A1", "@everyone"]),
            "<@&4>, <@&3>"
        );
    }

    #[tokio::test]
    async fn unknown_user_gets_not_found_reply() {
        let db = Db::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        let result = find_record(&db, UserId::new(4242)).await.unwrap();
        assert_eq!(result, Err(RECORD_NOT_FOUND));
    }

    #[test]
    fn role_summary_none() {
        let names = names();
        let roles = [1, 5].map(RoleId::new);
        assert_eq!(
            role_summary(&roles, |id| names.get(&id).cloned(), &["CS-A", "CS-A1", "@everyone"]),
            "None"
        );
        assert_eq!(role_summary(&[], |_| None, &[]), "None");
    }
}
