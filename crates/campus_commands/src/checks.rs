use campus_util::{
    extensions::PoiseContextExt,
    prelude::{Ctx, Res},
};

/// Level of permission a given user has. Ordered such that Mod > Verified > Linked > User.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum PermissionLevel {
    /// Anyone.
    User,
    /// Has linked their account to a roster record.
    Linked,
    /// Has a roster record that has been verified.
    Verified,
    Mod,
}

pub async fn check_is_moderator(ctx: Ctx<'_>) -> Res<bool> {
    Ok(get_permission_level(ctx).await? == PermissionLevel::Mod)
}

pub async fn check_is_verified(ctx: Ctx<'_>) -> Res<bool> {
    Ok(get_permission_level(ctx).await? >= PermissionLevel::Verified)
}

pub async fn check_is_linked(ctx: Ctx<'_>) -> Res<bool> {
    Ok(get_permission_level(ctx).await? >= PermissionLevel::Linked)
}

/// Moderators are owners and members holding one of the configured moderator roles in the current guild.
#[tracing::instrument(skip_all, fields(user.id = %ctx.author().id))]
async fn is_moderator(ctx: Ctx<'_>) -> Res<bool> {
    let config = ctx.get_config();
    if config.owners.contains(&ctx.author().id) {
        return Ok(true);
    }
    if ctx.guild_id().is_none() {
        return Ok(false);
    }
    Ok(match ctx.author_member().await {
        Some(member) => member.roles.iter().any(|r| config.moderator_roles.contains(r)),
        None => false,
    })
}

#[tracing::instrument(skip_all, fields(user.id = %ctx.author().id))]
pub async fn get_permission_level(ctx: Ctx<'_>) -> Res<PermissionLevel> {
    if is_moderator(ctx).await? {
        return Ok(PermissionLevel::Mod);
    }
    let record = ctx.get_db().get_roster_record(ctx.author().id).await?;
    Ok(match record {
        Some(record) if record.verified => PermissionLevel::Verified,
        Some(_) => PermissionLevel::Linked,
        None => PermissionLevel::User,
    })
}
