use super::*;

#[tracing::instrument(skip_all, fields(msg.id = %event.message_id, user.id = ?event.user_id))]
pub async fn reaction_remove(
    ctx: &client::Context,
    data: &UserData,
    event: &Reaction,
) -> Result<()> {
    let Some((guild_id, user_id, result)) = match_reaction_role(ctx, data, event).await? else {
        return Ok(());
    };
    match result {
        ReactionMatch::Apply(rule) => {
            ctx.http
                .remove_member_role(guild_id, user_id, rule.role_id, Some("Reaction role"))
                .await?;
            tracing::info!(rule.id = %rule.id, role.id = %rule.role_id, "Revoked reaction role");
        }
        ReactionMatch::Pruned(rule) => {
            tracing::info!(rule.id = %rule.id, role.id = %rule.role_id, "Ignoring reaction for a deleted role");
        }
        ReactionMatch::NoMatch => {}
    }
    Ok(())
}
