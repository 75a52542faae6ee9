use super::*;

pub async fn ready(ctx: &client::Context, data: &UserData, data_about_bot: &Ready) -> Result<()> {
    tracing::info!(
        user.name = %data_about_bot.user.name,
        guild_count = data_about_bot.guilds.len(),
        "Campus bot is ready!"
    );
    ctx.set_activity(Some(serenity::gateway::ActivityData::listening("!help")));

    data.reaction_roles.init_guilds(data_about_bot.guilds.iter().map(|guild| guild.id)).await?;
    Ok(())
}
