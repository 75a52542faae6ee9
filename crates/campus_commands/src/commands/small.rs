use campus_util::embeds;

use super::*;

const SERVER_INVITES: [&str; 2] = [
    "NITKKR'24: https://discord.gg/4eF7R6afqv",
    "kkr++: https://discord.gg/epaTW7tjYR",
];

/// Get the invites of the community servers
#[poise::command(prefix_command, slash_command, aliases("inv"))]
pub async fn invite(ctx: Ctx<'_>) -> Res<()> {
    ctx.reply_embed(
        embeds::base_embed().title("Server invites").description(SERVER_INVITES.join("\n")),
    )
    .await?;
    Ok(())
}
