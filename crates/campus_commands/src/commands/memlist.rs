use campus_util::embeds;

use crate::report;

use super::*;

/// Show how many students of a batch joined the server, per section.
///
/// `Joined` counts students that linked their account, `Remaining` those who did not yet,
/// `Verified` those whose identity has been confirmed.
#[poise::command(
    slash_command,
    prefix_command,
    custom_data = "CmdMeta { perms: PermissionLevel::Verified }"
)]
pub async fn memlist(
    ctx: Ctx<'_>,
    #[description = "The batch, ex. 2024"] batch: i64,
) -> Res<()> {
    let db = ctx.get_db();
    let sections = db.get_batch_section_stats(batch).await?;

    match report::format_section_report(&sections) {
        Some(table) => {
            ctx.reply_embed(embeds::base_embed().description(format!("```swift\n{}```", table)))
                .await?;
        }
        None => {
            ctx.say_error(format!("No records found for batch {}", batch)).await?;
        }
    }
    Ok(())
}
