use futures::{stream::BoxStream, StreamExt};
use poise::serenity_prelude::{
    ComponentInteraction, ComponentInteractionCollector, CreateInteractionResponse,
    CreateInteractionResponseMessage, MessageId, UserId,
};
use serenity::client;

use crate::log_error;

/// Collects button/select interactions on a message, but only hands out those made by one user.
/// Everyone else gets told off with an ephemeral message.
pub struct UserSpecificComponentInteractionCollector {
    interactions: BoxStream<'static, ComponentInteraction>,
    user_id: UserId,
    by_user_limit: usize,
}

impl UserSpecificComponentInteractionCollector {
    pub async fn next(&mut self, ctx: &client::Context) -> Option<ComponentInteraction> {
        loop {
            if self.by_user_limit == 0 {
                return None;
            }
            let interaction = self.interactions.next().await?;
            if interaction.user.id == self.user_id {
                self.by_user_limit -= 1;
                return Some(interaction);
            }
            tracing::debug!(
                interaction.user_id = %interaction.user.id,
                expected_user_id = %self.user_id,
                "Rejecting component interaction by another user"
            );
            log_error!(
                interaction
                    .create_response(
                        ctx,
                        CreateInteractionResponse::Message(
                            CreateInteractionResponseMessage::new()
                                .content("This is not your button!")
                                .ephemeral(true),
                        ),
                    )
                    .await
            );
        }
    }
}

pub fn await_component_interactions_by(
    ctx: &client::Context,
    message_id: MessageId,
    user_id: UserId,
    by_user_limit: usize,
    timeout: std::time::Duration,
) -> UserSpecificComponentInteractionCollector {
    let interactions = ComponentInteractionCollector::new(ctx.shard.clone())
        .message_id(message_id)
        .timeout(timeout)
        .stream()
        .boxed();
    UserSpecificComponentInteractionCollector { interactions, user_id, by_user_limit }
}
