use crate::{config::Config, embeds, emojis::EmojiTable, prelude::Ctx};

use campus_db::{reaction_roles::ReactionRoles, Db};
use poise::{CreateReply, ReplyHandle};
use serenity::{
    async_trait,
    builder::{CreateEmbed, CreateEmbedAuthor},
    model::{prelude::User, Colour},
};
use std::{fmt::Display, sync::Arc};

type StdResult<T, E> = std::result::Result<T, E>;

#[extend::ext(name = PoiseContextExt)]
#[async_trait]
pub impl<'a> Ctx<'a> {
    fn get_config(&self) -> Arc<Config> {
        self.data().config.clone()
    }

    fn get_db(&self) -> Arc<Db> {
        self.data().db.clone()
    }

    fn get_reaction_roles(&self) -> Arc<ReactionRoles> {
        self.data().reaction_roles.clone()
    }

    fn get_emojis(&self) -> Arc<EmojiTable> {
        self.data().emojis.clone()
    }

    /// Reply with an embed. Convenient simpler form of [`Self::reply_embed_full`].
    async fn reply_embed(&self, embed: CreateEmbed) -> StdResult<ReplyHandle<'_>, serenity::Error> {
        self.reply_embed_full(false, embed).await
    }

    /// Send an embed, making it ephemeral optionally.
    /// Will make message a reply unconditionally.
    async fn reply_embed_full(
        &self,
        ephemeral: bool,
        embed: CreateEmbed,
    ) -> StdResult<ReplyHandle<'_>, serenity::Error> {
        let reply = CreateReply::default().ephemeral(ephemeral).embed(embed).reply(true);
        self.send(reply).await
    }

    async fn say_success(
        &self,
        text: impl Display + Send + Sync + 'static,
    ) -> StdResult<ReplyHandle<'_>, serenity::Error> {
        tracing::info!(
            msg.ephemeral = true,
            msg.content = %text,
            msg.responding_to_user = %self.author().tag(),
            "Sending success message to user"
        );
        self.reply_embed_full(true, embeds::make_success_embed(&text.to_string())).await
    }

    async fn say_error(
        &self,
        text: impl Display + Send + Sync + 'static,
    ) -> StdResult<ReplyHandle<'_>, serenity::Error> {
        tracing::info!(
            msg.ephemeral = true,
            msg.content = %text,
            msg.responding_to_user = %self.author().tag(),
            "Sending error message to user"
        );
        self.reply_embed_full(true, embeds::make_error_embed(&text.to_string())).await
    }
}

#[extend::ext]
pub impl CreateEmbed {
    fn color_opt(self, c: Option<impl Into<Colour>>) -> CreateEmbed {
        match c {
            Some(c) => self.color(c),
            None => self,
        }
    }

    fn author_user(self, title: impl Into<String>, u: &User) -> Self {
        self.author(
            CreateEmbedAuthor::new(title)
                .icon_url(u.face())
                .url(format!("https://discord.com/users/{}", u.id)),
        )
    }
}
