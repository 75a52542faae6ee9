pub mod collect_interaction;
pub mod config;
pub mod embeds;
pub mod emojis;
pub mod extensions;
pub mod prelude;
pub mod util;

use std::sync::Arc;

use campus_db::{reaction_roles::ReactionRoles, Db};

#[derive(Debug, Clone)]
pub struct UserData {
    pub config: Arc<config::Config>,
    pub db: Arc<Db>,
    pub reaction_roles: Arc<ReactionRoles>,
    pub emojis: Arc<emojis::EmojiTable>,
}
