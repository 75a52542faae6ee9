//! The static emoji table. It is a JSON object of named categories,
//! each mapping a short key to a unicode emoji or custom emoji markup (`<:name:id>`).

use std::{collections::BTreeMap, path::Path};

use anyhow::{Context, Result};
use campus_db::reaction_roles::EmojiKey;
use poise::serenity_prelude::{EmojiId, ReactionType};
use serde::Deserialize;

pub const CATEGORY_UTILITY: &str = "utility";
pub const CATEGORY_GAMES: &str = "games";

#[derive(Debug, Default, Deserialize)]
#[serde(transparent)]
pub struct EmojiTable {
    categories: BTreeMap<String, BTreeMap<String, String>>,
}

impl EmojiTable {
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = tokio::fs::read(path)
            .await
            .with_context(|| format!("Failed to read emoji table {}", path.display()))?;
        Self::from_json(&content).with_context(|| format!("Malformed emoji table {}", path.display()))
    }

    pub fn from_json(content: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(content)?)
    }

    /// The raw value of an emoji, as it can be used in message text.
    pub fn get(&self, category: &str, key: &str) -> Option<&str> {
        self.categories.get(category)?.get(key).map(String::as_str)
    }

    /// Like [`Self::get`], but falls back to an empty string for missing entries.
    pub fn utility(&self, key: &str) -> &str {
        self.get(CATEGORY_UTILITY, key).unwrap_or_default()
    }

    /// Look up a game emoji by its key, ready to be used as a reaction.
    pub fn game(&self, key: &str) -> Option<ReactionType> {
        self.get(CATEGORY_GAMES, key).map(parse_reaction)
    }

    pub fn game_keys(&self) -> impl Iterator<Item = &str> {
        self.categories.get(CATEGORY_GAMES).into_iter().flat_map(|x| x.keys().map(String::as_str))
    }

    /// Find the full reaction for a custom emoji id among the game emoji.
    pub fn find_custom_game(&self, id: EmojiId) -> Option<ReactionType> {
        self.categories
            .get(CATEGORY_GAMES)?
            .values()
            .map(|x| parse_reaction(x))
            .find(|x| matches!(x, ReactionType::Custom { id: found, .. } if *found == id))
    }

    /// Turn a stored emoji back into a reaction. Custom emoji are looked up in the game emoji to recover their name.
    pub fn reaction_for(&self, key: &EmojiKey) -> ReactionType {
        match key {
            EmojiKey::Unicode(emoji) => ReactionType::Unicode(emoji.clone()),
            EmojiKey::Custom(id) => {
                let id = EmojiId::new(*id);
                self.find_custom_game(id).unwrap_or(ReactionType::Custom { animated: false, id, name: None })
            }
        }
    }
}

/// Custom emoji markup becomes a custom reaction, everything else is taken as a unicode emoji.
pub fn parse_reaction(value: &str) -> ReactionType {
    match serenity::utils::parse_emoji(value) {
        Some(emoji) => {
            ReactionType::Custom { animated: emoji.animated, id: emoji.id, name: Some(emoji.name) }
        }
        None => ReactionType::Unicode(value.to_string()),
    }
}
