//! Reaction roles: per-guild rules that grant a role when a member reacts to a message with a given emoji,
//! and revoke it again when the reaction is removed.
//!
//! The whole rule set is kept in memory and rewritten to a single JSON file on every mutation.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use rand::{distributions::Alphanumeric, Rng};
use serde::{Deserialize, Serialize};
use serenity::{
    model::{
        channel::ReactionType,
        id::{ChannelId, GuildId, MessageId, RoleId},
    },
    prelude::RwLock,
};

pub const RULE_ID_LEN: usize = 5;
const MAX_RULE_ID_ATTEMPTS: usize = 64;

#[derive(Debug, thiserror::Error)]
pub enum ReactionRoleError {
    #[error("That message already has a reaction role for this emoji (ID `{0}`)")]
    Duplicate(String),
    #[error("Could not find an unused reaction role ID")]
    IdsExhausted,
    #[error("Unknown reaction role type {0}")]
    UnknownKind(u8),
}

/// The emoji a rule reacts to. Unicode emoji are stored as the emoji itself, custom emoji by their id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EmojiKey {
    Custom(u64),
    Unicode(String),
}

impl EmojiKey {
    pub fn from_reaction(reaction: &ReactionType) -> Option<Self> {
        match reaction {
            ReactionType::Custom { id, .. } => Some(EmojiKey::Custom(id.get())),
            ReactionType::Unicode(emoji) => Some(EmojiKey::Unicode(emoji.clone())),
            _ => None,
        }
    }
}

impl fmt::Display for EmojiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EmojiKey::Custom(id) => write!(f, "<:emoji:{id}>"),
            EmojiKey::Unicode(emoji) => write!(f, "{emoji}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum RuleKind {
    /// Grant the role on reaction, revoke it when the reaction is removed.
    Toggle,
}

impl TryFrom<u8> for RuleKind {
    type Error = ReactionRoleError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(RuleKind::Toggle),
            other => Err(ReactionRoleError::UnknownKind(other)),
        }
    }
}

impl From<RuleKind> for u8 {
    fn from(kind: RuleKind) -> u8 {
        match kind {
            RuleKind::Toggle => 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReactionRole {
    #[serde(rename = "ID")]
    pub id: String,
    pub emoji: EmojiKey,
    #[serde(with = "snowflake")]
    pub role_id: RoleId,
    #[serde(rename = "type")]
    pub kind: RuleKind,
    #[serde(with = "snowflake")]
    pub message_id: MessageId,
    #[serde(with = "snowflake")]
    pub channel_id: ChannelId,
}

/// Result of checking a reaction event against the registered rules.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReactionMatch {
    /// A rule matched and its role still exists.
    Apply(ReactionRole),
    /// A rule matched, but its role was deleted. The rule has been removed.
    Pruned(ReactionRole),
    NoMatch,
}

#[derive(Debug)]
pub struct ReactionRoles {
    path: PathBuf,
    guilds: RwLock<HashMap<GuildId, Vec<ReactionRole>>>,
}

impl ReactionRoles {
    /// Load the rules from the given file. A missing file results in an empty registry,
    /// which gets written to disk on [`Self::init_guilds`].
    #[tracing::instrument(skip_all, fields(path = %path.as_ref().display()))]
    pub async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let guilds = match tokio::fs::read(&path).await {
            Ok(content) => {
                let stored: BTreeMap<String, Vec<ReactionRole>> = serde_json::from_slice(&content)
                    .with_context(|| format!("Malformed reaction role file {}", path.display()))?;
                stored
                    .into_iter()
                    .map(|(guild, rules)| Ok((guild.parse::<GuildId>()?, rules)))
                    .collect::<Result<HashMap<_, _>>>()
                    .context("Invalid guild id in reaction role file")?
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!("No reaction role file found, starting with an empty set");
                HashMap::new()
            }
            Err(err) => return Err(err).context("Failed to read reaction role file"),
        };
        tracing::debug!(guild_count = guilds.len(), "Loaded reaction roles");
        Ok(Self { path, guilds: RwLock::new(guilds) })
    }

    /// Make sure every given guild has a (possibly empty) rule set, and that the file exists.
    #[tracing::instrument(skip_all)]
    pub async fn init_guilds(&self, guild_ids: impl IntoIterator<Item = GuildId>) -> Result<()> {
        let mut guilds = self.guilds.write().await;
        let mut changed = false;
        for guild_id in guild_ids {
            if !guilds.contains_key(&guild_id) {
                guilds.insert(guild_id, Vec::new());
                changed = true;
            }
        }
        let exists = tokio::fs::try_exists(&self.path).await.unwrap_or(false);
        if changed || !exists {
            self.persist(&guilds).await?;
        }
        Ok(())
    }

    pub async fn rules(&self, guild: GuildId) -> Vec<ReactionRole> {
        self.guilds.read().await.get(&guild).cloned().unwrap_or_default()
    }

    pub async fn find_rule(
        &self,
        guild: GuildId,
        message: MessageId,
        emoji: &EmojiKey,
    ) -> Option<ReactionRole> {
        let guilds = self.guilds.read().await;
        guilds.get(&guild)?.iter().find(|r| r.message_id == message && &r.emoji == emoji).cloned()
    }

    /// Register a new rule and return its generated ID.
    #[tracing::instrument(skip_all, fields(guild.id = %guild, msg.id = %message, role.id = %role, emoji = %emoji))]
    pub async fn add_rule(
        &self,
        guild: GuildId,
        message: MessageId,
        channel: ChannelId,
        emoji: EmojiKey,
        role: RoleId,
    ) -> Result<String> {
        let mut guilds = self.guilds.write().await;
        let rules = guilds.entry(guild).or_default();
        if let Some(existing) = rules.iter().find(|r| r.message_id == message && r.emoji == emoji) {
            return Err(ReactionRoleError::Duplicate(existing.id.clone()).into());
        }
        let id = generate_rule_id(&mut rand::thread_rng(), |candidate| {
            rules.iter().any(|r| r.id == candidate)
        })?;
        rules.push(ReactionRole {
            id: id.clone(),
            emoji,
            role_id: role,
            kind: RuleKind::Toggle,
            message_id: message,
            channel_id: channel,
        });

        if let Err(err) = self.persist(&guilds).await {
            if let Some(rules) = guilds.get_mut(&guild) {
                rules.retain(|r| r.id != id);
            }
            return Err(err);
        }
        tracing::info!(rule.id = %id, "Added reaction role");
        Ok(id)
    }

    /// Remove the rule with the given ID, returning it if it existed.
    #[tracing::instrument(skip_all, fields(guild.id = %guild, rule.id = %id))]
    pub async fn remove_rule(&self, guild: GuildId, id: &str) -> Result<Option<ReactionRole>> {
        let mut guilds = self.guilds.write().await;
        let Some(rules) = guilds.get_mut(&guild) else { return Ok(None) };
        let Some(position) = rules.iter().position(|r| r.id == id) else { return Ok(None) };
        let removed = rules.remove(position);
        if let Err(err) = self.persist(&guilds).await {
            if let Some(rules) = guilds.get_mut(&guild) {
                rules.insert(position, removed);
            }
            return Err(err);
        }
        tracing::info!("Removed reaction role");
        Ok(Some(removed))
    }

    /// Find the rule for a reaction on the given message.
    /// If the rule's role no longer exists, the rule is dropped instead.
    #[tracing::instrument(skip_all, fields(guild.id = %guild, msg.id = %message, emoji = %emoji))]
    pub async fn match_reaction(
        &self,
        guild: GuildId,
        message: MessageId,
        emoji: &EmojiKey,
        role_exists: impl Fn(RoleId) -> bool,
    ) -> Result<ReactionMatch> {
        let mut guilds = self.guilds.write().await;
        let Some(rules) = guilds.get_mut(&guild) else { return Ok(ReactionMatch::NoMatch) };
        let Some(position) =
            rules.iter().position(|r| r.message_id == message && &r.emoji == emoji)
        else {
            return Ok(ReactionMatch::NoMatch);
        };

        if role_exists(rules[position].role_id) {
            return Ok(ReactionMatch::Apply(rules[position].clone()));
        }
        let stale = rules.remove(position);
        if let Err(err) = self.persist(&guilds).await {
            if let Some(rules) = guilds.get_mut(&guild) {
                rules.insert(position, stale);
            }
            return Err(err);
        }
        tracing::info!(rule.id = %stale.id, role.id = %stale.role_id, "Pruned reaction role of deleted role");
        Ok(ReactionMatch::Pruned(stale))
    }

    async fn persist(&self, guilds: &HashMap<GuildId, Vec<ReactionRole>>) -> Result<()> {
        let stored: BTreeMap<String, &Vec<ReactionRole>> =
            guilds.iter().map(|(guild, rules)| (guild.to_string(), rules)).collect();
        let content = serde_json::to_vec(&stored)?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let tmp_path = self.path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .with_context(|| format!("Failed to write {}", tmp_path.display()))?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .with_context(|| format!("Failed to replace {}", self.path.display()))?;
        Ok(())
    }
}

/// Generate a random alphanumeric rule ID that `is_taken` does not reject.
pub fn generate_rule_id<R: Rng>(
    rng: &mut R,
    is_taken: impl Fn(&str) -> bool,
) -> Result<String, ReactionRoleError> {
    for _ in 0..MAX_RULE_ID_ATTEMPTS {
        let candidate: String =
            (0..RULE_ID_LEN).map(|_| char::from(rng.sample(Alphanumeric))).collect();
        if !is_taken(&candidate) {
            return Ok(candidate);
        }
    }
    Err(ReactionRoleError::IdsExhausted)
}

/// Snowflakes are stored as plain numbers.
mod snowflake {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer, T: Copy + Into<u64>>(id: &T, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64((*id).into())
    }

    pub fn deserialize<'de, D: Deserializer<'de>, T: From<u64>>(d: D) -> Result<T, D::Error> {
        match u64::deserialize(d)? {
            0 => Err(D::Error::custom("snowflake ids can't be zero")),
            id => Ok(T::from(id)),
        }
    }
}

#[cfg(test)]
mod test {
    use std::collections::HashSet;

    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    fn guild() -> GuildId {
        GuildId::new(100)
    }
    fn channel() -> ChannelId {
        ChannelId::new(200)
    }
    fn message() -> MessageId {
        MessageId::new(300)
    }
    fn role() -> RoleId {
        RoleId::new(400)
    }

    fn thumbs_up() -> EmojiKey {
        EmojiKey::Unicode("👍".to_string())
    }

    async fn empty_registry(dir: &tempfile::TempDir) -> ReactionRoles {
        let registry = ReactionRoles::load(dir.path().join("reaction_roles.json")).await.unwrap();
        registry.init_guilds([guild()]).await.unwrap();
        registry
    }

    #[tokio::test]
    async fn missing_file_is_seeded_with_known_guilds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("reaction_roles.json");
        let registry = ReactionRoles::load(&path).await.unwrap();
        assert!(!path.exists());

        registry.init_guilds([guild(), GuildId::new(101)]).await.unwrap();
        let content: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(content, serde_json::json!({ "100": [], "101": [] }));
    }

    #[tokio::test]
    async fn added_rule_matches_and_grants_only_its_role() {
        let dir = tempfile::tempdir().unwrap();
        let registry = empty_registry(&dir).await;
        let id = registry.add_rule(guild(), message(), channel(), thumbs_up(), role()).await.unwrap();

        let result = registry.match_reaction(guild(), message(), &thumbs_up(), |_| true).await.unwrap();
        match result {
            ReactionMatch::Apply(rule) => {
                assert_eq!(rule.id, id);
                assert_eq!(rule.role_id, role());
            }
            other => panic!("expected a match, got {other:?}"),
        }

        let other_emoji = EmojiKey::Custom(12345);
        let unrelated = registry.match_reaction(guild(), message(), &other_emoji, |_| true).await;
        assert_eq!(unrelated.unwrap(), ReactionMatch::NoMatch);
        let other_message = registry
            .match_reaction(guild(), MessageId::new(301), &thumbs_up(), |_| true)
            .await;
        assert_eq!(other_message.unwrap(), ReactionMatch::NoMatch);
    }

    #[tokio::test]
    async fn removed_rule_no_longer_matches() {
        let dir = tempfile::tempdir().unwrap();
        let registry = empty_registry(&dir).await;
        let id = registry.add_rule(guild(), message(), channel(), thumbs_up(), role()).await.unwrap();

        let removed = registry.remove_rule(guild(), &id).await.unwrap();
        assert_eq!(removed.map(|r| r.id), Some(id.clone()));
        assert_eq!(registry.remove_rule(guild(), &id).await.unwrap(), None);

        let result = registry.match_reaction(guild(), message(), &thumbs_up(), |_| true).await.unwrap();
        assert_eq!(result, ReactionMatch::NoMatch);
        assert!(registry.rules(guild()).await.is_empty());
    }

    #[tokio::test]
    async fn removing_unknown_id_does_not_touch_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let registry = empty_registry(&dir).await;
        let path = dir.path().join("reaction_roles.json");
        std::fs::write(&path, "{\"100\": []}").unwrap();

        assert_eq!(registry.remove_rule(guild(), "nope0").await.unwrap(), None);
        assert_eq!(registry.remove_rule(GuildId::new(999), "nope0").await.unwrap(), None);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{\"100\": []}");
    }

    #[tokio::test]
    async fn failed_write_keeps_rules_in_memory() {
        let dir = tempfile::tempdir().unwrap();
        let registry = empty_registry(&dir).await;
        let id = registry.add_rule(guild(), message(), channel(), thumbs_up(), role()).await.unwrap();
        std::fs::create_dir(dir.path().join("reaction_roles.json.tmp")).unwrap();

        assert!(registry.remove_rule(guild(), &id).await.is_err());
        assert_eq!(registry.rules(guild()).await.len(), 1);

        assert!(registry.match_reaction(guild(), message(), &thumbs_up(), |_| false).await.is_err());
        assert_eq!(registry.rules(guild()).await.len(), 1);

        let second = EmojiKey::Unicode("🎮".to_string());
        assert!(registry.add_rule(guild(), message(), channel(), second, role()).await.is_err());
        assert_eq!(registry.rules(guild()).await.len(), 1);

        std::fs::remove_dir(dir.path().join("reaction_roles.json.tmp")).unwrap();
        let removed = registry.remove_rule(guild(), &id).await.unwrap();
        assert_eq!(removed.map(|r| r.id), Some(id));
    }

    #[tokio::test]
    async fn stale_rule_is_pruned_only_when_role_is_gone() {
        let dir = tempfile::tempdir().unwrap();
        let registry = empty_registry(&dir).await;
        let id = registry.add_rule(guild(), message(), channel(), thumbs_up(), role()).await.unwrap();

        let kept = registry.match_reaction(guild(), message(), &thumbs_up(), |r| r == role()).await;
        assert!(matches!(kept.unwrap(), ReactionMatch::Apply(_)));
        assert_eq!(registry.rules(guild()).await.len(), 1);

        let pruned = registry.match_reaction(guild(), message(), &thumbs_up(), |_| false).await;
        match pruned.unwrap() {
            ReactionMatch::Pruned(rule) => assert_eq!(rule.id, id),
            other => panic!("expected the rule to be pruned, got {other:?}"),
        }
        assert!(registry.rules(guild()).await.is_empty());

        let reloaded = ReactionRoles::load(dir.path().join("reaction_roles.json")).await.unwrap();
        assert!(reloaded.rules(guild()).await.is_empty());
    }

    #[tokio::test]
    async fn duplicate_message_emoji_pair_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let registry = empty_registry(&dir).await;
        let id = registry.add_rule(guild(), message(), channel(), thumbs_up(), role()).await.unwrap();

        let err = registry
            .add_rule(guild(), message(), channel(), thumbs_up(), RoleId::new(401))
            .await
            .unwrap_err();
        match err.downcast_ref::<ReactionRoleError>() {
            Some(ReactionRoleError::Duplicate(existing)) => assert_eq!(existing, &id),
            other => panic!("expected duplicate error, got {other:?}"),
        }
        assert_eq!(registry.rules(guild()).await.len(), 1);

        // the same emoji on another message is fine
        registry.add_rule(guild(), MessageId::new(301), channel(), thumbs_up(), role()).await.unwrap();
    }

    #[tokio::test]
    async fn ids_stay_unique_across_adds_and_removes() {
        let dir = tempfile::tempdir().unwrap();
        let registry = empty_registry(&dir).await;
        let mut ids = Vec::new();
        for n in 1..=40u64 {
            let emoji = EmojiKey::Custom(n);
            ids.push(registry.add_rule(guild(), message(), channel(), emoji, role()).await.unwrap());
            if n % 3 == 0 {
                let victim = ids.remove(0);
                registry.remove_rule(guild(), &victim).await.unwrap().unwrap();
            }
        }

        let rules = registry.rules(guild()).await;
        let unique: HashSet<_> = rules.iter().map(|r| r.id.clone()).collect();
        assert_eq!(unique.len(), rules.len());
        assert_eq!(rules.len(), ids.len());
        for rule in &rules {
            assert_eq!(rule.id.len(), RULE_ID_LEN);
            assert!(rule.id.chars().all(|c| c.is_ascii_alphanumeric()));
        }
    }

    #[test]
    fn generated_ids_skip_taken_ones() {
        let taken: HashSet<String> = {
            let mut rng = StdRng::seed_from_u64(7);
            (0..3).map(|_| generate_rule_id(&mut rng, |_| false).unwrap()).collect()
        };
        let mut rng = StdRng::seed_from_u64(7);
        let id = generate_rule_id(&mut rng, |c| taken.contains(c)).unwrap();
        assert!(!taken.contains(&id));
        assert_eq!(id.len(), RULE_ID_LEN);

        let exhausted = generate_rule_id(&mut rng, |_| true);
        assert!(matches!(exhausted, Err(ReactionRoleError::IdsExhausted)));
    }

    #[tokio::test]
    async fn persisted_file_has_numeric_ids_and_expected_field_names() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reaction_roles.json");
        std::fs::write(
            &path,
            r#"{"100": [{"ID": "aB3x9", "emoji": 811234567890123456, "role_id": 400, "type": 1, "message_id": 300, "channel_id": 200},
                        {"ID": "Zz001", "emoji": "🎮", "role_id": 401, "type": 1, "message_id": 300, "channel_id": 200}]}"#,
        )
        .unwrap();

        let registry = ReactionRoles::load(&path).await.unwrap();
        let rules = registry.rules(guild()).await;
        assert_eq!(rules[0].emoji, EmojiKey::Custom(811234567890123456));
        assert_eq!(rules[1].emoji, EmojiKey::Unicode("🎮".to_string()));
        assert_eq!(rules[1].role_id, RoleId::new(401));

        registry.remove_rule(guild(), "aB3x9").await.unwrap().unwrap();
        let content: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(
            content,
            serde_json::json!({"100": [{"ID": "Zz001", "emoji": "🎮", "role_id": 401, "type": 1, "message_id": 300, "channel_id": 200}]})
        );
    }

    #[tokio::test]
    async fn unknown_rule_type_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reaction_roles.json");
        std::fs::write(
            &path,
            r#"{"100": [{"ID": "aB3x9", "emoji": "🎮", "role_id": 400, "type": 7, "message_id": 300, "channel_id": 200}]}"#,
        )
        .unwrap();
        assert!(ReactionRoles::load(&path).await.is_err());
    }

    #[test]
    fn emoji_key_from_reaction() {
        let custom: ReactionType = ReactionType::Custom {
            animated: false,
            id: serenity::model::id::EmojiId::new(55),
            name: Some("gg".to_string()),
        };
        assert_eq!(EmojiKey::from_reaction(&custom), Some(EmojiKey::Custom(55)));
        assert_eq!(
            EmojiKey::from_reaction(&ReactionType::Unicode("🎲".to_string())),
            Some(EmojiKey::Unicode("🎲".to_string()))
        );
    }
}
