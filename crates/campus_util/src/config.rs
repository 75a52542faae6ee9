use std::{collections::HashSet, path::PathBuf};

use poise::serenity_prelude::{RoleId, UserId};

use crate::util::{optional_env_var, required_env_var};

#[derive(Debug)]
pub struct Config {
    pub discord_token: String,

    pub owners: HashSet<UserId>,
    pub moderator_roles: Vec<RoleId>,

    pub reaction_roles_path: PathBuf,
    pub emojis_path: PathBuf,
}

impl Config {
    pub fn from_environment() -> anyhow::Result<Self> {
        Ok(Config {
            discord_token: required_env_var("TOKEN")?,
            owners: parse_id_list(&required_env_var("OWNERS")?)?,
            moderator_roles: parse_id_list(&optional_env_var("MODERATOR_ROLES").unwrap_or_default())?,
            reaction_roles_path: optional_env_var("REACTION_ROLES_PATH")
                .unwrap_or_else(|| "db/reaction_roles.json".to_string())
                .into(),
            emojis_path: optional_env_var("EMOJIS_PATH")
                .unwrap_or_else(|| "db/emojis.json".to_string())
                .into(),
        })
    }
}

/// Parse a comma separated list of ids, ignoring empty entries.
fn parse_id_list<T, C>(value: &str) -> anyhow::Result<C>
where
    T: std::str::FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
    C: FromIterator<T>,
{
    value
        .split(',')
        .map(str::trim)
        .filter(|x| !x.is_empty())
        .map(|x| Ok(x.parse()?))
        .collect::<anyhow::Result<_>>()
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn id_lists_skip_blank_entries() {
        let owners: HashSet<UserId> = parse_id_list("1, 2,,3 ").unwrap();
        assert_eq!(owners, [1, 2, 3].into_iter().map(UserId::new).collect());

        let roles: Vec<RoleId> = parse_id_list("").unwrap();
        assert!(roles.is_empty());

        assert!(parse_id_list::<RoleId, Vec<_>>("12,abc").is_err());
    }
}
