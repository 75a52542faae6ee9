use std::env;

use anyhow::{Context, Result};
use poise::serenity_prelude::{Message, ReactionType, UserId};
use serenity::client;

/// return with an error value immediately.
#[macro_export]
macro_rules! abort_with {
    ($err:literal) => {
        return Err(UserErr::other($err).into())
    };
    ($err:expr) => {
        return Err($err.into())
    };
}

/// If the result of the given code is an error, log it nicely. Otherwise just ignore the value.
#[macro_export]
macro_rules! log_error {
    ($e:expr) => {
        if let Err(e) = $e {
            let e = anyhow::anyhow!(e);
            tracing::error!(
                error.message = %&e,
                error.root_cause = %e.root_cause(),
                "{:?}",
                e
            );
        }
    };
    ($context:expr, $e:expr $(,)?) => {
        if let Err(e) = $e {
            let e = ::anyhow::anyhow!(e).context($context);
            tracing::error!(
                error.message = %&e,
                error.root_cause = %e.root_cause(),
                "{:?}",
                e
            );
        }
    };
}

/// Get an environment variable, returning an Err with a
/// nice error message mentioning the missing variable in case the value is not found.
pub fn required_env_var(key: &str) -> Result<String> {
    env::var(key).with_context(|| format!("Missing environment variable {}", key))
}

/// Get an environment variable, treating an empty value as missing.
pub fn optional_env_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|x| !x.trim().is_empty())
}

/// Format a date like `Jan 05, 2024`.
pub fn format_date_short(date: chrono::DateTime<chrono::Utc>) -> String {
    date.format("%b %d, %Y").to_string()
}

/// Upper-case the first character and lower-case the rest, ex. `"jOHN"` -> `"John"`.
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}

/// Capitalize every whitespace separated word.
pub fn title_case(text: &str) -> String {
    text.split_whitespace().map(capitalize).collect::<Vec<_>>().join(" ")
}

pub const DELETE_EMOJI: &str = "🗑️";

/// React to the message with a wastebasket. If `user` clicks it within the timeout, the message is deleted,
/// otherwise the reaction is taken away again.
#[tracing::instrument(skip_all, fields(msg.id = %msg.id, user.id = %user))]
pub async fn delete_on_reaction(
    ctx: &client::Context,
    msg: &Message,
    user: UserId,
    timeout: std::time::Duration,
) -> Result<()> {
    let delete_emoji = ReactionType::Unicode(DELETE_EMOJI.to_string());
    msg.react(ctx, delete_emoji.clone()).await.context("Failed to add delete reaction")?;

    let reaction = msg
        .await_reaction(ctx)
        .author_id(user)
        .timeout(timeout)
        .filter({
            let delete_emoji = delete_emoji.clone();
            move |r| r.emoji == delete_emoji
        })
        .await;

    if reaction.is_some() {
        msg.delete(ctx).await.context("Failed to delete message")?;
    } else {
        msg.delete_reaction(ctx, None, delete_emoji).await.context("Failed to remove delete reaction")?;
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn capitalize_words() {
        assert_eq!(capitalize("jOHN"), "John");
        assert_eq!(capitalize(""), "");
        assert_eq!(title_case("ADA  lovelace"), "Ada Lovelace");
    }

    #[test]
    fn short_date() {
        let date = chrono::DateTime::parse_from_rfc3339("2024-01-05T10:00:00Z").unwrap();
        assert_eq!(format_date_short(date.with_timezone(&chrono::Utc)), "Jan 05, 2024");
    }
}
