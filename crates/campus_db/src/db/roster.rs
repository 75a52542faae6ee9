use anyhow::Result;
use serenity::model::id::UserId;

use super::Db;

/// A member record as provisioned into the roster table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct RosterRecord {
    pub roll_number: i64,
    pub section: String,
    pub sub_section: String,
    pub name: String,
    pub email: String,
    pub verified: bool,
}

impl RosterRecord {
    /// Section followed by the group character of the sub-section, ex. `CS-A` + `CS-A1` -> `CS-A1`.
    pub fn section_label(&self) -> String {
        match self.sub_section.chars().nth(4) {
            Some(group) => format!("{}{}", self.section, group),
            None => self.section.clone(),
        }
    }
}

/// Per-section membership counts of one batch.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct SectionStats {
    pub section: String,
    pub joined: i64,
    pub remaining: i64,
    pub verified: i64,
}

impl Db {
    #[tracing::instrument(skip_all, fields(user.id = %user))]
    pub async fn get_roster_record(&self, user: UserId) -> Result<Option<RosterRecord>> {
        let user_id = user.get() as i64;
        Ok(sqlx::query_as::<_, RosterRecord>(
            r#"select Roll_Number as roll_number, Section as section, SubSection as sub_section,
                Name as name, Institute_Email as email, Verified = 'True' as verified
                from main where Discord_UID = ?"#,
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?)
    }

    #[tracing::instrument(skip_all, fields(user.id = %user))]
    pub async fn get_roster_name(&self, user: UserId) -> Result<Option<String>> {
        let user_id = user.get() as i64;
        Ok(sqlx::query_scalar(r#"select Name from main where Discord_UID = ?"#)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    #[tracing::instrument(skip_all, fields(batch = %batch))]
    pub async fn get_batch_section_stats(&self, batch: i64) -> Result<Vec<SectionStats>> {
        Ok(sqlx::query_as::<_, SectionStats>(
            r#"select Section as section,
                count(Discord_UID) as joined,
                count(*) - count(Discord_UID) as remaining,
                count(case when Verified = 'True' then 1 end) as verified
                from main where Batch = ? group by Section order by Section"#,
        )
        .bind(batch)
        .fetch_all(&self.pool)
        .await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    async fn seeded_db() -> Db {
        let db = Db::in_memory().await.unwrap();
        db.run_migrations().await.unwrap();
        let rows: [(i64, &str, &str, &str, i64, Option<i64>, &str); 5] = [
            (11, "CS-A", "CS-A1", "ADA LOVELACE", 2024, Some(1001), "True"),
            (12, "CS-A", "CS-A2", "alan turing", 2024, None, "False"),
            (13, "CS-B", "CS-B1", "Grace Hopper", 2024, Some(1003), "False"),
            (14, "EE-A", "EE-A1", "Nikola Tesla", 2024, Some(1004), "True"),
            (21, "CS-A", "CS-A1", "Edsger Dijkstra", 2025, Some(1005), "True"),
        ];
        for (roll, section, sub_section, name, batch, uid, verified) in rows {
            sqlx::query(
                "insert into main (Roll_Number, Section, SubSection, Name, Institute_Email, Batch, Discord_UID, Verified)
                    values (?, ?, ?, ?, ?, ?, ?, ?)",
            )
            .bind(roll)
            .bind(section)
            .bind(sub_section)
            .bind(name)
            .bind(format!("{roll}@college.example"))
            .bind(batch)
            .bind(uid)
            .bind(verified)
            .execute(&db.pool)
            .await
            .unwrap();
        }
        db
    }

    #[tokio::test]
    async fn record_found_by_discord_id() {
        let db = seeded_db().await;
        let record = db.get_roster_record(UserId::new(1001)).await.unwrap().unwrap();
        assert_eq!(record.roll_number, 11);
        assert_eq!(record.name, "ADA LOVELACE");
        assert_eq!(record.email, "11@college.example");
        assert!(record.verified);
        assert_eq!(record.section_label(), "CS-A1");

        let unverified = db.get_roster_record(UserId::new(1003)).await.unwrap().unwrap();
        assert!(!unverified.verified);
    }

    #[tokio::test]
    async fn unknown_account_has_no_record() {
        let db = seeded_db().await;
        assert_eq!(db.get_roster_record(UserId::new(4242)).await.unwrap(), None);
        assert_eq!(db.get_roster_name(UserId::new(4242)).await.unwrap(), None);
        assert_eq!(
            db.get_roster_name(UserId::new(1004)).await.unwrap().as_deref(),
            Some("Nikola Tesla")
        );
    }

    #[tokio::test]
    async fn batch_stats_are_grouped_by_section() {
        let db = seeded_db().await;
        let stats = db.get_batch_section_stats(2024).await.unwrap();
        let stats: Vec<_> = stats
            .into_iter()
            .map(|s| (s.section, s.joined, s.remaining, s.verified))
            .collect();
        assert_eq!(
            stats,
            vec![
                ("CS-A".to_string(), 1, 1, 1),
                ("CS-B".to_string(), 1, 0, 0),
                ("EE-A".to_string(), 1, 0, 1),
            ]
        );
        assert!(db.get_batch_section_stats(1999).await.unwrap().is_empty());
    }

    #[test]
    fn section_label_without_group_character() {
        let record = RosterRecord {
            roll_number: 1,
            section: "ME".to_string(),
            sub_section: "ME".to_string(),
            name: "x".to_string(),
            email: "x".to_string(),
            verified: false,
        };
        assert_eq!(record.section_label(), "ME");
    }
}
