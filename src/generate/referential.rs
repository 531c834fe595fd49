//! Lookup state tying generated reads back to generated users and articles
//!
//! Filled while users and articles are generated, then frozen behind an
//! `Arc` for read generation. Owned by one pipeline invocation.

use helvetia_sql::{Select, SqlClient};
use rustc_hash::FxHashMap;
use tracing::info;

use crate::error::{PipelineError, PipelineResult};
use crate::model::{Language, Region};
use crate::schema::Keyspace;

/// Region used when a read's user is not in the index
pub const FALLBACK_REGION: Region = Region::Beijing;
/// Language used when a read's article is not in the index
pub const FALLBACK_LANGUAGE: Language = Language::En;

#[derive(Debug, Clone, Default)]
pub struct ReferentialIndex {
    uid_region: FxHashMap<String, Region>,
    aid_language: FxHashMap<String, Language>,
}

impl ReferentialIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_user(&mut self, uid: &str, region: Region) {
        self.uid_region.insert(uid.to_string(), region);
    }

    pub fn record_article(&mut self, aid: &str, language: Language) {
        self.aid_language.insert(aid.to_string(), language);
    }

    pub fn region_of(&self, uid: &str) -> Option<Region> {
        self.uid_region.get(uid).copied()
    }

    pub fn language_of(&self, aid: &str) -> Option<Language> {
        self.aid_language.get(aid).copied()
    }

    pub fn user_count(&self) -> usize {
        self.uid_region.len()
    }

    pub fn article_count(&self) -> usize {
        self.aid_language.len()
    }

    /// Rebuild from persisted users and articles, for generating reads in
    /// a run that did not generate them.
    pub async fn load<C: SqlClient + ?Sized>(client: &C) -> PipelineResult<Self> {
        let mut index = Self::new();

        let users = client
            .select(&Select::new(Keyspace::User.table(), &["uid", "region"]))
            .await?;
        for row in &users {
            let uid = required(row.get_str("uid"), Keyspace::User, "uid")?;
            let region = required(row.get_str("region"), Keyspace::User, "region")?;
            index.record_user(uid, region.parse()?);
        }

        let articles = client
            .select(&Select::new(Keyspace::Article.table(), &["aid", "language"]))
            .await?;
        for row in &articles {
            let aid = required(row.get_str("aid"), Keyspace::Article, "aid")?;
            let language = required(row.get_str("language"), Keyspace::Article, "language")?;
            index.record_article(aid, language.parse()?);
        }

        info!(
            "Loaded referential index: {} users, {} articles",
            index.user_count(),
            index.article_count()
        );
        Ok(index)
    }
}

pub(crate) fn required<'a>(
    value: Option<&'a str>,
    keyspace: Keyspace,
    column: &str,
) -> PipelineResult<&'a str> {
    value.ok_or_else(|| PipelineError::MissingColumn {
        table: keyspace.table().key(),
        column: column.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::table_specs;
    use helvetia_sql::{EmbeddedClient, Insert};

    #[test]
    fn test_record_and_lookup() {
        let mut index = ReferentialIndex::new();
        index.record_user("u1", Region::HongKong);
        index.record_article("a9", Language::Zh);
        assert_eq!(index.region_of("u1"), Some(Region::HongKong));
        assert_eq!(index.language_of("a9"), Some(Language::Zh));
        assert_eq!(index.region_of("u2"), None);
    }

    #[tokio::test]
    async fn test_load_from_store() {
        let client = EmbeddedClient::with_tables(table_specs());
        let mut insert = Insert::new(Keyspace::User.table(), &["id", "uid", "region"]);
        insert.push_row(vec![1i64.into(), "u0".into(), "HongKong".into()]);
        client.insert(&insert).await.unwrap();

        let index = ReferentialIndex::load(&client).await.unwrap();
        assert_eq!(index.region_of("u0"), Some(Region::HongKong));
        assert_eq!(index.article_count(), 0);
    }

    #[tokio::test]
    async fn test_load_rejects_unknown_region() {
        let client = EmbeddedClient::with_tables(table_specs());
        let mut insert = Insert::new(Keyspace::User.table(), &["id", "uid", "region"]);
        insert.push_row(vec![1i64.into(), "u0".into(), "Atlantis".into()]);
        client.insert(&insert).await.unwrap();

        let err = ReferentialIndex::load(&client).await.unwrap_err();
        assert!(matches!(err, PipelineError::UnknownValue { .. }));
    }
}
