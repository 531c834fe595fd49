//! Keyspaces, tables and column orders
//!
//! Each logical table lives in its own Vitess keyspace and is sharded by its
//! explicit numeric `id`.

use helvetia_sql::{TableRef, TableSpec};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One Vitess keyspace per logical table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Keyspace {
    User,
    Article,
    Read,
    BeRead,
    PopularRank,
}

impl Keyspace {
    pub fn name(&self) -> &'static str {
        match self {
            Keyspace::User => "user_keyspace",
            Keyspace::Article => "article_keyspace",
            Keyspace::Read => "read_keyspace",
            Keyspace::BeRead => "beread_keyspace",
            Keyspace::PopularRank => "popularrank_keyspace",
        }
    }

    pub fn table_name(&self) -> &'static str {
        match self {
            Keyspace::User => "user",
            Keyspace::Article => "article",
            Keyspace::Read => "read",
            Keyspace::BeRead => "beread",
            Keyspace::PopularRank => "popular_rank",
        }
    }

    /// Keyspace-qualified table, valid on any VTGate session
    pub fn table(&self) -> TableRef {
        TableRef::qualified(self.name(), self.table_name())
    }
}

impl fmt::Display for Keyspace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub const USER_COLUMNS: &[&str] = &[
    "id", "uid", "timestamp", "name", "gender", "email", "phone", "dept", "grade",
    "language", "region", "role", "preferTags", "obtainedCredits",
];

pub const ARTICLE_COLUMNS: &[&str] = &[
    "id", "aid", "timestamp", "title", "category", "abstract", "articleTags",
    "authors", "language", "text", "textPath", "imagePath", "videoPath",
];

pub const READ_COLUMNS: &[&str] = &[
    "id", "uid", "aid", "timestamp", "region", "readTimeLength",
    "agreeOrNot", "commentOrNot", "commentDetail", "shareOrNot",
];

pub const BEREAD_COLUMNS: &[&str] = &[
    "id", "aid", "category", "readNum", "readUidList", "commentNum", "commentUidList",
    "agreeNum", "agreeUidList", "shareNum", "shareUidList",
];

/// Columns overwritten when a BeRead row already exists for the article
pub const BEREAD_UPDATE_COLUMNS: &[&str] = &[
    "readNum", "readUidList", "commentNum", "commentUidList",
    "agreeNum", "agreeUidList", "shareNum", "shareUidList",
];

/// Refreshed to `CURRENT_TIMESTAMP` each time a BeRead row is rewritten
pub const BEREAD_STAMP_COLUMN: &str = "timestamp";

pub const POPULAR_RANK_COLUMNS: &[&str] = &["id", "temporalGranularity", "articleAidList", "rankDate"];

/// Table shapes for the embedded client, with the unique keys the real
/// schema declares.
pub fn table_specs() -> Vec<TableSpec> {
    let mut beread_columns = BEREAD_COLUMNS.to_vec();
    beread_columns.push(BEREAD_STAMP_COLUMN);
    vec![
        TableSpec::new(Keyspace::User.table(), USER_COLUMNS)
            .unique(&["id"])
            .unique(&["uid"]),
        TableSpec::new(Keyspace::Article.table(), ARTICLE_COLUMNS)
            .unique(&["id"])
            .unique(&["aid"]),
        TableSpec::new(Keyspace::Read.table(), READ_COLUMNS)
            .unique(&["id"])
            .unique(&["uid", "aid"]),
        TableSpec::new(Keyspace::BeRead.table(), &beread_columns)
            .unique(&["id"])
            .unique(&["aid"]),
        TableSpec::new(Keyspace::PopularRank.table(), POPULAR_RANK_COLUMNS).unique(&["id"]),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_qualified_tables() {
        assert_eq!(Keyspace::Read.table().to_string(), "`read_keyspace`.`read`");
        assert_eq!(Keyspace::PopularRank.table().key(), "popularrank_keyspace.popular_rank");
    }

    #[test]
    fn test_every_keyspace_has_a_spec() {
        let specs = table_specs();
        for ks in [
            Keyspace::User,
            Keyspace::Article,
            Keyspace::Read,
            Keyspace::BeRead,
            Keyspace::PopularRank,
        ] {
            assert!(specs.iter().any(|s| s.table == ks.table()));
        }
    }
}
