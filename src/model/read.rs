//! Read event record

use chrono::NaiveDateTime;
use helvetia_sql::SqlValue;
use serde::{Deserialize, Serialize};

use super::types::Region;

/// One user reading one article. `(uid, aid)` is meant to be unique; the
/// store drops duplicates on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Read {
    pub id: u64,
    pub uid: String,
    pub aid: String,
    pub timestamp: NaiveDateTime,
    /// Copied from the reading user
    pub region: Region,
    /// Seconds
    pub read_time_length: u32,
    pub agree_or_not: u8,
    pub comment_or_not: u8,
    pub comment_detail: Option<String>,
    pub share_or_not: u8,
}

impl Read {
    /// Values in `schema::READ_COLUMNS` order
    pub fn to_row(&self) -> Vec<SqlValue> {
        vec![
            self.id.into(),
            self.uid.as_str().into(),
            self.aid.as_str().into(),
            self.timestamp.into(),
            self.region.as_str().into(),
            self.read_time_length.into(),
            self.agree_or_not.into(),
            self.comment_or_not.into(),
            self.comment_detail.as_deref().into(),
            self.share_or_not.into(),
        ]
    }
}
