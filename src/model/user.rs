//! User record

use chrono::NaiveDateTime;
use helvetia_sql::SqlValue;
use serde::{Deserialize, Serialize};

use super::types::{Gender, Language, Region};
use crate::error::PipelineResult;

/// A generated user. `id` is the shard key; `uid` is the handle reads refer to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: u64,
    pub uid: String,
    pub timestamp: NaiveDateTime,
    pub name: String,
    pub gender: Gender,
    pub email: String,
    pub phone: String,
    pub dept: String,
    pub grade: String,
    pub language: Language,
    pub region: Region,
    pub role: String,
    pub prefer_tags: Vec<String>,
    pub obtained_credits: u32,
}

impl User {
    /// Values in `schema::USER_COLUMNS` order
    pub fn to_row(&self) -> PipelineResult<Vec<SqlValue>> {
        Ok(vec![
            self.id.into(),
            self.uid.as_str().into(),
            self.timestamp.into(),
            self.name.as_str().into(),
            self.gender.as_str().into(),
            self.email.as_str().into(),
            self.phone.as_str().into(),
            self.dept.as_str().into(),
            self.grade.as_str().into(),
            self.language.as_str().into(),
            self.region.as_str().into(),
            self.role.as_str().into(),
            serde_json::to_string(&self.prefer_tags)?.into(),
            self.obtained_credits.into(),
        ])
    }
}
