//! Derived tables: per-article read statistics and popularity rankings

use chrono::NaiveDate;
use helvetia_sql::SqlValue;
use serde::{Deserialize, Serialize};

use super::types::{Category, Granularity};
use crate::error::PipelineResult;

/// Per-article engagement rollup. Each count is the length of its uid list.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadStats {
    pub read_uid_list: Vec<String>,
    pub comment_uid_list: Vec<String>,
    pub agree_uid_list: Vec<String>,
    pub share_uid_list: Vec<String>,
}

impl ReadStats {
    pub fn read_num(&self) -> usize {
        self.read_uid_list.len()
    }

    pub fn comment_num(&self) -> usize {
        self.comment_uid_list.len()
    }

    pub fn agree_num(&self) -> usize {
        self.agree_uid_list.len()
    }

    pub fn share_num(&self) -> usize {
        self.share_uid_list.len()
    }
}

/// One BeRead row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeRead {
    /// 1-based position of the article in the article fetch
    pub id: u64,
    pub aid: String,
    /// Kept as text: copied from the article row as stored
    pub category: String,
    pub stats: ReadStats,
}

impl BeRead {
    /// Values in `schema::BEREAD_COLUMNS` order
    pub fn to_row(&self) -> PipelineResult<Vec<SqlValue>> {
        let s = &self.stats;
        Ok(vec![
            self.id.into(),
            self.aid.as_str().into(),
            self.category.as_str().into(),
            (s.read_num() as u64).into(),
            serde_json::to_string(&s.read_uid_list)?.into(),
            (s.comment_num() as u64).into(),
            serde_json::to_string(&s.comment_uid_list)?.into(),
            (s.agree_num() as u64).into(),
            serde_json::to_string(&s.agree_uid_list)?.into(),
            (s.share_num() as u64).into(),
            serde_json::to_string(&s.share_uid_list)?.into(),
        ])
    }
}

/// Top articles for one bucket of one granularity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopularRank {
    pub id: u64,
    pub temporal_granularity: Granularity,
    pub rank_date: NaiveDate,
    pub article_aid_list: Vec<String>,
}

impl PopularRank {
    /// Values in `schema::POPULAR_RANK_COLUMNS` order
    pub fn to_row(&self) -> PipelineResult<Vec<SqlValue>> {
        Ok(vec![
            self.id.into(),
            self.temporal_granularity.as_str().into(),
            serde_json::to_string(&self.article_aid_list)?.into(),
            self.rank_date.into(),
        ])
    }
}
