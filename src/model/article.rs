//! Article record

use chrono::NaiveDateTime;
use helvetia_sql::SqlValue;
use serde::{Deserialize, Serialize};

use super::types::{Category, Language};
use crate::error::PipelineResult;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    pub id: u64,
    pub aid: String,
    pub category: Category,
    pub timestamp: NaiveDateTime,
    pub title: String,
    #[serde(rename = "abstract")]
    pub abstract_text: String,
    pub article_tags: Vec<String>,
    pub authors: Vec<String>,
    pub language: Language,
    pub text: String,
    pub text_path: String,
    pub image_path: String,
    pub video_path: Option<String>,
}

impl Article {
    /// Values in `schema::ARTICLE_COLUMNS` order
    pub fn to_row(&self) -> PipelineResult<Vec<SqlValue>> {
        Ok(vec![
            self.id.into(),
            self.aid.as_str().into(),
            self.timestamp.into(),
            self.title.as_str().into(),
            self.category.as_str().into(),
            self.abstract_text.as_str().into(),
            serde_json::to_string(&self.article_tags)?.into(),
            serde_json::to_string(&self.authors)?.into(),
            self.language.as_str().into(),
            self.text.as_str().into(),
            self.text_path.as_str().into(),
            self.image_path.as_str().into(),
            self.video_path.as_deref().into(),
        ])
    }
}
