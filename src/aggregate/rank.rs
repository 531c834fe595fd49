//! Popularity ranking (PopularRank)
//!
//! For each granularity and each bucket between the earliest and latest
//! article dates, the top articles by read count among those published on
//! or before the bucket's upper edge. Eligibility is cumulative, so a later
//! bucket of the same granularity always sees a superset of an earlier one.
//! The table is rebuilt from scratch on every run.

use chrono::{Local, NaiveDate};
use helvetia_sql::{Delete, Insert, Select, SqlClient};
use rustc_hash::FxHashMap;
use tracing::{debug, info};

use super::bucket::{anchors, upper_edge};
use crate::config::RankConfig;
use crate::error::PipelineResult;
use crate::generate::referential::required;
use crate::model::{Granularity, PopularRank};
use crate::pipeline::session::OpenSessions;
use crate::pipeline::SessionFactory;
use crate::schema::{Keyspace, POPULAR_RANK_COLUMNS};

/// Rows per insert when persisting rankings
const INSERT_CHUNK: usize = 1000;

/// An article joined with its read count
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArticleScore {
    pub aid: String,
    /// Publication date; `None` makes the article eligible everywhere
    pub date: Option<NaiveDate>,
    pub read_num: i64,
}

/// `[min, max]` article date, or `today` for both when no article has one
pub fn date_range(articles: &[ArticleScore], today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let dates = articles.iter().filter_map(|a| a.date);
    match (dates.clone().min(), dates.max()) {
        (Some(min), Some(max)) => (min, max),
        _ => (today, today),
    }
}

/// Articles published on or before `edge`, in input order
pub fn eligible(articles: &[ArticleScore], edge: NaiveDate) -> Vec<&ArticleScore> {
    articles
        .iter()
        .filter(|a| a.date.map_or(true, |d| d <= edge))
        .collect()
}

/// First `n` aids by read count, descending. Ties keep input order.
pub fn top_aids(mut candidates: Vec<&ArticleScore>, n: usize) -> Vec<String> {
    candidates.sort_by(|a, b| b.read_num.cmp(&a.read_num));
    candidates.into_iter().take(n).map(|a| a.aid.clone()).collect()
}

pub struct PopularityRanker {
    config: RankConfig,
}

impl PopularityRanker {
    pub fn new(config: RankConfig) -> Self {
        Self { config }
    }

    /// Rank every bucket of every granularity. Ids run on across
    /// granularities in daily, weekly, monthly order.
    pub fn compute(&self, articles: &[ArticleScore], today: NaiveDate) -> Vec<PopularRank> {
        if articles.is_empty() {
            return Vec::new();
        }
        let (start, end) = date_range(articles, today);

        let mut out = Vec::new();
        for &granularity in Granularity::ALL {
            for anchor in anchors(granularity, start, end) {
                let edge = upper_edge(granularity, anchor);
                let top = top_aids(eligible(articles, edge), self.config.top_n);
                out.push(PopularRank {
                    id: out.len() as u64 + 1,
                    temporal_granularity: granularity,
                    rank_date: anchor,
                    article_aid_list: top,
                });
            }
            debug!("Ranked {} buckets so far after {}", out.len(), granularity);
        }
        out
    }

    /// Join article dates with BeRead counts. Articles without a BeRead
    /// row count as unread.
    pub async fn load<A, B>(&self, articles: &A, bereads: &B) -> PipelineResult<Vec<ArticleScore>>
    where
        A: SqlClient + ?Sized,
        B: SqlClient + ?Sized,
    {
        let counts_rows = bereads
            .select(&Select::new(Keyspace::BeRead.table(), &["aid", "readNum"]))
            .await?;
        let mut counts: FxHashMap<String, i64> = FxHashMap::default();
        for row in &counts_rows {
            let aid = required(row.get_str("aid"), Keyspace::BeRead, "aid")?;
            counts.insert(aid.to_string(), row.get_i64("readNum").unwrap_or(0));
        }

        let article_rows = articles
            .select(&Select::new(Keyspace::Article.table(), &["aid", "timestamp"]))
            .await?;
        article_rows
            .iter()
            .map(|row| {
                let aid = required(row.get_str("aid"), Keyspace::Article, "aid")?;
                Ok(ArticleScore {
                    aid: aid.to_string(),
                    date: row.get_datetime("timestamp").map(|ts| ts.date()),
                    read_num: counts.get(aid).copied().unwrap_or(0),
                })
            })
            .collect()
    }

    /// Replace the whole table with `ranks`
    pub async fn persist<C: SqlClient + ?Sized>(&self, sink: &C, ranks: &[PopularRank]) -> PipelineResult<()> {
        let removed = sink.delete(&Delete::all(Keyspace::PopularRank.table())).await?;
        debug!("Cleared {} old rankings", removed);
        for chunk in ranks.chunks(INSERT_CHUNK) {
            let mut insert = Insert::new(Keyspace::PopularRank.table(), POPULAR_RANK_COLUMNS);
            for rank in chunk {
                insert.push_row(rank.to_row()?);
            }
            sink.insert(&insert).await?;
        }
        sink.commit().await?;
        Ok(())
    }

    pub async fn run<F: SessionFactory + ?Sized>(&self, factory: &F) -> PipelineResult<usize> {
        let mut sessions = OpenSessions::default();
        let result = self.run_sessions(factory, &mut sessions).await;
        sessions.close_all().await;
        result
    }

    async fn run_sessions<F: SessionFactory + ?Sized>(
        &self,
        factory: &F,
        sessions: &mut OpenSessions,
    ) -> PipelineResult<usize> {
        let articles = sessions.open(factory, Keyspace::Article).await?;
        let bereads = sessions.open(factory, Keyspace::BeRead).await?;
        let sink = sessions.open(factory, Keyspace::PopularRank).await?;

        let scores = self.load(articles.as_ref(), bereads.as_ref()).await?;
        let ranks = self.compute(&scores, Local::now().date_naive());
        self.persist(sink.as_ref(), &ranks).await?;
        info!(
            "PopularRank complete: {} rows from {} articles (top {})",
            ranks.len(),
            scores.len(),
            self.config.top_n
        );
        Ok(ranks.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn score(aid: &str, day: Option<NaiveDate>, read_num: i64) -> ArticleScore {
        ArticleScore {
            aid: aid.into(),
            date: day,
            read_num,
        }
    }

    #[test]
    fn test_zero_articles_give_no_rows() {
        let ranker = PopularityRanker::new(RankConfig::default());
        assert!(ranker.compute(&[], date(2018, 1, 1)).is_empty());
    }

    #[test]
    fn test_undated_articles_rank_in_one_bucket_today() {
        let ranker = PopularityRanker::new(RankConfig::default());
        let today = date(2018, 6, 13); // Wednesday
        let ranks = ranker.compute(&[score("a0", None, 3), score("a1", None, 9)], today);
        assert_eq!(ranks.len(), 3);
        assert_eq!(ranks[0].rank_date, today);
        assert_eq!(ranks[1].rank_date, date(2018, 6, 11));
        assert_eq!(ranks[2].rank_date, date(2018, 6, 1));
        for rank in &ranks {
            assert_eq!(rank.article_aid_list, vec!["a1", "a0"]);
        }
    }

    #[test]
    fn test_ties_keep_input_order() {
        let articles = [
            score("a0", None, 5),
            score("a1", None, 7),
            score("a2", None, 5),
            score("a3", None, 7),
        ];
        let all: Vec<&ArticleScore> = articles.iter().collect();
        assert_eq!(top_aids(all.clone(), 3), vec!["a1", "a3", "a0"]);
        assert_eq!(top_aids(all, 10).len(), 4);
    }

    #[test]
    fn test_buckets_accumulate_and_ids_run_on() {
        let ranker = PopularityRanker::new(RankConfig { top_n: 2 });
        let articles = [
            score("a0", Some(date(2017, 9, 25)), 1),
            score("a1", Some(date(2017, 9, 26)), 10),
            score("a2", Some(date(2017, 10, 2)), 5),
        ];
        let ranks = ranker.compute(&articles, date(2020, 1, 1));

        let daily: Vec<&PopularRank> = ranks
            .iter()
            .filter(|r| r.temporal_granularity == Granularity::Daily)
            .collect();
        assert_eq!(daily.len(), 8);
        assert_eq!(daily[0].article_aid_list, vec!["a0"]);
        assert_eq!(daily[1].article_aid_list, vec!["a1", "a0"]);
        assert_eq!(daily[7].article_aid_list, vec!["a1", "a2"]);

        let weekly: Vec<&PopularRank> = ranks
            .iter()
            .filter(|r| r.temporal_granularity == Granularity::Weekly)
            .collect();
        assert_eq!(weekly.len(), 2);
        assert_eq!(weekly[0].article_aid_list, vec!["a1", "a0"]);

        let monthly: Vec<&PopularRank> = ranks
            .iter()
            .filter(|r| r.temporal_granularity == Granularity::Monthly)
            .collect();
        assert_eq!(monthly.len(), 2);
        assert_eq!(monthly[0].rank_date, date(2017, 9, 1));
        assert_eq!(monthly[1].article_aid_list, vec!["a1", "a2"]);

        let ids: Vec<u64> = ranks.iter().map(|r| r.id).collect();
        assert_eq!(ids, (1..=12).collect::<Vec<u64>>());
        assert_eq!(ranks[8].temporal_granularity, Granularity::Weekly);
    }
}
