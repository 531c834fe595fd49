//! User, Article and Read generators

use chrono::{Duration, NaiveDateTime};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::sync::Arc;

use super::content::{self, random_authors, random_string, random_tags};
use super::distribution::{Distributions, ReadProbabilities};
use super::referential::{ReferentialIndex, FALLBACK_LANGUAGE, FALLBACK_REGION};
use super::RecordSource;
use crate::model::{Article, Read, User};

/// Seeded RNG for one generator stream, or an entropy RNG when unseeded.
/// Streams are offset so the three generators never share a sequence.
pub fn stream_rng(seed: Option<u64>, stream: u64) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed.wrapping_add(stream.wrapping_mul(0x9E37_79B9_7F4A_7C15))),
        None => StdRng::from_entropy(),
    }
}

/// Day offset of `index` when `total` records are spread over `spread_days`
fn spread_offset(index: usize, total: usize, spread_days: i64) -> i64 {
    if total == 0 {
        return 0;
    }
    ((index as f64 / total as f64) * spread_days as f64) as i64
}

pub struct UserGenerator<'a> {
    rng: StdRng,
    dists: Distributions,
    base_time: NaiveDateTime,
    index: &'a mut ReferentialIndex,
}

impl<'a> UserGenerator<'a> {
    pub fn new(
        rng: StdRng,
        dists: Distributions,
        base_time: NaiveDateTime,
        index: &'a mut ReferentialIndex,
    ) -> Self {
        Self {
            rng,
            dists,
            base_time,
            index,
        }
    }
}

impl RecordSource for UserGenerator<'_> {
    type Record = User;

    fn generate(&mut self, index: usize, next_id: u64) -> Option<User> {
        let rng = &mut self.rng;
        let region = self.dists.region.sample(rng);
        let uid = format!("u{}", index);
        self.index.record_user(&uid, region);

        Some(User {
            id: next_id,
            timestamp: self.base_time + Duration::seconds(index as i64),
            name: format!("user{}", index),
            gender: self.dists.gender.sample(rng),
            email: format!("user{}@example.com", index),
            phone: format!("+1{}", rng.gen_range(1_000_000_000u64..=9_999_999_999)),
            dept: format!("dept{}", rng.gen_range(0..=19)),
            grade: format!("grade{}", rng.gen_range(1..=4)),
            language: self.dists.user_language.sample(rng),
            region,
            role: format!("role{}", rng.gen_range(0..=2)),
            prefer_tags: random_tags(rng, 3),
            obtained_credits: rng.gen_range(0..=99),
            uid,
        })
    }
}

pub struct ArticleGenerator<'a> {
    rng: StdRng,
    dists: Distributions,
    base_time: NaiveDateTime,
    total: usize,
    spread_days: i64,
    articles_with_video: usize,
    index: &'a mut ReferentialIndex,
}

impl<'a> ArticleGenerator<'a> {
    pub fn new(
        rng: StdRng,
        dists: Distributions,
        base_time: NaiveDateTime,
        total: usize,
        spread_days: i64,
        articles_with_video: usize,
        index: &'a mut ReferentialIndex,
    ) -> Self {
        Self {
            rng,
            dists,
            base_time,
            total,
            spread_days,
            articles_with_video,
            index,
        }
    }
}

impl RecordSource for ArticleGenerator<'_> {
    type Record = Article;

    fn generate(&mut self, index: usize, next_id: u64) -> Option<Article> {
        let rng = &mut self.rng;
        let category = content::category(index);
        let topic = content::text_topic(index);
        let language = self.dists.article_language.sample(rng);
        let aid = format!("a{}", index);
        self.index.record_article(&aid, language);

        let day_offset = spread_offset(index, self.total, self.spread_days);
        let timestamp = self.base_time
            + Duration::days(day_offset)
            + Duration::hours(rng.gen_range(0..=23))
            + Duration::minutes(rng.gen_range(0..=59));

        let tag_count = rng.gen_range(1..=5);
        Some(Article {
            id: next_id,
            category,
            timestamp,
            title: format!("Article Title {}: {}", index, random_string(rng, 20)),
            abstract_text: format!(
                "Abstract for article {}: A comprehensive overview of {} topics.",
                index, category
            ),
            article_tags: random_tags(rng, tag_count),
            authors: random_authors(rng),
            language,
            text: format!(
                "Full text content for article {} in category {} (text from {}). ",
                index, category, topic
            )
            .repeat(50),
            text_path: format!("/articles/article{}/text.txt", index),
            image_path: format!("/articles/article{}/image.jpg", index),
            video_path: (index < self.articles_with_video)
                .then(|| format!("/articles/article{}/video.mp4", index)),
            aid,
        })
    }
}

/// Read generator. Holds the frozen referential index; a candidate read is
/// accepted with the `read` probability of its (region, language) pair.
pub struct ReadGenerator {
    rng: StdRng,
    base_time: NaiveDateTime,
    users: usize,
    articles: usize,
    total: usize,
    spread_days: i64,
    index: Arc<ReferentialIndex>,
    fallbacks: u64,
}

impl ReadGenerator {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        rng: StdRng,
        base_time: NaiveDateTime,
        users: usize,
        articles: usize,
        total: usize,
        spread_days: i64,
        index: Arc<ReferentialIndex>,
    ) -> Self {
        Self {
            rng,
            base_time,
            users,
            articles,
            total,
            spread_days,
            index,
            fallbacks: 0,
        }
    }

    /// Lookups that missed the index and used the fallback pair
    pub fn fallbacks(&self) -> u64 {
        self.fallbacks
    }
}

impl RecordSource for ReadGenerator {
    type Record = Read;

    fn generate(&mut self, index: usize, next_id: u64) -> Option<Read> {
        if self.users == 0 || self.articles == 0 {
            return None;
        }
        let rng = &mut self.rng;
        let uid = format!("u{}", rng.gen_range(0..self.users));
        let aid = format!("a{}", rng.gen_range(0..self.articles));

        let region = self.index.region_of(&uid);
        let language = self.index.language_of(&aid);
        if region.is_none() || language.is_none() {
            self.fallbacks += 1;
        }
        let region = region.unwrap_or(FALLBACK_REGION);
        let probs = ReadProbabilities::for_pair(region, language.unwrap_or(FALLBACK_LANGUAGE));

        if rng.gen::<f64>() > probs.read {
            return None;
        }

        let day_offset = spread_offset(index, self.total, self.spread_days);
        let timestamp = self.base_time
            + Duration::days(day_offset)
            + Duration::hours(rng.gen_range(0..=23))
            + Duration::minutes(rng.gen_range(0..=59))
            + Duration::seconds(rng.gen_range(0..=59));

        let read_time_length = rng.gen_range(1..=300);
        let agree = rng.gen::<f64>() < probs.agree;
        let comment = rng.gen::<f64>() < probs.comment;
        let share = rng.gen::<f64>() < probs.share;

        Some(Read {
            id: next_id,
            timestamp,
            region,
            read_time_length,
            agree_or_not: agree as u8,
            comment_or_not: comment as u8,
            comment_detail: comment.then(|| format!("Comment on article {} by user {}", aid, uid)),
            share_or_not: share as u8,
            uid,
            aid,
        })
    }
}
