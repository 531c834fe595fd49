//! Deterministic index hashes and filler content

use rand::Rng;

use crate::model::{Category, TextTopic};

const ALPHANUMERIC: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Category of article `index`: a fixed linear hash giving a 45/55
/// science/technology split, reproducible without stored state.
pub fn category(index: usize) -> Category {
    if (index.wrapping_mul(31).wrapping_add(17)) % 100 < 45 {
        Category::Science
    } else {
        Category::Technology
    }
}

/// Text corpus topic for article `index`. Science maps to tech; technology
/// spreads over business/entertainment/sport by a second hash.
pub fn text_topic(index: usize) -> TextTopic {
    match category(index) {
        Category::Science => TextTopic::Tech,
        Category::Technology => match index.wrapping_mul(37).wrapping_add(13) % 3 {
            0 => TextTopic::Business,
            1 => TextTopic::Entertainment,
            _ => TextTopic::Sport,
        },
    }
}

/// Lowercase alphanumeric string
pub fn random_string<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| ALPHANUMERIC[rng.gen_range(0..ALPHANUMERIC.len())] as char)
        .collect()
}

/// `count` tags drawn from `tag1..=tag50`
pub fn random_tags<R: Rng + ?Sized>(rng: &mut R, count: usize) -> Vec<String> {
    (0..count)
        .map(|_| format!("tag{}", rng.gen_range(1..=50)))
        .collect()
}

/// One to three authors drawn from `author1..=author2000`
pub fn random_authors<R: Rng + ?Sized>(rng: &mut R) -> Vec<String> {
    let count = rng.gen_range(1..=3);
    (0..count)
        .map(|_| format!("author{}", rng.gen_range(1..=2000)))
        .collect()
}
