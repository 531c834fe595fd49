//! Record types for the social-reading benchmark

pub mod article;
pub mod read;
pub mod stats;
pub mod types;
pub mod user;

pub use article::Article;
pub use read::Read;
pub use stats::{BeRead, PopularRank, ReadStats};
pub use types::{Category, Gender, Granularity, Language, Region, TextTopic};
pub use user::User;
