//! Synthetic record generation
//!
//! Generation is pure and total: a generator either yields a fully
//! populated record or, for reads only, `None` meaning the candidate did
//! not happen and must not consume an id.

pub mod content;
pub mod distribution;
pub mod records;
pub mod referential;

pub use content::{category, text_topic};
pub use distribution::{Distributions, ReadProbabilities, Weighted};
pub use records::{stream_rng, ArticleGenerator, ReadGenerator, UserGenerator};
pub use referential::ReferentialIndex;

use std::marker::PhantomData;

/// Anything that turns a candidate index into at most one record
pub trait RecordSource {
    type Record;

    /// Produce the candidate at `index`. `next_id` is the id the record
    /// takes if accepted.
    fn generate(&mut self, index: usize, next_id: u64) -> Option<Self::Record>;
}

/// Adapter for closures
pub struct FromFn<F, T> {
    f: F,
    _record: PhantomData<fn() -> T>,
}

pub fn from_fn<F, T>(f: F) -> FromFn<F, T>
where
    F: FnMut(usize, u64) -> Option<T>,
{
    FromFn {
        f,
        _record: PhantomData,
    }
}

impl<F, T> RecordSource for FromFn<F, T>
where
    F: FnMut(usize, u64) -> Option<T>,
{
    type Record = T;

    fn generate(&mut self, index: usize, next_id: u64) -> Option<T> {
        (self.f)(index, next_id)
    }
}

impl<S: RecordSource + ?Sized> RecordSource for &mut S {
    type Record = S::Record;

    fn generate(&mut self, index: usize, next_id: u64) -> Option<S::Record> {
        (**self).generate(index, next_id)
    }
}
