//! Fixed-size batching over a record source
//!
//! Counts accepted records separately from candidate indices: the candidate
//! index advances on every attempt, the accepted counter (and with it the
//! dense id handed to the source) only on acceptance.

use crate::generate::RecordSource;

pub struct Batches<S> {
    source: S,
    target: usize,
    batch_size: usize,
    candidates: usize,
    accepted: usize,
}

impl<S: RecordSource> Batches<S> {
    /// Yield batches until `target` records have been accepted
    pub fn new(source: S, target: usize, batch_size: usize) -> Self {
        Self {
            source,
            target,
            batch_size: batch_size.max(1),
            candidates: 0,
            accepted: 0,
        }
    }

    /// Candidate indices tried so far
    pub fn candidates(&self) -> usize {
        self.candidates
    }

    /// Records accepted so far
    pub fn accepted(&self) -> usize {
        self.accepted
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn into_source(self) -> S {
        self.source
    }
}

impl<S: RecordSource> Iterator for Batches<S> {
    type Item = Vec<S::Record>;

    fn next(&mut self) -> Option<Self::Item> {
        let remaining = self.target - self.accepted;
        if remaining == 0 {
            return None;
        }

        let mut batch = Vec::with_capacity(self.batch_size.min(remaining));
        while self.accepted < self.target && batch.len() < self.batch_size {
            let next_id = self.accepted as u64 + 1;
            let record = self.source.generate(self.candidates, next_id);
            self.candidates += 1;
            if let Some(record) = record {
                batch.push(record);
                self.accepted += 1;
            }
        }
        Some(batch)
    }
}
