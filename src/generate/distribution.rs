//! Discrete distributions used by the record generators

use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;

use crate::error::{PipelineError, PipelineResult};
use crate::model::{Gender, Language, Region};

/// Categorical distribution over a fixed set of values
#[derive(Debug, Clone)]
pub struct Weighted<T> {
    choices: Vec<T>,
    index: WeightedIndex<f64>,
}

impl<T: Copy> Weighted<T> {
    /// Weights need not sum to exactly 1; they are normalised.
    pub fn new(choices: &[T], weights: &[f64]) -> PipelineResult<Self> {
        if choices.len() != weights.len() {
            return Err(PipelineError::Config(format!(
                "{} choices but {} weights",
                choices.len(),
                weights.len()
            )));
        }
        Ok(Self {
            choices: choices.to_vec(),
            index: WeightedIndex::new(weights)?,
        })
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> T {
        self.choices[self.index.sample(rng)]
    }
}

/// The fixed attribute distributions of the benchmark population
#[derive(Debug, Clone)]
pub struct Distributions {
    pub region: Weighted<Region>,
    pub user_language: Weighted<Language>,
    pub article_language: Weighted<Language>,
    pub gender: Weighted<Gender>,
}

impl Distributions {
    pub fn standard() -> PipelineResult<Self> {
        Ok(Self {
            region: Weighted::new(&[Region::Beijing, Region::HongKong], &[0.6, 0.4])?,
            user_language: Weighted::new(&[Language::En, Language::Zh], &[0.2, 0.8])?,
            article_language: Weighted::new(&[Language::En, Language::Zh], &[0.5, 0.5])?,
            gender: Weighted::new(
                &[Gender::Male, Gender::Female, Gender::Other],
                &[0.5, 0.33, 0.17],
            )?,
        })
    }
}

/// Engagement probabilities for one (user region, article language) pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ReadProbabilities {
    pub read: f64,
    pub agree: f64,
    pub comment: f64,
    pub share: f64,
}

impl ReadProbabilities {
    const fn new(read: f64, agree: f64, comment: f64, share: f64) -> Self {
        Self {
            read,
            agree,
            comment,
            share,
        }
    }

    pub fn for_pair(region: Region, language: Language) -> Self {
        match (region, language) {
            (Region::Beijing, Language::En) => Self::new(0.6, 0.2, 0.2, 0.1),
            (Region::Beijing, Language::Zh) => Self::new(1.0, 0.3, 0.3, 0.2),
            (Region::HongKong, Language::En) => Self::new(1.0, 0.3, 0.3, 0.2),
            (Region::HongKong, Language::Zh) => Self::new(0.8, 0.2, 0.2, 0.1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_weighted_converges() {
        let dist = Weighted::new(&[Region::Beijing, Region::HongKong], &[0.6, 0.4]).unwrap();
        let mut rng = StdRng::seed_from_u64(11);
        let n = 20_000;
        let beijing = (0..n).filter(|_| dist.sample(&mut rng) == Region::Beijing).count();
        let share = beijing as f64 / n as f64;
        assert!((share - 0.6).abs() < 0.02, "share was {}", share);
    }

    #[test]
    fn test_arbitrary_weight_vectors() {
        let dist = Weighted::new(&[1u8, 2, 3, 4], &[0.1, 0.2, 0.3, 0.4]).unwrap();
        let mut rng = StdRng::seed_from_u64(3);
        let mut seen = [0usize; 5];
        for _ in 0..10_000 {
            seen[dist.sample(&mut rng) as usize] += 1;
        }
        assert!(seen[4] > seen[3] && seen[3] > seen[2] && seen[2] > seen[1]);
    }

    #[test]
    fn test_weighted_rejects_bad_input() {
        assert!(Weighted::new(&[1u8, 2], &[1.0]).is_err());
        assert!(Weighted::new(&[1u8, 2], &[0.0, 0.0]).is_err());
        assert!(Weighted::new(&[1u8], &[-1.0]).is_err());
    }

    #[test]
    fn test_read_probabilities_table() {
        let p = ReadProbabilities::for_pair(Region::Beijing, Language::En);
        assert_eq!(p.read, 0.6);
        let p = ReadProbabilities::for_pair(Region::HongKong, Language::Zh);
        assert_eq!((p.read, p.agree, p.comment, p.share), (0.8, 0.2, 0.2, 0.1));
    }
}
