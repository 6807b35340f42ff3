//! Weighted random selection
//!
//! Inverse-CDF sampling over a weight list: item `i` is picked with probability
//! `weights[i] / sum(weights)`, and a weight of exactly zero is never picked.

use rand::RngCore;

use crate::error::ValidationError;
use crate::rng::unit_f64;

/// Picks items proportionally to their weights
///
/// Holds only the validated weights and their cumulative sums; randomness comes
/// from the caller on every draw.
#[derive(Debug, Clone, PartialEq)]
pub struct WeightedSelector {
    weights: Vec<f64>,
    cumulative: Vec<f64>,
    total: f64,
}

impl WeightedSelector {
    /// Validate `weights` and precompute the cumulative distribution
    pub fn new(weights: &[f64]) -> Result<Self, ValidationError> {
        validate_weights(weights)?;
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut running = 0.0;
        for &w in weights {
            running += w;
            cumulative.push(running);
        }
        Ok(Self {
            weights: weights.to_vec(),
            cumulative,
            total: running,
        })
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn total_weight(&self) -> f64 {
        self.total
    }

    /// Draw one index
    pub fn sample<R: RngCore + ?Sized>(&self, rng: &mut R) -> usize {
        let r = unit_f64(rng) * self.total;
        // First index whose cumulative weight reaches r, skipping zero weights so
        // r == 0 cannot land on a leading zero-weight item
        for (i, (&c, &w)) in self.cumulative.iter().zip(&self.weights).enumerate() {
            if w > 0.0 && c >= r {
                return i;
            }
        }
        // Rounding in the running sum: fall back to the last selectable item
        self.weights.iter().rposition(|&w| w > 0.0).unwrap_or(0)
    }

    /// Exact selection probability of each index
    pub fn probabilities(&self) -> Vec<f64> {
        self.weights.iter().map(|w| w / self.total).collect()
    }

    /// Pick an index from a one-off weight list
    pub fn select_index<R: RngCore + ?Sized>(rng: &mut R, weights: &[f64]) -> Result<usize, ValidationError> {
        Ok(Self::new(weights)?.sample(rng))
    }

    /// Pick an item from `items` using the parallel `weights`
    pub fn select<'a, T, R: RngCore + ?Sized>(
        rng: &mut R,
        items: &'a [T],
        weights: &[f64],
    ) -> Result<&'a T, ValidationError> {
        if items.len() != weights.len() {
            return Err(ValidationError::MismatchedLengths {
                items: items.len(),
                weights: weights.len(),
            });
        }
        let index = Self::select_index(rng, weights)?;
        Ok(&items[index])
    }
}

/// Check the selection preconditions without drawing
pub fn validate_weights(weights: &[f64]) -> Result<(), ValidationError> {
    if weights.is_empty() {
        return Err(ValidationError::EmptyWeights);
    }
    let mut total = 0.0;
    for (index, &weight) in weights.iter().enumerate() {
        if !weight.is_finite() {
            return Err(ValidationError::NonFiniteWeight { index });
        }
        if weight < 0.0 {
            return Err(ValidationError::NegativeWeight { index, weight });
        }
        total += weight;
    }
    if total <= 0.0 || !total.is_finite() {
        return Err(ValidationError::ZeroTotalWeight);
    }
    Ok(())
}

/// Expected proportions for a weight list (`w[i] / sum(w)`)
pub fn expected_probabilities(weights: &[f64]) -> Result<Vec<f64>, ValidationError> {
    Ok(WeightedSelector::new(weights)?.probabilities())
}

/// Pearson chi-square statistic of observed counts against expected probabilities
///
/// Categories with zero expected probability are skipped.
pub fn chi_square(observed: &[u64], expected: &[f64]) -> f64 {
    let n: u64 = observed.iter().sum();
    observed
        .iter()
        .zip(expected)
        .filter(|&(_, &p)| p > 0.0)
        .map(|(&o, &p)| {
            let e = p * n as f64;
            (o as f64 - e).powi(2) / e
        })
        .sum()
}
