//! Hyperparameter search over the solver's discount factor and threshold.
//!
//! Every run builds a fresh solver for one (θ, γ) pair, plays a number of
//! games with the resulting policy and records the mean score and the time
//! spent. Runs are independent and execute in parallel on the rayon pool;
//! each run clones the game and derives its own seed, so a report depends
//! only on its inputs.
//!
//! - [`runner`]: random search, grid search and one-axis fine tuning
//! - [`report`]: per-run records and the summary report

pub mod report;
pub mod runner;

use thiserror::Error;

use crate::games::dice::GameError;
use crate::mdp::SolverError;

pub use report::{Averages, RunRecord, SearchReport};
pub use runner::{fine_tune_gamma, fine_tune_theta, grid_search, random_search, SearchSettings};

/// Errors raised by a search.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SearchError {
    /// No parameter values to try.
    #[error("search space is empty")]
    EmptySearchSpace,
    /// A sampling range is reversed or not finite.
    #[error("invalid {name} range [{min}, {max}]")]
    InvalidRange {
        /// Which parameter.
        name: &'static str,
        /// Lower bound.
        min: f64,
        /// Upper bound.
        max: f64,
    },
    /// A stepped range is too fine to enumerate.
    #[error("range [{start}, {end}) with step {step} has more than {} values", MAX_RANGE_VALUES)]
    TooManyValues {
        /// Range start.
        start: f64,
        /// Range end (exclusive).
        end: f64,
        /// Step between values.
        step: f64,
    },
    /// Runs must play at least one game.
    #[error("games per run must be at least 1")]
    NoGames,
    /// Building a solver failed.
    #[error(transparent)]
    Solver(#[from] SolverError),
    /// Playing a game failed.
    #[error(transparent)]
    Game(#[from] GameError),
}

/// Closed interval to sample a parameter from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    /// Lower bound.
    pub min: f64,
    /// Upper bound.
    pub max: f64,
}

impl ParamRange {
    /// Create a range.
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    fn validate(&self, name: &'static str) -> Result<(), SearchError> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(SearchError::InvalidRange {
                name,
                min: self.min,
                max: self.max,
            });
        }
        Ok(())
    }
}

/// Ranges sampled by [`random_search`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSpace {
    /// Convergence threshold range.
    pub theta: ParamRange,
    /// Discount factor range.
    pub gamma: ParamRange,
}

impl Default for SearchSpace {
    fn default() -> Self {
        Self {
            theta: ParamRange::new(0.1, 50.0),
            gamma: ParamRange::new(0.001, 0.999),
        }
    }
}

impl SearchSpace {
    /// Check both ranges.
    pub fn validate(&self) -> Result<(), SearchError> {
        self.theta.validate("theta")?;
        self.gamma.validate("gamma")
    }
}

/// `n` evenly spaced values from `start` to `end` inclusive.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Most values [`arange`] will produce.
pub const MAX_RANGE_VALUES: usize = 1_000_000;

/// Values from `start` up to but excluding `end`, `step` apart.
///
/// Returns nothing for a non-positive step or an empty interval, and
/// [`SearchError::TooManyValues`] when the range would hold more than
/// [`MAX_RANGE_VALUES`] values.
pub fn arange(start: f64, end: f64, step: f64) -> Result<Vec<f64>, SearchError> {
    if !(step > 0.0) || start >= end {
        return Ok(Vec::new());
    }
    let n = ((end - start) / step).ceil();
    if !(n <= MAX_RANGE_VALUES as f64) {
        return Err(SearchError::TooManyValues { start, end, step });
    }
    Ok((0..n as usize).map(|i| start + step * i as f64).collect())
}

/// Arithmetic mean, or `None` for an empty slice.
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_linspace() {
        assert_eq!(linspace(0.0, 1.0, 5), vec![0.0, 0.25, 0.5, 0.75, 1.0]);
        assert_eq!(linspace(2.0, 3.0, 1), vec![2.0]);
        assert!(linspace(0.0, 1.0, 0).is_empty());
    }

    #[test]
    fn test_arange() {
        let values = arange(0.1, 2.0, 0.1).unwrap();
        assert_eq!(values.len(), 19);
        assert!((values[0] - 0.1).abs() < 1e-12);
        assert!((values[18] - 1.9).abs() < 1e-9);
        assert!(arange(1.0, 0.0, 0.1).unwrap().is_empty());
        assert!(arange(0.0, 1.0, 0.0).unwrap().is_empty());
    }

    #[test]
    fn test_arange_rejects_huge_ranges() {
        assert_eq!(
            arange(0.1, 2.0, 1e-300),
            Err(SearchError::TooManyValues {
                start: 0.1,
                end: 2.0,
                step: 1e-300
            })
        );
        assert!(matches!(
            arange(0.0, f64::INFINITY, 1.0),
            Err(SearchError::TooManyValues { .. })
        ));
        assert_eq!(arange(0.0, 500_000.0, 0.5).unwrap().len(), MAX_RANGE_VALUES);
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean(&[1.0, 2.0, 6.0]), Some(3.0));
        assert_eq!(mean(&[]), None);
    }

    #[test]
    fn test_search_space_validation() {
        assert!(SearchSpace::default().validate().is_ok());

        let reversed = SearchSpace {
            gamma: ParamRange::new(0.9, 0.1),
            ..Default::default()
        };
        assert_eq!(
            reversed.validate(),
            Err(SearchError::InvalidRange {
                name: "gamma",
                min: 0.9,
                max: 0.1
            })
        );
    }
}
