//! Configuration options for the MDP solver.
//!
//! This module provides the tuning constants of value iteration (discount
//! factor and convergence threshold) together with the optional sweep
//! ceiling and random seed, plus the statistics reported after solving.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration for the MDP solver.
///
/// # Example
/// ```
/// use dice_mdp_solver::mdp::SolverConfig;
///
/// let config = SolverConfig::default().with_gamma(0.9).with_theta(0.01);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    /// Discount factor (γ) applied to continuation values.
    ///
    /// Must be finite and non-negative. Values of 1 or more are accepted but
    /// value iteration is then not guaranteed to converge.
    #[serde(default = "default_gamma")]
    pub gamma: f64,

    /// Convergence threshold (θ).
    ///
    /// Iteration stops after the first sweep whose largest value change is
    /// below this. Must be strictly positive.
    #[serde(default = "default_theta")]
    pub theta: f64,

    /// Maximum number of sweeps before giving up.
    ///
    /// `None` iterates until convergence with no limit, so a configuration
    /// that never converges blocks the caller.
    #[serde(default)]
    pub max_sweeps: Option<u64>,

    /// Random seed for the initial policy.
    ///
    /// If `None`, the initial policy is drawn from an entropy-seeded RNG.
    #[serde(default)]
    pub seed: Option<u64>,
}

fn default_gamma() -> f64 {
    0.95
}

fn default_theta() -> f64 {
    0.001
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            gamma: default_gamma(),
            theta: default_theta(),
            max_sweeps: None,
            seed: None,
        }
    }
}

impl SolverConfig {
    /// Create a new config with the given discount factor and threshold.
    pub fn new(gamma: f64, theta: f64) -> Self {
        Self {
            gamma,
            theta,
            ..Default::default()
        }
    }

    /// Builder method: set the discount factor.
    pub fn with_gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Builder method: set the convergence threshold.
    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    /// Builder method: cap the number of sweeps.
    pub fn with_max_sweeps(mut self, max_sweeps: u64) -> Self {
        self.max_sweeps = Some(max_sweeps);
        self
    }

    /// Builder method: set random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Validate the configuration and return any errors.
    pub fn validate(&self) -> Result<(), ConfigError> {
        // NaN fails the comparison, so it is rejected too
        if !(self.theta > 0.0) {
            return Err(ConfigError::InvalidThreshold(self.theta));
        }

        if !self.gamma.is_finite() || self.gamma < 0.0 {
            return Err(ConfigError::InvalidDiscount(self.gamma));
        }

        if self.max_sweeps == Some(0) {
            return Err(ConfigError::InvalidSweepLimit);
        }

        Ok(())
    }

    /// Load a configuration from a JSON file.
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::Io(e.to_string()))?;
        Self::from_json_str(&content)
    }

    /// Parse a configuration from a JSON string.
    ///
    /// Missing fields take their default values.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }
}

/// Errors that can occur when validating solver configuration.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// Convergence threshold is not strictly positive.
    #[error("convergence threshold {0} must be greater than 0")]
    InvalidThreshold(f64),
    /// Discount factor is negative or not finite.
    #[error("discount factor {0} must be finite and non-negative")]
    InvalidDiscount(f64),
    /// Sweep ceiling of zero can never produce a policy.
    #[error("max_sweeps must be at least 1")]
    InvalidSweepLimit,
    /// Config file could not be read.
    #[error("failed to read config: {0}")]
    Io(String),
    /// Config file is not valid JSON for this struct.
    #[error("failed to parse config: {0}")]
    Parse(String),
}

/// Statistics collected while solving.
#[derive(Debug, Clone, Default)]
pub struct SolverStats {
    /// Number of full sweeps over the state space.
    pub sweeps: u64,

    /// Number of states in the value table.
    pub states: usize,

    /// Number of actions considered per state.
    pub actions: usize,

    /// Largest value change in the final sweep.
    pub final_delta: f64,

    /// Distinct (action, state) transitions computed by the game model.
    pub cached_transitions: usize,

    /// Transition lookups answered from the cache.
    pub cache_hits: u64,

    /// Wall-clock time spent solving (in seconds).
    pub elapsed_seconds: f64,

    /// Sweeps per second.
    pub sweeps_per_second: f64,
}

impl SolverStats {
    /// Create new empty stats.
    pub fn new() -> Self {
        Self::default()
    }

    /// Update sweeps per second based on elapsed time.
    pub fn update_rate(&mut self) {
        if self.elapsed_seconds > 0.0 {
            self.sweeps_per_second = self.sweeps as f64 / self.elapsed_seconds;
        }
    }
}

/// Progress report passed to solver callbacks after every sweep.
#[derive(Debug, Clone, Copy)]
pub struct SweepProgress {
    /// Sweeps completed so far.
    pub sweep: u64,
    /// Largest value change in the sweep just completed.
    pub delta: f64,
    /// Threshold the delta must drop below.
    pub theta: f64,
    /// Elapsed time in seconds.
    pub elapsed_seconds: f64,
}
