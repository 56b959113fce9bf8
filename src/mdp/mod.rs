//! MDP (Markov Decision Process) solver module.
//!
//! This module provides a generic value iteration solver for finite games
//! with stochastic transitions, such as dice games where the player decides
//! which dice to re-roll.
//!
//! # Overview
//!
//! Value iteration repeatedly applies the Bellman optimality operator to a
//! table of state values:
//!
//! ```text
//! V(s) = max_a  Σ_s'  P(s' | s, a) · (R(s, a) + γ · C(s'))
//! ```
//!
//! where `C(s')` is `V(s')` for ordinary transitions and the terminal score
//! of `s` when the action ends the game. Sweeps update the table in place
//! and stop once the largest change in a sweep is below θ. The action that
//! achieved each maximum becomes the policy.
//!
//! # Usage
//!
//! 1. Implement the `GameModel` trait for your game
//! 2. Build an `MdpSolver` with your game and a `SolverConfig`
//! 3. Query the policy with `play()`
//!
//! # Example
//!
//! ```ignore
//! use dice_mdp_solver::mdp::{MdpSolver, SolverConfig};
//!
//! let game = MyGame::new();
//! let solver = MdpSolver::new(game, SolverConfig::new(0.95, 0.001))?;
//! println!("Converged in {} sweeps", solver.stats().sweeps);
//!
//! let action = solver.play(&state)?;
//! ```
//!
//! # Convergence
//!
//! For γ < 1 the Bellman operator is a contraction and the sweeps always
//! settle. For γ ≥ 1 they may not; set `max_sweeps` to get a
//! `DidNotConverge` error instead of blocking forever.

pub mod cache;
pub mod config;
pub mod model;
pub mod solver;

// Re-export main types for convenient access
pub use cache::TransitionCache;
pub use config::{ConfigError, SolverConfig, SolverStats, SweepProgress};
pub use model::{Action, GameModel, State, Transition};
pub use solver::{MdpSolver, SolverError};
