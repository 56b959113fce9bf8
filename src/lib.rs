//! # Dice MDP Solver
//!
//! A generic value iteration solver for finite Markov decision processes,
//! with a dice scoring game as its main client.
//!
//! ## Features
//!
//! - **Generic Value Iteration**: Works with any game implementing the `GameModel` trait
//! - **Memoized Transitions**: Each (action, state) pair is asked of the model once
//! - **Reproducible**: Seeded policy initialization and per-run search seeds
//! - **Hyperparameter Search**: Random, grid and fine-tune searches over θ and γ in parallel
//!
//! ## Quick Start
//!
//! ```ignore
//! use dice_mdp_solver::games::dice::{Dice, DiceGame};
//! use dice_mdp_solver::mdp::{MdpSolver, SolverConfig};
//!
//! // 1. Build a game
//! let game = DiceGame::new();
//!
//! // 2. Solve it
//! let solver = MdpSolver::new(game, SolverConfig::new(0.95, 0.001))?;
//!
//! // 3. Ask for the best move
//! let action = solver.play(&Dice::new(vec![1, 1, 6]))?;
//! ```
//!
//! ## Modules
//!
//! - [`mdp`]: Core value iteration algorithm and solver
//! - [`games`]: Game implementations (the dice game)
//! - [`search`]: Hyperparameter search over the solver's θ and γ
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Search (random / grid / tune)                 │
//! │  - Parallel runs on rayon   - Reports and JSON output           │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ builds one solver per (θ, γ)
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                   Value Iteration Solver (Generic)              │
//! │  - Bellman sweeps           - Transition cache                  │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               │ implements GameModel trait
//!                               ▼
//!                        ┌─────────────┐
//!                        │  Dice Game  │
//!                        └─────────────┘
//! ```

#![warn(missing_docs)]

/// Value iteration solver module.
///
/// This is the core module containing the generic solver.
pub mod mdp;

/// Game implementations module.
pub mod games;

/// Hyperparameter search module.
pub mod search;

// Re-export commonly used types at crate root for convenience
pub use mdp::{Action, GameModel, MdpSolver, SolverConfig, SolverError, SolverStats, State, Transition};
