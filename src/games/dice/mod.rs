//! Dice scoring game.
//!
//! A small stochastic single-player game that is solved exactly by value
//! iteration. The player rolls a handful of dice and repeatedly chooses which
//! dice to roll again, paying a penalty per roll, until they decide to hold.
//!
//! - [`game`]: the [`DiceGame`] model (states, actions, transitions, scoring)
//! - [`session`]: mutable play state for actually rolling dice
//! - [`agent`]: baseline agents and the play harness

pub mod agent;
pub mod game;
pub mod session;

use thiserror::Error;

use crate::mdp::SolverError;

pub use agent::{play_game_with_agent, AlwaysHoldAgent, DiceAgent, PerfectionistAgent};
pub use game::{Dice, DiceConfig, DiceGame, Reroll};
pub use session::{DiceSession, RollOutcome};

/// Errors raised while building or playing the dice game.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GameError {
    /// A game needs at least one die.
    #[error("a dice game needs at least one die")]
    NoDice,
    /// A die needs at least one side.
    #[error("a die needs at least one side")]
    NoSides,
    /// Number of face values does not match the number of sides.
    #[error("expected {expected} face values, got {got}")]
    ValueCount {
        /// Number of sides.
        expected: usize,
        /// Number of values given.
        got: usize,
    },
    /// Number of face probabilities does not match the number of sides.
    #[error("expected {expected} face probabilities, got {got}")]
    BiasLength {
        /// Number of sides.
        expected: usize,
        /// Number of probabilities given.
        got: usize,
    },
    /// Face probabilities are negative or do not sum to 1.
    #[error("face probabilities must be non-negative and sum to 1 (sum was {0})")]
    InvalidBias(f64),
    /// Two sides carry the same value.
    #[error("face values must be distinct")]
    DuplicateValue,
    /// Re-roll penalty is not a finite number.
    #[error("penalty {0} must be finite")]
    InvalidPenalty(f64),
    /// The action names a die that does not exist.
    #[error("illegal action {0}")]
    IllegalReroll(Reroll),
    /// The game has already ended.
    #[error("the game is over")]
    GameOver,
    /// The agent was shown dice it does not know about.
    #[error("unknown dice {0}")]
    UnknownDice(Dice),
    /// The solver could not answer.
    #[error(transparent)]
    Solver(#[from] SolverError),
}
