//! Game model trait consumed by the MDP solver.
//!
//! Any finite game that can enumerate its states and actions, and describe
//! where an action leads, can be solved by [`MdpSolver`](crate::mdp::MdpSolver).
//! The solver only ever reads from the model.

use std::fmt::Debug;
use std::hash::Hash;

/// Trait for states of a game model.
///
/// States are compared and hashed by value; the solver keys its value table,
/// policy and transition cache on them.
pub trait State: Clone + Eq + Hash + Debug + Send + Sync {
    /// Human-readable label, used in error messages and verbose output.
    fn label(&self) -> String {
        format!("{:?}", self)
    }
}

/// Trait for actions of a game model.
pub trait Action: Clone + Eq + Hash + Debug + Send + Sync {
    /// Human-readable label, used in error messages and verbose output.
    fn label(&self) -> String {
        format!("{:?}", self)
    }
}

/// Outcome of taking an action from a state.
///
/// `next_states` and `probabilities` are parallel lists; the probabilities
/// are expected to sum to 1. Keeping them consistent is the model's job, the
/// solver does not check it.
#[derive(Debug, Clone, PartialEq)]
pub struct Transition<S> {
    /// States the game can move to.
    pub next_states: Vec<S>,
    /// Whether taking the action ends the game.
    pub game_over: bool,
    /// Reward for taking the action from the current state.
    pub reward: f64,
    /// Probability of each entry in `next_states`.
    pub probabilities: Vec<f64>,
}

impl<S> Transition<S> {
    /// Iterate over `(next_state, probability)` pairs.
    pub fn outcomes(&self) -> impl Iterator<Item = (&S, f64)> {
        self.next_states
            .iter()
            .zip(self.probabilities.iter().copied())
    }
}

/// The capability interface a game must provide to be solved.
///
/// # Example
/// ```ignore
/// struct CoinGame;
///
/// impl GameModel for CoinGame {
///     type State = Coin;
///     type Action = Flip;
///
///     // ... implement the four required methods
/// }
/// ```
pub trait GameModel: Send + Sync {
    /// The type representing a game state.
    type State: State;

    /// The type representing an action.
    type Action: Action;

    /// Every state the game can be in.
    ///
    /// The order is the order the solver sweeps in, so it must be stable for
    /// results to be reproducible.
    fn states(&self) -> Vec<Self::State>;

    /// Every action available to the player.
    ///
    /// Ties between equally valued actions go to the one listed first.
    fn actions(&self) -> Vec<Self::Action>;

    /// Describe what happens when `action` is taken from `state`.
    fn transition(&self, action: &Self::Action, state: &Self::State) -> Transition<Self::State>;

    /// Score awarded for ending the game in `state`.
    ///
    /// Used as the continuation value of terminal transitions in place of a
    /// next-state value.
    fn terminal_score(&self, state: &Self::State) -> f64;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_outcomes_pairs_states_with_probabilities() {
        let transition = Transition {
            next_states: vec![1u8, 2, 3],
            game_over: false,
            reward: -1.0,
            probabilities: vec![0.5, 0.25, 0.25],
        };

        let pairs: Vec<(u8, f64)> = transition.outcomes().map(|(s, p)| (*s, p)).collect();
        assert_eq!(pairs, vec![(1, 0.5), (2, 0.25), (3, 0.25)]);
    }
}
