//! Game implementations for the MDP solver.
//!
//! ## Available Games
//!
//! - [`dice`]: Dice scoring game where repeated faces are flipped
//!
//! ## Adding New Games
//!
//! To add a new game:
//!
//! 1. Create a new module under `src/games/`
//! 2. Define state and action types implementing `State` and `Action`
//! 3. Implement the `GameModel` trait
//! 4. Add tests that verify expected behavior
//!
//! See the [`dice`] module for a complete example.

pub mod dice;
