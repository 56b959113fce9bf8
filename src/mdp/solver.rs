//! Value iteration solver.
//!
//! The solver is generic over any game implementing [`GameModel`]. Building a
//! solver runs value iteration to convergence; the finished value table and
//! policy are then read-only and `play` is a constant-time lookup.

use std::time::Instant;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use thiserror::Error;

use crate::mdp::cache::TransitionCache;
use crate::mdp::config::{ConfigError, SolverConfig, SolverStats, SweepProgress};
use crate::mdp::model::{GameModel, State};

/// Errors returned by the solver.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SolverError {
    /// The configuration failed validation.
    #[error("invalid solver config: {0}")]
    Config(#[from] ConfigError),
    /// The game model has no actions, so no policy can be formed.
    #[error("game model exposes no actions")]
    NoActions,
    /// `play` was asked about a state the model never enumerated.
    #[error("unknown state {0}")]
    UnknownState(String),
    /// The sweep ceiling was reached before the values settled.
    #[error("value iteration did not converge after {sweeps} sweeps (last delta {delta})")]
    DidNotConverge {
        /// Sweeps run before giving up.
        sweeps: u64,
        /// Largest value change in the last sweep.
        delta: f64,
    },
}

/// A converged value iteration solver.
///
/// # Type Parameters
/// - `G`: The game type implementing the `GameModel` trait
///
/// # Example
/// ```ignore
/// use dice_mdp_solver::mdp::{MdpSolver, SolverConfig};
///
/// let game = MyGame::new();
/// let solver = MdpSolver::new(game, SolverConfig::new(0.95, 0.001))?;
///
/// let action = solver.play(&state)?;
/// ```
pub struct MdpSolver<G: GameModel> {
    /// The game being solved.
    game: G,

    /// Configuration for the solver.
    config: SolverConfig,

    /// States in sweep order.
    states: Vec<G::State>,

    /// Position of each state in `states`.
    index: FxHashMap<G::State, usize>,

    /// Actions in evaluation order.
    actions: Vec<G::Action>,

    /// Value estimate per state, parallel to `states`.
    values: Vec<f64>,

    /// Chosen action index per state, parallel to `states`.
    policy: Vec<usize>,

    /// Memoized model transitions.
    cache: TransitionCache<G>,

    /// Statistics tracking.
    stats: SolverStats,
}

impl<G: GameModel> MdpSolver<G> {
    /// Solve `game` with the given configuration.
    ///
    /// Runs value iteration until the largest per-sweep value change drops
    /// below `config.theta`. Without `max_sweeps` this does not return until
    /// the values converge.
    pub fn new(game: G, config: SolverConfig) -> Result<Self, SolverError> {
        Self::with_callback(game, config, |_| {})
    }

    /// Solve `game`, calling `callback` after every sweep.
    pub fn with_callback<F>(game: G, config: SolverConfig, callback: F) -> Result<Self, SolverError>
    where
        F: FnMut(&SweepProgress),
    {
        config.validate()?;

        let actions = game.actions();
        if actions.is_empty() {
            return Err(SolverError::NoActions);
        }

        let states = game.states();
        let mut index = FxHashMap::with_capacity_and_hasher(states.len(), Default::default());
        for (i, state) in states.iter().enumerate() {
            index.entry(state.clone()).or_insert(i);
        }

        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let policy = (0..states.len())
            .map(|_| rng.gen_range(0..actions.len()))
            .collect();

        let mut solver = Self {
            cache: TransitionCache::with_capacity(states.len() * actions.len()),
            values: vec![0.0; states.len()],
            policy,
            stats: SolverStats {
                states: states.len(),
                actions: actions.len(),
                ..SolverStats::new()
            },
            game,
            config,
            states,
            index,
            actions,
        };

        solver.iterate(callback)?;
        Ok(solver)
    }

    /// Run sweeps until convergence or the sweep ceiling.
    fn iterate<F>(&mut self, mut callback: F) -> Result<(), SolverError>
    where
        F: FnMut(&SweepProgress),
    {
        let start_time = Instant::now();

        loop {
            let delta = self.sweep();
            self.stats.sweeps += 1;
            self.stats.final_delta = delta;

            callback(&SweepProgress {
                sweep: self.stats.sweeps,
                delta,
                theta: self.config.theta,
                elapsed_seconds: start_time.elapsed().as_secs_f64(),
            });

            if delta < self.config.theta {
                break;
            }

            if let Some(max_sweeps) = self.config.max_sweeps {
                if self.stats.sweeps >= max_sweeps {
                    return Err(SolverError::DidNotConverge {
                        sweeps: self.stats.sweeps,
                        delta,
                    });
                }
            }
        }

        self.stats.cached_transitions = self.cache.len();
        self.stats.cache_hits = self.cache.hits();
        self.stats.elapsed_seconds = start_time.elapsed().as_secs_f64();
        self.stats.update_rate();

        Ok(())
    }

    /// One in-place Bellman optimality sweep over every state.
    ///
    /// Returns the largest absolute value change.
    fn sweep(&mut self) -> f64 {
        let gamma = self.config.gamma;
        let mut delta_max: f64 = 0.0;

        for i in 0..self.states.len() {
            let state = &self.states[i];
            let mut best_value = f64::NEG_INFINITY;

            for (a, action) in self.actions.iter().enumerate() {
                let outcome = self.cache.lookup(&self.game, (a, action), (i, state));

                let action_value: f64 = if outcome.game_over {
                    let terminal = self.game.terminal_score(state);
                    outcome
                        .probabilities
                        .iter()
                        .map(|&p| p * (outcome.reward + gamma * terminal))
                        .sum()
                } else {
                    outcome
                        .outcomes()
                        .map(|(next, p)| {
                            // States outside the enumeration have no estimate
                            let continuation = self
                                .index
                                .get(next)
                                .map_or(0.0, |&j| self.values[j]);
                            p * (outcome.reward + gamma * continuation)
                        })
                        .sum()
                };

                if action_value > best_value {
                    best_value = action_value;
                    self.policy[i] = a;
                }
            }

            delta_max = delta_max.max((self.values[i] - best_value).abs());
            self.values[i] = best_value;
        }

        delta_max
    }

    /// Get the action the policy takes in `state`.
    pub fn play(&self, state: &G::State) -> Result<&G::Action, SolverError> {
        self.index
            .get(state)
            .map(|&i| &self.actions[self.policy[i]])
            .ok_or_else(|| SolverError::UnknownState(state.label()))
    }

    /// Get the converged value of `state`, if it was enumerated.
    pub fn value(&self, state: &G::State) -> Option<f64> {
        self.index.get(state).map(|&i| self.values[i])
    }

    /// Iterate over `(state, value)` in sweep order.
    pub fn values(&self) -> impl Iterator<Item = (&G::State, f64)> {
        self.states.iter().zip(self.values.iter().copied())
    }

    /// Iterate over `(state, action)` in sweep order.
    pub fn policy(&self) -> impl Iterator<Item = (&G::State, &G::Action)> {
        self.states
            .iter()
            .zip(self.policy.iter().map(|&a| &self.actions[a]))
    }

    /// States in sweep order.
    pub fn states(&self) -> &[G::State] {
        &self.states
    }

    /// Actions in evaluation order.
    pub fn actions(&self) -> &[G::Action] {
        &self.actions
    }

    /// Get statistics from solving.
    pub fn stats(&self) -> &SolverStats {
        &self.stats
    }

    /// Get reference to the game.
    pub fn game(&self) -> &G {
        &self.game
    }

    /// Get reference to the configuration.
    pub fn config(&self) -> &SolverConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mdp::model::{Action, Transition};

    #[derive(Debug, Clone, PartialEq, Eq, Hash)]
    struct Die(Vec<u8>);
    impl State for Die {}

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    enum Move {
        Hold,
        Reroll,
    }
    impl Action for Move {}

    /// One two-sided die that can only be held; holding pays the face value.
    struct HoldOnly;

    impl GameModel for HoldOnly {
        type State = Die;
        type Action = Move;

        fn states(&self) -> Vec<Die> {
            vec![Die(vec![1]), Die(vec![2])]
        }

        fn actions(&self) -> Vec<Move> {
            vec![Move::Hold]
        }

        fn transition(&self, _action: &Move, state: &Die) -> Transition<Die> {
            Transition {
                next_states: vec![state.clone()],
                game_over: true,
                reward: f64::from(state.0[0]),
                probabilities: vec![1.0],
            }
        }

        fn terminal_score(&self, _state: &Die) -> f64 {
            0.0
        }
    }

    /// Two-sided die with a reroll costing `penalty`; holding scores the face
    /// through the terminal score.
    struct Coin {
        penalty: f64,
    }

    impl GameModel for Coin {
        type State = Die;
        type Action = Move;

        fn states(&self) -> Vec<Die> {
            vec![Die(vec![1]), Die(vec![2])]
        }

        fn actions(&self) -> Vec<Move> {
            vec![Move::Hold, Move::Reroll]
        }

        fn transition(&self, action: &Move, state: &Die) -> Transition<Die> {
            match action {
                Move::Hold => Transition {
                    next_states: vec![state.clone()],
                    game_over: true,
                    reward: 0.0,
                    probabilities: vec![1.0],
                },
                Move::Reroll => Transition {
                    next_states: self.states(),
                    game_over: false,
                    reward: -self.penalty,
                    probabilities: vec![0.5, 0.5],
                },
            }
        }

        fn terminal_score(&self, state: &Die) -> f64 {
            f64::from(state.0[0])
        }
    }

    #[test]
    fn test_hold_only_game_values_face() {
        let solver = MdpSolver::new(HoldOnly, SolverConfig::new(0.9, 0.01).with_seed(1)).unwrap();

        assert_eq!(solver.play(&Die(vec![1])), Ok(&Move::Hold));
        assert_eq!(solver.play(&Die(vec![2])), Ok(&Move::Hold));
        assert!((solver.value(&Die(vec![1])).unwrap() - 1.0).abs() < 0.01);
        assert!((solver.value(&Die(vec![2])).unwrap() - 2.0).abs() < 0.01);
    }

    #[test]
    fn test_terminal_score_uses_current_state() {
        let solver = MdpSolver::new(Coin { penalty: 10.0 }, SolverConfig::new(0.5, 1e-9).with_seed(3)).unwrap();

        // Rerolling is never worth a penalty of 10, so both states hold and
        // are worth gamma * face.
        assert_eq!(solver.play(&Die(vec![1])), Ok(&Move::Hold));
        assert_eq!(solver.play(&Die(vec![2])), Ok(&Move::Hold));
        assert!((solver.value(&Die(vec![1])).unwrap() - 0.5).abs() < 1e-9);
        assert!((solver.value(&Die(vec![2])).unwrap() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_cheap_reroll_is_taken_on_low_face() {
        let solver = MdpSolver::new(Coin { penalty: 0.01 }, SolverConfig::new(0.99, 1e-6).with_seed(3)).unwrap();

        assert_eq!(solver.play(&Die(vec![1])), Ok(&Move::Reroll));
        assert_eq!(solver.play(&Die(vec![2])), Ok(&Move::Hold));
        assert!(solver.value(&Die(vec![1])).unwrap() > 0.99);
    }

    #[test]
    fn test_single_action_is_always_played() {
        for &(gamma, theta) in &[(0.0, 0.5), (0.5, 0.01), (0.99, 1e-6)] {
            let solver = MdpSolver::new(HoldOnly, SolverConfig::new(gamma, theta)).unwrap();
            for state in HoldOnly.states() {
                assert_eq!(solver.play(&state), Ok(&Move::Hold));
            }
        }
    }

    #[test]
    fn test_gamma_zero_is_greedy() {
        // With no lookahead holding is worth 0 and rerolling costs the penalty.
        let solver = MdpSolver::new(Coin { penalty: 1.0 }, SolverConfig::new(0.0, 0.01).with_seed(9)).unwrap();
        for state in solver.states() {
            assert_eq!(solver.play(state), Ok(&Move::Hold));
        }
        assert!(solver.values().all(|(_, v)| v == 0.0));
    }

    #[test]
    fn test_ties_keep_first_action() {
        // Free reroll with gamma 0: both actions are worth exactly 0.
        let solver = MdpSolver::new(Coin { penalty: 0.0 }, SolverConfig::new(0.0, 0.01).with_seed(4)).unwrap();
        for (_, action) in solver.policy() {
            assert_eq!(*action, Move::Hold);
        }
    }

    #[test]
    fn test_negative_values_still_pick_best_action() {
        struct AllBad;
        impl GameModel for AllBad {
            type State = Die;
            type Action = Move;
            fn states(&self) -> Vec<Die> {
                vec![Die(vec![1])]
            }
            fn actions(&self) -> Vec<Move> {
                vec![Move::Hold, Move::Reroll]
            }
            fn transition(&self, action: &Move, state: &Die) -> Transition<Die> {
                Transition {
                    next_states: vec![state.clone()],
                    game_over: true,
                    reward: match action {
                        Move::Hold => -5.0,
                        Move::Reroll => -2.0,
                    },
                    probabilities: vec![1.0],
                }
            }
            fn terminal_score(&self, _state: &Die) -> f64 {
                0.0
            }
        }

        let solver = MdpSolver::new(AllBad, SolverConfig::new(0.9, 0.01).with_seed(2)).unwrap();
        assert_eq!(solver.play(&Die(vec![1])), Ok(&Move::Reroll));
        assert_eq!(solver.value(&Die(vec![1])), Some(-2.0));
    }

    #[test]
    fn test_negative_theta_is_config_error() {
        let result = MdpSolver::new(HoldOnly, SolverConfig::new(0.9, -0.01));
        assert!(matches!(
            result,
            Err(SolverError::Config(ConfigError::InvalidThreshold(_)))
        ));
    }

    #[test]
    fn test_unknown_state_is_reported() {
        let solver = MdpSolver::new(HoldOnly, SolverConfig::new(0.9, 0.01)).unwrap();
        let err = solver.play(&Die(vec![1, 2])).unwrap_err();
        assert_eq!(err, SolverError::UnknownState("Die([1, 2])".to_string()));
        assert_eq!(solver.value(&Die(vec![3])), None);
    }

    #[test]
    fn test_no_actions_is_rejected() {
        struct Empty;
        impl GameModel for Empty {
            type State = Die;
            type Action = Move;
            fn states(&self) -> Vec<Die> {
                vec![Die(vec![1])]
            }
            fn actions(&self) -> Vec<Move> {
                vec![]
            }
            fn transition(&self, _action: &Move, _state: &Die) -> Transition<Die> {
                unreachable!("no actions to take")
            }
            fn terminal_score(&self, _state: &Die) -> f64 {
                0.0
            }
        }

        assert_eq!(
            MdpSolver::new(Empty, SolverConfig::default()).err(),
            Some(SolverError::NoActions)
        );
    }

    #[test]
    fn test_sweep_ceiling_reports_non_convergence() {
        // Undiscounted free rerolls never settle: each sweep adds the reward.
        struct Pump;
        impl GameModel for Pump {
            type State = Die;
            type Action = Move;
            fn states(&self) -> Vec<Die> {
                vec![Die(vec![1])]
            }
            fn actions(&self) -> Vec<Move> {
                vec![Move::Reroll]
            }
            fn transition(&self, _action: &Move, state: &Die) -> Transition<Die> {
                Transition {
                    next_states: vec![state.clone()],
                    game_over: false,
                    reward: 1.0,
                    probabilities: vec![1.0],
                }
            }
            fn terminal_score(&self, _state: &Die) -> f64 {
                0.0
            }
        }

        let config = SolverConfig::new(1.0, 0.01).with_max_sweeps(25);
        assert_eq!(
            MdpSolver::new(Pump, config).err(),
            Some(SolverError::DidNotConverge {
                sweeps: 25,
                delta: 1.0
            })
        );
    }

    #[test]
    fn test_callback_sees_every_sweep() {
        let mut deltas = Vec::new();
        let solver = MdpSolver::with_callback(
            Coin { penalty: 0.1 },
            SolverConfig::new(0.9, 1e-4).with_seed(5),
            |progress| deltas.push(progress.delta),
        )
        .unwrap();

        assert_eq!(deltas.len() as u64, solver.stats().sweeps);
        assert!(*deltas.last().unwrap() < 1e-4);
        assert_eq!(solver.stats().final_delta, *deltas.last().unwrap());
    }

    #[test]
    fn test_stats_and_cache_population() {
        let solver = MdpSolver::new(Coin { penalty: 0.1 }, SolverConfig::new(0.9, 1e-4).with_seed(5)).unwrap();
        let stats = solver.stats();

        assert_eq!(stats.states, 2);
        assert_eq!(stats.actions, 2);
        assert_eq!(stats.cached_transitions, 4);
        assert_eq!(stats.cache_hits, 4 * (stats.sweeps - 1));
    }

    #[test]
    fn test_solving_is_deterministic() {
        let config = SolverConfig::new(0.8, 1e-5).with_seed(11);
        let a = MdpSolver::new(Coin { penalty: 0.2 }, config.clone()).unwrap();
        let b = MdpSolver::new(Coin { penalty: 0.2 }, config).unwrap();

        let va: Vec<u64> = a.values().map(|(_, v)| v.to_bits()).collect();
        let vb: Vec<u64> = b.values().map(|(_, v)| v.to_bits()).collect();
        assert_eq!(va, vb);

        let pa: Vec<Move> = a.policy().map(|(_, m)| *m).collect();
        let pb: Vec<Move> = b.policy().map(|(_, m)| *m).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn test_value_table_covers_exactly_the_states() {
        let solver = MdpSolver::new(Coin { penalty: 0.2 }, SolverConfig::new(0.8, 1e-3)).unwrap();
        let states: Vec<&Die> = solver.values().map(|(s, _)| s).collect();
        assert_eq!(states, vec![&Die(vec![1]), &Die(vec![2])]);
        assert_eq!(solver.policy().count(), 2);
    }
}
