//! Search drivers.

use std::time::Instant;

use indicatif::ProgressBar;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;

use crate::games::dice::{play_game_with_agent, DiceGame};
use crate::mdp::{MdpSolver, SolverConfig, SolverError};
use crate::search::report::{RunRecord, SearchReport};
use crate::search::{mean, SearchError, SearchSpace};

/// Settings shared by every run of a search.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchSettings {
    /// Games played with each solved policy.
    pub games_per_run: usize,
    /// Base seed; run `i` uses `seed + i` for its solver and its games.
    pub seed: u64,
    /// Sweep ceiling passed to every solver.
    pub max_sweeps: Option<u64>,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            games_per_run: 1,
            seed: 0,
            max_sweeps: None,
        }
    }
}

impl SearchSettings {
    /// Builder method: set games per run.
    pub fn with_games(mut self, games: usize) -> Self {
        self.games_per_run = games;
        self
    }

    /// Builder method: set base seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Builder method: cap solver sweeps.
    pub fn with_max_sweeps(mut self, max_sweeps: u64) -> Self {
        self.max_sweeps = Some(max_sweeps);
        self
    }
}

/// Sample `runs` (θ, γ) pairs uniformly from `space` and evaluate each.
pub fn random_search(
    game: &DiceGame,
    space: &SearchSpace,
    runs: usize,
    settings: &SearchSettings,
    progress: &ProgressBar,
) -> Result<SearchReport, SearchError> {
    space.validate()?;
    if runs == 0 {
        return Err(SearchError::EmptySearchSpace);
    }

    let mut rng = StdRng::seed_from_u64(settings.seed);
    let params: Vec<(f64, f64)> = (0..runs)
        .map(|_| {
            let theta = rng.gen_range(space.theta.min..=space.theta.max);
            let gamma = rng.gen_range(space.gamma.min..=space.gamma.max);
            (theta, gamma)
        })
        .collect();

    run_all("random", game, &params, settings, progress)
}

/// Evaluate every combination of `thetas` and `gammas`.
pub fn grid_search(
    game: &DiceGame,
    thetas: &[f64],
    gammas: &[f64],
    settings: &SearchSettings,
    progress: &ProgressBar,
) -> Result<SearchReport, SearchError> {
    let params: Vec<(f64, f64)> = thetas
        .iter()
        .flat_map(|&theta| gammas.iter().map(move |&gamma| (theta, gamma)))
        .collect();

    run_all("grid", game, &params, settings, progress)
}

/// Vary θ over `thetas` with γ fixed at the mean of `gammas`.
pub fn fine_tune_theta(
    game: &DiceGame,
    thetas: &[f64],
    gammas: &[f64],
    settings: &SearchSettings,
    progress: &ProgressBar,
) -> Result<SearchReport, SearchError> {
    let gamma = mean(gammas).ok_or(SearchError::EmptySearchSpace)?;
    let params: Vec<(f64, f64)> = thetas.iter().map(|&theta| (theta, gamma)).collect();

    run_all("fine-tune theta", game, &params, settings, progress)
}

/// Vary γ over `gammas` with θ fixed at the mean of `thetas`.
pub fn fine_tune_gamma(
    game: &DiceGame,
    thetas: &[f64],
    gammas: &[f64],
    settings: &SearchSettings,
    progress: &ProgressBar,
) -> Result<SearchReport, SearchError> {
    let theta = mean(thetas).ok_or(SearchError::EmptySearchSpace)?;
    let params: Vec<(f64, f64)> = gammas.iter().map(|&gamma| (theta, gamma)).collect();

    run_all("fine-tune gamma", game, &params, settings, progress)
}

fn run_all(
    name: &str,
    game: &DiceGame,
    params: &[(f64, f64)],
    settings: &SearchSettings,
    progress: &ProgressBar,
) -> Result<SearchReport, SearchError> {
    if params.is_empty() {
        return Err(SearchError::EmptySearchSpace);
    }
    if settings.games_per_run == 0 {
        return Err(SearchError::NoGames);
    }

    progress.set_length(params.len() as u64);

    let records = params
        .par_iter()
        .enumerate()
        .map(|(i, &(theta, gamma))| {
            let seed = settings.seed.wrapping_add(i as u64);
            let record = evaluate(game.clone(), theta, gamma, seed, settings);
            progress.inc(1);
            record
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(SearchReport::new(name, game.config(), records))
}

/// Solve one configuration and play its games.
fn evaluate(
    game: DiceGame,
    theta: f64,
    gamma: f64,
    seed: u64,
    settings: &SearchSettings,
) -> Result<RunRecord, SearchError> {
    let mut config = SolverConfig::new(gamma, theta).with_seed(seed);
    config.max_sweeps = settings.max_sweeps;

    let start_time = Instant::now();
    let solver = match MdpSolver::new(game, config) {
        Ok(solver) => solver,
        Err(SolverError::DidNotConverge { sweeps, .. }) => {
            return Ok(RunRecord {
                theta,
                gamma,
                mean_score: None,
                games: 0,
                solve_seconds: start_time.elapsed().as_secs_f64(),
                play_seconds: 0.0,
                sweeps,
                converged: false,
            });
        }
        Err(e) => return Err(e.into()),
    };
    let solve_seconds = start_time.elapsed().as_secs_f64();

    let mut rng = StdRng::seed_from_u64(seed);
    let start_time = Instant::now();
    let mut total = 0.0;
    for _ in 0..settings.games_per_run {
        total += play_game_with_agent(&solver, solver.game(), &mut rng, false)?;
    }

    Ok(RunRecord {
        theta,
        gamma,
        mean_score: Some(total / settings.games_per_run as f64),
        games: settings.games_per_run,
        solve_seconds,
        play_seconds: start_time.elapsed().as_secs_f64(),
        sweeps: solver.stats().sweeps,
        converged: true,
    })
}
