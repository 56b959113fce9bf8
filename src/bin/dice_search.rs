//! Dice game solver and hyperparameter search binary.
//!
//! Usage:
//!   cargo run --release --bin dice_search -- [OPTIONS] <COMMAND>
//!
//! Commands:
//!   play     Play one verbose game with each agent
//!   random   Random search over θ and γ
//!   grid     Grid search over θ and γ
//!   tune     Fine tune θ at the mean γ, then γ at the mean θ
//!
//! Options:
//!   --dice <N>           Number of dice (default: 3)
//!   --sides <N>          Sides per die (default: 6)
//!   --penalty <VALUE>    Cost of each re-roll (default: 1)
//!   --games <N>          Games played per run (default: 1000)
//!   --seed <N>           Base random seed (default: 0)
//!   --threads <N>        Number of threads (default: auto)
//!   --config <FILE>      Solver configuration JSON file (optional)
//!   --output <FILE>      Write the search report as JSON (optional)

use std::error::Error;
use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use rand::rngs::StdRng;
use rand::SeedableRng;

use dice_mdp_solver::games::dice::{
    play_game_with_agent, AlwaysHoldAgent, DiceAgent, DiceConfig, DiceGame, PerfectionistAgent,
};
use dice_mdp_solver::mdp::{GameModel, MdpSolver, SolverConfig};
use dice_mdp_solver::search::{
    arange, fine_tune_gamma, fine_tune_theta, grid_search, linspace, random_search, ParamRange,
    SearchReport, SearchSettings, SearchSpace,
};

#[derive(Parser, Debug)]
#[command(name = "dice_search", about = "Value iteration solver and θ/γ search for the dice game")]
struct Args {
    #[command(subcommand)]
    cmd: Cmd,

    /// Number of dice
    #[arg(long, global = true, default_value_t = 3)]
    dice: usize,

    /// Sides per die
    #[arg(long, global = true, default_value_t = 6)]
    sides: usize,

    /// Cost of each re-roll
    #[arg(long, global = true, default_value_t = 1.0)]
    penalty: f64,

    /// Games played with each solved policy
    #[arg(long, global = true, default_value_t = 1000)]
    games: usize,

    /// Base random seed
    #[arg(long, global = true, default_value_t = 0)]
    seed: u64,

    /// Worker threads (default: one per core)
    #[arg(long, global = true)]
    threads: Option<usize>,

    /// Solver configuration JSON file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Write the search report to this JSON file
    #[arg(long, global = true)]
    output: Option<PathBuf>,

    /// Hide the progress bar
    #[arg(long, global = true)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Play one verbose game with each baseline agent and the solver
    Play {
        /// Discount factor (overrides the config file)
        #[arg(long)]
        gamma: Option<f64>,
        /// Convergence threshold (overrides the config file)
        #[arg(long)]
        theta: Option<f64>,
    },
    /// Sample (θ, γ) pairs uniformly at random
    Random {
        /// Number of runs
        #[arg(long, default_value_t = 1000)]
        runs: usize,
        #[arg(long, default_value_t = 0.1)]
        theta_min: f64,
        #[arg(long, default_value_t = 50.0)]
        theta_max: f64,
        #[arg(long, default_value_t = 0.001)]
        gamma_min: f64,
        #[arg(long, default_value_t = 0.999)]
        gamma_max: f64,
    },
    /// Try every pair of linearly spaced θ and γ values
    Grid {
        #[arg(long, default_value_t = 0.001)]
        theta_min: f64,
        #[arg(long, default_value_t = 0.99)]
        theta_max: f64,
        /// Number of θ values
        #[arg(long, default_value_t = 10)]
        theta_steps: usize,
        #[arg(long, default_value_t = 0.01)]
        gamma_min: f64,
        #[arg(long, default_value_t = 0.99)]
        gamma_max: f64,
        /// Number of γ values
        #[arg(long, default_value_t = 10)]
        gamma_steps: usize,
    },
    /// Vary one parameter at a time with the other held at its mean
    Tune {
        #[arg(long, default_value_t = 0.1)]
        theta_min: f64,
        #[arg(long, default_value_t = 2.0)]
        theta_max: f64,
        #[arg(long, default_value_t = 0.1)]
        theta_step: f64,
        #[arg(long, default_value_t = 0.85)]
        gamma_min: f64,
        #[arg(long, default_value_t = 0.999)]
        gamma_max: f64,
        #[arg(long, default_value_t = 0.001)]
        gamma_step: f64,
    },
}

fn main() {
    let args = Args::parse();
    if let Err(e) = run(args) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    println!("=================================================");
    println!("  Dice Game Value Iteration");
    println!("=================================================");
    println!();

    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new().num_threads(threads).build_global()?;
    }

    let solver_config = match &args.config {
        Some(path) => {
            println!("Loading solver configuration from: {}", path.display());
            SolverConfig::from_json_file(path)?
        }
        None => SolverConfig::default(),
    };

    let game = DiceGame::with_config(&DiceConfig {
        dice: args.dice,
        sides: args.sides,
        penalty: args.penalty,
        ..Default::default()
    })?;

    println!("Dice: {}d{}", game.dice(), game.sides());
    println!("Re-roll penalty: {}", game.penalty());
    println!("States: {}", game.states().len());
    println!("Games per run: {}", args.games);
    println!("Seed: {}", args.seed);
    println!("Threads: {}", rayon::current_num_threads());
    println!();

    let settings = SearchSettings {
        games_per_run: args.games,
        seed: args.seed,
        max_sweeps: solver_config.max_sweeps,
    };

    match args.cmd {
        Cmd::Play { gamma, theta } => {
            let mut config = solver_config.clone();
            if config.seed.is_none() {
                config = config.with_seed(args.seed);
            }
            if let Some(g) = gamma {
                config = config.with_gamma(g);
            }
            if let Some(t) = theta {
                config = config.with_theta(t);
            }
            play_agents(&game, config, args.seed)?;
        }
        Cmd::Random {
            runs,
            theta_min,
            theta_max,
            gamma_min,
            gamma_max,
        } => {
            let space = SearchSpace {
                theta: ParamRange::new(theta_min, theta_max),
                gamma: ParamRange::new(gamma_min, gamma_max),
            };
            let progress = progress_bar(args.quiet)?;
            let report = random_search(&game, &space, runs, &settings, &progress)?;
            progress.finish_and_clear();
            finish(&report, args.output.as_deref())?;
        }
        Cmd::Grid {
            theta_min,
            theta_max,
            theta_steps,
            gamma_min,
            gamma_max,
            gamma_steps,
        } => {
            let thetas = linspace(theta_min, theta_max, theta_steps);
            let gammas = linspace(gamma_min, gamma_max, gamma_steps);
            let progress = progress_bar(args.quiet)?;
            let report = grid_search(&game, &thetas, &gammas, &settings, &progress)?;
            progress.finish_and_clear();
            finish(&report, args.output.as_deref())?;
        }
        Cmd::Tune {
            theta_min,
            theta_max,
            theta_step,
            gamma_min,
            gamma_max,
            gamma_step,
        } => {
            let thetas = arange(theta_min, theta_max, theta_step)?;
            let gammas = arange(gamma_min, gamma_max, gamma_step)?;

            let progress = progress_bar(args.quiet)?;
            let by_theta = fine_tune_theta(&game, &thetas, &gammas, &settings, &progress)?;
            progress.finish_and_clear();
            let output = args.output.as_deref().map(|p| suffixed(p, "theta"));
            finish(&by_theta, output.as_deref())?;

            let progress = progress_bar(args.quiet)?;
            let by_gamma = fine_tune_gamma(&game, &thetas, &gammas, &settings, &progress)?;
            progress.finish_and_clear();
            let output = args.output.as_deref().map(|p| suffixed(p, "gamma"));
            finish(&by_gamma, output.as_deref())?;
        }
    }

    Ok(())
}

/// Solve once and play a verbose game with every agent.
fn play_agents(game: &DiceGame, config: SolverConfig, seed: u64) -> Result<(), Box<dyn Error>> {
    println!("Solving with gamma={}, theta={}", config.gamma, config.theta);

    let start_time = Instant::now();
    let solver = MdpSolver::new(game.clone(), config)?;
    let stats = solver.stats();
    println!(
        "Converged in {} sweeps ({:.4}s, final delta {:.6})",
        stats.sweeps,
        start_time.elapsed().as_secs_f64(),
        stats.final_delta
    );
    println!(
        "Transitions cached: {} | cache hits: {}",
        stats.cached_transitions, stats.cache_hits
    );

    let perfectionist = PerfectionistAgent::new(game);
    let agents: [&dyn DiceAgent; 3] = [&AlwaysHoldAgent, &perfectionist, &solver];

    for agent in agents {
        println!("\n-------------------------------------------------");
        let mut rng = StdRng::seed_from_u64(seed);
        play_game_with_agent(agent, game, &mut rng, true)?;
    }

    Ok(())
}

fn progress_bar(quiet: bool) -> Result<ProgressBar, Box<dyn Error>> {
    if quiet {
        return Ok(ProgressBar::hidden());
    }
    let pb = ProgressBar::new(0);
    pb.set_style(
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} runs ({eta})",
        )?
        .progress_chars("=>-"),
    );
    Ok(pb)
}

fn finish(report: &SearchReport, output: Option<&Path>) -> Result<(), Box<dyn Error>> {
    report.print_summary();
    if let Some(path) = output {
        report.save_json(path)?;
        println!("Report saved to: {}", path.display());
    }
    Ok(())
}

/// `out.json` -> `out_theta.json`
fn suffixed(path: &Path, suffix: &str) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("report");
    let ext = path.extension().and_then(|s| s.to_str()).unwrap_or("json");
    path.with_file_name(format!("{}_{}.{}", stem, suffix, ext))
}
