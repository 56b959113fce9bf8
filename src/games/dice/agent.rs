//! Agents that play the dice game, and the harness that runs them.

use rand::Rng;
use rustc_hash::FxHashMap;

use crate::games::dice::game::{Dice, DiceGame, Reroll};
use crate::games::dice::session::DiceSession;
use crate::games::dice::GameError;
use crate::mdp::{GameModel, MdpSolver};

/// Anything that can pick a move given the dice showing.
pub trait DiceAgent {
    /// Short name for reports.
    fn name(&self) -> &str;

    /// Choose what to re-roll.
    fn play(&self, dice: &Dice) -> Result<Reroll, GameError>;
}

/// Holds whatever it is dealt.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysHoldAgent;

impl DiceAgent for AlwaysHoldAgent {
    fn name(&self) -> &str {
        "AlwaysHoldAgent"
    }

    fn play(&self, _dice: &Dice) -> Result<Reroll, GameError> {
        Ok(Reroll::hold_all())
    }
}

/// Re-rolls everything until the dice score the game's maximum.
///
/// On three six-sided dice that means holding only on (1, 1, 1) or (1, 1, 6).
#[derive(Debug, Clone)]
pub struct PerfectionistAgent {
    dice: usize,
    target: f64,
    scores: FxHashMap<Dice, f64>,
}

impl PerfectionistAgent {
    /// Create a perfectionist for `game`.
    pub fn new(game: &DiceGame) -> Self {
        let scores = game
            .states()
            .into_iter()
            .map(|s| {
                let score = game.final_score(&s);
                (s, score)
            })
            .collect();

        Self {
            dice: game.dice(),
            target: game.max_score(),
            scores,
        }
    }
}

impl DiceAgent for PerfectionistAgent {
    fn name(&self) -> &str {
        "PerfectionistAgent"
    }

    fn play(&self, dice: &Dice) -> Result<Reroll, GameError> {
        match self.scores.get(dice) {
            Some(&score) if score >= self.target => Ok(Reroll::hold_all()),
            Some(_) => Ok(Reroll::all(self.dice)),
            None => Err(GameError::UnknownDice(dice.clone())),
        }
    }
}

impl DiceAgent for MdpSolver<DiceGame> {
    fn name(&self) -> &str {
        "ValueIterationAgent"
    }

    fn play(&self, dice: &Dice) -> Result<Reroll, GameError> {
        Ok(MdpSolver::play(self, dice)?.clone())
    }
}

/// Play one game with `agent` and return the final score.
///
/// With `verbose` set, every move and roll is printed.
pub fn play_game_with_agent<A, R>(
    agent: &A,
    game: &DiceGame,
    rng: &mut R,
    verbose: bool,
) -> Result<f64, GameError>
where
    A: DiceAgent + ?Sized,
    R: Rng,
{
    let mut session = DiceSession::new(game, rng);

    if verbose {
        println!("Testing agent: \n\t{}", agent.name());
        println!("Starting dice: \n\t{}\n", session.dice());
    }

    let mut moves = 0u32;
    while !session.is_game_over() {
        let action = agent.play(session.dice())?;
        moves += 1;

        if verbose {
            println!("Action {}: \t{}", moves, action);
        }

        let outcome = session.roll(&action, rng)?;
        if verbose && !outcome.game_over {
            println!("Dice: \t\t{}", outcome.dice);
        }
    }

    if verbose {
        println!("\nFinal dice: {}, score: {}", session.dice(), session.score());
    }

    Ok(session.score())
}
