//! A single game of dice played against a random source.

use rand::Rng;

use crate::games::dice::game::{Dice, DiceGame, Reroll};
use crate::games::dice::GameError;
use crate::mdp::model::GameModel;

/// Result of one call to [`DiceSession::roll`].
#[derive(Debug, Clone, PartialEq)]
pub struct RollOutcome {
    /// Points gained (final score) or lost (penalty) by the roll.
    pub reward: f64,
    /// Dice showing after the roll.
    pub dice: Dice,
    /// Whether the game has ended.
    pub game_over: bool,
}

/// Mutable play state for one game.
///
/// The [`DiceGame`] itself stays immutable; a session borrows it and tracks
/// the dice, the running score and whether the game has ended.
#[derive(Debug, Clone)]
pub struct DiceSession<'a> {
    game: &'a DiceGame,
    dice: Dice,
    score: f64,
    game_over: bool,
}

impl<'a> DiceSession<'a> {
    /// Start a game by rolling every die.
    pub fn new<R: Rng>(game: &'a DiceGame, rng: &mut R) -> Self {
        let mut session = Self {
            game,
            dice: Dice::new(Vec::new()),
            score: 0.0,
            game_over: false,
        };
        session.reset(rng);
        session
    }

    /// Start over with a fresh roll of every die and a score of zero.
    pub fn reset<R: Rng>(&mut self, rng: &mut R) -> &Dice {
        let faces = (0..self.game.dice())
            .map(|_| self.game.sample_face(rng.gen()))
            .collect();
        self.dice = Dice::new(faces);
        self.score = 0.0;
        self.game_over = false;
        &self.dice
    }

    /// Apply `action`: hold everything to finish, or re-roll the given dice.
    pub fn roll<R: Rng>(&mut self, action: &Reroll, rng: &mut R) -> Result<RollOutcome, GameError> {
        if self.game_over {
            return Err(GameError::GameOver);
        }
        if !self.game.is_legal(action) {
            return Err(GameError::IllegalReroll(action.clone()));
        }

        if action.is_hold_all() {
            let reward = self.game.terminal_score(&self.dice);
            self.score += reward;
            self.game_over = true;
            return Ok(RollOutcome {
                reward,
                dice: self.dice.clone(),
                game_over: true,
            });
        }

        let mut faces = self.dice.faces().to_vec();
        for &i in action.indices() {
            faces[i] = self.game.sample_face(rng.gen());
        }
        self.dice = Dice::new(faces);
        self.score -= self.game.penalty();

        Ok(RollOutcome {
            reward: -self.game.penalty(),
            dice: self.dice.clone(),
            game_over: false,
        })
    }

    /// Dice currently showing.
    pub fn dice(&self) -> &Dice {
        &self.dice
    }

    /// Score so far (final once the game is over).
    pub fn score(&self) -> f64 {
        self.score
    }

    /// Check if the game has ended.
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_new_session_rolls_every_die() {
        let game = DiceGame::new();
        let mut rng = StdRng::seed_from_u64(42);
        let session = DiceSession::new(&game, &mut rng);

        assert_eq!(session.dice().len(), 3);
        assert!(session.dice().faces().iter().all(|f| (1..=6).contains(f)));
        assert_eq!(session.score(), 0.0);
        assert!(!session.is_game_over());
    }

    #[test]
    fn test_rerolls_cost_penalty_and_hold_scores() {
        let game = DiceGame::new();
        let mut rng = StdRng::seed_from_u64(7);
        let mut session = DiceSession::new(&game, &mut rng);

        let outcome = session.roll(&Reroll::all(3), &mut rng).unwrap();
        assert_eq!(outcome.reward, -1.0);
        assert!(!outcome.game_over);
        let outcome = session.roll(&Reroll::new(vec![0]), &mut rng).unwrap();
        assert_eq!(outcome.reward, -1.0);
        assert_eq!(session.score(), -2.0);

        let expected = game.final_score(session.dice());
        let outcome = session.roll(&Reroll::hold_all(), &mut rng).unwrap();
        assert!(outcome.game_over);
        assert_eq!(outcome.reward, expected);
        assert_eq!(session.score(), expected - 2.0);
    }

    #[test]
    fn test_held_dice_are_kept() {
        let game = DiceGame::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut session = DiceSession::new(&game, &mut rng);

        for _ in 0..20 {
            let before = session.dice().faces().to_vec();
            session.roll(&Reroll::new(vec![1, 2]), &mut rng).unwrap();
            // The lowest die was held, so nothing can drop below it
            assert!(session.dice().faces()[0] <= before[0]);
            assert!(session.dice().faces().contains(&before[0]));
        }
    }

    #[test]
    fn test_roll_after_game_over_fails() {
        let game = DiceGame::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = DiceSession::new(&game, &mut rng);

        session.roll(&Reroll::hold_all(), &mut rng).unwrap();
        assert_eq!(
            session.roll(&Reroll::all(3), &mut rng),
            Err(GameError::GameOver)
        );

        session.reset(&mut rng);
        assert!(!session.is_game_over());
        assert_eq!(session.score(), 0.0);
    }

    #[test]
    fn test_illegal_reroll_is_rejected() {
        let game = DiceGame::new();
        let mut rng = StdRng::seed_from_u64(1);
        let mut session = DiceSession::new(&game, &mut rng);

        let action = Reroll::new(vec![5]);
        assert_eq!(
            session.roll(&action, &mut rng),
            Err(GameError::IllegalReroll(action))
        );
    }
}
