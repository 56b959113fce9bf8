//! The dice scoring game as a finite MDP.

use std::collections::BTreeMap;
use std::fmt;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::games::dice::GameError;
use crate::mdp::model::{Action, GameModel, State, Transition};

/// Faces currently showing, sorted ascending.
///
/// Dice are interchangeable, so the state is the sorted multiset of faces.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<u32>")]
pub struct Dice(Vec<u32>);

impl Dice {
    /// Create a dice state from faces in any order.
    pub fn new(mut faces: Vec<u32>) -> Self {
        faces.sort_unstable();
        Self(faces)
    }

    /// Faces in ascending order.
    pub fn faces(&self) -> &[u32] {
        &self.0
    }

    /// Number of dice.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check if there are no dice.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<u32>> for Dice {
    fn from(faces: Vec<u32>) -> Self {
        Self::new(faces)
    }
}

impl State for Dice {
    fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Dice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces: Vec<String> = self.0.iter().map(|v| v.to_string()).collect();
        write!(f, "({})", faces.join(", "))
    }
}

/// Indices (into the sorted [`Dice`]) of the dice to roll again.
///
/// The empty set holds every die and ends the game.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "Vec<usize>")]
pub struct Reroll(Vec<usize>);

impl Reroll {
    /// Create a re-roll of the given indices (order and duplicates ignored).
    pub fn new(mut indices: Vec<usize>) -> Self {
        indices.sort_unstable();
        indices.dedup();
        Self(indices)
    }

    /// Keep every die; ends the game.
    pub fn hold_all() -> Self {
        Self(Vec::new())
    }

    /// Roll all `dice` dice again.
    pub fn all(dice: usize) -> Self {
        Self((0..dice).collect())
    }

    /// Indices to re-roll, ascending.
    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    /// Check if this is the game-ending hold.
    pub fn is_hold_all(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Vec<usize>> for Reroll {
    fn from(indices: Vec<usize>) -> Self {
        Self::new(indices)
    }
}

impl Action for Reroll {
    fn label(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Reroll {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_hold_all() {
            return write!(f, "hold");
        }
        let indices: Vec<String> = self.0.iter().map(|i| i.to_string()).collect();
        write!(f, "reroll [{}]", indices.join(", "))
    }
}

/// Dice game settings, deserializable from JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiceConfig {
    /// Number of dice.
    pub dice: usize,
    /// Number of sides per die.
    pub sides: usize,
    /// Face values; defaults to `1..=sides`.
    #[serde(default)]
    pub values: Option<Vec<u32>>,
    /// Probability of each face; defaults to uniform.
    #[serde(default)]
    pub bias: Option<Vec<f64>>,
    /// Cost of each re-roll.
    #[serde(default = "default_penalty")]
    pub penalty: f64,
}

fn default_penalty() -> f64 {
    1.0
}

impl Default for DiceConfig {
    fn default() -> Self {
        Self {
            dice: 3,
            sides: 6,
            values: None,
            bias: None,
            penalty: default_penalty(),
        }
    }
}

/// Dice scoring game.
///
/// ## Rules
///
/// - Roll all dice. Each turn either hold everything (the game ends) or pick
///   any dice to roll again, paying `penalty` points per roll.
/// - On holding, every face that shows more than once is flipped to its
///   opposite (1↔6, 2↔5, 3↔4 on a d6) and the faces are summed.
///
/// (1, 1, 1) and (1, 1, 6) both flip to (6, 6, 6) and score the maximum 18,
/// while (6, 6, 6) flips to (1, 1, 1) and scores 3.
#[derive(Debug, Clone)]
pub struct DiceGame {
    dice: usize,
    /// Face values, ascending.
    values: Vec<u32>,
    /// Probability of each face, parallel to `values`.
    bias: Vec<f64>,
    penalty: f64,
    flip: FxHashMap<u32, u32>,
    states: Vec<Dice>,
    actions: Vec<Reroll>,
}

impl Default for DiceGame {
    fn default() -> Self {
        Self::new()
    }
}

impl DiceGame {
    /// Standard game: three six-sided fair dice, penalty 1.
    pub fn new() -> Self {
        let sides = 6;
        Self::build(3, (1..=6).collect(), vec![1.0 / sides as f64; sides], 1.0)
    }

    /// Fair game with `dice` dice of `sides` sides and penalty 1.
    pub fn with_dice(dice: usize, sides: usize) -> Result<Self, GameError> {
        Self::with_config(&DiceConfig {
            dice,
            sides,
            ..Default::default()
        })
    }

    /// Build a game from a validated config.
    pub fn with_config(config: &DiceConfig) -> Result<Self, GameError> {
        if config.dice == 0 {
            return Err(GameError::NoDice);
        }
        if config.sides == 0 {
            return Err(GameError::NoSides);
        }

        let values = match &config.values {
            Some(values) if values.len() != config.sides => {
                return Err(GameError::ValueCount {
                    expected: config.sides,
                    got: values.len(),
                });
            }
            Some(values) => values.clone(),
            None => (1..=config.sides as u32).collect(),
        };

        let bias = match &config.bias {
            Some(bias) if bias.len() != config.sides => {
                return Err(GameError::BiasLength {
                    expected: config.sides,
                    got: bias.len(),
                });
            }
            Some(bias) => {
                let total: f64 = bias.iter().sum();
                if bias.iter().any(|&p| !(p >= 0.0)) || (total - 1.0).abs() > 1e-9 {
                    return Err(GameError::InvalidBias(total));
                }
                bias.clone()
            }
            None => vec![1.0 / config.sides as f64; config.sides],
        };

        // Keep faces and their probabilities paired while sorting
        let mut paired: Vec<(u32, f64)> = values.into_iter().zip(bias).collect();
        paired.sort_by_key(|&(v, _)| v);
        if paired.windows(2).any(|w| w[0].0 == w[1].0) {
            return Err(GameError::DuplicateValue);
        }
        let (values, bias): (Vec<u32>, Vec<f64>) = paired.into_iter().unzip();

        if !config.penalty.is_finite() {
            return Err(GameError::InvalidPenalty(config.penalty));
        }

        Ok(Self::build(config.dice, values, bias, config.penalty))
    }

    fn build(dice: usize, values: Vec<u32>, bias: Vec<f64>, penalty: f64) -> Self {
        let flip = values
            .iter()
            .zip(values.iter().rev())
            .map(|(&a, &b)| (a, b))
            .collect();

        let mut states = Vec::new();
        let mut current = Vec::with_capacity(dice);
        push_multisets(&values, dice, 0, &mut current, &mut states);

        let mut actions = Vec::new();
        for size in 0..=dice {
            let mut current = Vec::with_capacity(size);
            push_subsets(dice, size, 0, &mut current, &mut actions);
        }

        Self {
            dice,
            values,
            bias,
            penalty,
            flip,
            states,
            actions,
        }
    }

    /// Number of dice.
    pub fn dice(&self) -> usize {
        self.dice
    }

    /// Number of sides per die.
    pub fn sides(&self) -> usize {
        self.values.len()
    }

    /// Face values, ascending.
    pub fn values(&self) -> &[u32] {
        &self.values
    }

    /// Probability of each face, parallel to [`values`](Self::values).
    pub fn bias(&self) -> &[f64] {
        &self.bias
    }

    /// Cost of one re-roll.
    pub fn penalty(&self) -> f64 {
        self.penalty
    }

    /// Settings that rebuild this game.
    pub fn config(&self) -> DiceConfig {
        DiceConfig {
            dice: self.dice,
            sides: self.values.len(),
            values: Some(self.values.clone()),
            bias: Some(self.bias.clone()),
            penalty: self.penalty,
        }
    }

    /// Check if `action` only names dice that exist.
    pub fn is_legal(&self, action: &Reroll) -> bool {
        action.indices().iter().all(|&i| i < self.dice)
    }

    /// Score for holding `dice`: repeated faces are flipped, then summed.
    pub fn final_score(&self, dice: &Dice) -> f64 {
        let mut counts: BTreeMap<u32, u32> = BTreeMap::new();
        for &face in dice.faces() {
            *counts.entry(face).or_insert(0) += 1;
        }

        counts
            .into_iter()
            .map(|(face, count)| {
                let shown = if count > 1 {
                    self.flip.get(&face).copied().unwrap_or(face)
                } else {
                    face
                };
                f64::from(shown) * f64::from(count)
            })
            .sum()
    }

    /// Highest score any state can hold for.
    pub fn max_score(&self) -> f64 {
        self.states
            .iter()
            .map(|s| self.final_score(s))
            .fold(f64::NEG_INFINITY, f64::max)
    }

    /// Sample one face according to the bias.
    pub(crate) fn sample_face(&self, r: f64) -> u32 {
        let mut cumsum = 0.0;

        for (&value, &prob) in self.values.iter().zip(self.bias.iter()) {
            cumsum += prob;
            if r < cumsum {
                return value;
            }
        }

        // Fallback to last face (handles floating point imprecision)
        self.values[self.values.len() - 1]
    }
}

impl GameModel for DiceGame {
    type State = Dice;
    type Action = Reroll;

    fn states(&self) -> Vec<Dice> {
        self.states.clone()
    }

    fn actions(&self) -> Vec<Reroll> {
        self.actions.clone()
    }

    fn transition(&self, action: &Reroll, state: &Dice) -> Transition<Dice> {
        if action.is_hold_all() {
            return Transition {
                next_states: vec![state.clone()],
                game_over: true,
                reward: 0.0,
                probabilities: vec![1.0],
            };
        }

        let held: Vec<u32> = state
            .faces()
            .iter()
            .enumerate()
            .filter(|(i, _)| action.indices().binary_search(i).is_err())
            .map(|(_, &v)| v)
            .collect();
        let rolled = state.len() - held.len();

        // Odometer over every face combination of the rolled dice
        let mut outcomes: BTreeMap<Dice, f64> = BTreeMap::new();
        let mut digits = vec![0usize; rolled];
        loop {
            let mut faces = held.clone();
            let mut prob = 1.0;
            for &d in &digits {
                faces.push(self.values[d]);
                prob *= self.bias[d];
            }
            *outcomes.entry(Dice::new(faces)).or_insert(0.0) += prob;

            let mut pos = 0;
            while pos < rolled {
                digits[pos] += 1;
                if digits[pos] < self.values.len() {
                    break;
                }
                digits[pos] = 0;
                pos += 1;
            }
            if pos == rolled {
                break;
            }
        }

        let (next_states, probabilities) = outcomes.into_iter().unzip();
        Transition {
            next_states,
            game_over: false,
            reward: -self.penalty,
            probabilities,
        }
    }

    fn terminal_score(&self, state: &Dice) -> f64 {
        self.final_score(state)
    }
}

/// Push every sorted multiset of `len` faces drawn from `values[start..]`.
fn push_multisets(
    values: &[u32],
    len: usize,
    start: usize,
    current: &mut Vec<u32>,
    out: &mut Vec<Dice>,
) {
    if current.len() == len {
        out.push(Dice(current.clone()));
        return;
    }
    for i in start..values.len() {
        current.push(values[i]);
        push_multisets(values, len, i, current, out);
        current.pop();
    }
}

/// Push every `size`-element subset of `start..n`, lexicographically.
fn push_subsets(n: usize, size: usize, start: usize, current: &mut Vec<usize>, out: &mut Vec<Reroll>) {
    if current.len() == size {
        out.push(Reroll(current.clone()));
        return;
    }
    for i in start..n {
        current.push(i);
        push_subsets(n, size, i + 1, current, out);
        current.pop();
    }
}
