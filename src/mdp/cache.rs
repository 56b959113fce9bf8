//! Memoization of game model transitions.
//!
//! Value iteration asks for the same (action, state) outcome once per sweep.
//! The cache computes each outcome once and hands back the stored copy on
//! every later request.

use std::collections::hash_map::Entry;

use rustc_hash::FxHashMap;

use crate::mdp::model::{GameModel, Transition};

/// Lazily populated map from `(action, state)` to the model's transition.
///
/// Keys are the positions of the action and the state in the owning
/// solver's enumeration, so a hit neither hashes nor clones a state.
/// Entries are never evicted or modified; the key space is bounded by
/// |actions| × |states|.
#[derive(Debug)]
pub struct TransitionCache<G: GameModel> {
    entries: FxHashMap<(usize, usize), Transition<G::State>>,
    hits: u64,
}

impl<G: GameModel> Default for TransitionCache<G> {
    fn default() -> Self {
        Self::new()
    }
}

impl<G: GameModel> TransitionCache<G> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: FxHashMap::default(),
            hits: 0,
        }
    }

    /// Create a cache with room for `capacity` transitions.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            hits: 0,
        }
    }

    /// Get the transition for `action` taken from `state`.
    ///
    /// Each argument pairs the enumeration index used as the key with the
    /// value handed to the model. On a miss the game model is asked and its
    /// answer stored before being returned; on a hit the stored answer is
    /// returned unchanged.
    pub fn lookup(
        &mut self,
        game: &G,
        (action_index, action): (usize, &G::Action),
        (state_index, state): (usize, &G::State),
    ) -> &Transition<G::State> {
        match self.entries.entry((action_index, state_index)) {
            Entry::Occupied(entry) => {
                self.hits += 1;
                entry.into_mut()
            }
            Entry::Vacant(entry) => entry.insert(game.transition(action, state)),
        }
    }

    /// Get a stored transition without consulting the game model.
    pub fn get(&self, action_index: usize, state_index: usize) -> Option<&Transition<G::State>> {
        self.entries.get(&(action_index, state_index))
    }

    /// Number of distinct transitions stored.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if nothing has been cached yet.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of lookups answered from the cache.
    pub fn hits(&self) -> u64 {
        self.hits
    }
}
