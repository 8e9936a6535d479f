//! The mutable puzzle engine.
//!
//! Owns one state sequence plus the bookkeeping every applied action feeds:
//! formation counts, the clamp unlock registry, the move log and the layer
//! history. All mutation goes through [`Engine::apply`].

use crate::cell::{format_state, state_cost};
use crate::{Action, Cell, EngineError, Pattern, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use tracing::trace;

/// Formations needed before a pattern may be clamped
pub const UNLOCK_THRESHOLD: usize = 2;

/// Snapshot of the state after an action, with its cost
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layer {
    pub state: Vec<Cell>,
    pub cost: usize,
}

/// Extra information returned alongside a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepInfo {
    pub cost: usize,
    pub unlocked: BTreeSet<Pattern>,
}

/// Result of a successful [`Engine::apply`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepOutcome {
    pub state: Vec<Cell>,
    pub cost: usize,
    /// True once nothing outside the hole is occupied
    pub done: bool,
    pub info: StepInfo,
}

#[derive(Debug, Clone)]
pub struct Engine {
    root: Vec<Symbol>,
    state: Vec<Cell>,
    hole: Option<usize>,
    unlocked: BTreeSet<Pattern>,
    formations: BTreeMap<Pattern, usize>,
    moves: Vec<Action>,
    layers: Vec<Layer>,
}

impl Engine {
    /// Create an engine whose cells all start as raw symbols
    pub fn new(initial: &[Symbol], hole: Option<usize>) -> Result<Self, EngineError> {
        if let Some(hole) = hole {
            if hole >= initial.len() {
                return Err(EngineError::HoleOutOfRange {
                    hole,
                    len: initial.len(),
                });
            }
        }
        let state: Vec<Cell> = initial.iter().copied().map(Cell::Raw).collect();
        let cost = state_cost(&state, hole);
        Ok(Self {
            root: initial.to_vec(),
            layers: vec![Layer {
                state: state.clone(),
                cost,
            }],
            state,
            hole,
            unlocked: BTreeSet::new(),
            formations: BTreeMap::new(),
            moves: Vec::new(),
        })
    }

    /// Build an engine from `root` and re-apply `moves` in order, stopping at
    /// the first one that no longer validates. Returns the engine and how
    /// many moves survived.
    pub fn replay(
        root: &[Symbol],
        hole: Option<usize>,
        moves: &[Action],
    ) -> Result<(Self, usize), EngineError> {
        let mut engine = Self::new(root, hole)?;
        let mut replayed = 0;
        for action in moves {
            match engine.apply(*action) {
                Ok(_) => replayed += 1,
                Err(err) => {
                    trace!(%err, "replay stopped");
                    break;
                }
            }
        }
        Ok((engine, replayed))
    }

    /// The symbols this engine was built from
    pub fn root(&self) -> &[Symbol] {
        &self.root
    }

    pub fn state(&self) -> &[Cell] {
        &self.state
    }

    pub fn hole(&self) -> Option<usize> {
        self.hole
    }

    /// Occupied cells, excluding the hole
    pub fn cost(&self) -> usize {
        state_cost(&self.state, self.hole)
    }

    /// Patterns currently allowed to clamp
    pub fn unlocked(&self) -> &BTreeSet<Pattern> {
        &self.unlocked
    }

    /// How many times each pattern has been formed as a Group
    pub fn formations(&self) -> &BTreeMap<Pattern, usize> {
        &self.formations
    }

    /// Every applied action, in order
    pub fn moves(&self) -> &[Action] {
        &self.moves
    }

    /// State history, starting with the initial layer
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    /// Hashable identity of the current state for visited-set bookkeeping
    pub fn canonical(&self) -> Vec<Cell> {
        self.state.clone()
    }

    /// Check an action without applying it
    pub fn validate(&self, action: &Action) -> Result<(), EngineError> {
        action
            .validate(&self.state, &self.unlocked)
            .map_err(|reason| EngineError::InvalidAction {
                action: *action,
                reason,
            })
    }

    /// Apply a validated action. On rejection the engine is left untouched.
    pub fn apply(&mut self, action: Action) -> Result<StepOutcome, EngineError> {
        self.validate(&action)?;

        match action {
            Action::Group { position, size } => {
                let window = position..position + size;
                let contents = Pattern::from_cells(&self.state[window.clone()]);
                for cell in &mut self.state[window] {
                    *cell = Cell::Group(contents.clone());
                }
                let count = self.formations.entry(contents.clone()).or_insert(0);
                *count += 1;
                if *count >= UNLOCK_THRESHOLD {
                    self.unlocked.insert(contents);
                }
            }
            Action::Clamp { position, size } => {
                let contents = match &self.state[position] {
                    Cell::Group(pattern) => pattern.clone(),
                    _ => unreachable!("validated clamp starts on a group"),
                };
                self.state[position] = Cell::Clamp(contents);
                for cell in &mut self.state[position + 1..position + size] {
                    *cell = Cell::EMPTY;
                }
            }
            Action::Move {
                position,
                direction,
            } => {
                if let Some(target) = direction.step(position, self.state.len()) {
                    let clamp = std::mem::replace(&mut self.state[position], Cell::EMPTY);
                    self.state[target] = clamp;
                }
            }
        }

        let cost = self.cost();
        self.moves.push(action);
        self.layers.push(Layer {
            state: self.state.clone(),
            cost,
        });
        trace!(%action, cost, state = %format_state(&self.state), "applied");

        Ok(StepOutcome {
            state: self.state.clone(),
            cost,
            done: cost == 0,
            info: StepInfo {
                cost,
                unlocked: self.unlocked.clone(),
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, Rejection};

    fn pair() -> Pattern {
        Pattern::from_cells(&[Cell::Raw(1), Cell::Raw(1)])
    }

    #[test]
    fn test_group_keeps_cost() {
        let mut engine = Engine::new(&[1, 1, 0, 1, 1], Some(2)).unwrap();
        assert_eq!(engine.cost(), 4);

        let outcome = engine.apply(Action::group(0, 2)).unwrap();
        let g = Cell::Group(pair());
        assert_eq!(
            outcome.state,
            vec![g.clone(), g, Cell::EMPTY, Cell::Raw(1), Cell::Raw(1)]
        );
        assert_eq!(outcome.cost, 4);
        assert!(!outcome.done);
        assert!(outcome.info.unlocked.is_empty());
    }

    #[test]
    fn test_second_formation_unlocks_pattern() {
        let mut engine = Engine::new(&[1, 1, 0, 1, 1], Some(2)).unwrap();
        engine.apply(Action::group(0, 2)).unwrap();
        let outcome = engine.apply(Action::group(3, 2)).unwrap();

        assert_eq!(engine.formations().get(&pair()), Some(&2));
        assert!(outcome.info.unlocked.contains(&pair()));
        assert_eq!(outcome.cost, 4);
    }

    #[test]
    fn test_clamp_locked_until_unlocked_or_endgame() {
        // Two separate pairs formed once each: four group cells, nothing unlocked
        let mut engine = Engine::new(&[1, 1, 0, 2, 2, 0, 1], None).unwrap();
        engine.apply(Action::group(0, 2)).unwrap();
        engine.apply(Action::group(3, 2)).unwrap();
        let err = engine.apply(Action::clamp(0, 2)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidAction {
                action: Action::clamp(0, 2),
                reason: Rejection::Locked(pair()),
            }
        );
        assert_eq!(engine.moves().len(), 2);

        // Only one formed group remains: the endgame relaxation allows it
        let mut endgame = Engine::new(&[1, 1, 0, 1], None).unwrap();
        endgame.apply(Action::group(0, 2)).unwrap();
        assert!(endgame.unlocked().is_empty());
        endgame.apply(Action::clamp(0, 2)).unwrap();

        // Unlocked pattern clamps even with many groups around
        let mut unlocked = Engine::new(&[1, 1, 1, 1, 0, 2, 2], None).unwrap();
        unlocked.apply(Action::group(0, 2)).unwrap();
        unlocked.apply(Action::group(2, 2)).unwrap();
        unlocked.apply(Action::group(5, 2)).unwrap();
        unlocked.apply(Action::clamp(0, 2)).unwrap();
    }

    #[test]
    fn test_clamp_frees_size_minus_one() {
        let mut engine = Engine::new(&[1, 1, 1, 0, 1, 1, 1], Some(3)).unwrap();
        engine.apply(Action::group(0, 3)).unwrap();
        engine.apply(Action::group(4, 3)).unwrap();
        let before = engine.cost();
        let outcome = engine.apply(Action::clamp(4, 3)).unwrap();
        assert_eq!(outcome.cost, before - 2);
        assert_eq!(engine.state()[4], Cell::Clamp(engine.state()[0].pattern().unwrap().clone()));
        assert!(engine.state()[5].is_empty() && engine.state()[6].is_empty());
    }

    #[test]
    fn test_move_keeps_cost() {
        let mut engine = Engine::new(&[1, 1, 0, 1, 1], Some(2)).unwrap();
        engine.apply(Action::group(0, 2)).unwrap();
        engine.apply(Action::group(3, 2)).unwrap();
        engine.apply(Action::clamp(0, 2)).unwrap();
        let before = engine.cost();
        let outcome = engine.apply(Action::shift(0, Direction::Right)).unwrap();
        assert_eq!(outcome.cost, before);
        assert!(engine.state()[0].is_empty());
        assert!(engine.state()[1].is_clamp());
    }

    #[test]
    fn test_move_into_hole_lowers_cost() {
        let mut engine = Engine::new(&[1, 1, 0, 1, 1], Some(2)).unwrap();
        for action in [
            Action::group(0, 2),
            Action::group(3, 2),
            Action::clamp(0, 2),
            Action::clamp(3, 2),
            Action::shift(0, Direction::Right),
        ] {
            engine.apply(action).unwrap();
        }
        assert_eq!(engine.cost(), 2);

        let into = engine.apply(Action::shift(1, Direction::Right)).unwrap();
        assert_eq!(into.cost, 1);
        assert!(engine.state()[2].is_clamp());

        let out = engine.apply(Action::shift(2, Direction::Left)).unwrap();
        assert_eq!(out.cost, 2);
    }

    #[test]
    fn test_logs_are_append_only() {
        let mut engine = Engine::new(&[1, 1, 0, 1, 1], Some(2)).unwrap();
        assert_eq!(engine.layers().len(), 1);
        assert_eq!(engine.layers()[0].cost, 4);

        engine.apply(Action::group(0, 2)).unwrap();
        assert!(engine.apply(Action::group(1, 2)).is_err());
        engine.apply(Action::group(3, 2)).unwrap();

        assert_eq!(engine.moves(), &[Action::group(0, 2), Action::group(3, 2)]);
        assert_eq!(engine.layers().len(), 3);
        assert_eq!(engine.layers()[2].state, engine.state());
    }

    #[test]
    fn test_hole_out_of_range_is_rejected() {
        assert_eq!(
            Engine::new(&[1, 1], Some(2)).unwrap_err(),
            EngineError::HoleOutOfRange { hole: 2, len: 2 }
        );
    }

    #[test]
    fn test_done_when_only_hole_occupied() {
        let mut engine = Engine::new(&[0, 1, 1, 0], Some(1)).unwrap();
        engine.apply(Action::group(1, 2)).unwrap();
        let outcome = engine.apply(Action::clamp(1, 2)).unwrap();
        assert_eq!(outcome.cost, 0);
        assert!(outcome.done);
    }

    #[test]
    fn test_replay_stops_at_first_invalid_move() {
        let moves = [
            Action::group(0, 2),
            Action::group(4, 2),
            Action::clamp(0, 2),
            Action::clamp(4, 2),
            Action::shift(4, Direction::Right),
            Action::shift(5, Direction::Right),
        ];
        let (old, kept) = Engine::replay(&[1, 1, 1, 0, 1, 1, 0, 1], Some(3), &moves).unwrap();
        assert_eq!(kept, moves.len());
        assert_eq!(old.cost(), 4);

        let (new, kept) = Engine::replay(&[1, 1, 1, 0, 1, 1, 1, 0], Some(3), &moves).unwrap();
        assert_eq!(kept, 5);
        assert_eq!(new.moves(), &moves[..5]);
        assert!(new.state()[5].is_clamp());
        assert_eq!(new.state()[6], Cell::Raw(1));
    }
}
