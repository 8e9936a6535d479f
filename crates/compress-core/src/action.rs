//! The three puzzle actions, their validity predicates and conflict algebra.

use crate::{Cell, Pattern, Rejection};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Direction a clamp slides in
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i8", into = "i8")]
pub enum Direction {
    Left,
    Right,
}

impl Direction {
    /// Signed offset, `-1` or `+1`
    pub fn offset(self) -> i8 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
        }
    }

    /// Neighbour of `position` in this direction inside a state of `len` cells
    pub fn step(self, position: usize, len: usize) -> Option<usize> {
        let target = match self {
            Direction::Left => position.checked_sub(1)?,
            Direction::Right => position.checked_add(1)?,
        };
        (target < len).then_some(target)
    }
}

impl TryFrom<i8> for Direction {
    type Error = String;

    fn try_from(offset: i8) -> Result<Self, Self::Error> {
        match offset {
            -1 => Ok(Direction::Left),
            1 => Ok(Direction::Right),
            other => Err(format!("direction must be -1 or 1, got {}", other)),
        }
    }
}

impl From<Direction> for i8 {
    fn from(direction: Direction) -> Self {
        direction.offset()
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Left => write!(f, "-1"),
            Direction::Right => write!(f, "+1"),
        }
    }
}

/// Kind tag of an action, also the search's expansion order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Group,
    Clamp,
    Move,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionKind::Group => write!(f, "group"),
            ActionKind::Clamp => write!(f, "clamp"),
            ActionKind::Move => write!(f, "move"),
        }
    }
}

/// A single puzzle action
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Action {
    /// Merge `size` contiguous non-empty cells into one Group
    Group { position: usize, size: usize },
    /// Collapse `size` identical Group cells into one Clamp
    Clamp { position: usize, size: usize },
    /// Slide the Clamp at `position` into the empty neighbour
    Move { position: usize, direction: Direction },
}

impl Action {
    pub fn group(position: usize, size: usize) -> Self {
        Action::Group { position, size }
    }

    pub fn clamp(position: usize, size: usize) -> Self {
        Action::Clamp { position, size }
    }

    pub fn shift(position: usize, direction: Direction) -> Self {
        Action::Move { position, direction }
    }

    pub fn kind(&self) -> ActionKind {
        match self {
            Action::Group { .. } => ActionKind::Group,
            Action::Clamp { .. } => ActionKind::Clamp,
            Action::Move { .. } => ActionKind::Move,
        }
    }

    pub fn position(&self) -> usize {
        match *self {
            Action::Group { position, .. }
            | Action::Clamp { position, .. }
            | Action::Move { position, .. } => position,
        }
    }

    /// Half-open cell range touched by a Group or Clamp
    fn span(&self) -> Option<(usize, usize)> {
        match *self {
            Action::Group { position, size } | Action::Clamp { position, size } => {
                Some((position, position.saturating_add(size)))
            }
            Action::Move { .. } => None,
        }
    }

    /// Whether two actions may not be applied in the same step.
    ///
    /// Groups and Clamps conflict with their own kind when their ranges
    /// overlap; Moves conflict when they share a source cell. Different
    /// kinds never conflict.
    pub fn conflicts_with(&self, other: &Action) -> bool {
        if self.kind() != other.kind() {
            return false;
        }
        match (self.span(), other.span()) {
            (Some((a_start, a_end)), Some((b_start, b_end))) => {
                a_start.max(b_start) < a_end.min(b_end)
            }
            _ => self.position() == other.position(),
        }
    }

    /// Check the action's precondition against a state
    pub fn validate(&self, state: &[Cell], unlocked: &BTreeSet<Pattern>) -> Result<(), Rejection> {
        match *self {
            Action::Group { position, size } => {
                let end = checked_range(position, size, state.len())?;
                match (position..end).find(|&i| state[i].is_empty()) {
                    Some(i) => Err(Rejection::EmptyCell(i)),
                    None => Ok(()),
                }
            }
            Action::Clamp { position, size } => {
                let end = checked_range(position, size, state.len())?;
                let contents = match &state[position] {
                    Cell::Group(pattern) => pattern,
                    _ => return Err(Rejection::NotAGroup(position)),
                };
                for i in position + 1..end {
                    match &state[i] {
                        Cell::Group(pattern) if pattern == contents => {}
                        Cell::Group(_) => return Err(Rejection::MismatchedContents(i)),
                        _ => return Err(Rejection::NotAGroup(i)),
                    }
                }
                if clamp_unlocked(contents, unlocked) || endgame_relaxation(state) {
                    Ok(())
                } else {
                    Err(Rejection::Locked(contents.clone()))
                }
            }
            Action::Move { position, direction } => {
                match state.get(position) {
                    Some(Cell::Clamp(_)) => {}
                    Some(_) => return Err(Rejection::NotAClamp(position)),
                    None => {
                        return Err(Rejection::OutOfBounds {
                            end: position.saturating_add(1),
                            len: state.len(),
                        })
                    }
                }
                let target = direction
                    .step(position, state.len())
                    .ok_or(Rejection::NoNeighbour { position, direction })?;
                if state[target].is_empty() {
                    Ok(())
                } else {
                    Err(Rejection::DestinationOccupied(target))
                }
            }
        }
    }
}

fn checked_range(position: usize, size: usize, len: usize) -> Result<usize, Rejection> {
    if size == 0 {
        return Err(Rejection::ZeroSize);
    }
    let end = position.saturating_add(size);
    if end > len {
        return Err(Rejection::OutOfBounds { end, len });
    }
    Ok(end)
}

/// Clamp policy: the contents were formed as a Group at least twice
pub fn clamp_unlocked(contents: &Pattern, unlocked: &BTreeSet<Pattern>) -> bool {
    unlocked.contains(contents)
}

/// Clamp policy: at most two Group cells remain, so any matching run may clamp
pub fn endgame_relaxation(state: &[Cell]) -> bool {
    state.iter().filter(|cell| cell.is_group()).count() <= 2
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Group { position, size } => write!(f, "Group({}, {})", position, size),
            Action::Clamp { position, size } => write!(f, "Clamp({}, {})", position, size),
            Action::Move { position, direction } => write!(f, "Move({}, {})", position, direction),
        }
    }
}
