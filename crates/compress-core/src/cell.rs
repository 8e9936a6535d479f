//! Cells, symbols and the canonical contents value shared by Groups and Clamps.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Atomic value held by a raw cell. `0` is the empty cell.
pub type Symbol = u32;

/// The reserved empty symbol
pub const EMPTY: Symbol = 0;

/// One element of a [`Pattern`]
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Token {
    Symbol(Symbol),
    Nested(Pattern),
}

/// Immutable contents tuple of a Group or Clamp.
///
/// Built once when a Group is formed and shared by every cell the Group
/// spans. Equality, hashing and ordering are structural, so two Groups
/// formed from the same window contents are interchangeable.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "Vec<Token>", into = "Vec<Token>")]
pub struct Pattern(Arc<[Token]>);

impl Pattern {
    /// Build the contents of a window of cells. Raw cells contribute their
    /// symbol, Group and Clamp cells contribute their own pattern nested.
    pub fn from_cells(cells: &[Cell]) -> Self {
        cells
            .iter()
            .map(|cell| match cell {
                Cell::Raw(symbol) => Token::Symbol(*symbol),
                Cell::Group(pattern) | Cell::Clamp(pattern) => Token::Nested(pattern.clone()),
            })
            .collect()
    }

    /// Number of top-level tokens (the width of the window it came from)
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn tokens(&self) -> &[Token] {
        &self.0
    }
}

impl FromIterator<Token> for Pattern {
    fn from_iter<I: IntoIterator<Item = Token>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl From<Vec<Token>> for Pattern {
    fn from(tokens: Vec<Token>) -> Self {
        Self(tokens.into())
    }
}

impl From<Pattern> for Vec<Token> {
    fn from(pattern: Pattern) -> Self {
        pattern.0.to_vec()
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Symbol(symbol) => write!(f, "{}", symbol),
            Token::Nested(pattern) => write!(f, "{}", pattern),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, token) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", token)?;
        }
        write!(f, ")")
    }
}

/// A single slot of the puzzle state
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Cell {
    /// Raw symbol, `Raw(0)` is empty
    Raw(Symbol),
    /// Merged window awaiting a clamp; counts as occupied
    Group(Pattern),
    /// Collapsed group occupying a single cell
    Clamp(Pattern),
}

impl Cell {
    pub const EMPTY: Cell = Cell::Raw(EMPTY);

    pub fn is_empty(&self) -> bool {
        matches!(self, Cell::Raw(EMPTY))
    }

    pub fn is_group(&self) -> bool {
        matches!(self, Cell::Group(_))
    }

    pub fn is_clamp(&self) -> bool {
        matches!(self, Cell::Clamp(_))
    }

    /// Contents of a Group or Clamp, `None` for raw cells
    pub fn pattern(&self) -> Option<&Pattern> {
        match self {
            Cell::Raw(_) => None,
            Cell::Group(pattern) | Cell::Clamp(pattern) => Some(pattern),
        }
    }
}

impl From<Symbol> for Cell {
    fn from(symbol: Symbol) -> Self {
        Cell::Raw(symbol)
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Raw(symbol) => write!(f, "{}", symbol),
            Cell::Group(pattern) => write!(f, "g{}", pattern),
            Cell::Clamp(pattern) => write!(f, "c{}", pattern),
        }
    }
}

/// Cost of a state: occupied cells, not counting the hole
pub fn state_cost(state: &[Cell], hole: Option<usize>) -> usize {
    state
        .iter()
        .enumerate()
        .filter(|(i, cell)| !cell.is_empty() && Some(*i) != hole)
        .count()
}

/// Render a state as `[g(1, 1), g(1, 1), 0, 1, 1]`
pub fn format_state(state: &[Cell]) -> String {
    let cells: Vec<String> = state.iter().map(|c| c.to_string()).collect();
    format!("[{}]", cells.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pair() -> Pattern {
        Pattern::from_cells(&[Cell::Raw(1), Cell::Raw(1)])
    }

    #[test]
    fn test_pattern_identity_is_structural() {
        assert_eq!(pair(), pair());
        assert_eq!(Cell::Group(pair()), Cell::Group(pair()));
        assert_ne!(Cell::Group(pair()), Cell::Clamp(pair()));
    }

    #[test]
    fn test_nested_pattern_display() {
        let nested = Pattern::from_cells(&[Cell::Clamp(pair()), Cell::Clamp(pair())]);
        assert_eq!(nested.to_string(), "((1, 1), (1, 1))");
        assert_eq!(nested.len(), 2);
        assert_eq!(Cell::Group(nested).to_string(), "g((1, 1), (1, 1))");
    }

    #[test]
    fn test_cost_excludes_hole() {
        let state: Vec<Cell> = [1, 1, 0, 1, 1].into_iter().map(Cell::from).collect();
        assert_eq!(state_cost(&state, Some(2)), 4);
        assert_eq!(state_cost(&state, Some(0)), 3);
        assert_eq!(state_cost(&state, None), 4);
    }

    #[test]
    fn test_pattern_serializes_as_nested_arrays() {
        let nested = Pattern::from_cells(&[Cell::Raw(2), Cell::Clamp(pair())]);
        let json = serde_json::to_string(&nested).unwrap();
        assert_eq!(json, "[2,[1,1]]");
        let back: Pattern = serde_json::from_str(&json).unwrap();
        assert_eq!(back, nested);
    }
}
