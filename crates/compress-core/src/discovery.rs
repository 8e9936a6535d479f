//! Enumerate the legal actions available in a state.
//!
//! Everything here is a pure function of the state (and the unlock
//! registry), so the same inputs always produce the same ordered list.

use crate::{Action, Cell, Direction, Pattern, Symbol};
use std::collections::BTreeSet;

/// Shortest and longest window considered for grouping
pub const MIN_GROUP_LEN: usize = 2;
pub const MAX_GROUP_LEN: usize = 4;

/// Comparison key of a single cell inside a window
#[derive(Debug, Clone, PartialEq, Eq)]
enum CellKey<'a> {
    Symbol(Symbol),
    Contents(&'a Pattern),
}

/// Key a window of cells. `source` windows may not contain Groups, since
/// those are already waiting to be clamped; comparison windows key Groups
/// and Clamps alike by their contents.
fn window_key(window: &[Cell], source: bool, allow_empty: bool) -> Option<Vec<CellKey<'_>>> {
    window
        .iter()
        .map(|cell| match cell {
            Cell::Raw(_) if cell.is_empty() && !allow_empty => None,
            Cell::Raw(symbol) => Some(CellKey::Symbol(*symbol)),
            Cell::Group(_) if source => None,
            Cell::Group(pattern) | Cell::Clamp(pattern) => Some(CellKey::Contents(pattern)),
        })
        .collect()
}

/// Find Group actions for repeated patterns of 2 to 4 cells.
///
/// A window qualifies when an equal window exists at a start that does not
/// overlap it. When the only two occupied cells are adjacent Clamps with the
/// same contents, the single Group merging them is returned instead.
///
/// With `allow_empty`, empty cells take part in window comparison. The
/// resulting actions describe repeated patterns for inspection only; any of
/// them that covers an empty cell is rejected by [`Action::validate`], so
/// the solver always passes `false`.
pub fn discover_groups(state: &[Cell], allow_empty: bool) -> Vec<Action> {
    let occupied: Vec<(usize, &Cell)> = state
        .iter()
        .enumerate()
        .filter(|(_, cell)| !cell.is_empty())
        .collect();
    if let [(i, Cell::Clamp(a)), (j, Cell::Clamp(b))] = occupied.as_slice() {
        if *j == i + 1 && a == b {
            return vec![Action::group(*i, 2)];
        }
    }

    let n = state.len();
    let mut actions = Vec::new();
    for len in MIN_GROUP_LEN..=MAX_GROUP_LEN {
        if len > n {
            break;
        }
        for start in 0..=n - len {
            let Some(key) = window_key(&state[start..start + len], true, allow_empty) else {
                continue;
            };
            let repeated = (0..=n - len)
                .filter(|&other| other.abs_diff(start) >= len)
                .any(|other| {
                    window_key(&state[other..other + len], false, allow_empty).as_ref() == Some(&key)
                });
            if repeated {
                actions.push(Action::group(start, len));
            }
        }
    }
    actions
}

/// Find Clamp actions.
///
/// If exactly two Group cells remain and they share contents, only the
/// clamp at the first of them is returned. Otherwise every run of cells
/// matching an unlocked pattern (as long as the pattern) yields a clamp.
pub fn discover_clamps(state: &[Cell], unlocked: &BTreeSet<Pattern>) -> Vec<Action> {
    let groups: Vec<(usize, &Pattern)> = state
        .iter()
        .enumerate()
        .filter_map(|(i, cell)| match cell {
            Cell::Group(pattern) => Some((i, pattern)),
            _ => None,
        })
        .collect();
    if let [(first, a), (_, b)] = groups.as_slice() {
        if a == b {
            return vec![Action::clamp(*first, 2)];
        }
    }

    let mut actions = Vec::new();
    for contents in unlocked {
        let size = contents.len();
        if size == 0 || size > state.len() {
            continue;
        }
        for start in 0..=state.len() - size {
            let matches = state[start..start + size]
                .iter()
                .all(|cell| matches!(cell, Cell::Group(pattern) if pattern == contents));
            if matches {
                actions.push(Action::clamp(start, size));
            }
        }
    }
    actions
}

/// Find every Move of a Clamp into an adjacent empty cell
pub fn discover_moves(state: &[Cell]) -> Vec<Action> {
    let mut actions = Vec::new();
    for (i, cell) in state.iter().enumerate() {
        if !cell.is_clamp() {
            continue;
        }
        for direction in [Direction::Left, Direction::Right] {
            if let Some(target) = direction.step(i, state.len()) {
                if state[target].is_empty() {
                    actions.push(Action::shift(i, direction));
                }
            }
        }
    }
    actions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Engine, Rejection};

    fn raw(symbols: &[u32]) -> Vec<Cell> {
        symbols.iter().copied().map(Cell::from).collect()
    }

    fn pair() -> Pattern {
        Pattern::from_cells(&raw(&[1, 1]))
    }

    #[test]
    fn test_groups_need_non_overlapping_repeat() {
        let state = raw(&[1, 1, 0, 1, 1]);
        assert_eq!(
            discover_groups(&state, false),
            vec![Action::group(0, 2), Action::group(3, 2)]
        );
        // Only an overlapping repeat of (1, 1)
        assert!(discover_groups(&raw(&[1, 1, 1, 0, 2]), false).is_empty());
    }

    #[test]
    fn test_groups_scan_lengths_two_to_four() {
        let state = raw(&[1, 2, 1, 2, 0, 1, 2, 1, 2]);
        let actions = discover_groups(&state, false);
        assert!(actions.contains(&Action::group(0, 2)));
        assert!(actions.contains(&Action::group(0, 4)));
        assert!(actions.contains(&Action::group(5, 4)));
        assert!(actions.contains(&Action::group(1, 3)));
        assert!(actions.iter().all(|a| matches!(a, Action::Group { size, .. } if (2..=4).contains(size))));
    }

    #[test]
    fn test_group_windows_skip_formed_groups() {
        let g = Cell::Group(pair());
        let state = vec![g.clone(), g.clone(), Cell::EMPTY, g.clone(), g];
        assert!(discover_groups(&state, false).is_empty());
    }

    #[test]
    fn test_clamp_contents_match_group_contents() {
        // A clamp window matches a group window with the same contents
        let c = Cell::Clamp(pair());
        let g = Cell::Group(pair());
        let state = vec![c, Cell::Raw(1), Cell::EMPTY, g, Cell::Raw(1)];
        assert_eq!(discover_groups(&state, false), vec![Action::group(0, 2)]);
    }

    #[test]
    fn test_adjacent_terminal_clamps_regroup() {
        let c = Cell::Clamp(pair());
        let state = vec![Cell::EMPTY, Cell::EMPTY, c.clone(), c, Cell::EMPTY];
        assert_eq!(discover_groups(&state, false), vec![Action::group(2, 2)]);
    }

    #[test]
    fn test_allow_empty_keys_empty_cells() {
        let state = raw(&[1, 0, 2, 1, 0]);
        assert!(discover_groups(&state, false).is_empty());
        let keyed = discover_groups(&state, true);
        assert_eq!(keyed, vec![Action::group(0, 2), Action::group(3, 2)]);

        let none = BTreeSet::new();
        assert_eq!(keyed[0].validate(&state, &none), Err(Rejection::EmptyCell(1)));
        assert_eq!(keyed[1].validate(&state, &none), Err(Rejection::EmptyCell(4)));
    }

    #[test]
    fn test_clamps_from_unlocked_patterns() {
        let mut engine = Engine::new(&[1, 1, 0, 1, 1, 0, 2, 2], None).unwrap();
        engine.apply(Action::group(0, 2)).unwrap();
        engine.apply(Action::group(3, 2)).unwrap();
        engine.apply(Action::group(6, 2)).unwrap();
        assert_eq!(
            discover_clamps(engine.state(), engine.unlocked()),
            vec![Action::clamp(0, 2), Action::clamp(3, 2)]
        );
        assert!(discover_clamps(engine.state(), &BTreeSet::new()).is_empty());
    }

    #[test]
    fn test_two_matching_groups_clamp_unconditionally() {
        let g = Cell::Group(pair());
        let state = vec![Cell::EMPTY, g.clone(), g, Cell::Raw(1)];
        assert_eq!(
            discover_clamps(&state, &BTreeSet::new()),
            vec![Action::clamp(1, 2)]
        );
    }

    #[test]
    fn test_moves_toward_empty_neighbours() {
        let c = Cell::Clamp(pair());
        let state = vec![c.clone(), Cell::EMPTY, Cell::Raw(1), c, Cell::EMPTY];
        assert_eq!(
            discover_moves(&state),
            vec![
                Action::shift(0, Direction::Right),
                Action::shift(3, Direction::Right),
            ]
        );
    }

    #[test]
    fn test_discovery_is_idempotent() {
        let mut engine = Engine::new(&[1, 1, 1, 0, 1, 1, 0, 1], Some(3)).unwrap();
        engine.apply(Action::group(0, 2)).unwrap();
        engine.apply(Action::group(4, 2)).unwrap();
        let state = engine.state().to_vec();
        assert_eq!(discover_groups(&state, false), discover_groups(&state, false));
        assert_eq!(
            discover_clamps(&state, engine.unlocked()),
            discover_clamps(&state, engine.unlocked())
        );
        assert_eq!(discover_moves(&state), discover_moves(&state));
    }
}
