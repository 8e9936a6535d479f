//! Batch same-kind actions into sets that can be applied in one search step.

use crate::Action;
use std::collections::BTreeMap;

/// Build the maximal greedy compatible subsets of `actions`.
///
/// Each action seeds a set, which then takes every other action (in input
/// order) that conflicts with nothing already in it. Sets come back sorted
/// by position, duplicates dropped, in the order they were first built.
pub fn compatible_sets(actions: &[Action]) -> Vec<Vec<Action>> {
    let mut result: Vec<Vec<Action>> = Vec::new();
    for seed in actions {
        let mut set = vec![*seed];
        for other in actions {
            if other == seed {
                continue;
            }
            if !set.iter().any(|existing| existing.conflicts_with(other)) {
                set.push(*other);
            }
        }
        set.sort();
        set.dedup();
        if !result.contains(&set) {
            result.push(set);
        }
    }
    result
}

/// Combine moves so that each set holds at most one move per source cell.
///
/// Moves are bucketed by source position and the Cartesian product of the
/// buckets is returned.
pub fn move_combinations(moves: &[Action]) -> Vec<Vec<Action>> {
    let mut by_position: BTreeMap<usize, Vec<Action>> = BTreeMap::new();
    for action in moves {
        by_position.entry(action.position()).or_default().push(*action);
    }
    if by_position.is_empty() {
        return Vec::new();
    }
    cartesian_product(by_position.values())
}

fn cartesian_product<'a, T, I>(lists: I) -> Vec<Vec<T>>
where
    T: Clone + 'a,
    I: IntoIterator<Item = &'a Vec<T>>,
{
    let mut combos: Vec<Vec<T>> = vec![Vec::new()];
    for list in lists {
        combos = combos
            .iter()
            .flat_map(move |prefix| {
                list.iter().map(move |item| {
                    let mut next = prefix.clone();
                    next.push(item.clone());
                    next
                })
            })
            .collect();
    }
    combos
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Direction;
    use proptest::prelude::*;

    #[test]
    fn test_disjoint_groups_form_one_set() {
        let actions = [Action::group(0, 2), Action::group(3, 2)];
        assert_eq!(compatible_sets(&actions), vec![actions.to_vec()]);
    }

    #[test]
    fn test_overlaps_split_into_seeded_sets() {
        let actions = [Action::clamp(0, 2), Action::clamp(1, 2), Action::clamp(2, 2)];
        assert_eq!(
            compatible_sets(&actions),
            vec![
                vec![Action::clamp(0, 2), Action::clamp(2, 2)],
                vec![Action::clamp(1, 2)],
            ]
        );
    }

    #[test]
    fn test_empty_input_has_no_sets() {
        assert!(compatible_sets(&[]).is_empty());
        assert!(move_combinations(&[]).is_empty());
    }

    #[test]
    fn test_move_combinations_one_per_source() {
        let moves = [
            Action::shift(1, Direction::Left),
            Action::shift(1, Direction::Right),
            Action::shift(4, Direction::Left),
        ];
        assert_eq!(
            move_combinations(&moves),
            vec![
                vec![Action::shift(1, Direction::Left), Action::shift(4, Direction::Left)],
                vec![Action::shift(1, Direction::Right), Action::shift(4, Direction::Left)],
            ]
        );
    }

    proptest! {
        #[test]
        fn test_sets_never_hold_conflicts(
            raw in proptest::collection::vec((0usize..10, 1usize..5), 0..8)
        ) {
            let actions: Vec<Action> = raw.iter().map(|&(p, s)| Action::group(p, s)).collect();
            for set in compatible_sets(&actions) {
                for (i, a) in set.iter().enumerate() {
                    for b in &set[i + 1..] {
                        prop_assert!(!a.conflicts_with(b));
                    }
                }
            }
        }
    }
}
