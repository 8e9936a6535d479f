//! Named solver scenarios and parsing of root-change schedules.

use anyhow::{bail, Context, Result};
use compress_core::{ScheduledChange, Symbol};
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;

/// A starting state plus the root changes to apply while solving it
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    pub name: &'static str,
    pub description: &'static str,
    pub initial: Vec<Symbol>,
    pub hole: Option<usize>,
    pub desired_loss: usize,
    pub changes: Vec<ScheduledChange>,
}

/// Every built-in scenario, easiest first
pub fn builtin() -> Vec<Scenario> {
    let hard: Vec<Symbol> = [0, 1, 1, 0, 1, 1, 0].repeat(2);
    vec![
        Scenario {
            name: "1-easy",
            description: "two pairs around the hole",
            initial: vec![0, 1, 1, 0, 1, 1, 0, 0],
            hole: Some(3),
            desired_loss: 0,
            changes: Vec::new(),
        },
        Scenario {
            name: "1-medium",
            description: "a stray one on each side",
            initial: vec![1, 1, 1, 0, 1, 1, 0, 1],
            hole: Some(3),
            desired_loss: 0,
            changes: Vec::new(),
        },
        Scenario {
            name: "1-hard",
            description: "fourteen cells; runs out of budget",
            initial: hard,
            hole: Some(3),
            desired_loss: 0,
            changes: Vec::new(),
        },
        Scenario {
            name: "1-unsolvable",
            description: "no zero-loss solution in reach; aims for loss 2",
            initial: vec![0, 1, 1, 1, 0, 1, 1, 0, 1, 0, 1, 0, 1, 1],
            hole: Some(3),
            desired_loss: 2,
            changes: Vec::new(),
        },
        Scenario {
            name: "3-easy",
            description: "root changes at 0.8s and 2.5s",
            initial: vec![1, 1, 1, 0, 1, 1, 0, 1],
            hole: Some(3),
            desired_loss: 0,
            changes: vec![
                ScheduledChange::new(Duration::from_millis(800), vec![1, 1, 1, 0, 1, 1, 1, 0]),
                ScheduledChange::new(Duration::from_millis(2500), vec![1, 1, 1, 0, 1, 1, 1, 1]),
            ],
        },
    ]
}

pub fn find(name: &str) -> Option<Scenario> {
    builtin().into_iter().find(|scenario| scenario.name == name)
}

/// Parse `1,1,0,1`, `[1, 1, 0, 1]` or `1 1 0 1`
pub fn parse_state(text: &str) -> Result<Vec<Symbol>> {
    let trimmed = text.trim().trim_start_matches('[').trim_end_matches(']');
    let state = trimmed
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| {
            part.parse::<Symbol>()
                .with_context(|| format!("invalid symbol {:?} in state {:?}", part, text))
        })
        .collect::<Result<Vec<_>>>()?;
    if state.is_empty() {
        bail!("state {:?} has no cells", text);
    }
    Ok(state)
}

/// Parse `STATE@SECONDS`, e.g. `1,1,1,0@0.8`
pub fn parse_change(text: &str) -> Result<ScheduledChange> {
    let Some((state, seconds)) = text.rsplit_once('@') else {
        bail!("root change {:?} must look like STATE@SECONDS", text);
    };
    let seconds: f64 = seconds
        .trim()
        .parse()
        .with_context(|| format!("invalid delay in root change {:?}", text))?;
    if !seconds.is_finite() || seconds < 0.0 {
        bail!("delay in root change {:?} must be a non-negative number", text);
    }
    Ok(ScheduledChange::new(
        Duration::from_secs_f64(seconds),
        parse_state(state)?,
    ))
}

/// `count` random re-rolls of `initial`, each a shuffle of its cells, fired
/// at random times within `window`
pub fn chaos_changes<R: Rng + ?Sized>(
    initial: &[Symbol],
    count: usize,
    window: Duration,
    rng: &mut R,
) -> Vec<ScheduledChange> {
    let window = window.as_secs_f64();
    let mut changes: Vec<ScheduledChange> = (0..count)
        .map(|_| {
            let mut state = initial.to_vec();
            state.shuffle(rng);
            let delay = if window > 0.0 {
                rng.gen_range(0.0..window)
            } else {
                0.0
            };
            ScheduledChange::new(Duration::from_secs_f64(delay), state)
        })
        .collect();
    changes.sort_by_key(|change| change.delay);
    changes
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_builtin_scenarios() {
        let names: Vec<&str> = builtin().iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["1-easy", "1-medium", "1-hard", "1-unsolvable", "3-easy"]);

        let hard = find("1-hard").unwrap();
        assert_eq!(hard.initial.len(), 14);
        assert_eq!(find("1-unsolvable").unwrap().desired_loss, 2);
        assert_eq!(find("3-easy").unwrap().changes.len(), 2);
        assert!(find("2-easy").is_none());
    }

    #[test]
    fn test_parse_state_forms() {
        assert_eq!(parse_state("1,1,0,1").unwrap(), vec![1, 1, 0, 1]);
        assert_eq!(parse_state("[1, 1, 0, 1]").unwrap(), vec![1, 1, 0, 1]);
        assert_eq!(parse_state(" 1 0 2 ").unwrap(), vec![1, 0, 2]);
        assert!(parse_state("1,x").is_err());
        assert!(parse_state("[]").is_err());
    }

    #[test]
    fn test_parse_change() {
        let change = parse_change("1,1,1,0@0.8").unwrap();
        assert_eq!(change.delay, Duration::from_millis(800));
        assert_eq!(change.state, vec![1, 1, 1, 0]);

        assert!(parse_change("1,1,1,0").is_err());
        assert!(parse_change("1,1@soon").is_err());
        assert!(parse_change("1,1@-2").is_err());
    }

    #[test]
    fn test_chaos_changes_keep_cell_counts() {
        let mut rng = StdRng::seed_from_u64(7);
        let initial = [1, 1, 1, 0, 1, 1, 0, 1];
        let changes = chaos_changes(&initial, 4, Duration::from_secs(2), &mut rng);
        assert_eq!(changes.len(), 4);
        for pair in changes.windows(2) {
            assert!(pair[0].delay <= pair[1].delay);
        }
        for change in &changes {
            assert!(change.delay < Duration::from_secs(2));
            let mut sorted = change.state.clone();
            sorted.sort();
            assert_eq!(sorted, vec![0, 0, 1, 1, 1, 1, 1, 1]);
        }
    }
}
