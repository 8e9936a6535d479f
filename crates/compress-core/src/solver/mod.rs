//! Depth-first backtracking search.
//!
//! Tries action kinds in a fixed order (groups, then clamps, then moves),
//! applying each compatible set to a cloned engine and recursing. The first
//! engine that reaches the target cost is returned. The visited set is
//! shared by every branch of one search, and the root condition is polled
//! on each invocation (see [`chaos`]).

pub(crate) mod chaos;

use crate::cell::format_state;
use crate::compat::{compatible_sets, move_combinations};
use crate::discovery::{discover_clamps, discover_groups, discover_moves};
use crate::{Action, ActionKind, Cell, Engine, EngineError, RootCondition, Symbol};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::thread;
use std::time::Duration;
use tracing::{debug, info, trace, warn};

/// How move candidates become branches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum MoveExpansion {
    /// Every move is its own branch
    #[default]
    Single,
    /// One branch per combination of at most one move per clamp
    Combined,
}

/// Search limits and policies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SolverConfig {
    /// Deepest recursion level that may still expand
    pub max_depth: usize,
    /// Invocation budget; the search stops once this many calls were made
    pub max_calls: Option<usize>,
    /// Reserved for bounded lookahead; not consulted by the search
    pub lookahead: usize,
    /// Target cost
    pub desired_loss: usize,
    /// Replay the move log against a changed root instead of starting over
    pub preserve_moves_on_change: bool,
    pub move_expansion: MoveExpansion,
    /// Pause at every invocation so timer-driven root changes can land
    pub call_delay: Option<Duration>,
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            max_depth: 20,
            max_calls: Some(500),
            lookahead: 3,
            desired_loss: 0,
            preserve_moves_on_change: true,
            move_expansion: MoveExpansion::Single,
            call_delay: None,
        }
    }
}

impl SolverConfig {
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_calls(mut self, max_calls: Option<usize>) -> Self {
        self.max_calls = max_calls;
        self
    }

    pub fn with_lookahead(mut self, lookahead: usize) -> Self {
        self.lookahead = lookahead;
        self
    }

    pub fn with_desired_loss(mut self, desired_loss: usize) -> Self {
        self.desired_loss = desired_loss;
        self
    }

    pub fn with_preserve_moves_on_change(mut self, preserve: bool) -> Self {
        self.preserve_moves_on_change = preserve;
        self
    }

    pub fn with_move_expansion(mut self, expansion: MoveExpansion) -> Self {
        self.move_expansion = expansion;
        self
    }

    pub fn with_call_delay(mut self, delay: Option<Duration>) -> Self {
        self.call_delay = delay;
        self
    }
}

/// One entry of the solver's loss history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LossRecord {
    /// Cost of the engine seen by an invocation
    Step { call: usize, cost: usize },
    /// The root condition changed before this invocation could proceed
    RootChanged {
        call: usize,
        cost: usize,
        root: Vec<Symbol>,
    },
}

/// How a search ended
#[derive(Debug, Clone)]
pub enum SearchOutcome {
    /// An engine reached the target cost
    Solved(Engine),
    /// The call budget ran out first
    BudgetExhausted,
    /// Nothing found, and at least one branch was cut by the depth limit
    DepthLimited,
    /// Every reachable branch was tried without reaching the target
    Exhausted,
}

impl SearchOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self, SearchOutcome::Solved(_))
    }

    pub fn solution(&self) -> Option<&Engine> {
        match self {
            SearchOutcome::Solved(engine) => Some(engine),
            _ => None,
        }
    }

    pub fn into_solution(self) -> Option<Engine> {
        match self {
            SearchOutcome::Solved(engine) => Some(engine),
            _ => None,
        }
    }
}

/// Backtracking solver bound to a root condition
pub struct Solver {
    config: SolverConfig,
    root: RootCondition,
    tracked_root: Vec<Symbol>,
    total_calls: usize,
    loss_history: Vec<LossRecord>,
    root_changes: usize,
    visited_states: usize,
    budget_exhausted: bool,
    depth_limited: bool,
}

impl Solver {
    pub fn new(root: RootCondition, config: SolverConfig) -> Self {
        Self {
            config,
            root,
            tracked_root: Vec::new(),
            total_calls: 0,
            loss_history: Vec::new(),
            root_changes: 0,
            visited_states: 0,
            budget_exhausted: false,
            depth_limited: false,
        }
    }

    pub fn config(&self) -> &SolverConfig {
        &self.config
    }

    /// Invocations made by the last search
    pub fn total_calls(&self) -> usize {
        self.total_calls
    }

    /// Per-invocation costs plus root-change markers
    pub fn loss_history(&self) -> &[LossRecord] {
        &self.loss_history
    }

    /// How many times the root changed under the last search
    pub fn root_changes(&self) -> usize {
        self.root_changes
    }

    /// Size of the visited set when the last search ended
    pub fn visited_states(&self) -> usize {
        self.visited_states
    }

    /// The root the search is currently working against
    pub fn tracked_root(&self) -> &[Symbol] {
        &self.tracked_root
    }

    /// Search for an engine reaching the configured target cost.
    ///
    /// Only a malformed root (hole out of range after a root change) is an
    /// error; running out of budget or depth is a normal outcome.
    pub fn solve(&mut self, engine: Engine) -> Result<SearchOutcome, EngineError> {
        self.root.seed(engine.root());
        self.tracked_root = engine.root().to_vec();
        self.total_calls = 0;
        self.loss_history.clear();
        self.root_changes = 0;
        self.budget_exhausted = false;
        self.depth_limited = false;

        let mut visited = HashSet::new();
        let desired = self.config.desired_loss;
        let found = self.search(engine, 0, 0, &mut visited, desired)?;
        self.visited_states = visited.len();

        let outcome = match found {
            Some(engine) => {
                info!(
                    calls = self.total_calls,
                    moves = engine.moves().len(),
                    state = %format_state(engine.state()),
                    "found solution"
                );
                SearchOutcome::Solved(engine)
            }
            None if self.budget_exhausted => SearchOutcome::BudgetExhausted,
            None if self.depth_limited => SearchOutcome::DepthLimited,
            None => SearchOutcome::Exhausted,
        };
        Ok(outcome)
    }

    fn search(
        &mut self,
        engine: Engine,
        depth: usize,
        branch: usize,
        visited: &mut HashSet<Vec<Cell>>,
        desired_loss: usize,
    ) -> Result<Option<Engine>, EngineError> {
        self.total_calls += 1;
        if let Some(max_calls) = self.config.max_calls {
            if self.total_calls >= max_calls {
                if !self.budget_exhausted {
                    warn!(max_calls, "reached maximum call budget");
                }
                self.budget_exhausted = true;
                return Ok(None);
            }
        }

        let cost = engine.cost();
        self.loss_history.push(LossRecord::Step {
            call: self.total_calls,
            cost,
        });
        if let Some(delay) = self.config.call_delay {
            thread::sleep(delay);
        }

        if let Some(new_root) = self.root_changed(&engine) {
            let rebuilt = self.adapt_to_root(&engine, new_root, visited)?;
            let target = self.config.desired_loss;
            return self.search(rebuilt, depth, branch, visited, target);
        }

        if cost == desired_loss {
            return Ok(Some(engine));
        }

        let canonical = engine.canonical();
        if visited.contains(&canonical) {
            trace!(depth, state = %format_state(&canonical), "already visited");
            return Ok(None);
        }
        visited.insert(canonical);

        if depth >= self.config.max_depth {
            self.depth_limited = true;
            return Ok(None);
        }

        debug!(
            depth,
            branch,
            cost,
            calls = self.total_calls,
            state = %format_state(engine.state()),
            "expanding"
        );

        for kind in [ActionKind::Group, ActionKind::Clamp, ActionKind::Move] {
            let sets = self.candidate_sets(&engine, kind);
            trace!(depth, %kind, sets = sets.len(), "candidate sets");
            for (i, set) in sets.iter().enumerate() {
                if self.budget_exhausted {
                    return Ok(None);
                }
                let Some(next) = apply_set(&engine, set) else {
                    continue;
                };
                if let Some(found) = self.search(next, depth + 1, i, visited, desired_loss)? {
                    return Ok(Some(found));
                }
            }
        }
        Ok(None)
    }

    fn candidate_sets(&self, engine: &Engine, kind: ActionKind) -> Vec<Vec<Action>> {
        match kind {
            ActionKind::Group => compatible_sets(&discover_groups(engine.state(), false)),
            ActionKind::Clamp => compatible_sets(&discover_clamps(engine.state(), engine.unlocked())),
            ActionKind::Move => {
                let moves = discover_moves(engine.state());
                match self.config.move_expansion {
                    MoveExpansion::Single => moves.into_iter().map(|m| vec![m]).collect(),
                    MoveExpansion::Combined => move_combinations(&moves),
                }
            }
        }
    }
}

/// Clone the engine and apply a whole set; `None` if any action is rejected
fn apply_set(engine: &Engine, set: &[Action]) -> Option<Engine> {
    let mut next = engine.clone();
    for action in set {
        if let Err(err) = next.apply(*action) {
            trace!(%err, "dead branch");
            return None;
        }
    }
    Some(next)
}

/// Solve against `root` with the default policies and the given limits.
///
/// Returns the solved engine, or `None` when the bounded search found
/// nothing.
pub fn solve(
    engine: Engine,
    root: &RootCondition,
    max_depth: usize,
    call_budget: Option<usize>,
    desired_loss: usize,
) -> Result<Option<Engine>, EngineError> {
    let config = SolverConfig::default()
        .with_max_depth(max_depth)
        .with_max_calls(call_budget)
        .with_desired_loss(desired_loss);
    let mut solver = Solver::new(root.clone(), config);
    Ok(solver.solve(engine)?.into_solution())
}
