//! Reconcile an in-flight search with a root condition that changed under it.

use super::{LossRecord, Solver};
use crate::cell::format_state;
use crate::{Action, Cell, Engine, EngineError, Symbol};
use std::collections::HashSet;
use tracing::{debug, info};

impl Solver {
    /// Snapshot the shared root; `Some` only if it differs from the root
    /// `engine` was built on. Siblings cloned before a change still carry
    /// the old root and are caught here too.
    pub(super) fn root_changed(&self, engine: &Engine) -> Option<Vec<Symbol>> {
        self.root
            .get()
            .filter(|current| current.as_slice() != engine.root())
    }

    /// Rebuild `engine` against `new_root`, replaying as much of its move log
    /// as still validates.
    ///
    /// The first engine to see a new root records the change and forgets
    /// every visited state. Later engines from older branches are only
    /// rebuilt.
    pub(super) fn adapt_to_root(
        &mut self,
        engine: &Engine,
        new_root: Vec<Symbol>,
        visited: &mut HashSet<Vec<Cell>>,
    ) -> Result<Engine, EngineError> {
        let fresh = new_root != self.tracked_root;
        if fresh {
            info!(
                calls = self.total_calls,
                from = ?self.tracked_root,
                to = ?new_root,
                moves = engine.moves().len(),
                "root condition changed, rebuilding"
            );
            self.loss_history.push(LossRecord::RootChanged {
                call: self.total_calls,
                cost: engine.cost(),
                root: new_root.clone(),
            });
            self.root_changes += 1;
        } else {
            debug!(
                calls = self.total_calls,
                from = ?engine.root(),
                moves = engine.moves().len(),
                "rebuilding stale branch on current root"
            );
        }

        let moves: &[Action] = if self.config.preserve_moves_on_change {
            engine.moves()
        } else {
            &[]
        };
        let (rebuilt, replayed) = Engine::replay(&new_root, engine.hole(), moves)?;
        debug!(
            replayed,
            discarded = engine.moves().len() - replayed,
            state = %format_state(rebuilt.state()),
            "replayed move log"
        );

        if fresh {
            self.tracked_root = new_root;
            visited.clear();
        }
        Ok(rebuilt)
    }
}
