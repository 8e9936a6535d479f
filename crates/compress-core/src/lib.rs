//! Compression puzzle engine.
//!
//! A state is a row of cells. Repeated runs of symbols can be *grouped*,
//! groups whose contents have been formed often enough can be *clamped*
//! (shrinking the row), and clamps can be *moved* into empty neighbours.
//! The goal is to leave nothing but the hole occupied.
//!
//! - [`Engine`] applies actions and keeps the unlock registry, move log and
//!   layer history.
//! - [`discover_groups`], [`discover_clamps`] and [`discover_moves`] list
//!   the legal actions of a state without touching an engine.
//! - [`compatible_sets`] batches same-kind actions that can be applied
//!   together.
//! - [`Solver`] runs a memoized depth-first search which follows changes to
//!   a shared [`RootCondition`] by replaying its move log on the new root.

pub mod action;
pub mod cell;
pub mod compat;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod generator;
pub mod root;
pub mod solver;

pub use action::{clamp_unlocked, endgame_relaxation, Action, ActionKind, Direction};
pub use cell::{format_state, state_cost, Cell, Pattern, Symbol, Token, EMPTY};
pub use compat::{compatible_sets, move_combinations};
pub use discovery::{discover_clamps, discover_groups, discover_moves, MAX_GROUP_LEN, MIN_GROUP_LEN};
pub use engine::{Engine, Layer, StepInfo, StepOutcome, UNLOCK_THRESHOLD};
pub use error::{EngineError, Rejection};
pub use generator::{generate_random_state, Generator, GeneratorConfig, GeneratorError};
pub use root::{RootCondition, RootScheduler, ScheduledChange};
pub use solver::{solve, LossRecord, MoveExpansion, SearchOutcome, Solver, SolverConfig};
