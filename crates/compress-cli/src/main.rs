mod play;
mod plot;
mod record;
mod render;
mod scenario;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use compress_core::{
    Engine, Generator, GeneratorConfig, MoveExpansion, RootCondition, RootScheduler,
    SearchOutcome, Solver, SolverConfig, Symbol,
};
use play::Session;
use plot::LossPlot;
use record::GameRecord;
use render::{render_layers, render_state};
use scenario::Scenario;
use std::io::{self, IsTerminal};
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "Compression puzzle: play, solve, plot and replay")]
struct Args {
    /// Log solver progress at debug level (RUST_LOG overrides per target)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Disable coloured output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    cmd: Command,
}

/// Where the starting state comes from
#[derive(clap::Args, Debug)]
struct StateArgs {
    /// Initial state, e.g. 1,1,0,1,1
    #[arg(long)]
    state: Option<String>,

    /// Hole index; picked at random for generated states when omitted
    #[arg(long)]
    hole: Option<usize>,

    /// Generate a random state of this many cells
    #[arg(long, conflicts_with = "state")]
    random: Option<usize>,

    /// Empty cells in a generated state
    #[arg(long, default_value_t = 3)]
    zeros: usize,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play interactively
    Play {
        #[command(flatten)]
        start: StateArgs,

        /// Directory for saved games
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Run the solver, optionally while the root changes under it
    Solve {
        /// Built-in scenario name (see `compress scenarios`)
        scenario: Option<String>,

        #[command(flatten)]
        start: StateArgs,

        /// Root change as STATE@SECONDS, e.g. 1,1,1,0@0.8 (repeatable)
        #[arg(long = "change", value_name = "STATE@SECONDS")]
        changes: Vec<String>,

        /// Add this many random re-rolls of the initial state
        #[arg(long, default_value_t = 0)]
        chaos: usize,

        /// Seconds over which chaos re-rolls are spread
        #[arg(long, default_value_t = 3.0)]
        chaos_window: f64,

        #[arg(long, default_value_t = 20)]
        max_depth: usize,

        /// Invocation budget; 0 means unlimited
        #[arg(long, default_value_t = 500)]
        max_calls: usize,

        /// Target loss (defaults to the scenario's, else 0)
        #[arg(long)]
        desired_loss: Option<usize>,

        /// Pause per invocation in milliseconds (defaults to 100 when the
        /// root is scheduled to change, else 0)
        #[arg(long)]
        delay_ms: Option<u64>,

        /// Branch on combinations of moves instead of single moves
        #[arg(long)]
        combined_moves: bool,

        /// Start over from the new root instead of replaying the move log
        #[arg(long)]
        discard_moves_on_change: bool,

        #[arg(long, default_value_t = 80)]
        plot_width: usize,

        #[arg(long, default_value_t = 20)]
        plot_height: usize,

        #[arg(long)]
        no_plot: bool,

        /// Save the solution as a game record
        #[arg(long)]
        save: bool,

        /// Directory for saved games
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Replay a saved game
    Replay {
        /// Game directory or record file
        path: PathBuf,

        /// Wait for Enter between moves
        #[arg(long)]
        step: bool,

        /// Pause between moves in milliseconds
        #[arg(long, default_value_t = 0)]
        delay_ms: u64,
    },
    /// List the built-in solver scenarios
    Scenarios,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose)?;
    let color = !args.no_color && io::stdout().is_terminal();

    match args.cmd {
        Command::Play { start, out } => run_play(&start, out, color),
        Command::Solve {
            scenario: name,
            start,
            changes,
            chaos,
            chaos_window,
            max_depth,
            max_calls,
            desired_loss,
            delay_ms,
            combined_moves,
            discard_moves_on_change,
            plot_width,
            plot_height,
            no_plot,
            save,
            out,
        } => {
            let mut problem = match name {
                Some(name) => scenario::find(&name).with_context(|| {
                    format!("unknown scenario {:?}; run `compress scenarios`", name)
                })?,
                None => custom_scenario(&start)?,
            };
            if let Some(hole) = start.hole {
                problem.hole = Some(hole);
            }
            for change in &changes {
                problem.changes.push(scenario::parse_change(change)?);
            }
            if chaos > 0 {
                if !chaos_window.is_finite() || chaos_window < 0.0 {
                    bail!("--chaos-window must be a non-negative number of seconds");
                }
                let window = Duration::from_secs_f64(chaos_window);
                let rerolls =
                    scenario::chaos_changes(&problem.initial, chaos, window, &mut rand::thread_rng());
                problem.changes.extend(rerolls);
            }

            let delay = delay_ms
                .or_else(|| (!problem.changes.is_empty()).then_some(100))
                .filter(|&ms| ms > 0)
                .map(Duration::from_millis);
            let expansion = if combined_moves {
                MoveExpansion::Combined
            } else {
                MoveExpansion::Single
            };
            let config = SolverConfig::default()
                .with_max_depth(max_depth)
                .with_max_calls((max_calls > 0).then_some(max_calls))
                .with_desired_loss(desired_loss.unwrap_or(problem.desired_loss))
                .with_preserve_moves_on_change(!discard_moves_on_change)
                .with_move_expansion(expansion)
                .with_call_delay(delay);

            let plot = (!no_plot).then(|| LossPlot::new(plot_width, plot_height).with_color(color));
            let save_dir = save.then(|| out.unwrap_or_else(record::default_dir));
            run_solve(problem, config, plot, save_dir, color)
        }
        Command::Replay {
            path,
            step,
            delay_ms,
        } => run_replay(&path, step, Duration::from_millis(delay_ms), color),
        Command::Scenarios => {
            for known in scenario::builtin() {
                println!(
                    "{:<14} {:?} hole={:?} loss={} changes={}  {}",
                    known.name,
                    known.initial,
                    known.hole,
                    known.desired_loss,
                    known.changes.len(),
                    known.description
                );
            }
            Ok(())
        }
    }
}

fn init_tracing(verbose: bool) -> Result<()> {
    let level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.parse()?))
        .with_writer(io::stderr)
        .init();
    Ok(())
}

/// Initial state and hole from `--state` or `--random`
fn starting_state(start: &StateArgs) -> Result<(Vec<Symbol>, Option<usize>)> {
    match (&start.state, start.random) {
        (Some(text), _) => Ok((scenario::parse_state(text)?, start.hole)),
        (None, Some(length)) => {
            let mut generator = Generator::with_config(GeneratorConfig {
                length,
                zeros: start.zeros,
            });
            let state = generator.generate()?;
            let hole = start.hole.or_else(|| generator.hole(state.len()));
            Ok((state, hole))
        }
        (None, None) => bail!("give a scenario, --state or --random"),
    }
}

fn custom_scenario(start: &StateArgs) -> Result<Scenario> {
    let (initial, hole) = starting_state(start)?;
    Ok(Scenario {
        name: "custom",
        description: "",
        initial,
        hole,
        desired_loss: 0,
        changes: Vec::new(),
    })
}

fn run_play(start: &StateArgs, out: Option<PathBuf>, color: bool) -> Result<()> {
    let (initial, hole) = match (&start.state, start.random) {
        (None, None) => (vec![1, 1, 1, 0, 0, 1, 1, 0, 1], start.hole),
        _ => starting_state(start)?,
    };
    let engine = Engine::new(&initial, hole)?;
    let save_dir = out.unwrap_or_else(record::default_dir);

    let stdin = io::stdin();
    let outcome = Session::new(engine, stdin.lock(), io::stdout())
        .with_save_dir(Some(save_dir))
        .with_color(color)
        .run()?;
    info!(
        steps = outcome.steps,
        total_loss = outcome.total_loss,
        cost = outcome.engine.cost(),
        solved = outcome.solved,
        saved = ?outcome.saved,
        "game over"
    );
    Ok(())
}

fn run_solve(
    problem: Scenario,
    config: SolverConfig,
    plot: Option<LossPlot>,
    save_dir: Option<PathBuf>,
    color: bool,
) -> Result<()> {
    let engine = Engine::new(&problem.initial, problem.hole)?;
    println!("Solving {}: {:?} hole={:?}", problem.name, problem.initial, problem.hole);
    for change in &problem.changes {
        println!("  root change at {:.2}s -> {:?}", change.delay.as_secs_f64(), change.state);
    }

    let root = RootCondition::new(&problem.initial);
    let mut scheduler = RootScheduler::spawn(root.clone(), problem.changes.clone());
    let mut solver = Solver::new(root, config);
    let outcome = solver.solve(engine);
    scheduler.cancel();
    let outcome = outcome.context("solver hit a malformed root")?;

    println!("\n=== Final Results ===");
    println!("Visited states: {}", solver.visited_states());
    println!("Total calls: {}", solver.total_calls());
    println!("Root changes: {}", solver.root_changes());
    match &outcome {
        SearchOutcome::Solved(engine) => {
            let moves: Vec<String> = engine.moves().iter().map(|m| m.to_string()).collect();
            println!("Final moves: [{}]", moves.join(", "));
            println!("Solved against root {:?}", engine.root());
            println!("{}", render_layers(engine.layers(), engine.hole(), color));
        }
        SearchOutcome::BudgetExhausted => println!("No solution: call budget exhausted"),
        SearchOutcome::DepthLimited => println!("No solution within the depth limit"),
        SearchOutcome::Exhausted => println!("No solution: search space exhausted"),
    }

    if let Some(plot) = plot {
        println!("\n{}", plot.render(solver.loss_history(), &problem.initial));
    }

    if let (Some(dir), Some(engine)) = (save_dir, outcome.solution()) {
        let saved = GameRecord::from_engine(engine).save(&dir)?;
        println!("\nGame information saved to {}", saved.display());
    }
    Ok(())
}

fn run_replay(path: &Path, step: bool, delay: Duration, color: bool) -> Result<()> {
    let record = GameRecord::load(path)?;
    println!("Replaying game from {}", path.display());
    println!("Initial state: {:?}", record.initial_state);
    println!("Hole position: {:?}", record.hole);

    let mut engine = record.engine()?;
    let stdin = io::stdin();
    for (i, action) in record.moves.iter().enumerate() {
        println!("\n=== Move {} ===", i + 1);
        println!("Executing: {}", action);
        let outcome = engine
            .apply(*action)
            .with_context(|| format!("recorded move {} no longer applies", i + 1))?;
        println!("{}", render_state(&outcome.state, outcome.cost, engine.hole(), None, color));
        if step {
            println!("Press Enter for next move...");
            let mut line = String::new();
            stdin.read_line(&mut line)?;
        } else if !delay.is_zero() {
            thread::sleep(delay);
        }
    }

    if engine.cost() != record.final_cost {
        bail!(
            "replay ended at loss {} but the record says {}",
            engine.cost(),
            record.final_cost
        );
    }
    println!("\nReplay complete! Final state:");
    println!("{}", render_state(engine.state(), engine.cost(), engine.hole(), None, color));
    println!("\nFinal layer hierarchy:");
    println!("{}", render_layers(engine.layers(), engine.hole(), color));
    Ok(())
}
