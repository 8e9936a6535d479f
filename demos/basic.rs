//! Basic example of using the compression engine and solver

use compress_core::{
    discover_clamps, discover_groups, discover_moves, format_state, generate_random_state, Engine,
    RootCondition, RootScheduler, ScheduledChange, SearchOutcome, Solver, SolverConfig,
};
use std::time::Duration;

fn main() {
    // Play a few moves by hand
    let mut engine = Engine::new(&[1, 1, 0, 1, 1], Some(2)).expect("hole is in range");
    println!("Initial state: {} (loss {})", format_state(engine.state()), engine.cost());

    for action in discover_groups(engine.state(), false) {
        let step = engine.apply(action).expect("discovered groups are valid");
        println!("{:<14} -> {} (loss {})", action.to_string(), format_state(&step.state), step.cost);
    }
    println!("Unlocked patterns: {:?}", engine.unlocked());
    println!("Clamps available: {:?}", discover_clamps(engine.state(), engine.unlocked()));
    println!("Moves available: {:?}\n", discover_moves(engine.state()));

    // Solve the medium case
    let medium = Engine::new(&[1, 1, 1, 0, 1, 1, 0, 1], Some(3)).expect("hole is in range");
    let root = RootCondition::new(medium.root());
    let mut solver = Solver::new(root.clone(), SolverConfig::default());
    match solver.solve(medium).expect("root is well formed") {
        SearchOutcome::Solved(solution) => {
            println!("Solved in {} calls:", solver.total_calls());
            for (i, layer) in solution.layers().iter().enumerate() {
                println!("  L{} {} (loss {})", i, format_state(&layer.state), layer.cost);
            }
        }
        other => println!("No solution: {:?}", other),
    }

    // Solve again while the root changes underneath
    println!("\n--- Changing the root mid-search ---\n");
    let start = Engine::new(&[1, 1, 1, 0, 1, 1, 0, 1], Some(3)).expect("hole is in range");
    root.set(start.root());
    let scheduler = RootScheduler::spawn(
        root.clone(),
        vec![ScheduledChange::new(
            Duration::from_millis(50),
            vec![1, 1, 1, 0, 1, 1, 1, 0],
        )],
    );
    let config = SolverConfig::default().with_call_delay(Some(Duration::from_millis(10)));
    let mut solver = Solver::new(root, config);
    let outcome = solver.solve(start).expect("root is well formed");
    scheduler.join();
    println!(
        "Outcome solved={} after {} calls and {} root change(s)",
        outcome.is_solved(),
        solver.total_calls(),
        solver.root_changes()
    );

    // Random starting states
    println!("\n--- Random states ---\n");
    for _ in 0..3 {
        let state = generate_random_state(9, 3).expect("zeros fit in the length");
        println!("{:?}", state);
    }
}
