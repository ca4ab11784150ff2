use anyhow::Result;
use clap::Parser;
use cohesion_solver::engine::BoardState;
use cohesion_solver::heuristics::{multi_heuristic, Heuristic, TermKind};
use cohesion_solver::solver::{solve, Algorithm, SearchOptions, SearchStatus, TreeNode};
use log::{info, warn};
use std::collections::HashMap;
use std::time::{Duration, Instant};

#[derive(Parser, Debug)]
#[clap(author, version, about = "Compare search algorithms on seeded random boards", long_about = None)]
struct Args {
    /// Number of random boards to evaluate
    #[clap(short, long, default_value_t = 20)]
    boards: usize,

    /// Board width
    #[clap(long, default_value_t = 5)]
    width: usize,

    /// Board height
    #[clap(long, default_value_t = 5)]
    height: usize,

    /// Random boards get floor(width * height / divisor) fill attempts
    #[clap(long, default_value_t = 4.0)]
    divisor: f64,

    /// Seed of the first board; board `i` uses `start_seed + i`
    #[clap(long, default_value_t = 0)]
    start_seed: u64,

    /// Per-search wall-clock budget in seconds
    #[clap(long, default_value_t = 2.0)]
    time_limit_secs: f64,
}

/// Running totals for one algorithm configuration.
#[derive(Default)]
struct Tally {
    solved: usize,
    exhausted: usize,
    timed_out: usize,
    total_depth: usize,
    total_expanded: usize,
    total_time: Duration,
}

fn configurations() -> Vec<(&'static str, Algorithm)> {
    vec![
        ("BFS", Algorithm::Bfs),
        ("DFS", Algorithm::Dfs),
        ("Greedy", Algorithm::Greedy),
        ("A*", Algorithm::a_star()),
        ("WA*(x1.8)", Algorithm::AStar { weight: 1.8 }),
        (
            "Beam(3)",
            Algorithm::Beam {
                weight: 1.0,
                width: 3,
            },
        ),
    ]
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let args = Args::parse();
    let budget = Duration::from_secs_f64(args.time_limit_secs.max(0.0));

    let heuristic = multi_heuristic(vec![
        TermKind::Pieces.term(100.0),
        TermKind::Distance.term(1.0),
    ]);
    let configs = configurations();
    let mut tallies: HashMap<&str, Tally> = HashMap::new();

    println!(
        "Starting search evaluation for {} boards ({}x{}, divisor {})...",
        args.boards, args.width, args.height, args.divisor
    );
    println!("Heuristic: {}", heuristic);

    for board_idx in 0..args.boards {
        let seed = args.start_seed + board_idx as u64;
        let board =
            BoardState::generate_random_with_seed(args.width, args.height, args.divisor, seed)?;
        println!(
            "\nEvaluating Board {} (Seed: {}, {} pieces, {} colors)",
            board_idx,
            seed,
            board.num_pieces(),
            board.num_colors()
        );

        for (name, algorithm) in &configs {
            let start = Instant::now();
            let mut observer =
                |_: &TreeNode, _: usize, _: Option<f64>| start.elapsed() >= budget;
            let outcome = solve(
                &board,
                *algorithm,
                &heuristic as &dyn Heuristic,
                SearchOptions::new().with_observer(&mut observer),
            )?;
            let elapsed = start.elapsed();

            let tally = tallies.entry(name).or_default();
            tally.total_time += elapsed;
            tally.total_expanded += outcome.stats.expanded;
            match outcome.status {
                SearchStatus::Solved(id) => {
                    let depth = outcome.tree().depth(id);
                    tally.solved += 1;
                    tally.total_depth += depth;
                    println!(
                        "  {:<10} depth {:<4} expanded {:<8} {:.3}s",
                        name,
                        depth,
                        outcome.stats.expanded,
                        elapsed.as_secs_f64()
                    );
                }
                SearchStatus::Exhausted => {
                    tally.exhausted += 1;
                    info!("{} exhausted board {} (seed {})", name, board_idx, seed);
                    println!("  {:<10} no solution", name);
                }
                SearchStatus::Cancelled => {
                    tally.timed_out += 1;
                    warn!(
                        "{} hit the {:.1}s budget on board {} (seed {})",
                        name,
                        budget.as_secs_f64(),
                        board_idx,
                        seed
                    );
                    println!("  {:<10} timed out", name);
                }
            }
        }
    }

    println!("\n--- Evaluation Complete ---");
    println!("Number of boards evaluated: {}", args.boards);
    println!(
        "{:<10} {:>7} {:>9} {:>9} {:>10} {:>13} {:>10}",
        "Algorithm", "Solved", "No sol.", "Timeout", "Avg depth", "Avg expanded", "Avg time"
    );

    for (name, _) in &configs {
        let Some(tally) = tallies.get(name) else {
            println!("{:<10} no runs recorded", name);
            continue;
        };
        let runs = tally.solved + tally.exhausted + tally.timed_out;
        let avg_depth = if tally.solved == 0 {
            0.0
        } else {
            tally.total_depth as f64 / tally.solved as f64
        };
        let avg_expanded = tally.total_expanded as f64 / runs.max(1) as f64;
        let avg_time = tally.total_time.as_secs_f64() / runs.max(1) as f64;
        println!(
            "{:<10} {:>7} {:>9} {:>9} {:>10.2} {:>13.1} {:>9.3}s",
            name, tally.solved, tally.exhausted, tally.timed_out, avg_depth, avg_expanded, avg_time
        );
    }
    Ok(())
}
