use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use cohesion_solver::engine::BoardState;
use cohesion_solver::heuristics::{parse_terms, Heuristic};
use cohesion_solver::puzzles;
use cohesion_solver::solver::{solve, Algorithm, SearchOptions, SearchStatus, TreeNode};
use log::info;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum AlgorithmArg {
    Bfs,
    Dfs,
    Greedy,
    AStar,
    Beam,
}

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Path to a board file (one row per line, `.` or space for empty cells)
    #[clap(short, long, conflicts_with_all = ["preset", "random"])]
    board_file: Option<PathBuf>,

    /// Name of a built-in board, e.g. `easy_1` or `hard_big_3`
    #[clap(short, long, conflicts_with = "random")]
    preset: Option<String>,

    /// Generate a random board of the given size, e.g. `15x15` (the default when no board is given)
    #[clap(short, long, value_parser = parse_dimensions)]
    random: Option<(usize, usize)>,

    /// Random boards get floor(width * height / divisor) fill attempts
    #[clap(long, default_value_t = 4.0)]
    divisor: f64,

    /// Seed for random boards
    #[clap(long)]
    seed: Option<u64>,

    /// Search algorithm
    #[clap(short, long, value_enum, default_value_t = AlgorithmArg::AStar)]
    algorithm: AlgorithmArg,

    /// Heuristic terms as `name:weight` pairs (pieces, distance, repulsion, uniformity, touching)
    #[clap(long, default_value = "pieces:100,distance:1")]
    heuristic: String,

    /// Heuristic weight for A* and beam search (>= 1)
    #[clap(short, long, default_value_t = 1.8)]
    weight: f64,

    /// Frontier size kept by beam search
    #[clap(long, default_value_t = 3)]
    beam_width: usize,

    /// Maximum solution depth
    #[clap(short, long)]
    depth_limit: Option<usize>,

    /// Only move pieces that can still contribute to a merge (faster, may miss solutions)
    #[clap(long)]
    prune: bool,

    /// Give up after this many seconds
    #[clap(long)]
    time_limit_secs: Option<f64>,

    /// Log search progress every N expansions (0 disables)
    #[clap(long, default_value_t = 0)]
    progress_every: usize,
}

fn parse_dimensions(s: &str) -> Result<(usize, usize), String> {
    let (w, h) = s
        .split_once(|c: char| c == 'x' || c == 'X')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = w
        .trim()
        .parse()
        .map_err(|e| format!("invalid width '{}': {}", w, e))?;
    let height = h
        .trim()
        .parse()
        .map_err(|e| format!("invalid height '{}': {}", h, e))?;
    Ok((width, height))
}

fn read_board_file(path: &PathBuf) -> Result<BoardState> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read board file {}", path.display()))?;
    BoardState::from_text(&content)
        .with_context(|| format!("invalid board in {}", path.display()))
}

fn load_board(args: &Args) -> Result<BoardState> {
    if let Some(path) = &args.board_file {
        return read_board_file(path);
    }
    if let Some(name) = &args.preset {
        return puzzles::by_name(name).with_context(|| {
            format!(
                "available presets: {}",
                puzzles::names().collect::<Vec<_>>().join(", ")
            )
        });
    }

    let (width, height) = args.random.unwrap_or((15, 15));
    let mut rng = match args.seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };
    Ok(BoardState::generate_random(
        width,
        height,
        args.divisor,
        &mut rng,
    )?)
}

fn algorithm_from_args(args: &Args) -> Algorithm {
    match args.algorithm {
        AlgorithmArg::Bfs => Algorithm::Bfs,
        AlgorithmArg::Dfs => Algorithm::Dfs,
        AlgorithmArg::Greedy => Algorithm::Greedy,
        AlgorithmArg::AStar => Algorithm::AStar {
            weight: args.weight,
        },
        AlgorithmArg::Beam => Algorithm::Beam {
            weight: args.weight,
            width: args.beam_width,
        },
    }
}

fn print_path(path: &[&TreeNode], heuristic: &dyn Heuristic) {
    for node in path {
        println!("Depth: {}", node.depth());
        println!(
            "Heuristic: {}",
            heuristic.estimate(node.board(), node.depth())
        );
        println!("{}\n", node.board());
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if let Some(limit) = args.time_limit_secs {
        if !limit.is_finite() || limit <= 0.0 {
            bail!("time limit must be a positive number of seconds, got {}", limit);
        }
    }

    let board = load_board(&args)?;
    let heuristic = parse_terms(&args.heuristic)
        .with_context(|| format!("invalid heuristic '{}'", args.heuristic))?;
    let algorithm = algorithm_from_args(&args);
    algorithm.validate()?;

    println!("Initial board state:\n{}\n", board);
    if algorithm.uses_heuristic() {
        println!("Searching with {} using {}...\n", algorithm, heuristic);
    } else {
        println!("Searching with {}...\n", algorithm);
    }

    let start = Instant::now();
    let deadline = args.time_limit_secs.map(Duration::from_secs_f64);
    let progress_every = args.progress_every;
    let mut expanded = 0usize;
    let mut observer = |node: &TreeNode, visited: usize, h: Option<f64>| {
        expanded += 1;
        if progress_every > 0 && expanded % progress_every == 0 {
            info!(
                "expanded {} nodes, visited {}, depth {}, heuristic {:?}",
                expanded,
                visited,
                node.depth(),
                h
            );
        }
        deadline.is_some_and(|limit| start.elapsed() >= limit)
    };

    let options = SearchOptions {
        depth_limit: args.depth_limit,
        prune_idle_pieces: args.prune,
        observer: Some(&mut observer),
    };
    let outcome = solve(&board, algorithm, &heuristic, options)?;
    let elapsed = start.elapsed();

    println!("{} took {:.3} seconds", algorithm, elapsed.as_secs_f64());
    println!(
        "Expanded {} nodes, generated {}, visited {}, peak frontier {}\n",
        outcome.stats.expanded,
        outcome.stats.generated,
        outcome.stats.visited,
        outcome.stats.peak_frontier
    );

    match outcome.status {
        SearchStatus::Solved(_) => {
            let path = outcome.path();
            println!("Solution @ depth: {}\n", path.len() - 1);
            print_path(&path, &heuristic);
        }
        SearchStatus::Exhausted => println!("No solution found."),
        SearchStatus::Cancelled => println!("No solution found (time limit reached)."),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_dimensions() {
        assert_eq!(parse_dimensions("15x10"), Ok((15, 10)));
        assert_eq!(parse_dimensions("4X4"), Ok((4, 4)));
        assert!(parse_dimensions("15").is_err());
        assert!(parse_dimensions("ax3").is_err());
    }

    #[test]
    fn test_args_select_algorithm() {
        let args = Args::parse_from(["ai_solver", "--algorithm", "beam", "--beam-width", "5"]);
        assert_eq!(
            algorithm_from_args(&args),
            Algorithm::Beam {
                weight: 1.8,
                width: 5
            }
        );

        let args = Args::parse_from(["ai_solver", "-a", "bfs", "--preset", "easy_1"]);
        assert_eq!(algorithm_from_args(&args), Algorithm::Bfs);
        assert_eq!(load_board(&args).unwrap().num_pieces(), 5);
    }

    #[test]
    fn test_seeded_random_board_is_reproducible() {
        let args = Args::parse_from(["ai_solver", "--random", "6x5", "--seed", "9"]);
        let first = load_board(&args).unwrap();
        let second = load_board(&args).unwrap();
        assert_eq!(first, second);
        assert_eq!((first.width(), first.height()), (6, 5));
    }
}
