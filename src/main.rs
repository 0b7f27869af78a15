use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rayon::prelude::*;
use thiserror::Error;

use water_sort::gameplay::{FormatOptions, format_solution};
use water_sort::generator::{example_puzzle, random_puzzle};
use water_sort::model::DEFAULT_CAPACITY;
use water_sort::solver::{solve_batch, solve_with_config};
use water_sort::validation::{Strictness, validate};
use water_sort::{Algorithm, Palette, PuzzleError, PuzzleState, SearchConfig, SearchMode, SolveError};

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    /// Log search progress
    #[clap(short, long, global = true)]
    verbose: bool,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum AlgorithmArg {
    /// Breadth-first, shortest solution
    Bfs,
    /// A* with a greedy heuristic weight
    Fast,
    /// A* with unit heuristic weight
    Optimal,
}

impl From<AlgorithmArg> for Algorithm {
    fn from(arg: AlgorithmArg) -> Self {
        match arg {
            AlgorithmArg::Bfs => Algorithm::Bfs,
            AlgorithmArg::Fast => Algorithm::AStar(SearchMode::Fast),
            AlgorithmArg::Optimal => Algorithm::AStar(SearchMode::Optimal),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Solve a level file (one bottle per line, colours bottom to top, `-` for empty)
    Solve {
        level_file: PathBuf,
        #[clap(short, long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
        #[clap(short, long, value_enum, default_value_t = AlgorithmArg::Bfs)]
        algorithm: AlgorithmArg,
        /// Give up after exploring this many states
        #[clap(long)]
        max_states: Option<usize>,
        /// Allow partially filled bottles
        #[clap(long)]
        lenient: bool,
        /// Print the bottles after every move
        #[clap(long)]
        show_states: bool,
        /// Only print bottle numbers for each move
        #[clap(long)]
        short: bool,
    },
    /// Solve a level file with every algorithm in parallel
    Compare {
        level_file: PathBuf,
        #[clap(short, long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
        #[clap(long)]
        lenient: bool,
    },
    /// Print a random level
    Generate {
        #[clap(long, default_value_t = 6)]
        colors: usize,
        #[clap(short, long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
        #[clap(long)]
        seed: Option<u64>,
    },
    /// Solve a batch of random levels
    Bench {
        #[clap(long, default_value_t = 8)]
        puzzles: usize,
        #[clap(long, default_value_t = 5)]
        colors: usize,
        #[clap(short, long, default_value_t = DEFAULT_CAPACITY)]
        capacity: usize,
        #[clap(long, default_value_t = 0)]
        seed: u64,
        #[clap(short, long, value_enum, default_value_t = AlgorithmArg::Fast)]
        algorithm: AlgorithmArg,
        #[clap(long)]
        max_states: Option<usize>,
    },
    /// Print the bundled sample level
    Example,
}

#[derive(Debug, Error)]
enum CliError {
    #[error("Failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Puzzle(#[from] PuzzleError),
    #[error(transparent)]
    Solve(#[from] SolveError),
}

fn read_level(path: &Path, capacity: usize, palette: &Palette, lenient: bool) -> Result<PuzzleState, CliError> {
    let content = fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let puzzle = PuzzleState::from_text(&content, capacity, palette)?;
    let strictness = if lenient {
        Strictness::Lenient
    } else {
        Strictness::Strict
    };
    validate(&puzzle, palette, strictness)?;
    info!("Loaded {} bottles from {}", puzzle.bottle_count(), path.display());
    Ok(puzzle)
}

fn search_config(algorithm: Algorithm, max_states: Option<usize>) -> SearchConfig {
    let mut config = algorithm.default_config();
    if let Some(max_states) = max_states {
        config.max_states = max_states;
    }
    config
}

fn run_solve(
    puzzle: &PuzzleState,
    palette: &Palette,
    algorithm: Algorithm,
    config: &SearchConfig,
    options: FormatOptions,
) -> Result<(), CliError> {
    println!("Solving with {algorithm}...");
    let started = Instant::now();
    let result = solve_with_config(puzzle, algorithm, config);
    let elapsed = started.elapsed().as_millis();

    match result {
        Ok(solution) => {
            println!(
                "Solved! Moves: {}. Explored: {} states. Time: {elapsed} ms\n",
                solution.move_count(),
                solution.explored
            );
            print!("{}", format_solution(puzzle, &solution.moves, palette, options)?);
            Ok(())
        }
        Err(err) => {
            println!("Failed: {err}\nExplored: {} states\nTime: {elapsed} ms", err.explored());
            Err(err.into())
        }
    }
}

fn run_compare(puzzle: &PuzzleState) {
    let algorithms = [
        Algorithm::Bfs,
        Algorithm::AStar(SearchMode::Fast),
        Algorithm::AStar(SearchMode::Optimal),
    ];
    let results: Vec<_> = algorithms
        .par_iter()
        .map(|&algorithm| {
            let started = Instant::now();
            let result = solve_with_config(puzzle, algorithm, &algorithm.default_config());
            (algorithm, result, started.elapsed().as_millis())
        })
        .collect();

    for (algorithm, result, elapsed) in results {
        match result {
            Ok(solution) => println!(
                "{algorithm:>14}: {} moves, {} states, {elapsed} ms",
                solution.move_count(),
                solution.explored
            ),
            Err(err) => println!("{algorithm:>14}: {err} ({} states, {elapsed} ms)", err.explored()),
        }
    }
}

fn run_bench(
    puzzles: usize,
    colors: usize,
    capacity: usize,
    seed: u64,
    algorithm: Algorithm,
    config: &SearchConfig,
) -> Result<(), CliError> {
    let levels = (0..puzzles as u64)
        .map(|offset| random_puzzle(colors, capacity, seed.wrapping_add(offset)))
        .collect::<Result<Vec<_>, _>>()?;

    let started = Instant::now();
    let results = solve_batch(&levels, algorithm, config);
    let elapsed = started.elapsed().as_millis();

    let solved: Vec<_> = results.iter().filter_map(|result| result.as_ref().ok()).collect();
    let explored: usize = results
        .iter()
        .map(|result| match result {
            Ok(solution) => solution.explored,
            Err(err) => err.explored(),
        })
        .sum();
    let total_moves: usize = solved.iter().map(|solution| solution.move_count()).sum();

    println!("{algorithm}: solved {}/{} levels in {elapsed} ms", solved.len(), levels.len());
    if !solved.is_empty() {
        println!("Average moves: {:.1}", total_moves as f64 / solved.len() as f64);
    }
    println!("States explored: {explored}");
    Ok(())
}

fn run(args: Args) -> Result<(), CliError> {
    let palette = Palette::default();
    match args.command {
        Command::Solve {
            level_file,
            capacity,
            algorithm,
            max_states,
            lenient,
            show_states,
            short,
        } => {
            let puzzle = read_level(&level_file, capacity, &palette, lenient)?;
            let algorithm = Algorithm::from(algorithm);
            let options = FormatOptions {
                show_states,
                short_moves: short,
            };
            run_solve(&puzzle, &palette, algorithm, &search_config(algorithm, max_states), options)
        }
        Command::Compare {
            level_file,
            capacity,
            lenient,
        } => {
            let puzzle = read_level(&level_file, capacity, &palette, lenient)?;
            run_compare(&puzzle);
            Ok(())
        }
        Command::Generate { colors, capacity, seed } => {
            if colors > palette.len() {
                return Err(PuzzleError::PaletteFull { max: palette.len() }.into());
            }
            let seed = seed.unwrap_or_else(rand::random);
            let puzzle = random_puzzle(colors, capacity, seed)?;
            println!("# seed {seed}, capacity {capacity}");
            print!("{}", puzzle.to_text(&palette));
            Ok(())
        }
        Command::Bench {
            puzzles,
            colors,
            capacity,
            seed,
            algorithm,
            max_states,
        } => {
            let algorithm = Algorithm::from(algorithm);
            run_bench(puzzles, colors, capacity, seed, algorithm, &search_config(algorithm, max_states))
        }
        Command::Example => {
            let puzzle = example_puzzle();
            println!("# capacity {}", puzzle.get_capacity());
            print!("{}", puzzle.to_text(&palette));
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    let args = Args::parse();
    let default_filter = if args.verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter)).init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err}");
            ExitCode::FAILURE
        }
    }
}
