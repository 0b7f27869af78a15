use crate::error::SolveError;
use crate::heuristics::heuristic;
use crate::model::*;
use crate::moves::{MoveRules, generate_moves};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet, VecDeque};
use std::fmt;

use log::{debug, info};
use rayon::prelude::*;

pub const DEFAULT_BFS_MAX_STATES: usize = 1_000_000;
pub const DEFAULT_PROGRESS_INTERVAL: usize = 5_000;

/// Heuristic weight / state ceiling presets for the informed solver.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum SearchMode {
    /// Greedier weight and a larger ceiling. Finds solutions quickly, not
    /// necessarily short ones.
    Fast,
    /// Unit weight and a smaller ceiling. Usually matches the breadth-first
    /// length, but that is not guaranteed.
    Optimal,
}

impl SearchMode {
    pub fn weight(self) -> f64 {
        match self {
            SearchMode::Fast => 2.0,
            SearchMode::Optimal => 1.0,
        }
    }

    pub fn max_states(self) -> usize {
        match self {
            SearchMode::Fast => 2_400_000,
            SearchMode::Optimal => 1_600_000,
        }
    }

    pub fn config(self) -> SearchConfig {
        SearchConfig {
            max_states: self.max_states(),
            weight: self.weight(),
            ..SearchConfig::default()
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct SearchConfig {
    /// The search gives up once more than this many states were explored.
    pub max_states: usize,
    /// Heuristic multiplier, ignored by breadth-first search.
    pub weight: f64,
    /// Report progress every this many explored states. Zero disables it.
    pub progress_interval: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            max_states: DEFAULT_BFS_MAX_STATES,
            weight: 1.0,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Algorithm {
    Bfs,
    AStar(SearchMode),
}

impl Algorithm {
    pub fn default_config(self) -> SearchConfig {
        match self {
            Algorithm::Bfs => SearchConfig::default(),
            Algorithm::AStar(mode) => mode.config(),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Algorithm::Bfs => "bfs",
            Algorithm::AStar(SearchMode::Fast) => "a* (fast)",
            Algorithm::AStar(SearchMode::Optimal) => "a* (optimal)",
        };
        f.pad(name)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SearchProgress {
    pub explored: usize,
    pub frontier: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Solution {
    pub moves: Vec<Move>,
    pub explored: usize,
    /// Queued entries dropped on pop because a cheaper path to the same
    /// state was found after they were queued. Always 0 for breadth-first.
    pub skipped: usize,
}

impl Solution {
    pub fn move_count(&self) -> usize {
        self.moves.len()
    }
}

type NodeId = usize;

struct SearchNode {
    state: PuzzleState,
    cost: u32,
    parent: Option<NodeId>,
    mv: Option<Move>,
}

/// Every state a search generated, with back links to its parent. Children
/// are always pushed after their parent, so the links cannot form a cycle.
struct SearchTree {
    nodes: Vec<SearchNode>,
}

impl SearchTree {
    const ROOT: NodeId = 0;

    fn new(start: PuzzleState) -> Self {
        SearchTree {
            nodes: vec![SearchNode {
                state: start,
                cost: 0,
                parent: None,
                mv: None,
            }],
        }
    }

    fn push(&mut self, state: PuzzleState, cost: u32, parent: NodeId, mv: Move) -> NodeId {
        self.nodes.push(SearchNode {
            state,
            cost,
            parent: Some(parent),
            mv: Some(mv),
        });
        self.nodes.len() - 1
    }

    fn get(&self, id: NodeId) -> &SearchNode {
        &self.nodes[id]
    }

    /// Successor states of `id`, paired with the move that produced them.
    fn expand(&self, id: NodeId, rules: MoveRules) -> Vec<(PuzzleState, Move)> {
        let node = self.get(id);
        generate_moves(&node.state, node.mv.as_ref(), rules)
            .iter()
            .filter_map(|mv| node.state.after_pour(mv.from_bottle, mv.to_bottle))
            .collect()
    }

    fn reconstruct_path(&self, goal: NodeId) -> Vec<Move> {
        let mut moves = Vec::new();
        let mut current = goal;
        while let Some(parent) = self.nodes[current].parent {
            if let Some(mv) = self.nodes[current].mv {
                moves.push(mv);
            }
            current = parent;
        }
        moves.reverse();
        moves
    }
}

struct ProgressReporter<F> {
    interval: usize,
    on_progress: F,
}

impl<F: FnMut(SearchProgress)> ProgressReporter<F> {
    fn tick(&mut self, explored: usize, frontier: usize) {
        if self.interval == 0 || explored % self.interval != 0 {
            return;
        }
        debug!("Searching... explored {explored} states ({frontier} queued)");
        (self.on_progress)(SearchProgress { explored, frontier });
    }
}

pub fn solve(start: &PuzzleState, algorithm: Algorithm) -> Result<Solution, SolveError> {
    solve_with_config(start, algorithm, &algorithm.default_config())
}

pub fn solve_with_config(
    start: &PuzzleState,
    algorithm: Algorithm,
    config: &SearchConfig,
) -> Result<Solution, SolveError> {
    match algorithm {
        Algorithm::Bfs => solve_bfs(start, config),
        Algorithm::AStar(_) => solve_astar(start, config),
    }
}

/// Solve every puzzle independently on the rayon pool. Results keep the input
/// order.
pub fn solve_batch(
    puzzles: &[PuzzleState],
    algorithm: Algorithm,
    config: &SearchConfig,
) -> Vec<Result<Solution, SolveError>> {
    puzzles
        .par_iter()
        .map(|puzzle| solve_with_config(puzzle, algorithm, config))
        .collect()
}

pub fn solve_bfs(start: &PuzzleState, config: &SearchConfig) -> Result<Solution, SolveError> {
    solve_bfs_with_progress(start, config, |_| {})
}

/// Breadth-first search over exact states. The first solved state dequeued
/// is reached by a shortest move sequence.
pub fn solve_bfs_with_progress<F>(
    start: &PuzzleState,
    config: &SearchConfig,
    on_progress: F,
) -> Result<Solution, SolveError>
where
    F: FnMut(SearchProgress),
{
    info!(
        "Starting breadth-first search: {} bottles, capacity {}, limit {}",
        start.bottle_count(),
        start.get_capacity(),
        config.max_states
    );
    let mut reporter = ProgressReporter {
        interval: config.progress_interval,
        on_progress,
    };
    let mut tree = SearchTree::new(start.clone());
    let mut visited: HashSet<StateKey> = HashSet::new();
    visited.insert(StateKey::exact(start));
    let mut frontier: VecDeque<NodeId> = VecDeque::from([SearchTree::ROOT]);
    let mut explored = 0;

    while let Some(id) = frontier.pop_front() {
        explored += 1;
        reporter.tick(explored, frontier.len());
        if explored > config.max_states {
            info!("Breadth-first search hit the state limit ({})", config.max_states);
            return Err(SolveError::StateLimit {
                limit: config.max_states,
                explored,
            });
        }

        if tree.get(id).state.is_solved() {
            let moves = tree.reconstruct_path(id);
            info!("Solved in {} moves after exploring {explored} states", moves.len());
            return Ok(Solution {
                moves,
                explored,
                skipped: 0,
            });
        }

        let cost = tree.get(id).cost + 1;
        for (next, mv) in tree.expand(id, MoveRules::Exhaustive) {
            if visited.insert(StateKey::exact(&next)) {
                let child = tree.push(next, cost, id, mv);
                frontier.push_back(child);
            }
        }
    }

    info!("Breadth-first search exhausted after {explored} states");
    Err(SolveError::NoSolution { explored })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
struct QueueEntry {
    f: u32,
    g: u32,
    node: NodeId,
}

// `BinaryHeap` is a max-heap: lowest f first, then the deeper node, then the
// older node.
impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f
            .cmp(&self.f)
            .then_with(|| self.g.cmp(&other.g))
            .then_with(|| other.node.cmp(&self.node))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub fn solve_astar(start: &PuzzleState, config: &SearchConfig) -> Result<Solution, SolveError> {
    solve_astar_with_progress(start, config, |_| {})
}

/// Weighted best-first search over canonical states.
///
/// Heap entries are never updated in place: a cheaper path to a known state
/// pushes a new entry, and entries whose cost no longer matches the best known
/// cost are skipped when popped.
pub fn solve_astar_with_progress<F>(
    start: &PuzzleState,
    config: &SearchConfig,
    on_progress: F,
) -> Result<Solution, SolveError>
where
    F: FnMut(SearchProgress),
{
    info!(
        "Starting A* search: {} bottles, capacity {}, weight {}, limit {}",
        start.bottle_count(),
        start.get_capacity(),
        config.weight,
        config.max_states
    );
    let mut reporter = ProgressReporter {
        interval: config.progress_interval,
        on_progress,
    };
    let mut tree = SearchTree::new(start.clone());
    let mut best_cost: HashMap<StateKey, u32> = HashMap::new();
    best_cost.insert(StateKey::canonical(start), 0);
    let mut queue = BinaryHeap::new();
    queue.push(QueueEntry {
        f: heuristic(start, config.weight),
        g: 0,
        node: SearchTree::ROOT,
    });
    let mut explored = 0;
    let mut skipped = 0;

    while let Some(entry) = queue.pop() {
        let key = StateKey::canonical(&tree.get(entry.node).state);
        if best_cost.get(&key).is_some_and(|&best| best != entry.g) {
            skipped += 1;
            continue;
        }

        explored += 1;
        reporter.tick(explored, queue.len());
        if explored > config.max_states {
            info!("A* search hit the state limit ({})", config.max_states);
            return Err(SolveError::StateLimit {
                limit: config.max_states,
                explored,
            });
        }

        if tree.get(entry.node).state.is_solved() {
            let moves = tree.reconstruct_path(entry.node);
            info!(
                "Solved in {} moves after exploring {explored} states ({skipped} stale entries skipped)",
                moves.len()
            );
            return Ok(Solution {
                moves,
                explored,
                skipped,
            });
        }

        let g = entry.g + 1;
        for (next, mv) in tree.expand(entry.node, MoveRules::Informed) {
            let next_key = StateKey::canonical(&next);
            if best_cost.get(&next_key).is_some_and(|&best| best <= g) {
                continue;
            }
            let f = g + heuristic(&next, config.weight);
            best_cost.insert(next_key, g);
            let child = tree.push(next, g, entry.node, mv);
            queue.push(QueueEntry { f, g, node: child });
        }
    }

    info!("A* search exhausted after {explored} states");
    Err(SolveError::NoSolution { explored })
}
