//! Informed state-space search over `BoardState`s.
//!
//! A single best-first loop drives every algorithm. What differs between them is the
//! frontier (FIFO queue, LIFO stack or a min-heap keyed by a per-call scoring rule), when a
//! state is marked visited, and whether the frontier is cut back to a beam after each
//! expansion:
//!
//! | Algorithm | Frontier key | Visited marked |
//! |---|---|---|
//! | BFS | insertion order (FIFO) | when popped |
//! | DFS | insertion order (LIFO) | when popped |
//! | Greedy | `h(board, depth)` | when popped |
//! | A* / weighted A* | `depth + weight * h(board, depth)` | when discovered |
//! | Beam | as weighted A*, keeping the best `width` entries | when discovered |
//!
//! Discovered nodes are stored in a [`SearchTree`] arena; each [`TreeNode`] records its
//! parent by index, so a solution path is recovered by walking parents back to the root.
use crate::engine::BoardState;
use crate::error::SearchError;
use crate::heuristics::Heuristic;
use log::{debug, info, trace};
use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet, VecDeque};
use std::fmt;
use std::sync::Arc;

/// Index of a node inside a [`SearchTree`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A discovered board together with its parent link and depth.
#[derive(Clone, Debug)]
pub struct TreeNode {
    board: Arc<BoardState>,
    parent: Option<NodeId>,
    depth: usize,
}

impl TreeNode {
    pub fn board(&self) -> &BoardState {
        &self.board
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Number of moves from the root. Computed once when the node is created.
    pub fn depth(&self) -> usize {
        self.depth
    }
}

/// Arena of every node created during one search.
#[derive(Clone, Debug, Default)]
pub struct SearchTree {
    nodes: Vec<TreeNode>,
}

impl SearchTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node. Its depth is one more than its parent's, or 0 for a root.
    ///
    /// # Panics
    /// Panics if `parent` does not belong to this tree.
    pub fn push(&mut self, board: Arc<BoardState>, parent: Option<NodeId>) -> NodeId {
        let depth = parent.map_or(0, |p| self.nodes[p.0].depth + 1);
        self.nodes.push(TreeNode {
            board,
            parent,
            depth,
        });
        NodeId(self.nodes.len() - 1)
    }

    pub fn get(&self, id: NodeId) -> Option<&TreeNode> {
        self.nodes.get(id.0)
    }

    /// # Panics
    /// Panics if `id` does not belong to this tree.
    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn depth(&self, id: NodeId) -> usize {
        self.node(id).depth
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).parent
    }

    /// Node ids from the root down to `id`, inclusive.
    pub fn path_to(&self, id: NodeId) -> Vec<NodeId> {
        let mut path = Vec::with_capacity(self.depth(id) + 1);
        let mut current = Some(id);
        while let Some(node_id) = current {
            path.push(node_id);
            current = self.parent(node_id);
        }
        path.reverse();
        path
    }
}

/// Which search to run. Weight and beam width travel with the variants that use them.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Algorithm {
    Bfs,
    Dfs,
    Greedy,
    /// A* with `depth + weight * h` ordering. `weight = 1` is plain A*.
    AStar { weight: f64 },
    /// Weighted A* ordering with the frontier cut to the best `width` entries per expansion.
    Beam { weight: f64, width: usize },
}

impl Algorithm {
    pub fn a_star() -> Self {
        Algorithm::AStar { weight: 1.0 }
    }

    /// Rejects weights below 1 (or non-finite) and a zero beam width.
    pub fn validate(&self) -> Result<(), SearchError> {
        match *self {
            Algorithm::AStar { weight } | Algorithm::Beam { weight, .. }
                if !weight.is_finite() || weight < 1.0 =>
            {
                Err(SearchError::InvalidWeight(weight))
            }
            Algorithm::Beam { width: 0, .. } => Err(SearchError::ZeroBeamWidth),
            _ => Ok(()),
        }
    }

    pub fn uses_heuristic(&self) -> bool {
        !matches!(self, Algorithm::Bfs | Algorithm::Dfs)
    }

    /// A*-family searches mark a state visited when it is first enqueued.
    fn marks_on_discovery(&self) -> bool {
        matches!(self, Algorithm::AStar { .. } | Algorithm::Beam { .. })
    }

    /// Returns the `(key, heuristic)` pair for a priority frontier, or `None` for FIFO/LIFO.
    fn score(
        &self,
        heuristic: &dyn Heuristic,
        board: &BoardState,
        depth: usize,
    ) -> Option<(f64, f64)> {
        match *self {
            Algorithm::Bfs | Algorithm::Dfs => None,
            Algorithm::Greedy => {
                let h = heuristic.estimate(board, depth);
                Some((h, h))
            }
            Algorithm::AStar { weight } | Algorithm::Beam { weight, .. } => {
                let h = heuristic.estimate(board, depth);
                Some((depth as f64 + weight * h, h))
            }
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Algorithm::Bfs => write!(f, "BFS"),
            Algorithm::Dfs => write!(f, "DFS"),
            Algorithm::Greedy => write!(f, "Greedy"),
            Algorithm::AStar { weight } if *weight == 1.0 => write!(f, "A*"),
            Algorithm::AStar { weight } => write!(f, "Weighted A* (x{})", weight),
            Algorithm::Beam { weight, width } if *weight == 1.0 => {
                write!(f, "Beam (width {})", width)
            }
            Algorithm::Beam { weight, width } => {
                write!(f, "Beam (width {}, x{})", width, weight)
            }
        }
    }
}

/// Receives every node the search pops for expansion.
pub trait SearchObserver {
    /// Called once per expanded node with the current visited-set size and the node's
    /// heuristic value (`None` for BFS/DFS). Returning `true` cancels the search.
    fn on_expand(&mut self, node: &TreeNode, visited: usize, heuristic: Option<f64>) -> bool;
}

impl<F> SearchObserver for F
where
    F: FnMut(&TreeNode, usize, Option<f64>) -> bool,
{
    fn on_expand(&mut self, node: &TreeNode, visited: usize, heuristic: Option<f64>) -> bool {
        self(node, visited, heuristic)
    }
}

/// Per-call search settings.
#[derive(Default)]
pub struct SearchOptions<'o> {
    /// Children deeper than this are not enqueued.
    pub depth_limit: Option<usize>,
    /// Only move pieces that [`BoardState::should_move`] accepts. Faster, but can miss
    /// the only solution on contrived boards.
    pub prune_idle_pieces: bool,
    pub observer: Option<&'o mut dyn SearchObserver>,
}

impl<'o> SearchOptions<'o> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_depth_limit(mut self, limit: usize) -> Self {
        self.depth_limit = Some(limit);
        self
    }

    pub fn with_pruning(mut self) -> Self {
        self.prune_idle_pieces = true;
        self
    }

    pub fn with_observer(mut self, observer: &'o mut dyn SearchObserver) -> Self {
        self.observer = Some(observer);
        self
    }
}

/// How a search ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SearchStatus {
    /// A winning node was popped.
    Solved(NodeId),
    /// The frontier ran dry.
    Exhausted,
    /// The observer asked to stop.
    Cancelled,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes created, the root included.
    pub generated: usize,
    /// Nodes popped and handed to the observer.
    pub expanded: usize,
    /// Size of the visited set when the search stopped.
    pub visited: usize,
    /// Largest frontier size seen after an expansion.
    pub peak_frontier: usize,
}

/// The result of a search: its status, counters and the full discovery tree.
#[derive(Clone, Debug)]
pub struct SearchOutcome {
    pub status: SearchStatus,
    pub stats: SearchStats,
    tree: SearchTree,
}

impl SearchOutcome {
    pub fn is_solved(&self) -> bool {
        matches!(self.status, SearchStatus::Solved(_))
    }

    pub fn solution_id(&self) -> Option<NodeId> {
        match self.status {
            SearchStatus::Solved(id) => Some(id),
            _ => None,
        }
    }

    /// The winning node, if any.
    pub fn solution(&self) -> Option<&TreeNode> {
        self.solution_id().map(|id| self.tree.node(id))
    }

    /// Nodes from the root to the winning node. Empty when unsolved.
    pub fn path(&self) -> Vec<&TreeNode> {
        self.solution_id()
            .map(|id| {
                self.tree
                    .path_to(id)
                    .into_iter()
                    .map(|n| self.tree.node(n))
                    .collect()
            })
            .unwrap_or_default()
    }

    pub fn tree(&self) -> &SearchTree {
        &self.tree
    }
}

/// Heap entry ordered so that `BinaryHeap` pops the lowest key first, and among equal
/// keys the earliest inserted.
struct Scored {
    key: f64,
    heuristic: f64,
    seq: u64,
    node: NodeId,
}

impl Ord for Scored {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Scored {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Scored {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Scored {}

enum Frontier {
    Fifo(VecDeque<NodeId>),
    Lifo(Vec<NodeId>),
    Priority {
        heap: BinaryHeap<Scored>,
        next_seq: u64,
        beam_width: Option<usize>,
    },
}

impl Frontier {
    fn for_algorithm(algorithm: Algorithm) -> Self {
        match algorithm {
            Algorithm::Bfs => Frontier::Fifo(VecDeque::new()),
            Algorithm::Dfs => Frontier::Lifo(Vec::new()),
            Algorithm::Greedy | Algorithm::AStar { .. } => Frontier::Priority {
                heap: BinaryHeap::new(),
                next_seq: 0,
                beam_width: None,
            },
            Algorithm::Beam { width, .. } => Frontier::Priority {
                heap: BinaryHeap::new(),
                next_seq: 0,
                beam_width: Some(width),
            },
        }
    }

    fn push(&mut self, node: NodeId, score: Option<(f64, f64)>) {
        match self {
            Frontier::Fifo(queue) => queue.push_back(node),
            Frontier::Lifo(stack) => stack.push(node),
            Frontier::Priority { heap, next_seq, .. } => {
                debug_assert!(score.is_some(), "priority frontier needs a score");
                let (key, heuristic) = score.unwrap_or((0.0, 0.0));
                heap.push(Scored {
                    key,
                    heuristic,
                    seq: *next_seq,
                    node,
                });
                *next_seq += 1;
            }
        }
    }

    fn pop(&mut self) -> Option<(NodeId, Option<f64>)> {
        match self {
            Frontier::Fifo(queue) => queue.pop_front().map(|n| (n, None)),
            Frontier::Lifo(stack) => stack.pop().map(|n| (n, None)),
            Frontier::Priority { heap, .. } => heap.pop().map(|s| (s.node, Some(s.heuristic))),
        }
    }

    fn len(&self) -> usize {
        match self {
            Frontier::Fifo(queue) => queue.len(),
            Frontier::Lifo(stack) => stack.len(),
            Frontier::Priority { heap, .. } => heap.len(),
        }
    }

    /// Keeps only the best `beam_width` entries. No-op for unbounded frontiers.
    fn truncate_to_beam(&mut self) {
        if let Frontier::Priority {
            heap,
            beam_width: Some(width),
            ..
        } = self
        {
            if heap.len() > *width {
                // Ascending by `Ord`, so the best entries sit at the end.
                let mut entries = std::mem::take(heap).into_sorted_vec();
                let best = entries.split_off(entries.len() - *width);
                *heap = BinaryHeap::from(best);
            }
        }
    }
}

fn no_heuristic(_: &BoardState, _: usize) -> f64 {
    0.0
}

fn run(
    root: &BoardState,
    algorithm: Algorithm,
    heuristic: &dyn Heuristic,
    mut options: SearchOptions<'_>,
) -> SearchOutcome {
    debug!(
        "starting {} on {}x{} board with {} pieces ({} colors), depth limit {:?}, pruning {}",
        algorithm,
        root.width(),
        root.height(),
        root.num_pieces(),
        root.num_colors(),
        options.depth_limit,
        options.prune_idle_pieces
    );

    let on_discovery = algorithm.marks_on_discovery();
    let mut tree = SearchTree::new();
    let mut visited: HashSet<Arc<BoardState>> = HashSet::new();
    let mut frontier = Frontier::for_algorithm(algorithm);
    let mut stats = SearchStats::default();

    let root_board = Arc::new(root.clone());
    if on_discovery {
        visited.insert(Arc::clone(&root_board));
    }
    let root_score = algorithm.score(heuristic, &root_board, 0);
    let root_id = tree.push(root_board, None);
    frontier.push(root_id, root_score);
    stats.peak_frontier = 1;

    let status = loop {
        let Some((id, h)) = frontier.pop() else {
            break SearchStatus::Exhausted;
        };
        let board = Arc::clone(&tree.node(id).board);
        let depth = tree.node(id).depth;

        if !on_discovery && !visited.insert(Arc::clone(&board)) {
            continue;
        }
        stats.expanded += 1;
        trace!(
            "expanding depth {} (visited {}, frontier {}, h {:?})",
            depth,
            visited.len(),
            frontier.len(),
            h
        );

        if let Some(observer) = options.observer.as_deref_mut() {
            if observer.on_expand(tree.node(id), visited.len(), h) {
                break SearchStatus::Cancelled;
            }
        }

        if board.is_win() {
            break SearchStatus::Solved(id);
        }

        let child_depth = depth + 1;
        if options.depth_limit.is_some_and(|limit| child_depth > limit) {
            continue;
        }

        let children = if options.prune_idle_pieces {
            board.children_filtered(|b, index| b.should_move(index))
        } else {
            board.children()
        };

        for child in children {
            if visited.contains(&child) {
                continue;
            }
            let child = Arc::new(child);
            if on_discovery {
                visited.insert(Arc::clone(&child));
            }
            let score = algorithm.score(heuristic, &child, child_depth);
            let child_id = tree.push(child, Some(id));
            frontier.push(child_id, score);
        }

        frontier.truncate_to_beam();
        stats.peak_frontier = stats.peak_frontier.max(frontier.len());
    };

    stats.generated = tree.len();
    stats.visited = visited.len();

    match status {
        SearchStatus::Solved(id) => info!(
            "{} solved at depth {} after expanding {} nodes ({} visited)",
            algorithm,
            tree.depth(id),
            stats.expanded,
            stats.visited
        ),
        SearchStatus::Exhausted => info!(
            "{} exhausted the frontier after expanding {} nodes ({} visited)",
            algorithm, stats.expanded, stats.visited
        ),
        SearchStatus::Cancelled => info!(
            "{} cancelled after expanding {} nodes ({} visited)",
            algorithm, stats.expanded, stats.visited
        ),
    }

    SearchOutcome {
        status,
        stats,
        tree,
    }
}

/// Runs `algorithm` from `root`. BFS and DFS ignore `heuristic`.
pub fn solve(
    root: &BoardState,
    algorithm: Algorithm,
    heuristic: &dyn Heuristic,
    options: SearchOptions<'_>,
) -> Result<SearchOutcome, SearchError> {
    algorithm.validate()?;
    Ok(run(root, algorithm, heuristic, options))
}

/// Breadth-first search. Returns a minimum-depth solution when one exists within the limits.
pub fn bfs(root: &BoardState, options: SearchOptions<'_>) -> SearchOutcome {
    run(root, Algorithm::Bfs, &no_heuristic, options)
}

/// Depth-first search. No optimality guarantee; use a depth limit on large boards.
pub fn dfs(root: &BoardState, options: SearchOptions<'_>) -> SearchOutcome {
    run(root, Algorithm::Dfs, &no_heuristic, options)
}

/// Greedy best-first search ordered by `heuristic` alone.
pub fn greedy_search(
    root: &BoardState,
    heuristic: &dyn Heuristic,
    options: SearchOptions<'_>,
) -> SearchOutcome {
    run(root, Algorithm::Greedy, heuristic, options)
}

/// A* ordered by `depth + heuristic`.
pub fn a_star(
    root: &BoardState,
    heuristic: &dyn Heuristic,
    options: SearchOptions<'_>,
) -> SearchOutcome {
    run(root, Algorithm::a_star(), heuristic, options)
}

/// A* ordered by `depth + weight * heuristic`, `weight >= 1`.
pub fn weighted_a_star(
    root: &BoardState,
    heuristic: &dyn Heuristic,
    weight: f64,
    options: SearchOptions<'_>,
) -> Result<SearchOutcome, SearchError> {
    solve(root, Algorithm::AStar { weight }, heuristic, options)
}

/// Weighted A* keeping only the best `beam_width` frontier entries after each expansion.
/// Incomplete: the only solution branch may be discarded.
pub fn beam_search(
    root: &BoardState,
    heuristic: &dyn Heuristic,
    weight: f64,
    beam_width: usize,
    options: SearchOptions<'_>,
) -> Result<SearchOutcome, SearchError> {
    solve(
        root,
        Algorithm::Beam {
            weight,
            width: beam_width,
        },
        heuristic,
        options,
    )
}
