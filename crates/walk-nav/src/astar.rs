//! Generic A* over any [`NavGraph`].
//!
//! Nodes are dense `usize` indices. Per-search bookkeeping (cost, heuristic, parent, depth and
//! open/closed membership) lives in an [`AStarQuery`] that is reset on every call, so the graph
//! itself is only borrowed immutably. One query object serves one search at a time.

use core::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::Vec2;

/// Per-expansion context handed to cost and blocked queries.
#[derive(Debug)]
pub struct NavContext<'a, M: ?Sized> {
    /// Entity being routed, if the graph cares.
    pub mover: Option<&'a M>,
    /// Node currently being expanded.
    pub source: usize,
    /// Node the search reached `source` from (`None` for the search origin).
    pub parent: Option<usize>,
}

impl<M: ?Sized> Clone for NavContext<'_, M> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<M: ?Sized> Copy for NavContext<'_, M> {}

/// Graph contract the search runs over.
pub trait NavGraph {
    /// Mover type forwarded through [`NavContext`]; `()` for graphs that ignore it.
    type Mover: ?Sized;

    fn node_count(&self) -> usize;

    fn position(&self, node: usize) -> Vec2;

    /// Append the neighbors of `node` to `out` (already cleared by the caller), in a stable order.
    fn neighbors(&self, node: usize, out: &mut Vec<usize>);

    /// Whether `node` may not be entered in this context.
    fn blocked(&self, ctx: &NavContext<'_, Self::Mover>, node: usize) -> bool;

    /// Cost of stepping from `ctx.source` to `node`.
    fn cost(&self, ctx: &NavContext<'_, Self::Mover>, node: usize) -> f32;
}

/// Estimate of the remaining cost from `node` to `target`.
pub trait Heuristic<G: NavGraph> {
    fn estimate(&self, graph: &G, node: usize, target: usize) -> f32;
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ManhattanDistance;

impl<G: NavGraph> Heuristic<G> for ManhattanDistance {
    fn estimate(&self, graph: &G, node: usize, target: usize) -> f32 {
        graph.position(node).manhattan_distance(graph.position(target))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EuclideanDistance;

impl<G: NavGraph> Heuristic<G> for EuclideanDistance {
    fn estimate(&self, graph: &G, node: usize, target: usize) -> f32 {
        graph.position(node).distance(graph.position(target))
    }
}

impl<G: NavGraph> Heuristic<G> for crate::HeuristicKind {
    fn estimate(&self, graph: &G, node: usize, target: usize) -> f32 {
        match self {
            Self::Manhattan => ManhattanDistance.estimate(graph, node, target),
            Self::Euclidean => EuclideanDistance.estimate(graph, node, target),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    #[default]
    Unvisited,
    Open,
    Closed,
}

/// Transient search fields for one node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchNode {
    pub cost: f32,
    pub heuristic: f32,
    pub parent: Option<usize>,
    pub depth: usize,
    pub state: NodeState,
    tie: u64,
}

impl Default for SearchNode {
    fn default() -> Self {
        Self {
            cost: f32::INFINITY,
            heuristic: 0.0,
            parent: None,
            depth: 0,
            state: NodeState::Unvisited,
            tie: 0,
        }
    }
}

/// Counters from the most recent search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SearchStats {
    /// Nodes moved to the closed set.
    pub expanded: usize,
    /// Deepest depth assigned to a discovered node.
    pub max_depth: usize,
    /// The loop stopped on a bound rather than on the target or an empty open list.
    pub bound_reached: bool,
}

#[derive(Debug, Clone, Copy)]
struct OpenNode {
    f: f32,
    tie: u64,
    node: usize,
}

impl PartialEq for OpenNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenNode {}

impl Ord for OpenNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering to make BinaryHeap behave like a min-heap; equal `f` pops in
        // insertion order.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.tie.cmp(&self.tie))
    }
}

impl PartialOrd for OpenNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// Reusable scratch buffers for [`AStarPathFinder`] searches.
#[derive(Debug, Default)]
pub struct AStarQuery {
    nodes: Vec<SearchNode>,
    open: BinaryHeap<OpenNode>,
    neighbors: Vec<usize>,
    stats: SearchStats,
}

impl AStarQuery {
    pub fn stats(&self) -> SearchStats {
        self.stats
    }

    /// Forget the previous search, keeping allocations.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.open.clear();
        self.stats = SearchStats::default();
    }

    /// Search fields of `node` as left by the last search.
    pub fn search_node(&self, node: usize) -> Option<&SearchNode> {
        self.nodes.get(node)
    }
}

#[derive(Debug, Clone)]
pub struct AStarPathFinder<H> {
    heuristic: H,
    max_search_distance: usize,
    max_expansions: usize,
}

impl<H> AStarPathFinder<H> {
    pub fn new(heuristic: H, max_search_distance: usize) -> Self {
        Self {
            heuristic,
            max_search_distance,
            max_expansions: usize::MAX,
        }
    }

    pub fn with_max_expansions(mut self, max_expansions: usize) -> Self {
        self.max_expansions = max_expansions;
        self
    }

    pub fn max_search_distance(&self) -> usize {
        self.max_search_distance
    }

    pub fn max_expansions(&self) -> usize {
        self.max_expansions
    }

    pub fn heuristic(&self) -> &H {
        &self.heuristic
    }

    /// Node chain from `source` to `target`, both included.
    pub fn find_path<G>(
        &self,
        graph: &G,
        mover: Option<&G::Mover>,
        source: usize,
        target: usize,
    ) -> Option<Vec<usize>>
    where
        G: NavGraph,
        H: Heuristic<G>,
    {
        let mut query = AStarQuery::default();
        let mut out = Vec::new();
        self.find_path_into(graph, mover, source, target, &mut query, &mut out)?;
        Some(out)
    }

    pub fn find_path_into<G>(
        &self,
        graph: &G,
        mover: Option<&G::Mover>,
        source: usize,
        target: usize,
        query: &mut AStarQuery,
        out: &mut Vec<usize>,
    ) -> Option<()>
    where
        G: NavGraph,
        H: Heuristic<G>,
    {
        out.clear();

        let AStarQuery {
            nodes,
            open,
            neighbors,
            stats,
        } = query;

        let n = graph.node_count();
        nodes.clear();
        nodes.resize(n, SearchNode::default());
        open.clear();
        *stats = SearchStats::default();

        if source >= n || target >= n {
            return None;
        }

        // Fail fast: nothing can reach a blocked target.
        let origin = NavContext {
            mover,
            source,
            parent: None,
        };
        if graph.blocked(&origin, target) {
            return None;
        }

        let mut tie: u64 = 0;
        nodes[source] = SearchNode {
            cost: 0.0,
            heuristic: self.heuristic.estimate(graph, source, target),
            parent: None,
            depth: 0,
            state: NodeState::Open,
            tie,
        };
        open.push(OpenNode {
            f: nodes[source].heuristic,
            tie,
            node: source,
        });

        let mut reached = false;
        loop {
            if stats.max_depth >= self.max_search_distance
                || stats.expanded >= self.max_expansions
            {
                stats.bound_reached = true;
                tracing::trace!(
                    expanded = stats.expanded,
                    max_depth = stats.max_depth,
                    "search bound reached"
                );
                break;
            }

            let Some(entry) = open.pop() else { break };
            let current = entry.node;
            if nodes[current].state != NodeState::Open || nodes[current].tie != entry.tie {
                // Stale heap entry.
                continue;
            }

            if current == target {
                reached = true;
                break;
            }

            nodes[current].state = NodeState::Closed;
            stats.expanded += 1;

            let ctx = NavContext {
                mover,
                source: current,
                parent: nodes[current].parent,
            };
            let current_cost = nodes[current].cost;
            let current_depth = nodes[current].depth;

            neighbors.clear();
            graph.neighbors(current, neighbors);

            for &next in neighbors.iter() {
                if next == current || next >= n || graph.blocked(&ctx, next) {
                    continue;
                }

                let next_cost = current_cost + graph.cost(&ctx, next);
                if next_cost < nodes[next].cost {
                    // Cheaper route: drop it from OPEN/CLOSED so it is re-queued below.
                    nodes[next].state = NodeState::Unvisited;
                }

                if nodes[next].state != NodeState::Unvisited {
                    continue;
                }

                tie += 1;
                let heuristic = self.heuristic.estimate(graph, next, target);
                let depth = current_depth + 1;
                nodes[next] = SearchNode {
                    cost: next_cost,
                    heuristic,
                    parent: Some(current),
                    depth,
                    state: NodeState::Open,
                    tie,
                };
                stats.max_depth = stats.max_depth.max(depth);
                open.push(OpenNode {
                    f: next_cost + heuristic,
                    tie,
                    node: next,
                });
            }
        }

        // A target discovered before a bound cut the loop still has a usable chain.
        if !reached && nodes[target].parent.is_none() {
            return None;
        }

        let mut current = target;
        out.push(current);
        while current != source {
            let Some(parent) = nodes[current].parent else {
                out.clear();
                return None;
            };
            current = parent;
            out.push(current);
            if out.len() > n {
                out.clear();
                return None;
            }
        }
        out.reverse();
        Some(())
    }
}
