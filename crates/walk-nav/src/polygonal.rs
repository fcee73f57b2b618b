//! Visibility graph over a walk zone and the obstacles inside it.
//!
//! Graph nodes sit on the corners a taut path can bend around: reflex corners of the walk zone
//! and outward corners of obstacles. Two nodes are linked when the segment between them stays
//! inside the walk zone and out of every obstacle. Path queries short-circuit to a straight
//! segment when source and target see each other and otherwise search the graph with the source
//! and target spliced in as transient nodes.

use std::collections::BTreeSet;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::astar::{AStarPathFinder, AStarQuery, NavContext, NavGraph, SearchStats};
use crate::polygon::{self, PolygonRole};
use crate::{EdgeCost, HeuristicKind, NavConfig, NavPath, Navigator, Polygon, Result, Vec2};

/// Caller-chosen identity of a dynamic obstacle (typically the actor that owns it).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ObstacleId(pub u64);

/// Polygon a graph node was taken from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeOrigin {
    WalkZone,
    StaticObstacle,
    DynamicObstacle(ObstacleId),
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavNode {
    position: Vec2,
    origin: NodeOrigin,
    neighbors: BTreeSet<usize>,
}

impl NavNode {
    fn new(position: Vec2, origin: NodeOrigin) -> Self {
        Self {
            position,
            origin,
            neighbors: BTreeSet::new(),
        }
    }

    pub fn position(&self) -> Vec2 {
        self.position
    }

    pub fn origin(&self) -> NodeOrigin {
        self.origin
    }

    /// Indices of mutually visible nodes, ascending.
    pub fn neighbors(&self) -> impl Iterator<Item = usize> + '_ {
        self.neighbors.iter().copied()
    }

    pub fn is_neighbor(&self, node: usize) -> bool {
        self.neighbors.contains(&node)
    }
}

#[derive(Debug, Clone)]
struct DynamicObstacle {
    id: ObstacleId,
    polygon: Polygon,
}

/// Reusable scratch buffers for [`PolygonalNavGraph::find_path_into`].
#[derive(Debug, Default)]
pub struct PathQuery {
    search: AStarQuery,
    chain: Vec<usize>,
    start_links: Vec<usize>,
    target_links: Vec<bool>,
}

impl PathQuery {
    /// Counters of the last graph search (all zero when the query was answered directly).
    pub fn search_stats(&self) -> SearchStats {
        self.search.stats()
    }
}

#[derive(Debug, Clone)]
pub struct PolygonalNavGraph {
    config: NavConfig,
    pathfinder: AStarPathFinder<HeuristicKind>,
    walk_zone: Option<Polygon>,
    static_obstacles: Vec<Polygon>,
    dynamic_obstacles: Vec<DynamicObstacle>,
    nodes: Vec<NavNode>,
}

impl Default for PolygonalNavGraph {
    fn default() -> Self {
        Self::with_valid_config(NavConfig::default())
    }
}

impl PolygonalNavGraph {
    pub fn new(config: NavConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::with_valid_config(config))
    }

    fn with_valid_config(config: NavConfig) -> Self {
        Self {
            config,
            pathfinder: AStarPathFinder::new(config.heuristic, config.max_search_distance)
                .with_max_expansions(config.max_expansions),
            walk_zone: None,
            static_obstacles: Vec::new(),
            dynamic_obstacles: Vec::new(),
            nodes: Vec::new(),
        }
    }

    pub fn config(&self) -> &NavConfig {
        &self.config
    }

    pub fn walk_zone(&self) -> Option<&Polygon> {
        self.walk_zone.as_ref()
    }

    pub fn static_obstacles(&self) -> &[Polygon] {
        &self.static_obstacles
    }

    pub fn dynamic_obstacle(&self, id: ObstacleId) -> Option<&Polygon> {
        self.dynamic_obstacles
            .iter()
            .find(|o| o.id == id)
            .map(|o| &o.polygon)
    }

    pub fn contains_obstacle(&self, id: ObstacleId) -> bool {
        self.dynamic_obstacle(id).is_some()
    }

    /// Dynamic obstacle ids in insertion order.
    pub fn dynamic_obstacle_ids(&self) -> impl Iterator<Item = ObstacleId> + '_ {
        self.dynamic_obstacles.iter().map(|o| o.id)
    }

    /// Static obstacles followed by dynamic ones in insertion order.
    pub fn obstacles(&self) -> impl Iterator<Item = &Polygon> + '_ {
        self.static_obstacles
            .iter()
            .chain(self.dynamic_obstacles.iter().map(|o| &o.polygon))
    }

    pub fn nodes(&self) -> &[NavNode] {
        &self.nodes
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.nodes.iter().map(|n| n.neighbors.len()).sum::<usize>() / 2
    }

    /// Drop the walk zone, all obstacles and all nodes.
    pub fn clear(&mut self) {
        self.walk_zone = None;
        self.static_obstacles.clear();
        self.dynamic_obstacles.clear();
        self.nodes.clear();
    }

    /// Rebuild the graph from scratch for a new walk zone.
    ///
    /// Dynamic obstacles from the previous zone are discarded.
    pub fn create_initial_graph(&mut self, walk_zone: Polygon, static_obstacles: Vec<Polygon>) {
        self.nodes.clear();
        self.dynamic_obstacles.clear();

        for i in 0..walk_zone.vertex_count() {
            if polygon::is_vertex_concave(&walk_zone, i) {
                self.nodes
                    .push(NavNode::new(walk_zone.vertex(i), NodeOrigin::WalkZone));
            }
        }

        for obstacle in &static_obstacles {
            for position in obstacle_node_positions(&walk_zone, obstacle) {
                self.nodes
                    .push(NavNode::new(position, NodeOrigin::StaticObstacle));
            }
        }

        self.walk_zone = Some(walk_zone);
        self.static_obstacles = static_obstacles;

        let n = self.nodes.len();
        for i in 0..n.saturating_sub(1) {
            for j in i + 1..n {
                if self.in_line_of_sight(self.nodes[i].position, self.nodes[j].position) {
                    self.link(i, j);
                }
            }
        }

        tracing::debug!(
            nodes = self.node_count(),
            edges = self.edge_count(),
            obstacles = self.static_obstacles.len(),
            "built navigation graph"
        );
    }

    /// Whether `a` and `b` see each other through the walk zone and past every obstacle.
    ///
    /// Always false while no walk zone is set.
    pub fn in_line_of_sight(&self, a: Vec2, b: Vec2) -> bool {
        let Some(walk_zone) = &self.walk_zone else {
            return false;
        };

        polygon::in_line_of_sight(a, b, walk_zone, PolygonRole::WalkZone)
            && self
                .obstacles()
                .all(|o| polygon::in_line_of_sight(a, b, o, PolygonRole::Obstacle))
    }

    /// Track a new dynamic obstacle and splice its corners into the graph.
    ///
    /// Returns `false` (and changes nothing) when `id` is already tracked or no walk zone is set.
    pub fn add_dynamic_obstacle(&mut self, id: ObstacleId, obstacle: Polygon) -> bool {
        let Some(walk_zone) = &self.walk_zone else {
            return false;
        };
        if self.contains_obstacle(id) {
            return false;
        }

        let positions = obstacle_node_positions(walk_zone, &obstacle);
        let pruned = if self.config.prune_blocked_edges {
            self.prune_edges_blocked_by(&obstacle)
        } else {
            0
        };
        self.dynamic_obstacles.push(DynamicObstacle {
            id,
            polygon: obstacle,
        });

        for position in positions {
            let index = self.nodes.len();
            self.nodes
                .push(NavNode::new(position, NodeOrigin::DynamicObstacle(id)));
            for j in 0..index {
                if self.in_line_of_sight(position, self.nodes[j].position) {
                    self.link(index, j);
                }
            }
        }

        tracing::debug!(
            obstacle = id.0,
            pruned,
            nodes = self.node_count(),
            edges = self.edge_count(),
            "added dynamic obstacle"
        );
        true
    }

    /// Forget a dynamic obstacle and every node that was created for it.
    ///
    /// Returns `false` when `id` is not tracked.
    pub fn remove_dynamic_obstacle(&mut self, id: ObstacleId) -> bool {
        let Some(index) = self.dynamic_obstacles.iter().position(|o| o.id == id) else {
            return false;
        };
        let removed = self.dynamic_obstacles.remove(index);

        let origin = NodeOrigin::DynamicObstacle(id);
        let mut remap = Vec::with_capacity(self.nodes.len());
        let mut next = 0;
        for node in &self.nodes {
            if node.origin == origin {
                remap.push(None);
            } else {
                remap.push(Some(next));
                next += 1;
            }
        }

        self.nodes.retain(|n| n.origin != origin);
        for node in &mut self.nodes {
            node.neighbors = node.neighbors.iter().filter_map(|&j| remap[j]).collect();
        }

        let restored = if self.config.prune_blocked_edges {
            self.restore_edges_around(&removed.polygon)
        } else {
            0
        };

        tracing::debug!(
            obstacle = id.0,
            restored,
            nodes = self.node_count(),
            edges = self.edge_count(),
            "removed dynamic obstacle"
        );
        true
    }

    /// Path from `source` to `target` written into `out`.
    ///
    /// Returns `None` (leaving `out` empty) when no path exists.
    pub fn find_path_into(
        &self,
        source: Vec2,
        target: Vec2,
        query: &mut PathQuery,
        out: &mut NavPath,
    ) -> Option<()> {
        out.points.clear();
        query.search.reset();

        let Some(walk_zone) = &self.walk_zone else {
            tracing::debug!("path requested without a walk zone");
            return None;
        };

        let source = clamp_into(walk_zone, source, "source")?;
        let mut target = clamp_into(walk_zone, target, "target")?;

        // Overlapping obstacles are not supported: only the first one holding the target counts.
        if let Some(obstacle) = self
            .obstacles()
            .find(|o| polygon::is_point_inside(o, target, false))
        {
            target = polygon::clamped_point(obstacle, target);
            if !polygon::is_point_inside(walk_zone, target, true) {
                if let Some(vertex) = obstacle
                    .vertices()
                    .iter()
                    .copied()
                    .find(|&v| polygon::is_point_inside(walk_zone, v, true))
                {
                    target = vertex;
                }
            }
            tracing::debug!(x = target.x, y = target.y, "target moved out of obstacle");
        }

        if self.in_line_of_sight(source, target) {
            tracing::debug!("direct path found");
            out.points.push(source);
            out.points.push(target);
            return Some(());
        }

        let PathQuery {
            search,
            chain,
            start_links,
            target_links,
        } = query;

        start_links.clear();
        target_links.clear();
        target_links.resize(self.nodes.len(), false);
        for (i, node) in self.nodes.iter().enumerate() {
            if self.in_line_of_sight(source, node.position) {
                start_links.push(i);
            }
            if self.in_line_of_sight(node.position, target) {
                target_links[i] = true;
            }
        }

        let view = SearchView {
            graph: self,
            source,
            target,
            start_links,
            target_links,
        };

        if self
            .pathfinder
            .find_path_into(&view, None, view.start(), view.goal(), search, chain)
            .is_none()
        {
            let stats = search.stats();
            tracing::debug!(
                expanded = stats.expanded,
                bound_reached = stats.bound_reached,
                "no path found"
            );
            return None;
        }

        out.points.extend(chain.iter().map(|&i| view.position(i)));
        Some(())
    }

    fn link(&mut self, a: usize, b: usize) {
        self.nodes[a].neighbors.insert(b);
        self.nodes[b].neighbors.insert(a);
    }

    fn unlink(&mut self, a: usize, b: usize) {
        self.nodes[a].neighbors.remove(&b);
        self.nodes[b].neighbors.remove(&a);
    }

    fn prune_edges_blocked_by(&mut self, obstacle: &Polygon) -> usize {
        let mut blocked = Vec::new();
        for (i, node) in self.nodes.iter().enumerate() {
            for &j in node.neighbors.range(i + 1..) {
                let other = self.nodes[j].position;
                if !polygon::in_line_of_sight(node.position, other, obstacle, PolygonRole::Obstacle)
                {
                    blocked.push((i, j));
                }
            }
        }

        for &(i, j) in &blocked {
            self.unlink(i, j);
        }
        blocked.len()
    }

    /// Reconnect node pairs whose segment passes the area a removed obstacle used to cover.
    fn restore_edges_around(&mut self, obstacle: &Polygon) -> usize {
        let (lo, hi) = obstacle.bounds();
        let mut restored = Vec::new();
        let n = self.nodes.len();
        for i in 0..n.saturating_sub(1) {
            for j in i + 1..n {
                if self.nodes[i].is_neighbor(j) {
                    continue;
                }
                let a = self.nodes[i].position;
                let b = self.nodes[j].position;
                if segment_overlaps_box(a, b, lo, hi) && self.in_line_of_sight(a, b) {
                    restored.push((i, j));
                }
            }
        }

        for &(i, j) in &restored {
            self.link(i, j);
        }
        restored.len()
    }
}

impl Navigator for PolygonalNavGraph {
    fn find_path(&self, start: Vec2, goal: Vec2) -> NavPath {
        let mut query = PathQuery::default();
        let mut out = NavPath::default();
        self.find_path_into(start, goal, &mut query, &mut out);
        out
    }

    fn nearest_point(&self, point: Vec2) -> Option<Vec2> {
        let walk_zone = self.walk_zone.as_ref()?;
        if polygon::is_point_inside(walk_zone, point, true) {
            return Some(point);
        }
        Some(polygon::clamped_point(walk_zone, point))
    }
}

/// Graph nodes plus the transient start (`len`) and target (`len + 1`) of one query.
struct SearchView<'a> {
    graph: &'a PolygonalNavGraph,
    source: Vec2,
    target: Vec2,
    start_links: &'a [usize],
    target_links: &'a [bool],
}

impl SearchView<'_> {
    fn start(&self) -> usize {
        self.graph.nodes.len()
    }

    fn goal(&self) -> usize {
        self.graph.nodes.len() + 1
    }
}

impl NavGraph for SearchView<'_> {
    type Mover = ();

    fn node_count(&self) -> usize {
        self.graph.nodes.len() + 2
    }

    fn position(&self, node: usize) -> Vec2 {
        if node == self.start() {
            self.source
        } else if node == self.goal() {
            self.target
        } else {
            self.graph.nodes[node].position
        }
    }

    fn neighbors(&self, node: usize, out: &mut Vec<usize>) {
        if node == self.start() {
            out.extend_from_slice(self.start_links);
        } else if node < self.start() {
            out.extend(self.graph.nodes[node].neighbors());
            if self.target_links[node] {
                out.push(self.goal());
            }
        }
    }

    fn blocked(&self, _ctx: &NavContext<'_, ()>, _node: usize) -> bool {
        false
    }

    fn cost(&self, ctx: &NavContext<'_, ()>, node: usize) -> f32 {
        match self.graph.config.edge_cost {
            EdgeCost::Uniform => 1.0,
            EdgeCost::Distance => self.position(ctx.source).distance(self.position(node)),
        }
    }
}

/// Outward (convex) corners of `obstacle` that lie strictly inside the walk zone.
fn obstacle_node_positions(walk_zone: &Polygon, obstacle: &Polygon) -> Vec<Vec2> {
    (0..obstacle.vertex_count())
        .filter(|&i| !polygon::is_vertex_concave(obstacle, i))
        .map(|i| obstacle.vertex(i))
        .filter(|&v| polygon::is_point_inside(walk_zone, v, false))
        .collect()
}

fn clamp_into(walk_zone: &Polygon, p: Vec2, label: &str) -> Option<Vec2> {
    if polygon::is_point_inside(walk_zone, p, true) {
        return Some(p);
    }

    tracing::debug!(point = label, x = p.x, y = p.y, "point outside walk zone, clamping");
    let clamped = polygon::clamped_point(walk_zone, p);
    if !polygon::is_point_inside(walk_zone, clamped, true) {
        tracing::debug!(point = label, "clamping failed");
        return None;
    }
    Some(clamped)
}

fn segment_overlaps_box(a: Vec2, b: Vec2, lo: Vec2, hi: Vec2) -> bool {
    let tol = polygon::EDGE_TOLERANCE;
    let seg_lo = a.min(b);
    let seg_hi = a.max(b);
    seg_lo.x <= hi.x + tol && seg_hi.x >= lo.x - tol && seg_lo.y <= hi.y + tol && seg_hi.y >= lo.y - tol
}
