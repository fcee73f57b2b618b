use crate::astar::{AStarPathFinder, AStarQuery, ManhattanDistance, NavContext, NavGraph};
use crate::{NavError, NavPath, Navigator, Result, TileMapConfig, Vec2};

/// Mask value of an impassable tile.
pub const BLOCKED: u8 = 255;

/// Per-mover blocking on top of the shared mask (e.g. tiles reserved by other actors).
pub trait TileMover {
    fn is_blocked(&self, x: i32, y: i32) -> bool;
}

impl<F: Fn(i32, i32) -> bool> TileMover for F {
    fn is_blocked(&self, x: i32, y: i32) -> bool {
        self(x, y)
    }
}

/// Tile coordinates; `y` grows upward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    fn as_vec2(self) -> Vec2 {
        Vec2::new(self.x as f32, self.y as f32)
    }
}

/// Reusable scratch buffers for [`TileMap::find_path_into`].
#[derive(Debug, Default)]
pub struct TileQuery {
    search: AStarQuery,
    chain: Vec<usize>,
}

impl TileQuery {
    pub fn search_stats(&self) -> crate::SearchStats {
        self.search.stats()
    }
}

/// Byte mask walkability map, one byte per tile.
///
/// The mask is stored in image order (first row is the top of the map).
#[derive(Debug, Clone)]
pub struct TileMap {
    width: i32,
    height: i32,
    config: TileMapConfig,
    mask: Vec<u8>,
}

impl TileMap {
    /// Fully walkable map.
    pub fn new(width: u32, height: u32, config: TileMapConfig) -> Result<Self> {
        let len = Self::checked_len(width, height)?;
        Self::from_mask(width, height, vec![0; len], config)
    }

    pub fn from_mask(width: u32, height: u32, mask: Vec<u8>, config: TileMapConfig) -> Result<Self> {
        let expected = Self::checked_len(width, height)?;
        if mask.len() != expected {
            return Err(NavError::MaskSizeMismatch {
                expected,
                actual: mask.len(),
            });
        }
        config.validate()?;

        Ok(Self {
            width: width as i32,
            height: height as i32,
            config,
            mask,
        })
    }

    /// Tile count, provided every node index fits in an `i32`.
    fn checked_len(width: u32, height: u32) -> Result<usize> {
        if width == 0 || height == 0 {
            return Err(NavError::EmptyTileMap { width, height });
        }
        let len = u64::from(width) * u64::from(height);
        if len > i32::MAX as u64 {
            return Err(NavError::TileMapTooLarge { width, height });
        }
        Ok(len as usize)
    }

    pub fn width(&self) -> u32 {
        self.width as u32
    }

    pub fn height(&self) -> u32 {
        self.height as u32
    }

    pub fn config(&self) -> &TileMapConfig {
        &self.config
    }

    pub fn tile_size(&self) -> f32 {
        self.config.tile_size
    }

    /// Raw mask in image order.
    pub fn mask(&self) -> &[u8] {
        &self.mask
    }

    pub fn in_bounds(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && x < self.width && y < self.height
    }

    fn mask_index(&self, x: i32, y: i32) -> Option<usize> {
        if !self.in_bounds(x, y) {
            return None;
        }
        let row = self.height - 1 - y;
        Some((row * self.width + x) as usize)
    }

    pub fn value(&self, x: i32, y: i32) -> Option<u8> {
        self.mask_index(x, y).map(|i| self.mask[i])
    }

    pub fn set_value(&mut self, x: i32, y: i32, value: u8) {
        if let Some(i) = self.mask_index(x, y) {
            self.mask[i] = value;
        }
    }

    pub fn set_blocked(&mut self, x: i32, y: i32, blocked: bool) {
        self.set_value(x, y, if blocked { BLOCKED } else { 0 });
    }

    /// Mask-only check; out-of-bounds tiles are blocked.
    pub fn is_blocked(&self, x: i32, y: i32) -> bool {
        self.value(x, y).map_or(true, |v| v == BLOCKED)
    }

    /// Out of bounds, masked, or rejected by `mover`.
    pub fn blocked(&self, mover: Option<&dyn TileMover>, x: i32, y: i32) -> bool {
        if mover.is_some_and(|m| m.is_blocked(x, y)) {
            return true;
        }
        self.is_blocked(x, y)
    }

    /// Whether a straight walk between two points (in tile units) stays on free tiles.
    ///
    /// The line is sampled once per tile along its dominant axis; both end tiles are checked.
    pub fn can_walk_straight(&self, mover: Option<&dyn TileMover>, p0: Vec2, pf: Vec2) -> bool {
        let free = |p: Vec2| {
            let tile = p.floor();
            !self.blocked(mover, tile.x as i32, tile.y as i32)
        };

        if !free(p0) || !free(pf) {
            return false;
        }

        let d = pf - p0;
        if d.x.abs() > d.y.abs() {
            let (a, b) = if p0.x <= pf.x { (p0, pf) } else { (pf, p0) };
            let slope = (b.y - a.y) / (b.x - a.x);
            let mut x = a.x;
            while x < b.x {
                if !free(Vec2::new(x, a.y + (x - a.x) * slope)) {
                    return false;
                }
                x += 1.0;
            }
        } else if d.y != 0.0 {
            let (a, b) = if p0.y <= pf.y { (p0, pf) } else { (pf, p0) };
            // Run over rise, so vertical lines never divide by zero.
            let inv_slope = (b.x - a.x) / (b.y - a.y);
            let mut y = a.y;
            while y < b.y {
                if !free(Vec2::new(a.x + (y - a.y) * inv_slope, y)) {
                    return false;
                }
                y += 1.0;
            }
        }
        true
    }

    /// Move `tile` to the nearest free tile found on growing rings around it.
    ///
    /// Each ring tries the axis offsets before the diagonals. Returns `false` (leaving `tile`
    /// untouched) when the whole map is blocked.
    pub fn find_closest_target(&self, mover: Option<&dyn TileMover>, tile: &mut Tile) -> bool {
        const OFFSETS: [(i32, i32); 8] = [
            (1, 0),
            (-1, 0),
            (0, -1),
            (0, 1),
            (1, 1),
            (-1, 1),
            (1, -1),
            (-1, -1),
        ];

        let reach = self.width.max(self.height);
        for i in 1..=reach {
            for (dx, dy) in OFFSETS {
                let x = tile.x + dx * i;
                let y = tile.y + dy * i;
                if self.in_bounds(x, y) && !self.blocked(mover, x, y) {
                    tracing::debug!(from_x = tile.x, from_y = tile.y, x, y, "moved blocked target");
                    *tile = Tile::new(x, y);
                    return true;
                }
            }
        }
        false
    }

    fn node(&self, tile: Tile) -> usize {
        (tile.y * self.width + tile.x) as usize
    }

    fn tile(&self, node: usize) -> Tile {
        let node = node as i32;
        Tile::new(node % self.width, node / self.width)
    }

    /// Tile containing world point `p`, clamped into the map.
    pub fn tile_at(&self, p: Vec2) -> Tile {
        let scaled = (p / self.config.tile_size).floor();
        Tile::new(
            (scaled.x as i32).clamp(0, self.width - 1),
            (scaled.y as i32).clamp(0, self.height - 1),
        )
    }

    fn tile_origin(&self, tile: Tile) -> Vec2 {
        tile.as_vec2() * self.config.tile_size
    }

    pub fn find_path_with_mover(
        &self,
        mover: Option<&dyn TileMover>,
        p0: Vec2,
        pf: Vec2,
    ) -> NavPath {
        let mut query = TileQuery::default();
        let mut out = NavPath::default();
        self.find_path_into(mover, p0, pf, &mut query, &mut out);
        out
    }

    /// Waypoints in world units from `p0` to `pf`, written into `out`.
    ///
    /// The first waypoint is `p0` itself. The last keeps the target's offset inside its tile
    /// unless the target tile was blocked and had to be moved. Intermediate waypoints are the
    /// tiles where the route turns.
    pub fn find_path_into(
        &self,
        mover: Option<&dyn TileMover>,
        p0: Vec2,
        pf: Vec2,
        query: &mut TileQuery,
        out: &mut NavPath,
    ) -> Option<()> {
        out.points.clear();
        query.search.reset();

        let start = self.tile_at(p0);
        let mut goal = self.tile_at(pf);
        let scaled_goal = (pf / self.config.tile_size).floor();
        let mut offset = if scaled_goal == goal.as_vec2() {
            pf - self.tile_origin(goal)
        } else {
            Vec2::ZERO
        };

        if self.blocked(mover, goal.x, goal.y) {
            if !self.find_closest_target(mover, &mut goal) {
                tracing::debug!("no free tile to walk to");
                return None;
            }
            offset = Vec2::ZERO;
        }

        let waypoint = |tile: Tile| self.tile_origin(tile) + offset;

        if self.can_walk_straight(mover, start.as_vec2(), goal.as_vec2()) {
            tracing::debug!("straight path found");
            out.points.push(p0);
            out.points.push(waypoint(goal));
            return Some(());
        }

        let distance = start.as_vec2().distance(goal.as_vec2());
        let bound = ((distance * self.config.search_distance_factor) as usize).max(1);
        let pathfinder = AStarPathFinder::new(ManhattanDistance, bound);

        let graph = TileSearch { map: self, mover };
        let TileQuery { search, chain } = query;
        if pathfinder
            .find_path_into(&graph, None, self.node(start), self.node(goal), search, chain)
            .is_none()
        {
            let stats = search.stats();
            tracing::debug!(
                expanded = stats.expanded,
                bound,
                bound_reached = stats.bound_reached,
                "no tile path found"
            );
            return None;
        }

        out.points.push(p0);
        for w in chain.windows(3) {
            let (a, b, c) = (self.tile(w[0]), self.tile(w[1]), self.tile(w[2]));
            if (b.x - a.x, b.y - a.y) != (c.x - b.x, c.y - b.y) {
                out.points.push(waypoint(b));
            }
        }
        out.points.push(waypoint(goal));
        tracing::debug!(waypoints = out.points.len(), "tile path found");
        Some(())
    }
}

/// Tiles as graph nodes, indexed `y * width + x`. Blocking here is mask-only.
impl NavGraph for TileMap {
    type Mover = ();

    fn node_count(&self) -> usize {
        (self.width * self.height) as usize
    }

    fn position(&self, node: usize) -> Vec2 {
        self.tile(node).as_vec2()
    }

    fn neighbors(&self, node: usize, out: &mut Vec<usize>) {
        let tile = self.tile(node);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if dx != 0 && dy != 0 && !self.config.allow_diagonal {
                    continue;
                }
                let next = Tile::new(tile.x + dx, tile.y + dy);
                if self.in_bounds(next.x, next.y) {
                    out.push(self.node(next));
                }
            }
        }
    }

    fn blocked(&self, _ctx: &NavContext<'_, Self::Mover>, node: usize) -> bool {
        let tile = self.tile(node);
        self.is_blocked(tile.x, tile.y)
    }

    fn cost(&self, ctx: &NavContext<'_, Self::Mover>, node: usize) -> f32 {
        let from = self.tile(ctx.source);
        let to = self.tile(node);
        let step = (to.x - from.x, to.y - from.y);
        let heading = ctx.parent.map(|p| {
            let prev = self.tile(p);
            (from.x - prev.x, from.y - prev.y)
        });

        if heading == Some(step) {
            self.config.straight_cost
        } else {
            self.config.turn_cost
        }
    }
}

/// The map as seen by one mover for the length of a search.
struct TileSearch<'a> {
    map: &'a TileMap,
    mover: Option<&'a dyn TileMover>,
}

impl NavGraph for TileSearch<'_> {
    type Mover = ();

    fn node_count(&self) -> usize {
        self.map.node_count()
    }

    fn position(&self, node: usize) -> Vec2 {
        self.map.position(node)
    }

    fn neighbors(&self, node: usize, out: &mut Vec<usize>) {
        self.map.neighbors(node, out);
    }

    fn blocked(&self, _ctx: &NavContext<'_, Self::Mover>, node: usize) -> bool {
        let tile = self.map.tile(node);
        self.map.blocked(self.mover, tile.x, tile.y)
    }

    fn cost(&self, ctx: &NavContext<'_, Self::Mover>, node: usize) -> f32 {
        self.map.cost(ctx, node)
    }
}

impl Navigator for TileMap {
    fn find_path(&self, start: Vec2, goal: Vec2) -> NavPath {
        self.find_path_with_mover(None, start, goal)
    }

    fn nearest_point(&self, point: Vec2) -> Option<Vec2> {
        let mut tile = self.tile_at(point);
        let scaled = (point / self.config.tile_size).floor();
        if !self.is_blocked(tile.x, tile.y) {
            if scaled == tile.as_vec2() {
                return Some(point);
            }
        } else if !self.find_closest_target(None, &mut tile) {
            return None;
        }
        Some(self.tile_origin(tile) + Vec2::new(0.5, 0.5) * self.config.tile_size)
    }
}
