//! YAML scene files.
//!
//! ```yaml
//! walk_zone: [[0, 0], [10, 0], [10, 10], [0, 10]]
//! obstacles:
//!   - points: [[4, 4], [6, 4], [6, 6], [4, 6]]
//!   - id: 7
//!     dynamic: true
//!     points: [[1, 7], [2, 7], [2, 8], [1, 8]]
//! nav:
//!   max_search_distance: 50
//! tile_map:
//!   config:
//!     tile_size: 1.0
//!   rows:
//!     - "..#."
//!     - "...."
//! ```

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::Deserialize;

use walk_nav::grid::BLOCKED;
use walk_nav::{NavConfig, ObstacleId, Polygon, PolygonalNavGraph, TileMap, TileMapConfig};

#[derive(Debug, Clone, Deserialize)]
pub struct SceneFile {
    pub walk_zone: Polygon,

    #[serde(default)]
    pub obstacles: Vec<ObstacleSpec>,

    #[serde(default)]
    pub nav: NavConfig,

    #[serde(default)]
    pub tile_map: Option<TileMapSpec>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ObstacleSpec {
    /// Required for dynamic obstacles.
    #[serde(default)]
    pub id: Option<u64>,

    /// Added after the initial build instead of being baked into it.
    #[serde(default)]
    pub dynamic: bool,

    pub points: Polygon,
}

/// Tile mask written as text rows, top row first: `#` is blocked, `.` is free.
#[derive(Debug, Clone, Deserialize)]
pub struct TileMapSpec {
    #[serde(default)]
    pub config: TileMapConfig,

    pub rows: Vec<String>,
}

impl SceneFile {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read scene from {}", path.display()))?;
        let scene: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse scene from {}", path.display()))?;
        Ok(scene)
    }

    /// Build the visibility graph, then add the dynamic obstacles in file order.
    pub fn build_graph(&self) -> Result<PolygonalNavGraph> {
        let mut graph = PolygonalNavGraph::new(self.nav).context("Invalid nav config")?;

        let static_obstacles = self
            .obstacles
            .iter()
            .filter(|o| !o.dynamic)
            .map(|o| o.points.clone())
            .collect();
        graph.create_initial_graph(self.walk_zone.clone(), static_obstacles);

        for (index, obstacle) in self.obstacles.iter().enumerate().filter(|(_, o)| o.dynamic) {
            let id = obstacle
                .id
                .with_context(|| format!("Dynamic obstacle #{index} has no id"))?;
            if !graph.add_dynamic_obstacle(ObstacleId(id), obstacle.points.clone()) {
                bail!("Duplicate dynamic obstacle id {id}");
            }
        }

        tracing::info!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Scene graph ready"
        );
        Ok(graph)
    }

    pub fn build_tile_map(&self) -> Result<TileMap> {
        self.tile_map
            .as_ref()
            .context("Scene has no tile_map section")?
            .build()
    }
}

impl TileMapSpec {
    pub fn build(&self) -> Result<TileMap> {
        let height = self.rows.len();
        let width = self.rows.first().map_or(0, |r| r.chars().count());

        let mut mask = Vec::with_capacity(width * height);
        for (row_index, row) in self.rows.iter().enumerate() {
            let len = row.chars().count();
            if len != width {
                bail!("tile_map row {row_index} has {len} tiles, expected {width}");
            }
            for c in row.chars() {
                mask.push(match c {
                    '.' => 0,
                    '#' => BLOCKED,
                    other => bail!("Unknown tile {other:?} in tile_map row {row_index}"),
                });
            }
        }

        let map = TileMap::from_mask(width as u32, height as u32, mask, self.config)
            .context("Invalid tile_map")?;
        Ok(map)
    }
}
