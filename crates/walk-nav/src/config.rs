//! Tunables for the polygonal graph and the tile map.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{NavError, Result};

/// Cost charged for traversing one visibility-graph edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum EdgeCost {
    /// Every edge costs 1, so the search minimises the number of turns.
    #[default]
    Uniform,
    /// Euclidean edge length.
    Distance,
}

/// Heuristic used to order the open list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum HeuristicKind {
    #[default]
    Manhattan,
    Euclidean,
}

/// Polygonal navigation graph configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct NavConfig {
    /// Deepest search depth (edges from the source) before giving up.
    pub max_search_distance: usize,
    /// Maximum number of nodes finalized by a single search.
    pub max_expansions: usize,
    pub edge_cost: EdgeCost,
    pub heuristic: HeuristicKind,
    /// Drop edges blocked by a dynamic obstacle while it is present.
    pub prune_blocked_edges: bool,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            max_search_distance: 50,
            max_expansions: 4096,
            edge_cost: EdgeCost::Uniform,
            heuristic: HeuristicKind::Manhattan,
            prune_blocked_edges: true,
        }
    }
}

impl NavConfig {
    pub fn validate(&self) -> Result<()> {
        if self.max_search_distance == 0 {
            return Err(NavError::InvalidConfig(
                "max_search_distance must be > 0".to_string(),
            ));
        }
        if self.max_expansions == 0 {
            return Err(NavError::InvalidConfig(
                "max_expansions must be > 0".to_string(),
            ));
        }
        Ok(())
    }
}

/// Tile map configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TileMapConfig {
    /// World units per tile.
    pub tile_size: f32,
    pub allow_diagonal: bool,
    /// Search depth bound as a multiple of the start/goal distance in tiles.
    pub search_distance_factor: f32,
    /// Cost of a step that keeps the previous direction.
    pub straight_cost: f32,
    /// Cost of a step that changes direction.
    pub turn_cost: f32,
}

impl Default for TileMapConfig {
    fn default() -> Self {
        Self {
            tile_size: 1.0,
            allow_diagonal: false,
            search_distance_factor: 4.0,
            straight_cost: 1.0,
            turn_cost: 10.0,
        }
    }
}

impl TileMapConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.tile_size > 0.0) {
            return Err(NavError::InvalidConfig(format!(
                "tile_size must be > 0, got {}",
                self.tile_size
            )));
        }
        if !(self.search_distance_factor > 0.0) {
            return Err(NavError::InvalidConfig(format!(
                "search_distance_factor must be > 0, got {}",
                self.search_distance_factor
            )));
        }
        // The Manhattan heuristic stays admissible only while every step costs at least 1.
        if self.straight_cost < 1.0 || self.turn_cost < 1.0 {
            return Err(NavError::InvalidConfig(
                "step costs must be >= 1".to_string(),
            ));
        }
        Ok(())
    }
}
