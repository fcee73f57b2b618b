//! Walk-zone navigation: polygon geometry, a visibility-graph pathfinder with dynamic
//! obstacles, a tile-mask alternative and the A* engine they share.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![forbid(unsafe_code)]

pub mod astar;
pub mod config;
pub mod error;
pub mod grid;
pub mod math;
pub mod navigator;
pub mod polygon;
pub mod polygonal;

pub use astar::{
    AStarPathFinder, AStarQuery, EuclideanDistance, Heuristic, ManhattanDistance, NavContext,
    NavGraph, SearchStats,
};
pub use config::{EdgeCost, HeuristicKind, NavConfig, TileMapConfig};
pub use error::{NavError, Result};
pub use grid::{Tile, TileMap, TileMover, TileQuery};
pub use math::Vec2;
pub use navigator::{NavPath, Navigator};
pub use polygon::{Polygon, PolygonRole};
pub use polygonal::{NavNode, NodeOrigin, ObstacleId, PathQuery, PolygonalNavGraph};
