//! walknav - walk-zone navigation queries.
//!
//! - `walknav path <scene> <sx> <sy> <tx> <ty>` - route through the scene's visibility graph
//! - `walknav graph <scene>` - dump graph nodes and edges
//! - `walknav tile <scene> <sx> <sy> <tx> <ty>` - route on the scene's tile map

mod scene;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::json;
use tracing_subscriber::{fmt, EnvFilter};

use walk_nav::{NavPath, Navigator, NodeOrigin, ObstacleId, PolygonalNavGraph, Vec2};

use crate::scene::SceneFile;

#[derive(Parser)]
#[command(name = "walknav")]
#[command(about = "Walk-zone navigation queries", version)]
struct Cli {
    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Find a path through the walk zone
    #[command(allow_negative_numbers = true)]
    Path {
        /// Scene YAML file
        scene: PathBuf,
        sx: f32,
        sy: f32,
        tx: f32,
        ty: f32,

        /// Remove a dynamic obstacle before querying (repeatable)
        #[arg(long = "remove", value_name = "ID")]
        remove: Vec<u64>,
    },

    /// Dump the visibility graph
    Graph {
        /// Scene YAML file
        scene: PathBuf,
    },

    /// Find a path on the scene's tile map
    #[command(allow_negative_numbers = true)]
    Tile {
        /// Scene YAML file
        scene: PathBuf,
        sx: f32,
        sy: f32,
        tx: f32,
        ty: f32,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Path {
            scene,
            sx,
            sy,
            tx,
            ty,
            remove,
        } => {
            let mut graph = SceneFile::load(&scene)?.build_graph()?;
            for id in remove {
                if !graph.remove_dynamic_obstacle(ObstacleId(id)) {
                    tracing::warn!(id, "No dynamic obstacle with this id");
                }
            }
            let path = graph.find_path(Vec2::new(sx, sy), Vec2::new(tx, ty));
            print_path(&path, cli.json)
        }
        Commands::Graph { scene } => {
            let graph = SceneFile::load(&scene)?.build_graph()?;
            print_graph(&graph, cli.json)
        }
        Commands::Tile {
            scene,
            sx,
            sy,
            tx,
            ty,
        } => {
            let map = SceneFile::load(&scene)?.build_tile_map()?;
            let path = map.find_path(Vec2::new(sx, sy), Vec2::new(tx, ty));
            print_path(&path, cli.json)
        }
    }
}

fn print_path(path: &NavPath, as_json: bool) -> Result<()> {
    if as_json {
        let out = serde_json::to_string_pretty(path).context("Failed to serialize path")?;
        println!("{out}");
        return Ok(());
    }

    if path.is_empty() {
        println!("No path");
        return Ok(());
    }

    for p in &path.points {
        println!("{} {}", p.x, p.y);
    }
    println!("# {} waypoints, length {:.3}", path.len(), path.length());
    Ok(())
}

fn origin_label(origin: NodeOrigin) -> String {
    match origin {
        NodeOrigin::WalkZone => "walk_zone".to_string(),
        NodeOrigin::StaticObstacle => "static".to_string(),
        NodeOrigin::DynamicObstacle(id) => format!("dynamic:{}", id.0),
    }
}

fn print_graph(graph: &PolygonalNavGraph, as_json: bool) -> Result<()> {
    if as_json {
        let nodes: Vec<_> = graph
            .nodes()
            .iter()
            .enumerate()
            .map(|(index, node)| {
                json!({
                    "index": index,
                    "position": node.position(),
                    "origin": origin_label(node.origin()),
                    "neighbors": node.neighbors().collect::<Vec<_>>(),
                })
            })
            .collect();
        let out = serde_json::to_string_pretty(&json!({
            "nodes": nodes,
            "edges": graph.edge_count(),
        }))
        .context("Failed to serialize graph")?;
        println!("{out}");
        return Ok(());
    }

    println!(
        "Graph: {} nodes, {} edges",
        graph.node_count(),
        graph.edge_count()
    );
    for (index, node) in graph.nodes().iter().enumerate() {
        let p = node.position();
        let neighbors: Vec<String> = node.neighbors().map(|n| n.to_string()).collect();
        println!(
            "  {index:>3} ({}, {}) {:<12} -> [{}]",
            p.x,
            p.y,
            origin_label(node.origin()),
            neighbors.join(", ")
        );
    }
    Ok(())
}
