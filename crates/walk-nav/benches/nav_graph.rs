use criterion::{black_box, criterion_group, criterion_main, Criterion};
use walk_nav::{
    NavPath, Navigator, ObstacleId, PathQuery, Polygon, PolygonalNavGraph, TileMap,
    TileMapConfig, TileQuery, Vec2,
};

/// Square room with a grid of pillars.
fn pillar_scene(columns: usize, rows: usize) -> (Polygon, Vec<Polygon>) {
    let spacing = 4.0;
    let size = spacing * (columns.max(rows) + 1) as f32;
    let zone = Polygon::rect(0.0, 0.0, size, size);

    let mut pillars = Vec::with_capacity(columns * rows);
    for y in 0..rows {
        for x in 0..columns {
            let cx = spacing * (x + 1) as f32;
            let cy = spacing * (y + 1) as f32;
            pillars.push(Polygon::rect(cx - 0.75, cy - 0.75, 1.5, 1.5));
        }
    }
    (zone, pillars)
}

fn bench_polygonal(c: &mut Criterion) {
    let (zone, pillars) = pillar_scene(6, 6);
    let mut graph = PolygonalNavGraph::default();
    graph.create_initial_graph(zone.clone(), pillars.clone());

    let start = Vec2::new(1.0, 1.0);
    let goal = Vec2::new(26.0, 26.0);

    let mut group = c.benchmark_group("walk-nav/polygonal");

    group.bench_function("create_initial_graph", |b| {
        b.iter(|| {
            let mut g = PolygonalNavGraph::default();
            g.create_initial_graph(zone.clone(), pillars.clone());
            black_box(g.edge_count());
        })
    });

    group.bench_function("find_path_alloc", |b| {
        b.iter(|| {
            let path = graph.find_path(start, goal);
            black_box(path.len());
        })
    });

    let mut query = PathQuery::default();
    let mut out = NavPath::default();
    group.bench_function("find_path_into_reuse", |b| {
        b.iter(|| {
            graph.find_path_into(start, goal, &mut query, &mut out);
            black_box(out.len());
        })
    });

    group.bench_function("dynamic_obstacle_add_remove", |b| {
        let mut g = graph.clone();
        let actor = Polygon::rect(13.0, 13.0, 1.0, 1.0);
        b.iter(|| {
            g.add_dynamic_obstacle(ObstacleId(1), actor.clone());
            g.remove_dynamic_obstacle(ObstacleId(1));
            black_box(g.node_count());
        })
    });

    group.finish();
}

fn bench_tile_map(c: &mut Criterion) {
    let mut map = TileMap::new(64, 64, TileMapConfig::default()).expect("valid map");
    for y in 0..60 {
        map.set_blocked(32, y, true);
    }

    let start = Vec2::new(2.5, 2.5);
    let goal = Vec2::new(60.5, 2.5);

    let mut group = c.benchmark_group("walk-nav/tile_map");

    let mut query = TileQuery::default();
    let mut out = NavPath::default();
    group.bench_function("find_path_into_reuse", |b| {
        b.iter(|| {
            map.find_path_into(None, start, goal, &mut query, &mut out);
            black_box(out.len());
        })
    });

    group.finish();
}

criterion_group!(benches, bench_polygonal, bench_tile_map);
criterion_main!(benches);
