use walk_nav::{
    EdgeCost, NavConfig, NavError, NavPath, Navigator, NodeOrigin, ObstacleId, PathQuery, Polygon,
    PolygonalNavGraph, Vec2,
};

fn v(x: f32, y: f32) -> Vec2 {
    Vec2::new(x, y)
}

fn assert_close(actual: Vec2, expected: Vec2) {
    assert!(
        actual.distance(expected) < 1e-4,
        "expected {expected:?}, got {actual:?}"
    );
}

fn square_zone() -> Polygon {
    Polygon::rect(0.0, 0.0, 10.0, 10.0)
}

fn centered_obstacle() -> Polygon {
    Polygon::rect(4.0, 4.0, 2.0, 2.0)
}

fn obstacle_scene(config: NavConfig) -> PolygonalNavGraph {
    let mut graph = PolygonalNavGraph::new(config).expect("valid config");
    graph.create_initial_graph(square_zone(), vec![centered_obstacle()]);
    graph
}

#[test]
fn convex_zone_without_obstacles_gives_direct_path() {
    let mut graph = PolygonalNavGraph::default();
    graph.create_initial_graph(square_zone(), Vec::new());

    assert_eq!(graph.node_count(), 0);
    let path = graph.find_path(v(1.0, 1.0), v(9.0, 9.0));
    assert_eq!(path.points, vec![v(1.0, 1.0), v(9.0, 9.0)]);
}

#[test]
fn obstacle_corners_become_nodes_linked_along_edges() {
    let graph = obstacle_scene(NavConfig::default());

    assert_eq!(graph.node_count(), 4);
    assert!(graph
        .nodes()
        .iter()
        .all(|n| n.origin() == NodeOrigin::StaticObstacle));
    // Sides of the square are clear, diagonals run through it.
    assert_eq!(graph.edge_count(), 4);
    assert!(graph.nodes()[0].is_neighbor(1));
    assert!(!graph.nodes()[0].is_neighbor(2));
}

#[test]
fn path_bends_around_obstacle_corner() {
    let graph = obstacle_scene(NavConfig::default());
    let path = graph.find_path(v(1.0, 1.0), v(9.0, 9.0));

    assert_eq!(path.points, vec![v(1.0, 1.0), v(6.0, 4.0), v(9.0, 9.0)]);
    assert!(path.length() > v(1.0, 1.0).distance(v(9.0, 9.0)));
}

#[test]
fn clockwise_input_builds_the_same_graph_shape() {
    let mut graph = PolygonalNavGraph::default();
    graph.create_initial_graph(square_zone().reversed(), vec![centered_obstacle().reversed()]);

    assert_eq!(graph.node_count(), 4);
    assert_eq!(graph.edge_count(), 4);

    let path = graph.find_path(v(1.0, 1.0), v(9.0, 9.0));
    assert_eq!(path.len(), 3);
    assert!(path.points[1] == v(6.0, 4.0) || path.points[1] == v(4.0, 6.0));
}

#[test]
fn reflex_corner_of_walk_zone_is_used() {
    let zone =
        Polygon::from_coords(&[0.0, 0.0, 10.0, 0.0, 10.0, 10.0, 5.0, 10.0, 5.0, 5.0, 0.0, 5.0])
            .expect("valid polygon");
    let mut graph = PolygonalNavGraph::default();
    graph.create_initial_graph(zone, Vec::new());

    assert_eq!(graph.node_count(), 1);
    assert_eq!(graph.nodes()[0].origin(), NodeOrigin::WalkZone);

    let path = graph.find_path(v(1.0, 1.0), v(8.0, 9.0));
    assert_eq!(path.points, vec![v(1.0, 1.0), v(5.0, 5.0), v(8.0, 9.0)]);
}

#[test]
fn target_inside_obstacle_is_moved_to_its_boundary() {
    let graph = obstacle_scene(NavConfig::default());
    let path = graph.find_path(v(1.0, 1.0), v(5.0, 5.0));

    assert_eq!(path.points, vec![v(1.0, 1.0), v(5.0, 4.0)]);
}

#[test]
fn target_falls_back_to_obstacle_vertex_inside_walk_zone() {
    // The obstacle pokes through the triangle's hypotenuse, so the nearest point on its
    // boundary lies outside the walk zone.
    let zone = Polygon::from_coords(&[0.0, 0.0, 10.0, 0.0, 0.0, 10.0]).expect("triangle");
    let mut graph = PolygonalNavGraph::default();
    graph.create_initial_graph(zone, vec![Polygon::rect(2.0, 4.0, 10.0, 1.5)]);

    let path = graph.find_path(v(1.0, 1.0), v(6.0, 6.0));
    assert_eq!(path.points, vec![v(1.0, 1.0), v(2.0, 4.0)]);
}

#[test]
fn points_outside_walk_zone_are_clamped() {
    let graph = obstacle_scene(NavConfig::default());

    let path = graph.find_path(v(1.0, 1.0), v(15.0, 5.0));
    assert_eq!(path.points, vec![v(1.0, 1.0), v(10.0, 5.0)]);

    let path = graph.find_path(v(-5.0, 1.0), v(3.0, 1.0));
    assert_eq!(path.len(), 2);
    assert_close(path.points[0], v(0.0, 1.0));
    assert_close(path.points[1], v(3.0, 1.0));
}

#[test]
fn nearest_point_projects_into_walk_zone() {
    let graph = obstacle_scene(NavConfig::default());
    let nav: &dyn Navigator = &graph;

    assert_eq!(nav.nearest_point(v(15.0, 5.0)), Some(v(10.0, 5.0)));
    assert_eq!(nav.nearest_point(v(2.0, 3.0)), Some(v(2.0, 3.0)));
    assert_eq!(PolygonalNavGraph::default().nearest_point(v(1.0, 1.0)), None);
}

#[test]
fn missing_walk_zone_yields_empty_path() {
    let graph = PolygonalNavGraph::default();
    assert!(graph.find_path(v(1.0, 1.0), v(2.0, 2.0)).is_empty());
    assert!(!graph.in_line_of_sight(v(1.0, 1.0), v(2.0, 2.0)));
}

#[test]
fn clear_drops_everything() {
    let mut graph = obstacle_scene(NavConfig::default());
    assert!(graph.add_dynamic_obstacle(ObstacleId(1), Polygon::rect(1.0, 6.0, 1.0, 1.0)));

    graph.clear();
    assert!(graph.walk_zone().is_none());
    assert_eq!(graph.node_count(), 0);
    assert!(!graph.contains_obstacle(ObstacleId(1)));
    assert!(graph.find_path(v(1.0, 1.0), v(9.0, 9.0)).is_empty());
}

#[test]
fn tight_search_bound_gives_empty_path() {
    let config = NavConfig {
        max_search_distance: 1,
        ..NavConfig::default()
    };
    let graph = obstacle_scene(config);
    let mut query = PathQuery::default();
    let mut out = NavPath::default();

    assert!(graph
        .find_path_into(v(1.0, 1.0), v(9.0, 9.0), &mut query, &mut out)
        .is_none());
    assert!(out.is_empty());
    assert!(query.search_stats().bound_reached);
}

#[test]
fn distance_cost_still_finds_shortest_detour() {
    let config = NavConfig {
        edge_cost: EdgeCost::Distance,
        ..NavConfig::default()
    };
    let graph = obstacle_scene(config);
    let path = graph.find_path(v(1.0, 1.0), v(9.0, 9.0));

    assert_eq!(path.points, vec![v(1.0, 1.0), v(6.0, 4.0), v(9.0, 9.0)]);
}

#[test]
fn query_stats_reflect_last_call() {
    let graph = obstacle_scene(NavConfig::default());
    let mut query = PathQuery::default();
    let mut out = NavPath::default();

    graph.find_path_into(v(1.0, 1.0), v(9.0, 9.0), &mut query, &mut out);
    assert!(query.search_stats().expanded > 0);

    graph.find_path_into(v(1.0, 1.0), v(3.0, 1.0), &mut query, &mut out);
    assert_eq!(out.len(), 2);
    assert_eq!(query.search_stats().expanded, 0);
}

#[test]
fn invalid_config_is_rejected() {
    let config = NavConfig {
        max_expansions: 0,
        ..NavConfig::default()
    };
    assert!(matches!(
        PolygonalNavGraph::new(config),
        Err(NavError::InvalidConfig(_))
    ));
}

#[test]
fn dynamic_obstacle_add_and_remove() {
    let mut graph = PolygonalNavGraph::default();
    graph.create_initial_graph(square_zone(), Vec::new());
    let id = ObstacleId(7);

    assert!(graph.add_dynamic_obstacle(id, centered_obstacle()));
    assert!(!graph.add_dynamic_obstacle(id, centered_obstacle()));
    assert!(graph.contains_obstacle(id));
    assert_eq!(graph.node_count(), 4);
    assert!(graph
        .nodes()
        .iter()
        .all(|n| n.origin() == NodeOrigin::DynamicObstacle(id)));

    let path = graph.find_path(v(1.0, 1.0), v(9.0, 9.0));
    assert_eq!(path.points, vec![v(1.0, 1.0), v(6.0, 4.0), v(9.0, 9.0)]);

    assert!(graph.remove_dynamic_obstacle(id));
    assert!(!graph.remove_dynamic_obstacle(id));
    assert_eq!(graph.node_count(), 0);

    let path = graph.find_path(v(1.0, 1.0), v(9.0, 9.0));
    assert_eq!(path.points, vec![v(1.0, 1.0), v(9.0, 9.0)]);
}

#[test]
fn dynamic_obstacle_needs_a_walk_zone() {
    let mut graph = PolygonalNavGraph::default();
    assert!(!graph.add_dynamic_obstacle(ObstacleId(1), centered_obstacle()));
    assert!(!graph.contains_obstacle(ObstacleId(1)));
}

#[test]
fn target_inside_dynamic_obstacle_is_moved_out() {
    let mut graph = PolygonalNavGraph::default();
    graph.create_initial_graph(square_zone(), Vec::new());
    graph.add_dynamic_obstacle(ObstacleId(3), centered_obstacle());

    let path = graph.find_path(v(1.0, 1.0), v(5.0, 5.0));
    assert_eq!(path.points, vec![v(1.0, 1.0), v(5.0, 4.0)]);
}

fn two_pillar_scene(prune: bool) -> PolygonalNavGraph {
    let config = NavConfig {
        prune_blocked_edges: prune,
        ..NavConfig::default()
    };
    let mut graph = PolygonalNavGraph::new(config).expect("valid config");
    graph.create_initial_graph(
        Polygon::rect(0.0, 0.0, 20.0, 20.0),
        vec![
            Polygon::rect(2.0, 8.0, 2.0, 2.0),
            Polygon::rect(16.0, 8.0, 2.0, 2.0),
        ],
    );
    graph
}

#[test]
fn dynamic_obstacle_prunes_and_restores_blocked_edges() {
    let mut graph = two_pillar_scene(true);
    // (4, 8) and (16, 8) see each other along y = 8.
    assert!(graph.nodes()[1].is_neighbor(4));

    let id = ObstacleId(11);
    assert!(graph.add_dynamic_obstacle(id, Polygon::rect(9.0, 7.0, 2.0, 2.0)));
    assert!(!graph.nodes()[1].is_neighbor(4));
    assert!(graph.nodes()[2].is_neighbor(7));

    assert!(graph.remove_dynamic_obstacle(id));
    assert!(graph.nodes()[1].is_neighbor(4));
}

#[test]
fn edges_are_kept_when_pruning_is_disabled() {
    let mut graph = two_pillar_scene(false);
    assert!(graph.add_dynamic_obstacle(ObstacleId(11), Polygon::rect(9.0, 7.0, 2.0, 2.0)));
    assert!(graph.nodes()[1].is_neighbor(4));
}

#[test]
fn add_then_remove_restores_identical_graph() {
    for prune in [true, false] {
        let mut graph = two_pillar_scene(prune);
        let before = graph.nodes().to_vec();
        let queries = [
            (v(1.0, 9.0), v(19.0, 9.0)),
            (v(3.0, 1.0), v(17.0, 19.0)),
            (v(10.0, 1.0), v(10.0, 19.0)),
        ];
        let paths_before: Vec<_> = queries
            .iter()
            .map(|&(a, b)| graph.find_path(a, b))
            .collect();

        assert!(graph.add_dynamic_obstacle(ObstacleId(5), Polygon::rect(8.0, 6.0, 4.0, 6.0)));
        assert!(graph.add_dynamic_obstacle(ObstacleId(6), Polygon::rect(12.0, 2.0, 1.0, 1.0)));
        assert!(graph.remove_dynamic_obstacle(ObstacleId(5)));
        assert!(graph.remove_dynamic_obstacle(ObstacleId(6)));

        assert_eq!(graph.nodes(), before.as_slice(), "prune = {prune}");
        let paths_after: Vec<_> = queries
            .iter()
            .map(|&(a, b)| graph.find_path(a, b))
            .collect();
        assert_eq!(paths_before, paths_after, "prune = {prune}");
    }
}

#[test]
fn removing_one_obstacle_keeps_the_others_nodes() {
    let mut graph = two_pillar_scene(true);
    graph.add_dynamic_obstacle(ObstacleId(1), Polygon::rect(8.0, 14.0, 2.0, 2.0));
    graph.add_dynamic_obstacle(ObstacleId(2), Polygon::rect(8.0, 2.0, 2.0, 2.0));
    assert_eq!(graph.node_count(), 16);

    assert!(graph.remove_dynamic_obstacle(ObstacleId(1)));
    assert_eq!(graph.node_count(), 12);
    assert_eq!(
        graph.dynamic_obstacle_ids().collect::<Vec<_>>(),
        vec![ObstacleId(2)]
    );
    assert_eq!(
        graph
            .nodes()
            .iter()
            .filter(|n| n.origin() == NodeOrigin::DynamicObstacle(ObstacleId(2)))
            .count(),
        4
    );
    // Every neighbor index still points at a live node.
    let n = graph.node_count();
    assert!(graph.nodes().iter().all(|node| node.neighbors().all(|j| j < n)));
}
