use std::collections::BTreeSet;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use super::*;

fn config(radius: f32) -> NavConfig {
    NavConfig {
        agent_radius: radius,
        ..NavConfig::default()
    }
}

fn node_at(mesh: &Navmesh, x: f32, y: f32) -> NodeId {
    mesh.nearest_node(Point::new(x, y))
        .filter(|n| (n.position - Point::new(x, y)).norm() < 1e-3)
        .map(|n| n.id)
        .unwrap_or_else(|| panic!("no node at ({x}, {y})"))
}

fn count(mesh: &Navmesh, kind: EdgeKind) -> usize {
    mesh.edges().filter(|e| e.kind == kind).count()
}

/// A random row of floor-standing obstacles with gaps and height differences.
fn random_scene(rng: &mut ChaCha8Rng) -> Vec<Obstacle> {
    let floor = 800.0;
    let mut x = 0.0;
    (0..rng.gen_range(3..7u64))
        .map(|id| {
            let width = rng.gen_range(80.0..260.0);
            let height = rng.gen_range(40.0..300.0);
            let o = Obstacle::new(id + 1, x, floor - height, width, height);
            x += width + rng.gen_range(20.0..180.0);
            o
        })
        .collect()
}

#[test]
fn two_platforms_are_bridged_by_one_jump_each_way() {
    let a = Obstacle::new(1, 0.0, 100.0, 200.0, 20.0);
    let b = Obstacle::new(2, 300.0, 100.0, 200.0, 20.0);
    let cfg = NavConfig {
        agent_radius: 25.0,
        max_jump_distance: 200.0,
        ..NavConfig::default()
    };
    let (mesh, stats) = build_navmesh_with_stats(&[a, b], &cfg);

    let a_left = node_at(&mesh, 25.0, 75.0);
    let a_right = node_at(&mesh, 175.0, 75.0);
    let b_left = node_at(&mesh, 325.0, 75.0);
    let b_right = node_at(&mesh, 475.0, 75.0);
    assert_eq!(mesh.node(a_left).unwrap().kind, NodeKind::PlatformLeft);
    assert_eq!(mesh.node(b_right).unwrap().kind, NodeKind::PlatformRight);

    assert_eq!(count(&mesh, EdgeKind::Step), 0);
    assert_eq!(count(&mesh, EdgeKind::Drop), 0);
    assert_eq!(stats.landing_nodes, 0);

    let jump = mesh.edge_between(a_right, b_left).unwrap();
    assert_eq!(jump.kind, EdgeKind::Jump);
    assert!((jump.cost - 225.0).abs() < 1e-3);
    assert!(mesh.edge_between(b_left, a_right).is_some());
    assert_eq!(stats.jumps, 2);

    // Platforms and undersides are four separate components.
    assert_eq!(mesh.component_count(), 4);
    assert_ne!(mesh.component_of(a_right), mesh.component_of(b_left));
}

#[test]
fn lone_obstacle_path_costs_the_segment_length() {
    let a = Obstacle::new(1, 0.0, 100.0, 200.0, 20.0);
    let mesh = build_navmesh(&[a], &config(25.0));
    let left = node_at(&mesh, 25.0, 75.0);
    let right = node_at(&mesh, 175.0, 75.0);
    let walk = mesh.edge_between(left, right).unwrap();
    assert_eq!(walk.kind, EdgeKind::Walk);
    assert_eq!(walk.cost, 150.0);
}

#[test]
fn empty_snapshot_builds_an_empty_mesh() {
    let mesh = build_navmesh(&[], &NavConfig::default());
    assert!(mesh.is_empty());
    assert_eq!(mesh.edge_count(), 0);
    assert_eq!(mesh.component_count(), 0);
}

#[test]
fn adjacent_ledges_are_joined_by_step_and_drop() {
    // B is slightly lower and close: step. C is far below B: drop only.
    let a = Obstacle::new(1, 0.0, 100.0, 200.0, 20.0);
    let b = Obstacle::new(2, 220.0, 110.0, 200.0, 20.0);
    let c = Obstacle::new(3, 440.0, 300.0, 200.0, 20.0);
    let mesh = build_navmesh(&[a, b, c], &config(10.0));

    let a_right = node_at(&mesh, 190.0, 90.0);
    let b_left = node_at(&mesh, 230.0, 100.0);
    let b_right = node_at(&mesh, 410.0, 100.0);
    let c_left = node_at(&mesh, 450.0, 290.0);

    assert_eq!(mesh.edge_between(a_right, b_left).unwrap().kind, EdgeKind::Step);
    assert_eq!(mesh.edge_between(b_left, a_right).unwrap().kind, EdgeKind::Step);
    assert_eq!(mesh.edge_between(b_right, c_left).unwrap().kind, EdgeKind::Drop);
    assert!(mesh.edge_between(c_left, b_right).is_none());
    assert_eq!(mesh.component_of(a_right), mesh.component_of(c_left));
}

#[test]
fn hang_under_floating_block_lands_mid_floor() {
    let floor = Obstacle::new(1, 0.0, 500.0, 600.0, 20.0);
    let block = Obstacle::new(2, 200.0, 200.0, 100.0, 20.0);
    let (mesh, stats) = build_navmesh_with_stats(&[floor, block], &config(20.0));

    assert_eq!(stats.landing_nodes, 2);
    let landings: Vec<_> = mesh
        .nodes()
        .filter(|n| n.kind == NodeKind::Landing)
        .map(|n| (n.position.x, n.position.y, n.owner))
        .collect();
    assert_eq!(landings, vec![(220.0, 480.0, 1), (280.0, 480.0, 1)]);

    let hang = node_at(&mesh, 220.0, 240.0);
    let landing = node_at(&mesh, 220.0, 480.0);
    let drop = mesh.edge_between(hang, landing).unwrap();
    assert_eq!(drop.kind, EdgeKind::Drop);
    // The drop joins the underside into the floor's component.
    assert_eq!(mesh.component_of(hang), mesh.component_of(landing));
}

#[test]
fn locomotion_edges_partition_the_finished_graph() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    for _ in 0..20 {
        let mesh = build_navmesh(&random_scene(&mut rng), &config(20.0));
        let kinds = locomotion_edges();

        assert!(mesh.nodes().all(|n| n.component.is_some()));
        for e in mesh.edges().filter(|e| kinds.has(e.kind)) {
            assert_eq!(mesh.component_of(e.from), mesh.component_of(e.to), "{e:?}");
        }
    }
}

#[test]
fn jumps_only_bridge_components_labeled_before_them() {
    let mut rng = ChaCha8Rng::seed_from_u64(9);
    for _ in 0..20 {
        let scene = random_scene(&mut rng);
        let cfg = config(20.0);
        let mut mesh = Navmesh::new();
        add_surface_nodes(&mut mesh, &scene, &cfg);
        transitions::add_step_edges(&mut mesh, &cfg);
        transitions::add_drop_edges(&mut mesh, &cfg);
        transitions::add_hang_transitions(&mut mesh, &cfg);
        transitions::add_attach_edges(&mut mesh, &cfg);
        components::label_components(&mut mesh);
        landing::synthesize_landings(&mut mesh, &scene, &cfg);

        let before = mesh.edge_count();
        jumps::add_jump_edges(&mut mesh, &scene, &cfg);
        for e in mesh.edges().skip(before) {
            assert_eq!(e.kind, EdgeKind::Jump);
            assert_ne!(mesh.component_of(e.from), mesh.component_of(e.to), "{e:?}");
        }
    }
}

#[test]
fn symmetric_kinds_come_in_pairs() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    for _ in 0..20 {
        let mesh = build_navmesh(&random_scene(&mut rng), &config(15.0));
        for e in mesh.edges().filter(|e| e.kind.is_bidirectional()) {
            let back = mesh
                .neighbors(e.to)
                .find(|r| r.to == e.from && r.kind == e.kind)
                .unwrap_or_else(|| panic!("no reverse for {e:?}"));
            assert_eq!(back.cost, e.cost);
        }
    }
}

#[test]
fn higher_arcs_never_lose_platform_jumps() {
    fn platform_jumps(mesh: &Navmesh) -> BTreeSet<(i64, i64, i64, i64)> {
        mesh.edges()
            .filter(|e| e.kind == EdgeKind::Jump)
            .filter_map(|e| {
                let (a, b) = (mesh.node(e.from)?, mesh.node(e.to)?);
                (a.kind.is_platform() && b.kind.is_platform()).then(|| {
                    (
                        a.position.x.round() as i64,
                        a.position.y.round() as i64,
                        b.position.x.round() as i64,
                        b.position.y.round() as i64,
                    )
                })
            })
            .collect()
    }

    let mut rng = ChaCha8Rng::seed_from_u64(3);
    for _ in 0..20 {
        let scene = random_scene(&mut rng);
        let mut previous: Option<BTreeSet<_>> = None;
        for arc in [40.0, 80.0, 120.0, 200.0] {
            let cfg = NavConfig {
                agent_radius: 20.0,
                jump_arc_height: arc,
                max_jump_distance: 300.0,
                ..NavConfig::default()
            };
            let jumps = platform_jumps(&build_navmesh(&scene, &cfg));
            if let Some(prev) = &previous {
                assert!(prev.is_subset(&jumps), "arc {arc} lost jumps");
            }
            previous = Some(jumps);
        }
    }
}
