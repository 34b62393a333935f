//! Short-range transition edges between nodes on different obstacles.

use crate::builder::{NodeSnap, snapshot_nodes};
use crate::config::NavConfig;
use crate::constants::{
    ATTACH_COST_FACTOR, CLIMB_COST_FACTOR, DROP_COST_FACTOR, HANG_DROP_COST_FACTOR,
};
use crate::navmesh::{EdgeKind, Navmesh, NodeKind};

#[inline]
fn distance(a: &NodeSnap, b: &NodeSnap) -> f32 {
    (b.position - a.position).norm()
}

/// Bidirectional `step` edges between nearby platform nodes, one pair per
/// unordered node pair. Returns the number of edge records added.
pub fn add_step_edges(mesh: &mut Navmesh, config: &NavConfig) -> usize {
    let platforms = snapshot_nodes(mesh, NodeKind::is_platform);
    let mut added = 0;
    for (i, a) in platforms.iter().enumerate() {
        for b in &platforms[i + 1..] {
            if a.owner == b.owner {
                continue;
            }
            let dx = (b.position.x - a.position.x).abs();
            let dy = (b.position.y - a.position.y).abs();
            if dx > config.max_step_gap || dy > config.max_step_height {
                continue;
            }
            if mesh
                .add_bidirectional(a.id, b.id, EdgeKind::Step, distance(a, b))
                .is_some()
            {
                added += 2;
            }
        }
    }
    added
}

/// Unidirectional `drop` edges from a platform node to a lower platform node,
/// skipping pairs already joined by a step.
pub fn add_drop_edges(mesh: &mut Navmesh, config: &NavConfig) -> usize {
    let platforms = snapshot_nodes(mesh, NodeKind::is_platform);
    let mut added = 0;
    for from in &platforms {
        for to in &platforms {
            if from.owner == to.owner {
                continue;
            }
            let drop = to.position.y - from.position.y;
            if drop <= 0.0 || drop > config.max_drop_height {
                continue;
            }
            if (to.position.x - from.position.x).abs() > config.max_drop_gap {
                continue;
            }
            if mesh.has_edge_kind_between(from.id, to.id, EdgeKind::Step) {
                continue;
            }
            let cost = distance(from, to) * DROP_COST_FACTOR;
            if mesh.add_edge(from.id, to.id, EdgeKind::Drop, cost).is_some() {
                added += 1;
            }
        }
    }
    added
}

/// For a hang node just below a platform node: `drop` platform→hang and
/// `climb` hang→platform.
pub fn add_hang_transitions(mesh: &mut Navmesh, config: &NavConfig) -> usize {
    let platforms = snapshot_nodes(mesh, NodeKind::is_platform);
    let hangs = snapshot_nodes(mesh, NodeKind::is_hang);
    let reach = 3.0 * config.agent_radius;
    let mut added = 0;
    for p in &platforms {
        for h in &hangs {
            if p.owner == h.owner || h.position.y <= p.position.y {
                continue;
            }
            let d = distance(p, h);
            if d > reach {
                continue;
            }
            if mesh
                .add_edge(p.id, h.id, EdgeKind::Drop, d * HANG_DROP_COST_FACTOR)
                .is_some()
            {
                added += 1;
            }
            if mesh
                .add_edge(h.id, p.id, EdgeKind::Climb, d * CLIMB_COST_FACTOR)
                .is_some()
            {
                added += 1;
            }
        }
    }
    added
}

/// `attach` edges platform→hang within grabbing reach, at any relative height.
pub fn add_attach_edges(mesh: &mut Navmesh, config: &NavConfig) -> usize {
    let platforms = snapshot_nodes(mesh, NodeKind::is_platform);
    let hangs = snapshot_nodes(mesh, NodeKind::is_hang);
    let reach = 2.0 * config.agent_radius;
    let mut added = 0;
    for p in &platforms {
        for h in hangs.iter().filter(|h| h.owner != p.owner) {
            let d = distance(p, h);
            if d <= reach
                && mesh
                    .add_edge(p.id, h.id, EdgeKind::Attach, d * ATTACH_COST_FACTOR)
                    .is_some()
            {
                added += 1;
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Point;

    fn mesh_with(nodes: &[(f32, f32, NodeKind, u64)]) -> Navmesh {
        let mut mesh = Navmesh::new();
        for &(x, y, kind, owner) in nodes {
            mesh.add_node(Point::new(x, y), kind, owner);
        }
        mesh
    }

    fn count(mesh: &Navmesh, kind: EdgeKind) -> usize {
        mesh.edges().filter(|e| e.kind == kind).count()
    }

    #[test]
    fn step_pairs_are_deduplicated_and_symmetric() {
        let mut mesh = mesh_with(&[
            (0.0, 0.0, NodeKind::PlatformRight, 1),
            (30.0, 10.0, NodeKind::PlatformLeft, 2),
        ]);
        let added = add_step_edges(&mut mesh, &NavConfig::default());
        assert_eq!(added, 2);

        let ab = mesh.edge_between(0, 1).unwrap();
        let ba = mesh.edge_between(1, 0).unwrap();
        assert_eq!((ab.kind, ba.kind), (EdgeKind::Step, EdgeKind::Step));
        assert_eq!(ab.cost, ba.cost);
        assert!((ab.cost - (30.0f32 * 30.0 + 100.0).sqrt()).abs() < 1e-4);
    }

    #[test]
    fn same_obstacle_never_steps() {
        let mut mesh = mesh_with(&[
            (0.0, 0.0, NodeKind::PlatformLeft, 1),
            (10.0, 0.0, NodeKind::PlatformRight, 1),
        ]);
        assert_eq!(add_step_edges(&mut mesh, &NavConfig::default()), 0);
    }

    #[test]
    fn drop_goes_down_only_and_is_discounted() {
        let mut mesh = mesh_with(&[
            (0.0, 0.0, NodeKind::PlatformRight, 1),
            (50.0, 200.0, NodeKind::PlatformLeft, 2),
        ]);
        let added = add_drop_edges(&mut mesh, &NavConfig::default());
        assert_eq!(added, 1);

        let e = mesh.edge_between(0, 1).unwrap();
        assert_eq!(e.kind, EdgeKind::Drop);
        let expected = (50.0f32 * 50.0 + 200.0 * 200.0).sqrt() * DROP_COST_FACTOR;
        assert!((e.cost - expected).abs() < 1e-3);
        assert!(mesh.edge_between(1, 0).is_none());
    }

    #[test]
    fn drop_skips_pairs_joined_by_step() {
        let mut mesh = mesh_with(&[
            (0.0, 0.0, NodeKind::PlatformRight, 1),
            (20.0, 10.0, NodeKind::PlatformLeft, 2),
        ]);
        let cfg = NavConfig::default();
        add_step_edges(&mut mesh, &cfg);
        assert_eq!(add_drop_edges(&mut mesh, &cfg), 0);
        assert_eq!(count(&mesh, EdgeKind::Drop), 0);
    }

    #[test]
    fn hang_below_platform_gets_drop_and_climb() {
        let cfg = NavConfig {
            agent_radius: 20.0,
            ..NavConfig::default()
        };
        // 50 units apart, inside 3r = 60 but outside 2r = 40.
        let mut mesh = mesh_with(&[
            (0.0, 0.0, NodeKind::PlatformLeft, 1),
            (0.0, 50.0, NodeKind::HangLeft, 2),
        ]);
        assert_eq!(add_hang_transitions(&mut mesh, &cfg), 2);
        assert_eq!(add_attach_edges(&mut mesh, &cfg), 0);

        let down = mesh.edge_between(0, 1).unwrap();
        assert_eq!(down.kind, EdgeKind::Drop);
        assert!((down.cost - 50.0 * HANG_DROP_COST_FACTOR).abs() < 1e-4);

        let up = mesh.edge_between(1, 0).unwrap();
        assert_eq!(up.kind, EdgeKind::Climb);
        assert!((up.cost - 50.0 * CLIMB_COST_FACTOR).abs() < 1e-4);
    }

    #[test]
    fn attach_ignores_relative_height() {
        let cfg = NavConfig {
            agent_radius: 20.0,
            ..NavConfig::default()
        };
        // Hang node above the platform node: no drop/climb, but attach.
        let mut mesh = mesh_with(&[
            (0.0, 30.0, NodeKind::PlatformLeft, 1),
            (0.0, 0.0, NodeKind::HangRight, 2),
        ]);
        assert_eq!(add_hang_transitions(&mut mesh, &cfg), 0);
        assert_eq!(add_attach_edges(&mut mesh, &cfg), 1);
        let e = mesh.edge_between(0, 1).unwrap();
        assert_eq!(e.kind, EdgeKind::Attach);
        assert!((e.cost - 30.0 * ATTACH_COST_FACTOR).abs() < 1e-4);
    }
}
