/*!
Graph builder: obstacle snapshot → [`Navmesh`].

The build is a pure function run in ordered phases over one obstacle snapshot:

1. surfaces:    extract platform/hang segments, two endpoint nodes each, joined
                by a `walk` or `hang` edge.
2. transitions: short-range `step`, `drop`, platform↔hang, and `attach` edges.
3. components:  label connected components over the non-jump edge kinds.
4. landing:     synthesize mid-segment landing nodes for drops and jumps that
                would otherwise miss a segment's endpoints.
5. jumps:       long-range `jump` edges between platform nodes of different
                components.
6. components:  relabel, so the published ids reflect the finished graph.

Phases 4 and 5 both read the component ids written by phase 3 (plus the ids
landing nodes inherit from their surface), never ids produced by their own edges.

Cost
- Phases 2, 4 and 5 are O(N²) in node count and the build is not incremental:
  the whole graph is rebuilt for every snapshot. Callers needing interactivity
  must bound obstacle counts.
*/

pub mod components;
pub mod jumps;
pub mod landing;
pub mod transitions;

use log::{debug, info};

use crate::config::NavConfig;
use crate::geometry::{Obstacle, ObstacleId, Point};
use crate::navmesh::{EdgeKind, Navmesh, NodeId, NodeKind, locomotion_edges};
use crate::surfaces::{SurfaceKind, extract_surfaces};

/// Edge counts per phase, for logging and tests.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct BuildStats {
    pub surfaces: usize,
    pub steps: usize,
    pub drops: usize,
    pub hang_transitions: usize,
    pub attaches: usize,
    pub landing_nodes: usize,
    pub landing_edges: usize,
    pub jumps: usize,
}

/// Build a fresh navmesh for `obstacles`.
pub fn build_navmesh(obstacles: &[Obstacle], config: &NavConfig) -> Navmesh {
    build_navmesh_with_stats(obstacles, config).0
}

/// Same as [`build_navmesh`], also returning per-phase counts.
pub fn build_navmesh_with_stats(
    obstacles: &[Obstacle],
    config: &NavConfig,
) -> (Navmesh, BuildStats) {
    let mut mesh = Navmesh::new();
    let mut stats = BuildStats::default();

    // 1) Surfaces.
    stats.surfaces = add_surface_nodes(&mut mesh, obstacles, config);
    debug!(
        "surfaces: {} segments, {} nodes",
        stats.surfaces,
        mesh.node_count()
    );

    // 2) Short-range transitions.
    stats.steps = transitions::add_step_edges(&mut mesh, config);
    stats.drops = transitions::add_drop_edges(&mut mesh, config);
    stats.hang_transitions = transitions::add_hang_transitions(&mut mesh, config);
    stats.attaches = transitions::add_attach_edges(&mut mesh, config);
    debug!(
        "transitions: {} step, {} drop, {} platform/hang, {} attach",
        stats.steps, stats.drops, stats.hang_transitions, stats.attaches
    );

    // 3) Components, needed by the "already reachable" test below.
    let initial = components::label_components(&mut mesh);
    debug!("components: {initial} before synthesis");

    // 4) Landing nodes.
    let landing = landing::synthesize_landings(&mut mesh, obstacles, config);
    stats.landing_nodes = landing.nodes;
    stats.landing_edges = landing.edges;
    debug!(
        "landing: {} nodes, {} edges",
        stats.landing_nodes, stats.landing_edges
    );

    // 5) Jumps between platform endpoints.
    stats.jumps = jumps::add_jump_edges(&mut mesh, obstacles, config);
    debug!("jumps: {}", stats.jumps);

    // 6) Final labels.
    let fin = components::label_components(&mut mesh);

    info!(
        "navmesh built: {} obstacles, {} nodes, {} edges, {} components",
        obstacles.len(),
        mesh.node_count(),
        mesh.edge_count(),
        fin
    );
    debug_assert!(mesh.nodes().all(|n| n.component.is_some()));
    debug_assert!(
        mesh.edges()
            .filter(|e| locomotion_edges().has(e.kind))
            .all(|e| mesh.component_of(e.from) == mesh.component_of(e.to))
    );

    (mesh, stats)
}

/// Two endpoint nodes per extracted surface, joined by a `walk` or `hang` edge
/// whose cost is the segment length. Returns the number of surfaces.
pub fn add_surface_nodes(
    mesh: &mut Navmesh,
    obstacles: &[Obstacle],
    config: &NavConfig,
) -> usize {
    let surfaces = extract_surfaces(obstacles, config);
    for s in &surfaces {
        let (left_kind, right_kind, edge_kind) = match s.kind {
            SurfaceKind::Platform => {
                (NodeKind::PlatformLeft, NodeKind::PlatformRight, EdgeKind::Walk)
            }
            SurfaceKind::Hang => (NodeKind::HangLeft, NodeKind::HangRight, EdgeKind::Hang),
        };
        let l = mesh.add_node(s.left_point(), left_kind, s.owner);
        let r = mesh.add_node(s.right_point(), right_kind, s.owner);
        mesh.add_bidirectional(l, r, edge_kind, s.length());
    }
    surfaces.len()
}

/// Copy of the node fields the pairwise phases read, taken before they add edges.
#[derive(Clone, Copy, Debug)]
pub(crate) struct NodeSnap {
    pub id: NodeId,
    pub position: Point,
    pub kind: NodeKind,
    pub owner: ObstacleId,
    pub component: Option<u32>,
}

pub(crate) fn snapshot_nodes(
    mesh: &Navmesh,
    mut keep: impl FnMut(NodeKind) -> bool,
) -> Vec<NodeSnap> {
    mesh.nodes()
        .filter(|n| keep(n.kind))
        .map(|n| NodeSnap {
            id: n.id,
            position: n.position,
            kind: n.kind,
            owner: n.owner,
            component: n.component,
        })
        .collect()
}

#[cfg(test)]
mod tests;
