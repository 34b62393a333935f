/*!
Landing-node synthesis: mid-segment targets for drops and jumps.

Candidate surfaces are the `walk` and `step` edges present when the phase starts
(one per unordered node pair). Sources are the nodes present when the phase
starts, restricted to those whose component differs from the surface's.

- A hang node hovering over the surface (within `max_drop_height`, its `x`
  inside the surface span) gets a `drop` edge straight down to a landing node.
- Any other source is projected onto the surface. If the projection lies well
  inside the segment and the jump is within range and clear, it gets a `jump`
  edge to a landing node there.

Landing nodes are deduplicated by a registry keyed on the surface endpoints and
the landing point snapped to a `landing_merge_quantum` grid. Keying on the
surface keeps numerically close points on different surfaces apart.
*/

use std::collections::HashMap;

use log::trace;

use crate::builder::jumps::jump_is_clear;
use crate::builder::{NodeSnap, snapshot_nodes};
use crate::config::NavConfig;
use crate::constants::{DROP_COST_FACTOR, JUMP_COST_FACTOR, LANDING_T_MAX, LANDING_T_MIN};
use crate::geometry::{Obstacle, ObstacleId, Point};
use crate::navmesh::{ComponentId, EdgeKind, Navmesh, NodeId, NodeKind};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct LandingStats {
    pub nodes: usize,
    pub edges: usize,
}

/// A `walk` or `step` edge a landing node can be spliced into.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SurfaceEdge {
    pub a: NodeId,
    pub b: NodeId,
    pub pa: Point,
    pub pb: Point,
    pub kind: EdgeKind,
    pub owner: ObstacleId,
    pub component: Option<ComponentId>,
}

impl SurfaceEdge {
    fn x_range(&self) -> (f32, f32) {
        (self.pa.x.min(self.pb.x), self.pa.x.max(self.pb.x))
    }

    /// Height of the surface at `x` (surfaces may slope across a step).
    fn y_at(&self, x: f32) -> f32 {
        let dx = self.pb.x - self.pa.x;
        if dx.abs() <= f32::EPSILON {
            return self.pa.y.min(self.pb.y);
        }
        let t = (x - self.pa.x) / dx;
        self.pa.y + (self.pb.y - self.pa.y) * t
    }

    /// Projection parameter of `p` onto `a → b`.
    fn project(&self, p: Point) -> f32 {
        let ab = self.pb - self.pa;
        let len2 = ab.norm_squared();
        if len2 <= f32::EPSILON {
            return 0.0;
        }
        (p - self.pa).dot(&ab) / len2
    }
}

type LandingKey = (NodeId, NodeId, i64, i64);

/// Landing nodes created so far in one build, by surface and snapped position.
#[derive(Debug)]
pub struct LandingRegistry {
    quantum: f32,
    by_key: HashMap<LandingKey, NodeId>,
}

impl LandingRegistry {
    pub fn new(quantum: f32) -> Self {
        Self {
            quantum,
            by_key: HashMap::new(),
        }
    }

    fn key(&self, surface: &SurfaceEdge, at: Point) -> LandingKey {
        let (lo, hi) = if surface.a < surface.b {
            (surface.a, surface.b)
        } else {
            (surface.b, surface.a)
        };
        let qx = (at.x / self.quantum).round() as i64;
        let qy = (at.y / self.quantum).round() as i64;
        (lo, hi, qx, qy)
    }

    /// Existing landing node for `at` on `surface`, or a fresh one wired into the
    /// surface with edges to and from both endpoints. Returns the node id and the
    /// number of edges added.
    pub(crate) fn get_or_insert(
        &mut self,
        mesh: &mut Navmesh,
        surface: &SurfaceEdge,
        at: Point,
    ) -> (NodeId, usize) {
        let key = self.key(surface, at);
        if let Some(&id) = self.by_key.get(&key) {
            return (id, 0);
        }

        let id = mesh.add_node(at, NodeKind::Landing, surface.owner);
        if let Some(component) = surface.component {
            mesh.set_component(id, component);
        }
        let mut edges = 0;
        for (end, end_pos) in [(surface.a, surface.pa), (surface.b, surface.pb)] {
            let cost = (end_pos - at).norm();
            if mesh.add_bidirectional(id, end, surface.kind, cost).is_some() {
                edges += 2;
            }
        }
        self.by_key.insert(key, id);
        (id, edges)
    }

    /// Landing nodes created so far.
    pub(crate) fn created(&self) -> usize {
        self.by_key.len()
    }
}

pub(crate) fn surface_edges(mesh: &Navmesh) -> Vec<SurfaceEdge> {
    mesh.edges()
        .filter(|e| matches!(e.kind, EdgeKind::Walk | EdgeKind::Step))
        .filter(|e| e.from < e.to)
        .filter_map(|e| {
            let a = mesh.node(e.from)?;
            let b = mesh.node(e.to)?;
            Some(SurfaceEdge {
                a: a.id,
                b: b.id,
                pa: a.position,
                pb: b.position,
                kind: e.kind,
                owner: a.owner,
                component: a.component,
            })
        })
        .collect()
}

/// Where a hang node would land dropping straight down onto `surface`.
pub(crate) fn hang_drop_target(
    source: &NodeSnap,
    surface: &SurfaceEdge,
    config: &NavConfig,
) -> Option<Point> {
    if !source.kind.is_hang() {
        return None;
    }
    let (lo, hi) = surface.x_range();
    let x = source.position.x;
    if x < lo || x > hi {
        return None;
    }
    let y = surface.y_at(x);
    let fall = y - source.position.y;
    (fall > 0.0 && fall <= config.max_drop_height).then(|| Point::new(x, y))
}

/// Where `source` would land jumping onto the interior of `surface`.
pub(crate) fn jump_landing_target(
    source: Point,
    surface: &SurfaceEdge,
    obstacles: &[Obstacle],
    config: &NavConfig,
) -> Option<Point> {
    let t = surface.project(source);
    if t <= LANDING_T_MIN || t >= LANDING_T_MAX {
        return None;
    }
    let at = surface.pa + (surface.pb - surface.pa) * t;
    if (at.x - source.x).abs() > config.max_jump_distance {
        return None;
    }
    if source.y - at.y > config.jump_arc_height * 0.5 {
        return None;
    }
    jump_is_clear(source, at, obstacles, config).then_some(at)
}

pub fn synthesize_landings(
    mesh: &mut Navmesh,
    obstacles: &[Obstacle],
    config: &NavConfig,
) -> LandingStats {
    let surfaces = surface_edges(mesh);
    let sources = snapshot_nodes(mesh, |_| true);
    let mut registry = LandingRegistry::new(config.landing_merge_quantum);
    let mut stats = LandingStats::default();

    for surface in &surfaces {
        for source in sources.iter().filter(|s| s.component != surface.component) {
            if let Some(at) = hang_drop_target(source, surface, config) {
                let (landing, wired) = registry.get_or_insert(mesh, surface, at);
                stats.edges += wired;
                let cost = (at.y - source.position.y) * DROP_COST_FACTOR;
                if mesh.add_edge(source.id, landing, EdgeKind::Drop, cost).is_some() {
                    stats.edges += 1;
                }
                trace!("hang {} drops to landing {landing}", source.id);
                continue;
            }

            if let Some(at) = jump_landing_target(source.position, surface, obstacles, config) {
                let (landing, wired) = registry.get_or_insert(mesh, surface, at);
                stats.edges += wired;
                let cost = (at - source.position).norm() * JUMP_COST_FACTOR;
                if mesh.add_edge(source.id, landing, EdgeKind::Jump, cost).is_some() {
                    stats.edges += 1;
                }
                trace!("node {} jumps to landing {landing}", source.id);
            }
        }
    }

    stats.nodes = registry.created();
    stats
}
