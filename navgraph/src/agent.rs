/*!
Path planning and following for the single agent.

The agent owns its current [`Path`], a cursor to the next waypoint, and the
waypoint positions captured when the path was planned. It reads the navmesh to
plan and to validate, never to mutate it.

Lifecycle
- Idle: no path. With `wander` on, a random node is picked after `idle_delay`.
- Following: steer toward `waypoints[cursor]`; a waypoint is reached within
  `arrival_tolerance` horizontally (and one agent radius vertically).
- Replan: after a rebuild the remaining path is checked against the new mesh;
  a vanished or moved node, or a missing edge, drops the path and repicks.
  Stalling for `stall_timeout` does the same; an explicit destination is given
  up after `MAX_CONSECUTIVE_STALLS` stalls without reaching a waypoint.
- A destination that has not been planned yet is checked on rebuild too, since
  node ids restart with every generation.
*/

use log::debug;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::config::AgentConfig;
use crate::constants::{MAX_CONSECUTIVE_STALLS, PATH_NODE_DRIFT};
use crate::geometry::Point;
use crate::locomotion::LocomotionInput;
use crate::navmesh::{EdgeKind, Navmesh, NodeId};
use crate::pathfinder::{Path, PathOptions, find_path};

/// Horizontal distance over which steering eases off before a waypoint.
const STEER_EASE_FACTOR: f32 = 4.0;

#[derive(Clone, Copy, Debug, PartialEq)]
struct Destination {
    node: NodeId,
    position: Point,
    /// Set by the caller rather than picked at random.
    explicit: bool,
}

impl Destination {
    /// The node still exists where it was when the destination was chosen.
    fn holds_on(&self, mesh: &Navmesh) -> bool {
        mesh.node(self.node)
            .is_some_and(|n| (n.position - self.position).norm() <= PATH_NODE_DRIFT)
    }
}

pub struct Agent {
    config: AgentConfig,
    radius: f32,
    rng: ChaCha8Rng,
    destination: Option<Destination>,
    path: Path,
    /// Positions of `path.nodes` when planned.
    waypoints: Vec<Point>,
    cursor: usize,
    idle_timer: f32,
    stall_timer: f32,
    /// Stalls since a waypoint was last reached by traversing an edge.
    stalls: u32,
    needs_plan: bool,
    replans: u32,
}

impl Agent {
    pub fn new(config: AgentConfig, radius: f32) -> Self {
        let rng = ChaCha8Rng::seed_from_u64(config.seed);
        Self {
            config,
            radius,
            rng,
            destination: None,
            path: Path::default(),
            waypoints: Vec::new(),
            cursor: 0,
            idle_timer: 0.0,
            stall_timer: 0.0,
            stalls: 0,
            needs_plan: false,
            replans: 0,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Index into `path().nodes` of the waypoint being approached.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn destination(&self) -> Option<NodeId> {
        self.destination.map(|d| d.node)
    }

    pub fn is_following(&self) -> bool {
        self.cursor < self.path.nodes.len()
    }

    /// Number of paths dropped by validation or stalling.
    pub fn replans(&self) -> u32 {
        self.replans
    }

    /// Head for `node`. Planned on the next [`Agent::tick`]. Returns `false` for
    /// unknown ids.
    pub fn set_destination(&mut self, mesh: &Navmesh, node: NodeId) -> bool {
        let Some(n) = mesh.node(node) else {
            return false;
        };
        self.destination = Some(Destination {
            node,
            position: n.position,
            explicit: true,
        });
        self.stalls = 0;
        self.needs_plan = true;
        true
    }

    /// Drop the path and destination and go idle.
    pub fn clear(&mut self) {
        self.destination = None;
        self.stalls = 0;
        self.drop_path();
    }

    fn drop_path(&mut self) {
        self.path = Path::default();
        self.waypoints.clear();
        self.cursor = 0;
        self.stall_timer = 0.0;
        self.idle_timer = 0.0;
        self.needs_plan = false;
    }

    fn pick_destination(&mut self, mesh: &Navmesh) -> bool {
        let count = mesh.node_count();
        if count == 0 {
            return false;
        }
        let index = self.rng.gen_range(0..count);
        let Some(n) = mesh.nodes().nth(index) else {
            return false;
        };
        self.destination = Some(Destination {
            node: n.id,
            position: n.position,
            explicit: false,
        });
        true
    }

    /// Plan from the node nearest to `position` toward the destination, falling
    /// back to the closest reachable node.
    fn plan(&mut self, mesh: &Navmesh, position: Point) {
        self.drop_path();
        let Some(dest) = self.destination else {
            return;
        };
        let Some(start) = mesh.nearest_node(position) else {
            return;
        };
        let path = find_path(mesh, start.id, dest.node, PathOptions::CLOSEST);
        self.waypoints = path
            .nodes
            .iter()
            .filter_map(|&id| mesh.node(id).map(|n| n.position))
            .collect();
        if self.waypoints.len() != path.nodes.len() {
            self.waypoints.clear();
            return;
        }
        debug!(
            "planned {} nodes toward {} (cost {:.1}, reached: {})",
            path.len(),
            dest.node,
            path.cost,
            path.last() == Some(dest.node)
        );
        self.path = path;
    }

    /// Abandon the current path and pick again. Explicit destinations that still
    /// exist at their old position are kept.
    fn repick(&mut self, mesh: &Navmesh) {
        self.replans += 1;
        let keep = self.destination.filter(|d| d.explicit && d.holds_on(mesh));
        self.drop_path();
        self.destination = keep;
        if self.destination.is_none() && self.config.wander {
            self.pick_destination(mesh);
        }
        self.needs_plan = self.destination.is_some();
    }

    /// Is the unfinished part of the path still valid on `mesh`? Includes the
    /// node the agent is leaving, since its outgoing edge is being traversed.
    pub fn path_is_valid(&self, mesh: &Navmesh) -> bool {
        let from = self.cursor.saturating_sub(1);
        let nodes = &self.path.nodes[from.min(self.path.nodes.len())..];
        let points = &self.waypoints[from.min(self.waypoints.len())..];

        let positions_hold = nodes.iter().zip(points).all(|(&id, &p)| {
            mesh.node(id)
                .is_some_and(|n| (n.position - p).norm() <= PATH_NODE_DRIFT)
        });
        positions_hold
            && nodes
                .windows(2)
                .all(|w| mesh.edge_between(w[0], w[1]).is_some())
    }

    /// Called after every navmesh rebuild.
    pub fn on_rebuild(&mut self, mesh: &Navmesh) {
        if !self.is_following() {
            if let Some(d) = self.destination
                && !(d.explicit && d.holds_on(mesh))
            {
                // Not planned yet: the id may name another node in this generation.
                debug!("pending destination {} did not survive the rebuild", d.node);
                self.destination = None;
                self.stalls = 0;
                self.needs_plan = false;
            }
            return;
        }
        if !self.path_is_valid(mesh) {
            debug!("path invalidated by rebuild; repicking");
            self.repick(mesh);
        }
    }

    /// The controller teleported the agent; whatever it was following is moot.
    pub fn on_respawn(&mut self, mesh: &Navmesh) {
        if self.is_following() {
            self.repick(mesh);
        }
    }

    /// Kind of the edge from the previous waypoint to the current one.
    fn current_edge(&self, mesh: &Navmesh) -> Option<EdgeKind> {
        if self.cursor == 0 {
            return None;
        }
        let from = *self.path.nodes.get(self.cursor - 1)?;
        let to = *self.path.nodes.get(self.cursor)?;
        mesh.edge_between(from, to).map(|e| e.kind)
    }

    fn reached(&self, position: Point, waypoint: Point) -> bool {
        (waypoint.x - position.x).abs() <= self.config.arrival_tolerance
            && (waypoint.y - position.y).abs() <= self.radius
    }

    /// Advance the behavior by `dt` and produce the controller input.
    pub fn tick(
        &mut self,
        mesh: &Navmesh,
        position: Point,
        grounded: bool,
        dt: f32,
    ) -> LocomotionInput {
        if self.needs_plan {
            self.plan(mesh, position);
        }

        if !self.is_following() {
            if let Some(d) = self.destination.filter(|d| d.explicit) {
                // Reached, as close as it gets, or nothing to start from.
                if self.path.is_empty() {
                    debug!("no path toward {}; dropping the destination", d.node);
                }
                self.destination = None;
                self.stalls = 0;
                self.drop_path();
            }
            self.idle_timer += dt;
            if self.config.wander && self.idle_timer >= self.config.idle_delay {
                self.idle_timer = 0.0;
                if self.pick_destination(mesh) {
                    self.plan(mesh, position);
                }
            }
            return LocomotionInput::default();
        }

        let waypoint = self.waypoints[self.cursor];
        if self.reached(position, waypoint) {
            if self.cursor > 0 {
                self.stalls = 0;
            }
            self.cursor += 1;
            self.stall_timer = 0.0;
            if !self.is_following() {
                debug!("path finished at node {:?}", self.path.last());
                return LocomotionInput::default();
            }
        }

        self.stall_timer += dt;
        if self.stall_timer > self.config.stall_timeout {
            debug!("stalled toward waypoint {}; repicking", self.cursor);
            self.stalls += 1;
            if self.stalls >= MAX_CONSECUTIVE_STALLS {
                debug!("giving up on destination {:?}", self.destination());
                self.destination = None;
                self.stalls = 0;
            }
            self.repick(mesh);
            return LocomotionInput::default();
        }

        let edge = self.current_edge(mesh);
        if self.cursor > 0 && edge.is_none() {
            // Edge gone without a rebuild notice: treat as a missing node.
            self.repick(mesh);
            return LocomotionInput::default();
        }

        let target = self.waypoints[self.cursor];
        let ease = self.config.arrival_tolerance * STEER_EASE_FACTOR;
        let move_x = ((target.x - position.x) / ease).clamp(-1.0, 1.0);

        let take_off = self.waypoints[self.cursor.saturating_sub(1)];
        let near_take_off =
            (take_off - position).norm() <= self.config.arrival_tolerance + self.radius;
        let jump = grounded && near_take_off && edge.is_some_and(EdgeKind::needs_jump);

        LocomotionInput { move_x, jump }
    }
}
