/*!
The subsystem facade: obstacle snapshots in, path and pose out.

[`NavSystem`] owns the current obstacle set, the navmesh generation built from
it, the physics backend (through the locomotion controller) and the agent.
Two cadences drive it:

- [`NavSystem::apply_snapshot`]: sanitize the snapshot, skip it when nothing
  moved, otherwise swap the whole set, rebuild the navmesh, sync colliders and
  let the agent validate its path. Runs to completion synchronously.
- [`NavSystem::update`]: accumulate the (clamped) frame delta and run fixed
  1/60 s locomotion steps, at most `MAX_SUBSTEPS` per call.
*/

use std::collections::{HashMap, HashSet};

use log::{debug, warn};
use serde::Serialize;

use crate::agent::Agent;
use crate::builder::build_navmesh;
use crate::config::SystemConfig;
use crate::constants::{FIXED_DT, MAX_FRAME_DELTA, MAX_SUBSTEPS, MIN_OBSTACLE_EXTENT};
use crate::error::ConfigError;
use crate::geometry::{Bounds, Obstacle, ObstacleId};
use crate::locomotion::{LocomotionController, Pose};
use crate::navmesh::{Navmesh, NodeId};
use crate::pathfinder::Path;
use crate::physics::{PhysicsBackend, RapierBackend};

/// One entry of the active path, for debug rendering.
#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct PathPoint {
    pub node_id: NodeId,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct SystemStats {
    pub snapshots: u64,
    pub rebuilds: u64,
    pub unchanged_snapshots: u64,
    pub rejected_obstacles: u64,
    pub steps: u64,
    pub respawns: u64,
}

/// Drop unusable obstacles and repeated ids (first occurrence wins). Returns the
/// clean set and the number of rejected entries.
pub fn sanitize_snapshot(snapshot: &[Obstacle]) -> (Vec<Obstacle>, usize) {
    let mut seen = HashSet::with_capacity(snapshot.len());
    let clean: Vec<Obstacle> = snapshot
        .iter()
        .filter(|o| o.is_usable(MIN_OBSTACLE_EXTENT))
        .filter(|o| seen.insert(o.id))
        .copied()
        .collect();
    let rejected = snapshot.len() - clean.len();
    (clean, rejected)
}

/// Same ids, each within `margin` of its previous bounds.
fn same_obstacles(current: &[Obstacle], next: &[Obstacle], margin: f32) -> bool {
    if current.len() != next.len() {
        return false;
    }
    let by_id: HashMap<ObstacleId, &Obstacle> = current.iter().map(|o| (o.id, o)).collect();
    next.iter()
        .all(|o| by_id.get(&o.id).is_some_and(|c| c.matches(o, margin)))
}

pub struct NavSystem<B: PhysicsBackend = RapierBackend> {
    config: SystemConfig,
    obstacles: Vec<Obstacle>,
    mesh: Navmesh,
    generation: u64,
    controller: LocomotionController<B>,
    agent: Agent,
    bounds: Bounds,
    accumulator: f32,
    stats: SystemStats,
}

impl NavSystem<RapierBackend> {
    pub fn new(config: SystemConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let backend = RapierBackend::new(&config.locomotion);
        Self::with_backend(config, backend)
    }
}

impl<B: PhysicsBackend> NavSystem<B> {
    pub fn with_backend(config: SystemConfig, backend: B) -> Result<Self, ConfigError> {
        config.validate()?;
        let controller =
            LocomotionController::new(config.locomotion.clone(), backend, config.nav.agent_radius);
        let agent = Agent::new(config.agent.clone(), config.nav.agent_radius);
        let bounds = config.locomotion.respawn_bounds(&[]);
        Ok(Self {
            config,
            obstacles: Vec::new(),
            mesh: Navmesh::new(),
            generation: 0,
            controller,
            agent,
            bounds,
            accumulator: 0.0,
            stats: SystemStats::default(),
        })
    }

    /// Replace the obstacle set. Returns `true` when the navmesh was rebuilt.
    pub fn apply_snapshot(&mut self, snapshot: &[Obstacle]) -> bool {
        self.stats.snapshots += 1;
        let (clean, rejected) = sanitize_snapshot(snapshot);
        if rejected > 0 {
            warn!("snapshot: rejected {rejected} of {} obstacles", snapshot.len());
            self.stats.rejected_obstacles += rejected as u64;
        }

        if self.generation > 0
            && same_obstacles(&self.obstacles, &clean, self.config.nav.snapshot_match_margin)
        {
            self.stats.unchanged_snapshots += 1;
            return false;
        }

        self.obstacles = clean;
        self.mesh = build_navmesh(&self.obstacles, &self.config.nav);
        self.generation += 1;
        self.stats.rebuilds += 1;

        self.controller.backend_mut().sync_obstacles(&self.obstacles);
        self.bounds = self.config.locomotion.respawn_bounds(&self.obstacles);
        self.agent.on_rebuild(&self.mesh);
        debug!(
            "generation {}: {} obstacles, {} nodes",
            self.generation,
            self.obstacles.len(),
            self.mesh.node_count()
        );
        true
    }

    /// Advance by a wall-clock frame delta. Returns the number of fixed steps run.
    pub fn update(&mut self, frame_dt: f32) -> u32 {
        let dt = if frame_dt.is_finite() {
            frame_dt.clamp(0.0, MAX_FRAME_DELTA)
        } else {
            0.0
        };
        self.accumulator = (self.accumulator + dt).min(MAX_FRAME_DELTA);

        let mut steps = 0;
        while self.accumulator >= FIXED_DT && steps < MAX_SUBSTEPS {
            self.fixed_step();
            self.accumulator -= FIXED_DT;
            steps += 1;
        }
        steps
    }

    fn fixed_step(&mut self) {
        let position = self.controller.position();
        let grounded = self.controller.is_grounded();
        let input = self.agent.tick(&self.mesh, position, grounded, FIXED_DT);
        let report = self.controller.step(input, FIXED_DT, &self.bounds);
        self.stats.steps += 1;
        if report.respawned {
            self.stats.respawns += 1;
            self.agent.on_respawn(&self.mesh);
        }
    }

    /// Head for `node` in the current generation.
    pub fn set_destination(&mut self, node: NodeId) -> bool {
        self.agent.set_destination(&self.mesh, node)
    }

    pub fn clear_destination(&mut self) {
        self.agent.clear();
    }

    /// The active path as `{node_id, x, y}`, skipping ids the mesh no longer has.
    pub fn path_points(&self) -> Vec<PathPoint> {
        self.agent
            .path()
            .nodes
            .iter()
            .filter_map(|&id| {
                self.mesh.node(id).map(|n| PathPoint {
                    node_id: id,
                    x: n.position.x,
                    y: n.position.y,
                })
            })
            .collect()
    }

    pub fn pose(&self) -> Pose {
        self.controller.pose()
    }

    pub fn path(&self) -> &Path {
        self.agent.path()
    }

    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    pub fn navmesh(&self) -> &Navmesh {
        &self.mesh
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn stats(&self) -> SystemStats {
        self.stats
    }

    pub fn config(&self) -> &SystemConfig {
        &self.config
    }
}
