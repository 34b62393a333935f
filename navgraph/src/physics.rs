/*!
Collision backend for the locomotion controller.

[`PhysicsBackend`] is the narrow capability surface the controller needs: keep a
set of static rectangles in sync with the obstacle snapshot, own one kinematic
circular agent, step the world, and resolve a desired displacement.

[`RapierBackend`] implements it on Rapier's query world and
`KinematicCharacterController`. The 2D scene lives in the `z = 0` plane:
obstacles are cuboids with a fixed half-depth, the agent is a ball, and the
controller's `up` is `-y` because screen `y` grows downward.

Obstacle colliders persist across snapshots and are resized/moved in place when
their id survives; only vanished ids are removed.
*/

use std::collections::{HashMap, HashSet};

use log::{debug, trace};
use rapier3d::control::{CharacterAutostep, CharacterLength, KinematicCharacterController};
use rapier3d::prelude::*;

use crate::config::LocomotionConfig;
use crate::constants::{COLLIDER_HALF_DEPTH, FIXED_DT};
use crate::geometry::{Obstacle, ObstacleId, Point, Vec2};

/// What the backend did with a requested displacement.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MoveOutcome {
    /// Displacement actually applied.
    pub translation: Vec2,
    /// Touching a walkable surface after the move.
    pub grounded: bool,
    /// Sliding down a slope steeper than the slide angle.
    pub sliding: bool,
}

pub trait PhysicsBackend {
    /// Create or update the static rectangle for `obstacle.id`.
    fn upsert_static_rect(&mut self, obstacle: &Obstacle);

    /// Returns `false` when the id was unknown.
    fn remove_static_rect(&mut self, id: ObstacleId) -> bool;

    fn static_ids(&self) -> Vec<ObstacleId>;

    /// Make the static set match `obstacles` exactly, reusing colliders by id.
    fn sync_obstacles(&mut self, obstacles: &[Obstacle]) {
        let keep: HashSet<ObstacleId> = obstacles.iter().map(|o| o.id).collect();
        for id in self.static_ids() {
            if !keep.contains(&id) {
                self.remove_static_rect(id);
            }
        }
        for o in obstacles {
            self.upsert_static_rect(o);
        }
    }

    /// Create the kinematic agent body, replacing any previous one.
    fn create_agent(&mut self, position: Point, radius: f32);

    /// Advance the world by `dt`, flushing collider changes into the broad phase.
    fn step(&mut self, dt: f32);

    /// Resolve `desired` against the static set and move the agent by the result.
    fn move_agent(&mut self, desired: Vec2, dt: f32) -> MoveOutcome;

    fn agent_position(&self) -> Point;

    fn teleport_agent(&mut self, position: Point);
}

#[inline]
fn to_world(p: Point) -> Vector<f32> {
    vector![p.x, p.y, 0.0]
}

#[inline]
fn rect_translation(o: &Obstacle) -> Vector<f32> {
    to_world(o.center())
}

#[inline]
fn rect_shape(o: &Obstacle) -> SharedShape {
    SharedShape::cuboid(o.width * 0.5, o.height * 0.5, COLLIDER_HALF_DEPTH)
}

/// Kinematic character controller tuned from [`LocomotionConfig`].
pub fn character_controller(config: &LocomotionConfig) -> KinematicCharacterController {
    KinematicCharacterController {
        up: -Vector::y_axis(),
        offset: CharacterLength::Absolute(config.offset),
        slide: true,
        autostep: Some(CharacterAutostep {
            max_height: CharacterLength::Absolute(config.autostep_max_height),
            min_width: CharacterLength::Absolute(config.autostep_min_width),
            include_dynamic_bodies: false,
        }),
        max_slope_climb_angle: config.max_slope_climb_deg.to_radians(),
        min_slope_slide_angle: config.min_slope_slide_deg.to_radians(),
        snap_to_ground: Some(CharacterLength::Absolute(config.snap_to_ground)),
        normal_nudge_factor: config.normal_nudge_factor,
    }
}

struct AgentBody {
    body: RigidBodyHandle,
    collider: ColliderHandle,
    shape: Ball,
}

pub struct RapierBackend {
    bodies: RigidBodySet,
    colliders: ColliderSet,
    islands: IslandManager,
    broad_phase: BroadPhaseBvh,
    narrow_phase: NarrowPhase,
    statics: HashMap<ObstacleId, ColliderHandle>,
    agent: Option<AgentBody>,
    kcc: KinematicCharacterController,
    /// Colliders touched since the last broad-phase update.
    modified: Vec<ColliderHandle>,
    removed: Vec<ColliderHandle>,
    last_dt: f32,
}

impl RapierBackend {
    pub fn new(config: &LocomotionConfig) -> Self {
        Self {
            bodies: RigidBodySet::new(),
            colliders: ColliderSet::new(),
            islands: IslandManager::new(),
            broad_phase: BroadPhaseBvh::new(),
            narrow_phase: NarrowPhase::new(),
            statics: HashMap::new(),
            agent: None,
            kcc: character_controller(config),
            modified: Vec::new(),
            removed: Vec::new(),
            last_dt: FIXED_DT,
        }
    }

    pub fn static_count(&self) -> usize {
        self.statics.len()
    }

    fn as_query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    fn place_agent(&mut self, translation: Vector<f32>) {
        let Some(agent) = &self.agent else {
            return;
        };
        if let Some(body) = self.bodies.get_mut(agent.body) {
            body.set_translation(translation, true);
            let pose = *body.position();
            if let Some(collider) = self.colliders.get_mut(agent.collider) {
                collider.set_position(pose);
                self.modified.push(agent.collider);
            }
        }
    }

    fn flush(&mut self, dt: f32) {
        self.last_dt = dt;
        if self.modified.is_empty() && self.removed.is_empty() {
            return;
        }
        let mut events = Vec::new();
        self.broad_phase.update(
            &IntegrationParameters {
                dt,
                ..IntegrationParameters::default()
            },
            &self.colliders,
            &self.bodies,
            &self.modified,
            &self.removed,
            &mut events,
        );
        trace!(
            "broad phase: {} modified, {} removed",
            self.modified.len(),
            self.removed.len()
        );
        self.modified.clear();
        self.removed.clear();
    }
}

impl PhysicsBackend for RapierBackend {
    fn upsert_static_rect(&mut self, obstacle: &Obstacle) {
        if let Some(&handle) = self.statics.get(&obstacle.id)
            && let Some(collider) = self.colliders.get_mut(handle)
        {
            collider.set_shape(rect_shape(obstacle));
            collider.set_translation(rect_translation(obstacle));
            self.modified.push(handle);
            return;
        }
        let collider = ColliderBuilder::new(rect_shape(obstacle))
            .translation(rect_translation(obstacle))
            .build();
        let handle = self.colliders.insert(collider);
        self.statics.insert(obstacle.id, handle);
        self.modified.push(handle);
    }

    fn remove_static_rect(&mut self, id: ObstacleId) -> bool {
        let Some(handle) = self.statics.remove(&id) else {
            return false;
        };
        // The broad phase must know a handle before it can drop it.
        self.flush(self.last_dt);
        self.colliders
            .remove(handle, &mut self.islands, &mut self.bodies, false);
        self.removed.push(handle);
        true
    }

    fn static_ids(&self) -> Vec<ObstacleId> {
        self.statics.keys().copied().collect()
    }

    fn create_agent(&mut self, position: Point, radius: f32) {
        if let Some(old) = self.agent.take() {
            self.flush(self.last_dt);
            self.bodies.remove(
                old.body,
                &mut self.islands,
                &mut self.colliders,
                &mut ImpulseJointSet::new(),
                &mut MultibodyJointSet::new(),
                true,
            );
            self.removed.push(old.collider);
        }
        let body = RigidBodyBuilder::kinematic_position_based()
            .translation(to_world(position))
            .build();
        let body = self.bodies.insert(body);
        let collider = self.colliders.insert_with_parent(
            ColliderBuilder::ball(radius).build(),
            body,
            &mut self.bodies,
        );
        self.modified.push(collider);
        self.agent = Some(AgentBody {
            body,
            collider,
            shape: Ball::new(radius),
        });
        debug!("agent created at ({:.1}, {:.1}) r={radius}", position.x, position.y);
    }

    fn step(&mut self, dt: f32) {
        self.flush(dt);
    }

    fn move_agent(&mut self, desired: Vec2, dt: f32) -> MoveOutcome {
        self.flush(dt);
        let Some(agent) = &self.agent else {
            return MoveOutcome {
                translation: Vec2::zeros(),
                grounded: false,
                sliding: false,
            };
        };
        let Some(pose) = self.bodies.get(agent.body).map(|b| *b.position()) else {
            return MoveOutcome {
                translation: Vec2::zeros(),
                grounded: false,
                sliding: false,
            };
        };

        let movement = {
            let query_pipeline = self.as_query_pipeline(QueryFilter::only_fixed());
            self.kcc.move_shape(
                dt,
                &query_pipeline,
                &agent.shape,
                &pose,
                vector![desired.x, desired.y, 0.0],
                |_| {},
            )
        };

        // The scene is planar; drop any out-of-plane drift.
        let applied = Vec2::new(movement.translation.x, movement.translation.y);
        let next = vector![
            pose.translation.vector.x + applied.x,
            pose.translation.vector.y + applied.y,
            0.0
        ];
        self.place_agent(next);

        MoveOutcome {
            translation: applied,
            grounded: movement.grounded,
            sliding: movement.is_sliding_down_slope,
        }
    }

    fn agent_position(&self) -> Point {
        self.agent
            .as_ref()
            .and_then(|a| self.bodies.get(a.body))
            .map(|b| Point::new(b.translation().x, b.translation().y))
            .unwrap_or_else(Point::origin)
    }

    fn teleport_agent(&mut self, position: Point) {
        self.place_agent(to_world(position));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn backend() -> RapierBackend {
        RapierBackend::new(&LocomotionConfig::default())
    }

    #[test]
    fn sync_reuses_and_removes_by_id() {
        let mut b = backend();
        let a = Obstacle::new(1, 0.0, 100.0, 200.0, 20.0);
        let c = Obstacle::new(2, 300.0, 100.0, 200.0, 20.0);
        b.sync_obstacles(&[a, c]);
        b.step(1.0 / 60.0);
        let handle = b.statics[&1];
        assert_eq!(b.static_count(), 2);

        let moved = Obstacle::new(1, 10.0, 90.0, 180.0, 30.0);
        b.sync_obstacles(&[moved]);
        b.step(1.0 / 60.0);
        assert_eq!(b.static_count(), 1);
        assert_eq!(b.statics[&1], handle);

        let collider = b.colliders.get(handle).unwrap();
        let t = collider.translation();
        assert!((t.x - 100.0).abs() < 1e-4 && (t.y - 105.0).abs() < 1e-4);
        assert!(!b.remove_static_rect(2));
    }

    #[test]
    fn falling_agent_lands_on_a_rect() {
        let mut b = backend();
        let floor = Obstacle::new(1, 0.0, 100.0, 400.0, 40.0);
        b.sync_obstacles(&[floor]);
        b.create_agent(Point::new(200.0, 40.0), 20.0);
        b.step(1.0 / 60.0);

        let out = b.move_agent(Vec2::new(0.0, 100.0), 1.0 / 60.0);
        let p = b.agent_position();
        // Stopped on top of the floor, less the controller offset.
        assert!(out.translation.y < 100.0);
        assert!(p.y <= 80.0 + 1e-3 && p.y > 78.0, "y = {}", p.y);
        assert!(out.grounded);
    }

    #[test]
    fn free_motion_is_unobstructed() {
        let mut b = backend();
        b.create_agent(Point::new(0.0, 0.0), 10.0);
        let out = b.move_agent(Vec2::new(5.0, -3.0), 1.0 / 60.0);
        assert!((out.translation - Vec2::new(5.0, -3.0)).norm() < 1e-3);
        assert!(!out.grounded);
        let p = b.agent_position();
        assert!((p.x - 5.0).abs() < 1e-3 && (p.y + 3.0).abs() < 1e-3);
    }

    #[test]
    fn teleport_moves_the_agent() {
        let mut b = backend();
        b.create_agent(Point::new(0.0, 0.0), 10.0);
        b.teleport_agent(Point::new(50.0, -20.0));
        assert_eq!(b.agent_position(), Point::new(50.0, -20.0));
    }
}
