/*!
Fixed-timestep kinematic locomotion for one agent.

Per step:
1. Move horizontal velocity toward the requested target speed, accelerating or
   decelerating at the configured rates, clamped to `max_speed`.
2. If grounded and a jump is requested, replace vertical velocity with the jump
   speed (upward, so negative `y`).
3. Integrate: `Δx = avg(vx0, vx1)·dt`, `Δy = vy0·dt + ½·g·dt²`.
4. Let the backend resolve the displacement (autostep, slope slide, snap).
5. Store velocities for the next step: horizontal follows what was actually
   achieved, vertical is zeroed on landing or when a ceiling cuts a rise.
6. Respawn at the spawn point when the agent leaves the plausible bounds.
*/

use log::{debug, trace, warn};

use crate::config::LocomotionConfig;
use crate::geometry::{Bounds, Point, Vec2};
use crate::physics::PhysicsBackend;

/// Below this, a blocked axis counts as stopped.
const MOTION_EPS: f32 = 1.0e-3;

/// Controller input for one step.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct LocomotionInput {
    /// Horizontal intent in `[-1, 1]`, scaled by `max_speed`.
    pub move_x: f32,
    pub jump: bool,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StepReport {
    pub jumped: bool,
    pub respawned: bool,
}

/// Agent pose as exposed to rendering.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Pose {
    pub x: f32,
    pub y: f32,
    pub velocity: Vec2,
    pub grounded: bool,
}

pub struct LocomotionController<B> {
    config: LocomotionConfig,
    backend: B,
    velocity: Vec2,
    grounded: bool,
    sliding: bool,
}

/// Move `current` toward `target` by at most `max_delta`.
#[inline]
fn approach(current: f32, target: f32, max_delta: f32) -> f32 {
    if (target - current).abs() <= max_delta {
        target
    } else {
        current + (target - current).signum() * max_delta
    }
}

impl<B: PhysicsBackend> LocomotionController<B> {
    /// Create the controller and its agent body at the configured spawn point.
    pub fn new(config: LocomotionConfig, mut backend: B, radius: f32) -> Self {
        backend.create_agent(config.spawn_point(), radius);
        Self {
            config,
            backend,
            velocity: Vec2::zeros(),
            grounded: false,
            sliding: false,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn position(&self) -> Point {
        self.backend.agent_position()
    }

    pub fn velocity(&self) -> Vec2 {
        self.velocity
    }

    pub fn is_grounded(&self) -> bool {
        self.grounded
    }

    pub fn is_sliding(&self) -> bool {
        self.sliding
    }

    pub fn pose(&self) -> Pose {
        let p = self.position();
        Pose {
            x: p.x,
            y: p.y,
            velocity: self.velocity,
            grounded: self.grounded,
        }
    }

    /// Teleport to the spawn point with zero velocity.
    pub fn respawn(&mut self) {
        let spawn = self.config.spawn_point();
        self.backend.teleport_agent(spawn);
        self.velocity = Vec2::zeros();
        self.grounded = false;
        self.sliding = false;
        debug!("agent respawned at ({:.1}, {:.1})", spawn.x, spawn.y);
    }

    /// Desired horizontal velocity after `dt`.
    fn next_vx(&self, move_x: f32, dt: f32) -> f32 {
        let c = &self.config;
        let target = move_x.clamp(-1.0, 1.0) * c.max_speed;
        let v0 = self.velocity.x;
        let same_direction = v0 == 0.0 || v0.signum() == target.signum();
        let speeding_up = target != 0.0 && same_direction && target.abs() > v0.abs();
        let rate = if speeding_up {
            c.acceleration
        } else {
            c.deceleration
        };
        approach(v0, target, rate * dt).clamp(-c.max_speed, c.max_speed)
    }

    /// Advance one fixed step of `dt` seconds. `bounds` is the region outside of
    /// which the agent is considered lost.
    pub fn step(&mut self, input: LocomotionInput, dt: f32, bounds: &Bounds) -> StepReport {
        let c = &self.config;
        let mut report = StepReport::default();
        self.backend.step(dt);

        let vx0 = self.velocity.x;
        let vx1 = self.next_vx(input.move_x, dt);

        let mut vy0 = self.velocity.y;
        if self.grounded && input.jump {
            vy0 = -c.jump_speed;
            report.jumped = true;
        }
        let g = c.gravity;
        let vy1 = (vy0 + g * dt).min(c.terminal_fall_speed);

        let desired = Vec2::new((vx0 + vx1) * 0.5 * dt, vy0 * dt + 0.5 * g * dt * dt);
        let out = self.backend.move_agent(desired, dt);

        self.grounded = out.grounded;
        self.sliding = out.sliding;

        // Horizontal: keep the new speed unless a wall ate the motion.
        let blocked_x = desired.x.abs() > MOTION_EPS
            && out.translation.x.abs() + MOTION_EPS < desired.x.abs();
        self.velocity.x = if blocked_x {
            out.translation.x / dt
        } else {
            vx1
        };

        // Vertical: stop on landing, and when a ceiling cuts a rise short.
        self.velocity.y = if (self.grounded && vy1 >= 0.0)
            || (desired.y < -MOTION_EPS && out.translation.y > desired.y + MOTION_EPS)
        {
            0.0
        } else {
            vy1
        };

        let p = self.position();
        trace!(
            "step: pos=({:.2}, {:.2}) vel=({:.1}, {:.1}) grounded={}",
            p.x, p.y, self.velocity.x, self.velocity.y, self.grounded
        );

        if !(p.x.is_finite() && p.y.is_finite()) {
            warn!("agent position diverged ({}, {}); respawning", p.x, p.y);
            self.respawn();
            report.respawned = true;
        } else if !bounds.contains(p) {
            debug!("agent left bounds at ({:.1}, {:.1})", p.x, p.y);
            self.respawn();
            report.respawned = true;
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::FIXED_DT;
    use crate::geometry::Obstacle;
    use crate::physics::RapierBackend;

    fn controller(spawn: [f32; 2]) -> LocomotionController<RapierBackend> {
        let config = LocomotionConfig {
            spawn,
            ..LocomotionConfig::default()
        };
        let backend = RapierBackend::new(&config);
        LocomotionController::new(config, backend, 20.0)
    }

    fn wide_bounds() -> Bounds {
        Bounds::around(Point::origin(), 10_000.0)
    }

    fn run(c: &mut LocomotionController<RapierBackend>, input: LocomotionInput, steps: usize) {
        let bounds = wide_bounds();
        for _ in 0..steps {
            c.step(input, FIXED_DT, &bounds);
        }
    }

    #[test]
    fn approach_clamps_to_target() {
        assert_eq!(approach(0.0, 10.0, 3.0), 3.0);
        assert_eq!(approach(9.0, 10.0, 3.0), 10.0);
        assert_eq!(approach(0.0, -10.0, 3.0), -3.0);
    }

    #[test]
    fn falls_and_settles_on_the_floor() {
        let mut c = controller([200.0, 0.0]);
        c.backend_mut()
            .sync_obstacles(&[Obstacle::new(1, 0.0, 200.0, 400.0, 40.0)]);

        run(&mut c, LocomotionInput::default(), 120);
        let p = c.position();
        assert!(c.is_grounded());
        assert_eq!(c.velocity().y, 0.0);
        // Center rests one radius above the top, less the skin offset.
        assert!((p.y - 180.0).abs() < 2.0, "y = {}", p.y);
    }

    #[test]
    fn horizontal_speed_is_capped() {
        let mut c = controller([0.0, 0.0]);
        c.backend_mut()
            .sync_obstacles(&[Obstacle::new(1, -2000.0, 40.0, 4000.0, 40.0)]);

        run(&mut c, LocomotionInput { move_x: 1.0, jump: false }, 90);
        let max = LocomotionConfig::default().max_speed;
        assert!(c.velocity().x > 0.0);
        assert!(c.velocity().x <= max + 1e-3);
    }

    #[test]
    fn jump_only_from_the_ground() {
        let mut c = controller([0.0, 0.0]);
        let bounds = wide_bounds();
        // Airborne at spawn: no jump.
        let r = c.step(LocomotionInput { move_x: 0.0, jump: true }, FIXED_DT, &bounds);
        assert!(!r.jumped);

        c.backend_mut()
            .sync_obstacles(&[Obstacle::new(1, -500.0, 40.0, 1000.0, 40.0)]);
        run(&mut c, LocomotionInput::default(), 60);
        assert!(c.is_grounded());

        let r = c.step(LocomotionInput { move_x: 0.0, jump: true }, FIXED_DT, &bounds);
        assert!(r.jumped);
        assert!(c.velocity().y < 0.0);
        assert!(!c.is_grounded());
    }

    #[test]
    fn leaving_bounds_respawns_with_zero_velocity() {
        let mut c = controller([0.0, 0.0]);
        let tight = Bounds::around(Point::origin(), 5.0);
        let mut respawns = 0;
        for _ in 0..30 {
            if c.step(LocomotionInput::default(), FIXED_DT, &tight).respawned {
                respawns += 1;
                assert_eq!(c.position(), Point::origin());
                assert_eq!(c.velocity(), Vec2::zeros());
            }
        }
        assert!(respawns > 0);
    }

    #[test]
    fn wall_stops_horizontal_motion() {
        let mut c = controller([0.0, 0.0]);
        c.backend_mut().sync_obstacles(&[
            Obstacle::new(1, -500.0, 20.0, 1000.0, 40.0),
            Obstacle::new(2, 60.0, -200.0, 40.0, 220.0),
        ]);
        run(&mut c, LocomotionInput { move_x: 1.0, jump: false }, 120);
        let p = c.position();
        assert!(p.x < 40.5, "x = {}", p.x);
        assert!(c.velocity().x.abs() < 1.0);
    }
}
