/*!
Tuning configuration.

Three groups, each deserializable from a partial table (missing fields fall back
to the defaults in [`crate::constants`]):

- [`NavConfig`]:        graph-building tuning (surface clearance, step/drop/jump limits).
- [`LocomotionConfig`]: kinematic controller tuning, the same knobs a KCC settings row
                        carries (offset, slope angles, autostep, snap) plus the motion model.
- [`AgentConfig`]:      path-following and wandering behavior.

Values are validated once, up front, by [`SystemConfig::validate`].
*/

use serde::{Deserialize, Serialize};

use crate::constants::*;
use crate::error::{self, ConfigError};
use crate::geometry::{Bounds, Obstacle, Point};

/// Graph-building tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NavConfig {
    /// Collision/clearance radius for all geometry tests.
    pub agent_radius: f32,
    /// Jump-edge eligibility: maximum horizontal reach.
    pub max_jump_distance: f32,
    /// Jump trajectory apex above the higher endpoint.
    pub jump_arc_height: f32,
    /// Step-edge eligibility.
    pub max_step_gap: f32,
    pub max_step_height: f32,
    /// Drop-edge eligibility.
    pub max_drop_gap: f32,
    pub max_drop_height: f32,
    /// Minimum segment width to keep after obstacle subtraction.
    pub min_walk_width: f32,
    /// Grid cell used to key synthesized landing nodes.
    pub landing_merge_quantum: f32,
    /// Per-field tolerance used to decide a new snapshot equals the current one.
    pub snapshot_match_margin: f32,
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            agent_radius: DEFAULT_AGENT_RADIUS,
            max_jump_distance: DEFAULT_MAX_JUMP_DISTANCE,
            jump_arc_height: DEFAULT_JUMP_ARC_HEIGHT,
            max_step_gap: DEFAULT_MAX_STEP_GAP,
            max_step_height: DEFAULT_MAX_STEP_HEIGHT,
            max_drop_gap: DEFAULT_MAX_DROP_GAP,
            max_drop_height: DEFAULT_MAX_DROP_HEIGHT,
            min_walk_width: DEFAULT_MIN_WALK_WIDTH,
            landing_merge_quantum: DEFAULT_LANDING_MERGE_QUANTUM,
            snapshot_match_margin: DEFAULT_SNAPSHOT_MATCH_MARGIN,
        }
    }
}

impl NavConfig {
    pub fn validate(&self) -> error::Result<()> {
        error::positive("agent_radius", self.agent_radius)?;
        error::non_negative("max_jump_distance", self.max_jump_distance)?;
        error::non_negative("jump_arc_height", self.jump_arc_height)?;
        error::non_negative("max_step_gap", self.max_step_gap)?;
        error::non_negative("max_step_height", self.max_step_height)?;
        error::non_negative("max_drop_gap", self.max_drop_gap)?;
        error::non_negative("max_drop_height", self.max_drop_height)?;
        error::non_negative("min_walk_width", self.min_walk_width)?;
        error::positive("landing_merge_quantum", self.landing_merge_quantum)?;
        error::non_negative("snapshot_match_margin", self.snapshot_match_margin)?;
        Ok(())
    }
}

/// Kinematic controller and motion tuning.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LocomotionConfig {
    /// Downward acceleration (toward +y).
    pub gravity: f32,
    /// Upward speed set by a jump.
    pub jump_speed: f32,
    /// Falling speed clamp.
    pub terminal_fall_speed: f32,
    /// Horizontal speed limit.
    pub max_speed: f32,
    /// Horizontal speed gained per second while input is held.
    pub acceleration: f32,
    /// Horizontal speed lost per second when input is released or reversed.
    pub deceleration: f32,
    /// Gap kept between the agent and colliders.
    pub offset: f32,
    /// Maximum climbable slope angle (degrees).
    pub max_slope_climb_deg: f32,
    /// Minimum slope angle (degrees) before automatic sliding starts.
    pub min_slope_slide_deg: f32,
    /// Autostep maximum height. Always enabled.
    pub autostep_max_height: f32,
    /// Autostep minimum width. Always enabled.
    pub autostep_min_width: f32,
    /// Snap-to-ground distance.
    pub snap_to_ground: f32,
    /// Increase if the agent gets stuck when sliding.
    pub normal_nudge_factor: f32,
    /// Respawn location `[x, y]`.
    pub spawn: [f32; 2],
    /// Padding added around the obstacle bounds before a respawn triggers.
    pub respawn_margin: f32,
}

impl Default for LocomotionConfig {
    fn default() -> Self {
        Self {
            gravity: DEFAULT_GRAVITY,
            jump_speed: DEFAULT_JUMP_SPEED,
            terminal_fall_speed: DEFAULT_TERMINAL_FALL_SPEED,
            max_speed: DEFAULT_MAX_SPEED,
            acceleration: DEFAULT_ACCELERATION,
            deceleration: DEFAULT_DECELERATION,
            offset: DEFAULT_KCC_OFFSET,
            max_slope_climb_deg: DEFAULT_MAX_SLOPE_CLIMB_DEG,
            min_slope_slide_deg: DEFAULT_MIN_SLOPE_SLIDE_DEG,
            autostep_max_height: DEFAULT_AUTOSTEP_MAX_HEIGHT,
            autostep_min_width: DEFAULT_AUTOSTEP_MIN_WIDTH,
            snap_to_ground: DEFAULT_SNAP_TO_GROUND,
            normal_nudge_factor: DEFAULT_NORMAL_NUDGE_FACTOR,
            spawn: DEFAULT_SPAWN,
            respawn_margin: DEFAULT_RESPAWN_MARGIN,
        }
    }
}

impl LocomotionConfig {
    pub fn validate(&self) -> error::Result<()> {
        error::non_negative("gravity", self.gravity)?;
        error::non_negative("jump_speed", self.jump_speed)?;
        error::positive("terminal_fall_speed", self.terminal_fall_speed)?;
        error::positive("max_speed", self.max_speed)?;
        error::positive("acceleration", self.acceleration)?;
        error::positive("deceleration", self.deceleration)?;
        error::positive("offset", self.offset)?;
        error::angle_deg("max_slope_climb_deg", self.max_slope_climb_deg)?;
        error::angle_deg("min_slope_slide_deg", self.min_slope_slide_deg)?;
        error::non_negative("autostep_max_height", self.autostep_max_height)?;
        error::non_negative("autostep_min_width", self.autostep_min_width)?;
        error::non_negative("snap_to_ground", self.snap_to_ground)?;
        error::non_negative("normal_nudge_factor", self.normal_nudge_factor)?;
        error::finite("spawn.x", self.spawn[0])?;
        error::finite("spawn.y", self.spawn[1])?;
        error::positive("respawn_margin", self.respawn_margin)?;
        Ok(())
    }

    #[inline]
    pub fn spawn_point(&self) -> Point {
        Point::new(self.spawn[0], self.spawn[1])
    }

    /// Region the agent may occupy: the obstacle union grown by `respawn_margin`,
    /// or a box of that size around the spawn point when there are no obstacles.
    pub fn respawn_bounds(&self, obstacles: &[Obstacle]) -> Bounds {
        match Bounds::of_obstacles(obstacles) {
            Some(b) => b.expanded(self.respawn_margin),
            None => Bounds::around(self.spawn_point(), self.respawn_margin),
        }
    }
}

/// Path-following behavior.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Horizontal distance at which a waypoint counts as reached.
    pub arrival_tolerance: f32,
    /// Seconds without reaching a waypoint before the path is abandoned.
    pub stall_timeout: f32,
    /// Seconds to idle before picking a random destination.
    pub idle_delay: f32,
    /// Pick random destinations when idle.
    pub wander: bool,
    /// Seed for destination picking.
    pub seed: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            arrival_tolerance: DEFAULT_ARRIVAL_TOLERANCE,
            stall_timeout: DEFAULT_STALL_TIMEOUT,
            idle_delay: DEFAULT_IDLE_DELAY,
            wander: true,
            seed: 0x5eed,
        }
    }
}

impl AgentConfig {
    pub fn validate(&self) -> error::Result<()> {
        error::positive("arrival_tolerance", self.arrival_tolerance)?;
        error::positive("stall_timeout", self.stall_timeout)?;
        error::non_negative("idle_delay", self.idle_delay)?;
        Ok(())
    }
}

/// Everything the [`crate::system::NavSystem`] needs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    pub nav: NavConfig,
    pub locomotion: LocomotionConfig,
    pub agent: AgentConfig,
}

impl SystemConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.nav.validate()?;
        self.locomotion.validate()?;
        self.agent.validate()?;

        // The waypoint tolerance must be tighter than the agent itself,
        // otherwise adjacent endpoints are "reached" before walking to them.
        if self.agent.arrival_tolerance > self.nav.agent_radius {
            return Err(ConfigError::Inconsistent {
                smaller: "agent.arrival_tolerance",
                smaller_value: self.agent.arrival_tolerance,
                larger: "nav.agent_radius",
                larger_value: self.nav.agent_radius,
            });
        }
        Ok(())
    }
}
