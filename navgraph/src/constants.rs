/*!
Default tuning values and fixed tolerances.

These constants centralize the parameters used by the surface extractor, the graph
builder phases, the pathfinder and the kinematic locomotion controller. Keeping them
together makes tuning easier; `NavConfig` and `LocomotionConfig` take their defaults
from here and may override any of them.

Notes
- Distances are in screen units (pixels), time in seconds.
- `+y` points down. Gravity is a positive value.
*/

// --- Graph tuning defaults -------------------------------------------------

/// Collision/clearance radius of the agent.
pub const DEFAULT_AGENT_RADIUS: f32 = 20.0;

/// Maximum horizontal reach of a jump edge.
pub const DEFAULT_MAX_JUMP_DISTANCE: f32 = 200.0;

/// Apex height of the jump parabola above the higher endpoint.
/// Jumps may gain at most half of this in height.
pub const DEFAULT_JUMP_ARC_HEIGHT: f32 = 80.0;

/// Step edges: horizontal and vertical limits between platform endpoints.
pub const DEFAULT_MAX_STEP_GAP: f32 = 40.0;
pub const DEFAULT_MAX_STEP_HEIGHT: f32 = 25.0;

/// Drop edges: horizontal and vertical limits.
pub const DEFAULT_MAX_DROP_GAP: f32 = 60.0;
pub const DEFAULT_MAX_DROP_HEIGHT: f32 = 400.0;

/// Sub-segments narrower than this are discarded after obstacle subtraction.
pub const DEFAULT_MIN_WALK_WIDTH: f32 = 20.0;

/// Landing points are deduplicated on a grid of this cell size.
pub const DEFAULT_LANDING_MERGE_QUANTUM: f32 = 1.0;

/// Two snapshots are considered equal when every obstacle matches within this margin.
pub const DEFAULT_SNAPSHOT_MATCH_MARGIN: f32 = 0.5;

/// Obstacles at or below this width/height are dropped from a snapshot.
pub const MIN_OBSTACLE_EXTENT: f32 = 1.0;

// --- Edge cost multipliers -------------------------------------------------

/// Drops are cheaper than walking the same distance.
pub const DROP_COST_FACTOR: f32 = 0.8;
/// Platform -> hang transition drop.
pub const HANG_DROP_COST_FACTOR: f32 = 1.2;
/// Hang -> platform climb.
pub const CLIMB_COST_FACTOR: f32 = 1.5;
/// Platform -> hang "reach down and grab".
pub const ATTACH_COST_FACTOR: f32 = 1.1;
/// Jumps carry a penalty over their straight-line length.
pub const JUMP_COST_FACTOR: f32 = 1.5;

// --- Geometry sampling -----------------------------------------------------

/// Number of samples along the straight line between two jump endpoints.
pub const LINE_SAMPLES: usize = 10;

/// Number of samples along the jump parabola.
pub const ARC_SAMPLES: usize = 20;

/// Step used when pushing segment endpoints inward to find a clear spot.
pub const ENDPOINT_PUSH_STEP: f32 = 1.0;

/// Circle-vs-rect overlaps shallower than this are treated as touching, not
/// intersecting. Agents resting on a surface sit exactly one radius above it.
pub const CONTACT_TOLERANCE: f32 = 0.01;

/// Landing projections must fall strictly inside this parameter range of the
/// surface edge so they do not duplicate an endpoint.
pub const LANDING_T_MIN: f32 = 0.1;
pub const LANDING_T_MAX: f32 = 0.9;

// --- Locomotion defaults ---------------------------------------------------

/// Fixed simulation timestep (seconds).
pub const FIXED_DT: f32 = 1.0 / 60.0;

/// Frame deltas above this are clamped to avoid a spiral of death after a hitch.
pub const MAX_FRAME_DELTA: f32 = 0.25;

/// Upper bound on fixed steps run by a single `update` call.
pub const MAX_SUBSTEPS: u32 = 8;

/// Gravity magnitude (units per second squared, applied toward +y).
pub const DEFAULT_GRAVITY: f32 = 1800.0;

/// Vertical speed given by a jump (units per second, upward).
pub const DEFAULT_JUMP_SPEED: f32 = 620.0;

/// Maximum falling speed.
pub const DEFAULT_TERMINAL_FALL_SPEED: f32 = 1400.0;

/// Horizontal speed limit and ramps.
pub const DEFAULT_MAX_SPEED: f32 = 260.0;
pub const DEFAULT_ACCELERATION: f32 = 1800.0;
pub const DEFAULT_DECELERATION: f32 = 2400.0;

/// Small gap preserved between the character and its surroundings.
/// Keep `offset` small but non-zero for numerical stability.
pub const DEFAULT_KCC_OFFSET: f32 = 0.5;

/// Maximum climbable slope angle (degrees).
pub const DEFAULT_MAX_SLOPE_CLIMB_DEG: f32 = 45.0;

/// Minimum slope angle (degrees) before automatic sliding starts.
pub const DEFAULT_MIN_SLOPE_SLIDE_DEG: f32 = 30.0;

/// Autostep limits (absolute units, always enabled).
pub const DEFAULT_AUTOSTEP_MAX_HEIGHT: f32 = 10.0;
pub const DEFAULT_AUTOSTEP_MIN_WIDTH: f32 = 4.0;

/// Max downward distance to snap to ground.
pub const DEFAULT_SNAP_TO_GROUND: f32 = 6.0;

/// Increase if the character gets stuck when sliding.
pub const DEFAULT_NORMAL_NUDGE_FACTOR: f32 = 1.0e-4;

/// Where the agent reappears after leaving the plausible region.
pub const DEFAULT_SPAWN: [f32; 2] = [100.0, 0.0];

/// Padding around the obstacle bounds before the agent counts as diverged.
pub const DEFAULT_RESPAWN_MARGIN: f32 = 1500.0;

/// Half-depth of the cuboids standing in for 2D rectangles in the physics scene.
pub const COLLIDER_HALF_DEPTH: f32 = 64.0;

// --- Agent behavior --------------------------------------------------------

/// Horizontal distance at which a waypoint counts as reached.
pub const DEFAULT_ARRIVAL_TOLERANCE: f32 = 8.0;

/// Seconds without reaching a waypoint before the path is abandoned.
pub const DEFAULT_STALL_TIMEOUT: f32 = 4.0;

/// Stalls in a row toward the same explicit destination before it is given up.
pub const MAX_CONSECUTIVE_STALLS: u32 = 3;

/// Seconds to idle before wandering to a new random destination.
pub const DEFAULT_IDLE_DELAY: f32 = 1.0;

/// Path nodes must keep their position within this distance across rebuilds.
pub const PATH_NODE_DRIFT: f32 = 1.0;
