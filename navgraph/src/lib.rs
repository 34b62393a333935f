//! Platformer navigation over axis-aligned obstacles: a navmesh rebuilt from each
//! obstacle snapshot, A* over it, and a kinematic agent that follows the path.

pub mod agent;
pub mod builder;
pub mod config;
pub mod constants;
pub mod error;
pub mod flags;
pub mod geometry;
pub mod locomotion;
pub mod navmesh;
pub mod pathfinder;
pub mod physics;
pub mod surfaces;
pub mod system;

pub use agent::Agent;
pub use builder::{BuildStats, build_navmesh, build_navmesh_with_stats};
pub use config::{AgentConfig, LocomotionConfig, NavConfig, SystemConfig};
pub use error::ConfigError;
pub use geometry::{Bounds, Obstacle, ObstacleId, Point, Vec2};
pub use locomotion::{LocomotionController, LocomotionInput, Pose};
pub use navmesh::{ComponentId, EdgeKind, NavEdge, NavNode, Navmesh, NodeId, NodeKind};
pub use pathfinder::{Euclidean, Heuristic, Path, PathOptions, find_path, find_path_with};
pub use physics::{PhysicsBackend, RapierBackend};
pub use system::{NavSystem, PathPoint, SystemStats};
