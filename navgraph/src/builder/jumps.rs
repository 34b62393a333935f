//! Long-range `jump` edges between platform endpoints of different components.

use crate::builder::snapshot_nodes;
use crate::config::NavConfig;
use crate::constants::JUMP_COST_FACTOR;
use crate::geometry::{Obstacle, Point, arc_is_clear, line_is_clear};
use crate::navmesh::{EdgeKind, Navmesh, NodeKind};

/// Both the straight line and the parabolic arc from `from` to `to` keep the
/// agent circle clear of every obstacle.
pub(crate) fn jump_is_clear(
    from: Point,
    to: Point,
    obstacles: &[Obstacle],
    config: &NavConfig,
) -> bool {
    let r = config.agent_radius;
    line_is_clear(from, to, r, obstacles)
        && arc_is_clear(from, to, config.jump_arc_height, r, obstacles)
}

/// Can an agent standing at `from` jump to `to`? Range and rise limits first,
/// then clearance.
pub fn can_jump(from: Point, to: Point, obstacles: &[Obstacle], config: &NavConfig) -> bool {
    if (to.x - from.x).abs() > config.max_jump_distance {
        return false;
    }
    // Rising is limited to half the arc; falling is not.
    if from.y - to.y > config.jump_arc_height * 0.5 {
        return false;
    }
    jump_is_clear(from, to, obstacles, config)
}

/// Add a `jump` edge for every ordered pair of platform nodes whose components
/// differ and whose jump is feasible. Returns the number of edges added.
pub fn add_jump_edges(mesh: &mut Navmesh, obstacles: &[Obstacle], config: &NavConfig) -> usize {
    let platforms = snapshot_nodes(mesh, NodeKind::is_platform);
    let mut added = 0;
    for from in &platforms {
        for to in &platforms {
            if from.id == to.id || from.component == to.component {
                continue;
            }
            if !can_jump(from.position, to.position, obstacles, config) {
                continue;
            }
            let cost = (to.position - from.position).norm() * JUMP_COST_FACTOR;
            if mesh.add_edge(from.id, to.id, EdgeKind::Jump, cost).is_some() {
                added += 1;
            }
        }
    }
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg() -> NavConfig {
        NavConfig {
            agent_radius: 25.0,
            max_jump_distance: 200.0,
            jump_arc_height: 80.0,
            ..NavConfig::default()
        }
    }

    #[test]
    fn range_is_horizontal_only() {
        let c = cfg();
        assert!(can_jump(Point::new(0.0, 0.0), Point::new(200.0, 0.0), &[], &c));
        assert!(!can_jump(Point::new(0.0, 0.0), Point::new(201.0, 0.0), &[], &c));
        // Long falls are fine as long as the horizontal gap is in range.
        assert!(can_jump(Point::new(0.0, 0.0), Point::new(100.0, 900.0), &[], &c));
    }

    #[test]
    fn rise_is_limited_to_half_the_arc() {
        let c = cfg();
        assert!(can_jump(Point::new(0.0, 100.0), Point::new(100.0, 60.0), &[], &c));
        assert!(!can_jump(Point::new(0.0, 100.0), Point::new(100.0, 59.0), &[], &c));
    }

    #[test]
    fn wall_between_blocks() {
        let wall = Obstacle::new(9, 90.0, -200.0, 20.0, 400.0);
        assert!(!can_jump(Point::new(0.0, 0.0), Point::new(200.0, 0.0), &[wall], &cfg()));
    }

    #[test]
    fn low_ceiling_blocks_the_arc_but_not_the_line() {
        // Clear straight across, but the apex at y = -80 hits the ceiling.
        let ceiling = Obstacle::new(9, 50.0, -120.0, 100.0, 70.0);
        let (a, b) = (Point::new(0.0, 0.0), Point::new(200.0, 0.0));
        assert!(line_is_clear(a, b, 25.0, &[ceiling]));
        assert!(!can_jump(a, b, &[ceiling], &cfg()));
    }
}
