/*!
Surface extraction: obstacle rectangles → walkable and hangable segments.

For every obstacle two candidate lines are considered:
- the top, one agent radius above the top edge (platform surface),
- the underside, one agent radius below the bottom edge (hang surface).

Other obstacles that cut through the agent-sized band in front of a line block an
interval (padded by the agent radius). The remaining free pieces that are at least
`min_walk_width` wide get endpoints, pushed inward until the agent circle fits.
*/

use log::trace;

use crate::config::NavConfig;
use crate::constants::ENDPOINT_PUSH_STEP;
use crate::geometry::{Obstacle, ObstacleId, Point, Span, circle_hits_any, subtract_spans};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SurfaceKind {
    /// Walkable top.
    Platform,
    /// Grabbable underside.
    Hang,
}

/// A horizontal segment the agent can occupy, with clear endpoints.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Surface {
    pub owner: ObstacleId,
    pub kind: SurfaceKind,
    /// Height of the agent's center while on this surface.
    pub y: f32,
    pub left: f32,
    pub right: f32,
}

impl Surface {
    #[inline]
    pub fn left_point(&self) -> Point {
        Point::new(self.left, self.y)
    }

    #[inline]
    pub fn right_point(&self) -> Point {
        Point::new(self.right, self.y)
    }

    #[inline]
    pub fn length(&self) -> f32 {
        self.right - self.left
    }
}

/// Extract every platform and hang surface of the snapshot, obstacle by obstacle
/// (platform first, then hang), left to right.
pub fn extract_surfaces(obstacles: &[Obstacle], config: &NavConfig) -> Vec<Surface> {
    let mut out = Vec::new();
    for o in obstacles {
        surfaces_of(o, SurfaceKind::Platform, obstacles, config, &mut out);
        surfaces_of(o, SurfaceKind::Hang, obstacles, config, &mut out);
    }
    out
}

fn surfaces_of(
    o: &Obstacle,
    kind: SurfaceKind,
    obstacles: &[Obstacle],
    config: &NavConfig,
    out: &mut Vec<Surface>,
) {
    let r = config.agent_radius;

    // Center line, and the band the agent circle sweeps while on it.
    let (y, band_top, band_bottom) = match kind {
        SurfaceKind::Platform => (o.top() - r, o.top() - 2.0 * r, o.top()),
        SurfaceKind::Hang => (o.bottom() + r, o.bottom(), o.bottom() + 2.0 * r),
    };

    let full = Span::new(o.left() + r, o.right() - r);
    if full.width() <= 0.0 {
        return;
    }

    let blocked: Vec<Span> = obstacles
        .iter()
        .filter(|other| other.id != o.id)
        .filter(|other| other.overlaps_band(band_top, band_bottom))
        .filter(|other| other.overlaps_span(o.left(), o.right()))
        .map(|other| Span::new(other.left() - r, other.right() + r))
        .collect();

    for piece in subtract_spans(full, blocked) {
        if piece.width() < config.min_walk_width {
            trace!(
                "obstacle {} {:?}: dropping narrow piece {:.1}..{:.1}",
                o.id, kind, piece.left, piece.right
            );
            continue;
        }
        match place_endpoints(piece, y, r, o.id, obstacles) {
            Some((left, right)) => out.push(Surface {
                owner: o.id,
                kind,
                y,
                left,
                right,
            }),
            None => trace!(
                "obstacle {} {:?}: no clear endpoints in {:.1}..{:.1}",
                o.id, kind, piece.left, piece.right
            ),
        }
    }
}

/// Push both ends of `piece` inward until the agent circle clears every other
/// obstacle. Fails when either push crosses the midpoint.
fn place_endpoints(
    piece: Span,
    y: f32,
    radius: f32,
    owner: ObstacleId,
    obstacles: &[Obstacle],
) -> Option<(f32, f32)> {
    let mid = piece.mid();
    let left = push_inward(piece.left, ENDPOINT_PUSH_STEP, mid, y, radius, owner, obstacles)?;
    let right = push_inward(piece.right, -ENDPOINT_PUSH_STEP, mid, y, radius, owner, obstacles)?;
    (right > left).then_some((left, right))
}

fn push_inward(
    start: f32,
    step: f32,
    mid: f32,
    y: f32,
    radius: f32,
    owner: ObstacleId,
    obstacles: &[Obstacle],
) -> Option<f32> {
    let mut x = start;
    loop {
        if !circle_hits_any(Point::new(x, y), radius, obstacles, Some(owner)) {
            return Some(x);
        }
        x += step;
        let past_mid = if step > 0.0 { x > mid } else { x < mid };
        if past_mid {
            return None;
        }
    }
}
