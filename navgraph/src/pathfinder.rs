//! A* search over a [`Navmesh`].
//!
//! Successors come from [`Navmesh::neighbors`]. The heuristic is pluggable and
//! defaults to straight-line distance.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap};

use crate::navmesh::{NavNode, Navmesh, NodeId};

/// Estimated remaining cost from `from` to `goal`.
pub trait Heuristic {
    fn estimate(&self, from: &NavNode, goal: &NavNode) -> f32;
}

impl<F> Heuristic for F
where
    F: Fn(&NavNode, &NavNode) -> f32,
{
    fn estimate(&self, from: &NavNode, goal: &NavNode) -> f32 {
        self(from, goal)
    }
}

/// Straight-line distance between node positions.
///
/// Drops are discounted below their length, so on graphs with drops this can
/// overestimate and the search is no longer guaranteed optimal.
#[derive(Clone, Copy, Debug, Default)]
pub struct Euclidean;

impl Heuristic for Euclidean {
    fn estimate(&self, from: &NavNode, goal: &NavNode) -> f32 {
        (goal.position - from.position).norm()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathOptions {
    /// When the goal is unreachable, return the path to the explored node with
    /// the lowest heuristic instead of an empty path.
    pub closest: bool,
}

impl PathOptions {
    pub const EXACT: Self = Self { closest: false };
    pub const CLOSEST: Self = Self { closest: true };
}

/// Ordered node ids from start to the last node reached, with the summed edge cost.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Path {
    pub nodes: Vec<NodeId>,
    pub cost: f32,
}

impl Path {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn last(&self) -> Option<NodeId> {
        self.nodes.last().copied()
    }
}

/// Entry in the open set.
#[derive(Clone, Copy, Debug)]
struct SearchNode {
    node: NodeId,
    g: f32,
    f: f32,
}

impl PartialEq for SearchNode {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for SearchNode {}

impl PartialOrd for SearchNode {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for SearchNode {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed for a min-heap on f; ties go to the lower node id.
        other
            .f
            .total_cmp(&self.f)
            .then_with(|| other.node.cmp(&self.node))
    }
}

/// A* with the [`Euclidean`] heuristic.
pub fn find_path(mesh: &Navmesh, start: NodeId, goal: NodeId, options: PathOptions) -> Path {
    find_path_with(mesh, start, goal, &Euclidean, options)
}

/// A* with a caller-supplied heuristic.
///
/// Unknown start or goal ids yield an empty path.
pub fn find_path_with<H: Heuristic + ?Sized>(
    mesh: &Navmesh,
    start: NodeId,
    goal: NodeId,
    heuristic: &H,
    options: PathOptions,
) -> Path {
    let (Some(start_node), Some(goal_node)) = (mesh.node(start), mesh.node(goal)) else {
        return Path::default();
    };
    if start == goal {
        return Path {
            nodes: vec![start],
            cost: 0.0,
        };
    }

    let mut open = BinaryHeap::new();
    let mut g_scores: HashMap<NodeId, f32> = HashMap::new();
    let mut came_from: HashMap<NodeId, NodeId> = HashMap::new();

    // Closest fallback: (node, h, g) of the best explored node so far.
    let h_start = heuristic.estimate(start_node, goal_node);
    let mut closest = (start, h_start, 0.0f32);

    g_scores.insert(start, 0.0);
    open.push(SearchNode {
        node: start,
        g: 0.0,
        f: h_start,
    });

    while let Some(current) = open.pop() {
        if current.node == goal {
            return Path {
                nodes: reconstruct(&came_from, start, goal),
                cost: current.g,
            };
        }

        // Stale entry: a cheaper route to this node was found after it was queued.
        if g_scores
            .get(&current.node)
            .is_some_and(|&best| current.g > best)
        {
            continue;
        }

        for edge in mesh.neighbors(current.node) {
            let Some(next) = mesh.node(edge.to) else {
                continue;
            };
            let tentative = current.g + edge.cost;
            if g_scores.get(&edge.to).is_some_and(|&g| tentative >= g) {
                continue;
            }
            g_scores.insert(edge.to, tentative);
            came_from.insert(edge.to, current.node);

            let h = heuristic.estimate(next, goal_node);
            if h < closest.1 || (h == closest.1 && tentative < closest.2) {
                closest = (edge.to, h, tentative);
            }
            open.push(SearchNode {
                node: edge.to,
                g: tentative,
                f: tentative + h,
            });
        }
    }

    if !options.closest {
        return Path::default();
    }
    let (node, _, _) = closest;
    Path {
        nodes: reconstruct(&came_from, start, node),
        cost: g_scores.get(&node).copied().unwrap_or(0.0),
    }
}

fn reconstruct(came_from: &HashMap<NodeId, NodeId>, start: NodeId, end: NodeId) -> Vec<NodeId> {
    let mut nodes = vec![end];
    let mut current = end;
    while current != start {
        match came_from.get(&current) {
            Some(&parent) => {
                nodes.push(parent);
                current = parent;
            }
            None => break,
        }
    }
    nodes.reverse();
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::build_navmesh;
    use crate::config::NavConfig;
    use crate::geometry::{Obstacle, Point};
    use crate::navmesh::{EdgeKind, NodeKind};

    /// Two separate chains: 0-1-2 and 3-4.
    fn two_islands() -> Navmesh {
        let mut mesh = Navmesh::new();
        let xs = [0.0, 100.0, 200.0, 500.0, 600.0];
        for (i, x) in xs.into_iter().enumerate() {
            mesh.add_node(Point::new(x, 0.0), NodeKind::PlatformLeft, i as u64);
        }
        mesh.add_bidirectional(0, 1, EdgeKind::Walk, 100.0);
        mesh.add_bidirectional(1, 2, EdgeKind::Walk, 100.0);
        mesh.add_bidirectional(3, 4, EdgeKind::Walk, 100.0);
        mesh
    }

    #[test]
    fn single_segment_path_costs_its_length() {
        let a = Obstacle::new(1, 0.0, 100.0, 200.0, 20.0);
        let cfg = NavConfig {
            agent_radius: 25.0,
            ..NavConfig::default()
        };
        let mesh = build_navmesh(&[a], &cfg);
        let left = mesh
            .nearest_node_where(Point::new(0.0, 75.0), |n| n.kind == NodeKind::PlatformLeft)
            .unwrap()
            .id;
        let right = mesh
            .nearest_node_where(Point::new(200.0, 75.0), |n| n.kind == NodeKind::PlatformRight)
            .unwrap()
            .id;

        let path = find_path(&mesh, left, right, PathOptions::EXACT);
        assert_eq!(path.nodes, vec![left, right]);
        assert_eq!(path.cost, 150.0);
    }

    #[test]
    fn prefers_the_cheaper_route() {
        let mut mesh = Navmesh::new();
        for x in [0.0, 50.0, 100.0] {
            mesh.add_node(Point::new(x, 0.0), NodeKind::PlatformLeft, 1);
        }
        mesh.add_edge(0, 2, EdgeKind::Jump, 500.0);
        mesh.add_edge(0, 1, EdgeKind::Walk, 50.0);
        mesh.add_edge(1, 2, EdgeKind::Walk, 50.0);

        let path = find_path(&mesh, 0, 2, PathOptions::EXACT);
        assert_eq!(path.nodes, vec![0, 1, 2]);
        assert_eq!(path.cost, 100.0);
    }

    #[test]
    fn start_equals_goal() {
        let mesh = two_islands();
        let path = find_path(&mesh, 1, 1, PathOptions::EXACT);
        assert_eq!(path.nodes, vec![1]);
        assert_eq!(path.cost, 0.0);
    }

    #[test]
    fn unreachable_goal_is_empty_without_closest() {
        let mesh = two_islands();
        assert!(find_path(&mesh, 0, 4, PathOptions::EXACT).is_empty());
    }

    #[test]
    fn closest_fallback_ends_nearest_to_goal() {
        let mesh = two_islands();
        let path = find_path(&mesh, 0, 4, PathOptions::CLOSEST);
        // Node 2 (x=200) is the start component's node nearest x=600.
        assert_eq!(path.nodes, vec![0, 1, 2]);
        assert_eq!(path.cost, 200.0);
    }

    #[test]
    fn closest_fallback_from_isolated_start_is_just_start() {
        let mut mesh = two_islands();
        let lone = mesh.add_node(Point::new(-100.0, 0.0), NodeKind::Landing, 9);
        let path = find_path(&mesh, lone, 4, PathOptions::CLOSEST);
        assert_eq!(path.nodes, vec![lone]);
    }

    #[test]
    fn missing_nodes_give_empty_paths() {
        let mesh = two_islands();
        assert!(find_path(&mesh, 42, 0, PathOptions::CLOSEST).is_empty());
        assert!(find_path(&mesh, 0, 42, PathOptions::CLOSEST).is_empty());
    }

    #[test]
    fn closures_work_as_heuristics() {
        let mesh = two_islands();
        let zero = |_: &NavNode, _: &NavNode| 0.0f32;
        let path = find_path_with(&mesh, 0, 2, &zero, PathOptions::EXACT);
        assert_eq!(path.nodes, vec![0, 1, 2]);
    }
}
