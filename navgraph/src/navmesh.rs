/*!
The navigation graph: typed nodes and directed, typed edges, keyed by id.

A `Navmesh` is pure data. It is produced wholesale by [`crate::builder::build_navmesh`]
for one obstacle snapshot and never patched afterwards; the next snapshot produces
a new generation with its own ids.

Invariants
- Node and edge ids are unique within one generation.
- Both endpoints of every edge exist; there are no self-loops.
- `walk`, `step` and `hang` edges are stored as two directed records with the
  same kind and cost.
*/

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::flags::{BitmaskFlags, FlagBitmask};
use crate::geometry::{ObstacleId, Point};

pub type NodeId = u32;
pub type EdgeId = u32;
pub type ComponentId = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NodeKind {
    /// Endpoints of a walkable segment on an obstacle top.
    PlatformLeft,
    PlatformRight,
    /// Endpoints of a grabbable segment on an obstacle underside.
    HangLeft,
    HangRight,
    /// Synthesized mid-segment target of a jump or drop.
    Landing,
}

impl NodeKind {
    #[inline]
    pub fn is_platform(self) -> bool {
        matches!(self, NodeKind::PlatformLeft | NodeKind::PlatformRight)
    }

    #[inline]
    pub fn is_hang(self) -> bool {
        matches!(self, NodeKind::HangLeft | NodeKind::HangRight)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavNode {
    pub id: NodeId,
    pub position: Point,
    pub kind: NodeKind,
    /// Obstacle whose surface this node lies on.
    pub owner: ObstacleId,
    /// Set by component labeling.
    pub component: Option<ComponentId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
#[repr(u8)]
pub enum EdgeKind {
    Walk,
    Step,
    Hang,
    Drop,
    Climb,
    Attach,
    Jump,
}

impl EdgeKind {
    /// Kinds that always come in symmetric pairs.
    #[inline]
    pub fn is_bidirectional(self) -> bool {
        matches!(self, EdgeKind::Walk | EdgeKind::Step | EdgeKind::Hang)
    }

    /// Traversing this edge starts with a jump impulse.
    #[inline]
    pub fn needs_jump(self) -> bool {
        matches!(self, EdgeKind::Jump | EdgeKind::Climb)
    }
}

impl FlagBitmask for EdgeKind {
    type Storage = u8;

    fn bit_index(&self) -> u8 {
        *self as u8
    }
}

/// A set of edge kinds.
pub type EdgeKinds = BitmaskFlags<u8>;

/// Edge kinds that define connected components. Everything except `jump`.
pub fn locomotion_edges() -> EdgeKinds {
    EdgeKinds::of(&[
        EdgeKind::Walk,
        EdgeKind::Step,
        EdgeKind::Drop,
        EdgeKind::Hang,
        EdgeKind::Climb,
        EdgeKind::Attach,
    ])
}

#[derive(Clone, Debug, PartialEq)]
pub struct NavEdge {
    pub id: EdgeId,
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
    pub cost: f32,
}

#[derive(Clone, Debug, Default)]
pub struct Navmesh {
    nodes: BTreeMap<NodeId, NavNode>,
    edges: BTreeMap<EdgeId, NavEdge>,
    /// Outgoing edge ids per node, in insertion order.
    outgoing: HashMap<NodeId, Vec<EdgeId>>,
    next_node_id: NodeId,
    next_edge_id: EdgeId,
    component_count: u32,
}

impl Navmesh {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Construction (builder only) ---

    pub(crate) fn add_node(&mut self, position: Point, kind: NodeKind, owner: ObstacleId) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        self.nodes.insert(
            id,
            NavNode {
                id,
                position,
                kind,
                owner,
                component: None,
            },
        );
        id
    }

    /// Add one directed edge. Self-loops and dangling endpoints are refused.
    pub(crate) fn add_edge(
        &mut self,
        from: NodeId,
        to: NodeId,
        kind: EdgeKind,
        cost: f32,
    ) -> Option<EdgeId> {
        if from == to || !self.nodes.contains_key(&from) || !self.nodes.contains_key(&to) {
            return None;
        }
        let id = self.next_edge_id;
        self.next_edge_id += 1;
        self.edges.insert(
            id,
            NavEdge {
                id,
                from,
                to,
                kind,
                cost,
            },
        );
        self.outgoing.entry(from).or_default().push(id);
        Some(id)
    }

    /// Add a symmetric pair of edges with the same kind and cost.
    pub(crate) fn add_bidirectional(
        &mut self,
        a: NodeId,
        b: NodeId,
        kind: EdgeKind,
        cost: f32,
    ) -> Option<(EdgeId, EdgeId)> {
        let ab = self.add_edge(a, b, kind, cost)?;
        let ba = self.add_edge(b, a, kind, cost)?;
        Some((ab, ba))
    }

    pub(crate) fn set_component(&mut self, id: NodeId, component: ComponentId) {
        if let Some(node) = self.nodes.get_mut(&id) {
            node.component = Some(component);
        }
    }

    pub(crate) fn set_component_count(&mut self, count: u32) {
        self.component_count = count;
    }

    // --- Queries ---

    #[inline]
    pub fn node(&self, id: NodeId) -> Option<&NavNode> {
        self.nodes.get(&id)
    }

    /// Nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &NavNode> {
        self.nodes.values()
    }

    /// Edges in id order.
    pub fn edges(&self) -> impl Iterator<Item = &NavEdge> {
        self.edges.values()
    }

    /// All edges leaving `id`. Empty for unknown ids.
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = &NavEdge> {
        self.outgoing
            .get(&id)
            .into_iter()
            .flatten()
            .filter_map(|eid| self.edges.get(eid))
    }

    /// Cheapest edge from `from` to `to`, if any.
    pub fn edge_between(&self, from: NodeId, to: NodeId) -> Option<&NavEdge> {
        self.neighbors(from)
            .filter(|e| e.to == to)
            .min_by(|a, b| a.cost.total_cmp(&b.cost))
    }

    /// Is there an edge of `kind` between `a` and `b`, in either direction?
    pub fn has_edge_kind_between(&self, a: NodeId, b: NodeId, kind: EdgeKind) -> bool {
        self.neighbors(a).any(|e| e.to == b && e.kind == kind)
            || self.neighbors(b).any(|e| e.to == a && e.kind == kind)
    }

    pub fn component_of(&self, id: NodeId) -> Option<ComponentId> {
        self.node(id).and_then(|n| n.component)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn component_count(&self) -> u32 {
        self.component_count
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node closest to `point` (Euclidean).
    pub fn nearest_node(&self, point: Point) -> Option<&NavNode> {
        self.nearest_node_where(point, |_| true)
    }

    /// Node closest to `point` among those accepted by `predicate`.
    pub fn nearest_node_where(
        &self,
        point: Point,
        mut predicate: impl FnMut(&NavNode) -> bool,
    ) -> Option<&NavNode> {
        self.nodes
            .values()
            .filter(|n| predicate(n))
            .min_by(|a, b| {
                let da = (a.position - point).norm_squared();
                let db = (b.position - point).norm_squared();
                da.total_cmp(&db)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn refuses_self_loops_and_dangling_edges() {
        let mut mesh = Navmesh::new();
        let a = mesh.add_node(Point::new(0.0, 0.0), NodeKind::PlatformLeft, 1);
        assert!(mesh.add_edge(a, a, EdgeKind::Walk, 1.0).is_none());
        assert!(mesh.add_edge(a, 99, EdgeKind::Walk, 1.0).is_none());
        assert_eq!(mesh.edge_count(), 0);
    }

    #[test]
    fn bidirectional_pairs_are_symmetric() {
        let mut mesh = Navmesh::new();
        let a = mesh.add_node(Point::new(0.0, 0.0), NodeKind::PlatformLeft, 1);
        let b = mesh.add_node(Point::new(10.0, 0.0), NodeKind::PlatformRight, 1);
        mesh.add_bidirectional(a, b, EdgeKind::Walk, 10.0).unwrap();

        let ab = mesh.edge_between(a, b).unwrap();
        let ba = mesh.edge_between(b, a).unwrap();
        assert_eq!(ab.kind, ba.kind);
        assert_eq!(ab.cost, ba.cost);
        assert!(mesh.has_edge_kind_between(b, a, EdgeKind::Walk));
        assert!(!mesh.has_edge_kind_between(a, b, EdgeKind::Step));
    }

    #[test]
    fn neighbors_of_unknown_node_is_empty() {
        let mesh = Navmesh::new();
        assert_eq!(mesh.neighbors(42).count(), 0);
    }

    #[test]
    fn nearest_node_where_filters() {
        let mut mesh = Navmesh::new();
        let a = mesh.add_node(Point::new(0.0, 0.0), NodeKind::PlatformLeft, 1);
        let b = mesh.add_node(Point::new(100.0, 0.0), NodeKind::HangLeft, 2);
        let probe = Point::new(10.0, 0.0);
        assert_eq!(mesh.nearest_node(probe).map(|n| n.id), Some(a));
        assert_eq!(
            mesh.nearest_node_where(probe, |n| n.kind.is_hang())
                .map(|n| n.id),
            Some(b)
        );
    }

    #[test]
    fn locomotion_set_excludes_jump() {
        let set = locomotion_edges();
        assert!(set.has(EdgeKind::Walk));
        assert!(set.has(EdgeKind::Attach));
        assert!(!set.has(EdgeKind::Jump));
    }
}
