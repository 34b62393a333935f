//! Connected-component labeling over the locomotion edge kinds.
//!
//! Connectivity is undirected: a one-way `drop` joins its endpoints into the
//! same component just like a `walk` does. Seeds are taken in node-id order, so
//! labels are deterministic for a given graph.

use std::collections::HashMap;

use crate::navmesh::{ComponentId, Navmesh, NodeId, locomotion_edges};

/// Label every node and return the number of components.
pub fn label_components(mesh: &mut Navmesh) -> u32 {
    let kinds = locomotion_edges();

    let mut adjacency: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
    for e in mesh.edges().filter(|e| kinds.has(e.kind)) {
        adjacency.entry(e.from).or_default().push(e.to);
        adjacency.entry(e.to).or_default().push(e.from);
    }

    let ids: Vec<NodeId> = mesh.nodes().map(|n| n.id).collect();
    let mut labels: HashMap<NodeId, ComponentId> = HashMap::with_capacity(ids.len());
    let mut next: ComponentId = 0;
    let mut worklist: Vec<NodeId> = Vec::new();

    for seed in ids {
        if labels.contains_key(&seed) {
            continue;
        }
        labels.insert(seed, next);
        worklist.push(seed);
        while let Some(id) = worklist.pop() {
            for &n in adjacency.get(&id).into_iter().flatten() {
                if !labels.contains_key(&n) {
                    labels.insert(n, next);
                    worklist.push(n);
                }
            }
        }
        next += 1;
    }

    for (id, component) in labels {
        mesh.set_component(id, component);
    }
    mesh.set_component_count(next);
    next
}
