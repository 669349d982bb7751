// Peer adjacency between simulated nodes

use crate::network::{Node, NodeId};
use std::collections::{BTreeMap, BTreeSet};

/// Limits applied when the graph is rebuilt
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GraphLimits {
    /// Peers a node reaches out to per rebuild
    pub max_new_connections: usize,
    /// Hard cap on a node's degree
    pub max_connections: usize,
    /// Maximum distance for a connection, in display units
    pub radius: f64,
}

impl Default for GraphLimits {
    fn default() -> Self {
        Self {
            max_new_connections: 6,
            max_connections: 8,
            radius: 200.0,
        }
    }
}

/// Undirected peer graph holding node identifiers only
#[derive(Debug, Default)]
pub struct ConnectionGraph {
    edges: BTreeMap<NodeId, BTreeSet<NodeId>>,
}

impl ConnectionGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect two nodes on both ends.
    /// Self-connections and existing edges are no-ops returning `false`.
    pub fn connect(&mut self, a: &NodeId, b: &NodeId) -> bool {
        if a == b || self.are_connected(a, b) {
            return false;
        }
        self.edges.entry(a.clone()).or_default().insert(b.clone());
        self.edges.entry(b.clone()).or_default().insert(a.clone());
        true
    }

    pub fn are_connected(&self, a: &NodeId, b: &NodeId) -> bool {
        self.edges.get(a).is_some_and(|peers| peers.contains(b))
    }

    /// Direct peers of `id`, in stable order
    pub fn peers(&self, id: &NodeId) -> Vec<NodeId> {
        self.edges
            .get(id)
            .map(|peers| peers.iter().cloned().collect())
            .unwrap_or_default()
    }

    pub fn degree(&self, id: &NodeId) -> usize {
        self.edges.get(id).map_or(0, |peers| peers.len())
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(|peers| peers.len()).sum::<usize>() / 2
    }

    pub fn clear(&mut self) {
        self.edges.clear();
    }

    /// Rebuild from scratch: each node links to its nearest unconnected
    /// peers within the radius, respecting both ends' degree cap
    pub fn rebuild(&mut self, nodes: &[Node], limits: GraphLimits) {
        self.clear();

        for node in nodes {
            let mut candidates: Vec<(f64, &NodeId)> = nodes
                .iter()
                .filter(|other| other.id != node.id && !self.are_connected(&node.id, &other.id))
                .map(|other| (node.position.distance(&other.position), &other.id))
                .filter(|(distance, _)| *distance <= limits.radius)
                .collect();
            candidates.sort_by(|a, b| a.0.total_cmp(&b.0));

            let mut made = 0;
            for (_, peer) in candidates {
                if made >= limits.max_new_connections || self.degree(&node.id) >= limits.max_connections {
                    break;
                }
                if self.degree(peer) >= limits.max_connections {
                    continue;
                }
                if self.connect(&node.id, peer) {
                    made += 1;
                }
            }
        }

        log::info!(
            "Rebuilt connection graph: {} nodes, {} edges",
            nodes.len(),
            self.edge_count()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Position;
    use crate::wallet::KeyPair;

    fn node_at(index: u32, x: f64, y: f64) -> Node {
        Node::new(NodeId::from_index(index), Position::new(x, y), KeyPair::generate(), false)
    }

    #[test]
    fn test_connect_symmetric_and_idempotent() {
        let mut graph = ConnectionGraph::new();
        let a = NodeId::from_index(0);
        let b = NodeId::from_index(1);

        assert!(graph.connect(&a, &b));
        assert!(graph.are_connected(&a, &b));
        assert!(graph.are_connected(&b, &a));
        assert!(!graph.connect(&b, &a));
        assert!(!graph.connect(&a, &a));
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn test_radius_respected() {
        let nodes = vec![node_at(0, 0.0, 0.0), node_at(1, 150.0, 0.0), node_at(2, 500.0, 0.0)];
        let mut graph = ConnectionGraph::new();
        graph.rebuild(&nodes, GraphLimits::default());

        assert!(graph.are_connected(&nodes[0].id, &nodes[1].id));
        assert_eq!(graph.degree(&nodes[2].id), 0);
    }

    #[test]
    fn test_degree_cap() {
        // Tight cluster: everyone is in range of everyone
        let nodes: Vec<Node> = (0..20)
            .map(|i| node_at(i, (i % 5) as f64 * 10.0, (i / 5) as f64 * 10.0))
            .collect();
        let mut graph = ConnectionGraph::new();
        graph.rebuild(&nodes, GraphLimits::default());

        for node in &nodes {
            assert!(graph.degree(&node.id) <= 8);
            assert!(graph.degree(&node.id) > 0);
        }
    }

    #[test]
    fn test_nearest_first() {
        let nodes = vec![
            node_at(0, 0.0, 0.0),
            node_at(1, 100.0, 0.0),
            node_at(2, 10.0, 0.0),
        ];
        let limits = GraphLimits {
            max_new_connections: 1,
            max_connections: 1,
            radius: 200.0,
        };
        let mut graph = ConnectionGraph::new();
        graph.rebuild(&nodes, limits);

        assert!(graph.are_connected(&nodes[0].id, &nodes[2].id));
        assert!(!graph.are_connected(&nodes[0].id, &nodes[1].id));
    }

    #[test]
    fn test_rebuild_starts_fresh() {
        let nodes = vec![node_at(0, 0.0, 0.0), node_at(1, 10.0, 0.0)];
        let mut graph = ConnectionGraph::new();
        graph.connect(&NodeId::from_index(7), &NodeId::from_index(8));
        graph.rebuild(&nodes, GraphLimits::default());

        assert_eq!(graph.edge_count(), 1);
        assert!(graph.peers(&NodeId::from_index(7)).is_empty());
    }
}
