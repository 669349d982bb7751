// Flooding of transactions and blocks over the peer graph

use crate::network::{ConnectionGraph, Envelope, Node, NodeId, Payload};

/// Single-hop flooding. A receiving node that accepts a payload floods it
/// again as a new event, so coverage spreads hop by hop.
pub struct Propagation;

impl Propagation {
    /// One envelope per direct peer of `from`, skipping `except`
    /// (normally the peer the payload just arrived from)
    pub fn offer(
        graph: &ConnectionGraph,
        from: &NodeId,
        payload: &Payload,
        except: Option<&NodeId>,
    ) -> Vec<Envelope> {
        graph
            .peers(from)
            .into_iter()
            .filter(|peer| Some(peer) != except)
            .map(|to| Envelope {
                from: from.clone(),
                to,
                payload: payload.clone(),
            })
            .collect()
    }

    /// Apply a delivered payload to its destination node.
    /// Returns whether the node took it (and should flood it onward).
    pub fn apply(node: &mut Node, payload: &Payload) -> bool {
        match payload {
            Payload::Tx(tx) => node.accept_tx(tx.clone()),
            Payload::Block(block) => node.accept_block(block),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Block, Hash256};
    use crate::network::Position;
    use crate::wallet::KeyPair;

    fn line() -> (ConnectionGraph, Vec<NodeId>) {
        let ids: Vec<NodeId> = (0..3).map(NodeId::from_index).collect();
        let mut graph = ConnectionGraph::new();
        graph.connect(&ids[0], &ids[1]);
        graph.connect(&ids[1], &ids[2]);
        (graph, ids)
    }

    fn mined_block() -> Block {
        let mut block = Block::new(None, 0, vec![], 1, 0);
        block.hash = Some(Hash256::new([4; 32]));
        block
    }

    #[test]
    fn test_offer_reaches_direct_peers_only() {
        let (graph, ids) = line();
        let payload = Payload::Block(mined_block());

        let envelopes = Propagation::offer(&graph, &ids[0], &payload, None);
        assert_eq!(envelopes.len(), 1);
        assert_eq!(envelopes[0].to, ids[1]);
        assert_eq!(envelopes[0].from, ids[0]);
    }

    #[test]
    fn test_offer_skips_sender() {
        let (graph, ids) = line();
        let payload = Payload::Block(mined_block());

        let envelopes = Propagation::offer(&graph, &ids[1], &payload, Some(&ids[0]));
        let targets: Vec<_> = envelopes.iter().map(|e| e.to.clone()).collect();
        assert_eq!(targets, vec![ids[2].clone()]);
    }

    #[test]
    fn test_apply_block_once() {
        let mut node = Node::new(NodeId::from_index(0), Position::default(), KeyPair::generate(), false);
        let payload = Payload::Block(mined_block());

        assert!(Propagation::apply(&mut node, &payload));
        assert!(!Propagation::apply(&mut node, &payload));
        assert_eq!(node.blockchain.height(), 1);
    }
}
