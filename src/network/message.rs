// Simulation messages: inbound commands, outbound events, peer payloads

use crate::core::{Amount, Block, BlockTx, Hash256};
use crate::network::NodeId;
use crate::wallet::Address;
use serde::Serialize;

/// Payload kinds carried between peers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Tx,
    Block,
}

impl PayloadKind {
    pub fn as_str(&self) -> &str {
        match self {
            PayloadKind::Tx => "tx",
            PayloadKind::Block => "block",
        }
    }
}

/// Data flooded from one node to a peer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", content = "data", rename_all = "camelCase")]
pub enum Payload {
    Tx(BlockTx),
    Block(Block),
}

impl Payload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Payload::Tx(_) => PayloadKind::Tx,
            Payload::Block(_) => PayloadKind::Block,
        }
    }

    /// Transaction hash or block hash
    pub fn hash(&self) -> Option<Hash256> {
        match self {
            Payload::Tx(tx) => Some(tx.hash),
            Payload::Block(block) => block.hash,
        }
    }
}

/// One hop of a flood: `payload` travelling from `from` to `to`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    pub from: NodeId,
    pub to: NodeId,
    pub payload: Payload,
}

/// Requests into the simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Grow or shrink the network to `count` active nodes
    SetNodeCount(usize),
    /// Transfer `units` from one node's wallet to another's
    RandSend { from: NodeId, to: NodeId, units: Amount },
}

/// Notifications for the presentation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum Event {
    /// A node accepted a transaction and is offering it to its peers
    #[serde(rename_all = "camelCase")]
    NewTx { origin_id: NodeId, tx: BlockTx },
    /// A node accepted a block and is forwarding it to its peers
    #[serde(rename_all = "camelCase")]
    FwdBlock { block: Block, from_addr: Address },
}

impl Event {
    pub fn kind(&self) -> PayloadKind {
        match self {
            Event::NewTx { .. } => PayloadKind::Tx,
            Event::FwdBlock { .. } => PayloadKind::Block,
        }
    }
}
