// Simulated peer-to-peer layer

mod message;
mod node;
mod graph;
mod propagation;

pub use message::{Command, Envelope, Event, Payload, PayloadKind};
pub use node::{Node, NodeId, Position};
pub use graph::{ConnectionGraph, GraphLimits};
pub use propagation::Propagation;
