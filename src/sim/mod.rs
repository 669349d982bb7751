// Simulation driver: owns the nodes, peer graph and global ledger

mod config;
mod scheduler;

pub use config::SimConfig;
pub use scheduler::{MiningAttempt, MiningScheduler, SliceOutcome};

use crate::core::{Amount, Block};
use crate::network::{Command, ConnectionGraph, Envelope, Event, Node, NodeId, Payload, Position, Propagation};
use crate::storage::UtxoSet;
use crate::wallet::{KeyPair, WalletError};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;
use std::collections::VecDeque;

/// Nonce trials before genesis mining gives up
const GENESIS_TRIAL_LIMIT: u64 = 16_000_000;

/// Envelope waiting out its transit time
#[derive(Debug, Clone)]
struct InTransit {
    due_ms: u64,
    envelope: Envelope,
}

/// Per-node snapshot for reporting
#[derive(Debug, Clone, Serialize)]
pub struct NodeSummary {
    pub id: NodeId,
    pub address: String,
    pub balance: Amount,
    pub utxos: usize,
    pub chain_height: usize,
    pub mempool: usize,
    pub peers: usize,
}

/// Single-threaded simulation, advanced by `tick` from a host loop.
/// All state changes within one tick run to completion.
pub struct Simulation {
    config: SimConfig,
    nodes: Vec<Node>,
    graph: ConnectionGraph,
    utxo_set: UtxoSet,
    scheduler: MiningScheduler,
    rng: StdRng,
    in_transit: VecDeque<InTransit>,
    events: Vec<Event>,
    genesis: Option<Block>,
    next_node_index: u32,
    now_ms: u64,
    last_random_send_ms: u64,
}

impl Simulation {
    /// Build the network and mine its genesis block
    pub fn new(config: SimConfig) -> Result<Self, String> {
        config.validate()?;

        let rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        let mut sim = Self {
            scheduler: MiningScheduler::new(&config, 0),
            nodes: Vec::new(),
            graph: ConnectionGraph::new(),
            utxo_set: UtxoSet::new(),
            rng,
            in_transit: VecDeque::new(),
            events: Vec::new(),
            genesis: None,
            next_node_index: 0,
            now_ms: 0,
            last_random_send_ms: 0,
            config,
        };

        sim.set_node_count(sim.config.node_count)?;
        Ok(sim)
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, id: &NodeId) -> Option<&Node> {
        self.nodes.iter().find(|n| &n.id == id)
    }

    pub fn graph(&self) -> &ConnectionGraph {
        &self.graph
    }

    pub fn utxo_set(&self) -> &UtxoSet {
        &self.utxo_set
    }

    pub fn genesis(&self) -> Option<&Block> {
        self.genesis.as_ref()
    }

    pub fn event_interval_ms(&self) -> u64 {
        self.scheduler.event_interval_ms()
    }

    pub fn mining_attempt(&self) -> Option<&MiningAttempt> {
        self.scheduler.attempt()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_deliveries(&self) -> usize {
        self.in_transit.len()
    }

    /// Take all events published since the last drain
    pub fn drain_events(&mut self) -> Vec<Event> {
        std::mem::take(&mut self.events)
    }

    /// Handle an inbound command
    pub fn dispatch(&mut self, command: Command) -> Result<(), String> {
        match command {
            Command::SetNodeCount(count) => self.set_node_count(count),
            Command::RandSend { from, to, units } => {
                self.send(&from, &to, units);
                Ok(())
            }
        }
    }

    /// Advance the simulation clock to `now_ms`
    pub fn tick(&mut self, now_ms: u64) {
        self.now_ms = now_ms;

        self.deliver_due();
        self.maybe_random_send();

        match self.scheduler.poll(now_ms, &mut self.nodes, &mut self.rng) {
            SliceOutcome::Solved { node, block } => self.finish_mined_block(&node, block),
            SliceOutcome::Idle | SliceOutcome::Searching | SliceOutcome::Abandoned { .. } => {}
        }
    }

    /// Apply one envelope to its destination now. Returns whether the
    /// destination took the payload.
    pub fn deliver(&mut self, envelope: Envelope) -> bool {
        let Envelope { from, to, payload } = envelope;

        let Some(node) = self.nodes.iter_mut().find(|n| n.id == to) else {
            log::debug!(
                "Dropping {} {:?} for departed node {}",
                payload.kind().as_str(),
                payload.hash().map(|h| h.to_hex()),
                to
            );
            return false;
        };

        if !Propagation::apply(node, &payload) {
            return false;
        }

        let event = match &payload {
            Payload::Tx(tx) => Event::NewTx {
                origin_id: to.clone(),
                tx: tx.clone(),
            },
            Payload::Block(block) => Event::FwdBlock {
                block: block.clone(),
                from_addr: node.address().clone(),
            },
        };
        self.events.push(event);
        self.flood(&to, payload, Some(&from));
        true
    }

    /// Grow or shrink the network, then rebuild the peer graph
    pub fn set_node_count(&mut self, count: usize) -> Result<(), String> {
        let current = self.nodes.len();
        if count == current {
            return Ok(());
        }

        if count > current {
            for _ in current..count {
                let node = self.spawn_node();
                self.nodes.push(node);
            }
            if self.genesis.is_none() {
                self.mine_genesis()?;
            }
        } else {
            for node in self.nodes.drain(count..) {
                log::debug!("Removing node {}", node.id);
            }
        }

        self.graph.rebuild(&self.nodes, self.config.graph_limits());
        log::info!("Network resized from {} to {} nodes", current, count);
        Ok(())
    }

    /// Build, admit and flood a transfer. Insufficient funds are dropped.
    pub fn send(&mut self, from: &NodeId, to: &NodeId, units: Amount) -> bool {
        let Some(recipient) = self.node(to).map(|n| n.address().clone()) else {
            log::debug!("Send to unknown node {}", to);
            return false;
        };
        let Some(sender) = self.nodes.iter_mut().find(|n| &n.id == from) else {
            log::debug!("Send from unknown node {}", from);
            return false;
        };

        let tx = match sender.wallet.create_tx(units, &recipient) {
            Ok(tx) => tx,
            Err(WalletError::InsufficientFunds { balance, needed }) => {
                log::debug!("{} cannot send {}: has {}, needs {}", from, units, balance, needed);
                return false;
            }
            Err(e) => {
                log::debug!("{} cannot send {}: {}", from, units, e);
                return false;
            }
        };

        if !sender.accept_tx(tx.clone()) {
            return false;
        }

        log::debug!("{} sent {} to {} in tx {}", from, units, to, tx.hash);
        self.events.push(Event::NewTx {
            origin_id: from.clone(),
            tx: tx.clone(),
        });
        self.flood(from, Payload::Tx(tx), None);
        true
    }

    /// Per-node snapshots
    pub fn summary(&self) -> Vec<NodeSummary> {
        self.nodes
            .iter()
            .map(|n| NodeSummary {
                id: n.id.clone(),
                address: n.address().to_string(),
                balance: n.wallet.balance(),
                utxos: n.wallet.utxos().len(),
                chain_height: n.blockchain.height(),
                mempool: n.mempool.len(),
                peers: self.graph.degree(&n.id),
            })
            .collect()
    }

    fn spawn_node(&mut self) -> Node {
        let id = NodeId::from_index(self.next_node_index);
        self.next_node_index += 1;

        let position = Position::new(
            self.rng.gen_range(0.0..self.config.world_width),
            self.rng.gen_range(0.0..self.config.world_height),
        );
        let keypair = KeyPair::generate_with(&mut self.rng);
        let mut node = Node::new(id, position, keypair, self.config.strict_validation);

        if let Some(genesis) = &self.genesis {
            node.accept_block(genesis);
        }
        node
    }

    /// Mine the first block on the first node and give it to everyone
    fn mine_genesis(&mut self) -> Result<(), String> {
        let Some(first) = self.nodes.first_mut() else {
            return Ok(());
        };

        let block = first
            .blockchain
            .create_empty_block(Vec::new(), self.config.genesis_difficulty, self.now_ms);
        first.miner.set_next_block_to_mine(block);

        let mut genesis = None;
        for _ in 0..GENESIS_TRIAL_LIMIT {
            match first.miner.mine_genesis_block() {
                Ok(Some(block)) => {
                    genesis = Some(block);
                    break;
                }
                Ok(None) => {}
                Err(e) => return Err(format!("Genesis mining failed: {}", e)),
            }
        }
        let Some(genesis) = genesis else {
            first.miner.abandon();
            return Err(format!(
                "Genesis mining gave up after {} trials",
                GENESIS_TRIAL_LIMIT
            ));
        };

        self.utxo_set
            .handle_newly_mined_block(&genesis, self.nodes.iter_mut().map(|n| &mut n.wallet));
        for node in &mut self.nodes {
            node.accept_block(&genesis);
        }

        log::info!(
            "Genesis block {:?} mined by {}",
            genesis.hash.map(|h| h.to_hex()),
            self.nodes[0].id
        );
        self.genesis = Some(genesis);
        Ok(())
    }

    /// Reconcile, append and purge on the miner, then flood the block
    fn finish_mined_block(&mut self, miner_id: &NodeId, block: Block) {
        self.utxo_set
            .handle_newly_mined_block(&block, self.nodes.iter_mut().map(|n| &mut n.wallet));

        let Some(node) = self.nodes.iter_mut().find(|n| &n.id == miner_id) else {
            return;
        };
        if !node.accept_block(&block) {
            log::warn!("{} refused its own block", miner_id);
            return;
        }

        log::info!(
            "{} mined block {} at height {} ({} txs, fees {})",
            miner_id,
            block.hash.map(|h| h.to_hex()).unwrap_or_default(),
            block.height,
            block.transaction_count,
            block.reward_fees
        );

        self.events.push(Event::FwdBlock {
            block: block.clone(),
            from_addr: node.address().clone(),
        });
        self.flood(miner_id, Payload::Block(block), None);
    }

    fn flood(&mut self, from: &NodeId, payload: Payload, except: Option<&NodeId>) {
        let due_ms = self.now_ms + self.config.delivery_delay_ms;
        for envelope in Propagation::offer(&self.graph, from, &payload, except) {
            self.in_transit.push_back(InTransit { due_ms, envelope });
        }
    }

    fn deliver_due(&mut self) {
        while self
            .in_transit
            .front()
            .is_some_and(|item| item.due_ms <= self.now_ms)
        {
            if let Some(item) = self.in_transit.pop_front() {
                self.deliver(item.envelope);
            }
        }
    }

    fn maybe_random_send(&mut self) {
        let interval = self.config.random_send_interval_ms;
        if interval == 0
            || self.nodes.len() < 2
            || self.now_ms.saturating_sub(self.last_random_send_ms) < interval
        {
            return;
        }
        self.last_random_send_ms = self.now_ms;

        let max = self.config.random_send_max.to_sat();
        if max == 0 {
            return;
        }

        let from = self.rng.gen_range(0..self.nodes.len());
        let mut to = self.rng.gen_range(0..self.nodes.len() - 1);
        if to >= from {
            to += 1;
        }
        let units = Amount::from_sat(self.rng.gen_range(1..=max));

        let command = Command::RandSend {
            from: self.nodes[from].id.clone(),
            to: self.nodes[to].id.clone(),
            units,
        };
        if let Err(e) = self.dispatch(command) {
            log::debug!("Random send failed: {}", e);
        }
    }
}
