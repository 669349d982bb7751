// Adaptive mining scheduler

use crate::core::Block;
use crate::network::{Node, NodeId};
use crate::sim::SimConfig;
use rand::Rng;

/// In-flight mining attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MiningAttempt {
    pub node: NodeId,
    pub started_ms: u64,
}

/// Result of one scheduler slice
#[derive(Debug, Clone, PartialEq)]
pub enum SliceOutcome {
    /// Interval not yet elapsed, or no nodes
    Idle,
    /// Attempt still running
    Searching,
    Solved { node: NodeId, block: Block },
    /// Attempt hit its cap or lost its node; the block is discarded
    Abandoned { node: NodeId },
}

/// Elects a node every `event_interval_ms` and drives its miner a few
/// nonce trials per tick. The interval shrinks when blocks arrive slower
/// than the target spacing and grows when they arrive faster.
#[derive(Debug)]
pub struct MiningScheduler {
    event_interval_ms: u64,
    last_election_ms: u64,
    last_mined_ms: u64,
    attempt: Option<MiningAttempt>,

    difficulty: usize,
    min_interval_ms: u64,
    max_interval_ms: u64,
    interval_step_ms: u64,
    target_block_time_ms: u64,
    max_attempts: u64,
    attempts_per_slice: u64,
}

impl MiningScheduler {
    pub fn new(config: &SimConfig, now_ms: u64) -> Self {
        Self {
            event_interval_ms: config.initial_interval_ms,
            last_election_ms: now_ms,
            last_mined_ms: now_ms,
            attempt: None,
            difficulty: config.difficulty,
            min_interval_ms: config.min_interval_ms,
            max_interval_ms: config.max_interval_ms,
            interval_step_ms: config.interval_step_ms,
            target_block_time_ms: config.target_block_time_ms,
            max_attempts: config.max_attempts,
            attempts_per_slice: config.attempts_per_slice,
        }
    }

    pub fn event_interval_ms(&self) -> u64 {
        self.event_interval_ms
    }

    pub fn attempt(&self) -> Option<&MiningAttempt> {
        self.attempt.as_ref()
    }

    /// Run one slice of scheduling work
    pub fn poll<R: Rng>(&mut self, now_ms: u64, nodes: &mut [Node], rng: &mut R) -> SliceOutcome {
        if self.attempt.is_none() && !self.start_attempt(now_ms, nodes, rng) {
            return SliceOutcome::Idle;
        }

        let Some(attempt) = self.attempt.clone() else {
            return SliceOutcome::Idle;
        };

        let Some(node) = nodes.iter_mut().find(|n| n.id == attempt.node) else {
            log::warn!(
                "Mining node {} left the network {} ms into its attempt, abandoning",
                attempt.node,
                now_ms.saturating_sub(attempt.started_ms)
            );
            self.attempt = None;
            return SliceOutcome::Abandoned { node: attempt.node };
        };

        for _ in 0..self.attempts_per_slice {
            match node.miner.mine_next_block() {
                Ok(Some(block)) => {
                    log::debug!(
                        "{} solved height {} in {} ms",
                        attempt.node,
                        block.height,
                        now_ms.saturating_sub(attempt.started_ms)
                    );
                    self.attempt = None;
                    self.record_success(now_ms);
                    return SliceOutcome::Solved { node: attempt.node, block };
                }
                Ok(None) => {}
                Err(e) => {
                    log::error!("Mining on {} failed: {}", attempt.node, e);
                    self.attempt = None;
                    return SliceOutcome::Abandoned { node: attempt.node };
                }
            }

            if node.miner.attempts() >= self.max_attempts {
                node.miner.abandon();
                self.attempt = None;
                log::debug!("{} gave up after {} attempts", attempt.node, self.max_attempts);
                return SliceOutcome::Abandoned { node: attempt.node };
            }
        }

        SliceOutcome::Searching
    }

    /// Elect a node and hand it a fresh block if the interval has elapsed
    fn start_attempt<R: Rng>(&mut self, now_ms: u64, nodes: &mut [Node], rng: &mut R) -> bool {
        if nodes.is_empty() || now_ms.saturating_sub(self.last_election_ms) < self.event_interval_ms {
            return false;
        }
        self.last_election_ms = now_ms;

        let index = rng.gen_range(0..nodes.len());
        let node = &mut nodes[index];
        let txs = node.mempool.get_all_txs().to_vec();
        let block = node.blockchain.create_empty_block(txs, self.difficulty, now_ms);
        log::debug!(
            "Elected {} to mine height {} with {} txs",
            node.id,
            block.height,
            block.transaction_count
        );
        node.miner.set_next_block_to_mine(block);

        self.attempt = Some(MiningAttempt {
            node: node.id.clone(),
            started_ms: now_ms,
        });
        true
    }

    fn record_success(&mut self, now_ms: u64) {
        let since_last = now_ms.saturating_sub(self.last_mined_ms);
        self.last_mined_ms = now_ms;

        let previous = self.event_interval_ms;
        if since_last > self.target_block_time_ms {
            self.event_interval_ms = previous
                .saturating_sub(self.interval_step_ms)
                .max(self.min_interval_ms);
        } else if since_last < self.target_block_time_ms {
            self.event_interval_ms = (previous + self.interval_step_ms).min(self.max_interval_ms);
        }

        if previous != self.event_interval_ms {
            log::info!(
                "Block after {} ms, mining interval {} -> {} ms",
                since_last,
                previous,
                self.event_interval_ms
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::Position;
    use crate::wallet::KeyPair;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn nodes(count: u32) -> Vec<Node> {
        (0..count)
            .map(|i| Node::new(NodeId::from_index(i), Position::default(), KeyPair::generate(), false))
            .collect()
    }

    fn config(difficulty: usize) -> SimConfig {
        SimConfig {
            difficulty,
            ..SimConfig::default()
        }
    }

    #[test]
    fn test_idle_before_interval() {
        let mut scheduler = MiningScheduler::new(&config(1), 0);
        let mut nodes = nodes(3);
        let mut rng = StdRng::seed_from_u64(1);

        assert_eq!(scheduler.poll(3499, &mut nodes, &mut rng), SliceOutcome::Idle);
        assert!(scheduler.attempt().is_none());
    }

    #[test]
    fn test_idle_without_nodes() {
        let mut scheduler = MiningScheduler::new(&config(1), 0);
        let mut rng = StdRng::seed_from_u64(1);
        assert_eq!(scheduler.poll(10_000, &mut [], &mut rng), SliceOutcome::Idle);
    }

    #[test]
    fn test_attempt_abandoned_at_cap() {
        // Unreachable difficulty: every attempt runs out
        let mut scheduler = MiningScheduler::new(&config(64), 0);
        let mut nodes = nodes(2);
        let mut rng = StdRng::seed_from_u64(2);

        let mut outcome = scheduler.poll(3500, &mut nodes, &mut rng);
        let mut ticks = 1;
        while outcome == SliceOutcome::Searching {
            outcome = scheduler.poll(3500, &mut nodes, &mut rng);
            ticks += 1;
        }

        assert!(matches!(outcome, SliceOutcome::Abandoned { .. }));
        // 100 attempts at 2 per slice
        assert_eq!(ticks, 50);
        assert!(nodes.iter().all(|n| n.miner.current_block().is_none()));

        // Next election waits for the interval again
        assert_eq!(scheduler.poll(3600, &mut nodes, &mut rng), SliceOutcome::Idle);
    }

    #[test]
    fn test_removed_node_abandons_attempt() {
        let mut scheduler = MiningScheduler::new(&config(64), 0);
        let mut nodes = nodes(1);
        let mut rng = StdRng::seed_from_u64(3);

        assert_eq!(scheduler.poll(3500, &mut nodes, &mut rng), SliceOutcome::Searching);
        assert_eq!(scheduler.attempt().map(|a| a.started_ms), Some(3500));
        nodes.clear();
        assert_eq!(
            scheduler.poll(3550, &mut nodes, &mut rng),
            SliceOutcome::Abandoned { node: NodeId::from_index(0) }
        );
        assert!(scheduler.attempt().is_none());
    }

    #[test]
    fn test_solved_block_and_interval_backoff() {
        // Difficulty 0 solves on the first trial
        let mut scheduler = MiningScheduler::new(&config(0), 0);
        let mut nodes = nodes(2);
        let mut rng = StdRng::seed_from_u64(4);

        // Fast block: interval grows
        match scheduler.poll(4000, &mut nodes, &mut rng) {
            SliceOutcome::Solved { block, .. } => assert!(block.hash.is_some()),
            other => panic!("unexpected outcome {:?}", other),
        }
        assert_eq!(scheduler.event_interval_ms(), 4000);

        // Slow block (> 15 s since the previous one): interval shrinks
        assert!(matches!(
            scheduler.poll(20_000, &mut nodes, &mut rng),
            SliceOutcome::Solved { .. }
        ));
        assert_eq!(scheduler.event_interval_ms(), 3500);
    }

    #[test]
    fn test_interval_bounds() {
        let cfg = SimConfig {
            difficulty: 0,
            initial_interval_ms: 500,
            ..SimConfig::default()
        };
        let mut scheduler = MiningScheduler::new(&cfg, 0);
        scheduler.record_success(100_000);
        assert_eq!(scheduler.event_interval_ms(), 500);

        let cfg = SimConfig {
            initial_interval_ms: 20_000,
            ..SimConfig::default()
        };
        let mut scheduler = MiningScheduler::new(&cfg, 0);
        scheduler.record_success(1);
        assert_eq!(scheduler.event_interval_ms(), 20_000);
    }
}
