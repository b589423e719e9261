use std::time::Instant;

use log::{info, warn};
use parking_lot::{Mutex, RwLock};
use thiserror::Error;
use uuid::Uuid;

use crate::blockchain::pow::proof_of_work_bounded;
use crate::blockchain::{Block, Blockchain, MiningError, PowError, SearchLimits};
use crate::config::NodeConfig;
use crate::consensus::{self, Resolution};
use crate::network::{ChainSnapshot, ChainSource, HttpChainSource, PeerError, PeerRegistry};
use crate::transaction::Transaction;

#[derive(Debug, Error)]
pub enum MineError {
    #[error(transparent)]
    Search(#[from] PowError),
    #[error(transparent)]
    Sealing(#[from] MiningError),
}

/// One node: its ledger, its peers and its identity.
///
/// Nothing here is global, so several nodes can live in one process.
pub struct Node {
    id: String,
    config: NodeConfig,
    ledger: Mutex<Blockchain>,
    peers: RwLock<PeerRegistry>,
    source: HttpChainSource,
}

impl Node {
    pub fn new(config: NodeConfig) -> Self {
        let id = config
            .node_id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().simple().to_string());
        Self {
            ledger: Mutex::new(Blockchain::new(config.difficulty)),
            peers: RwLock::new(PeerRegistry::new()),
            source: HttpChainSource::new(config.peer_timeout()),
            id,
            config,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    pub fn difficulty(&self) -> usize {
        self.config.difficulty
    }

    /// Queue a transaction; returns the index of the block that will hold it.
    pub fn submit_transaction(&self, tx: Transaction) -> u64 {
        self.ledger.lock().new_transaction(tx)
    }

    /// Limits for a search started now, from the configured timeout.
    pub fn search_limits(&self) -> SearchLimits {
        match self.config.mining_timeout() {
            Some(t) => SearchLimits::unbounded().with_deadline(Instant::now() + t),
            None => SearchLimits::unbounded(),
        }
    }

    /// Find the next proof without holding the ledger lock, then pay the
    /// reward and seal. Fails if the tip moved during the search.
    pub fn mine(&self, limits: &SearchLimits) -> Result<Block, MineError> {
        let last_proof = self.ledger.lock().last_block().proof;
        let started = Instant::now();
        let proof = proof_of_work_bounded(last_proof, self.config.difficulty, limits)?;
        info!(
            "found proof {} on {} in {} ms",
            proof,
            last_proof,
            started.elapsed().as_millis()
        );

        let reward = Transaction::reward(self.id.clone(), self.config.reward);
        let mut bc = self.ledger.lock();
        let block = bc.mine_next(proof, last_proof, reward).map_err(|e| {
            warn!("discarding proof {proof}: {e}");
            e
        })?;
        Ok(block.clone())
    }

    /// `{chain, length}` of the local chain.
    pub fn chain_snapshot(&self) -> ChainSnapshot {
        let bc = self.ledger.lock();
        ChainSnapshot {
            chain: bc.chain().to_vec(),
            length: bc.len(),
        }
    }

    pub fn pending_snapshot(&self) -> Vec<Transaction> {
        self.ledger.lock().pending().to_vec()
    }

    pub fn is_chain_valid(&self) -> bool {
        self.ledger.lock().is_valid_chain()
    }

    /// Register every address; stops at the first malformed one.
    pub fn register_peers<I, S>(&self, addresses: I) -> Result<Vec<String>, PeerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut reg = self.peers.write();
        for netloc in reg.register_all(addresses)? {
            info!("peer registered: {netloc}");
        }
        Ok(reg.list())
    }

    pub fn peers(&self) -> Vec<String> {
        self.peers.read().list()
    }

    /// Run conflict resolution against peers over HTTP.
    pub async fn resolve(&self) -> Resolution {
        self.resolve_with(&self.source).await
    }

    pub async fn resolve_with<S: ChainSource>(&self, source: &S) -> Resolution {
        consensus::resolve(&self.ledger, &self.peers, source).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::{CancelFlag, hash_block, valid_proof};

    fn test_node(id: &str) -> Node {
        Node::new(NodeConfig {
            difficulty: 3,
            node_id: Some(id.to_string()),
            ..NodeConfig::default()
        })
    }

    #[test]
    fn mining_seals_pending_and_reward() {
        let node = test_node("miner-1");
        let genesis = node.chain_snapshot().chain[0].clone();
        assert_eq!(node.submit_transaction(Transaction::new("a", "b", 5)), 2);

        let block = node.mine(&SearchLimits::unbounded()).unwrap();
        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, hash_block(&genesis));
        assert!(valid_proof(genesis.proof, block.proof, 3));
        assert_eq!(
            block.transactions,
            vec![
                Transaction::new("a", "b", 5),
                Transaction::reward("miner-1", 1)
            ]
        );
        assert!(node.pending_snapshot().is_empty());
        assert!(node.is_chain_valid());
    }

    #[test]
    fn cancelled_mining_leaves_state_alone() {
        let node = test_node("miner-2");
        node.submit_transaction(Transaction::new("a", "b", 5));
        let flag = CancelFlag::new();
        flag.cancel();

        let err = node
            .mine(&SearchLimits::unbounded().with_cancel(flag))
            .unwrap_err();
        assert!(matches!(err, MineError::Search(PowError::Cancelled)));
        assert_eq!(node.chain_snapshot().length, 1);
        assert_eq!(node.pending_snapshot().len(), 1);
    }

    #[test]
    fn nodes_are_independent() {
        let a = test_node("a");
        let b = test_node("b");
        a.submit_transaction(Transaction::new("x", "y", 1));
        a.mine(&SearchLimits::unbounded()).unwrap();
        assert_eq!(a.chain_snapshot().length, 2);
        assert_eq!(b.chain_snapshot().length, 1);
        assert!(b.pending_snapshot().is_empty());
    }

    #[test]
    fn random_id_when_unset() {
        let node = Node::new(NodeConfig::default());
        assert_eq!(node.id().len(), 32);
        assert!(!node.id().contains('-'));
    }

    #[test]
    fn register_peers_dedups_and_reports_errors() {
        let node = test_node("n");
        let list = node
            .register_peers(["http://127.0.0.1:5001", "http://127.0.0.1:5001"])
            .unwrap();
        assert_eq!(list, vec!["127.0.0.1:5001"]);
        assert!(node.register_peers(["garbage"]).is_err());
        assert_eq!(node.peers().len(), 1);
    }

    #[test]
    fn rejected_batch_registers_no_peers() {
        let node = test_node("n");
        assert!(
            node.register_peers(["http://10.0.0.1:5000", "localhost:5000"])
                .is_err()
        );
        assert!(node.peers().is_empty());
    }

    #[test]
    fn concurrent_submissions_are_sealed_exactly_once() {
        use std::sync::Arc;
        use std::thread;

        let node = Arc::new(test_node("m"));
        let writers: Vec<_> = (0..4)
            .map(|w| {
                let node = Arc::clone(&node);
                thread::spawn(move || {
                    for i in 0..25 {
                        node.submit_transaction(Transaction::new(format!("w{w}"), "r", i));
                    }
                })
            })
            .collect();

        let miner = {
            let node = Arc::clone(&node);
            thread::spawn(move || {
                for _ in 0..3 {
                    node.mine(&SearchLimits::unbounded()).unwrap();
                }
            })
        };

        for w in writers {
            w.join().unwrap();
        }
        miner.join().unwrap();
        node.mine(&SearchLimits::unbounded()).unwrap();

        let snap = node.chain_snapshot();
        let user_txs: Vec<_> = snap
            .chain
            .iter()
            .flat_map(|b| b.transactions.iter())
            .filter(|t| !t.is_reward())
            .collect();
        assert_eq!(user_txs.len(), 100);
        assert!(node.pending_snapshot().is_empty());
        assert!(node.is_chain_valid());
    }
}
