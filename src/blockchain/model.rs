use log::{debug, info};
use thiserror::Error;

use super::Block;
use crate::consensus::valid_chain;
use crate::transaction::Transaction;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MiningError {
    #[error("chain tip moved while mining (expected last proof {expected}, found {found})")]
    StaleTip { expected: u64, found: u64 },
}

/// In-memory ledger: the chain plus the pool of transactions awaiting a block.
#[derive(Debug)]
pub struct Blockchain {
    chain: Vec<Block>,
    pending: Vec<Transaction>,
    difficulty: usize,
}

impl Blockchain {
    /// Initialize a new blockchain with a genesis block.
    pub fn new(difficulty: usize) -> Self {
        Self {
            chain: vec![Block::genesis()],
            pending: Vec::new(),
            difficulty,
        }
    }

    /// Queue a transaction; returns the index of the block that will hold it.
    pub fn new_transaction(&mut self, tx: Transaction) -> u64 {
        debug!(
            "pending += {} -> {} ({}), pool size {}",
            tx.sender,
            tx.recipient,
            tx.amount,
            self.pending.len() + 1
        );
        self.pending.push(tx);
        self.next_index()
    }

    /// Seal the whole pending pool into a new block and append it.
    ///
    /// `previous_hash` defaults to the hash of the current last block.
    pub fn new_block(&mut self, proof: u64, previous_hash: Option<String>) -> &Block {
        let previous_hash = previous_hash.unwrap_or_else(|| self.last_block().hash());
        let transactions = std::mem::take(&mut self.pending);
        let block = Block::new(self.next_index(), transactions, proof, previous_hash);
        info!(
            "sealed block #{} (proof={}, txs={})",
            block.index,
            block.proof,
            block.transactions.len()
        );
        self.chain.push(block);
        self.last_block()
    }

    /// Pay `reward` and seal, provided the tip is still the block `proof` was mined on.
    pub fn mine_next(
        &mut self,
        proof: u64,
        mined_on: u64,
        reward: Transaction,
    ) -> Result<&Block, MiningError> {
        let found = self.last_block().proof;
        if found != mined_on {
            return Err(MiningError::StaleTip {
                expected: mined_on,
                found,
            });
        }
        self.new_transaction(reward);
        Ok(self.new_block(proof, None))
    }

    /// Return the last block in the chain.
    pub fn last_block(&self) -> &Block {
        self.chain
            .last()
            .expect("Blockchain should always have at least the genesis block")
    }

    /// Swap in a whole chain. The pending pool is left untouched.
    pub fn replace_chain(&mut self, chain: Vec<Block>) -> bool {
        if chain.is_empty() {
            return false;
        }
        info!("chain replaced: {} -> {} blocks", self.chain.len(), chain.len());
        self.chain = chain;
        true
    }

    /// Validate linkage and proofs of the local chain.
    pub fn is_valid_chain(&self) -> bool {
        valid_chain(&self.chain, self.difficulty)
    }

    pub fn chain(&self) -> &[Block] {
        &self.chain
    }

    pub fn pending(&self) -> &[Transaction] {
        &self.pending
    }

    pub fn len(&self) -> usize {
        self.chain.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chain.is_empty()
    }

    pub fn difficulty(&self) -> usize {
        self.difficulty
    }

    fn next_index(&self) -> u64 {
        self.chain.len() as u64 + 1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::blockchain::pow::proof_of_work;

    const DIFF: usize = 3;

    fn mine(bc: &mut Blockchain) {
        let proof = proof_of_work(bc.last_block().proof, bc.difficulty());
        bc.new_block(proof, None);
    }

    #[test]
    fn starts_with_genesis_only() {
        let bc = Blockchain::new(DIFF);
        assert_eq!(bc.len(), 1);
        assert_eq!(bc.last_block().index, 1);
        assert!(bc.pending().is_empty());
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn new_transaction_reports_next_block_index() {
        let mut bc = Blockchain::new(DIFF);
        assert_eq!(bc.new_transaction(Transaction::new("a", "b", 5)), 2);
        assert_eq!(bc.new_transaction(Transaction::new("c", "d", 1)), 2);
        mine(&mut bc);
        assert_eq!(bc.new_transaction(Transaction::new("e", "f", 2)), 3);
    }

    #[test]
    fn sealing_drains_the_pool_exactly_once() {
        let mut bc = Blockchain::new(DIFF);
        bc.new_transaction(Transaction::new("a", "b", 5));
        bc.new_transaction(Transaction::new("b", "c", 2));
        let genesis_hash = bc.last_block().hash();

        let block = bc.new_block(1234, None).clone();
        assert_eq!(block.index, 2);
        assert_eq!(block.previous_hash, genesis_hash);
        assert_eq!(
            block.transactions,
            vec![Transaction::new("a", "b", 5), Transaction::new("b", "c", 2)]
        );
        assert!(bc.pending().is_empty());

        let next = bc.new_block(99, Some("explicit".into())).clone();
        assert!(next.transactions.is_empty());
        assert_eq!(next.previous_hash, "explicit");

        let sealed: usize = bc.chain().iter().map(|b| b.transactions.len()).sum();
        assert_eq!(sealed, 2);
    }

    #[test]
    fn sequential_mining_builds_a_valid_chain() {
        let mut bc = Blockchain::new(DIFF);
        for i in 0..4 {
            bc.new_transaction(Transaction::new("a", "b", i));
            mine(&mut bc);
        }
        assert_eq!(bc.len(), 5);
        for (i, block) in bc.chain().iter().enumerate() {
            assert_eq!(block.index, i as u64 + 1);
        }
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn mine_next_rejects_a_moved_tip() {
        let mut bc = Blockchain::new(DIFF);
        let mined_on = bc.last_block().proof;
        let proof = proof_of_work(mined_on, DIFF);
        mine(&mut bc);

        let err = bc
            .mine_next(proof, mined_on, Transaction::reward("me", 1))
            .unwrap_err();
        assert_eq!(
            err,
            MiningError::StaleTip {
                expected: mined_on,
                found: proof
            }
        );
        assert!(bc.pending().is_empty());
    }

    #[test]
    fn mine_next_appends_reward_last() {
        let mut bc = Blockchain::new(DIFF);
        bc.new_transaction(Transaction::new("a", "b", 5));
        let mined_on = bc.last_block().proof;
        let proof = proof_of_work(mined_on, DIFF);
        let block = bc
            .mine_next(proof, mined_on, Transaction::reward("me", 1))
            .unwrap()
            .clone();
        assert_eq!(block.transactions.len(), 2);
        assert!(block.transactions[1].is_reward());
        assert!(bc.is_valid_chain());
    }

    #[test]
    fn replace_chain_keeps_pending_and_refuses_empty() {
        let mut bc = Blockchain::new(DIFF);
        bc.new_transaction(Transaction::new("a", "b", 5));
        assert!(!bc.replace_chain(Vec::new()));
        assert_eq!(bc.len(), 1);

        let mut other = Blockchain::new(DIFF);
        mine(&mut other);
        assert!(bc.replace_chain(other.chain().to_vec()));
        assert_eq!(bc.len(), 2);
        assert_eq!(bc.pending().len(), 1);
    }
}
