pub mod block;
pub mod hash;
pub mod model;
pub mod pow;

pub use block::Block;
pub use hash::hash_block;
pub use model::{Blockchain, MiningError};
pub use pow::{CancelFlag, CancelOnDrop, PowError, SearchLimits, valid_proof};

/// Default Proof-of-Work difficulty (number of leading hex zeros).
pub const DEFAULT_DIFFICULTY: usize = 4;

/// Hex digits in a SHA-256 digest; no proof can satisfy a higher difficulty.
pub const MAX_DIFFICULTY: usize = 64;

/// Proof stored in the genesis block; the first mined proof builds on it.
pub const GENESIS_PROOF: u64 = 100;

/// Placeholder `previous_hash` of the genesis block. Not a real digest.
pub const GENESIS_PREVIOUS_HASH: &str = "1";

/// Coins minted to the miner of each block.
pub const MINING_REWARD: i64 = 1;
