//! A single-ledger proof-of-work node.
//!
//! The node keeps an append-only chain plus a pool of pending transactions,
//! seals blocks with a brute-force proof search, and reconciles with peers by
//! adopting the longest valid chain any of them holds.

pub mod api;
pub mod blockchain;
pub mod config;
pub mod consensus;
pub mod network;
pub mod node;
pub mod transaction;

pub use config::NodeConfig;
pub use node::Node;
