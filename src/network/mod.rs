pub mod client;
pub mod peers;

pub use client::{CHAIN_PATH, ChainSnapshot, ChainSource, FetchError, HttpChainSource};
pub use peers::{PeerError, PeerRegistry};
