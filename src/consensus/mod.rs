//! Longest-valid-chain fork choice.
//!
//! A node pulls `{chain, length}` from every registered peer and adopts the
//! longest chain that validates, provided it is strictly longer than its own.
//! Equal-length forks never replace the local chain.

use futures::future::join_all;
use log::{debug, info, warn};
use parking_lot::{Mutex, RwLock};

use crate::blockchain::{Block, Blockchain, valid_proof};
use crate::network::{ChainSnapshot, ChainSource, PeerRegistry};

/// Outcome of [`resolve`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub replaced: bool,
    /// Length of the local chain after resolution.
    pub length: usize,
}

/// Check every adjacent pair: hash linkage and proof-of-work.
///
/// The genesis block itself is not checked; its `previous_hash` is a
/// placeholder. An empty chain is invalid.
pub fn valid_chain(chain: &[Block], difficulty: usize) -> bool {
    if chain.is_empty() {
        return false;
    }
    chain.windows(2).all(|pair| {
        let (prev, cur) = (&pair[0], &pair[1]);
        if cur.previous_hash != prev.hash() {
            debug!("block #{} does not link to its predecessor", cur.index);
            return false;
        }
        if !valid_proof(prev.proof, cur.proof, difficulty) {
            debug!("block #{} carries an invalid proof", cur.index);
            return false;
        }
        true
    })
}

/// Drop snapshots that cannot win against a local chain of `floor` blocks.
///
/// Kept snapshots are longer than `floor`, report a `length` matching the
/// blocks actually sent, and validate. Input order is preserved. This hashes
/// whole chains, so run it without holding the ledger lock.
pub fn validated_candidates<I>(floor: usize, fetched: I, difficulty: usize) -> Vec<ChainSnapshot>
where
    I: IntoIterator<Item = (String, ChainSnapshot)>,
{
    fetched
        .into_iter()
        .filter(|(peer, snapshot)| {
            if snapshot.length <= floor {
                debug!("{peer}: length {} not longer than {floor}", snapshot.length);
                return false;
            }
            if snapshot.length != snapshot.chain.len() {
                warn!(
                    "{peer}: reported length {} but sent {} blocks",
                    snapshot.length,
                    snapshot.chain.len()
                );
                return false;
            }
            if !valid_chain(&snapshot.chain, difficulty) {
                warn!("{peer}: chain of length {} failed validation", snapshot.length);
                return false;
            }
            true
        })
        .map(|(_, snapshot)| snapshot)
        .collect()
}

/// Longest of already-validated snapshots, if strictly longer than `local_len`.
/// The first one wins among equals.
pub fn pick_longest<I>(local_len: usize, candidates: I) -> Option<Vec<Block>>
where
    I: IntoIterator<Item = ChainSnapshot>,
{
    let mut max_length = local_len;
    let mut candidate = None;
    for snapshot in candidates {
        if snapshot.length > max_length {
            max_length = snapshot.length;
            candidate = Some(snapshot.chain);
        }
    }
    candidate
}

/// Pick the chain to adopt from fetched snapshots, scanned in order.
pub fn select_candidate<I>(local_len: usize, fetched: I, difficulty: usize) -> Option<Vec<Block>>
where
    I: IntoIterator<Item = (String, ChainSnapshot)>,
{
    pick_longest(local_len, validated_candidates(local_len, fetched, difficulty))
}

/// Fetch candidate chains from all peers and adopt the longest valid one.
///
/// Peers are fetched and their chains validated without holding any lock.
/// Unreachable peers are skipped. Under the ledger lock only the length
/// comparison against the current chain and the swap happen, so blocks mined
/// meanwhile are taken into account.
pub async fn resolve<S: ChainSource>(
    ledger: &Mutex<Blockchain>,
    peers: &RwLock<PeerRegistry>,
    source: &S,
) -> Resolution {
    let peer_list = peers.read().list();
    debug!("resolving against {} peer(s)", peer_list.len());

    let results = join_all(peer_list.iter().map(|peer| source.fetch_chain(peer))).await;

    let fetched: Vec<(String, ChainSnapshot)> = peer_list
        .into_iter()
        .zip(results)
        .filter_map(|(peer, res)| match res {
            Ok(snapshot) => Some((peer, snapshot)),
            Err(e) => {
                warn!("skipping peer: {e}");
                None
            }
        })
        .collect();

    let (floor, difficulty) = {
        let bc = ledger.lock();
        (bc.len(), bc.difficulty())
    };
    let candidates = validated_candidates(floor, fetched, difficulty);

    let mut bc = ledger.lock();
    let local_len = bc.len();
    let replaced = match pick_longest(local_len, candidates) {
        Some(chain) => bc.replace_chain(chain),
        None => false,
    };

    if replaced {
        info!("local chain replaced ({} -> {} blocks)", local_len, bc.len());
    } else {
        info!("local chain is authoritative ({} blocks)", local_len);
    }

    Resolution {
        replaced,
        length: bc.len(),
    }
}
