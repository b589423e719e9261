use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use thiserror::Error;

use super::hash::sha256_hex;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PowError {
    #[error("proof search cancelled")]
    Cancelled,
    #[error("proof search timed out after {attempts} attempts")]
    TimedOut { attempts: u64 },
    #[error("nonce space exhausted")]
    Exhausted,
}

/// Shared flag that stops a running search at the next nonce attempt.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Raises the wrapped flag when dropped.
#[derive(Debug)]
pub struct CancelOnDrop(CancelFlag);

impl CancelOnDrop {
    pub fn new(flag: CancelFlag) -> Self {
        Self(flag)
    }
}

impl Drop for CancelOnDrop {
    fn drop(&mut self) {
        self.0.cancel();
    }
}

/// Bounds for [`proof_of_work_bounded`]. The default is unbounded.
#[derive(Debug, Clone, Default)]
pub struct SearchLimits {
    pub deadline: Option<Instant>,
    pub cancel: Option<CancelFlag>,
}

impl SearchLimits {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_deadline(mut self, deadline: Instant) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = Some(cancel);
        self
    }

    fn check(&self, attempts: u64) -> Result<(), PowError> {
        if let Some(flag) = &self.cancel {
            if flag.is_cancelled() {
                return Err(PowError::Cancelled);
            }
        }
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                return Err(PowError::TimedOut { attempts });
            }
        }
        Ok(())
    }
}

/// Does `sha256("{last_proof}{proof}")` start with `difficulty` hex zeros?
pub fn valid_proof(last_proof: u64, proof: u64, difficulty: usize) -> bool {
    let guess = format!("{last_proof}{proof}");
    let digest = sha256_hex(guess.as_bytes());
    digest.len() >= difficulty && digest.bytes().take(difficulty).all(|c| c == b'0')
}

/// Smallest non-negative `proof` with `valid_proof(last_proof, proof)`.
///
/// Runs until found. Use [`proof_of_work_bounded`] to cap the latency.
pub fn proof_of_work(last_proof: u64, difficulty: usize) -> u64 {
    let mut proof = 0u64;
    while !valid_proof(last_proof, proof, difficulty) {
        proof += 1;
    }
    proof
}

/// Same linear scan as [`proof_of_work`], checking `limits` before each attempt.
pub fn proof_of_work_bounded(
    last_proof: u64,
    difficulty: usize,
    limits: &SearchLimits,
) -> Result<u64, PowError> {
    let mut proof = 0u64;
    loop {
        limits.check(proof)?;
        if valid_proof(last_proof, proof, difficulty) {
            return Ok(proof);
        }
        proof = proof.checked_add(1).ok_or(PowError::Exhausted)?;
    }
}
