use serde::{Deserialize, Serialize};

use crate::blockchain::Block;
use crate::transaction::{Amount, Transaction};

/* ---------- Chain API Models ---------- */

#[derive(Serialize, Deserialize)]
pub struct ChainResponse {
    pub chain: Vec<Block>,
    pub length: usize,
    pub difficulty: usize,
}

#[derive(Serialize, Deserialize)]
pub struct ValidateResponse {
    pub valid: bool,
    pub length: usize,
    pub difficulty: usize,
}

#[derive(Serialize, Deserialize)]
pub struct MineResponse {
    pub message: String,
    pub index: u64,
    pub transactions: Vec<Transaction>,
    pub proof: u64,
    pub previous_hash: String,
}

/* ---------- TX API Models ---------- */

#[derive(Deserialize)]
pub struct NewTxRequest {
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
}

#[derive(Serialize, Deserialize)]
pub struct NewTxResponse {
    pub message: String,
    pub index: u64,
}

#[derive(Serialize, Deserialize)]
pub struct PendingResponse {
    pub size: usize,
    pub transactions: Vec<Transaction>,
}

/* ---------- Node API Models ---------- */

#[derive(Deserialize)]
pub struct RegisterNodesRequest {
    pub nodes: Option<Vec<String>>,
}

#[derive(Serialize, Deserialize)]
pub struct NodesResponse {
    pub message: String,
    pub total_nodes: Vec<String>,
}

#[derive(Serialize, Deserialize)]
pub struct ResolveResponse {
    pub message: String,
    pub replaced: bool,
    pub chain: Vec<Block>,
    pub length: usize,
}
