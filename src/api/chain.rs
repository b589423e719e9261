use actix_web::{HttpResponse, Responder, get, post, web};
use log::{error, info, warn};

use super::models::{ChainResponse, MineResponse, ValidateResponse};
use crate::blockchain::{CancelFlag, CancelOnDrop};
use crate::node::{MineError, Node};

/// Get the full blockchain.
#[get("/chain/")]
pub async fn get_chain(node: web::Data<Node>) -> impl Responder {
    let snapshot = node.chain_snapshot();
    HttpResponse::Ok().json(ChainResponse {
        chain: snapshot.chain,
        length: snapshot.length,
        difficulty: node.difficulty(),
    })
}

/// Validate the whole local chain.
#[get("/validate/")]
pub async fn validate_chain(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(ValidateResponse {
        valid: node.is_chain_valid(),
        length: node.chain_snapshot().length,
        difficulty: node.difficulty(),
    })
}

/// Mine a new block:
/// - search the next proof on the blocking pool
/// - pay this node the mining reward
/// - seal every pending transaction into the block
///
/// The search stops if the client goes away or the configured timeout hits.
#[post("/mine/")]
pub async fn mine_block(node: web::Data<Node>) -> impl Responder {
    let flag = CancelFlag::new();
    let _stop_on_disconnect = CancelOnDrop::new(flag.clone());
    let limits = node.search_limits().with_cancel(flag);

    let worker = node.clone();
    match web::block(move || worker.mine(&limits)).await {
        Ok(Ok(block)) => {
            info!(
                "MINER - forged block #{} (proof={}, txs={})",
                block.index,
                block.proof,
                block.transactions.len()
            );
            HttpResponse::Ok().json(MineResponse {
                message: "New Block Forged".to_string(),
                index: block.index,
                transactions: block.transactions,
                proof: block.proof,
                previous_hash: block.previous_hash,
            })
        }
        Ok(Err(e @ MineError::Sealing(_))) => {
            warn!("MINER - {e}");
            HttpResponse::Conflict().body(e.to_string())
        }
        Ok(Err(e @ MineError::Search(_))) => {
            warn!("MINER - {e}");
            HttpResponse::ServiceUnavailable().body(e.to_string())
        }
        Err(e) => {
            error!("MINER - worker failed: {e}");
            HttpResponse::InternalServerError().finish()
        }
    }
}
