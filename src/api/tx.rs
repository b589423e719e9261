use actix_web::{HttpResponse, Responder, get, post, web};
use log::debug;

use super::models::{NewTxRequest, NewTxResponse, PendingResponse};
use crate::node::Node;
use crate::transaction::Transaction;

/// Queue a transaction for the next block. Body fields are not validated
/// beyond being present.
#[post("/transactions/new/")]
pub async fn post_transaction(
    node: web::Data<Node>,
    body: web::Json<NewTxRequest>,
) -> impl Responder {
    let body = body.into_inner();
    let tx = Transaction::new(body.sender, body.recipient, body.amount);
    let index = node.submit_transaction(tx);
    debug!("POST /transactions/new/ - queued for block {index}");

    HttpResponse::Created().json(NewTxResponse {
        message: format!("Transaction will be added to Block {index}"),
        index,
    })
}

/// List transactions waiting for the next block.
#[get("/transactions/pending/")]
pub async fn get_pending(node: web::Data<Node>) -> impl Responder {
    let transactions = node.pending_snapshot();
    HttpResponse::Ok().json(PendingResponse {
        size: transactions.len(),
        transactions,
    })
}
