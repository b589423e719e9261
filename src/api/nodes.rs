use actix_web::{HttpResponse, Responder, get, post, web};
use log::warn;

use super::models::{NodesResponse, RegisterNodesRequest, ResolveResponse};
use crate::node::Node;

#[post("/nodes/register/")]
pub async fn register_nodes(
    node: web::Data<Node>,
    body: web::Json<RegisterNodesRequest>,
) -> impl Responder {
    let Some(addresses) = body.into_inner().nodes else {
        return HttpResponse::BadRequest().body("Error: Please supply a valid list of nodes");
    };

    match node.register_peers(&addresses) {
        Ok(total_nodes) => HttpResponse::Created().json(NodesResponse {
            message: "New nodes have been added".to_string(),
            total_nodes,
        }),
        Err(e) => {
            warn!("POST /nodes/register/ - {e}");
            HttpResponse::BadRequest().body(e.to_string())
        }
    }
}

#[get("/nodes/")]
pub async fn list_nodes(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().json(NodesResponse {
        message: "Known nodes".to_string(),
        total_nodes: node.peers(),
    })
}

/// Pull chains from every peer and adopt the longest valid one.
#[post("/nodes/resolve/")]
pub async fn resolve_conflicts(node: web::Data<Node>) -> impl Responder {
    let outcome = node.resolve().await;
    let snapshot = node.chain_snapshot();
    let message = if outcome.replaced {
        "Our chain was replaced"
    } else {
        "Our chain is authoritative"
    };
    HttpResponse::Ok().json(ResolveResponse {
        message: message.to_string(),
        replaced: outcome.replaced,
        chain: snapshot.chain,
        length: snapshot.length,
    })
}
