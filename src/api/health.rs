use actix_web::{HttpResponse, Responder, get, web};

use crate::node::Node;

#[get("/health/")]
pub async fn health_check(node: web::Data<Node>) -> impl Responder {
    HttpResponse::Ok().body(format!("node {} is up and running 🦀", node.id()))
}
