mod chain;
mod health;
pub mod models;
mod nodes;
mod tx;

use actix_web::error::{InternalError, JsonPayloadError};
use actix_web::web::{self, ServiceConfig};
use actix_web::{HttpRequest, HttpResponse};
use log::debug;

pub fn init_routes(cfg: &mut ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .app_data(web::JsonConfig::default().error_handler(reject_payload))
            .service(health::health_check)
            .service(chain::get_chain)
            .service(chain::validate_chain)
            .service(chain::mine_block)
            .service(tx::post_transaction)
            .service(tx::get_pending)
            .service(nodes::register_nodes)
            .service(nodes::list_nodes)
            .service(nodes::resolve_conflicts),
    );
}

fn reject_payload(err: JsonPayloadError, req: &HttpRequest) -> actix_web::Error {
    debug!("{} {} - rejected body: {}", req.method(), req.path(), err);
    InternalError::from_response(err, HttpResponse::BadRequest().body("Missing values")).into()
}
