use actix_web::{App, HttpServer, middleware::Logger, web};
use clap::Parser;
use dotenvy::dotenv;
use log::{info, warn};

use ledger_node::{Node, NodeConfig, api};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let _ = dotenv();
    env_logger::init();

    let config = NodeConfig::parse();
    let host = config.host.clone();
    let port = config.listen_port();

    let node = web::Data::new(Node::new(config));
    if !node.config().peers.is_empty() {
        if let Err(e) = node.register_peers(&node.config().peers) {
            warn!("ignoring startup peers: {e}");
        }
    }

    info!(
        "⛓️ node {} starting at http://{host}:{port} (difficulty {})",
        node.id(),
        node.difficulty()
    );

    HttpServer::new(move || {
        App::new()
            .wrap(Logger::default())
            .app_data(node.clone())
            .configure(api::init_routes)
    })
    .bind((host.as_str(), port))?
    .run()
    .await
}
