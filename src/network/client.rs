use std::future::Future;
use std::time::Duration;

use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blockchain::Block;

/// Path of the chain-read endpoint every node serves.
pub const CHAIN_PATH: &str = "/api/v1/chain/";

/// Payload of a peer's chain-read endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainSnapshot {
    pub chain: Vec<Block>,
    pub length: usize,
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request to {peer} failed: {source}")]
    Transport {
        peer: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{peer} answered with status {status}")]
    Status {
        peer: String,
        status: reqwest::StatusCode,
    },
    #[error("{peer} sent an undecodable chain: {reason}")]
    Decode { peer: String, reason: String },
}

/// Where candidate chains come from during conflict resolution.
pub trait ChainSource {
    fn fetch_chain(&self, peer: &str) -> impl Future<Output = Result<ChainSnapshot, FetchError>>;
}

/// Fetches `{chain, length}` from peers over plain HTTP.
#[derive(Debug, Clone)]
pub struct HttpChainSource {
    client: reqwest::Client,
}

impl HttpChainSource {
    pub fn new(timeout: Duration) -> Self {
        let client = build_client(timeout).unwrap_or_else(|e| {
            warn!("peer client without {timeout:?} timeout: {e}");
            reqwest::Client::new()
        });
        Self { client }
    }
}

fn build_client(timeout: Duration) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder().timeout(timeout).build()
}

impl ChainSource for HttpChainSource {
    async fn fetch_chain(&self, peer: &str) -> Result<ChainSnapshot, FetchError> {
        let url = format!("http://{peer}{CHAIN_PATH}");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                peer: peer.to_string(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                peer: peer.to_string(),
                status,
            });
        }

        resp.json::<ChainSnapshot>()
            .await
            .map_err(|e| FetchError::Decode {
                peer: peer.to_string(),
                reason: e.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_builds_with_timeout() {
        assert!(build_client(Duration::from_millis(250)).is_ok());
    }

    #[actix_web::test]
    async fn unreachable_peer_is_a_transport_error() {
        let source = HttpChainSource::new(Duration::from_millis(500));
        let err = source.fetch_chain("127.0.0.1:1").await.unwrap_err();
        assert!(matches!(err, FetchError::Transport { ref peer, .. } if peer == "127.0.0.1:1"));
    }
}
