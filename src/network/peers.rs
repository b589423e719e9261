use std::collections::BTreeSet;

use log::debug;
use thiserror::Error;
use url::Url;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeerError {
    #[error("invalid peer address `{address}`: {reason}")]
    Invalid { address: String, reason: String },
    #[error("peer address `{0}` has no host (expected e.g. http://10.0.0.2:5000)")]
    MissingHost(String),
}

/// Known peers, stored as `host[:port]` network locations.
#[derive(Debug, Default, Clone)]
pub struct PeerRegistry {
    peers: BTreeSet<String>,
}

impl PeerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the network location of `address`. Re-registering is a no-op.
    pub fn register(&mut self, address: &str) -> Result<String, PeerError> {
        let netloc = network_location(address)?;
        if self.peers.insert(netloc.clone()) {
            debug!("registered peer {netloc}");
        }
        Ok(netloc)
    }

    /// Register a batch of addresses, all or nothing: if any address is
    /// invalid the registry is left as it was.
    pub fn register_all<I, S>(&mut self, addresses: I) -> Result<Vec<String>, PeerError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let parsed = addresses
            .into_iter()
            .map(|a| network_location(a.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        for netloc in &parsed {
            if self.peers.insert(netloc.clone()) {
                debug!("registered peer {netloc}");
            }
        }
        Ok(parsed)
    }

    /// Snapshot of all peers, sorted.
    pub fn list(&self) -> Vec<String> {
        self.peers.iter().cloned().collect()
    }

    pub fn contains(&self, netloc: &str) -> bool {
        self.peers.contains(netloc)
    }

    pub fn len(&self) -> usize {
        self.peers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.peers.is_empty()
    }
}

/// `host[:port]` of a URL. An explicit port is kept even when it is the
/// scheme's default.
pub fn network_location(address: &str) -> Result<String, PeerError> {
    let trimmed = address.trim();
    let url = Url::parse(trimmed).map_err(|e| PeerError::Invalid {
        address: address.to_string(),
        reason: e.to_string(),
    })?;
    let host = match url.host_str() {
        Some(h) if !h.is_empty() => h,
        _ => return Err(PeerError::MissingHost(address.to_string())),
    };
    let port = url.port().or_else(|| explicit_default_port(trimmed, &url));
    Ok(match port {
        Some(p) => format!("{host}:{p}"),
        None => host.to_string(),
    })
}

// `Url::port` hides ports equal to the scheme default ("http://a:80").
fn explicit_default_port(raw: &str, url: &Url) -> Option<u16> {
    let default = url.port_or_known_default()?;
    let authority = raw.split_once("://")?.1;
    let authority = authority.split(['/', '?', '#']).next()?;
    let host_port = authority.rsplit_once('@').map_or(authority, |(_, hp)| hp);
    let (_, port) = host_port.rsplit_once(':')?;
    if port.parse::<u16>().ok()? == default {
        Some(default)
    } else {
        None
    }
}
