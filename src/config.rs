use std::time::Duration;

use clap::Parser;

use crate::blockchain::{DEFAULT_DIFFICULTY, MAX_DIFFICULTY, MINING_REWARD};

/// Node settings. Command-line flags win over environment variables
/// (which may come from a `.env` file).
#[derive(Debug, Clone, Parser)]
#[command(name = "ledger_node", about = "Proof-of-work ledger node", version)]
pub struct NodeConfig {
    /// Port to listen on; shorthand for `--port`
    #[arg(value_name = "PORT")]
    pub port_arg: Option<u16>,

    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    pub port: u16,

    /// Leading hex zeros required of a valid proof
    #[arg(long, env = "DIFFICULTY", default_value_t = DEFAULT_DIFFICULTY, value_parser = parse_difficulty)]
    pub difficulty: usize,

    /// Coins paid to this node for each mined block
    #[arg(long, env = "MINING_REWARD", default_value_t = MINING_REWARD)]
    pub reward: i64,

    /// Give up a proof search after this many seconds (unbounded if unset)
    #[arg(long, env = "MINING_TIMEOUT_SECS")]
    pub mining_timeout_secs: Option<u64>,

    /// Timeout for fetching a peer's chain
    #[arg(long, env = "PEER_TIMEOUT_MS", default_value_t = 5000)]
    pub peer_timeout_ms: u64,

    /// Identity credited with mining rewards (random if unset)
    #[arg(long, env = "NODE_ID")]
    pub node_id: Option<String>,

    /// Peers to register at startup, e.g. http://127.0.0.1:5001
    #[arg(long, env = "PEERS", value_delimiter = ',')]
    pub peers: Vec<String>,
}

fn parse_difficulty(raw: &str) -> Result<usize, String> {
    let difficulty: usize = raw.parse().map_err(|e| format!("{e}"))?;
    if difficulty > MAX_DIFFICULTY {
        return Err(format!(
            "{difficulty} exceeds the {MAX_DIFFICULTY} hex digits of a SHA-256 digest"
        ));
    }
    Ok(difficulty)
}

impl NodeConfig {
    pub fn listen_port(&self) -> u16 {
        self.port_arg.unwrap_or(self.port)
    }

    pub fn mining_timeout(&self) -> Option<Duration> {
        self.mining_timeout_secs.map(Duration::from_secs)
    }

    pub fn peer_timeout(&self) -> Duration {
        Duration::from_millis(self.peer_timeout_ms)
    }
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            port_arg: None,
            host: "127.0.0.1".to_string(),
            port: 8080,
            difficulty: DEFAULT_DIFFICULTY,
            reward: MINING_REWARD,
            mining_timeout_secs: None,
            peer_timeout_ms: 5000,
            node_id: None,
            peers: Vec::new(),
        }
    }
}
