use serde::{Deserialize, Serialize};
use std::fmt;

/// Sender used for coins minted by the node that sealed the block.
pub const REWARD_SENDER: &str = "0";

/// A transfer amount as it arrived on the wire.
///
/// Integers and floats are kept apart so that `5` is re-serialized as `5`
/// and not `5.0`; the block hash depends on the exact rendering. Integers
/// above `i64::MAX` land in `Unsigned` instead of losing precision as floats.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Amount {
    Integer(i64),
    Unsigned(u64),
    Float(f64),
}

impl From<i64> for Amount {
    fn from(v: i64) -> Self {
        Amount::Integer(v)
    }
}

impl From<u64> for Amount {
    fn from(v: u64) -> Self {
        Amount::Unsigned(v)
    }
}

impl From<i32> for Amount {
    fn from(v: i32) -> Self {
        Amount::Integer(v.into())
    }
}

impl From<f64> for Amount {
    fn from(v: f64) -> Self {
        Amount::Float(v)
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Amount::Integer(v) => write!(f, "{v}"),
            Amount::Unsigned(v) => write!(f, "{v}"),
            Amount::Float(v) => write!(f, "{v}"),
        }
    }
}

/// A value transfer between two opaque parties. No balance or signature checks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub sender: String,
    pub recipient: String,
    pub amount: Amount,
}

impl Transaction {
    pub fn new(
        sender: impl Into<String>,
        recipient: impl Into<String>,
        amount: impl Into<Amount>,
    ) -> Self {
        Self {
            sender: sender.into(),
            recipient: recipient.into(),
            amount: amount.into(),
        }
    }

    /// Mining reward paid to `recipient`.
    pub fn reward(recipient: impl Into<String>, amount: impl Into<Amount>) -> Self {
        Self::new(REWARD_SENDER, recipient, amount)
    }

    pub fn is_reward(&self) -> bool {
        self.sender == REWARD_SENDER
    }
}
