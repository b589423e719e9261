pub mod model;

pub use model::{Amount, REWARD_SENDER, Transaction};
