use serde::{Deserialize, Serialize};

use super::artifacts::N_FEATURES;

/// Request body for `/predict`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PredictionInput {
    pub volume_btc: f64,
    pub close_eth: f64,
    pub volume_eth: f64,
    pub close_usdt: f64,
    pub volume_usdt: f64,
    pub close_bnb: f64,
    pub volume_bnb: f64,
}

impl PredictionInput {
    /// Feature vector in the order the artifacts were fitted on.
    pub fn features(&self) -> [f64; N_FEATURES] {
        [
            self.volume_btc,
            self.close_eth,
            self.volume_eth,
            self.close_usdt,
            self.volume_usdt,
            self.close_bnb,
            self.volume_bnb,
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PredictionOutput {
    #[serde(flatten)]
    pub input: PredictionInput,
    pub predicted_btc: f64,
}
