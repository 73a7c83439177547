use tracing::{debug, error, info};

use super::{
    artifacts::{Forest, StandardScaler},
    dto::PredictionInput,
};
use crate::{config::ModelConfig, error::ApiError};

/// Scaler and regressor fitted together.
#[derive(Debug)]
pub struct Predictor {
    scaler: StandardScaler,
    forest: Forest,
}

impl Predictor {
    pub fn new(scaler: StandardScaler, forest: Forest) -> Self {
        Self { scaler, forest }
    }

    pub fn load(cfg: &ModelConfig) -> anyhow::Result<Self> {
        let forest = Forest::from_path(&cfg.model_path)?;
        let scaler = StandardScaler::from_path(&cfg.scaler_path)?;
        Ok(Self::new(scaler, forest))
    }

    pub fn score(&self, input: &PredictionInput) -> f64 {
        let scaled = self.scaler.transform(&input.features());
        self.forest.predict(&scaled)
    }
}

/// Model availability, fixed for the lifetime of the process.
#[derive(Debug)]
pub enum ModelState {
    Ready(Predictor),
    Unavailable { reason: String },
}

impl ModelState {
    /// Load both artifacts. Failure is logged and yields `Unavailable`
    /// rather than an error, so the rest of the API keeps serving.
    pub fn load(cfg: &ModelConfig) -> Self {
        match Predictor::load(cfg) {
            Ok(p) => {
                info!(
                    model = %cfg.model_path.display(),
                    scaler = %cfg.scaler_path.display(),
                    trees = p.forest.n_trees(),
                    "model artifacts loaded"
                );
                Self::Ready(p)
            }
            Err(e) => {
                error!(error = ?e, "model loading error; /predict disabled");
                Self::unavailable(format!("{e:#}"))
            }
        }
    }

    pub fn unavailable(reason: impl Into<String>) -> Self {
        Self::Unavailable {
            reason: reason.into(),
        }
    }

    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn predict(&self, input: &PredictionInput) -> Result<f64, ApiError> {
        match self {
            Self::Ready(p) => {
                let y = p.score(input);
                debug!(predicted_btc = y, "scored");
                Ok(y)
            }
            Self::Unavailable { reason } => {
                debug!(%reason, "predict called without model");
                Err(ApiError::ModelUnavailable)
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::path::PathBuf;

    pub(crate) fn sample_config() -> ModelConfig {
        let root = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("models");
        ModelConfig {
            model_path: root.join("forest.json"),
            scaler_path: root.join("scaler.json"),
        }
    }

    pub(crate) fn at_mean() -> PredictionInput {
        PredictionInput {
            volume_btc: 1000.0,
            close_eth: 2000.0,
            volume_eth: 500.0,
            close_usdt: 1.0,
            volume_usdt: 10000.0,
            close_bnb: 300.0,
            volume_bnb: 800.0,
        }
    }

    #[test]
    fn sample_artifacts_load_and_score() {
        let state = ModelState::load(&sample_config());
        assert!(state.is_loaded());
        assert_eq!(state.predict(&at_mean()).unwrap(), 31000.0);

        let rally = PredictionInput {
            volume_btc: 1100.0,
            close_eth: 2400.0,
            close_bnb: 330.0,
            ..at_mean()
        };
        assert_eq!(state.predict(&rally).unwrap(), 43500.0);
    }

    #[test]
    fn scoring_is_deterministic() {
        let state = ModelState::load(&sample_config());
        let input = PredictionInput {
            volume_btc: 1234.5,
            close_eth: 1999.9,
            volume_eth: 12.0,
            close_usdt: 0.99,
            volume_usdt: 5.0e9,
            close_bnb: -3.0,
            volume_bnb: 0.0,
        };
        let a = state.predict(&input).unwrap();
        let b = state.predict(&input).unwrap();
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn missing_artifacts_leave_model_unavailable() {
        let cfg = ModelConfig {
            model_path: "/nonexistent/forest.json".into(),
            scaler_path: "/nonexistent/scaler.json".into(),
        };
        let state = ModelState::load(&cfg);
        assert!(!state.is_loaded());
        match &state {
            ModelState::Unavailable { reason } => assert!(reason.contains("forest.json")),
            ModelState::Ready(_) => panic!("expected unavailable"),
        }
        for _ in 0..3 {
            assert!(matches!(
                state.predict(&at_mean()),
                Err(ApiError::ModelUnavailable)
            ));
        }
    }

    #[test]
    fn corrupt_artifact_leaves_model_unavailable() {
        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap()
            .as_nanos();
        let dir = std::env::temp_dir().join(format!(
            "btc-predict-corrupt-scaler-{}-{nanos}",
            std::process::id()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        let scaler_path = dir.join("scaler.json");
        std::fs::write(&scaler_path, b"{\"mean\": [1, 2, oops").unwrap();

        let cfg = ModelConfig {
            model_path: sample_config().model_path,
            scaler_path,
        };
        let state = ModelState::load(&cfg);
        let _ = std::fs::remove_dir_all(&dir);

        assert!(!state.is_loaded());
        assert!(matches!(
            state.predict(&at_mean()),
            Err(ApiError::ModelUnavailable)
        ));
    }
}
