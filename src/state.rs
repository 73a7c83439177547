use crate::config::AppConfig;
use crate::db;
use crate::predict::ModelState;
use sqlx::SqlitePool;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Arc<AppConfig>,
    pub model: Arc<ModelState>,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let db = db::connect(&config).await?;
        // Never fails: a bad artifact leaves the model unavailable.
        let model = Arc::new(ModelState::load(&config.model));
        Ok(Self::from_parts(db, config, model))
    }

    pub fn from_parts(db: SqlitePool, config: Arc<AppConfig>, model: Arc<ModelState>) -> Self {
        Self { db, config, model }
    }

    #[cfg(test)]
    pub async fn fake(model: ModelState) -> Self {
        use crate::auth::password::PasswordScheme;
        use crate::config::ModelConfig;

        let config = Arc::new(AppConfig {
            database_url: "sqlite::memory:".into(),
            db_max_connections: 1,
            host: "127.0.0.1".into(),
            port: 0,
            model: ModelConfig {
                model_path: "fake/forest.json".into(),
                scaler_path: "fake/scaler.json".into(),
            },
            password_scheme: PasswordScheme::Legacy,
        });
        let db = db::memory_pool().await;
        Self::from_parts(db, config, Arc::new(model))
    }
}
