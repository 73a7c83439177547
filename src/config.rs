use std::path::PathBuf;

use crate::auth::password::PasswordScheme;

#[derive(Debug, Clone)]
pub struct ModelConfig {
    pub model_path: PathBuf,
    pub scaler_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub host: String,
    pub port: u16,
    pub model: ModelConfig,
    pub password_scheme: PasswordScheme,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let database_url =
            std::env::var("DATABASE_URL").unwrap_or_else(|_| "sqlite://./test.db".into());
        let db_max_connections = parse_var("DB_MAX_CONNECTIONS", 5)?;
        let host = std::env::var("APP_HOST").unwrap_or_else(|_| "127.0.0.1".into());
        let port = parse_var("APP_PORT", 8000)?;
        let model = ModelConfig {
            model_path: std::env::var("MODEL_PATH")
                .unwrap_or_else(|_| "./models/forest.json".into())
                .into(),
            scaler_path: std::env::var("SCALER_PATH")
                .unwrap_or_else(|_| "./models/scaler.json".into())
                .into(),
        };
        let password_scheme = match std::env::var("PASSWORD_SCHEME") {
            Ok(v) => v.parse()?,
            Err(_) => PasswordScheme::default(),
        };
        Ok(Self {
            database_url,
            db_max_connections,
            host,
            port,
            model,
            password_scheme,
        })
    }
}

fn parse_var<T>(name: &str, default: T) -> anyhow::Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(v) => v
            .parse::<T>()
            .map_err(|e| anyhow::anyhow!("invalid {name}={v:?}: {e}")),
        Err(_) => Ok(default),
    }
}
