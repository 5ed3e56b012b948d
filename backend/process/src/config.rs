use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use bank::remote::FirestoreConfig;
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Environment variable {0} is required")]
    Missing(&'static str),

    #[error("Invalid {key} value: {reason}")]
    Invalid { key: &'static str, reason: String },
}

pub struct Config {
    pub project_id: String,
    pub database: String,
    pub collection: String,
    pub emulator_host: Option<String>,
    pub token: Option<String>,
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let emulator_host = var("FIRESTORE_EMULATOR_HOST").ok();

        // the emulator accepts any bearer token
        let token = match emulator_host {
            Some(_) => None,
            None => Some(read_secret("FIRESTORE_TOKEN")?),
        };

        Ok(Self {
            project_id: var("FIRESTORE_PROJECT_ID")
                .map_err(|_| ConfigError::Missing("FIRESTORE_PROJECT_ID"))?,
            database: try_load("FIRESTORE_DATABASE", "(default)")?,
            collection: try_load("FIRESTORE_COLLECTION", "recipes")?,
            emulator_host,
            token,
        })
    }

    pub fn firestore(self) -> FirestoreConfig {
        FirestoreConfig {
            project_id: self.project_id,
            database: self.database,
            collection: self.collection,
            emulator_host: self.emulator_host,
            token: self.token,
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        info!("Environment variable {key} not found");
    })
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|_| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e: T::Err| {
            warn!("Invalid {key} value: {e}");
            ConfigError::Invalid {
                key,
                reason: e.to_string(),
            }
        })
}

/// Secret file first, then the plain environment variable.
fn read_secret(secret_name: &'static str) -> Result<String, ConfigError> {
    let path = format!("/run/secrets/{secret_name}");

    match read_to_string(&path) {
        Ok(s) => Ok(s.trim().to_string()),
        Err(e) => {
            warn!("Failed to read {secret_name} from file: {e}");
            var(secret_name)
                .map(|s| s.trim().to_string())
                .map_err(|_| ConfigError::Missing(secret_name))
        }
    }
}
