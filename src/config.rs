use std::env;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::models::{Actor, ActorRole};
use crate::store::{ResolutionMode, StoreOptions};

/// Runtime configuration, read from the environment (and `.env` when
/// present).
///
/// - `SERVICE_HOURS_SEED_FILE`: JSON seed to load instead of the demo tenant
/// - `SERVICE_HOURS_RESOLUTION_MODE`: `strict` (default) or `tolerant`
/// - `SERVICE_HOURS_ACTOR_ID` / `SERVICE_HOURS_ACTOR_NAME`: identity stamped
///   on audit events while authentication is stubbed
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Config {
    pub seed_file: Option<PathBuf>,
    pub mode: ResolutionMode,
    pub actor: Actor,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Actor::default();
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mode = match non_empty("SERVICE_HOURS_RESOLUTION_MODE") {
            Some(value) => value
                .parse::<ResolutionMode>()
                .map_err(anyhow::Error::msg)
                .context("SERVICE_HOURS_RESOLUTION_MODE is invalid")?,
            None => ResolutionMode::default(),
        };

        Ok(Self {
            seed_file: non_empty("SERVICE_HOURS_SEED_FILE").map(PathBuf::from),
            mode,
            actor: Actor {
                id: non_empty("SERVICE_HOURS_ACTOR_ID").unwrap_or(defaults.id),
                name: non_empty("SERVICE_HOURS_ACTOR_NAME").unwrap_or(defaults.name),
                role: ActorRole::UniversityAdmin,
            },
        })
    }

    pub fn store_options(&self) -> StoreOptions {
        StoreOptions {
            mode: self.mode,
            actor: self.actor.clone(),
        }
    }
}
