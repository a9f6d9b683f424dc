use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::services::AppServices;
use guild_db::Db;
use scan::OcrEngine;

/// Paths and knobs needed to run the manager.
#[derive(Clone, Debug)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub scan_timeout: Duration,
}

/// Application state shared by frontend backends.
#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub services: AppServices,
}

impl AppState {
    pub fn new(db_path: PathBuf, scan_timeout: Duration, engine: Arc<dyn OcrEngine>) -> Self {
        let config = AppConfig {
            db_path,
            scan_timeout,
        };
        let services = AppServices::new(&config, engine);
        Self { config, services }
    }

    pub fn initialize(&self) -> Result<()> {
        setup_db(&self.config.db_path)
            .map_err(|err| AppError::Message(format!("initialize db: {}", err)))
    }

    pub fn open_db(&self) -> Result<Db> {
        Ok(Db::open(&self.config.db_path)?)
    }
}

pub fn setup_db(path: &Path) -> Result<()> {
    let mut db = Db::open(path)?;
    db.migrate()?;
    Ok(())
}
