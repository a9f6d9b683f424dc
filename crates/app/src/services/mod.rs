mod guilds;
mod records;
mod roster;
mod scan;
mod settings;

use std::sync::Arc;

use ::scan::OcrEngine;

use crate::app::AppConfig;
use crate::error::Result;
use guild_core::Guild;
use guild_db::Db;

pub use guilds::GuildsService;
pub use records::RecordsService;
pub use roster::RosterService;
pub use scan::ScanService;
pub use settings::{SettingsService, SettingsSnapshot};

type SharedConfig = Arc<AppConfig>;

/// Service registry for app-level operations.
#[derive(Clone)]
pub struct AppServices {
    pub guilds: GuildsService,
    pub roster: RosterService,
    pub records: RecordsService,
    pub scan: ScanService,
    pub settings: SettingsService,
}

impl AppServices {
    pub fn new(config: &AppConfig, engine: Arc<dyn OcrEngine>) -> Self {
        let shared = Arc::new(config.clone());
        Self {
            guilds: GuildsService::new(shared.clone()),
            roster: RosterService::new(shared.clone()),
            records: RecordsService::new(shared.clone()),
            scan: ScanService::new(shared.clone(), engine),
            settings: SettingsService::new(shared),
        }
    }
}

fn open_db(config: &SharedConfig) -> Result<Db> {
    Ok(Db::open(&config.db_path)?)
}

fn require_active_guild(db: &mut Db) -> Result<Guild> {
    Ok(db.ensure_active_guild()?)
}
