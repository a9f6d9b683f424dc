pub mod app;
pub mod error;
pub mod services;

pub use app::{AppConfig, AppState, setup_db};
pub use error::{ApiError, AppError, Result};
pub use services::{
    AppServices, GuildsService, RecordsService, RosterService, ScanService, SettingsService,
    SettingsSnapshot,
};
