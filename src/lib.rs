pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod services;

#[doc(hidden)]
pub mod test_support;

use config::Config;
use error::AppError;
use models::sync_report::SyncReport;
use services::index_service;

/// Runs one synchronization with the given configuration.
pub fn run(config: &Config) -> Result<SyncReport, AppError> {
    index_service::synchronize(&config.docs_dir, &config.store_path)
}
