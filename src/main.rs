use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use hic::config::Cli;
use hic::db::Catalog;
use hic::init;
use hic::logging;
use hic::server::{self, AppState};

#[tokio::main]
async fn main() -> Result<()> {
    let settings = Cli::parse().into_settings()?;

    logging::init(settings.debug, settings.log_dir.as_deref())?;

    let catalog = match &settings.init {
        Some(options) => {
            let catalog = Catalog::open(&settings.db_path)
                .with_context(|| format!("opening database {:?}", settings.db_path))?;
            info!("Database opened at {:?}", settings.db_path);
            init::initialize(&catalog, options).context("initializing catalog")?;
            catalog
        }
        None => {
            let catalog = Catalog::open_existing(&settings.db_path).with_context(|| {
                format!("opening database {:?}; run with --init first", settings.db_path)
            })?;
            info!("Database opened at {:?}", settings.db_path);
            let dataset = catalog
                .get_dataset_info()
                .context("database is not initialized; run with --init")?;
            info!(
                "Serving {} images from {}",
                catalog.get_image_count()?,
                dataset.image_root
            );
            catalog
        }
    };

    server::serve(&settings.ip, settings.port, AppState::new(catalog), settings.debug).await
}
