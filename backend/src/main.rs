//! Backend entry-point: loads settings, selects the entity store and serves
//! the roster REST API with its OpenAPI docs.

mod server;

use color_eyre::eyre::{Result, WrapErr, eyre};
use ortho_config::OrthoConfig;
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

use roster::outbound::persistence::{DbPool, PoolConfig, run_pending_migrations};
use roster::settings::RosterSettings;
use server::{ServerConfig, create_server};

async fn connect(settings: &RosterSettings, database_url: &str) -> Result<DbPool> {
    if settings.run_migrations {
        let applied = run_pending_migrations(database_url)
            .await
            .wrap_err("failed to apply migrations")?;
        info!(applied, "migrations complete");
    }

    let pool_config = PoolConfig::sized(settings.pool_max_size()?);
    DbPool::connect(database_url, pool_config)
        .await
        .wrap_err("failed to build database pool")
}

/// Application bootstrap.
#[actix_web::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    if let Err(e) = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .json()
        .try_init()
    {
        warn!(error = %e, "tracing init failed");
    }

    let settings = RosterSettings::load_from_iter(std::env::args_os())
        .map_err(|err| eyre!("failed to load settings: {err}"))?;
    let mut config = ServerConfig::new(settings.bind_addr()?);
    if let Some(database_url) = settings.database_url() {
        config = config.with_db_pool(connect(&settings, database_url).await?);
    } else if settings.run_migrations {
        warn!("run_migrations ignored without a database url");
    }

    create_server(config)?.await?;
    Ok(())
}
