//! Shared PostgreSQL connection pool for the entity store.
//!
//! `bb8` hands out `diesel-async` connections without blocking the runtime.
//! A checkout that outlives [`PoolConfig::checkout_timeout`] becomes
//! [`PoolError::Checkout`], which the store reports as a connection failure.

use std::time::Duration;

use diesel_async::AsyncPgConnection;
use diesel_async::pooled_connection::AsyncDieselConnectionManager;
use diesel_async::pooled_connection::bb8::{Pool, PooledConnection};
use tracing::info;

use crate::domain::ports::define_port_error;

define_port_error! {
    /// Failures building the pool or borrowing from it.
    pub enum PoolError {
        Checkout => "no pooled connection available: {message}",
        Build => "could not build connection pool: {message}",
    }
}

/// Sizing for [`DbPool::connect`].
///
/// ```
/// use std::time::Duration;
/// use roster::outbound::persistence::PoolConfig;
///
/// let config = PoolConfig::sized(Some(4));
/// assert_eq!(config.max_size, 4);
/// assert_eq!(config.checkout_timeout, Duration::from_secs(30));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolConfig {
    pub max_size: u32,
    /// Connections opened eagerly and kept warm.
    pub min_idle: Option<u32>,
    pub checkout_timeout: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_size: 10,
            min_idle: Some(2),
            checkout_timeout: Duration::from_secs(30),
        }
    }
}

impl PoolConfig {
    /// Defaults with an optional size override. The warm set never exceeds
    /// the pool size.
    #[must_use]
    pub fn sized(max_size: Option<u32>) -> Self {
        let base = Self::default();
        let max_size = max_size.unwrap_or(base.max_size);
        Self {
            max_size,
            min_idle: base.min_idle.map(|idle| idle.min(max_size)),
            ..base
        }
    }
}

/// Cloneable handle to the pool.
#[derive(Clone)]
pub struct DbPool {
    inner: Pool<AsyncPgConnection>,
}

impl DbPool {
    /// Open the pool against `database_url`.
    ///
    /// # Errors
    ///
    /// [`PoolError::Build`] when the URL is unusable or the warm connections
    /// cannot be opened.
    pub async fn connect(database_url: &str, config: PoolConfig) -> Result<Self, PoolError> {
        let manager = AsyncDieselConnectionManager::<AsyncPgConnection>::new(database_url);
        let inner = Pool::builder()
            .max_size(config.max_size)
            .min_idle(config.min_idle)
            .connection_timeout(config.checkout_timeout)
            .build(manager)
            .await
            .map_err(|err| PoolError::build(err.to_string()))?;

        info!(
            max_size = config.max_size,
            min_idle = ?config.min_idle,
            "database pool ready"
        );
        Ok(Self { inner })
    }

    /// Borrow a connection for one store operation.
    ///
    /// # Errors
    ///
    /// [`PoolError::Checkout`] when the checkout timeout elapses.
    pub async fn get(&self) -> Result<PooledConnection<'_, AsyncPgConnection>, PoolError> {
        self.inner
            .get()
            .await
            .map_err(|err| PoolError::checkout(err.to_string()))
    }
}
