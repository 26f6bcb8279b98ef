//! PostgreSQL persistence adapter using Diesel ORM.
//!
//! Row structs (`models.rs`) and table definitions (`schema.rs`) stay
//! private; only the store, the pool, and the migration runner are exported.
//!
//! ```ignore
//! use roster::outbound::persistence::{DbPool, DieselEntityStore, PoolConfig};
//!
//! run_pending_migrations("postgres://localhost/roster").await?;
//! let pool = DbPool::connect("postgres://localhost/roster", PoolConfig::default()).await?;
//! let store = DieselEntityStore::new(pool);
//! ```

mod diesel_entity_store;
mod diesel_error_mapping;
mod migrations;
mod models;
mod pool;
mod schema;

pub use diesel_entity_store::DieselEntityStore;
pub use migrations::{MIGRATIONS, MigrationError, run_pending_migrations};
pub use pool::{DbPool, PoolConfig, PoolError};
