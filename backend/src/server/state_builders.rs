//! Builders for the entity store and the HTTP state wrapping it.

use std::sync::Arc;

use actix_web::web;
use tracing::warn;

use roster::domain::RosterService;
use roster::domain::ports::EntityStore;
use roster::inbound::http::state::HttpState;
use roster::outbound::memory::InMemoryEntityStore;
use roster::outbound::persistence::{DbPool, DieselEntityStore};

use super::ServerConfig;

/// Entity store selected for this process plus the label reported by the
/// readiness probe.
pub(super) struct SelectedStore {
    pub(super) store: Arc<dyn EntityStore>,
    pub(super) label: &'static str,
}

fn select_store_with_pool<Pool>(
    pool: Option<&Pool>,
    make_store: impl FnOnce(&Pool) -> Arc<dyn EntityStore>,
) -> SelectedStore {
    match pool {
        Some(pool) => SelectedStore {
            store: make_store(pool),
            label: "postgres",
        },
        None => {
            warn!("no database configured; roster data lives in process memory");
            SelectedStore {
                store: Arc::new(InMemoryEntityStore::new()),
                label: "memory",
            }
        }
    }
}

/// Pick the Diesel store when a pool is configured, otherwise memory.
pub(super) fn select_store(config: &ServerConfig) -> SelectedStore {
    select_store_with_pool(config.db_pool.as_ref(), |pool: &DbPool| -> Arc<dyn EntityStore> {
        Arc::new(DieselEntityStore::new(pool.clone()))
    })
}

/// Build the shared HTTP state over the selected store.
pub(super) fn build_http_state(store: Arc<dyn EntityStore>) -> web::Data<HttpState> {
    let service = Arc::new(RosterService::new(store));
    web::Data::new(HttpState::from_service(service))
}
