//! Shared HTTP adapter state.
//!
//! Handlers receive this through `web::Data` and only see the driving
//! ports, so they can be exercised against mocks without any store.

use std::sync::Arc;

use crate::domain::ports::{RosterCommand, RosterQuery};

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub roster: Arc<dyn RosterCommand>,
    pub roster_query: Arc<dyn RosterQuery>,
}

impl HttpState {
    pub fn new(roster: Arc<dyn RosterCommand>, roster_query: Arc<dyn RosterQuery>) -> Self {
        Self {
            roster,
            roster_query,
        }
    }

    /// Use one service for both ports.
    ///
    /// ```
    /// use std::sync::Arc;
    ///
    /// use roster::domain::RosterService;
    /// use roster::inbound::http::state::HttpState;
    /// use roster::outbound::memory::InMemoryEntityStore;
    ///
    /// let service = Arc::new(RosterService::new(Arc::new(InMemoryEntityStore::new())));
    /// let _state = HttpState::from_service(service);
    /// ```
    pub fn from_service<S>(service: Arc<S>) -> Self
    where
        S: RosterCommand + RosterQuery + 'static,
    {
        Self::new(service.clone(), service)
    }
}
