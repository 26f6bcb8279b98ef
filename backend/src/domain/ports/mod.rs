//! Domain ports for the hexagonal boundary.

mod macros;
pub(crate) use macros::define_port_error;

mod entity_store;
mod roster_command;
mod roster_query;

#[cfg(test)]
pub use entity_store::MockEntityStore;
pub use entity_store::{EntityStore, EntityStoreError};
#[cfg(test)]
pub use roster_command::MockRosterCommand;
pub use roster_command::{
    CreateClassSessionRequest, CreateClusterRequest, CreateUserRequest, RosterCommand,
    UpdateClassSessionRequest, UpdateClusterRequest,
};
#[cfg(test)]
pub use roster_query::MockRosterQuery;
pub use roster_query::RosterQuery;
