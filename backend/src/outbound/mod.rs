//! Outbound adapters implementing the `EntityStore` port.
//!
//! - **memory**: process-local store for tests and single-node demos.
//! - **persistence**: PostgreSQL store using Diesel ORM.
//!
//! Adapters translate between domain documents and their storage shape.
//! They contain no membership rules.

pub mod memory;
pub mod persistence;
