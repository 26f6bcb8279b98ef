//! Roster backend library: users, clusters and class sessions kept
//! consistent across both sides of every membership link.
//!
//! Layout follows ports and adapters: `domain` holds entities, the
//! reconciler and the roster service; `inbound` exposes them over HTTP;
//! `outbound` provides the in-memory and PostgreSQL entity stores.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
