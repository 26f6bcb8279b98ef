//! Domain primitives, aggregates, and services.
//!
//! Purpose: define the roster entities (users, clusters, class sessions),
//! the rules that keep their cross references consistent, and the driving
//! and driven ports that adapters plug into. Types here stay transport
//! agnostic; HTTP and persistence concerns live in `inbound` and `outbound`.
//!
//! Public surface:
//! - `Error` / `ErrorCode`: transport-agnostic failure payload.
//! - `User`, `Cluster`, `ClassSession`: stored documents.
//! - `Relation`, `ReferenceField`: the reference graph between them.
//! - `MembershipReconciler`, `CascadeDeleter`: consistency engine.
//! - `RosterService`: implementation of the `RosterCommand` and
//!   `RosterQuery` ports.

pub mod cascade;
pub mod class_session;
pub mod cluster;
pub mod error;
pub mod ids;
pub mod membership;
pub mod ports;
pub mod reconciler;
pub mod roster_service;
pub mod roster_views;
mod store_errors;
pub mod trace_id;
pub mod user;

pub use self::cascade::{CascadeDeleter, CascadeOutcome};
pub use self::class_session::{
    ClassSession, ClassSessionDetails, ClassSessionDetailsPatch, ClassSessionValidationError,
    SessionFilter, SessionSchedule,
};
pub use self::cluster::{CLUSTER_NAME_MAX, Cluster, ClusterName, ClusterValidationError};
pub use self::error::{Error, ErrorCode, ErrorValidationError};
pub use self::ids::{ClassSessionId, ClusterId, IdParseError, UserId};
pub use self::membership::{EntityKind, MembershipDiff, ReferenceField, Relation};
pub use self::reconciler::{MembershipReconciler, ReconcileOutcome};
pub use self::roster_service::RosterService;
pub use self::roster_views::{
    ClassSessionView, ClusterSummary, ClusterView, UserSummary, UserView, ViewResolver,
};
pub use self::trace_id::{TRACE_ID_HEADER, TraceId};
pub use self::user::{
    Capability, USERNAME_MAX, USERNAME_MIN, User, UserRole, UserValidationError, Username,
};
