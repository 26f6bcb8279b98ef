//! Driven port for the three roster collections and their reference fields.
//!
//! Documents are stored independently. The store enforces id and name
//! uniqueness only; cross-collection consistency is the job of the
//! membership reconciler and the cascade deleter.

use std::collections::BTreeSet;

use async_trait::async_trait;
use uuid::Uuid;

use crate::domain::{
    ClassSession, ClassSessionDetails, ClassSessionId, Cluster, ClusterId, ClusterName,
    EntityKind, ReferenceField, SessionFilter, User, UserId, UserRole, Username,
};

use super::define_port_error;

define_port_error! {
    /// Errors raised by entity store adapters.
    pub enum EntityStoreError {
        /// The backing store could not be reached.
        Connection => "entity store connection failed: {message}",
        /// Query or mutation failed during execution.
        Query => "entity store query failed: {message}",
        /// A unique username or cluster name is already taken.
        Duplicate => "entity store rejected duplicate: {message}",
    }
}

/// Persistence operations used by the roster service.
///
/// `delete_*`, `rename_cluster`, and `update_session_details` return
/// `false` when the target document does not exist. Reference operations
/// silently skip holders that do not exist.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn insert_user(&self, user: &User) -> Result<(), EntityStoreError>;

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, EntityStoreError>;

    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, EntityStoreError>;

    /// Users ordered by username, optionally restricted to one role.
    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>, EntityStoreError>;

    async fn delete_user(&self, id: &UserId) -> Result<bool, EntityStoreError>;

    async fn insert_cluster(&self, cluster: &Cluster) -> Result<(), EntityStoreError>;

    async fn find_cluster(&self, id: &ClusterId) -> Result<Option<Cluster>, EntityStoreError>;

    async fn find_cluster_by_name(
        &self,
        name: &ClusterName,
    ) -> Result<Option<Cluster>, EntityStoreError>;

    /// Clusters ordered by name.
    async fn list_clusters(&self) -> Result<Vec<Cluster>, EntityStoreError>;

    async fn rename_cluster(
        &self,
        id: &ClusterId,
        name: &ClusterName,
    ) -> Result<bool, EntityStoreError>;

    async fn delete_cluster(&self, id: &ClusterId) -> Result<bool, EntityStoreError>;

    async fn insert_session(&self, session: &ClassSession) -> Result<(), EntityStoreError>;

    async fn find_session(
        &self,
        id: &ClassSessionId,
    ) -> Result<Option<ClassSession>, EntityStoreError>;

    /// Sessions matching `filter`, ordered by date then start time.
    async fn list_sessions(
        &self,
        filter: SessionFilter,
    ) -> Result<Vec<ClassSession>, EntityStoreError>;

    /// Overwrite the descriptive attributes, leaving reference fields alone.
    async fn update_session_details(
        &self,
        id: &ClassSessionId,
        details: &ClassSessionDetails,
    ) -> Result<bool, EntityStoreError>;

    async fn delete_session(&self, id: &ClassSessionId) -> Result<bool, EntityStoreError>;

    /// The subset of `ids` naming existing documents of `kind`.
    async fn existing_ids(
        &self,
        kind: EntityKind,
        ids: &BTreeSet<Uuid>,
    ) -> Result<BTreeSet<Uuid>, EntityStoreError>;

    /// Ids of the `field.holder()` documents whose `field` contains `target`.
    async fn holders_of(
        &self,
        field: ReferenceField,
        target: Uuid,
    ) -> Result<BTreeSet<Uuid>, EntityStoreError>;

    /// Add `target` to `field` on every holder (set semantics).
    async fn add_reference(
        &self,
        field: ReferenceField,
        holders: &BTreeSet<Uuid>,
        target: Uuid,
    ) -> Result<(), EntityStoreError>;

    /// Remove `target` from `field` on every holder.
    async fn remove_reference(
        &self,
        field: ReferenceField,
        holders: &BTreeSet<Uuid>,
        target: Uuid,
    ) -> Result<(), EntityStoreError>;

    /// Overwrite `field` on a single holder.
    async fn replace_references(
        &self,
        field: ReferenceField,
        holder: Uuid,
        targets: &BTreeSet<Uuid>,
    ) -> Result<(), EntityStoreError>;
}
