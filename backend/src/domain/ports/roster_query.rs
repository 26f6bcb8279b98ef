//! Driving port for roster read projections.

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::domain::{
    ClassSessionView, ClusterId, ClusterView, Error, UserId, UserRole, UserSummary, UserView,
};

/// Domain use-case port for read-only roster views.
///
/// Projections are recomputed on every call and never write.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterQuery: Send + Sync {
    /// Users ordered by username, optionally restricted to one role.
    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<UserSummary>, Error>;

    async fn get_user(&self, user_id: &UserId) -> Result<UserView, Error>;

    async fn list_clusters(&self) -> Result<Vec<ClusterView>, Error>;

    async fn get_cluster(&self, cluster_id: &ClusterId) -> Result<ClusterView, Error>;

    async fn list_sessions(&self) -> Result<Vec<ClassSessionView>, Error>;

    /// Sessions listing the cluster. `NotFound` when the cluster is absent.
    async fn sessions_for_cluster(
        &self,
        cluster_id: &ClusterId,
    ) -> Result<Vec<ClassSessionView>, Error>;

    async fn sessions_on(&self, date: NaiveDate) -> Result<Vec<ClassSessionView>, Error>;

    /// Sessions the user teaches or attends. `NotFound` when the user is
    /// absent.
    async fn sessions_for_user(&self, user_id: &UserId) -> Result<Vec<ClassSessionView>, Error>;
}
