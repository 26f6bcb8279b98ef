//! Driving port for roster mutations.
//!
//! Every operation keeps users, clusters, and class sessions mutually
//! consistent: forward fields are written on the owning document and the
//! matching back-references are reconciled before the call returns.

use std::collections::BTreeSet;

use async_trait::async_trait;

use crate::domain::{
    CascadeOutcome, ClassSession, ClassSessionDetails, ClassSessionDetailsPatch, ClassSessionId,
    Cluster, ClusterId, ClusterName, Error, User, UserId, UserRole, Username,
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateUserRequest {
    pub username: Username,
    pub role: UserRole,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateClusterRequest {
    pub name: ClusterName,
    pub students: BTreeSet<UserId>,
}

/// `None` leaves a field unchanged; `Some(empty)` clears the roster.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateClusterRequest {
    pub name: Option<ClusterName>,
    pub students: Option<BTreeSet<UserId>>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateClassSessionRequest {
    pub details: ClassSessionDetails,
    pub classcodes: BTreeSet<ClusterId>,
    pub teachers: BTreeSet<UserId>,
    pub students: BTreeSet<UserId>,
}

/// Partial session update. Omitted membership sets are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateClassSessionRequest {
    pub details: ClassSessionDetailsPatch,
    pub classcodes: Option<BTreeSet<ClusterId>>,
    pub teachers: Option<BTreeSet<UserId>>,
    pub students: Option<BTreeSet<UserId>>,
}

/// Domain use-case port for roster mutations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RosterCommand: Send + Sync {
    async fn create_user(&self, request: CreateUserRequest) -> Result<User, Error>;

    /// Delete a user and strip them from every cluster and session.
    async fn remove_user(&self, user_id: &UserId) -> Result<CascadeOutcome, Error>;

    async fn create_cluster(&self, request: CreateClusterRequest) -> Result<Cluster, Error>;

    async fn update_cluster(
        &self,
        cluster_id: &ClusterId,
        request: UpdateClusterRequest,
    ) -> Result<Cluster, Error>;

    async fn add_cluster_student(
        &self,
        cluster_id: &ClusterId,
        user_id: &UserId,
    ) -> Result<Cluster, Error>;

    async fn remove_cluster_student(
        &self,
        cluster_id: &ClusterId,
        user_id: &UserId,
    ) -> Result<Cluster, Error>;

    /// Delete a cluster. Sessions that listed it are kept.
    async fn delete_cluster(&self, cluster_id: &ClusterId) -> Result<CascadeOutcome, Error>;

    async fn create_class_session(
        &self,
        request: CreateClassSessionRequest,
    ) -> Result<ClassSession, Error>;

    async fn update_class_session(
        &self,
        session_id: &ClassSessionId,
        request: UpdateClassSessionRequest,
    ) -> Result<ClassSession, Error>;

    async fn delete_class_session(
        &self,
        session_id: &ClassSessionId,
    ) -> Result<CascadeOutcome, Error>;
}
