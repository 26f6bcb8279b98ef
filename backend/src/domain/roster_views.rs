//! Read projections with references resolved to summaries.

use std::collections::{BTreeSet, HashMap};

use chrono::{NaiveDate, NaiveTime};
use serde::Serialize;
use tracing::warn;

use super::{
    ClassSession, ClassSessionId, Cluster, ClusterId, ClusterName, User, UserId, UserRole,
    Username,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: Username,
    pub role: UserRole,
}

impl From<&User> for UserSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterSummary {
    pub id: ClusterId,
    pub name: ClusterName,
}

impl From<&Cluster> for ClusterSummary {
    fn from(cluster: &Cluster) -> Self {
        Self {
            id: cluster.id,
            name: cluster.name.clone(),
        }
    }
}

/// A cluster with its students resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterView {
    pub id: ClusterId,
    pub name: ClusterName,
    pub students: Vec<UserSummary>,
    pub session_ids: BTreeSet<ClassSessionId>,
}

/// A session with its clusters, teachers, and students resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassSessionView {
    pub id: ClassSessionId,
    pub kind: String,
    pub classroom: String,
    pub date: NaiveDate,
    pub start: NaiveTime,
    pub end: NaiveTime,
    pub clusters: Vec<ClusterSummary>,
    pub teachers: Vec<UserSummary>,
    pub students: Vec<UserSummary>,
    /// Set when no cluster is assigned to the session.
    pub unassigned: bool,
}

/// A user profile with cluster memberships resolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: UserId,
    pub username: Username,
    pub role: UserRole,
    pub clusters: Vec<ClusterSummary>,
    pub session_ids: BTreeSet<ClassSessionId>,
}

/// Lookup tables used to resolve ids while building views.
///
/// Ids with no entry are dropped from resolved lists and logged, since they
/// indicate a dangling reference.
#[derive(Debug, Default)]
pub struct ViewResolver {
    users: HashMap<UserId, UserSummary>,
    clusters: HashMap<ClusterId, ClusterSummary>,
}

impl ViewResolver {
    pub fn new<'a>(
        users: impl IntoIterator<Item = &'a User>,
        clusters: impl IntoIterator<Item = &'a Cluster>,
    ) -> Self {
        Self {
            users: users
                .into_iter()
                .map(|user| (user.id, UserSummary::from(user)))
                .collect(),
            clusters: clusters
                .into_iter()
                .map(|cluster| (cluster.id, ClusterSummary::from(cluster)))
                .collect(),
        }
    }

    fn users(&self, ids: &BTreeSet<UserId>, context: &str) -> Vec<UserSummary> {
        let mut resolved: Vec<UserSummary> = ids
            .iter()
            .filter_map(|id| {
                let summary = self.users.get(id).cloned();
                if summary.is_none() {
                    warn!(user = %id, context, "dangling user reference skipped");
                }
                summary
            })
            .collect();
        resolved.sort_by(|a, b| a.username.cmp(&b.username));
        resolved
    }

    fn clusters(&self, ids: &BTreeSet<ClusterId>, context: &str) -> Vec<ClusterSummary> {
        let mut resolved: Vec<ClusterSummary> = ids
            .iter()
            .filter_map(|id| {
                let summary = self.clusters.get(id).cloned();
                if summary.is_none() {
                    warn!(cluster = %id, context, "dangling cluster reference skipped");
                }
                summary
            })
            .collect();
        resolved.sort_by(|a, b| a.name.cmp(&b.name));
        resolved
    }

    #[must_use]
    pub fn cluster_view(&self, cluster: &Cluster) -> ClusterView {
        ClusterView {
            id: cluster.id,
            name: cluster.name.clone(),
            students: self.users(&cluster.students, "cluster.students"),
            session_ids: cluster.in_class.clone(),
        }
    }

    #[must_use]
    pub fn session_view(&self, session: &ClassSession) -> ClassSessionView {
        let schedule = session.details.schedule();
        ClassSessionView {
            id: session.id,
            kind: session.details.kind().to_owned(),
            classroom: session.details.classroom().to_owned(),
            date: schedule.date(),
            start: schedule.start(),
            end: schedule.end(),
            clusters: self.clusters(&session.classcodes, "session.classcodes"),
            teachers: self.users(&session.teachers, "session.teachers"),
            students: self.users(&session.students, "session.students"),
            unassigned: session.is_unassigned(),
        }
    }

    #[must_use]
    pub fn user_view(&self, user: &User) -> UserView {
        UserView {
            id: user.id,
            username: user.username.clone(),
            role: user.role,
            clusters: self.clusters(&user.in_cluster, "user.inCluster"),
            session_ids: user.in_class.clone(),
        }
    }
}
