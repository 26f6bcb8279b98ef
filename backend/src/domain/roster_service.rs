//! Roster domain service.
//!
//! Implements the [`RosterCommand`] and [`RosterQuery`] driving ports on top
//! of an [`EntityStore`]. Each mutation validates every referenced id before
//! its first write, then writes the owning document's forward fields and
//! hands the back-references to the [`MembershipReconciler`]. Deletes go
//! through the [`CascadeDeleter`].
//!
//! There are no transactions. Every step is idempotent, so a failed
//! operation is recovered by retrying it in full.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::info;
use uuid::Uuid;

use super::cascade::{CascadeDeleter, CascadeOutcome};
use super::membership::{EntityKind, ReferenceField, Relation, uuid_set};
use super::ports::{
    CreateClassSessionRequest, CreateClusterRequest, CreateUserRequest, EntityStore,
    RosterCommand, RosterQuery, UpdateClassSessionRequest, UpdateClusterRequest,
};
use super::reconciler::MembershipReconciler;
use super::roster_views::{ClassSessionView, ClusterView, UserSummary, UserView, ViewResolver};
use super::store_errors::{duplicate_conflict, map_store_error};
use super::{
    ClassSession, ClassSessionId, Cluster, ClusterId, ClusterName, Error, SessionFilter, User,
    UserId, UserRole,
};

/// Roster service implementing the driving ports.
pub struct RosterService<S: ?Sized> {
    store: Arc<S>,
    reconciler: MembershipReconciler<S>,
    cascade: CascadeDeleter<S>,
}

impl<S: ?Sized> Clone for RosterService<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            reconciler: self.reconciler.clone(),
            cascade: self.cascade.clone(),
        }
    }
}

impl<S> RosterService<S>
where
    S: EntityStore + ?Sized,
{
    /// Create a new service over the given store.
    pub fn new(store: Arc<S>) -> Self {
        Self {
            reconciler: MembershipReconciler::new(Arc::clone(&store)),
            cascade: CascadeDeleter::new(Arc::clone(&store)),
            store,
        }
    }

    async fn require_user(&self, id: &UserId) -> Result<User, Error> {
        self.store
            .find_user(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("user {id} not found")))
    }

    async fn require_cluster(&self, id: &ClusterId) -> Result<Cluster, Error> {
        self.store
            .find_cluster(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("cluster {id} not found")))
    }

    async fn require_session(&self, id: &ClassSessionId) -> Result<ClassSession, Error> {
        self.store
            .find_session(id)
            .await
            .map_err(map_store_error)?
            .ok_or_else(|| Error::not_found(format!("class session {id} not found")))
    }

    async fn ensure_name_free(&self, name: &ClusterName, owner: Option<ClusterId>) -> Result<(), Error> {
        let existing = self
            .store
            .find_cluster_by_name(name)
            .await
            .map_err(map_store_error)?;
        match existing {
            Some(cluster) if Some(cluster.id) != owner => {
                Err(duplicate_conflict(&format!("cluster name {name}")))
            }
            _ => Ok(()),
        }
    }

    async fn ensure_references(
        &self,
        field: ReferenceField,
        ids: Option<&BTreeSet<Uuid>>,
    ) -> Result<(), Error> {
        match ids {
            Some(ids) => {
                self.reconciler
                    .ensure_exist(field.target(), field.as_str(), ids)
                    .await
            }
            None => Ok(()),
        }
    }

    /// Overwrite a cluster roster and reconcile `User.in_cluster`.
    async fn write_cluster_students(
        &self,
        cluster_id: ClusterId,
        students: &BTreeSet<UserId>,
    ) -> Result<(), Error> {
        let desired = uuid_set(students.iter().copied());
        let owner = cluster_id.into();
        self.store
            .replace_references(ReferenceField::ClusterStudents, owner, &desired)
            .await
            .map_err(map_store_error)?;
        self.reconciler
            .apply(Relation::ClusterStudents, owner, &desired)
            .await?;
        Ok(())
    }

    async fn replace_session_field(
        &self,
        field: ReferenceField,
        session_id: ClassSessionId,
        targets: &BTreeSet<Uuid>,
    ) -> Result<(), Error> {
        self.store
            .replace_references(field, session_id.into(), targets)
            .await
            .map_err(map_store_error)
    }

    async fn resolver(&self) -> Result<ViewResolver, Error> {
        let users = self.store.list_users(None).await.map_err(map_store_error)?;
        let clusters = self.store.list_clusters().await.map_err(map_store_error)?;
        Ok(ViewResolver::new(&users, &clusters))
    }

    async fn session_views(&self, filter: SessionFilter) -> Result<Vec<ClassSessionView>, Error> {
        let sessions = self
            .store
            .list_sessions(filter)
            .await
            .map_err(map_store_error)?;
        if sessions.is_empty() {
            return Ok(Vec::new());
        }
        let resolver = self.resolver().await?;
        Ok(sessions
            .iter()
            .map(|session| resolver.session_view(session))
            .collect())
    }
}

#[async_trait]
impl<S> RosterCommand for RosterService<S>
where
    S: EntityStore + ?Sized,
{
    async fn create_user(&self, request: CreateUserRequest) -> Result<User, Error> {
        let CreateUserRequest { username, role } = request;
        if self
            .store
            .find_user_by_username(&username)
            .await
            .map_err(map_store_error)?
            .is_some()
        {
            return Err(duplicate_conflict(&format!("username {username}")));
        }

        let user = User::new(UserId::random(), username, role);
        self.store
            .insert_user(&user)
            .await
            .map_err(map_store_error)?;
        info!(user = %user.id, role = %user.role, "user created");
        Ok(user)
    }

    async fn remove_user(&self, user_id: &UserId) -> Result<CascadeOutcome, Error> {
        self.cascade
            .cascade_delete(EntityKind::User, (*user_id).into())
            .await
    }

    async fn create_cluster(&self, request: CreateClusterRequest) -> Result<Cluster, Error> {
        let CreateClusterRequest { name, students } = request;
        self.ensure_name_free(&name, None).await?;
        let desired = uuid_set(students.iter().copied());
        self.ensure_references(ReferenceField::ClusterStudents, Some(&desired))
            .await?;

        let cluster = Cluster::new(ClusterId::random(), name, students);
        self.store
            .insert_cluster(&cluster)
            .await
            .map_err(map_store_error)?;
        self.reconciler
            .apply(Relation::ClusterStudents, cluster.id.into(), &desired)
            .await?;
        info!(cluster = %cluster.id, students = cluster.students.len(), "cluster created");
        Ok(cluster)
    }

    async fn update_cluster(
        &self,
        cluster_id: &ClusterId,
        request: UpdateClusterRequest,
    ) -> Result<Cluster, Error> {
        let current = self.require_cluster(cluster_id).await?;
        let rename = request.name.filter(|name| *name != current.name);
        if let Some(name) = &rename {
            self.ensure_name_free(name, Some(current.id)).await?;
        }
        let desired = request.students.as_ref().map(|ids| uuid_set(ids.iter().copied()));
        self.ensure_references(ReferenceField::ClusterStudents, desired.as_ref())
            .await?;

        if let Some(name) = &rename {
            let renamed = self
                .store
                .rename_cluster(cluster_id, name)
                .await
                .map_err(map_store_error)?;
            if !renamed {
                return Err(Error::not_found(format!("cluster {cluster_id} not found")));
            }
        }
        if let Some(students) = &request.students {
            self.write_cluster_students(current.id, students).await?;
        }
        self.require_cluster(cluster_id).await
    }

    async fn add_cluster_student(
        &self,
        cluster_id: &ClusterId,
        user_id: &UserId,
    ) -> Result<Cluster, Error> {
        let cluster = self.require_cluster(cluster_id).await?;
        self.require_user(user_id).await?;
        if cluster.students.contains(user_id) {
            return Ok(cluster);
        }
        let mut students = cluster.students;
        students.insert(*user_id);
        self.write_cluster_students(cluster.id, &students).await?;
        self.require_cluster(cluster_id).await
    }

    async fn remove_cluster_student(
        &self,
        cluster_id: &ClusterId,
        user_id: &UserId,
    ) -> Result<Cluster, Error> {
        let cluster = self.require_cluster(cluster_id).await?;
        if !cluster.students.contains(user_id) {
            return Ok(cluster);
        }
        let mut students = cluster.students;
        students.remove(user_id);
        self.write_cluster_students(cluster.id, &students).await?;
        self.require_cluster(cluster_id).await
    }

    async fn delete_cluster(&self, cluster_id: &ClusterId) -> Result<CascadeOutcome, Error> {
        self.cascade
            .cascade_delete(EntityKind::Cluster, (*cluster_id).into())
            .await
    }

    async fn create_class_session(
        &self,
        request: CreateClassSessionRequest,
    ) -> Result<ClassSession, Error> {
        let CreateClassSessionRequest {
            details,
            classcodes,
            teachers,
            students,
        } = request;
        let cluster_ids = uuid_set(classcodes.iter().copied());
        let teacher_ids = uuid_set(teachers.iter().copied());
        let student_ids = uuid_set(students.iter().copied());
        self.ensure_references(ReferenceField::SessionClusters, Some(&cluster_ids))
            .await?;
        self.ensure_references(ReferenceField::SessionTeachers, Some(&teacher_ids))
            .await?;
        self.ensure_references(ReferenceField::SessionStudents, Some(&student_ids))
            .await?;

        let mut session = ClassSession::new(ClassSessionId::random(), details);
        session.classcodes = classcodes;
        session.teachers = teachers;
        session.students = students;
        self.store
            .insert_session(&session)
            .await
            .map_err(map_store_error)?;

        let owner = session.id.into();
        self.reconciler
            .apply(Relation::SessionClusters, owner, &cluster_ids)
            .await?;
        self.reconciler
            .apply(
                Relation::SessionAttendees,
                owner,
                &uuid_set(session.attendees()),
            )
            .await?;
        info!(
            session = %session.id,
            clusters = session.classcodes.len(),
            teachers = session.teachers.len(),
            students = session.students.len(),
            "class session created"
        );
        Ok(session)
    }

    async fn update_class_session(
        &self,
        session_id: &ClassSessionId,
        request: UpdateClassSessionRequest,
    ) -> Result<ClassSession, Error> {
        let current = self.require_session(session_id).await?;
        let UpdateClassSessionRequest {
            details,
            classcodes,
            teachers,
            students,
        } = request;

        let merged = if details.is_empty() {
            None
        } else {
            let merged = details
                .apply_to(&current.details)
                .map_err(Error::from)?;
            Some(merged)
        };
        let cluster_ids = classcodes.as_ref().map(|ids| uuid_set(ids.iter().copied()));
        let teacher_ids = teachers.as_ref().map(|ids| uuid_set(ids.iter().copied()));
        let student_ids = students.as_ref().map(|ids| uuid_set(ids.iter().copied()));
        self.ensure_references(ReferenceField::SessionClusters, cluster_ids.as_ref())
            .await?;
        self.ensure_references(ReferenceField::SessionTeachers, teacher_ids.as_ref())
            .await?;
        self.ensure_references(ReferenceField::SessionStudents, student_ids.as_ref())
            .await?;

        if let Some(merged) = &merged {
            let updated = self
                .store
                .update_session_details(session_id, merged)
                .await
                .map_err(map_store_error)?;
            if !updated {
                return Err(Error::not_found(format!(
                    "class session {session_id} not found"
                )));
            }
        }

        let owner = current.id.into();
        if let Some(cluster_ids) = &cluster_ids {
            self.replace_session_field(ReferenceField::SessionClusters, current.id, cluster_ids)
                .await?;
            self.reconciler
                .apply(Relation::SessionClusters, owner, cluster_ids)
                .await?;
        }

        if teacher_ids.is_some() || student_ids.is_some() {
            if let Some(ids) = &teacher_ids {
                self.replace_session_field(ReferenceField::SessionTeachers, current.id, ids)
                    .await?;
            }
            if let Some(ids) = &student_ids {
                self.replace_session_field(ReferenceField::SessionStudents, current.id, ids)
                    .await?;
            }
            let teachers = teachers.unwrap_or(current.teachers);
            let students = students.unwrap_or(current.students);
            let attendees = uuid_set(teachers.union(&students).copied());
            self.reconciler
                .apply(Relation::SessionAttendees, owner, &attendees)
                .await?;
        }

        self.require_session(session_id).await
    }

    async fn delete_class_session(
        &self,
        session_id: &ClassSessionId,
    ) -> Result<CascadeOutcome, Error> {
        self.cascade
            .cascade_delete(EntityKind::ClassSession, (*session_id).into())
            .await
    }
}

#[async_trait]
impl<S> RosterQuery for RosterService<S>
where
    S: EntityStore + ?Sized,
{
    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<UserSummary>, Error> {
        let users = self.store.list_users(role).await.map_err(map_store_error)?;
        Ok(users.iter().map(UserSummary::from).collect())
    }

    async fn get_user(&self, user_id: &UserId) -> Result<UserView, Error> {
        let user = self.require_user(user_id).await?;
        let resolver = self.resolver().await?;
        Ok(resolver.user_view(&user))
    }

    async fn list_clusters(&self) -> Result<Vec<ClusterView>, Error> {
        let users = self.store.list_users(None).await.map_err(map_store_error)?;
        let clusters = self.store.list_clusters().await.map_err(map_store_error)?;
        let resolver = ViewResolver::new(&users, &clusters);
        Ok(clusters
            .iter()
            .map(|cluster| resolver.cluster_view(cluster))
            .collect())
    }

    async fn get_cluster(&self, cluster_id: &ClusterId) -> Result<ClusterView, Error> {
        let cluster = self.require_cluster(cluster_id).await?;
        let resolver = self.resolver().await?;
        Ok(resolver.cluster_view(&cluster))
    }

    async fn list_sessions(&self) -> Result<Vec<ClassSessionView>, Error> {
        self.session_views(SessionFilter::default()).await
    }

    async fn sessions_for_cluster(
        &self,
        cluster_id: &ClusterId,
    ) -> Result<Vec<ClassSessionView>, Error> {
        self.require_cluster(cluster_id).await?;
        self.session_views(SessionFilter::for_cluster(*cluster_id))
            .await
    }

    async fn sessions_on(&self, date: NaiveDate) -> Result<Vec<ClassSessionView>, Error> {
        self.session_views(SessionFilter::on(date)).await
    }

    async fn sessions_for_user(&self, user_id: &UserId) -> Result<Vec<ClassSessionView>, Error> {
        self.require_user(user_id).await?;
        self.session_views(SessionFilter::for_attendee(*user_id))
            .await
    }
}

#[cfg(test)]
#[path = "roster_service_tests.rs"]
mod tests;
