//! In-memory entity store.
//!
//! Backs the server when no database is configured and gives integration
//! tests a real store without PostgreSQL. All three collections sit behind
//! one `tokio` read/write lock; each port call takes the lock once, so
//! individual calls are atomic but sequences of calls are not.

use std::collections::{BTreeSet, HashMap};

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;
use uuid::Uuid;

use crate::domain::ports::{EntityStore, EntityStoreError};
use crate::domain::{
    ClassSession, ClassSessionDetails, ClassSessionId, Cluster, ClusterId, ClusterName,
    EntityKind, ReferenceField, SessionFilter, User, UserId, UserRole, Username,
};

#[derive(Debug, Default)]
struct Collections {
    users: HashMap<UserId, User>,
    clusters: HashMap<ClusterId, Cluster>,
    sessions: HashMap<ClassSessionId, ClassSession>,
}

/// Mutable handle on one typed reference set, addressed by raw UUID.
enum RefSetMut<'a> {
    Users(&'a mut BTreeSet<UserId>),
    Clusters(&'a mut BTreeSet<ClusterId>),
    Sessions(&'a mut BTreeSet<ClassSessionId>),
}

impl RefSetMut<'_> {
    fn insert(&mut self, id: Uuid) {
        match self {
            Self::Users(set) => {
                set.insert(UserId::from_uuid(id));
            }
            Self::Clusters(set) => {
                set.insert(ClusterId::from_uuid(id));
            }
            Self::Sessions(set) => {
                set.insert(ClassSessionId::from_uuid(id));
            }
        }
    }

    fn remove(&mut self, id: Uuid) {
        match self {
            Self::Users(set) => {
                set.remove(&UserId::from_uuid(id));
            }
            Self::Clusters(set) => {
                set.remove(&ClusterId::from_uuid(id));
            }
            Self::Sessions(set) => {
                set.remove(&ClassSessionId::from_uuid(id));
            }
        }
    }

    fn replace(&mut self, ids: &BTreeSet<Uuid>) {
        match self {
            Self::Users(set) => **set = ids.iter().copied().map(UserId::from_uuid).collect(),
            Self::Clusters(set) => **set = ids.iter().copied().map(ClusterId::from_uuid).collect(),
            Self::Sessions(set) => {
                **set = ids.iter().copied().map(ClassSessionId::from_uuid).collect();
            }
        }
    }
}

impl Collections {
    fn ids_of(&self, kind: EntityKind) -> Vec<Uuid> {
        match kind {
            EntityKind::User => self.users.keys().copied().map(Uuid::from).collect(),
            EntityKind::Cluster => self.clusters.keys().copied().map(Uuid::from).collect(),
            EntityKind::ClassSession => self.sessions.keys().copied().map(Uuid::from).collect(),
        }
    }

    fn contains(&self, kind: EntityKind, id: Uuid) -> bool {
        match kind {
            EntityKind::User => self.users.contains_key(&UserId::from_uuid(id)),
            EntityKind::Cluster => self.clusters.contains_key(&ClusterId::from_uuid(id)),
            EntityKind::ClassSession => self.sessions.contains_key(&ClassSessionId::from_uuid(id)),
        }
    }

    /// Whether `holder` exists and its `field` lists `target`.
    fn field_lists(&self, field: ReferenceField, holder: Uuid, target: Uuid) -> bool {
        let user = || self.users.get(&UserId::from_uuid(holder));
        let cluster = || self.clusters.get(&ClusterId::from_uuid(holder));
        let session = || self.sessions.get(&ClassSessionId::from_uuid(holder));
        match field {
            ReferenceField::UserClusters => {
                user().is_some_and(|u| u.in_cluster.contains(&ClusterId::from_uuid(target)))
            }
            ReferenceField::UserSessions => {
                user().is_some_and(|u| u.in_class.contains(&ClassSessionId::from_uuid(target)))
            }
            ReferenceField::ClusterStudents => {
                cluster().is_some_and(|c| c.students.contains(&UserId::from_uuid(target)))
            }
            ReferenceField::ClusterSessions => cluster()
                .is_some_and(|c| c.in_class.contains(&ClassSessionId::from_uuid(target))),
            ReferenceField::SessionClusters => {
                session().is_some_and(|s| s.classcodes.contains(&ClusterId::from_uuid(target)))
            }
            ReferenceField::SessionTeachers => {
                session().is_some_and(|s| s.teachers.contains(&UserId::from_uuid(target)))
            }
            ReferenceField::SessionStudents => {
                session().is_some_and(|s| s.students.contains(&UserId::from_uuid(target)))
            }
        }
    }

    fn field_mut(&mut self, field: ReferenceField, holder: Uuid) -> Option<RefSetMut<'_>> {
        match field {
            ReferenceField::UserClusters => self
                .users
                .get_mut(&UserId::from_uuid(holder))
                .map(|user| RefSetMut::Clusters(&mut user.in_cluster)),
            ReferenceField::UserSessions => self
                .users
                .get_mut(&UserId::from_uuid(holder))
                .map(|user| RefSetMut::Sessions(&mut user.in_class)),
            ReferenceField::ClusterStudents => self
                .clusters
                .get_mut(&ClusterId::from_uuid(holder))
                .map(|cluster| RefSetMut::Users(&mut cluster.students)),
            ReferenceField::ClusterSessions => self
                .clusters
                .get_mut(&ClusterId::from_uuid(holder))
                .map(|cluster| RefSetMut::Sessions(&mut cluster.in_class)),
            ReferenceField::SessionClusters => self
                .sessions
                .get_mut(&ClassSessionId::from_uuid(holder))
                .map(|session| RefSetMut::Clusters(&mut session.classcodes)),
            ReferenceField::SessionTeachers => self
                .sessions
                .get_mut(&ClassSessionId::from_uuid(holder))
                .map(|session| RefSetMut::Users(&mut session.teachers)),
            ReferenceField::SessionStudents => self
                .sessions
                .get_mut(&ClassSessionId::from_uuid(holder))
                .map(|session| RefSetMut::Users(&mut session.students)),
        }
    }
}

/// Entity store holding every document in process memory.
#[derive(Debug, Default)]
pub struct InMemoryEntityStore {
    inner: RwLock<Collections>,
}

impl InMemoryEntityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl EntityStore for InMemoryEntityStore {
    async fn insert_user(&self, user: &User) -> Result<(), EntityStoreError> {
        let mut inner = self.inner.write().await;
        if inner.users.contains_key(&user.id) {
            return Err(EntityStoreError::duplicate(format!("user id {}", user.id)));
        }
        if inner.users.values().any(|u| u.username == user.username) {
            return Err(EntityStoreError::duplicate(format!(
                "username {}",
                user.username
            )));
        }
        inner.users.insert(user.id, user.clone());
        Ok(())
    }

    async fn find_user(&self, id: &UserId) -> Result<Option<User>, EntityStoreError> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_user_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, EntityStoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|user| &user.username == username)
            .cloned())
    }

    async fn list_users(&self, role: Option<UserRole>) -> Result<Vec<User>, EntityStoreError> {
        let inner = self.inner.read().await;
        let mut users: Vec<User> = inner
            .users
            .values()
            .filter(|user| role.is_none_or(|role| user.role == role))
            .cloned()
            .collect();
        users.sort_by(|a, b| a.username.cmp(&b.username));
        Ok(users)
    }

    async fn delete_user(&self, id: &UserId) -> Result<bool, EntityStoreError> {
        Ok(self.inner.write().await.users.remove(id).is_some())
    }

    async fn insert_cluster(&self, cluster: &Cluster) -> Result<(), EntityStoreError> {
        let mut inner = self.inner.write().await;
        if inner.clusters.contains_key(&cluster.id) {
            return Err(EntityStoreError::duplicate(format!(
                "cluster id {}",
                cluster.id
            )));
        }
        if inner.clusters.values().any(|c| c.name == cluster.name) {
            return Err(EntityStoreError::duplicate(format!(
                "cluster name {}",
                cluster.name
            )));
        }
        inner.clusters.insert(cluster.id, cluster.clone());
        Ok(())
    }

    async fn find_cluster(&self, id: &ClusterId) -> Result<Option<Cluster>, EntityStoreError> {
        Ok(self.inner.read().await.clusters.get(id).cloned())
    }

    async fn find_cluster_by_name(
        &self,
        name: &ClusterName,
    ) -> Result<Option<Cluster>, EntityStoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .clusters
            .values()
            .find(|cluster| &cluster.name == name)
            .cloned())
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>, EntityStoreError> {
        let inner = self.inner.read().await;
        let mut clusters: Vec<Cluster> = inner.clusters.values().cloned().collect();
        clusters.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(clusters)
    }

    async fn rename_cluster(
        &self,
        id: &ClusterId,
        name: &ClusterName,
    ) -> Result<bool, EntityStoreError> {
        let mut inner = self.inner.write().await;
        if inner
            .clusters
            .values()
            .any(|cluster| &cluster.name == name && cluster.id != *id)
        {
            return Err(EntityStoreError::duplicate(format!("cluster name {name}")));
        }
        Ok(match inner.clusters.get_mut(id) {
            Some(cluster) => {
                cluster.name = name.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_cluster(&self, id: &ClusterId) -> Result<bool, EntityStoreError> {
        Ok(self.inner.write().await.clusters.remove(id).is_some())
    }

    async fn insert_session(&self, session: &ClassSession) -> Result<(), EntityStoreError> {
        let mut inner = self.inner.write().await;
        if inner.sessions.contains_key(&session.id) {
            return Err(EntityStoreError::duplicate(format!(
                "class session id {}",
                session.id
            )));
        }
        inner.sessions.insert(session.id, session.clone());
        Ok(())
    }

    async fn find_session(
        &self,
        id: &ClassSessionId,
    ) -> Result<Option<ClassSession>, EntityStoreError> {
        Ok(self.inner.read().await.sessions.get(id).cloned())
    }

    async fn list_sessions(
        &self,
        filter: SessionFilter,
    ) -> Result<Vec<ClassSession>, EntityStoreError> {
        let inner = self.inner.read().await;
        let mut sessions: Vec<ClassSession> = inner
            .sessions
            .values()
            .filter(|session| filter.matches(session))
            .cloned()
            .collect();
        sessions.sort_by_key(|session| {
            let schedule = session.details.schedule();
            (schedule.date(), schedule.start(), session.id)
        });
        Ok(sessions)
    }

    async fn update_session_details(
        &self,
        id: &ClassSessionId,
        details: &ClassSessionDetails,
    ) -> Result<bool, EntityStoreError> {
        let mut inner = self.inner.write().await;
        Ok(match inner.sessions.get_mut(id) {
            Some(session) => {
                session.details = details.clone();
                true
            }
            None => false,
        })
    }

    async fn delete_session(&self, id: &ClassSessionId) -> Result<bool, EntityStoreError> {
        Ok(self.inner.write().await.sessions.remove(id).is_some())
    }

    async fn existing_ids(
        &self,
        kind: EntityKind,
        ids: &BTreeSet<Uuid>,
    ) -> Result<BTreeSet<Uuid>, EntityStoreError> {
        let inner = self.inner.read().await;
        Ok(ids
            .iter()
            .copied()
            .filter(|id| inner.contains(kind, *id))
            .collect())
    }

    async fn holders_of(
        &self,
        field: ReferenceField,
        target: Uuid,
    ) -> Result<BTreeSet<Uuid>, EntityStoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .ids_of(field.holder())
            .into_iter()
            .filter(|holder| inner.field_lists(field, *holder, target))
            .collect())
    }

    async fn add_reference(
        &self,
        field: ReferenceField,
        holders: &BTreeSet<Uuid>,
        target: Uuid,
    ) -> Result<(), EntityStoreError> {
        let mut inner = self.inner.write().await;
        for holder in holders {
            match inner.field_mut(field, *holder) {
                Some(mut set) => set.insert(target),
                None => debug!(%field, %holder, "skipping add on missing holder"),
            }
        }
        Ok(())
    }

    async fn remove_reference(
        &self,
        field: ReferenceField,
        holders: &BTreeSet<Uuid>,
        target: Uuid,
    ) -> Result<(), EntityStoreError> {
        let mut inner = self.inner.write().await;
        for holder in holders {
            if let Some(mut set) = inner.field_mut(field, *holder) {
                set.remove(target);
            }
        }
        Ok(())
    }

    async fn replace_references(
        &self,
        field: ReferenceField,
        holder: Uuid,
        targets: &BTreeSet<Uuid>,
    ) -> Result<(), EntityStoreError> {
        let mut inner = self.inner.write().await;
        match inner.field_mut(field, holder) {
            Some(mut set) => set.replace(targets),
            None => debug!(%field, %holder, "skipping replace on missing holder"),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn user(name: &str) -> User {
        User::new(
            UserId::random(),
            Username::new(name).expect("valid username"),
            UserRole::Student,
        )
    }

    #[fixture]
    fn store() -> InMemoryEntityStore {
        InMemoryEntityStore::new()
    }

    #[rstest]
    #[tokio::test]
    async fn usernames_are_unique(store: InMemoryEntityStore) {
        store.insert_user(&user("ada")).await.expect("first insert");
        let err = store
            .insert_user(&user("ada"))
            .await
            .expect_err("duplicate username");
        assert!(matches!(err, EntityStoreError::Duplicate { .. }));
    }

    #[rstest]
    #[tokio::test]
    async fn add_reference_has_set_semantics(store: InMemoryEntityStore) {
        let ada = user("ada");
        store.insert_user(&ada).await.expect("insert");
        let cluster = Uuid::new_v4();
        let holders = BTreeSet::from([ada.id.into()]);

        store
            .add_reference(ReferenceField::UserClusters, &holders, cluster)
            .await
            .expect("first add");
        store
            .add_reference(ReferenceField::UserClusters, &holders, cluster)
            .await
            .expect("second add");

        let stored = store.find_user(&ada.id).await.expect("find").expect("exists");
        assert_eq!(stored.in_cluster.len(), 1);
        assert_eq!(
            store
                .holders_of(ReferenceField::UserClusters, cluster)
                .await
                .expect("holders"),
            holders
        );
    }

    #[rstest]
    #[tokio::test]
    async fn missing_holders_are_skipped(store: InMemoryEntityStore) {
        let ghost = BTreeSet::from([Uuid::new_v4()]);
        store
            .add_reference(ReferenceField::ClusterStudents, &ghost, Uuid::new_v4())
            .await
            .expect("skip silently");
        assert!(store.list_clusters().await.expect("list").is_empty());
    }

    #[rstest]
    #[tokio::test]
    async fn rename_refuses_names_held_by_other_clusters(store: InMemoryEntityStore) {
        let a = Cluster::new(
            ClusterId::random(),
            ClusterName::new("A").expect("name"),
            BTreeSet::new(),
        );
        let b = Cluster::new(
            ClusterId::random(),
            ClusterName::new("B").expect("name"),
            BTreeSet::new(),
        );
        store.insert_cluster(&a).await.expect("insert a");
        store.insert_cluster(&b).await.expect("insert b");

        let err = store
            .rename_cluster(&b.id, &a.name)
            .await
            .expect_err("name taken");
        assert!(matches!(err, EntityStoreError::Duplicate { .. }));
        assert!(store.rename_cluster(&a.id, &a.name).await.expect("same name"));
        assert!(!store
            .rename_cluster(&ClusterId::random(), &ClusterName::new("C").expect("name"))
            .await
            .expect("missing cluster"));
    }

    #[rstest]
    #[tokio::test]
    async fn list_users_filters_by_role(store: InMemoryEntityStore) {
        let mut teacher = user("grace");
        teacher.role = UserRole::Teacher;
        store.insert_user(&teacher).await.expect("insert");
        store.insert_user(&user("ada")).await.expect("insert");

        let teachers = store
            .list_users(Some(UserRole::Teacher))
            .await
            .expect("list");
        assert_eq!(teachers, vec![teacher]);
        let everyone = store.list_users(None).await.expect("list");
        let names: Vec<&str> = everyone.iter().map(|u| u.username.as_ref()).collect();
        assert_eq!(names, ["ada", "grace"]);
    }
}
