//! Assertions that every membership link is recorded on both sides.

use roster::domain::ports::EntityStore;
use roster::domain::{
    ClassSession, ClassSessionId, Cluster, ClusterId, SessionFilter, User, UserId,
};

/// Snapshot of every stored document.
pub struct StoreSnapshot {
    pub users: Vec<User>,
    pub clusters: Vec<Cluster>,
    pub sessions: Vec<ClassSession>,
}

/// Load all three collections.
pub async fn snapshot<S: EntityStore + ?Sized>(store: &S) -> StoreSnapshot {
    StoreSnapshot {
        users: store.list_users(None).await.expect("users load"),
        clusters: store.list_clusters().await.expect("clusters load"),
        sessions: store
            .list_sessions(SessionFilter::default())
            .await
            .expect("sessions load"),
    }
}

impl StoreSnapshot {
    fn user(&self, id: &UserId) -> &User {
        self.users
            .iter()
            .find(|user| user.id == *id)
            .unwrap_or_else(|| panic!("dangling user reference {id}"))
    }

    fn cluster(&self, id: &ClusterId) -> &Cluster {
        self.clusters
            .iter()
            .find(|cluster| cluster.id == *id)
            .unwrap_or_else(|| panic!("dangling cluster reference {id}"))
    }

    fn session(&self, id: &ClassSessionId) -> &ClassSession {
        self.sessions
            .iter()
            .find(|session| session.id == *id)
            .unwrap_or_else(|| panic!("dangling session reference {id}"))
    }

    /// Panic unless every forward reference has its back reference and
    /// vice versa.
    pub fn assert_mirrored(&self) {
        for cluster in &self.clusters {
            for student in &cluster.students {
                assert!(
                    self.user(student).in_cluster.contains(&cluster.id),
                    "{student} missing back link to cluster {}",
                    cluster.id
                );
            }
            for session in &cluster.in_class {
                assert!(
                    self.session(session).classcodes.contains(&cluster.id),
                    "session {session} does not list cluster {}",
                    cluster.id
                );
            }
        }
        for session in &self.sessions {
            for cluster in &session.classcodes {
                assert!(
                    self.cluster(cluster).in_class.contains(&session.id),
                    "cluster {cluster} missing back link to session {}",
                    session.id
                );
            }
            for attendee in session.attendees() {
                assert!(
                    self.user(&attendee).in_class.contains(&session.id),
                    "{attendee} missing back link to session {}",
                    session.id
                );
            }
        }
        for user in &self.users {
            for cluster in &user.in_cluster {
                assert!(
                    self.cluster(cluster).students.contains(&user.id),
                    "cluster {cluster} does not list {}",
                    user.id
                );
            }
            for session in &user.in_class {
                assert!(
                    self.session(session).attendees().contains(&user.id),
                    "session {session} does not list {}",
                    user.id
                );
            }
        }
    }
}
