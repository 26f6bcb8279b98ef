//! Cascade deletion.
//!
//! Before a document is removed, its id is stripped from every reference
//! field that can point at it. Cleanup always precedes the primary delete so
//! a failure part way leaves the document in place and a retry finishes the
//! job.

use std::collections::BTreeSet;
use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use super::ids::{ClassSessionId, ClusterId, UserId};
use super::membership::{EntityKind, ReferenceField};
use super::ports::EntityStore;
use super::store_errors::map_store_error;
use super::Error;

/// Summary of a completed cascade delete.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub kind: EntityKind,
    pub id: Uuid,
    /// Number of holder documents that lost a reference.
    pub references_removed: usize,
    /// Sessions left without any cluster by this delete.
    pub unassigned_sessions: BTreeSet<ClassSessionId>,
}

/// Deletes documents together with every reference to them.
pub struct CascadeDeleter<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for CascadeDeleter<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> CascadeDeleter<S>
where
    S: EntityStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Strip every reference to `id` and then delete it.
    ///
    /// Deleting a cluster keeps the sessions that listed it; those left with
    /// no cluster are reported in [`CascadeOutcome::unassigned_sessions`].
    pub async fn cascade_delete(&self, kind: EntityKind, id: Uuid) -> Result<CascadeOutcome, Error> {
        let found = self
            .store
            .existing_ids(kind, &BTreeSet::from([id]))
            .await
            .map_err(map_store_error)?;
        if found.is_empty() {
            return Err(Error::not_found(format!("{kind} {id} not found")));
        }

        let mut references_removed = 0;
        let mut unassigned_sessions = BTreeSet::new();
        for field in ReferenceField::referencing(kind) {
            let holders = self
                .store
                .holders_of(field, id)
                .await
                .map_err(map_store_error)?;
            if holders.is_empty() {
                continue;
            }
            self.store
                .remove_reference(field, &holders, id)
                .await
                .map_err(map_store_error)?;
            references_removed += holders.len();
            if field == ReferenceField::SessionClusters {
                unassigned_sessions.extend(self.unassigned_among(&holders).await?);
            }
        }

        if !self.delete_primary(kind, id).await? {
            return Err(Error::not_found(format!("{kind} {id} not found")));
        }

        for session in &unassigned_sessions {
            warn!(%session, cluster = %id, "class session left without a cluster");
        }
        info!(%kind, %id, references_removed, "entity deleted with cascade");

        Ok(CascadeOutcome {
            kind,
            id,
            references_removed,
            unassigned_sessions,
        })
    }

    async fn unassigned_among(
        &self,
        sessions: &BTreeSet<Uuid>,
    ) -> Result<BTreeSet<ClassSessionId>, Error> {
        let mut unassigned = BTreeSet::new();
        for raw in sessions {
            let session_id = ClassSessionId::from_uuid(*raw);
            let session = self
                .store
                .find_session(&session_id)
                .await
                .map_err(map_store_error)?;
            if session.is_some_and(|session| session.is_unassigned()) {
                unassigned.insert(session_id);
            }
        }
        Ok(unassigned)
    }

    async fn delete_primary(&self, kind: EntityKind, id: Uuid) -> Result<bool, Error> {
        let deleted = match kind {
            EntityKind::User => self.store.delete_user(&UserId::from_uuid(id)).await,
            EntityKind::Cluster => self.store.delete_cluster(&ClusterId::from_uuid(id)).await,
            EntityKind::ClassSession => {
                self.store
                    .delete_session(&ClassSessionId::from_uuid(id))
                    .await
            }
        };
        deleted.map_err(map_store_error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{EntityStoreError, MockEntityStore};
    use crate::domain::{ClassSession, ClassSessionDetails, ErrorCode, SessionSchedule};
    use chrono::{NaiveDate, NaiveTime};
    use mockall::Sequence;
    use mockall::predicate::{always, eq};
    use rstest::rstest;

    fn session_without_clusters(id: Uuid) -> ClassSession {
        let date = NaiveDate::from_ymd_opt(2024, 3, 4).expect("date");
        let schedule = SessionSchedule::new(
            date,
            NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
            NaiveTime::from_hms_opt(10, 0, 0).expect("time"),
        )
        .expect("schedule");
        let details = ClassSessionDetails::new("Listening", "", schedule).expect("details");
        ClassSession::new(ClassSessionId::from_uuid(id), details)
    }

    #[rstest]
    #[tokio::test]
    async fn cluster_delete_strips_users_and_sessions_before_deleting() {
        let cluster = Uuid::from_u128(1);
        let user = Uuid::from_u128(2);
        let session = Uuid::from_u128(3);
        let mut seq = Sequence::new();
        let mut store = MockEntityStore::new();

        store
            .expect_existing_ids()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, ids| Ok(ids.clone()));
        store
            .expect_holders_of()
            .with(eq(ReferenceField::UserClusters), eq(cluster))
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_, _| Ok(BTreeSet::from([user])));
        store
            .expect_remove_reference()
            .with(
                eq(ReferenceField::UserClusters),
                eq(BTreeSet::from([user])),
                eq(cluster),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        store
            .expect_holders_of()
            .with(eq(ReferenceField::SessionClusters), eq(cluster))
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_, _| Ok(BTreeSet::from([session])));
        store
            .expect_remove_reference()
            .with(
                eq(ReferenceField::SessionClusters),
                eq(BTreeSet::from([session])),
                eq(cluster),
            )
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_, _, _| Ok(()));
        store
            .expect_find_session()
            .times(1)
            .in_sequence(&mut seq)
            .return_once(move |_| Ok(Some(session_without_clusters(session))));
        store
            .expect_delete_cluster()
            .with(eq(ClusterId::from_uuid(cluster)))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(true));

        let deleter = CascadeDeleter::new(Arc::new(store));
        let outcome = deleter
            .cascade_delete(EntityKind::Cluster, cluster)
            .await
            .expect("cascade succeeds");

        assert_eq!(outcome.references_removed, 2);
        assert_eq!(
            outcome.unassigned_sessions,
            BTreeSet::from([ClassSessionId::from_uuid(session)])
        );
    }

    #[rstest]
    #[tokio::test]
    async fn missing_entity_is_not_found_and_untouched() {
        let mut store = MockEntityStore::new();
        store
            .expect_existing_ids()
            .with(eq(EntityKind::ClassSession), always())
            .return_once(|_, _| Ok(BTreeSet::new()));
        store.expect_holders_of().never();
        store.expect_delete_session().never();

        let deleter = CascadeDeleter::new(Arc::new(store));
        let err = deleter
            .cascade_delete(EntityKind::ClassSession, Uuid::from_u128(5))
            .await
            .expect_err("nothing to delete");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn failed_cleanup_skips_the_primary_delete() {
        let mut store = MockEntityStore::new();
        store
            .expect_existing_ids()
            .returning(|_, ids| Ok(ids.clone()));
        store
            .expect_holders_of()
            .return_once(|_, _| Ok(BTreeSet::from([Uuid::from_u128(9)])));
        store
            .expect_remove_reference()
            .return_once(|_, _, _| Err(EntityStoreError::query("deadlock")));
        store.expect_delete_user().never();

        let deleter = CascadeDeleter::new(Arc::new(store));
        let err = deleter
            .cascade_delete(EntityKind::User, Uuid::from_u128(4))
            .await
            .expect_err("cleanup fails");
        assert_eq!(err.code(), ErrorCode::InternalError);
    }
}
