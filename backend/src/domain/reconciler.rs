//! Membership reconciliation.
//!
//! Given a relation, an owner, and the desired member set, the reconciler
//! reads which members currently hold a back-reference to the owner and
//! applies the minimal set of add/remove writes so the back field agrees
//! with the desired set. The owner's forward field(s) are written by the
//! caller.
//!
//! Every call recomputes from stored state, so repeating a call is a no-op
//! and retrying after a partial failure converges.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde_json::json;
use tracing::info;
use uuid::Uuid;

use super::membership::{EntityKind, MembershipDiff, Relation};
use super::ports::EntityStore;
use super::store_errors::map_store_error;
use super::Error;

/// Writes applied by one reconciliation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    pub relation: Relation,
    pub owner: Uuid,
    pub added: BTreeSet<Uuid>,
    pub removed: BTreeSet<Uuid>,
}

impl ReconcileOutcome {
    /// Whether the back field already matched the desired set.
    #[must_use]
    pub fn is_noop(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Keeps back-reference fields in step with their owners.
pub struct MembershipReconciler<S: ?Sized> {
    store: Arc<S>,
}

impl<S: ?Sized> Clone for MembershipReconciler<S> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<S> MembershipReconciler<S>
where
    S: EntityStore + ?Sized,
{
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Validate and apply `desired` as the membership of `owner`.
    ///
    /// Fails with `NotFound` when the owner is absent and with
    /// `InvalidRequest` when any desired id does not resolve. Nothing is
    /// written in either case.
    pub async fn reconcile(
        &self,
        relation: Relation,
        owner: Uuid,
        desired: &BTreeSet<Uuid>,
    ) -> Result<ReconcileOutcome, Error> {
        let owner_kind = relation.owner_kind();
        let found = self
            .store
            .existing_ids(owner_kind, &BTreeSet::from([owner]))
            .await
            .map_err(map_store_error)?;
        if found.is_empty() {
            return Err(Error::not_found(format!("{owner_kind} {owner} not found")));
        }
        self.ensure_exist(relation.member_kind(), &relation.to_string(), desired)
            .await?;
        self.apply(relation, owner, desired).await
    }

    /// Fail with `InvalidRequest` unless every id names a `kind` document.
    ///
    /// `field` names the request field in the error details.
    pub async fn ensure_exist(
        &self,
        kind: EntityKind,
        field: &str,
        ids: &BTreeSet<Uuid>,
    ) -> Result<(), Error> {
        if ids.is_empty() {
            return Ok(());
        }
        let found = self
            .store
            .existing_ids(kind, ids)
            .await
            .map_err(map_store_error)?;
        let missing: Vec<String> = ids.difference(&found).map(Uuid::to_string).collect();
        if missing.is_empty() {
            return Ok(());
        }
        Err(
            Error::invalid_request(format!("unknown {kind} ids in {field}")).with_details(json!({
                "field": field,
                "code": "unknown_reference",
                "missing": missing,
            })),
        )
    }

    /// Apply the diff without validating. Callers must have checked the
    /// owner and members already.
    pub(crate) async fn apply(
        &self,
        relation: Relation,
        owner: Uuid,
        desired: &BTreeSet<Uuid>,
    ) -> Result<ReconcileOutcome, Error> {
        let back_field = relation.back_field();
        let current = self
            .store
            .holders_of(back_field, owner)
            .await
            .map_err(map_store_error)?;
        let diff = MembershipDiff::compute(&current, desired);

        if !diff.to_add.is_empty() {
            self.store
                .add_reference(back_field, &diff.to_add, owner)
                .await
                .map_err(map_store_error)?;
        }
        if !diff.to_remove.is_empty() {
            self.store
                .remove_reference(back_field, &diff.to_remove, owner)
                .await
                .map_err(map_store_error)?;
        }

        if !diff.is_empty() {
            info!(
                %relation,
                %owner,
                added = diff.to_add.len(),
                removed = diff.to_remove.len(),
                "membership reconciled"
            );
        }

        Ok(ReconcileOutcome {
            relation,
            owner,
            added: diff.to_add,
            removed: diff.to_remove,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ErrorCode;
    use crate::domain::membership::ReferenceField;
    use crate::domain::ports::{EntityStoreError, MockEntityStore};
    use mockall::predicate::{always, eq};
    use rstest::rstest;

    fn id(n: u128) -> Uuid {
        Uuid::from_u128(n)
    }

    #[rstest]
    #[tokio::test]
    async fn applies_only_the_difference() {
        let owner = id(100);
        let mut store = MockEntityStore::new();
        store
            .expect_existing_ids()
            .returning(|_, ids| Ok(ids.clone()));
        store
            .expect_holders_of()
            .with(eq(ReferenceField::UserClusters), eq(owner))
            .return_once(move |_, _| Ok(BTreeSet::from([id(1), id(2)])));
        store
            .expect_add_reference()
            .with(
                eq(ReferenceField::UserClusters),
                eq(BTreeSet::from([id(3)])),
                eq(owner),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));
        store
            .expect_remove_reference()
            .with(
                eq(ReferenceField::UserClusters),
                eq(BTreeSet::from([id(1)])),
                eq(owner),
            )
            .times(1)
            .returning(|_, _, _| Ok(()));

        let reconciler = MembershipReconciler::new(Arc::new(store));
        let outcome = reconciler
            .reconcile(Relation::ClusterStudents, owner, &BTreeSet::from([id(2), id(3)]))
            .await
            .expect("reconcile succeeds");

        assert_eq!(outcome.added, BTreeSet::from([id(3)]));
        assert_eq!(outcome.removed, BTreeSet::from([id(1)]));
    }

    #[rstest]
    #[tokio::test]
    async fn matching_state_writes_nothing() {
        let mut store = MockEntityStore::new();
        store
            .expect_existing_ids()
            .returning(|_, ids| Ok(ids.clone()));
        store
            .expect_holders_of()
            .return_once(|_, _| Ok(BTreeSet::from([id(1)])));
        store.expect_add_reference().never();
        store.expect_remove_reference().never();

        let reconciler = MembershipReconciler::new(Arc::new(store));
        let outcome = reconciler
            .reconcile(Relation::SessionClusters, id(9), &BTreeSet::from([id(1)]))
            .await
            .expect("reconcile succeeds");
        assert!(outcome.is_noop());
    }

    #[rstest]
    #[tokio::test]
    async fn missing_owner_is_not_found() {
        let mut store = MockEntityStore::new();
        store
            .expect_existing_ids()
            .with(eq(EntityKind::Cluster), always())
            .return_once(|_, _| Ok(BTreeSet::new()));
        store.expect_holders_of().never();

        let reconciler = MembershipReconciler::new(Arc::new(store));
        let err = reconciler
            .reconcile(Relation::ClusterStudents, id(1), &BTreeSet::new())
            .await
            .expect_err("owner is missing");
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    #[rstest]
    #[tokio::test]
    async fn unknown_members_are_reported_and_nothing_is_written() {
        let mut store = MockEntityStore::new();
        store
            .expect_existing_ids()
            .with(eq(EntityKind::ClassSession), always())
            .returning(|_, ids| Ok(ids.clone()));
        store
            .expect_existing_ids()
            .with(eq(EntityKind::User), always())
            .returning(|_, _| Ok(BTreeSet::from([id(1)])));
        store.expect_holders_of().never();
        store.expect_add_reference().never();

        let reconciler = MembershipReconciler::new(Arc::new(store));
        let err = reconciler
            .reconcile(
                Relation::SessionAttendees,
                id(50),
                &BTreeSet::from([id(1), id(2)]),
            )
            .await
            .expect_err("member is unknown");

        assert_eq!(err.code(), ErrorCode::InvalidRequest);
        let details = err.details().expect("details are attached");
        assert_eq!(details["code"], "unknown_reference");
        assert_eq!(details["missing"], json!([id(2).to_string()]));
    }

    #[rstest]
    #[tokio::test]
    async fn store_failures_abort_remaining_writes() {
        let mut store = MockEntityStore::new();
        store
            .expect_existing_ids()
            .returning(|_, ids| Ok(ids.clone()));
        store
            .expect_holders_of()
            .return_once(|_, _| Ok(BTreeSet::from([id(1)])));
        store
            .expect_add_reference()
            .return_once(|_, _, _| Err(EntityStoreError::connection("reset")));
        store.expect_remove_reference().never();

        let reconciler = MembershipReconciler::new(Arc::new(store));
        let err = reconciler
            .reconcile(Relation::ClusterStudents, id(7), &BTreeSet::from([id(2)]))
            .await
            .expect_err("store fails");
        assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
    }
}
