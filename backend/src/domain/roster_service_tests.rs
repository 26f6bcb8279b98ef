//! Tests for the roster service.

use std::collections::BTreeSet;
use std::sync::Arc;

use chrono::{NaiveDate, NaiveTime};
use mockall::predicate::{always, eq};
use rstest::{fixture, rstest};

use super::*;
use crate::domain::ports::{EntityStoreError, MockEntityStore};
use crate::domain::{
    ClassSessionDetails, ClassSessionDetailsPatch, ErrorCode, SessionSchedule, Username,
};

fn user(name: &str, role: UserRole) -> User {
    User::new(
        UserId::random(),
        Username::new(name).expect("valid username"),
        role,
    )
}

fn cluster(name: &str) -> Cluster {
    Cluster::new(
        ClusterId::random(),
        ClusterName::new(name).expect("valid name"),
        BTreeSet::new(),
    )
}

#[fixture]
fn session() -> ClassSession {
    let date = NaiveDate::from_ymd_opt(2024, 3, 4).expect("date");
    let schedule = SessionSchedule::new(
        date,
        NaiveTime::from_hms_opt(9, 0, 0).expect("time"),
        NaiveTime::from_hms_opt(10, 0, 0).expect("time"),
    )
    .expect("schedule");
    let details = ClassSessionDetails::new("Speaking", "Room 1", schedule).expect("details");
    ClassSession::new(ClassSessionId::random(), details)
}

#[rstest]
#[tokio::test]
async fn create_user_rejects_taken_usernames() {
    let existing = user("ada", UserRole::Student);
    let mut store = MockEntityStore::new();
    store
        .expect_find_user_by_username()
        .return_once(move |_| Ok(Some(existing)));
    store.expect_insert_user().never();

    let service = RosterService::new(Arc::new(store));
    let err = service
        .create_user(CreateUserRequest {
            username: Username::new("ada").expect("valid username"),
            role: UserRole::Teacher,
        })
        .await
        .expect_err("duplicate username");

    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.details().map(|d| d["field"].clone()), Some("username".into()));
}

#[rstest]
#[tokio::test]
async fn create_cluster_rejects_unknown_students_before_writing() {
    let known = UserId::random();
    let unknown = UserId::random();
    let mut store = MockEntityStore::new();
    store
        .expect_find_cluster_by_name()
        .return_once(|_| Ok(None));
    store
        .expect_existing_ids()
        .with(eq(EntityKind::User), always())
        .return_once(move |_, _| Ok(BTreeSet::from([known.into()])));
    store.expect_insert_cluster().never();
    store.expect_add_reference().never();

    let service = RosterService::new(Arc::new(store));
    let err = service
        .create_cluster(CreateClusterRequest {
            name: ClusterName::new("IELTS-A").expect("valid name"),
            students: BTreeSet::from([known, unknown]),
        })
        .await
        .expect_err("unknown student");

    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let details = err.details().expect("details");
    assert_eq!(details["field"], "students");
    assert_eq!(details["missing"][0], unknown.to_string());
}

#[rstest]
#[tokio::test]
async fn create_cluster_writes_back_references_for_initial_students() {
    let student = UserId::random();
    let mut store = MockEntityStore::new();
    store
        .expect_find_cluster_by_name()
        .return_once(|_| Ok(None));
    store
        .expect_existing_ids()
        .returning(|_, ids| Ok(ids.clone()));
    store
        .expect_insert_cluster()
        .times(1)
        .returning(|_| Ok(()));
    store
        .expect_holders_of()
        .with(eq(ReferenceField::UserClusters), always())
        .return_once(|_, _| Ok(BTreeSet::new()));
    store
        .expect_add_reference()
        .withf(move |field, holders, _| {
            *field == ReferenceField::UserClusters && *holders == BTreeSet::from([student.into()])
        })
        .times(1)
        .returning(|_, _, _| Ok(()));

    let service = RosterService::new(Arc::new(store));
    let created = service
        .create_cluster(CreateClusterRequest {
            name: ClusterName::new("IELTS-A").expect("valid name"),
            students: BTreeSet::from([student]),
        })
        .await
        .expect("cluster created");

    assert_eq!(created.students, BTreeSet::from([student]));
    assert!(created.in_class.is_empty());
}

#[rstest]
#[tokio::test]
async fn update_cluster_with_nothing_requested_writes_nothing() {
    let existing = cluster("IELTS-A");
    let id = existing.id;
    let mut store = MockEntityStore::new();
    store
        .expect_find_cluster()
        .with(eq(id))
        .returning(move |_| Ok(Some(existing.clone())));
    store.expect_rename_cluster().never();
    store.expect_replace_references().never();
    store.expect_holders_of().never();

    let service = RosterService::new(Arc::new(store));
    let updated = service
        .update_cluster(&id, UpdateClusterRequest::default())
        .await
        .expect("no-op update");
    assert_eq!(updated.id, id);
}

#[rstest]
#[tokio::test]
async fn renaming_onto_another_cluster_conflicts() {
    let existing = cluster("IELTS-A");
    let other = cluster("IELTS-B");
    let id = existing.id;
    let mut store = MockEntityStore::new();
    store
        .expect_find_cluster()
        .return_once(move |_| Ok(Some(existing)));
    store
        .expect_find_cluster_by_name()
        .return_once(move |_| Ok(Some(other)));
    store.expect_rename_cluster().never();

    let service = RosterService::new(Arc::new(store));
    let err = service
        .update_cluster(
            &id,
            UpdateClusterRequest {
                name: Some(ClusterName::new("IELTS-B").expect("valid name")),
                students: None,
            },
        )
        .await
        .expect_err("name taken");
    assert_eq!(err.code(), ErrorCode::Conflict);
    assert_eq!(err.details().map(|d| d["field"].clone()), Some("name".into()));
}

#[rstest]
#[tokio::test]
async fn invalid_schedule_patch_is_rejected_without_writes(session: ClassSession) {
    let id = session.id;
    let mut store = MockEntityStore::new();
    store
        .expect_find_session()
        .return_once(move |_| Ok(Some(session)));
    store.expect_update_session_details().never();
    store.expect_replace_references().never();

    let service = RosterService::new(Arc::new(store));
    let err = service
        .update_class_session(
            &id,
            UpdateClassSessionRequest {
                details: ClassSessionDetailsPatch {
                    start: NaiveTime::from_hms_opt(11, 0, 0),
                    ..ClassSessionDetailsPatch::default()
                },
                ..UpdateClassSessionRequest::default()
            },
        )
        .await
        .expect_err("start after end");
    assert_eq!(err.code(), ErrorCode::InvalidRequest);
    let details = err.details().expect("details");
    assert_eq!(details["field"], "end");
    assert_eq!(details["code"], "invalid_session");
}

#[rstest]
#[tokio::test]
async fn teacher_only_update_keeps_students_in_attendance(session: ClassSession) {
    let student = UserId::random();
    let teacher = UserId::random();
    let mut session = session;
    session.students.insert(student);
    let id = session.id;
    let mut reloaded = session.clone();
    reloaded.teachers.insert(teacher);

    let mut store = MockEntityStore::new();
    let mut seq = mockall::Sequence::new();
    store
        .expect_find_session()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(session)));
    store
        .expect_existing_ids()
        .returning(|_, ids| Ok(ids.clone()));
    store
        .expect_replace_references()
        .with(eq(ReferenceField::SessionTeachers), always(), always())
        .times(1)
        .returning(|_, _, _| Ok(()));
    store
        .expect_holders_of()
        .with(eq(ReferenceField::UserSessions), always())
        .return_once(move |_, _| Ok(BTreeSet::from([student.into()])));
    store
        .expect_add_reference()
        .withf(move |field, holders, _| {
            *field == ReferenceField::UserSessions && *holders == BTreeSet::from([teacher.into()])
        })
        .times(1)
        .returning(|_, _, _| Ok(()));
    store.expect_remove_reference().never();
    store
        .expect_find_session()
        .times(1)
        .in_sequence(&mut seq)
        .return_once(move |_| Ok(Some(reloaded)));

    let service = RosterService::new(Arc::new(store));
    let updated = service
        .update_class_session(
            &id,
            UpdateClassSessionRequest {
                teachers: Some(BTreeSet::from([teacher])),
                ..UpdateClassSessionRequest::default()
            },
        )
        .await
        .expect("update succeeds");
    assert_eq!(updated.teachers, BTreeSet::from([teacher]));
    assert_eq!(updated.students, BTreeSet::from([student]));
}

#[rstest]
#[tokio::test]
async fn store_connection_failures_surface_as_service_unavailable() {
    let mut store = MockEntityStore::new();
    store
        .expect_find_cluster()
        .return_once(|_| Err(EntityStoreError::connection("pool timed out")));

    let service = RosterService::new(Arc::new(store));
    let err = service
        .get_cluster(&ClusterId::random())
        .await
        .expect_err("store down");
    assert_eq!(err.code(), ErrorCode::ServiceUnavailable);
}

#[rstest]
#[tokio::test]
async fn sessions_for_missing_cluster_is_not_found() {
    let mut store = MockEntityStore::new();
    store.expect_find_cluster().return_once(|_| Ok(None));
    store.expect_list_sessions().never();

    let service = RosterService::new(Arc::new(store));
    let err = service
        .sessions_for_cluster(&ClusterId::random())
        .await
        .expect_err("cluster missing");
    assert_eq!(err.code(), ErrorCode::NotFound);
}

#[rstest]
#[tokio::test]
async fn list_users_passes_role_filter_through() {
    let teacher = user("grace", UserRole::Teacher);
    let expected = UserSummary::from(&teacher);
    let mut store = MockEntityStore::new();
    store
        .expect_list_users()
        .with(eq(Some(UserRole::Teacher)))
        .return_once(move |_| Ok(vec![teacher]));

    let service = RosterService::new(Arc::new(store));
    let users = service
        .list_users(Some(UserRole::Teacher))
        .await
        .expect("list succeeds");
    assert_eq!(users, vec![expected]);
}
