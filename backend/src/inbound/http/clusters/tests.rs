//! Handler tests for the cluster endpoints.

use std::collections::BTreeSet;

use actix_web::http::StatusCode;
use actix_web::test;
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

use crate::domain::ports::{MockRosterCommand, MockRosterQuery};
use crate::domain::{
    CascadeOutcome, ClassSessionId, Cluster, ClusterId, ClusterName, EntityKind, Error, UserId,
    UserRole,
};
use crate::inbound::http::test_utils::{as_role, roster_test_app};

fn cluster(id: ClusterId, name: &str, students: BTreeSet<UserId>) -> Cluster {
    Cluster::new(id, ClusterName::new(name).expect("valid name"), students)
}

#[rstest]
#[actix_web::test]
async fn create_forwards_parsed_students() {
    let student = UserId::random();
    let mut command = MockRosterCommand::new();
    command
        .expect_create_cluster()
        .withf(move |request| {
            request.name.to_string() == "IELTS-A" && request.students == BTreeSet::from([student])
        })
        .times(1)
        .returning(|request| Ok(Cluster::new(ClusterId::random(), request.name, request.students)));
    let app = test::init_service(roster_test_app(command, MockRosterQuery::new())).await;

    let request = as_role(test::TestRequest::post().uri("/api/v1/clusters"), UserRole::Admin)
        .set_json(json!({"name": "IELTS-A", "students": [student.to_string()]}))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["students"], json!([student.to_string()]));
}

#[rstest]
#[actix_web::test]
async fn teachers_cannot_manage_clusters() {
    let app = test::init_service(roster_test_app(
        MockRosterCommand::new(),
        MockRosterQuery::new(),
    ))
    .await;

    let request = as_role(test::TestRequest::post().uri("/api/v1/clusters"), UserRole::Teacher)
        .set_json(json!({"name": "IELTS-A"}))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[actix_web::test]
async fn bad_student_ids_name_their_index() {
    let app = test::init_service(roster_test_app(
        MockRosterCommand::new(),
        MockRosterQuery::new(),
    ))
    .await;

    let request = as_role(test::TestRequest::post().uri("/api/v1/clusters"), UserRole::Admin)
        .set_json(json!({"name": "IELTS-A", "students": [UserId::random().to_string(), "zzz"]}))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["details"]["index"], 1);
    assert_eq!(body["details"]["field"], "students");
}

#[rstest]
#[actix_web::test]
async fn update_without_students_leaves_roster_untouched() {
    let id = ClusterId::random();
    let mut command = MockRosterCommand::new();
    command
        .expect_update_cluster()
        .withf(move |cluster_id, request| {
            *cluster_id == id
                && request.students.is_none()
                && request
                    .name
                    .as_ref()
                    .is_some_and(|name| name.to_string() == "IELTS-B")
        })
        .times(1)
        .returning(|cluster_id, request| {
            let name = request.name.expect("rename requested");
            Ok(Cluster::new(*cluster_id, name, BTreeSet::new()))
        });
    let app = test::init_service(roster_test_app(command, MockRosterQuery::new())).await;

    let request = as_role(
        test::TestRequest::put().uri(&format!("/api/v1/clusters/{id}")),
        UserRole::Admin,
    )
    .set_json(json!({"name": "IELTS-B"}))
    .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
}

#[rstest]
#[actix_web::test]
async fn unknown_students_surface_as_bad_request() {
    let id = ClusterId::random();
    let mut command = MockRosterCommand::new();
    command.expect_update_cluster().returning(|_, _| {
        Err(Error::invalid_request("unknown user references")
            .with_details(json!({"field": "students", "code": "unknown_reference"})))
    });
    let app = test::init_service(roster_test_app(command, MockRosterQuery::new())).await;

    let request = as_role(
        test::TestRequest::put().uri(&format!("/api/v1/clusters/{id}")),
        UserRole::Admin,
    )
    .set_json(json!({"students": [UserId::random().to_string()]}))
    .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["details"]["code"], "unknown_reference");
}

#[rstest]
#[actix_web::test]
async fn student_enrolment_routes_parse_both_ids() {
    let id = ClusterId::random();
    let student = UserId::random();
    let mut command = MockRosterCommand::new();
    command
        .expect_add_cluster_student()
        .with(eq(id), eq(student))
        .times(1)
        .returning(|cluster_id, user_id| {
            Ok(cluster(*cluster_id, "IELTS-A", BTreeSet::from([*user_id])))
        });
    command
        .expect_remove_cluster_student()
        .with(eq(id), eq(student))
        .times(1)
        .returning(|cluster_id, _| Ok(cluster(*cluster_id, "IELTS-A", BTreeSet::new())));
    let app = test::init_service(roster_test_app(command, MockRosterQuery::new())).await;

    let add = as_role(
        test::TestRequest::post().uri(&format!("/api/v1/clusters/{id}/students")),
        UserRole::Admin,
    )
    .set_json(json!({"userId": student.to_string()}))
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, add).await;
    assert_eq!(body["students"], json!([student.to_string()]));

    let remove = as_role(
        test::TestRequest::delete().uri(&format!("/api/v1/clusters/{id}/students/{student}")),
        UserRole::Admin,
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, remove).await;
    assert_eq!(body["students"], json!([]));
}

#[rstest]
#[actix_web::test]
async fn delete_reports_unassigned_sessions() {
    let id = ClusterId::random();
    let orphan = ClassSessionId::random();
    let mut command = MockRosterCommand::new();
    command
        .expect_delete_cluster()
        .with(eq(id))
        .times(1)
        .returning(move |cluster_id| {
            Ok(CascadeOutcome {
                kind: EntityKind::Cluster,
                id: (*cluster_id).into(),
                references_removed: 4,
                unassigned_sessions: BTreeSet::from([orphan]),
            })
        });
    let app = test::init_service(roster_test_app(command, MockRosterQuery::new())).await;

    let request = as_role(
        test::TestRequest::delete().uri(&format!("/api/v1/clusters/{id}")),
        UserRole::Admin,
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body["kind"], "cluster");
    assert_eq!(body["unassignedSessions"], json!([orphan.to_string()]));
}

#[rstest]
#[actix_web::test]
async fn missing_clusters_are_not_found() {
    let mut query = MockRosterQuery::new();
    query
        .expect_sessions_for_cluster()
        .returning(|_| Err(Error::not_found("cluster not found")));
    let app = test::init_service(roster_test_app(MockRosterCommand::new(), query)).await;

    let request = as_role(
        test::TestRequest::get().uri(&format!("/api/v1/clusters/{}/sessions", ClusterId::random())),
        UserRole::Student,
    )
    .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
