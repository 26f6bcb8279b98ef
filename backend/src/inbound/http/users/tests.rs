//! Handler tests for the users endpoints.

use std::collections::BTreeSet;

use actix_web::http::StatusCode;
use actix_web::test;
use mockall::predicate::eq;
use rstest::rstest;
use serde_json::{Value, json};

use crate::domain::ports::{MockRosterCommand, MockRosterQuery};
use crate::domain::{
    CascadeOutcome, EntityKind, Error, User, UserId, UserRole, UserSummary, UserView, Username,
};
use crate::inbound::http::test_utils::{as_caller, as_role, roster_test_app};

fn username(raw: &str) -> Username {
    Username::new(raw).expect("valid username")
}

#[rstest]
#[actix_web::test]
async fn admins_create_users() {
    let mut command = MockRosterCommand::new();
    command
        .expect_create_user()
        .withf(|request| request.username.as_ref() == "maria" && request.role == UserRole::Student)
        .times(1)
        .returning(|request| Ok(User::new(UserId::random(), request.username, request.role)));
    let app = test::init_service(roster_test_app(command, MockRosterQuery::new())).await;

    let request = as_role(test::TestRequest::post().uri("/api/v1/users"), UserRole::Admin)
        .set_json(json!({"username": "maria", "role": "student"}))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["username"], "maria");
    assert_eq!(body["inCluster"], json!([]));
}

#[rstest]
#[case(UserRole::Teacher)]
#[case(UserRole::Student)]
#[actix_web::test]
async fn only_admins_create_users(#[case] role: UserRole) {
    let app = test::init_service(roster_test_app(
        MockRosterCommand::new(),
        MockRosterQuery::new(),
    ))
    .await;

    let request = as_role(test::TestRequest::post().uri("/api/v1/users"), role)
        .set_json(json!({"username": "maria", "role": "student"}))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[rstest]
#[case(json!({"username": "x", "role": "student"}), "username")]
#[case(json!({"username": "maria", "role": "janitor"}), "role")]
#[actix_web::test]
async fn invalid_user_payloads_are_rejected(#[case] payload: Value, #[case] field: &str) {
    let app = test::init_service(roster_test_app(
        MockRosterCommand::new(),
        MockRosterQuery::new(),
    ))
    .await;

    let request = as_role(test::TestRequest::post().uri("/api/v1/users"), UserRole::Admin)
        .set_json(payload)
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body: Value = test::read_body_json(response).await;
    assert_eq!(body["details"]["field"], field);
}

#[rstest]
#[actix_web::test]
async fn duplicate_usernames_conflict() {
    let mut command = MockRosterCommand::new();
    command
        .expect_create_user()
        .returning(|_| Err(Error::conflict("username already exists")));
    let app = test::init_service(roster_test_app(command, MockRosterQuery::new())).await;

    let request = as_role(test::TestRequest::post().uri("/api/v1/users"), UserRole::Admin)
        .set_json(json!({"username": "maria", "role": "student"}))
        .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[rstest]
#[actix_web::test]
async fn role_filter_is_forwarded() {
    let mut query = MockRosterQuery::new();
    query
        .expect_list_users()
        .with(eq(Some(UserRole::Teacher)))
        .times(1)
        .returning(|_| {
            Ok(vec![UserSummary {
                id: UserId::random(),
                username: username("ana"),
                role: UserRole::Teacher,
            }])
        });
    let app = test::init_service(roster_test_app(MockRosterCommand::new(), query)).await;

    let request = as_role(
        test::TestRequest::get().uri("/api/v1/users?role=teacher"),
        UserRole::Student,
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body[0]["role"], "teacher");
}

#[rstest]
#[actix_web::test]
async fn me_resolves_the_caller() {
    let caller = UserId::random();
    let mut query = MockRosterQuery::new();
    query
        .expect_get_user()
        .with(eq(caller))
        .times(1)
        .returning(|id| {
            Ok(UserView {
                id: *id,
                username: username("maria"),
                role: UserRole::Student,
                clusters: Vec::new(),
                session_ids: BTreeSet::new(),
            })
        });
    let app = test::init_service(roster_test_app(MockRosterCommand::new(), query)).await;

    let request = as_caller(
        test::TestRequest::get().uri("/api/v1/users/me"),
        caller,
        UserRole::Student,
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body["id"], caller.to_string());
    assert_eq!(body["sessionIds"], json!([]));
}

#[rstest]
#[actix_web::test]
async fn malformed_ids_are_bad_requests() {
    let app = test::init_service(roster_test_app(
        MockRosterCommand::new(),
        MockRosterQuery::new(),
    ))
    .await;

    let request = as_role(
        test::TestRequest::get().uri("/api/v1/users/not-a-uuid"),
        UserRole::Admin,
    )
    .to_request();
    let response = test::call_service(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[rstest]
#[actix_web::test]
async fn removing_a_user_reports_the_cascade() {
    let target = UserId::random();
    let mut command = MockRosterCommand::new();
    command
        .expect_remove_user()
        .with(eq(target))
        .times(1)
        .returning(|id| {
            Ok(CascadeOutcome {
                kind: EntityKind::User,
                id: (*id).into(),
                references_removed: 3,
                unassigned_sessions: BTreeSet::new(),
            })
        });
    let app = test::init_service(roster_test_app(command, MockRosterQuery::new())).await;

    let request = as_role(
        test::TestRequest::delete().uri(&format!("/api/v1/users/{target}")),
        UserRole::Admin,
    )
    .to_request();
    let body: Value = test::call_and_read_body_json(&app, request).await;

    assert_eq!(body["kind"], "user");
    assert_eq!(body["referencesRemoved"], 3);
}
