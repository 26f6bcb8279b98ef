//! Test helpers for inbound HTTP components.

use std::sync::Arc;

use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::test::TestRequest;
use actix_web::{App, web};

use crate::domain::ports::{MockRosterCommand, MockRosterQuery};
use crate::domain::{UserId, UserRole};
use crate::inbound::http::caller::{CALLER_ID_HEADER, CALLER_ROLE_HEADER};
use crate::inbound::http::configure_api;
use crate::inbound::http::state::HttpState;

/// App serving the full `/api/v1` surface over the given port mocks.
pub fn roster_test_app(
    command: MockRosterCommand,
    query: MockRosterQuery,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse,
        Error = actix_web::Error,
        InitError = (),
    >,
> {
    let state = HttpState::new(Arc::new(command), Arc::new(query));
    App::new()
        .app_data(web::Data::new(state))
        .service(web::scope("/api/v1").configure(configure_api))
}

/// Attach caller identity headers for `role` with a fresh user id.
pub fn as_role(request: TestRequest, role: UserRole) -> TestRequest {
    as_caller(request, UserId::random(), role)
}

pub fn as_caller(request: TestRequest, user_id: UserId, role: UserRole) -> TestRequest {
    request
        .insert_header((CALLER_ID_HEADER, user_id.to_string()))
        .insert_header((CALLER_ROLE_HEADER, role.as_str()))
}
