//! OpenAPI documentation configuration.
//!
//! [`ApiDoc`] registers every roster endpoint from the inbound layer plus
//! the schema wrappers from [`crate::inbound::http::schemas`], which keep
//! domain types free of utoipa derives. Callers identify themselves with the
//! `x-caller-id` and `x-caller-role` headers set by the authentication
//! gateway; both are declared as API key schemes.
//!
//! The generated document backs Swagger UI (debug builds) and is exported
//! via `cargo run --bin openapi-dump`.

use crate::inbound::http::caller::{CALLER_ID_HEADER, CALLER_ROLE_HEADER};
use crate::inbound::http::class_sessions::{CreateClassSessionBody, UpdateClassSessionBody};
use crate::inbound::http::clusters::{AddStudentBody, CreateClusterBody, UpdateClusterBody};
use crate::inbound::http::deletion::DeletionResponse;
use crate::inbound::http::schemas::{
    ClassSessionSchema, ClassSessionViewSchema, ClusterSchema, ClusterSummarySchema,
    ClusterViewSchema, ErrorCodeSchema, ErrorSchema, UserRoleSchema, UserSchema,
    UserSummarySchema, UserViewSchema,
};
use crate::inbound::http::users::CreateUserBody;
use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

/// Declare the caller identity headers as security schemes.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi
            .components
            .get_or_insert_with(utoipa::openapi::Components::default);

        components.add_security_scheme(
            "CallerId",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                CALLER_ID_HEADER,
                "UUID of the authenticated user, set by the gateway.",
            ))),
        );
        components.add_security_scheme(
            "CallerRole",
            SecurityScheme::ApiKey(ApiKey::Header(ApiKeyValue::with_description(
                CALLER_ROLE_HEADER,
                "Role of the authenticated user: admin, teacher or student.",
            ))),
        );
    }
}

/// OpenAPI document for the REST API.
#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    info(
        title = "Roster backend API",
        description = "Users, clusters and class sessions with consistent two-way membership.",
        license(name = "ISC", url = "https://opensource.org/license/isc-license-txt")
    ),
    servers(
        (url = "/", description = "Relative to the deployment base URL")
    ),
    security(("CallerId" = [], "CallerRole" = [])),
    paths(
        crate::inbound::http::users::create_user,
        crate::inbound::http::users::list_users,
        crate::inbound::http::users::current_user,
        crate::inbound::http::users::get_user,
        crate::inbound::http::users::remove_user,
        crate::inbound::http::users::user_sessions,
        crate::inbound::http::clusters::list_clusters,
        crate::inbound::http::clusters::create_cluster,
        crate::inbound::http::clusters::get_cluster,
        crate::inbound::http::clusters::update_cluster,
        crate::inbound::http::clusters::delete_cluster,
        crate::inbound::http::clusters::add_cluster_student,
        crate::inbound::http::clusters::remove_cluster_student,
        crate::inbound::http::clusters::cluster_sessions,
        crate::inbound::http::class_sessions::list_sessions,
        crate::inbound::http::class_sessions::create_session,
        crate::inbound::http::class_sessions::update_session,
        crate::inbound::http::class_sessions::delete_session,
        crate::inbound::http::health::ready,
        crate::inbound::http::health::live,
    ),
    components(schemas(
        ErrorSchema,
        ErrorCodeSchema,
        UserRoleSchema,
        UserSchema,
        UserSummarySchema,
        UserViewSchema,
        ClusterSchema,
        ClusterSummarySchema,
        ClusterViewSchema,
        ClassSessionSchema,
        ClassSessionViewSchema,
        DeletionResponse,
        CreateUserBody,
        CreateClusterBody,
        UpdateClusterBody,
        AddStudentBody,
        CreateClassSessionBody,
        UpdateClassSessionBody,
    )),
    tags(
        (name = "users", description = "Accounts and their resolved memberships"),
        (name = "clusters", description = "Student groups and their rosters"),
        (name = "sessions", description = "Scheduled class sessions"),
        (name = "health", description = "Endpoints for health checks")
    )
)]
pub struct ApiDoc;
