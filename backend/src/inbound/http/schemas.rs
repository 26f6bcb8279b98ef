//! OpenAPI schema definitions for domain types.
//!
//! Domain types remain framework-agnostic by not deriving `ToSchema`. The
//! wrappers here mirror their serialised shape and register under the
//! domain type's path via `#[schema(as = ...)]`.

#![expect(
    dead_code,
    reason = "Schema wrappers are only read by utoipa during document generation"
)]

use utoipa::ToSchema;

/// OpenAPI schema for [`crate::domain::ErrorCode`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ErrorCode)]
pub enum ErrorCodeSchema {
    /// The request is malformed or fails validation.
    #[schema(rename = "invalid_request")]
    InvalidRequest,
    /// Caller identity headers are missing or malformed.
    #[schema(rename = "unauthorized")]
    Unauthorized,
    /// The caller's role does not grant the action.
    #[schema(rename = "forbidden")]
    Forbidden,
    #[schema(rename = "not_found")]
    NotFound,
    /// Duplicate username or cluster name.
    #[schema(rename = "conflict")]
    Conflict,
    /// The entity store is unreachable.
    #[schema(rename = "service_unavailable")]
    ServiceUnavailable,
    #[schema(rename = "internal_error")]
    InternalError,
}

/// OpenAPI schema for [`crate::domain::Error`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Error, rename_all = "camelCase")]
pub struct ErrorSchema {
    #[schema(example = "invalid_request")]
    code: ErrorCodeSchema,
    #[schema(example = "students must contain valid UUIDs")]
    message: String,
    /// Correlation identifier echoed in the `trace-id` header.
    #[schema(example = "6c1f3b8e-5a57-4d3a-9b43-0f2a4b1f6f10")]
    trace_id: Option<String>,
    /// Machine-readable context such as the offending field.
    details: Option<serde_json::Value>,
}

/// OpenAPI schema for [`crate::domain::UserRole`].
#[derive(ToSchema)]
#[schema(as = crate::domain::UserRole, rename_all = "lowercase")]
pub enum UserRoleSchema {
    Admin,
    Teacher,
    Student,
}

/// OpenAPI schema for [`crate::domain::User`].
#[derive(ToSchema)]
#[schema(as = crate::domain::User, rename_all = "camelCase")]
pub struct UserSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "maria.lopez")]
    username: String,
    role: UserRoleSchema,
    /// Clusters listing this user as a student.
    #[schema(value_type = Vec<String>)]
    in_cluster: Vec<String>,
    /// Sessions this user teaches or attends.
    #[schema(value_type = Vec<String>)]
    in_class: Vec<String>,
}

/// OpenAPI schema for [`crate::domain::UserSummary`].
#[derive(ToSchema)]
#[schema(as = crate::domain::UserSummary, rename_all = "camelCase")]
pub struct UserSummarySchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    username: String,
    role: UserRoleSchema,
}

/// OpenAPI schema for [`crate::domain::ClusterSummary`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ClusterSummary)]
pub struct ClusterSummarySchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "IELTS-A")]
    name: String,
}

/// OpenAPI schema for [`crate::domain::Cluster`].
#[derive(ToSchema)]
#[schema(as = crate::domain::Cluster, rename_all = "camelCase")]
pub struct ClusterSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "IELTS-A")]
    name: String,
    #[schema(value_type = Vec<String>)]
    students: Vec<String>,
    /// Sessions listing this cluster.
    #[schema(value_type = Vec<String>)]
    in_class: Vec<String>,
}

/// OpenAPI schema for [`crate::domain::ClusterView`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ClusterView, rename_all = "camelCase")]
pub struct ClusterViewSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    name: String,
    students: Vec<UserSummarySchema>,
    #[schema(value_type = Vec<String>)]
    session_ids: Vec<String>,
}

/// OpenAPI schema for [`crate::domain::ClassSession`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ClassSession, rename_all = "camelCase")]
pub struct ClassSessionSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    #[schema(example = "IELTS speaking")]
    kind: String,
    #[schema(example = "B12")]
    classroom: String,
    #[schema(value_type = String, format = Date, example = "2024-03-04")]
    date: String,
    #[schema(value_type = String, example = "09:00:00")]
    start: String,
    #[schema(value_type = String, example = "10:30:00")]
    end: String,
    /// Clusters attending the session.
    #[schema(value_type = Vec<String>)]
    classcodes: Vec<String>,
    #[schema(value_type = Vec<String>)]
    teachers: Vec<String>,
    #[schema(value_type = Vec<String>)]
    students: Vec<String>,
}

/// OpenAPI schema for [`crate::domain::ClassSessionView`].
#[derive(ToSchema)]
#[schema(as = crate::domain::ClassSessionView, rename_all = "camelCase")]
pub struct ClassSessionViewSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    kind: String,
    classroom: String,
    #[schema(value_type = String, format = Date)]
    date: String,
    #[schema(value_type = String)]
    start: String,
    #[schema(value_type = String)]
    end: String,
    clusters: Vec<ClusterSummarySchema>,
    teachers: Vec<UserSummarySchema>,
    students: Vec<UserSummarySchema>,
    /// True once every cluster the session listed has been deleted.
    unassigned: bool,
}

/// OpenAPI schema for [`crate::domain::UserView`].
#[derive(ToSchema)]
#[schema(as = crate::domain::UserView, rename_all = "camelCase")]
pub struct UserViewSchema {
    #[schema(value_type = String, format = Uuid)]
    id: String,
    username: String,
    role: UserRoleSchema,
    clusters: Vec<ClusterSummarySchema>,
    #[schema(value_type = Vec<String>)]
    session_ids: Vec<String>,
}
