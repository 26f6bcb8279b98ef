//! Users API handlers.
//!
//! ```text
//! POST   /api/v1/users {"username":"maria.lopez","role":"student"}
//! GET    /api/v1/users?role=teacher
//! GET    /api/v1/users/me
//! GET    /api/v1/users/{id}
//! DELETE /api/v1/users/{id}
//! GET    /api/v1/users/{id}/sessions
//! ```

use actix_web::{HttpResponse, delete, get, post, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::CreateUserRequest;
use crate::domain::{Capability, ClassSessionView, UserId, UserSummary, UserView};
use crate::inbound::http::ApiResult;
use crate::inbound::http::caller::CallerContext;
use crate::inbound::http::deletion::DeletionResponse;
use crate::inbound::http::schemas::{
    ClassSessionViewSchema, ErrorSchema, UserSchema, UserSummarySchema, UserViewSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{FieldName, parse_role, parse_username, parse_uuid};

/// Request body for `POST /api/v1/users`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserBody {
    #[schema(example = "maria.lopez")]
    pub username: String,
    #[schema(example = "student")]
    pub role: String,
}

impl TryFrom<CreateUserBody> for CreateUserRequest {
    type Error = crate::domain::Error;

    fn try_from(body: CreateUserBody) -> Result<Self, Self::Error> {
        Ok(Self {
            username: parse_username(&body.username)?,
            role: parse_role(&body.role, FieldName::new("role"))?,
        })
    }
}

/// Query string for `GET /api/v1/users`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListUsersQuery {
    /// Restrict the listing to one role.
    pub role: Option<String>,
}

fn user_id_from_path(raw: &str) -> Result<UserId, crate::domain::Error> {
    parse_uuid(raw, FieldName::new("id")).map(UserId::from_uuid)
}

/// Create a user account.
#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserBody,
    responses(
        (status = 201, description = "User created", body = UserSchema),
        (status = 400, description = "Invalid request", body = ErrorSchema),
        (status = 401, description = "Caller identity missing", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 409, description = "Username taken", body = ErrorSchema),
        (status = 503, description = "Store unavailable", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "createUser"
)]
#[post("/users")]
pub async fn create_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
    payload: web::Json<CreateUserBody>,
) -> ApiResult<HttpResponse> {
    caller.require(Capability::ManageUsers)?;
    let request = CreateUserRequest::try_from(payload.into_inner())?;
    let user = state.roster.create_user(request).await?;
    Ok(HttpResponse::Created().json(user))
}

/// List users, optionally by role.
#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Users ordered by username", body = [UserSummarySchema]),
        (status = 400, description = "Unknown role", body = ErrorSchema),
        (status = 401, description = "Caller identity missing", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "listUsers"
)]
#[get("/users")]
pub async fn list_users(
    state: web::Data<HttpState>,
    caller: CallerContext,
    query: web::Query<ListUsersQuery>,
) -> ApiResult<web::Json<Vec<UserSummary>>> {
    caller.require(Capability::ViewRoster)?;
    let role = query
        .role
        .as_deref()
        .map(|raw| parse_role(raw, FieldName::new("role")))
        .transpose()?;
    let users = state.roster_query.list_users(role).await?;
    Ok(web::Json(users))
}

/// Profile of the calling user.
#[utoipa::path(
    get,
    path = "/api/v1/users/me",
    responses(
        (status = 200, description = "Caller profile", body = UserViewSchema),
        (status = 401, description = "Caller identity missing", body = ErrorSchema),
        (status = 404, description = "Caller has no account", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "currentUser"
)]
#[get("/users/me")]
pub async fn current_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<UserView>> {
    let view = state.roster_query.get_user(&caller.user_id()).await?;
    Ok(web::Json(view))
}

/// Profile of any user.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User profile", body = UserViewSchema),
        (status = 400, description = "Malformed id", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "getUser"
)]
#[get("/users/{id}")]
pub async fn get_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<UserView>> {
    caller.require(Capability::ViewRoster)?;
    let id = user_id_from_path(&path)?;
    let view = state.roster_query.get_user(&id).await?;
    Ok(web::Json(view))
}

/// Delete a user and strip them from every cluster and session.
#[utoipa::path(
    delete,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "User removed", body = DeletionResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "removeUser"
)]
#[delete("/users/{id}")]
pub async fn remove_user(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeletionResponse>> {
    caller.require(Capability::ManageUsers)?;
    let id = user_id_from_path(&path)?;
    let outcome = state.roster.remove_user(&id).await?;
    Ok(web::Json(outcome.into()))
}

/// Sessions a user teaches or attends.
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/sessions",
    params(("id" = String, Path, description = "User id")),
    responses(
        (status = 200, description = "Sessions by date and start time", body = [ClassSessionViewSchema]),
        (status = 404, description = "Unknown user", body = ErrorSchema)
    ),
    tags = ["users"],
    operation_id = "userSessions"
)]
#[get("/users/{id}/sessions")]
pub async fn user_sessions(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ClassSessionView>>> {
    caller.require(Capability::ViewRoster)?;
    let id = user_id_from_path(&path)?;
    let sessions = state.roster_query.sessions_for_user(&id).await?;
    Ok(web::Json(sessions))
}

#[cfg(test)]
mod tests;
