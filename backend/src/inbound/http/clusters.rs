//! Cluster API handlers.
//!
//! ```text
//! GET    /api/v1/clusters
//! POST   /api/v1/clusters {"name":"IELTS-A","students":["<uuid>"]}
//! GET    /api/v1/clusters/{id}
//! PUT    /api/v1/clusters/{id} {"students":["<uuid>"]}
//! DELETE /api/v1/clusters/{id}
//! POST   /api/v1/clusters/{id}/students {"userId":"<uuid>"}
//! DELETE /api/v1/clusters/{id}/students/{userId}
//! GET    /api/v1/clusters/{id}/sessions
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{CreateClusterRequest, UpdateClusterRequest};
use crate::domain::{Capability, ClassSessionView, ClusterId, ClusterView, Error, UserId};
use crate::inbound::http::ApiResult;
use crate::inbound::http::caller::CallerContext;
use crate::inbound::http::deletion::DeletionResponse;
use crate::inbound::http::schemas::{
    ClassSessionViewSchema, ClusterSchema, ClusterViewSchema, ErrorSchema,
};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_cluster_name, parse_id_set, parse_optional_id_set, parse_uuid,
};

/// Request body for `POST /api/v1/clusters`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClusterBody {
    #[schema(example = "IELTS-A")]
    pub name: String,
    /// Initial student ids.
    #[serde(default)]
    pub students: Vec<String>,
}

impl TryFrom<CreateClusterBody> for CreateClusterRequest {
    type Error = Error;

    fn try_from(body: CreateClusterBody) -> Result<Self, Self::Error> {
        Ok(Self {
            name: parse_cluster_name(&body.name)?,
            students: parse_id_set(&body.students, FieldName::new("students"))?,
        })
    }
}

/// Request body for `PUT /api/v1/clusters/{id}`.
///
/// Omitted fields stay unchanged. `students` is the complete desired
/// roster; an empty list clears it.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClusterBody {
    pub name: Option<String>,
    pub students: Option<Vec<String>>,
}

impl TryFrom<UpdateClusterBody> for UpdateClusterRequest {
    type Error = Error;

    fn try_from(body: UpdateClusterBody) -> Result<Self, Self::Error> {
        Ok(Self {
            name: body.name.as_deref().map(parse_cluster_name).transpose()?,
            students: parse_optional_id_set(body.students.as_deref(), FieldName::new("students"))?,
        })
    }
}

/// Request body for `POST /api/v1/clusters/{id}/students`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct AddStudentBody {
    pub user_id: String,
}

fn cluster_id_from_path(raw: &str) -> Result<ClusterId, Error> {
    parse_uuid(raw, FieldName::new("id")).map(ClusterId::from_uuid)
}

/// List clusters with resolved students.
#[utoipa::path(
    get,
    path = "/api/v1/clusters",
    responses(
        (status = 200, description = "Clusters ordered by name", body = [ClusterViewSchema]),
        (status = 401, description = "Caller identity missing", body = ErrorSchema)
    ),
    tags = ["clusters"],
    operation_id = "listClusters"
)]
#[get("/clusters")]
pub async fn list_clusters(
    state: web::Data<HttpState>,
    caller: CallerContext,
) -> ApiResult<web::Json<Vec<ClusterView>>> {
    caller.require(Capability::ViewRoster)?;
    Ok(web::Json(state.roster_query.list_clusters().await?))
}

/// Create a cluster and enrol its initial students.
#[utoipa::path(
    post,
    path = "/api/v1/clusters",
    request_body = CreateClusterBody,
    responses(
        (status = 201, description = "Cluster created", body = ClusterSchema),
        (status = 400, description = "Invalid name or unknown students", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 409, description = "Name taken", body = ErrorSchema)
    ),
    tags = ["clusters"],
    operation_id = "createCluster"
)]
#[post("/clusters")]
pub async fn create_cluster(
    state: web::Data<HttpState>,
    caller: CallerContext,
    payload: web::Json<CreateClusterBody>,
) -> ApiResult<HttpResponse> {
    caller.require(Capability::ManageClusters)?;
    let request = CreateClusterRequest::try_from(payload.into_inner())?;
    let cluster = state.roster.create_cluster(request).await?;
    Ok(HttpResponse::Created().json(cluster))
}

#[utoipa::path(
    get,
    path = "/api/v1/clusters/{id}",
    params(("id" = String, Path, description = "Cluster id")),
    responses(
        (status = 200, description = "Cluster", body = ClusterViewSchema),
        (status = 404, description = "Unknown cluster", body = ErrorSchema)
    ),
    tags = ["clusters"],
    operation_id = "getCluster"
)]
#[get("/clusters/{id}")]
pub async fn get_cluster(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<ClusterView>> {
    caller.require(Capability::ViewRoster)?;
    let id = cluster_id_from_path(&path)?;
    Ok(web::Json(state.roster_query.get_cluster(&id).await?))
}

/// Rename a cluster and/or replace its roster.
#[utoipa::path(
    put,
    path = "/api/v1/clusters/{id}",
    params(("id" = String, Path, description = "Cluster id")),
    request_body = UpdateClusterBody,
    responses(
        (status = 200, description = "Updated cluster", body = ClusterSchema),
        (status = 400, description = "Invalid name or unknown students", body = ErrorSchema),
        (status = 404, description = "Unknown cluster", body = ErrorSchema),
        (status = 409, description = "Name taken", body = ErrorSchema)
    ),
    tags = ["clusters"],
    operation_id = "updateCluster"
)]
#[put("/clusters/{id}")]
pub async fn update_cluster(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
    payload: web::Json<UpdateClusterBody>,
) -> ApiResult<HttpResponse> {
    caller.require(Capability::ManageClusters)?;
    let id = cluster_id_from_path(&path)?;
    let request = UpdateClusterRequest::try_from(payload.into_inner())?;
    let cluster = state.roster.update_cluster(&id, request).await?;
    Ok(HttpResponse::Ok().json(cluster))
}

/// Delete a cluster. Sessions that listed it are kept.
#[utoipa::path(
    delete,
    path = "/api/v1/clusters/{id}",
    params(("id" = String, Path, description = "Cluster id")),
    responses(
        (status = 200, description = "Cluster removed", body = DeletionResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown cluster", body = ErrorSchema)
    ),
    tags = ["clusters"],
    operation_id = "deleteCluster"
)]
#[delete("/clusters/{id}")]
pub async fn delete_cluster(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeletionResponse>> {
    caller.require(Capability::ManageClusters)?;
    let id = cluster_id_from_path(&path)?;
    let outcome = state.roster.delete_cluster(&id).await?;
    Ok(web::Json(outcome.into()))
}

/// Enrol one student. Enrolling an existing member changes nothing.
#[utoipa::path(
    post,
    path = "/api/v1/clusters/{id}/students",
    params(("id" = String, Path, description = "Cluster id")),
    request_body = AddStudentBody,
    responses(
        (status = 200, description = "Updated cluster", body = ClusterSchema),
        (status = 404, description = "Unknown cluster or user", body = ErrorSchema)
    ),
    tags = ["clusters"],
    operation_id = "addClusterStudent"
)]
#[post("/clusters/{id}/students")]
pub async fn add_cluster_student(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
    payload: web::Json<AddStudentBody>,
) -> ApiResult<HttpResponse> {
    caller.require(Capability::ManageClusters)?;
    let id = cluster_id_from_path(&path)?;
    let user_id = parse_uuid(&payload.user_id, FieldName::new("userId")).map(UserId::from_uuid)?;
    let cluster = state.roster.add_cluster_student(&id, &user_id).await?;
    Ok(HttpResponse::Ok().json(cluster))
}

/// Withdraw one student.
#[utoipa::path(
    delete,
    path = "/api/v1/clusters/{id}/students/{user_id}",
    params(
        ("id" = String, Path, description = "Cluster id"),
        ("user_id" = String, Path, description = "Student id")
    ),
    responses(
        (status = 200, description = "Updated cluster", body = ClusterSchema),
        (status = 404, description = "Unknown cluster", body = ErrorSchema)
    ),
    tags = ["clusters"],
    operation_id = "removeClusterStudent"
)]
#[delete("/clusters/{id}/students/{user_id}")]
pub async fn remove_cluster_student(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<(String, String)>,
) -> ApiResult<HttpResponse> {
    caller.require(Capability::ManageClusters)?;
    let (raw_id, raw_user) = path.into_inner();
    let id = cluster_id_from_path(&raw_id)?;
    let user_id = parse_uuid(&raw_user, FieldName::new("userId")).map(UserId::from_uuid)?;
    let cluster = state.roster.remove_cluster_student(&id, &user_id).await?;
    Ok(HttpResponse::Ok().json(cluster))
}

/// Sessions listing the cluster.
#[utoipa::path(
    get,
    path = "/api/v1/clusters/{id}/sessions",
    params(("id" = String, Path, description = "Cluster id")),
    responses(
        (status = 200, description = "Sessions by date and start time", body = [ClassSessionViewSchema]),
        (status = 404, description = "Unknown cluster", body = ErrorSchema)
    ),
    tags = ["clusters"],
    operation_id = "clusterSessions"
)]
#[get("/clusters/{id}/sessions")]
pub async fn cluster_sessions(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<Vec<ClassSessionView>>> {
    caller.require(Capability::ViewRoster)?;
    let id = cluster_id_from_path(&path)?;
    Ok(web::Json(state.roster_query.sessions_for_cluster(&id).await?))
}

#[cfg(test)]
mod tests;
