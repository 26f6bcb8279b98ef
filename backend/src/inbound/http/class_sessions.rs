//! Class session API handlers.
//!
//! ```text
//! GET    /api/v1/sessions?date=2024-03-04
//! POST   /api/v1/sessions {"kind":"IELTS","date":"2024-03-04","start":"09:00","end":"10:30","classcodes":["<uuid>"]}
//! PUT    /api/v1/sessions/{id} {"start":"09:30"}
//! DELETE /api/v1/sessions/{id}
//! ```

use actix_web::{HttpResponse, delete, get, post, put, web};
use serde::{Deserialize, Serialize};

use crate::domain::ports::{CreateClassSessionRequest, UpdateClassSessionRequest};
use crate::domain::{
    Capability, ClassSessionDetails, ClassSessionDetailsPatch, ClassSessionId, ClassSessionView,
    Error, SessionSchedule,
};
use crate::inbound::http::ApiResult;
use crate::inbound::http::caller::CallerContext;
use crate::inbound::http::deletion::DeletionResponse;
use crate::inbound::http::schemas::{ClassSessionSchema, ClassSessionViewSchema, ErrorSchema};
use crate::inbound::http::state::HttpState;
use crate::inbound::http::validation::{
    FieldName, parse_date, parse_id_set, parse_optional_id_set, parse_time, parse_uuid,
};

/// Request body for `POST /api/v1/sessions`.
#[derive(Debug, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateClassSessionBody {
    #[schema(example = "IELTS speaking")]
    pub kind: String,
    #[serde(default)]
    #[schema(example = "B12")]
    pub classroom: String,
    #[schema(example = "2024-03-04")]
    pub date: String,
    #[schema(example = "09:00")]
    pub start: String,
    #[schema(example = "10:30")]
    pub end: String,
    #[serde(default)]
    pub classcodes: Vec<String>,
    #[serde(default)]
    pub teachers: Vec<String>,
    #[serde(default)]
    pub students: Vec<String>,
}

impl TryFrom<CreateClassSessionBody> for CreateClassSessionRequest {
    type Error = Error;

    fn try_from(body: CreateClassSessionBody) -> Result<Self, Self::Error> {
        let schedule = SessionSchedule::new(
            parse_date(&body.date, FieldName::new("date"))?,
            parse_time(&body.start, FieldName::new("start"))?,
            parse_time(&body.end, FieldName::new("end"))?,
        )
        .map_err(Error::from)?;
        let details = ClassSessionDetails::new(body.kind, body.classroom, schedule)
            .map_err(Error::from)?;
        Ok(Self {
            details,
            classcodes: parse_id_set(&body.classcodes, FieldName::new("classcodes"))?,
            teachers: parse_id_set(&body.teachers, FieldName::new("teachers"))?,
            students: parse_id_set(&body.students, FieldName::new("students"))?,
        })
    }
}

/// Request body for `PUT /api/v1/sessions/{id}`. Every field is optional;
/// omitted fields keep their stored value.
#[derive(Debug, Default, Deserialize, Serialize, utoipa::ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassSessionBody {
    pub kind: Option<String>,
    pub classroom: Option<String>,
    pub date: Option<String>,
    pub start: Option<String>,
    pub end: Option<String>,
    pub classcodes: Option<Vec<String>>,
    pub teachers: Option<Vec<String>>,
    pub students: Option<Vec<String>>,
}

impl TryFrom<UpdateClassSessionBody> for UpdateClassSessionRequest {
    type Error = Error;

    fn try_from(body: UpdateClassSessionBody) -> Result<Self, Self::Error> {
        let details = ClassSessionDetailsPatch {
            kind: body.kind,
            classroom: body.classroom,
            date: body
                .date
                .as_deref()
                .map(|raw| parse_date(raw, FieldName::new("date")))
                .transpose()?,
            start: body
                .start
                .as_deref()
                .map(|raw| parse_time(raw, FieldName::new("start")))
                .transpose()?,
            end: body
                .end
                .as_deref()
                .map(|raw| parse_time(raw, FieldName::new("end")))
                .transpose()?,
        };
        Ok(Self {
            details,
            classcodes: parse_optional_id_set(
                body.classcodes.as_deref(),
                FieldName::new("classcodes"),
            )?,
            teachers: parse_optional_id_set(body.teachers.as_deref(), FieldName::new("teachers"))?,
            students: parse_optional_id_set(body.students.as_deref(), FieldName::new("students"))?,
        })
    }
}

/// Query string for `GET /api/v1/sessions`.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ListSessionsQuery {
    /// Only sessions on this date (`YYYY-MM-DD`).
    pub date: Option<String>,
}

fn session_id_from_path(raw: &str) -> Result<ClassSessionId, Error> {
    parse_uuid(raw, FieldName::new("id")).map(ClassSessionId::from_uuid)
}

/// List sessions, optionally for one date.
#[utoipa::path(
    get,
    path = "/api/v1/sessions",
    params(ListSessionsQuery),
    responses(
        (status = 200, description = "Sessions by date and start time", body = [ClassSessionViewSchema]),
        (status = 400, description = "Malformed date", body = ErrorSchema),
        (status = 401, description = "Caller identity missing", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "listSessions"
)]
#[get("/sessions")]
pub async fn list_sessions(
    state: web::Data<HttpState>,
    caller: CallerContext,
    query: web::Query<ListSessionsQuery>,
) -> ApiResult<web::Json<Vec<ClassSessionView>>> {
    caller.require(Capability::ViewRoster)?;
    let sessions = match query.date.as_deref() {
        Some(raw) => {
            let date = parse_date(raw, FieldName::new("date"))?;
            state.roster_query.sessions_on(date).await?
        }
        None => state.roster_query.list_sessions().await?,
    };
    Ok(web::Json(sessions))
}

/// Schedule a session and link its clusters and attendees.
#[utoipa::path(
    post,
    path = "/api/v1/sessions",
    request_body = CreateClassSessionBody,
    responses(
        (status = 201, description = "Session created", body = ClassSessionSchema),
        (status = 400, description = "Invalid details or unknown references", body = ErrorSchema),
        (status = 403, description = "Forbidden", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "createSession"
)]
#[post("/sessions")]
pub async fn create_session(
    state: web::Data<HttpState>,
    caller: CallerContext,
    payload: web::Json<CreateClassSessionBody>,
) -> ApiResult<HttpResponse> {
    caller.require(Capability::ScheduleSessions)?;
    let request = CreateClassSessionRequest::try_from(payload.into_inner())?;
    let session = state.roster.create_class_session(request).await?;
    Ok(HttpResponse::Created().json(session))
}

/// Patch a session's details and replace any provided membership lists.
#[utoipa::path(
    put,
    path = "/api/v1/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    request_body = UpdateClassSessionBody,
    responses(
        (status = 200, description = "Updated session", body = ClassSessionSchema),
        (status = 400, description = "Invalid details or unknown references", body = ErrorSchema),
        (status = 404, description = "Unknown session", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "updateSession"
)]
#[put("/sessions/{id}")]
pub async fn update_session(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
    payload: web::Json<UpdateClassSessionBody>,
) -> ApiResult<HttpResponse> {
    caller.require(Capability::ScheduleSessions)?;
    let id = session_id_from_path(&path)?;
    let request = UpdateClassSessionRequest::try_from(payload.into_inner())?;
    let session = state.roster.update_class_session(&id, request).await?;
    Ok(HttpResponse::Ok().json(session))
}

/// Delete a session and strip it from every cluster and attendee.
#[utoipa::path(
    delete,
    path = "/api/v1/sessions/{id}",
    params(("id" = String, Path, description = "Session id")),
    responses(
        (status = 200, description = "Session removed", body = DeletionResponse),
        (status = 403, description = "Forbidden", body = ErrorSchema),
        (status = 404, description = "Unknown session", body = ErrorSchema)
    ),
    tags = ["sessions"],
    operation_id = "deleteSession"
)]
#[delete("/sessions/{id}")]
pub async fn delete_session(
    state: web::Data<HttpState>,
    caller: CallerContext,
    path: web::Path<String>,
) -> ApiResult<web::Json<DeletionResponse>> {
    caller.require(Capability::ScheduleSessions)?;
    let id = session_id_from_path(&path)?;
    let outcome = state.roster.delete_class_session(&id).await?;
    Ok(web::Json(outcome.into()))
}
