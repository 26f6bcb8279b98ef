//! Caller identity extracted from trusted gateway headers.
//!
//! Authentication happens upstream. The gateway forwards the authenticated
//! user id and role as `x-caller-id` and `x-caller-role`; handlers take a
//! [`CallerContext`] and check capabilities before touching the roster.

use actix_web::{FromRequest, HttpRequest, dev::Payload};
use futures_util::future::{Ready, ready};
use serde_json::json;
use tracing::debug;

use crate::domain::{Capability, Error, UserId, UserRole};

pub const CALLER_ID_HEADER: &str = "x-caller-id";
pub const CALLER_ROLE_HEADER: &str = "x-caller-role";

/// Authenticated caller of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallerContext {
    user_id: UserId,
    role: UserRole,
}

impl CallerContext {
    pub const fn new(user_id: UserId, role: UserRole) -> Self {
        Self { user_id, role }
    }

    pub const fn user_id(&self) -> UserId {
        self.user_id
    }

    pub const fn role(&self) -> UserRole {
        self.role
    }

    /// Fail with `403 Forbidden` unless the caller's role grants
    /// `capability`.
    pub fn require(&self, capability: Capability) -> Result<(), Error> {
        if self.role.permits(capability) {
            return Ok(());
        }
        debug!(user_id = %self.user_id, role = %self.role, ?capability, "capability denied");
        Err(Error::forbidden(format!(
            "role {} may not {}",
            self.role,
            capability_label(capability)
        ))
        .with_details(json!({ "role": self.role.as_str() })))
    }

    fn from_headers(req: &HttpRequest) -> Result<Self, Error> {
        let header = |name: &str| {
            req.headers()
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
        };
        let (Some(raw_id), Some(raw_role)) = (header(CALLER_ID_HEADER), header(CALLER_ROLE_HEADER))
        else {
            return Err(Error::unauthorized("caller identity required"));
        };
        let user_id = UserId::new(raw_id)
            .map_err(|_| Error::unauthorized("caller id must be a valid UUID"))?;
        let role = raw_role
            .parse::<UserRole>()
            .map_err(|_| Error::unauthorized("caller role is not recognised"))?;
        Ok(Self::new(user_id, role))
    }
}

const fn capability_label(capability: Capability) -> &'static str {
    match capability {
        Capability::ManageUsers => "manage users",
        Capability::ManageClusters => "manage clusters",
        Capability::ScheduleSessions => "schedule sessions",
        Capability::ViewRoster => "view the roster",
    }
}

impl FromRequest for CallerContext {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Self::from_headers(req).map_err(Into::into))
    }
}
