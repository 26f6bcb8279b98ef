//! Response body shared by the cascading delete endpoints.

use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::domain::CascadeOutcome;

/// Summary of a cascading delete.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DeletionResponse {
    /// `user`, `cluster`, or `class session`.
    #[schema(example = "cluster")]
    pub kind: String,
    pub id: Uuid,
    /// Back-references stripped before the document was deleted.
    pub references_removed: usize,
    /// Sessions left without any cluster by this delete.
    pub unassigned_sessions: Vec<Uuid>,
}

impl From<CascadeOutcome> for DeletionResponse {
    fn from(outcome: CascadeOutcome) -> Self {
        Self {
            kind: outcome.kind.as_str().to_owned(),
            id: outcome.id,
            references_removed: outcome.references_removed,
            unassigned_sessions: outcome
                .unassigned_sessions
                .into_iter()
                .map(Uuid::from)
                .collect(),
        }
    }
}
