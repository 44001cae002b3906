//! Wire types for the REST surface.

use referral_core::{DepartmentId, ReferralError, ReferralView, Status};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};

/// Health check response.
#[derive(Serialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// A single referral with its derived fields.
#[derive(Serialize, ToSchema)]
pub struct ReferralRes {
    #[schema(value_type = Object)]
    pub data: ReferralView,
}

/// A list of referrals with its total count.
#[derive(Serialize, ToSchema)]
pub struct ReferralListRes {
    pub total: usize,
    #[schema(value_type = Vec<Object>)]
    pub data: Vec<ReferralView>,
}

/// Request body for a status update.
#[derive(Deserialize, ToSchema)]
pub struct UpdateStatusReq {
    pub status: Status,
}

/// Request body for adding a clinical note.
#[derive(Deserialize, ToSchema)]
pub struct AddNoteReq {
    pub content: String,
    pub author: String,
    /// Department the note is written as. Ignored for non-admin callers,
    /// who always annotate as their own department.
    #[serde(default)]
    #[schema(value_type = Option<String>)]
    pub department: Option<DepartmentId>,
}

/// Stable error body: a machine-readable code plus a human-readable message.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

impl ErrorBody {
    pub fn new(error: &str, message: impl Into<String>) -> Self {
        Self {
            error: error.to_owned(),
            message: message.into(),
        }
    }
}

/// Maps the core error taxonomy onto HTTP responses.
///
/// Every case keeps its own status and code so callers can always tell the
/// failures apart; in particular forbidden (403) and not-modifiable (409)
/// never collapse into one response.
pub struct ApiError(ReferralError);

impl From<ReferralError> for ApiError {
    fn from(err: ReferralError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, message) = match &self.0 {
            ReferralError::Validation { .. } => {
                (StatusCode::BAD_REQUEST, "validation", self.0.to_string())
            }
            ReferralError::Forbidden => (StatusCode::FORBIDDEN, "forbidden", self.0.to_string()),
            ReferralError::NotModifiable => {
                (StatusCode::CONFLICT, "not_modifiable", self.0.to_string())
            }
            ReferralError::NotFound => (StatusCode::NOT_FOUND, "not_found", self.0.to_string()),
            ReferralError::DuplicateHistoryNumber(_) => (
                StatusCode::CONFLICT,
                "duplicate_history_number",
                self.0.to_string(),
            ),
            ReferralError::Store(e) => {
                tracing::error!("store failure: {e}");
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "store_unavailable",
                    "the referral store is unavailable".to_owned(),
                )
            }
        };

        (status, Json(ErrorBody::new(code, message))).into_response()
    }
}
