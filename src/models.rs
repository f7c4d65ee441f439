use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::model::attendance::{AttendanceRecord, AttendanceStatus};
use crate::utils::reference_day::ReferenceZone;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserIdReq {
    /// Missing and blank ids are rejected with 400
    #[schema(example = "u1")]
    pub user_id: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "userId": "u1",
    "date": "2024-03-10T09:00:00+09:00",
    "status": "IN"
}))]
pub struct AttendanceResponse {
    pub id: u64,
    pub user_id: String,
    /// Event time, rendered in the reference zone
    #[schema(value_type = String, format = "date-time")]
    pub date: DateTime<FixedOffset>,
    pub status: AttendanceStatus,
}

impl AttendanceResponse {
    pub fn from_record(record: AttendanceRecord, zone: ReferenceZone) -> Self {
        Self {
            id: record.id,
            date: zone.to_local(record.timestamp),
            user_id: record.user_id,
            status: record.status,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub struct AttendanceActionResponse {
    #[schema(example = "Checked in successfully")]
    pub message: String,
    pub record: AttendanceResponse,
}

#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SessionStatusResponse {
    pub user_id: String,
    pub checked_in: bool,
    pub record: Option<AttendanceResponse>,
}

/// Body of every 4xx/5xx answer.
#[derive(Serialize, ToSchema)]
pub struct ErrorResponse {
    /// `invalid_argument`, `rule_violation` or `internal`
    #[schema(example = "rule_violation")]
    pub error: String,
    #[schema(example = "Already checked in today")]
    pub message: String,
}

#[derive(Serialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "OK")]
    pub status: String,
}
