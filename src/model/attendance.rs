use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

/// Longest user id the store column accepts.
pub const MAX_USER_ID_LEN: usize = 191;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, ToSchema,
)]
pub enum AttendanceStatus {
    #[serde(rename = "IN")]
    #[strum(serialize = "IN")]
    In,
    #[serde(rename = "OUT")]
    #[strum(serialize = "OUT")]
    Out,
}

/// One observed state change for a user.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
    pub status: AttendanceStatus,
}

/// A check-in about to be persisted; the store assigns the id.
#[derive(Debug, Clone)]
pub struct NewAttendance {
    pub user_id: String,
    pub timestamp: DateTime<Utc>,
}

impl NewAttendance {
    pub fn check_in(user_id: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_string(),
            timestamp,
        }
    }

    pub fn into_record(self, id: u64) -> AttendanceRecord {
        AttendanceRecord {
            id,
            user_id: self.user_id,
            timestamp: self.timestamp,
            status: AttendanceStatus::In,
        }
    }
}
