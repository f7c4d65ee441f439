use async_trait::async_trait;
use chrono::NaiveDate;
use derive_more::Display;

use crate::model::attendance::{AttendanceRecord, NewAttendance};
use crate::utils::reference_day::TimeRange;

pub mod memory;
pub mod mysql;

pub use memory::MemoryAttendanceStore;
pub use mysql::MySqlAttendanceStore;

#[derive(Debug, Display)]
pub enum StoreError {
    /// An open check-in already exists for the user and day.
    #[display(fmt = "open check-in already exists")]
    Duplicate,

    #[display(fmt = "{}", _0)]
    Backend(String),
}

impl std::error::Error for StoreError {}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Backend(err.to_string())
    }
}

/// Persistence contract for attendance records.
///
/// Both mutating operations are atomic: an implementation must never let two
/// callers observe "no open record" for the same user and day and both write.
#[async_trait]
pub trait AttendanceStore: Send + Sync {
    /// Insert an `IN` record unless one is already open for `(user_id, day)`.
    async fn insert_check_in(
        &self,
        new: &NewAttendance,
        day: NaiveDate,
    ) -> Result<AttendanceRecord, StoreError>;

    /// The earliest `IN` record for the user inside `range`.
    async fn find_open(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// Flip the open record inside `range` to `OUT` and return it.
    /// `None` when there was nothing to close.
    async fn close_open(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Option<AttendanceRecord>, StoreError>;

    /// All records for the user inside `range`, ascending by timestamp.
    async fn find_in_range(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<AttendanceRecord>, StoreError>;
}
