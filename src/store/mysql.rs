use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, TimeZone, Utc};
use sqlx::MySqlPool;

use super::{AttendanceStore, StoreError};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::utils::reference_day::TimeRange;

/// Timestamps are stored as UTC in `DATETIME(3)`. `open_day` is only set while
/// a record is `IN`; the unique key on `(user_id, open_day)` is what stops two
/// concurrent check-ins for the same day from both landing.
pub const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS attendance_records (
    id BIGINT UNSIGNED NOT NULL AUTO_INCREMENT PRIMARY KEY,
    user_id VARCHAR(191) NOT NULL,
    recorded_at DATETIME(3) NOT NULL,
    status VARCHAR(3) NOT NULL,
    open_day DATE NULL,
    UNIQUE KEY uq_attendance_open_day (user_id, open_day),
    KEY idx_attendance_user_time (user_id, recorded_at)
)
"#;

#[derive(sqlx::FromRow)]
struct AttendanceRow {
    id: u64,
    user_id: String,
    recorded_at: NaiveDateTime,
    status: String,
}

impl TryFrom<AttendanceRow> for AttendanceRecord {
    type Error = StoreError;

    fn try_from(row: AttendanceRow) -> Result<Self, Self::Error> {
        let status = row
            .status
            .parse::<AttendanceStatus>()
            .map_err(|_| StoreError::Backend(format!("unknown status '{}' on row {}", row.status, row.id)))?;

        Ok(AttendanceRecord {
            id: row.id,
            user_id: row.user_id,
            timestamp: Utc.from_utc_datetime(&row.recorded_at),
            status,
        })
    }
}

pub struct MySqlAttendanceStore {
    pool: MySqlPool,
}

impl MySqlAttendanceStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AttendanceStore for MySqlAttendanceStore {
    async fn insert_check_in(
        &self,
        new: &NewAttendance,
        day: NaiveDate,
    ) -> Result<AttendanceRecord, StoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO attendance_records (user_id, recorded_at, status, open_day)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&new.user_id)
        .bind(new.timestamp.naive_utc())
        .bind(AttendanceStatus::In.to_string())
        .bind(day)
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => Ok(new.clone().into_record(done.last_insert_id())),
            Err(e) => {
                // Duplicate (user_id, open_day). SQLSTATE 23000 also covers
                // NOT NULL and foreign key failures, so match the unique kind only.
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.is_unique_violation() {
                        return Err(StoreError::Duplicate);
                    }
                }
                Err(e.into())
            }
        }
    }

    async fn find_open(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, user_id, recorded_at, status
            FROM attendance_records
            WHERE user_id = ?
            AND status = ?
            AND recorded_at BETWEEN ? AND ?
            ORDER BY recorded_at, id
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(AttendanceStatus::In.to_string())
        .bind(range.start.naive_utc())
        .bind(range.end.naive_utc())
        .fetch_optional(&self.pool)
        .await?;

        row.map(AttendanceRecord::try_from).transpose()
    }

    async fn close_open(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, user_id, recorded_at, status
            FROM attendance_records
            WHERE user_id = ?
            AND status = ?
            AND recorded_at BETWEEN ? AND ?
            ORDER BY recorded_at, id
            LIMIT 1
            FOR UPDATE
            "#,
        )
        .bind(user_id)
        .bind(AttendanceStatus::In.to_string())
        .bind(range.start.naive_utc())
        .bind(range.end.naive_utc())
        .fetch_optional(&mut *tx)
        .await?;

        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        sqlx::query(
            r#"
            UPDATE attendance_records
            SET status = ?, open_day = NULL
            WHERE id = ?
            "#,
        )
        .bind(AttendanceStatus::Out.to_string())
        .bind(row.id)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        let mut record = AttendanceRecord::try_from(row)?;
        record.status = AttendanceStatus::Out;
        Ok(Some(record))
    }

    async fn find_in_range(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let rows = sqlx::query_as::<_, AttendanceRow>(
            r#"
            SELECT id, user_id, recorded_at, status
            FROM attendance_records
            WHERE user_id = ?
            AND recorded_at BETWEEN ? AND ?
            ORDER BY recorded_at, id
            "#,
        )
        .bind(user_id)
        .bind(range.start.naive_utc())
        .bind(range.end.naive_utc())
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(AttendanceRecord::try_from).collect()
    }
}
