use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::NaiveDate;

use super::{AttendanceStore, StoreError};
use crate::model::attendance::{AttendanceRecord, AttendanceStatus, NewAttendance};
use crate::utils::reference_day::TimeRange;

struct Row {
    record: AttendanceRecord,
    /// Reference day while the record is open, cleared on check-out.
    open_day: Option<NaiveDate>,
}

#[derive(Default)]
struct Inner {
    next_id: u64,
    rows: Vec<Row>,
}

/// Process-local store. Every operation runs under a single lock, so the
/// check-then-write sequences are atomic.
#[derive(Default)]
pub struct MemoryAttendanceStore {
    inner: Mutex<Inner>,
}

impl MemoryAttendanceStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, StoreError> {
        self.inner
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".into()))
    }
}

fn open_in_range(row: &Row, user_id: &str, range: &TimeRange) -> bool {
    row.record.user_id == user_id
        && row.record.status == AttendanceStatus::In
        && range.contains(row.record.timestamp)
}

#[async_trait]
impl AttendanceStore for MemoryAttendanceStore {
    async fn insert_check_in(
        &self,
        new: &NewAttendance,
        day: NaiveDate,
    ) -> Result<AttendanceRecord, StoreError> {
        let mut inner = self.lock()?;

        let taken = inner
            .rows
            .iter()
            .any(|row| row.record.user_id == new.user_id && row.open_day == Some(day));
        if taken {
            return Err(StoreError::Duplicate);
        }

        inner.next_id += 1;
        let record = new.clone().into_record(inner.next_id);
        inner.rows.push(Row {
            record: record.clone(),
            open_day: Some(day),
        });
        Ok(record)
    }

    async fn find_open(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let inner = self.lock()?;
        Ok(inner
            .rows
            .iter()
            .filter(|row| open_in_range(row, user_id, range))
            .min_by_key(|row| (row.record.timestamp, row.record.id))
            .map(|row| row.record.clone()))
    }

    async fn close_open(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Option<AttendanceRecord>, StoreError> {
        let mut inner = self.lock()?;
        let row = inner
            .rows
            .iter_mut()
            .filter(|row| open_in_range(row, user_id, range))
            .min_by_key(|row| (row.record.timestamp, row.record.id));

        Ok(row.map(|row| {
            row.record.status = AttendanceStatus::Out;
            row.open_day = None;
            row.record.clone()
        }))
    }

    async fn find_in_range(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> Result<Vec<AttendanceRecord>, StoreError> {
        let inner = self.lock()?;
        let mut records: Vec<AttendanceRecord> = inner
            .rows
            .iter()
            .filter(|row| row.record.user_id == user_id && range.contains(row.record.timestamp))
            .map(|row| row.record.clone())
            .collect();
        records.sort_by_key(|r| (r.timestamp, r.id));
        Ok(records)
    }
}
