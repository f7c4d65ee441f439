use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use actix_web::rt::time::timeout;
use chrono::{DateTime, SubsecRound, Utc};
use tracing::{error, info, instrument};

use crate::error::AttendanceError;
use crate::model::attendance::{AttendanceRecord, MAX_USER_ID_LEN, NewAttendance};
use crate::model::year_month::YearMonth;
use crate::store::{AttendanceStore, StoreError};
use crate::utils::reference_day::ReferenceZone;

/// Source of "now" for the service.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Check-in/check-out rules and the monthly read model.
///
/// Policies:
/// - a second check-in on the same reference day is rejected;
/// - check-out flips the open record to `OUT`, it never deletes it.
#[derive(Clone)]
pub struct AttendanceService {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    zone: ReferenceZone,
    store_timeout: Duration,
}

fn validate_user_id(user_id: &str) -> Result<&str, AttendanceError> {
    let user_id = user_id.trim();
    if user_id.is_empty() {
        return Err(AttendanceError::invalid("userId is required"));
    }
    if user_id.chars().count() > MAX_USER_ID_LEN {
        return Err(AttendanceError::invalid(format!(
            "userId must be at most {MAX_USER_ID_LEN} characters"
        )));
    }
    Ok(user_id)
}

impl AttendanceService {
    pub fn new(
        store: Arc<dyn AttendanceStore>,
        clock: Arc<dyn Clock>,
        zone: ReferenceZone,
        store_timeout: Duration,
    ) -> Self {
        Self {
            store,
            clock,
            zone,
            store_timeout,
        }
    }

    pub fn zone(&self) -> ReferenceZone {
        self.zone
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Runs one store call under the configured timeout.
    async fn bounded<T, F>(&self, op: &'static str, fut: F) -> Result<T, AttendanceError>
    where
        F: Future<Output = Result<T, StoreError>>,
    {
        let outcome = match timeout(self.store_timeout, fut).await {
            Ok(result) => result.map_err(AttendanceError::from),
            Err(_) => Err(AttendanceError::Storage(format!(
                "{op} timed out after {:?}",
                self.store_timeout
            ))),
        };

        if let Err(AttendanceError::Storage(detail)) = &outcome {
            error!(op, error = %detail, "Attendance store failure");
        }
        outcome
    }

    #[instrument(name = "attendance_check_in", skip(self, user_id, now), fields(user_id = %user_id))]
    pub async fn check_in(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let user_id = validate_user_id(user_id)?;
        // the store keeps millisecond precision
        let now = now.trunc_subsecs(3);
        let day = self.zone.day_of(now);

        let new = NewAttendance::check_in(user_id, now);
        let record = self
            .bounded("insert_check_in", self.store.insert_check_in(&new, day))
            .await
            .inspect_err(|e| {
                if matches!(e, AttendanceError::AlreadyCheckedIn) {
                    info!(%day, "Duplicate check-in rejected");
                }
            })?;

        info!(record_id = record.id, %day, "Checked in");
        Ok(record)
    }

    #[instrument(name = "attendance_check_out", skip(self, user_id, now), fields(user_id = %user_id))]
    pub async fn check_out(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let user_id = validate_user_id(user_id)?;
        let day = self.zone.day_of(now);
        let range = self.zone.day_range(day);

        let closed = self
            .bounded("close_open", self.store.close_open(user_id, &range))
            .await?;

        match closed {
            Some(record) => {
                info!(record_id = record.id, %day, "Checked out");
                Ok(record)
            }
            None => {
                info!(%day, "Check-out without open check-in");
                Err(AttendanceError::NoOpenCheckIn)
            }
        }
    }

    /// The open session for the reference day of `now`, if any.
    pub async fn open_session(
        &self,
        user_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<AttendanceRecord>, AttendanceError> {
        let user_id = validate_user_id(user_id)?;
        let range = self.zone.day_range(self.zone.day_of(now));

        self.bounded("find_open", self.store.find_open(user_id, &range))
            .await
    }

    /// Every record of `month`, oldest first. An empty month is not an error.
    pub async fn monthly_attendance(
        &self,
        user_id: &str,
        month: YearMonth,
    ) -> Result<Vec<AttendanceRecord>, AttendanceError> {
        let user_id = validate_user_id(user_id)?;
        let range = self.zone.month_range(month);

        self.bounded("find_in_range", self.store.find_in_range(user_id, &range))
            .await
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::attendance::AttendanceStatus;
    use crate::store::MemoryAttendanceStore;
    use crate::utils::reference_day::TimeRange;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::Mutex;

    /// Clock pinned to a settable instant.
    pub(crate) struct FixedClock(Mutex<DateTime<Utc>>);

    impl FixedClock {
        pub(crate) fn at(rfc3339: &str) -> Self {
            FixedClock(Mutex::new(at(rfc3339)))
        }

        pub(crate) fn set(&self, rfc3339: &str) {
            *self.0.lock().unwrap() = at(rfc3339);
        }
    }

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            *self.0.lock().unwrap()
        }
    }

    pub(crate) fn at(rfc3339: &str) -> DateTime<Utc> {
        DateTime::parse_from_rfc3339(rfc3339).unwrap().with_timezone(&Utc)
    }

    fn service() -> AttendanceService {
        AttendanceService::new(
            Arc::new(MemoryAttendanceStore::new()),
            Arc::new(SystemClock),
            ReferenceZone::default(),
            Duration::from_secs(5),
        )
    }

    #[actix_web::test]
    async fn only_first_check_in_of_the_day_succeeds() {
        let svc = service();
        let record = svc.check_in("u1", at("2024-03-10T09:00:00+09:00")).await.unwrap();
        assert_eq!(record.status, AttendanceStatus::In);
        assert_eq!(record.user_id, "u1");

        for later in ["2024-03-10T09:00:01+09:00", "2024-03-10T23:59:59.999+09:00"] {
            let err = svc.check_in("u1", at(later)).await.unwrap_err();
            assert!(matches!(err, AttendanceError::AlreadyCheckedIn));
        }
    }

    #[actix_web::test]
    async fn check_out_requires_open_session() {
        let svc = service();
        let err = svc.check_out("u1", at("2024-03-10T18:00:00+09:00")).await.unwrap_err();
        assert!(matches!(err, AttendanceError::NoOpenCheckIn));
    }

    #[actix_web::test]
    async fn second_check_out_fails() {
        let svc = service();
        svc.check_in("u1", at("2024-03-10T09:00:00+09:00")).await.unwrap();
        svc.check_out("u1", at("2024-03-10T18:00:00+09:00")).await.unwrap();

        let err = svc.check_out("u1", at("2024-03-10T18:00:01+09:00")).await.unwrap_err();
        assert!(matches!(err, AttendanceError::NoOpenCheckIn));
    }

    #[actix_web::test]
    async fn check_out_does_not_close_yesterdays_session() {
        let svc = service();
        svc.check_in("u1", at("2024-03-09T09:00:00+09:00")).await.unwrap();

        let err = svc.check_out("u1", at("2024-03-10T01:00:00+09:00")).await.unwrap_err();
        assert!(matches!(err, AttendanceError::NoOpenCheckIn));
    }

    #[actix_web::test]
    async fn midnight_starts_a_new_day() {
        let svc = service();
        svc.check_in("u1", at("2024-03-10T23:59:59.999+09:00")).await.unwrap();
        svc.check_in("u1", at("2024-03-11T00:00:00.000+09:00")).await.unwrap();
    }

    #[actix_web::test]
    async fn reference_zone_decides_the_day_not_utc() {
        let svc = service();
        // both are 2024-03-10 in UTC but different days in Seoul
        svc.check_in("u1", at("2024-03-10T14:00:00Z")).await.unwrap();
        svc.check_in("u1", at("2024-03-10T16:00:00Z")).await.unwrap();
    }

    #[actix_web::test]
    async fn leap_month_listing_excludes_neighbours() {
        let svc = service();
        for ts in [
            "2024-01-31T23:59:59.999+09:00",
            "2024-02-01T00:00:00.000+09:00",
            "2024-02-15T09:00:00+09:00",
            "2024-02-29T23:59:59.999+09:00",
            "2024-03-01T00:00:00.000+09:00",
        ] {
            svc.check_in("u1", at(ts)).await.unwrap();
        }

        let records = svc
            .monthly_attendance("u1", "2024-02".parse().unwrap())
            .await
            .unwrap();
        let stamps: Vec<_> = records.iter().map(|r| r.timestamp).collect();
        assert_eq!(
            stamps,
            vec![
                at("2024-02-01T00:00:00.000+09:00"),
                at("2024-02-15T09:00:00+09:00"),
                at("2024-02-29T23:59:59.999+09:00"),
            ]
        );
    }

    #[actix_web::test]
    async fn empty_month_is_empty_not_error() {
        let svc = service();
        let records = svc
            .monthly_attendance("ghost", YearMonth::new(2024, 5).unwrap())
            .await
            .unwrap();
        assert!(records.is_empty());
    }

    #[actix_web::test]
    async fn full_day_scenario() {
        let svc = service();
        svc.check_in("u1", at("2024-03-10T09:00:00+09:00")).await.unwrap();

        let closed = svc.check_out("u1", at("2024-03-10T18:00:00+09:00")).await.unwrap();
        assert_eq!(closed.status, AttendanceStatus::Out);
        assert_eq!(closed.timestamp, at("2024-03-10T09:00:00+09:00"));

        let march = svc
            .monthly_attendance("u1", "2024-03".parse().unwrap())
            .await
            .unwrap();
        assert_eq!(march.len(), 1);
        assert_eq!(march[0].id, closed.id);
        assert_eq!(march[0].status, AttendanceStatus::Out);
    }

    #[actix_web::test]
    async fn open_session_tracks_state() {
        let svc = service();
        let now = at("2024-03-10T12:00:00+09:00");
        assert!(svc.open_session("u1", now).await.unwrap().is_none());

        svc.check_in("u1", at("2024-03-10T09:00:00+09:00")).await.unwrap();
        assert!(svc.open_session("u1", now).await.unwrap().is_some());

        svc.check_out("u1", now).await.unwrap();
        assert!(svc.open_session("u1", now).await.unwrap().is_none());
    }

    #[actix_web::test]
    async fn blank_user_id_is_invalid() {
        let svc = service();
        let now = at("2024-03-10T09:00:00+09:00");
        assert!(matches!(
            svc.check_in("   ", now).await.unwrap_err(),
            AttendanceError::InvalidArgument(_)
        ));
        assert!(matches!(
            svc.check_out("", now).await.unwrap_err(),
            AttendanceError::InvalidArgument(_)
        ));
        assert!(matches!(
            svc.check_in(&"x".repeat(MAX_USER_ID_LEN + 1), now).await.unwrap_err(),
            AttendanceError::InvalidArgument(_)
        ));
    }

    #[actix_web::test]
    async fn user_id_is_trimmed() {
        let svc = service();
        let now = at("2024-03-10T09:00:00+09:00");
        let record = svc.check_in("  u1 ", now).await.unwrap();
        assert_eq!(record.user_id, "u1");
        assert!(matches!(
            svc.check_in("u1", now).await.unwrap_err(),
            AttendanceError::AlreadyCheckedIn
        ));
    }

    #[actix_web::test]
    async fn concurrent_check_ins_yield_one_session() {
        let svc = service();
        let now = at("2024-03-10T09:00:00+09:00");

        let attempts = (0..16).map(|_| svc.check_in("u1", now));
        let results = futures::future::join_all(attempts).await;

        let ok = results.iter().filter(|r| r.is_ok()).count();
        let dup = results
            .iter()
            .filter(|r| matches!(r, Err(AttendanceError::AlreadyCheckedIn)))
            .count();
        assert_eq!((ok, dup), (1, 15));
    }

    struct StalledStore;

    #[async_trait]
    impl AttendanceStore for StalledStore {
        async fn insert_check_in(
            &self,
            _new: &NewAttendance,
            _day: NaiveDate,
        ) -> Result<AttendanceRecord, StoreError> {
            futures::future::pending().await
        }

        async fn find_open(
            &self,
            _user_id: &str,
            _range: &TimeRange,
        ) -> Result<Option<AttendanceRecord>, StoreError> {
            futures::future::pending().await
        }

        async fn close_open(
            &self,
            _user_id: &str,
            _range: &TimeRange,
        ) -> Result<Option<AttendanceRecord>, StoreError> {
            Err(StoreError::Backend("connection reset".into()))
        }

        async fn find_in_range(
            &self,
            _user_id: &str,
            _range: &TimeRange,
        ) -> Result<Vec<AttendanceRecord>, StoreError> {
            futures::future::pending().await
        }
    }

    #[actix_web::test]
    async fn store_failures_surface_as_storage_errors() {
        let svc = AttendanceService::new(
            Arc::new(StalledStore),
            Arc::new(SystemClock),
            ReferenceZone::default(),
            Duration::from_millis(20),
        );
        let now = at("2024-03-10T09:00:00+09:00");

        let err = svc.check_in("u1", now).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Storage(ref m) if m.contains("timed out")));

        let err = svc.check_out("u1", now).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Storage(ref m) if m == "connection reset"));

        let err = svc
            .monthly_attendance("u1", YearMonth::new(2024, 3).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::Storage(_)));
    }
}
