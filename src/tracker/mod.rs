//! Per-user, per-day attendance state machine.
//!
//! Each (user, calendar day) moves `no record -> open -> closed`. The day
//! boundary is local midnight in the server timezone; the store's unique key
//! on (user, day) backs the "one check-in per day" rule under concurrency.

pub mod clock;
pub mod report;

use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    model::attendance::{AttendanceFilter, AttendanceRecord, NewAttendance},
    store::{AttendanceStore, StoreError},
};
use clock::Clock;
use report::ReportRow;

#[derive(Debug, Error)]
pub enum AttendanceError {
    #[error("Already checked in today")]
    AlreadyCheckedIn,

    #[error("No active check-in found")]
    NoActiveSession,

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub struct CheckIn {
    pub location: String,
    pub ip_address: String,
    pub photo_url: String,
}

pub struct ReportRange {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub timezone: Tz,
}

pub struct AttendanceTracker {
    store: Arc<dyn AttendanceStore>,
    clock: Arc<dyn Clock>,
    day_zone: Tz,
}

impl AttendanceTracker {
    pub fn new(store: Arc<dyn AttendanceStore>, clock: Arc<dyn Clock>, day_zone: Tz) -> Self {
        Self {
            store,
            clock,
            day_zone,
        }
    }

    fn today_filter(&self, user_id: u64, now: DateTime<Utc>) -> (AttendanceFilter, NaiveDate) {
        let today = report::local_date(now, &self.day_zone);
        let filter = AttendanceFilter {
            since: Some(report::start_of_day(today, &self.day_zone)),
            ..AttendanceFilter::for_user(user_id)
        };
        (filter, today)
    }

    pub async fn check_in(
        &self,
        user_id: u64,
        payload: CheckIn,
    ) -> Result<AttendanceRecord, AttendanceError> {
        let now = self.clock.now();
        let (filter, today) = self.today_filter(user_id, now);

        if self.store.find_attendance(&filter).await?.is_some() {
            return Err(AttendanceError::AlreadyCheckedIn);
        }

        let record = self
            .store
            .create_attendance(NewAttendance {
                user_id,
                check_in: now,
                check_in_day: today,
                location: payload.location,
                ip_address: payload.ip_address,
                photo_url: payload.photo_url,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate(_) => AttendanceError::AlreadyCheckedIn,
                other => other.into(),
            })?;

        info!(user_id, attendance_id = record.id, "Checked in");
        Ok(record)
    }

    pub async fn check_out(&self, user_id: u64) -> Result<AttendanceRecord, AttendanceError> {
        let now = self.clock.now();
        let (mut filter, _) = self.today_filter(user_id, now);
        filter.open_only = true;

        let open = self
            .store
            .find_attendance(&filter)
            .await?
            .ok_or(AttendanceError::NoActiveSession)?;

        if now < open.check_in {
            warn!(
                user_id,
                attendance_id = open.id,
                check_in = %open.check_in,
                check_out = %now,
                "Check-out precedes check-in"
            );
        }

        let record = self
            .store
            .close_attendance(open.id, now)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => AttendanceError::NoActiveSession,
                other => other.into(),
            })?;

        info!(user_id, attendance_id = record.id, "Checked out");
        Ok(record)
    }

    pub async fn report(
        &self,
        user_id: u64,
        range: &ReportRange,
    ) -> Result<Vec<ReportRow>, AttendanceError> {
        let (since, before) = report::date_range(range.start_date, range.end_date);
        let filter = AttendanceFilter {
            since,
            before,
            ..AttendanceFilter::for_user(user_id)
        };

        let rows = self.store.list_attendance(&filter).await?;
        Ok(rows
            .into_iter()
            .map(|row| ReportRow::render(row, &range.timezone))
            .collect())
    }
}
