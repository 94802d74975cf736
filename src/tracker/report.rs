//! Calendar-day arithmetic and report rendering in a caller-chosen timezone.

use chrono::{DateTime, Days, LocalResult, NaiveDate, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Serialize;
use utoipa::ToSchema;

use crate::model::attendance::AttendanceWithUser;

/// en-US `toLocaleString` layout, e.g. `1/15/2024, 9:00:00 AM`.
const LOCALE_FORMAT: &str = "%-m/%-d/%Y, %-I:%M:%S %p";

#[derive(Debug, Serialize, ToSchema)]
pub struct ReportUser {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "userId": 1,
    "checkIn": "1/15/2024, 4:00:00 AM",
    "checkOut": "1/15/2024, 12:00:00 PM",
    "location": "37.7,-122.4",
    "ipAddress": "1.2.3.4",
    "photoUrl": "photo://a",
    "user": { "name": "Jane Doe", "email": "employee@example.com" }
}))]
pub struct ReportRow {
    pub id: u64,
    pub user_id: u64,
    pub check_in: String,
    pub check_out: Option<String>,
    pub location: String,
    pub ip_address: String,
    pub photo_url: String,
    pub user: ReportUser,
}

impl ReportRow {
    pub fn render(row: AttendanceWithUser, tz: &Tz) -> Self {
        let record = row.record;
        Self {
            id: record.id,
            user_id: record.user_id,
            check_in: format_local(record.check_in, tz),
            check_out: record.check_out.map(|at| format_local(at, tz)),
            location: record.location,
            ip_address: record.ip_address,
            photo_url: record.photo_url,
            user: ReportUser {
                name: row.user_name,
                email: row.user_email,
            },
        }
    }
}

pub fn format_local(at: DateTime<Utc>, tz: &Tz) -> String {
    at.with_timezone(tz).format(LOCALE_FORMAT).to_string()
}

/// Instant of local midnight starting `date` in `tz`.
///
/// When midnight falls in a DST gap the first valid instant of the day is used.
pub fn start_of_day(date: NaiveDate, tz: &Tz) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    let mut candidate = midnight;
    for _ in 0..=24 {
        match tz.from_local_datetime(&candidate) {
            LocalResult::Single(at) => return at.with_timezone(&Utc),
            LocalResult::Ambiguous(earliest, _) => return earliest.with_timezone(&Utc),
            LocalResult::None => candidate += chrono::Duration::minutes(30),
        }
    }
    Utc.from_utc_datetime(&midnight)
}

/// Calendar date of `at` as seen in `tz`.
pub fn local_date(at: DateTime<Utc>, tz: &Tz) -> NaiveDate {
    at.with_timezone(tz).date_naive()
}

/// Half-open UTC range covering `start..=end` calendar days.
///
/// Days are UTC days. The report timezone only changes how times are rendered.
pub fn date_range(
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> (Option<DateTime<Utc>>, Option<DateTime<Utc>>) {
    let since = start.map(|date| date.and_time(NaiveTime::MIN).and_utc());
    let before = end
        .and_then(|date| date.checked_add_days(Days::new(1)))
        .map(|next| next.and_time(NaiveTime::MIN).and_utc());
    (since, before)
}
