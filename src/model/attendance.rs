use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "id": 1,
    "userId": 1,
    "checkIn": "2024-01-15T09:00:00Z",
    "checkOut": null,
    "location": "37.7,-122.4",
    "ipAddress": "1.2.3.4",
    "photoUrl": "photo://a"
}))]
pub struct AttendanceRecord {
    pub id: u64,
    pub user_id: u64,
    #[schema(value_type = String, format = DateTime)]
    pub check_in: DateTime<Utc>,
    #[schema(value_type = Option<String>, format = DateTime)]
    pub check_out: Option<DateTime<Utc>>,
    pub location: String,
    pub ip_address: String,
    pub photo_url: String,
}

impl AttendanceRecord {
    pub fn is_open(&self) -> bool {
        self.check_out.is_none()
    }
}

/// Row of the report join: the record plus its owner's display fields.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AttendanceWithUser {
    #[sqlx(flatten)]
    pub record: AttendanceRecord,
    pub user_name: String,
    pub user_email: String,
}

pub struct NewAttendance {
    pub user_id: u64,
    pub check_in: DateTime<Utc>,
    /// Calendar date of `check_in` in the server timezone, unique per user.
    pub check_in_day: NaiveDate,
    pub location: String,
    pub ip_address: String,
    pub photo_url: String,
}

/// Store-side filter. `before` is exclusive.
#[derive(Debug, Clone, Default)]
pub struct AttendanceFilter {
    pub user_id: u64,
    pub since: Option<DateTime<Utc>>,
    pub before: Option<DateTime<Utc>>,
    pub open_only: bool,
}

impl AttendanceFilter {
    pub fn for_user(user_id: u64) -> Self {
        Self {
            user_id,
            ..Self::default()
        }
    }
}
