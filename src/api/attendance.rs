use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::attendance::AttendanceRecord,
    models::CheckInReqDto,
    tracker::{AttendanceTracker, CheckIn, ReportRange, report::ReportRow},
};
use actix_web::{HttpResponse, web};
use chrono::{Datelike, NaiveDate};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::instrument;
use utoipa::IntoParams;

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct ReportQuery {
    /// Start date for the report (YYYY-MM-DD), inclusive
    #[param(example = "2024-01-01")]
    pub start_date: Option<String>,
    /// End date for the report (YYYY-MM-DD), inclusive
    #[param(example = "2024-01-31")]
    pub end_date: Option<String>,
    /// IANA timezone used to render times (dates are UTC days)
    #[param(example = "America/New_York")]
    pub timezone: Option<String>,
}

// DATETIME column range
const YEARS: std::ops::RangeInclusive<i32> = 1000..=9999;

fn parse_date(field: &str, value: Option<&str>) -> Result<Option<NaiveDate>, AppError> {
    match value.map(str::trim).filter(|v| !v.is_empty()) {
        None => Ok(None),
        Some(v) => NaiveDate::parse_from_str(v, "%Y-%m-%d")
            .ok()
            .filter(|date| YEARS.contains(&date.year()))
            .map(Some)
            .ok_or_else(|| AppError::validation(format!("{field} must be a YYYY-MM-DD date"))),
    }
}

impl ReportQuery {
    fn into_range(self) -> Result<ReportRange, AppError> {
        let timezone = match self.timezone.as_deref().map(str::trim) {
            None | Some("") => chrono_tz::UTC,
            Some(name) => name
                .parse::<Tz>()
                .map_err(|_| AppError::validation(format!("Unknown timezone: {name}")))?,
        };

        Ok(ReportRange {
            start_date: parse_date("startDate", self.start_date.as_deref())?,
            // the last storable day needs no upper bound
            end_date: parse_date("endDate", self.end_date.as_deref())?
                .filter(|date| date.succ_opt().is_some_and(|next| YEARS.contains(&next.year()))),
            timezone,
        })
    }
}

fn require(field: &str, value: String) -> Result<String, AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(value)
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-in",
    request_body = CheckInReqDto,
    responses(
        (status = 200, description = "Checked in", body = AttendanceRecord),
        (status = 400, description = "Already checked in today", body = Object, example = json!({
            "error": "Already checked in today"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error", body = Object, example = json!({
            "error": "Internal server error"
        }))
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_in", skip_all, fields(user_id = auth.user_id, role = %auth.role))]
pub async fn check_in(
    auth: AuthUser,
    tracker: web::Data<AttendanceTracker>,
    body: web::Json<CheckInReqDto>,
) -> Result<HttpResponse, AppError> {
    let body = body.into_inner();
    let payload = CheckIn {
        location: require("location", body.location)?,
        ip_address: require("ipAddress", body.ip_address)?,
        photo_url: require("photoUrl", body.photo_url)?,
    };

    let record = tracker.check_in(auth.user_id, payload).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/api/attendance/check-out",
    responses(
        (status = 200, description = "Checked out", body = AttendanceRecord),
        (status = 400, description = "No active check-in found", body = Object, example = json!({
            "error": "No active check-in found"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_check_out", skip_all, fields(user_id = auth.user_id, role = %auth.role))]
pub async fn check_out(
    auth: AuthUser,
    tracker: web::Data<AttendanceTracker>,
) -> Result<HttpResponse, AppError> {
    let record = tracker.check_out(auth.user_id).await?;
    Ok(HttpResponse::Ok().json(record))
}

/// Attendance report for the current user, newest first
#[utoipa::path(
    get,
    path = "/api/attendance/report",
    params(ReportQuery),
    responses(
        (status = 200, description = "Attendance report", body = [ReportRow]),
        (status = 400, description = "Invalid date or timezone", body = Object, example = json!({
            "error": "Unknown timezone: Mars/Olympus"
        })),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Attendance"
)]
#[instrument(name = "attendance_report", skip_all, fields(user_id = auth.user_id))]
pub async fn report(
    auth: AuthUser,
    tracker: web::Data<AttendanceTracker>,
    query: web::Query<ReportQuery>,
) -> Result<HttpResponse, AppError> {
    let range = query.into_inner().into_range()?;
    let rows = tracker.report(auth.user_id, &range).await?;
    Ok(HttpResponse::Ok().json(rows))
}
