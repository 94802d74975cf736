use crate::model::attendance::AttendanceRecord;
use crate::model::role::Role;
use crate::model::user::UserProfile;
use crate::models::{AuthResponse, CheckInReqDto, LoginReqDto, RegisterReqDto, UpdateProfileDto};
use crate::tracker::report::{ReportRow, ReportUser};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Employee Attendance System API",
        version = "1.0.0",
        description = r#"
## Employee Attendance System

Daily check-in / check-out tracking with per-user reports.

### Rules
- One check-in per user per calendar day (server timezone).
- Check-out closes today's open check-in; it can happen once.
- Reports are filtered by inclusive `YYYY-MM-DD` dates and rendered in any IANA timezone.

### Security
All attendance and profile endpoints require a **JWT Bearer** token from `/api/auth/login`
or `/api/auth/register`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::report,

        crate::api::user::get_profile,
        crate::api::user::update_profile
    ),
    components(
        schemas(
            RegisterReqDto,
            LoginReqDto,
            AuthResponse,
            UserProfile,
            UpdateProfileDto,
            Role,
            CheckInReqDto,
            AttendanceRecord,
            ReportRow,
            ReportUser
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Login and registration"),
        (name = "Attendance", description = "Check-in, check-out and reports"),
        (name = "Users", description = "Profile management"),
    )
)]
pub struct ApiDoc;
