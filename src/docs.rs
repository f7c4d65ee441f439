use crate::api::chatbot::{SkillPayload, SkillUser, SkillUserProperties, SkillUserRequest};
use crate::model::attendance::AttendanceStatus;
use crate::models::{
    AttendanceActionResponse, AttendanceResponse, ErrorResponse, HealthResponse,
    SessionStatusResponse, UserIdReq,
};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Attendance API",
        version = "0.1.0",
        description = r#"
## Attendance Tracking

Records daily **check-in** and **check-out** events per user and lists monthly history.

### Rules
- One open check-in per user per reference day; a second check-in the same day is rejected.
- Check-out closes today's open check-in by flipping it to `OUT`.
- Days and months are computed in one fixed reference zone (default `+09:00`).

### Errors
Every failure answers `{ "error": "invalid_argument" | "rule_violation" | "internal", "message": "..." }`.
"#,
    ),
    paths(
        crate::api::health::health,

        crate::api::attendance::check_in,
        crate::api::attendance::check_out,
        crate::api::attendance::monthly_attendance,
        crate::api::attendance::session_status,

        crate::api::chatbot::check_in,
        crate::api::chatbot::check_out
    ),
    components(
        schemas(
            UserIdReq,
            AttendanceStatus,
            AttendanceResponse,
            AttendanceActionResponse,
            SessionStatusResponse,
            ErrorResponse,
            HealthResponse,
            SkillPayload,
            SkillUserRequest,
            SkillUser,
            SkillUserProperties
        )
    ),
    tags(
        (name = "Attendance", description = "Check-in, check-out and monthly history"),
        (name = "Chatbot", description = "Chat-bot skill endpoints"),
        (name = "Health", description = "Liveness"),
    )
)]
pub struct ApiDoc;
