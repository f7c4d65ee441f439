use actix_web::{HttpResponse, web};
use tracing::info;

use crate::error::AttendanceError;
use crate::model::year_month::YearMonth;
use crate::models::{AttendanceActionResponse, AttendanceResponse, SessionStatusResponse, UserIdReq};
use crate::service::AttendanceService;

fn required_user_id(req: &UserIdReq) -> Result<&str, AttendanceError> {
    req.user_id
        .as_deref()
        .ok_or_else(|| AttendanceError::invalid("userId is required"))
}

/// Check-in endpoint
#[utoipa::path(
    post,
    path = "/checkin",
    request_body(
        content = UserIdReq,
        description = "User checking in",
        content_type = "application/json"
    ),
    responses(
        (status = 201, description = "Checked in successfully", body = AttendanceActionResponse),
        (status = 400, description = "Missing userId or already checked in today", body = ErrorResponse, example = json!({
            "error": "rule_violation",
            "message": "Already checked in today"
        })),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn check_in(
    service: web::Data<AttendanceService>,
    body: web::Json<UserIdReq>,
) -> Result<HttpResponse, AttendanceError> {
    let user_id = required_user_id(&body)?;
    let record = service.check_in(user_id, service.now()).await?;

    Ok(HttpResponse::Created().json(AttendanceActionResponse {
        message: "Checked in successfully".to_string(),
        record: AttendanceResponse::from_record(record, service.zone()),
    }))
}

/// Check-out endpoint
#[utoipa::path(
    post,
    path = "/checkout",
    request_body(
        content = UserIdReq,
        description = "User checking out",
        content_type = "application/json"
    ),
    responses(
        (status = 200, description = "Checked out successfully", body = AttendanceActionResponse),
        (status = 400, description = "Missing userId or no check-in today", body = ErrorResponse, example = json!({
            "error": "rule_violation",
            "message": "No check-in record found for today"
        })),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn check_out(
    service: web::Data<AttendanceService>,
    body: web::Json<UserIdReq>,
) -> Result<HttpResponse, AttendanceError> {
    let user_id = required_user_id(&body)?;
    let record = service.check_out(user_id, service.now()).await?;

    Ok(HttpResponse::Ok().json(AttendanceActionResponse {
        message: "Checked out successfully".to_string(),
        record: AttendanceResponse::from_record(record, service.zone()),
    }))
}

/// Monthly attendance listing, oldest first
#[utoipa::path(
    get,
    path = "/attendance/{user_id}/{month}",
    params(
        ("user_id" = String, Path, description = "User id"),
        ("month" = String, Path, description = "Month as YYYY-MM", example = "2024-03")
    ),
    responses(
        (status = 200, description = "Records of the month", body = [AttendanceResponse]),
        (status = 400, description = "Malformed month", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn monthly_attendance(
    service: web::Data<AttendanceService>,
    path: web::Path<(String, String)>,
) -> Result<HttpResponse, AttendanceError> {
    let (user_id, month) = path.into_inner();
    let month: YearMonth = month.parse()?;

    let records = service.monthly_attendance(&user_id, month).await?;
    info!(user_id = %user_id, count = records.len(), "Monthly attendance listed");

    let zone = service.zone();
    let body: Vec<AttendanceResponse> = records
        .into_iter()
        .map(|r| AttendanceResponse::from_record(r, zone))
        .collect();
    Ok(HttpResponse::Ok().json(body))
}

/// Whether the user has an open session today
#[utoipa::path(
    get,
    path = "/status/{user_id}",
    params(
        ("user_id" = String, Path, description = "User id")
    ),
    responses(
        (status = 200, description = "Today's session state", body = SessionStatusResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Attendance"
)]
pub async fn session_status(
    service: web::Data<AttendanceService>,
    path: web::Path<String>,
) -> Result<HttpResponse, AttendanceError> {
    let user_id = path.into_inner();
    let open = service.open_session(&user_id, service.now()).await?;

    Ok(HttpResponse::Ok().json(SessionStatusResponse {
        user_id: user_id.trim().to_string(),
        checked_in: open.is_some(),
        record: open.map(|r| AttendanceResponse::from_record(r, service.zone())),
    }))
}
