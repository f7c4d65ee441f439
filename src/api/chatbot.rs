//! Chat-bot skill adapter.
//!
//! The skill payload nests the caller's identity a few levels deep and under
//! different keys depending on the channel. Everything platform-specific stays
//! in this file; the service only ever sees a normalized user id.

use actix_web::{HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};
use utoipa::ToSchema;

use crate::error::AttendanceError;
use crate::service::AttendanceService;
use crate::utils::reference_day::ReferenceZone;

const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

#[derive(Debug, Default, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SkillUserProperties {
    pub bot_user_key: Option<String>,
    pub plusfriend_user_key: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SkillUser {
    pub id: Option<String>,
    #[serde(default)]
    pub properties: SkillUserProperties,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SkillUserRequest {
    pub user: Option<SkillUser>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[schema(example = json!({
    "userRequest": {
        "user": {
            "id": "a1b2c3",
            "properties": { "botUserKey": "a1b2c3" }
        }
    }
}))]
pub struct SkillPayload {
    pub user_request: Option<SkillUserRequest>,
}

impl SkillPayload {
    /// First non-blank of `botUserKey`, `plusfriendUserKey`, `user.id`.
    pub fn user_id(&self) -> Option<&str> {
        let user = self.user_request.as_ref()?.user.as_ref()?;
        [
            user.properties.bot_user_key.as_deref(),
            user.properties.plusfriend_user_key.as_deref(),
            user.id.as_deref(),
        ]
        .into_iter()
        .flatten()
        .map(str::trim)
        .find(|id| !id.is_empty())
    }
}

fn display_time(zone: ReferenceZone, ts: DateTime<Utc>) -> String {
    zone.to_local(ts).format(DISPLAY_FORMAT).to_string()
}

fn simple_text(text: impl Into<String>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "version": "2.0",
        "template": {
            "outputs": [
                { "simpleText": { "text": text.into() } }
            ]
        }
    }))
}

/// Rule violations are answered in-chat; everything else keeps its status.
fn reply_or_error<T>(
    result: Result<T, AttendanceError>,
    on_success: impl FnOnce(T) -> String,
) -> Result<HttpResponse, AttendanceError> {
    match result {
        Ok(value) => Ok(simple_text(on_success(value))),
        Err(e @ (AttendanceError::AlreadyCheckedIn | AttendanceError::NoOpenCheckIn)) => {
            Ok(simple_text(e.to_string()))
        }
        Err(e) => Err(e),
    }
}

fn skill_user_id(payload: &SkillPayload) -> Result<&str, AttendanceError> {
    payload.user_id().ok_or_else(|| {
        warn!("Skill payload without a user id");
        AttendanceError::invalid("userId is required")
    })
}

/// Chat-bot check-in
#[utoipa::path(
    post,
    path = "/chatbot/checkin",
    request_body = SkillPayload,
    responses(
        (status = 200, description = "Skill response", body = Object, example = json!({
            "version": "2.0",
            "template": { "outputs": [ { "simpleText": { "text": "2024-03-10 09:00 출근" } } ] }
        })),
        (status = 400, description = "No user id in payload", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Chatbot"
)]
pub async fn check_in(
    service: web::Data<AttendanceService>,
    payload: web::Json<SkillPayload>,
) -> Result<HttpResponse, AttendanceError> {
    let user_id = skill_user_id(&payload)?;
    info!(user_id, "Chat-bot check-in");

    let zone = service.zone();
    let result = service.check_in(user_id, service.now()).await;
    reply_or_error(result, |record| {
        format!("{} 출근", display_time(zone, record.timestamp))
    })
}

/// Chat-bot check-out
#[utoipa::path(
    post,
    path = "/chatbot/checkout",
    request_body = SkillPayload,
    responses(
        (status = 200, description = "Skill response", body = Object, example = json!({
            "version": "2.0",
            "template": { "outputs": [ { "simpleText": { "text": "2024-03-10 18:00 퇴근" } } ] }
        })),
        (status = 400, description = "No user id in payload", body = ErrorResponse),
        (status = 500, description = "Internal server error", body = ErrorResponse)
    ),
    tag = "Chatbot"
)]
pub async fn check_out(
    service: web::Data<AttendanceService>,
    payload: web::Json<SkillPayload>,
) -> Result<HttpResponse, AttendanceError> {
    let user_id = skill_user_id(&payload)?;
    info!(user_id, "Chat-bot check-out");

    let zone = service.zone();
    let now = service.now();
    let result = service.check_out(user_id, now).await;
    reply_or_error(result, |_| format!("{} 퇴근", display_time(zone, now)))
}
