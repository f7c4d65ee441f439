use crate::{
    api::{attendance, chatbot, health},
    error::AttendanceError,
};
use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig, api_prefix: &str) {
    // Malformed bodies get the same error shape as everything else
    cfg.app_data(web::JsonConfig::default().error_handler(|err, _req| {
        AttendanceError::invalid(format!("Invalid JSON body: {err}")).into()
    }));

    cfg.service(health::health);

    cfg.service(
        web::scope(api_prefix)
            // /checkin
            .service(web::resource("/checkin").route(web::post().to(attendance::check_in)))
            // /checkout
            .service(web::resource("/checkout").route(web::post().to(attendance::check_out)))
            // /status/{user_id}
            .service(
                web::resource("/status/{user_id}")
                    .route(web::get().to(attendance::session_status)),
            )
            // /attendance/{user_id}/{month}
            .service(
                web::resource("/attendance/{user_id}/{month}")
                    .route(web::get().to(attendance::monthly_attendance)),
            )
            .service(
                web::scope("/chatbot")
                    .service(web::resource("/checkin").route(web::post().to(chatbot::check_in)))
                    .service(web::resource("/checkout").route(web::post().to(chatbot::check_out))),
            ),
    );
}
