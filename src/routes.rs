use crate::{
    api::{attendance, stats, status, student},
    config::Config,
    docs::ApiDoc,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_cors::Cors;
use actix_web::{http::header, middleware::Condition, web};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

/// Largest accepted JSON body; QR payloads are small.
const JSON_LIMIT: usize = 64 * 1024;

/// CORS for the scanner and dashboard pages, which are served from their own origin.
pub fn cors(config: &Config) -> Cors {
    let cors = Cors::default()
        .allowed_methods(vec!["GET", "POST"])
        .allowed_headers(vec![header::CONTENT_TYPE, header::ACCEPT])
        .supports_credentials()
        .max_age(3600);

    if config.cors_origins.iter().any(|o| o == "*") {
        return cors.allow_any_origin();
    }
    let origins = config.cors_origins.clone();
    cors.allowed_origin_fn(move |origin, _req| origins.iter().any(|o| o.as_bytes() == origin.as_bytes()))
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    // Helper to build per-route limiter, 0 disables it
    fn build_limiter(requests_per_min: u32) -> Condition<Governor<PeerIpKeyExtractor, NoOpMiddleware>> {
        let per_ms = if requests_per_min == 0 {
            1
        } else {
            (60_000 / requests_per_min as u64).max(1)
        };
        let cfg: GovernorConfig<PeerIpKeyExtractor, NoOpMiddleware> = GovernorConfigBuilder::default()
            .per_millisecond(per_ms)
            .burst_size(requests_per_min.max(1))
            .key_extractor(PeerIpKeyExtractor)
            .finish()
            .unwrap_or_default();
        Condition::new(requests_per_min > 0, Governor::new(&cfg))
    }

    let json_config = web::JsonConfig::default()
        .limit(JSON_LIMIT)
        .error_handler(|err, _req| {
            AppError::invalid("body", format!("Invalid JSON payload: {err}")).into()
        });

    cfg.app_data(json_config)
        .service(status::index)
        .service(
            SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                .url("/api-doc/openapi.json", ApiDoc::openapi()),
        )
        .service(
            web::scope(&config.api_prefix)
                .wrap(build_limiter(config.rate_api_per_min))
                .service(
                    web::resource("/attendance")
                        .wrap(build_limiter(config.rate_mark_per_min))
                        .route(web::post().to(attendance::mark_attendance)),
                )
                // must precede /attendance/{date}
                .service(
                    web::resource("/attendance/today").route(web::get().to(attendance::attendance_today)),
                )
                .service(
                    web::resource("/attendance/{date}").route(web::get().to(attendance::attendance_for_date)),
                )
                .service(web::resource("/stats").route(web::get().to(stats::stats_today)))
                .service(web::resource("/stats/{date}").route(web::get().to(stats::stats_for_date)))
                .service(
                    web::resource("/student-stats/{roll}").route(web::get().to(stats::student_stats)),
                )
                .service(
                    web::resource("/students")
                        .route(web::get().to(student::list_students))
                        .route(web::post().to(student::add_student)),
                )
                .service(web::resource("/students/seed").route(web::get().to(student::seed_students)))
                .service(web::resource("/status").route(web::get().to(status::system_status)))
                .default_service(web::to(status::not_found)),
        );
}
