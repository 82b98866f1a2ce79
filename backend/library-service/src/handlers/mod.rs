/// HTTP handlers for library-service
///
/// - Videos: list, detail, delete, dashboard counts, quality discovery
/// - Stream: range-request delivery
/// - Events: processing progress over SSE
pub mod events;
pub mod stream;
pub mod videos;

use std::sync::Arc;

use actix_web::{web, HttpResponse};

use crate::metrics;
use crate::middleware::{JwtAuthMiddleware, MetricsMiddleware};
use crate::services::{TokenCarriers, TokenVerifier};

pub use events::progress_events;
pub use stream::stream_video;
pub use videos::{delete_video, get_dashboard_stats, get_qualities, get_video, list_videos};

/// Register every route. Stream and events accept a query-string token since
/// `<video>` and `EventSource` cannot send headers; the rest require the header.
pub fn configure(cfg: &mut web::ServiceConfig, verifier: Arc<dyn TokenVerifier>) {
    let header_auth = JwtAuthMiddleware::new(TokenCarriers::HeaderOnly, verifier.clone());
    let query_auth = JwtAuthMiddleware::new(TokenCarriers::HeaderOrQuery, verifier);

    cfg.route("/metrics", web::get().to(metrics::serve_metrics))
        .route(
            "/api/v1/health",
            web::get()
                .to(|| async { HttpResponse::Ok().json(serde_json::json!({"status": "ok"})) }),
        )
        .route(
            "/api/v1/health/ready",
            web::get().to(|| async { HttpResponse::Ok().finish() }),
        )
        .route(
            "/api/v1/health/live",
            web::get().to(|| async { HttpResponse::Ok().finish() }),
        )
        .service(
            web::scope("/api/v1")
                .wrap(MetricsMiddleware)
                .service(
                    web::resource("/videos/events")
                        .wrap(query_auth.clone())
                        .route(web::get().to(progress_events)),
                )
                .service(
                    web::resource("/videos/{id}/stream")
                        .wrap(query_auth)
                        .route(web::get().to(stream_video)),
                )
                .service(
                    web::scope("/videos")
                        .wrap(header_auth)
                        .route("", web::get().to(list_videos))
                        .route("/dashboard/stats", web::get().to(get_dashboard_stats))
                        .route("/{id}", web::get().to(get_video))
                        .route("/{id}", web::delete().to(delete_video))
                        .route("/{id}/qualities", web::get().to(get_qualities)),
                ),
        );
}
