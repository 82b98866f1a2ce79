/// Processing progress as server-sent events
use actix_web::http::header::{CACHE_CONTROL, CONTENT_TYPE};
use actix_web::{web, HttpResponse};

use crate::middleware::AuthenticatedUser;
use crate::services::progress::{sse_stream, ProgressHub};

/// GET /videos/events - the caller's own progress channel
pub async fn progress_events(
    hub: web::Data<ProgressHub>,
    user: AuthenticatedUser,
) -> HttpResponse {
    let subscription = hub.subscribe(user.0.user_id);
    tracing::debug!(user_id = %user.0.user_id, "progress stream opened");

    HttpResponse::Ok()
        .insert_header((CONTENT_TYPE, "text/event-stream"))
        .insert_header((CACHE_CONTROL, "no-cache"))
        .streaming(sse_stream(subscription))
}
