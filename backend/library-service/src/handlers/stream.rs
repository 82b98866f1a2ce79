/// Stream handler - byte-range video delivery
use actix_web::http::header::RANGE;
use actix_web::{web, HttpRequest, HttpResponse};
use serde::Deserialize;

use crate::config::StorageConfig;
use crate::error::Result;
use crate::handlers::videos::parse_video_id;
use crate::middleware::AuthenticatedUser;
use crate::services::{responder, LibraryService};

#[derive(Debug, Deserialize)]
pub struct StreamQuery {
    pub quality: Option<String>,
}

/// GET /videos/{id}/stream?quality=
pub async fn stream_video(
    req: HttpRequest,
    library: web::Data<LibraryService>,
    storage: web::Data<StorageConfig>,
    user: AuthenticatedUser,
    video_id: web::Path<String>,
    query: web::Query<StreamQuery>,
) -> Result<HttpResponse> {
    let video_id = parse_video_id(&video_id)?;
    // A Range header that is not visible ASCII is as unusable as a malformed one
    let range = req.headers().get(RANGE).and_then(|v| v.to_str().ok());

    let plan = library
        .prepare_stream(&user.0, video_id, query.quality.as_deref(), range)
        .await?;

    responder::respond(plan, storage.stream_chunk_size).await
}
