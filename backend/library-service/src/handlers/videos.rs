/// Video handlers - listing, detail, delete, dashboard counts and quality discovery
use actix_web::{web, HttpResponse};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use video_core::{Asset, QualityTier, Role, VideoStatus};

use crate::error::{AppError, Result};
use crate::middleware::AuthenticatedUser;
use crate::services::access::ListFilters;
use crate::services::LibraryService;

#[derive(Debug, Deserialize)]
pub struct ListVideosQuery {
    pub status: Option<String>,
    pub search: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct VideoResponse {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub owner_role: Role,
    pub title: String,
    pub description: Option<String>,
    pub status: VideoStatus,
    pub size_bytes: u64,
    pub mime_type: String,
    pub created_at: DateTime<Utc>,
}

impl From<Asset> for VideoResponse {
    fn from(asset: Asset) -> Self {
        Self {
            id: asset.id,
            owner_id: asset.owner_id,
            owner_role: asset.owner_role,
            title: asset.title,
            description: asset.description,
            status: asset.status,
            size_bytes: asset.size_bytes,
            mime_type: asset.mime_type,
            created_at: asset.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct QualitiesResponse {
    pub video_id: Uuid,
    pub status: VideoStatus,
    pub available_tiers: Vec<QualityTier>,
}

pub(crate) fn parse_video_id(raw: &str) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::BadRequest("Invalid video ID".to_string()))
}

/// List the videos the caller may see, newest first
pub async fn list_videos(
    library: web::Data<LibraryService>,
    user: AuthenticatedUser,
    query: web::Query<ListVideosQuery>,
) -> Result<HttpResponse> {
    let filters = ListFilters::from_raw(query.status.as_deref(), query.search.as_deref());
    let videos = library.list_visible(&user.0, filters).await?;

    let responses: Vec<VideoResponse> = videos.into_iter().map(VideoResponse::from).collect();
    Ok(HttpResponse::Ok().json(responses))
}

/// Get a specific video
pub async fn get_video(
    library: web::Data<LibraryService>,
    user: AuthenticatedUser,
    video_id: web::Path<String>,
) -> Result<HttpResponse> {
    let video_id = parse_video_id(&video_id)?;
    let asset = library.fetch_visible(&user.0, video_id).await?;

    Ok(HttpResponse::Ok().json(VideoResponse::from(asset)))
}

/// Delete a video and its files
pub async fn delete_video(
    library: web::Data<LibraryService>,
    user: AuthenticatedUser,
    video_id: web::Path<String>,
) -> Result<HttpResponse> {
    let video_id = parse_video_id(&video_id)?;
    library.delete(&user.0, video_id).await?;

    Ok(HttpResponse::NoContent().finish())
}

/// Counts for the caller's own uploads
pub async fn get_dashboard_stats(
    library: web::Data<LibraryService>,
    user: AuthenticatedUser,
) -> Result<HttpResponse> {
    let stats = library.upload_stats(&user.0).await?;

    Ok(HttpResponse::Ok().json(stats))
}

pub async fn get_qualities(
    library: web::Data<LibraryService>,
    user: AuthenticatedUser,
    video_id: web::Path<String>,
) -> Result<HttpResponse> {
    let video_id = parse_video_id(&video_id)?;
    let (asset, available_tiers) = library.available_tiers(&user.0, video_id).await?;

    Ok(HttpResponse::Ok().json(QualitiesResponse {
        video_id,
        status: asset.status,
        available_tiers,
    }))
}
