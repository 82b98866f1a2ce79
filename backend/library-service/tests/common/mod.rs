//! Shared fixtures for library-service integration tests
//!
//! The asset directory is an in-memory stand-in for Postgres; tokens are real
//! RS256 tokens from crypto-core; video bytes live in a temp media root.
#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::{Arc, RwLock};

use actix_web::dev::{Service, ServiceResponse};
use actix_web::{test, web, App};
use async_trait::async_trait;
use chrono::{Duration, Utc};
use library_service::config::StorageConfig;
use library_service::db::AssetDirectory;
use library_service::handlers;
use library_service::services::access::AssetQuery;
use library_service::services::{
    AssetLocator, JwtVerifier, LibraryService, ProgressHub, TokenVerifier,
};
use library_service::Result;
use tempfile::TempDir;
use uuid::Uuid;
use video_core::{Asset, QualityTier, Role, UploadStats, VideoStatus};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, Role>,
    videos: HashMap<Uuid, Asset>,
}

/// Owner role is looked up from `users` on every read, like the SQL join.
#[derive(Clone, Default)]
pub struct InMemoryDirectory {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryDirectory {
    pub fn add_user(&self, role: Role) -> Uuid {
        let id = Uuid::new_v4();
        self.tables.write().unwrap().users.insert(id, role);
        id
    }

    pub fn set_role(&self, user_id: Uuid, role: Role) {
        self.tables.write().unwrap().users.insert(user_id, role);
    }

    /// Insert a video record; `age_secs` pushes `created_at` into the past.
    pub fn add_video(
        &self,
        owner_id: Uuid,
        title: &str,
        status: VideoStatus,
        filename: &str,
        age_secs: i64,
    ) -> Uuid {
        let id = Uuid::new_v4();
        let asset = Asset {
            id,
            owner_id,
            // Overwritten from `users` on read
            owner_role: Role::Viewer,
            title: title.to_string(),
            description: None,
            status,
            size_bytes: 0,
            mime_type: "video/mp4".to_string(),
            filename: filename.to_string(),
            created_at: Utc::now() - Duration::seconds(age_secs),
        };
        self.tables.write().unwrap().videos.insert(id, asset);
        id
    }

    pub fn set_mime_type(&self, video_id: Uuid, mime_type: &str) {
        if let Some(asset) = self.tables.write().unwrap().videos.get_mut(&video_id) {
            asset.mime_type = mime_type.to_string();
        }
    }

    pub fn contains(&self, video_id: Uuid) -> bool {
        self.tables.read().unwrap().videos.contains_key(&video_id)
    }

    fn resolved(tables: &Tables, asset: &Asset) -> Option<Asset> {
        let owner_role = *tables.users.get(&asset.owner_id)?;
        Some(Asset {
            owner_role,
            ..asset.clone()
        })
    }
}

#[async_trait]
impl AssetDirectory for InMemoryDirectory {
    async fn get_asset(&self, id: Uuid) -> Result<Option<Asset>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .videos
            .get(&id)
            .and_then(|asset| Self::resolved(&tables, asset)))
    }

    async fn owner_ids_by_role(&self, role: Role) -> Result<HashSet<Uuid>> {
        let tables = self.tables.read().unwrap();
        Ok(tables
            .users
            .iter()
            .filter(|(_, r)| **r == role)
            .map(|(id, _)| *id)
            .collect())
    }

    async fn list_assets(&self, query: &AssetQuery) -> Result<Vec<Asset>> {
        let tables = self.tables.read().unwrap();
        let mut assets: Vec<Asset> = tables
            .videos
            .values()
            .filter_map(|asset| Self::resolved(&tables, asset))
            .filter(|asset| query.matches(asset))
            .collect();
        assets.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        assets.truncate(100);
        Ok(assets)
    }

    async fn upload_stats(&self, owner_id: Uuid) -> Result<UploadStats> {
        let tables = self.tables.read().unwrap();
        Ok(UploadStats::tally(
            tables
                .videos
                .values()
                .filter(|asset| asset.owner_id == owner_id)
                .map(|asset| asset.status),
        ))
    }

    async fn delete_asset(&self, id: Uuid) -> Result<bool> {
        Ok(self.tables.write().unwrap().videos.remove(&id).is_some())
    }
}

pub struct TestContext {
    pub directory: InMemoryDirectory,
    pub media: TempDir,
    pub hub: ProgressHub,
}

impl TestContext {
    pub fn new() -> Self {
        crypto_core::test_utils::init_test_keys();
        Self {
            directory: InMemoryDirectory::default(),
            media: TempDir::new().unwrap(),
            hub: ProgressHub::default(),
        }
    }

    pub fn media_root(&self) -> &Path {
        self.media.path()
    }

    pub fn locator(&self) -> AssetLocator {
        AssetLocator::new(self.media_root())
    }

    /// Write `len` bytes of a deterministic pattern as the original upload
    pub fn write_original(&self, filename: &str, len: usize) {
        std::fs::write(self.media_root().join(filename), pattern(len)).unwrap();
    }

    pub fn write_rendition(&self, video_id: Uuid, tier: QualityTier, len: usize) {
        let dir = self.locator().rendition_dir(video_id);
        std::fs::create_dir_all(&dir).unwrap();
        let name = tier.rendition_file_name().unwrap();
        std::fs::write(dir.join(name), pattern(len)).unwrap();
    }

    pub fn storage(&self) -> StorageConfig {
        StorageConfig {
            media_root: self.media_root().to_path_buf(),
            default_quality: QualityTier::Hd720,
            stream_chunk_size: 256,
        }
    }

    pub fn library(&self) -> LibraryService {
        LibraryService::new(
            Arc::new(self.directory.clone()),
            self.locator(),
            QualityTier::Hd720,
        )
    }

    pub async fn app(
        &self,
    ) -> impl Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>
    {
        let verifier: Arc<dyn TokenVerifier> = Arc::new(JwtVerifier);
        test::init_service(
            App::new()
                .app_data(web::Data::new(self.library()))
                .app_data(web::Data::new(self.hub.clone()))
                .app_data(web::Data::new(self.storage()))
                .configure(|cfg| handlers::configure(cfg, verifier)),
        )
        .await
    }
}

pub fn pattern(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

pub fn token_for(user_id: Uuid, role: Role) -> String {
    crypto_core::jwt::generate_access_token(user_id, role.as_str()).unwrap()
}

pub fn bearer(user_id: Uuid, role: Role) -> (&'static str, String) {
    ("Authorization", format!("Bearer {}", token_for(user_id, role)))
}

/// Status of a request whether the app answered it or a middleware rejected it
pub async fn status_of<S>(app: &S, req: actix_http::Request) -> actix_web::http::StatusCode
where
    S: Service<actix_http::Request, Response = ServiceResponse, Error = actix_web::Error>,
{
    match test::try_call_service(app, req).await {
        Ok(resp) => resp.status(),
        Err(err) => err.as_response_error().status_code(),
    }
}
