//! Persistence seam for video records.
//!
//! The delivery engine only reads through [`AssetDirectory`]; the Postgres
//! implementation lives in [`asset_repo`].

pub mod asset_repo;

use std::collections::HashSet;

use async_trait::async_trait;
use uuid::Uuid;
use video_core::{Asset, Role, UploadStats};

use crate::error::Result;
use crate::services::access::AssetQuery;

pub use asset_repo::PgAssetDirectory;

#[async_trait]
pub trait AssetDirectory: Send + Sync {
    /// Look up one video. `owner_role` must be resolved at call time.
    async fn get_asset(&self, id: Uuid) -> Result<Option<Asset>>;

    /// Ids of every user currently holding `role`.
    async fn owner_ids_by_role(&self, role: Role) -> Result<HashSet<Uuid>>;

    /// Videos admitted by `query`, newest first.
    async fn list_assets(&self, query: &AssetQuery) -> Result<Vec<Asset>>;

    /// Counts over the videos `owner_id` uploaded.
    async fn upload_stats(&self, owner_id: Uuid) -> Result<UploadStats>;

    /// Remove the record. Returns false when nothing was deleted.
    async fn delete_asset(&self, id: Uuid) -> Result<bool>;
}
