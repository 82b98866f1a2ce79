/// Library service - orchestrates directory, policy and locator per request
///
/// Check order for any single video is fixed: existence (404), then rights
/// (403), then readiness (202), then bytes on disk (410). A caller without
/// rights therefore never learns whether a video is still processing or
/// whether its file is gone.
use std::sync::Arc;

use uuid::Uuid;
use video_core::{Asset, Principal, QualityTier, UploadStats};

use crate::db::AssetDirectory;
use crate::error::{AppError, Result};
use crate::services::access::{self, AssetQuery, ListFilters};
use crate::services::locator::AssetLocator;
use crate::services::range::negotiate;
use crate::services::responder::StreamPlan;

#[derive(Clone)]
pub struct LibraryService {
    directory: Arc<dyn AssetDirectory>,
    locator: AssetLocator,
    default_quality: QualityTier,
}

impl LibraryService {
    pub fn new(
        directory: Arc<dyn AssetDirectory>,
        locator: AssetLocator,
        default_quality: QualityTier,
    ) -> Self {
        Self {
            directory,
            locator,
            default_quality,
        }
    }

    async fn find(&self, video_id: Uuid) -> Result<Asset> {
        self.directory
            .get_asset(video_id)
            .await?
            .ok_or(AppError::AssetNotFound)
    }

    /// Fetch a video the principal may view.
    pub async fn fetch_visible(&self, principal: &Principal, video_id: Uuid) -> Result<Asset> {
        let asset = self.find(video_id).await?;

        let decision = access::can_access(principal, &asset);
        if !decision.allowed {
            tracing::warn!(
                user_id = %principal.user_id,
                role = principal.role.as_str(),
                %video_id,
                reason = decision.reason.describe(),
                "video access denied"
            );
            return Err(AppError::Forbidden(
                "You do not have access to this video".to_string(),
            ));
        }
        Ok(asset)
    }

    /// Listing query for `principal`, filters applied inside the role boundary.
    pub async fn visible_query(
        &self,
        principal: &Principal,
        filters: ListFilters,
    ) -> Result<AssetQuery> {
        Ok(AssetQuery {
            predicate: access::visible_predicate(principal, self.directory.as_ref()).await?,
            filters,
        })
    }

    pub async fn list_visible(
        &self,
        principal: &Principal,
        filters: ListFilters,
    ) -> Result<Vec<Asset>> {
        let query = self.visible_query(principal, filters).await?;
        self.directory.list_assets(&query).await
    }

    /// Dashboard counts over the principal's own uploads, whatever the role.
    pub async fn upload_stats(&self, principal: &Principal) -> Result<UploadStats> {
        self.directory.upload_stats(principal.user_id).await
    }

    /// Everything up to the first byte of a stream response.
    ///
    /// `quality` is the raw query value; absent means the configured default,
    /// an unknown name is rejected.
    pub async fn prepare_stream(
        &self,
        principal: &Principal,
        video_id: Uuid,
        quality: Option<&str>,
        range_header: Option<&str>,
    ) -> Result<StreamPlan> {
        let asset = self.fetch_visible(principal, video_id).await?;

        if !asset.status.is_streamable() {
            return Err(AppError::NotReady);
        }

        let requested = match quality {
            None => self.default_quality,
            Some(raw) => QualityTier::from_str(raw)
                .ok_or_else(|| AppError::BadRequest(format!("unknown quality {raw:?}")))?,
        };

        let file = self.locator.locate(&asset, requested).await?;
        let range = negotiate(range_header, file.size);

        Ok(StreamPlan {
            video_id: asset.id,
            file,
            range,
            mime_type: asset.mime_type,
        })
    }

    /// The video plus the tiers that would be served without fallback now.
    pub async fn available_tiers(
        &self,
        principal: &Principal,
        video_id: Uuid,
    ) -> Result<(Asset, Vec<QualityTier>)> {
        let asset = self.fetch_visible(principal, video_id).await?;
        let tiers = self.locator.available_tiers(&asset).await?;
        Ok((asset, tiers))
    }

    /// Delete a video record, then its files.
    ///
    /// Once the record is deleted the call succeeds; failing to remove files
    /// is logged. Streams already in flight keep their open handles and finish.
    pub async fn delete(&self, principal: &Principal, video_id: Uuid) -> Result<()> {
        let asset = self.find(video_id).await?;

        if !access::can_delete(principal, &asset).allowed {
            tracing::warn!(
                user_id = %principal.user_id,
                role = principal.role.as_str(),
                %video_id,
                "video delete denied"
            );
            return Err(AppError::Forbidden(
                "Only the owner or an admin can delete this video".to_string(),
            ));
        }

        if !self.directory.delete_asset(video_id).await? {
            // Lost a race with another delete
            return Err(AppError::AssetNotFound);
        }
        tracing::info!(user_id = %principal.user_id, %video_id, "video deleted");

        // The record is gone; leftover files must not turn this into a failure
        if let Err(e) = self.locator.release_files(&asset).await {
            tracing::error!(%video_id, error = %e, "failed to release video files");
        }
        Ok(())
    }
}
