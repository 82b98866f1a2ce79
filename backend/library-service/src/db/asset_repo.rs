/// Video repository - Postgres-backed asset directory
use std::collections::HashSet;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;
use video_core::constants::MAX_LISTED_VIDEOS;
use video_core::{Asset, Role, UploadStats, VideoStatus};

use super::AssetDirectory;
use crate::error::{AppError, Result};
use crate::services::access::{AssetQuery, VisibilityPredicate};

/// Owner role comes from the join, never from the video row
const SELECT_ASSETS: &str = "SELECT v.id, v.owner_id, u.role AS owner_role, v.title, \
     v.description, v.status, v.size_bytes, v.mime_type, v.filename, v.created_at \
     FROM videos v JOIN users u ON u.id = v.owner_id";

#[derive(Debug, Clone, sqlx::FromRow)]
struct AssetRow {
    id: Uuid,
    owner_id: Uuid,
    owner_role: String,
    title: String,
    description: Option<String>,
    status: String,
    size_bytes: i64,
    mime_type: String,
    filename: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AssetRow> for Asset {
    type Error = AppError;

    fn try_from(row: AssetRow) -> Result<Self> {
        let owner_role = Role::from_str(&row.owner_role).ok_or_else(|| {
            AppError::Database(format!("user {} has unknown role {}", row.owner_id, row.owner_role))
        })?;
        let status = VideoStatus::from_str(&row.status).ok_or_else(|| {
            AppError::Database(format!("video {} has unknown status {}", row.id, row.status))
        })?;

        Ok(Asset {
            id: row.id,
            owner_id: row.owner_id,
            owner_role,
            title: row.title,
            description: row.description,
            status,
            size_bytes: u64::try_from(row.size_bytes).unwrap_or(0),
            mime_type: row.mime_type,
            filename: row.filename,
            created_at: row.created_at,
        })
    }
}

#[derive(Clone)]
pub struct PgAssetDirectory {
    pool: PgPool,
}

impl PgAssetDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AssetDirectory for PgAssetDirectory {
    async fn get_asset(&self, id: Uuid) -> Result<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(&format!("{SELECT_ASSETS} WHERE v.id = $1"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Asset::try_from).transpose()
    }

    async fn owner_ids_by_role(&self, role: Role) -> Result<HashSet<Uuid>> {
        let ids: Vec<Uuid> = sqlx::query_scalar("SELECT id FROM users WHERE role = $1")
            .bind(role.as_str())
            .fetch_all(&self.pool)
            .await?;

        Ok(ids.into_iter().collect())
    }

    async fn list_assets(&self, query: &AssetQuery) -> Result<Vec<Asset>> {
        let mut qb = QueryBuilder::<Postgres>::new(SELECT_ASSETS);
        qb.push(" WHERE TRUE");

        match &query.predicate {
            VisibilityPredicate::All => {}
            VisibilityPredicate::OwnedBy(owner_id) => {
                qb.push(" AND v.owner_id = ").push_bind(*owner_id);
            }
            VisibilityPredicate::OwnedByAnyOf(owner_ids) => {
                let owner_ids: Vec<Uuid> = owner_ids.iter().copied().collect();
                qb.push(" AND v.owner_id = ANY(")
                    .push_bind(owner_ids)
                    .push(")");
            }
        }

        if let Some(status) = query.filters.status {
            qb.push(" AND v.status = ").push_bind(status.as_str());
        }
        if let Some(search) = &query.filters.search {
            qb.push(" AND v.title ILIKE ")
                .push_bind(format!("%{}%", escape_like(search)));
        }

        qb.push(" ORDER BY v.created_at DESC LIMIT ")
            .push_bind(MAX_LISTED_VIDEOS);

        let rows = qb
            .build_query_as::<AssetRow>()
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Asset::try_from).collect()
    }

    async fn upload_stats(&self, owner_id: Uuid) -> Result<UploadStats> {
        let (total, safe, flagged): (i64, i64, i64) = sqlx::query_as(
            "SELECT COUNT(*), \
                 COUNT(*) FILTER (WHERE status = 'Safe'), \
                 COUNT(*) FILTER (WHERE status = 'Flagged') \
             FROM videos WHERE owner_id = $1",
        )
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(UploadStats {
            total_videos: u64::try_from(total).unwrap_or(0),
            safe_videos: u64::try_from(safe).unwrap_or(0),
            flagged_videos: u64::try_from(flagged).unwrap_or(0),
        })
    }

    async fn delete_asset(&self, id: Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM videos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

/// Escape LIKE metacharacters so a search term is matched literally
fn escape_like(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len());
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}
