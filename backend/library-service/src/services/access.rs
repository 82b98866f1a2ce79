/// Role-based access control for videos
///
/// One role matrix (`view_scope`) drives both the per-asset decision used by
/// detail and stream, and the batched predicate used by listings, so the two
/// cannot disagree about what a role may see.
use std::collections::HashSet;

use uuid::Uuid;
use video_core::{Asset, Principal, Role, VideoStatus};

use crate::db::AssetDirectory;
use crate::error::Result;

/// Which videos a role may view or stream
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewScope {
    /// Every video
    Everything,
    /// Only videos the principal uploaded
    OwnUploads,
    /// Only videos whose owner currently holds the Admin role
    AdminUploads,
}

/// The role matrix.
pub const fn view_scope(role: Role) -> ViewScope {
    match role {
        Role::Admin => ViewScope::Everything,
        Role::Editor => ViewScope::OwnUploads,
        Role::Viewer => ViewScope::AdminUploads,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessReason {
    AdminOverride,
    Owner,
    NotOwner,
    AdminUpload,
    NotAdminUpload,
}

impl AccessReason {
    pub fn describe(&self) -> &'static str {
        match self {
            AccessReason::AdminOverride => "admins have full access",
            AccessReason::Owner => "principal owns the video",
            AccessReason::NotOwner => "video belongs to another user",
            AccessReason::AdminUpload => "video was uploaded by an admin",
            AccessReason::NotAdminUpload => "video was not uploaded by an admin",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AccessDecision {
    pub allowed: bool,
    pub reason: AccessReason,
}

impl AccessDecision {
    const fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    const fn deny(reason: AccessReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

/// View/stream rule. Total over its inputs and side-effect free.
pub fn decide(principal_role: Role, is_owner: bool, owner_role: Role) -> AccessDecision {
    match view_scope(principal_role) {
        ViewScope::Everything => AccessDecision::allow(AccessReason::AdminOverride),
        ViewScope::OwnUploads if is_owner => AccessDecision::allow(AccessReason::Owner),
        ViewScope::OwnUploads => AccessDecision::deny(AccessReason::NotOwner),
        ViewScope::AdminUploads if owner_role == Role::Admin => {
            AccessDecision::allow(AccessReason::AdminUpload)
        }
        ViewScope::AdminUploads => AccessDecision::deny(AccessReason::NotAdminUpload),
    }
}

/// Delete rule: owner or Admin, independent of the view rule.
pub fn decide_delete(principal_role: Role, is_owner: bool) -> AccessDecision {
    match (principal_role, is_owner) {
        (Role::Admin, _) => AccessDecision::allow(AccessReason::AdminOverride),
        (_, true) => AccessDecision::allow(AccessReason::Owner),
        (Role::Editor | Role::Viewer, false) => AccessDecision::deny(AccessReason::NotOwner),
    }
}

/// `CanAccess` for detail and stream call sites.
pub fn can_access(principal: &Principal, asset: &Asset) -> AccessDecision {
    decide(principal.role, principal.owns(asset), asset.owner_role)
}

pub fn can_delete(principal: &Principal, asset: &Asset) -> AccessDecision {
    decide_delete(principal.role, principal.owns(asset))
}

// ============================================================================
// Visibility filter (listing)
// ============================================================================

/// Role-derived boundary of a listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VisibilityPredicate {
    All,
    OwnedBy(Uuid),
    OwnedByAnyOf(HashSet<Uuid>),
}

impl VisibilityPredicate {
    pub fn matches(&self, owner_id: Uuid) -> bool {
        match self {
            VisibilityPredicate::All => true,
            VisibilityPredicate::OwnedBy(id) => *id == owner_id,
            VisibilityPredicate::OwnedByAnyOf(ids) => ids.contains(&owner_id),
        }
    }
}

/// Compute the listing predicate for `principal`.
///
/// Viewer visibility is a fresh lookup of who holds the Admin role right now,
/// so promotions and demotions take effect on the next call without touching
/// any video row.
pub async fn visible_predicate(
    principal: &Principal,
    directory: &dyn AssetDirectory,
) -> Result<VisibilityPredicate> {
    Ok(match view_scope(principal.role) {
        ViewScope::Everything => VisibilityPredicate::All,
        ViewScope::OwnUploads => VisibilityPredicate::OwnedBy(principal.user_id),
        ViewScope::AdminUploads => {
            VisibilityPredicate::OwnedByAnyOf(directory.owner_ids_by_role(Role::Admin).await?)
        }
    })
}

/// Optional narrowing applied inside the role boundary
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListFilters {
    pub status: Option<VideoStatus>,
    /// Case-insensitive substring of the title
    pub search: Option<String>,
}

impl ListFilters {
    /// Unknown status values and blank searches are ignored rather than rejected.
    pub fn from_raw(status: Option<&str>, search: Option<&str>) -> Self {
        Self {
            status: status.and_then(VideoStatus::from_str),
            search: search
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

/// Predicate plus filters, handed to the directory's listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetQuery {
    pub predicate: VisibilityPredicate,
    pub filters: ListFilters,
}

impl AssetQuery {
    /// Role predicate first; filters can only narrow what it admits.
    pub fn matches(&self, asset: &Asset) -> bool {
        if !self.predicate.matches(asset.owner_id) {
            return false;
        }
        if let Some(status) = self.filters.status {
            if asset.status != status {
                return false;
            }
        }
        match &self.filters.search {
            Some(needle) => asset
                .title
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            None => true,
        }
    }
}
