//! Video library constants

/// Container extension used for every transcoded rendition
pub const RENDITION_EXTENSION: &str = "mp4";

/// MIME type of every transcoded rendition
pub const RENDITION_MIME_TYPE: &str = "video/mp4";

/// MIME type assumed when an upload did not record one
pub const DEFAULT_MIME_TYPE: &str = "video/mp4";

/// Upper bound on rows returned by a single listing
pub const MAX_LISTED_VIDEOS: i64 = 100;

/// Tier served when a stream request does not name one
pub const DEFAULT_QUALITY: &str = "720p";
