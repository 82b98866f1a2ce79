/// Stream responder - turns a negotiated plan into status, headers and bytes
///
/// Each response opens its own read handle at its own offset, so concurrent
/// range requests against one file need no coordination. The handle is owned
/// by the body stream: it is dropped when the copy finishes, when the body
/// stream fails, or when actix drops the body because the client went away
/// (browsers abort constantly while seeking).
use std::io::{self, ErrorKind, SeekFrom};

use actix_web::body::SizedStream;
use actix_web::http::header::{
    HeaderValue, ACCEPT_RANGES, CACHE_CONTROL, CONTENT_LENGTH, CONTENT_RANGE, CONTENT_TYPE,
};
use actix_web::http::StatusCode;
use actix_web::HttpResponse;
use bytes::{Bytes, BytesMut};
use futures::{Stream, TryStreamExt};
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use uuid::Uuid;
use video_core::constants::{DEFAULT_MIME_TYPE, RENDITION_MIME_TYPE};
use video_core::QualityTier;

use crate::error::{AppError, Result};
use crate::metrics;
use crate::services::locator::LocatedFile;
use crate::services::range::{RangePlan, ACCEPT_RANGES_BYTES};

/// Everything needed to answer one stream request
#[derive(Debug, Clone)]
pub struct StreamPlan {
    pub video_id: Uuid,
    pub file: LocatedFile,
    pub range: RangePlan,
    /// Recorded MIME type of the original upload
    pub mime_type: String,
}

/// Build the response for `plan`.
///
/// I/O failures while opening or seeking surface as errors (5xx, or 410 when
/// the file vanished after it was located). Failures once the body is flowing
/// can only cut the stream short; the status line is already on the wire.
pub async fn respond(plan: StreamPlan, chunk_size: usize) -> Result<HttpResponse> {
    let status = StatusCode::from_u16(plan.range.status_code())
        .map_err(|e| AppError::Internal(e.to_string()))?;

    if let RangePlan::Unsatisfiable { total } = plan.range {
        metrics::record_stream_response(status.as_u16(), 0);
        return Ok(HttpResponse::build(status)
            .insert_header((CONTENT_RANGE, format!("bytes */{total}")))
            .finish());
    }

    let start = plan.range.start();
    let length = plan.range.content_length();
    let file = open_at(&plan, start).await?;

    tracing::debug!(
        video_id = %plan.video_id,
        quality = plan.file.tier.as_str(),
        status = status.as_u16(),
        start,
        length,
        total = plan.range.total(),
        "streaming video"
    );
    metrics::record_stream_response(status.as_u16(), length);

    let video_id = plan.video_id;
    let body = read_window(file, length, chunk_size.max(1)).inspect_err(move |e| {
        tracing::warn!(%video_id, error = %e, "video stream terminated early");
    });

    let mut builder = HttpResponse::build(status);
    builder
        .insert_header((CONTENT_TYPE, content_type(&plan)))
        .insert_header((CONTENT_LENGTH, length.to_string()))
        .insert_header((ACCEPT_RANGES, ACCEPT_RANGES_BYTES))
        .insert_header((CACHE_CONTROL, "no-cache"));
    if let Some(content_range) = plan.range.content_range() {
        builder.insert_header((CONTENT_RANGE, content_range));
    }

    Ok(builder.body(SizedStream::new(length, body)))
}

async fn open_at(plan: &StreamPlan, start: u64) -> Result<File> {
    let mut file = File::open(&plan.file.path).await.map_err(|e| {
        if e.kind() == ErrorKind::NotFound {
            // Deleted between locate and open
            AppError::AssetFileMissing
        } else {
            AppError::Storage(format!("open {}: {e}", plan.file.path.display()))
        }
    })?;

    if start > 0 {
        file.seek(SeekFrom::Start(start))
            .await
            .map_err(|e| AppError::Storage(format!("seek {}: {e}", plan.file.path.display())))?;
    }
    Ok(file)
}

/// Renditions are always MP4; only the original carries the recorded type.
fn content_type(plan: &StreamPlan) -> HeaderValue {
    if plan.file.tier != QualityTier::Original {
        return HeaderValue::from_static(RENDITION_MIME_TYPE);
    }
    HeaderValue::from_str(&plan.mime_type)
        .unwrap_or_else(|_| HeaderValue::from_static(DEFAULT_MIME_TYPE))
}

/// Yield exactly `length` bytes from `file` in chunks of at most `chunk_size`.
fn read_window(
    file: File,
    length: u64,
    chunk_size: usize,
) -> impl Stream<Item = io::Result<Bytes>> {
    futures::stream::try_unfold((file, length), move |(mut file, remaining)| async move {
        if remaining == 0 {
            return Ok(None);
        }

        let want = usize::try_from(remaining).map_or(chunk_size, |r| r.min(chunk_size));
        let mut buf = BytesMut::zeroed(want);
        let read = file.read(&mut buf).await?;
        if read == 0 {
            return Err(io::Error::new(
                ErrorKind::UnexpectedEof,
                "video file shrank while streaming",
            ));
        }
        buf.truncate(read);

        Ok(Some((buf.freeze(), (file, remaining - read as u64))))
    })
}
