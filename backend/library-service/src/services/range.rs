/// Range negotiator - HTTP byte-range handling for video playback
///
/// Turns an optional `Range` header and the size of the file actually being
/// served into a [`RangePlan`]. Only single ranges of the form `bytes=S-E` or
/// `bytes=S-` are honoured. Anything unparsable (multi-range, suffix ranges,
/// other units, garbage) degrades to the full file; a well-formed range that
/// does not fit the file becomes a 416 plan.
///
/// Header values produced here are consumed verbatim by browsers' media
/// elements when seeking, so their formatting must not drift.
use thiserror::Error;

/// Value of the `Accept-Ranges` header on every stream response
pub const ACCEPT_RANGES_BYTES: &str = "bytes";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RangePlan {
    /// 200 with the whole file
    Full { total: u64 },
    /// 206 with the inclusive window `start..=end`
    Partial { start: u64, end: u64, total: u64 },
    /// 416, no body
    Unsatisfiable { total: u64 },
}

impl RangePlan {
    pub fn status_code(&self) -> u16 {
        match self {
            RangePlan::Full { .. } => 200,
            RangePlan::Partial { .. } => 206,
            RangePlan::Unsatisfiable { .. } => 416,
        }
    }

    pub fn total(&self) -> u64 {
        match *self {
            RangePlan::Full { total }
            | RangePlan::Partial { total, .. }
            | RangePlan::Unsatisfiable { total } => total,
        }
    }

    /// Offset of the first byte to copy
    pub fn start(&self) -> u64 {
        match *self {
            RangePlan::Partial { start, .. } => start,
            _ => 0,
        }
    }

    /// Number of body bytes. Zero for 416.
    pub fn content_length(&self) -> u64 {
        match *self {
            RangePlan::Full { total } => total,
            RangePlan::Partial { start, end, .. } => end - start + 1,
            RangePlan::Unsatisfiable { .. } => 0,
        }
    }

    /// Inclusive byte window, if any bytes are to be sent
    pub fn window(&self) -> Option<(u64, u64)> {
        match *self {
            RangePlan::Full { total } if total > 0 => Some((0, total - 1)),
            RangePlan::Full { .. } | RangePlan::Unsatisfiable { .. } => None,
            RangePlan::Partial { start, end, .. } => Some((start, end)),
        }
    }

    /// `Content-Range` value, absent on 200
    pub fn content_range(&self) -> Option<String> {
        match *self {
            RangePlan::Full { .. } => None,
            RangePlan::Partial { start, end, total } => {
                Some(format!("bytes {start}-{end}/{total}"))
            }
            RangePlan::Unsatisfiable { total } => Some(format!("bytes */{total}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("malformed Range header: {0}")]
    Malformed(&'static str),

    #[error("range start {start}, end {end:?} not satisfiable for {total} bytes")]
    Unsatisfiable {
        start: u64,
        end: Option<u64>,
        total: u64,
    },
}

/// Syntactic form of `bytes=S-E` before it meets a file size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRangeSpec {
    pub start: u64,
    /// Absent for open-ended `bytes=S-`
    pub end: Option<u64>,
}

impl ByteRangeSpec {
    /// Check the requested range against `total` and produce the inclusive window.
    pub fn resolve(self, total: u64) -> Result<(u64, u64), RangeError> {
        let unsatisfiable = RangeError::Unsatisfiable {
            start: self.start,
            end: self.end,
            total,
        };

        if self.start >= total {
            return Err(unsatisfiable);
        }
        let end = self.end.unwrap_or(total - 1);
        if end >= total || self.start > end {
            return Err(unsatisfiable);
        }
        Ok((self.start, end))
    }
}

/// Parse a single-range `Range` header value.
pub fn parse_range(header: &str) -> Result<ByteRangeSpec, RangeError> {
    let (unit, set) = header
        .trim()
        .split_once('=')
        .ok_or(RangeError::Malformed("missing '='"))?;

    if !unit.trim().eq_ignore_ascii_case("bytes") {
        return Err(RangeError::Malformed("unsupported range unit"));
    }
    if set.contains(',') {
        return Err(RangeError::Malformed("multiple ranges"));
    }

    let (start, end) = set
        .split_once('-')
        .ok_or(RangeError::Malformed("missing '-'"))?;
    let (start, end) = (start.trim(), end.trim());

    if start.is_empty() {
        return Err(RangeError::Malformed("suffix ranges are not supported"));
    }

    Ok(ByteRangeSpec {
        start: parse_position(start)?,
        end: if end.is_empty() {
            None
        } else {
            Some(parse_position(end)?)
        },
    })
}

/// Digits only. Values beyond u64 saturate, so they fail bounds checks (416)
/// instead of being mistaken for malformed input.
fn parse_position(digits: &str) -> Result<u64, RangeError> {
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::Malformed("range positions must be decimal digits"));
    }
    Ok(digits.bytes().fold(0u64, |acc, b| {
        acc.saturating_mul(10).saturating_add(u64::from(b - b'0'))
    }))
}

/// Decide what to send for `range_header` against a file of `total` bytes.
pub fn negotiate(range_header: Option<&str>, total: u64) -> RangePlan {
    let Some(raw) = range_header else {
        return RangePlan::Full { total };
    };

    match parse_range(raw).and_then(|spec| spec.resolve(total)) {
        Ok((start, end)) => RangePlan::Partial { start, end, total },
        Err(err @ RangeError::Malformed(_)) => {
            tracing::debug!(range = raw, error = %err, "ignoring Range header, serving full content");
            RangePlan::Full { total }
        }
        Err(err @ RangeError::Unsatisfiable { .. }) => {
            tracing::debug!(range = raw, error = %err, "range not satisfiable");
            RangePlan::Unsatisfiable { total }
        }
    }
}
