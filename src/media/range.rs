//! HTTP range negotiation.
//!
//! Decides between a full response, a bounded partial response, and a
//! 416 based on the `Range` and `If-Range` headers. An off-by-one here
//! breaks playback and seek for every client, so every `Partial`
//! upholds `0 <= start <= end < size`.

use crate::media::validators::Validators;

/// Outcome of range negotiation for one request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Negotiated {
    /// Serve the whole file with 200.
    Full,
    /// Serve `[start, end]` inclusive with 206.
    Partial { start: u64, end: u64 },
    /// Answer 416 with `Content-Range: bytes */<size>`.
    Unsatisfiable,
}

/// Negotiate the response shape for a file of `size` bytes.
///
/// A stale `If-Range` validator drops the `Range` header entirely and
/// serves the full file, so a client resuming against a changed file
/// never receives an inconsistent byte window.
pub fn negotiate(
    range: Option<&str>,
    if_range: Option<&str>,
    size: u64,
    validators: &Validators,
) -> Negotiated {
    let Some(range) = range else {
        return Negotiated::Full;
    };

    if let Some(if_range) = if_range {
        if !validators.if_range_matches(if_range) {
            return Negotiated::Full;
        }
    }

    match parse_range_header(range, size) {
        Some((start, end)) => Negotiated::Partial { start, end },
        None => Negotiated::Unsatisfiable,
    }
}

/// Parse an HTTP `Range` header against a file size.
///
/// Supports the three legal forms:
/// - `bytes=0-499` (clamped to the last byte)
/// - `bytes=500-` (open-ended)
/// - `bytes=-500` (last 500 bytes)
///
/// Returns `None` when the header is malformed or unsatisfiable.
pub fn parse_range_header(header: &str, size: u64) -> Option<(u64, u64)> {
    let spec = header.strip_prefix("bytes=")?;
    if size == 0 {
        return None;
    }

    let (start, end) = spec.split_once('-')?;
    let start = start.trim();
    let end = end.trim();

    match (start.is_empty(), end.is_empty()) {
        // bytes=-500 (last 500 bytes)
        (true, false) => {
            let suffix_len: u64 = end.parse().ok()?;
            if suffix_len == 0 {
                return None;
            }
            Some((size.saturating_sub(suffix_len), size - 1))
        }
        // bytes=500- (from 500 to end)
        (false, true) => {
            let start: u64 = start.parse().ok()?;
            if start >= size {
                return None;
            }
            Some((start, size - 1))
        }
        // bytes=0-499
        (false, false) => {
            let start: u64 = start.parse().ok()?;
            let end: u64 = end.parse().ok()?;
            if start >= size {
                return None;
            }
            let end = end.min(size - 1);
            if start > end {
                return None;
            }
            Some((start, end))
        }
        // bytes=- (invalid)
        (true, true) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};

    fn validators() -> Validators {
        Validators::from_metadata(1000, UNIX_EPOCH + Duration::from_secs(1_445_412_480))
    }

    #[test]
    fn test_parse_range_header_full_range() {
        assert_eq!(parse_range_header("bytes=0-499", 1000), Some((0, 499)));
    }

    #[test]
    fn test_parse_range_header_open_end() {
        assert_eq!(parse_range_header("bytes=500-", 1000), Some((500, 999)));
    }

    #[test]
    fn test_parse_range_header_suffix() {
        assert_eq!(parse_range_header("bytes=-200", 1000), Some((800, 999)));
    }

    #[test]
    fn test_parse_range_header_suffix_longer_than_file() {
        assert_eq!(parse_range_header("bytes=-5000", 1000), Some((0, 999)));
    }

    #[test]
    fn test_parse_range_header_clamped() {
        assert_eq!(parse_range_header("bytes=0-2000", 1000), Some((0, 999)));
    }

    #[test]
    fn test_parse_range_header_invalid_start() {
        assert_eq!(parse_range_header("bytes=1000-", 1000), None);
        assert_eq!(parse_range_header("bytes=1500-1600", 1000), None);
    }

    #[test]
    fn test_parse_range_header_invalid_format() {
        assert_eq!(parse_range_header("bytes=-", 1000), None);
        assert_eq!(parse_range_header("bytes=-0", 1000), None);
        assert_eq!(parse_range_header("bytes=abc-def", 1000), None);
        assert_eq!(parse_range_header("octets=0-100", 1000), None);
    }

    #[test]
    fn test_parse_range_header_inverted() {
        assert_eq!(parse_range_header("bytes=500-100", 1000), None);
    }

    #[test]
    fn test_parse_range_header_empty_file() {
        assert_eq!(parse_range_header("bytes=0-", 0), None);
    }

    #[test]
    fn test_seek_scenario() {
        // intro.mp4, 10,000,000 bytes: the last ten bytes.
        assert_eq!(
            parse_range_header("bytes=9999990-", 10_000_000),
            Some((9_999_990, 9_999_999))
        );
    }

    #[test]
    fn negotiate_without_range_is_full() {
        assert_eq!(negotiate(None, None, 1000, &validators()), Negotiated::Full);
    }

    #[test]
    fn negotiate_satisfiable_range() {
        assert_eq!(
            negotiate(Some("bytes=0-"), None, 1000, &validators()),
            Negotiated::Partial { start: 0, end: 999 }
        );
    }

    #[test]
    fn negotiate_unsatisfiable_range() {
        assert_eq!(
            negotiate(Some("bytes=1000-"), None, 1000, &validators()),
            Negotiated::Unsatisfiable
        );
        assert_eq!(
            negotiate(Some("garbage"), None, 1000, &validators()),
            Negotiated::Unsatisfiable
        );
    }

    #[test]
    fn negotiate_stale_if_range_serves_full() {
        let v = validators();
        assert_eq!(
            negotiate(Some("bytes=0-499"), Some("\"stale\""), 1000, &v),
            Negotiated::Full
        );
        // Even an unsatisfiable range is ignored when the validator is stale.
        assert_eq!(
            negotiate(Some("bytes=5000-"), Some("\"stale\""), 1000, &v),
            Negotiated::Full
        );
    }

    #[test]
    fn negotiate_fresh_if_range_honors_range() {
        let v = validators();
        let etag = v.etag.clone();
        assert_eq!(
            negotiate(Some("bytes=0-499"), Some(etag.as_str()), 1000, &v),
            Negotiated::Partial { start: 0, end: 499 }
        );
    }
}
