//! GET/HEAD handler for media assets with range and conditional support.

use axum::{
    body::Body,
    extract::{Path, State},
    http::{header, HeaderMap, Method, StatusCode},
    response::{IntoResponse, Response},
};
use std::io::SeekFrom;
use tokio::fs::File;
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

use crate::error::MediaError;
use crate::media::range::{negotiate, Negotiated};
use crate::media::validators::Validators;
use crate::media::{content_type, resolve, MediaAsset};
use crate::server::AppContext;

/// Serve a media asset with range request and conditional-GET support.
///
/// Emits 200/206/304/416 for resolvable assets and 400/403/404 from the
/// resolver; HEAD requests get the headers of the equivalent GET with no
/// body and no file opened beyond the stat.
pub async fn serve_media(
    State(ctx): State<AppContext>,
    Path(identifier): Path<String>,
    method: Method,
    headers: HeaderMap,
) -> Response {
    let asset = match resolve(&ctx.storage_root, &identifier) {
        Ok(asset) => asset,
        Err(err) => return error_response(&identifier, &err),
    };

    let validators = Validators::from_metadata(asset.size, asset.modified);

    let range_header = header_str(&headers, header::RANGE);
    let if_range = header_str(&headers, header::IF_RANGE);
    let if_none_match = header_str(&headers, header::IF_NONE_MATCH);

    // Conditional-GET shortcut. A Range header present alongside
    // If-None-Match wins over the 304 path.
    if range_header.is_none() {
        if let Some(tags) = if_none_match {
            if validators.if_none_match_contains(tags) {
                return not_modified(&ctx, &validators);
            }
        }
    }

    tracing::debug!(
        identifier = %asset.identifier,
        kind = asset.kind.as_str(),
        size = asset.size,
        "Serving media asset"
    );

    let negotiated = negotiate(range_header, if_range, asset.size, &validators);
    let is_head = method == Method::HEAD;

    match negotiated {
        Negotiated::Unsatisfiable => common_headers(&ctx, &asset, &validators)
            .status(StatusCode::RANGE_NOT_SATISFIABLE)
            .header(
                header::CONTENT_RANGE,
                format!("bytes */{}", asset.size),
            )
            .body(Body::empty())
            .unwrap_or_else(|_| internal_error()),
        Negotiated::Partial { start, end } => {
            let length = end - start + 1;
            let builder = common_headers(&ctx, &asset, &validators)
                .status(StatusCode::PARTIAL_CONTENT)
                .header(
                    header::CONTENT_RANGE,
                    format!("bytes {}-{}/{}", start, end, asset.size),
                )
                .header(header::CONTENT_LENGTH, length.to_string());

            if is_head {
                return builder
                    .body(Body::empty())
                    .unwrap_or_else(|_| internal_error());
            }

            let body = match open_window(&asset, start, length).await {
                Ok(body) => body,
                Err(err) => return error_response(&asset.identifier, &err),
            };
            builder.body(body).unwrap_or_else(|_| internal_error())
        }
        Negotiated::Full => {
            let builder = common_headers(&ctx, &asset, &validators)
                .status(StatusCode::OK)
                .header(header::CONTENT_LENGTH, asset.size.to_string());

            if is_head {
                return builder
                    .body(Body::empty())
                    .unwrap_or_else(|_| internal_error());
            }

            let file = match File::open(&asset.path).await {
                Ok(file) => file,
                Err(err) => {
                    return error_response(&asset.identifier, &MediaError::from(err))
                }
            };
            builder
                .body(Body::from_stream(ReaderStream::new(file)))
                .unwrap_or_else(|_| internal_error())
        }
    }
}

/// Open the file and bound the read to `[start, start + length)`.
///
/// The body streams in chunks; dropping it (client disconnect) closes
/// the file handle.
async fn open_window(asset: &MediaAsset, start: u64, length: u64) -> crate::error::Result<Body> {
    let mut file = File::open(&asset.path).await?;
    file.seek(SeekFrom::Start(start)).await?;
    let stream = ReaderStream::new(file.take(length));
    Ok(Body::from_stream(stream))
}

/// Headers shared by 200, 206, and 416 responses.
fn common_headers(
    ctx: &AppContext,
    asset: &MediaAsset,
    validators: &Validators,
) -> axum::http::response::Builder {
    Response::builder()
        .header(header::CONTENT_TYPE, content_type(&asset.path))
        .header(header::ACCEPT_RANGES, "bytes")
        .header(
            header::CACHE_CONTROL,
            ctx.config.storage.cache_control.as_str(),
        )
        .header(header::CONTENT_DISPOSITION, "inline")
        .header(header::ETAG, validators.etag.as_str())
        .header(header::LAST_MODIFIED, validators.last_modified.as_str())
        .header("Cross-Origin-Resource-Policy", "cross-origin")
}

/// 304 with the caching headers repeated so clients still learn
/// cacheability from the empty response.
fn not_modified(ctx: &AppContext, validators: &Validators) -> Response {
    Response::builder()
        .status(StatusCode::NOT_MODIFIED)
        .header(header::ETAG, validators.etag.as_str())
        .header(header::LAST_MODIFIED, validators.last_modified.as_str())
        .header(
            header::CACHE_CONTROL,
            ctx.config.storage.cache_control.as_str(),
        )
        .header(header::ACCEPT_RANGES, "bytes")
        .body(Body::empty())
        .unwrap_or_else(|_| internal_error())
}

fn error_response(identifier: &str, err: &MediaError) -> Response {
    let status = err.status();
    match err {
        MediaError::Forbidden => {
            tracing::warn!(identifier, "Rejected traversal attempt");
        }
        MediaError::Io(io) => {
            tracing::error!(identifier, error = %io, "Media streaming error");
        }
        _ => {
            tracing::debug!(identifier, error = %err, "Media request rejected");
        }
    }
    let message = match status {
        StatusCode::BAD_REQUEST => "Bad request",
        StatusCode::FORBIDDEN => "Forbidden",
        StatusCode::NOT_FOUND => "Not found",
        _ => "Server error",
    };
    (status, axum::Json(serde_json::json!({ "error": message }))).into_response()
}

fn internal_error() -> Response {
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

fn header_str<'a>(headers: &'a HeaderMap, name: header::HeaderName) -> Option<&'a str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}
