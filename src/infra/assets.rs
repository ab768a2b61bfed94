//! Embedded UI asset serving.
//!
//! The browser UI is compiled into the binary; any GET path that is not an
//! API route resolves against the bundle, with the bare root mapping to
//! `index.html`.

use axum::{
    body::Body,
    http::{HeaderValue, StatusCode, Uri, header},
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use include_dir::{Dir, include_dir};
use mime_guess::Mime;

use crate::infra::http::ErrorReport;

static UI_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

const INDEX_FILE: &str = "index.html";

/// Serve an embedded UI asset for any non-API GET path.
pub async fn serve_ui(uri: Uri) -> Response {
    match resolve_asset(uri.path()) {
        Some((contents, mime)) => build_response(Bytes::from_static(contents), mime),
        None => not_found_response(),
    }
}

fn resolve_asset(path: &str) -> Option<(&'static [u8], Mime)> {
    let mut candidate = path.trim_start_matches('/');
    if candidate.is_empty() {
        candidate = INDEX_FILE;
    }

    if candidate.ends_with('/') || candidate.contains("..") {
        // Disallow directory listings and traversal.
        return None;
    }

    let file = UI_ASSETS.get_file(candidate)?;
    let mime = mime_guess::from_path(candidate).first_or_octet_stream();
    Some((file.contents(), mime))
}

fn build_response(bytes: Bytes, mime: Mime) -> Response {
    let len = bytes.len();
    let mut response = Response::new(Body::from(bytes));
    *response.status_mut() = StatusCode::OK;

    let headers = response.headers_mut();
    if let Ok(value) = HeaderValue::from_str(mime.as_ref()) {
        headers.insert(header::CONTENT_TYPE, value);
    }
    if let Ok(value) = HeaderValue::from_str(&len.to_string()) {
        headers.insert(header::CONTENT_LENGTH, value);
    }

    response
}

fn not_found_response() -> Response {
    let mut response = StatusCode::NOT_FOUND.into_response();
    ErrorReport::from_message(
        "infra::assets::serve_ui",
        StatusCode::NOT_FOUND,
        "Static asset not found",
    )
    .attach(&mut response);
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_resolves_to_index() {
        let (contents, mime) = resolve_asset("/").expect("bundled index");
        assert!(!contents.is_empty());
        assert_eq!(mime.essence_str(), "text/html");
    }

    #[test]
    fn traversal_paths_are_rejected() {
        assert!(resolve_asset("/../Cargo.toml").is_none());
        assert!(resolve_asset("/static/").is_none());
    }

    #[test]
    fn unknown_asset_is_absent() {
        assert!(resolve_asset("/definitely-not-here.js").is_none());
    }
}
