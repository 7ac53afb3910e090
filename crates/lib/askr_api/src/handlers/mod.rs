//! Request handlers for the fixed Yggdrasil URL surface.

pub mod auth;
pub mod meta;
pub mod profile;
pub mod session;

use axum::extract::FromRequest;
use axum::http::header;
use axum::response::{IntoResponse, Response};

use crate::error::ApiError;

/// `axum::Json` with rejections rendered in the Yggdrasil error wire
/// format (`IllegalArgumentException`) instead of axum's default.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ValidJson<T>(pub T);

/// Serve pre-serialized JSON bytes (cache hits and cache fills share
/// this path so the emitted bytes are identical).
pub(crate) fn json_bytes(bytes: Vec<u8>) -> Response {
    ([(header::CONTENT_TYPE, "application/json")], bytes).into_response()
}
