//! Image processing route.

use std::convert::Infallible;

use axum::extract::{Request, State};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use tower::ServiceExt;
use tower_http::services::ServeFile;

use super::error::AppError;
use super::AppContext;
use crate::args::ProcessArgs;

/// GET /<options...>/<source-url>
///
/// Fetches the source, transforms it and serves the result as a file, with
/// the content type taken from the output extension.
pub async fn process_image(
    State(ctx): State<AppContext>,
    request: Request,
) -> Result<Response, AppError> {
    if !matches!(*request.method(), Method::GET | Method::HEAD) {
        return Ok(StatusCode::METHOD_NOT_ALLOWED.into_response());
    }

    let mut args = ProcessArgs::from_request_path(request.uri().path(), request.uri().query())?;
    let processed = ctx.pipeline.process(&mut args).await?;

    let response = ServeFile::new(processed.output())
        .oneshot(request)
        .await
        .unwrap_or_else(|never: Infallible| match never {});

    // The file handle is already open, so the workspace may go now.
    processed.finish();

    Ok(response.into_response())
}

/// GET /health
pub async fn health_check() -> impl IntoResponse {
    "ok"
}
