//! Download a remote source into the workspace.

use std::path::PathBuf;

use firesize_core::{Error, Result};
use tokio::io::AsyncWriteExt;

use crate::events::PipelineEvents;
use crate::workspace::Workspace;

/// Stream the body of `url` into the workspace's input file.
///
/// The local file is created before the request is sent, so it exists (and
/// may be empty or partial) whenever the request or the copy fails. The
/// response status is not checked; whatever body the server returns is
/// handed to the later steps.
pub async fn download(
    client: &reqwest::Client,
    workspace: &Workspace,
    url: &str,
    events: &dyn PipelineEvents,
) -> Result<PathBuf> {
    let local = workspace.input();
    events.fetch_started(url, &local);

    let mut file = tokio::fs::File::create(&local)
        .await
        .map_err(|e| Error::FetchFile {
            path: local.clone(),
            source: e,
        })?;

    let mut response = client
        .get(url)
        .send()
        .await
        .map_err(|e| Error::download(url, e))?;

    if !response.status().is_success() {
        tracing::warn!(
            url = %url,
            status = %response.status(),
            "source returned non-success status"
        );
    }

    let copy_err = |source: firesize_core::error::BoxError| Error::FetchCopy {
        url: url.to_string(),
        path: local.clone(),
        source,
    };

    while let Some(chunk) = response.chunk().await.map_err(|e| copy_err(e.into()))? {
        file.write_all(&chunk).await.map_err(|e| copy_err(e.into()))?;
    }
    file.flush().await.map_err(|e| copy_err(e.into()))?;

    Ok(local)
}
