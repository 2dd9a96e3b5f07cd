//! Download of the raw dataset and its persistence to the local CSV file.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::error::{EtlError, Result};

/// Issues a single GET for `url` and returns the body.
///
/// Transport failures and non-2xx responses both surface as
/// [`EtlError::Network`].
#[tracing::instrument(skip_all, fields(url = %url))]
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> Result<Vec<u8>> {
    let parsed = reqwest::Url::parse(url).map_err(|e| EtlError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let req = reqwest::Request::new(reqwest::Method::GET, parsed);

    let resp = client.execute(req).await?.error_for_status()?;
    debug!(status = %resp.status(), "Response received");

    let bytes = resp.bytes().await?.to_vec();
    info!(bytes = bytes.len(), "Dataset downloaded");
    Ok(bytes)
}

/// Writes `payload` verbatim to `path`, truncating any previous content.
#[tracing::instrument(skip_all, fields(path = %path.as_ref().display(), bytes = payload.len()))]
pub fn persist(payload: &[u8], path: impl AsRef<Path>) -> Result<PathBuf> {
    let path = path.as_ref();
    let io_err = |source| EtlError::Io {
        path: path.display().to_string(),
        source,
    };

    let mut file = File::create(path).map_err(io_err)?;
    file.write_all(payload).map_err(io_err)?;
    file.flush().map_err(io_err)?;

    debug!("Payload written");
    Ok(path.to_path_buf())
}
