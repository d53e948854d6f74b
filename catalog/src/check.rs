use std::{fmt, path::Path, time::Duration};

use futures::{stream, StreamExt};
use tracing::{debug, info, instrument, trace};

use crate::{AssetRef, Catalog, CatalogError, Method};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AssetKind {
    Audio,
    Spectrogram,
}

impl fmt::Display for AssetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Audio => "audio",
            Self::Spectrogram => "spectrogram",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UnresolvedAsset {
    pub example: String,
    pub method: Method,
    pub kind: AssetKind,
    pub reference: AssetRef,
    pub reason: String,
}

impl fmt::Display for UnresolvedAsset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} / {} {}: {} ({})",
            self.example, self.method, self.kind, self.reference, self.reason
        )
    }
}

/// Confirms that every media reference of a catalog can be fetched.
#[derive(Debug, Clone)]
pub struct AssetChecker {
    client: reqwest::Client,
    concurrency: usize,
}

impl AssetChecker {
    pub const DEFAULT_CONCURRENCY: usize = 16;

    pub fn new(concurrency: usize, timeout: Duration) -> Result<Self, CatalogError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            concurrency: concurrency.max(1),
        })
    }

    /// Returns the references that did not resolve, sorted by example,
    /// method and kind.
    #[instrument(skip(self, catalog), level = "debug")]
    pub async fn check(&self, catalog: &Catalog, site_root: &Path) -> Vec<UnresolvedAsset> {
        let targets: Vec<_> = catalog
            .examples
            .iter()
            .flat_map(|example| {
                example.entries.iter().flat_map(move |entry| {
                    [
                        (example.id.as_str(), entry.method, AssetKind::Audio, &entry.audio),
                        (example.id.as_str(), entry.method, AssetKind::Spectrogram, &entry.spectrogram),
                    ]
                })
            })
            .collect();
        info!(n_assets = targets.len(), "checking assets");

        let mut unresolved: Vec<UnresolvedAsset> = stream::iter(targets)
            .map(|(example, method, kind, reference)| async move {
                self.resolve(reference, site_root)
                    .await
                    .err()
                    .map(|reason| UnresolvedAsset {
                        example: example.to_string(),
                        method,
                        kind,
                        reference: reference.clone(),
                        reason,
                    })
            })
            .buffer_unordered(self.concurrency)
            .filter_map(|result| async move { result })
            .collect()
            .await;

        unresolved.sort();
        debug!(n_unresolved = unresolved.len(), "asset check finished");
        unresolved
    }

    async fn resolve(&self, reference: &AssetRef, site_root: &Path) -> Result<(), String> {
        if reference.is_remote() {
            let response = self
                .client
                .head(reference.as_str())
                .send()
                .await
                .map_err(|e| format!("request failed: {e}"))?;
            let status = response.status();
            trace!(%reference, %status, "remote asset");
            if status.is_success() {
                Ok(())
            } else {
                Err(format!("HTTP {status}"))
            }
        } else {
            let path = site_root.join(reference.local_path()?);
            match tokio::fs::metadata(&path).await {
                Ok(meta) if meta.is_file() => Ok(()),
                Ok(_) => Err("not a regular file".to_string()),
                Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                    Err("file not found".to_string())
                }
                Err(e) => Err(e.to_string()),
            }
        }
    }
}
