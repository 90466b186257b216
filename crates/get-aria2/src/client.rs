//! HTTP side of the pipeline: listing releases and streaming asset bodies.

use std::io;
use std::pin::Pin;

use bytes::Bytes;
use futures::{Stream, TryStreamExt};
use reqwest::Client;
use reqwest::header::ACCEPT;
use tracing::{debug, info};

use crate::config::FetchConfig;
use crate::extract::{ExtractionResult, extract};
use crate::platform::Target;
use crate::resolver::{Release, ResolvedTarget, repository_for, select_asset};
use crate::{Error, Result};

/// An asset body as it arrives from the network.
pub type ArchiveStream = Pin<Box<dyn Stream<Item = io::Result<Bytes>> + Send>>;

/// Media type requested from the releases endpoint.
const GITHUB_JSON: &str = "application/vnd.github.v3+json";

/// Resolves, downloads and extracts aria2c.
///
/// Each call opens its own pipeline; nothing is cached or shared between
/// calls besides the connection pool.
#[derive(Debug, Clone)]
pub struct Aria2Fetcher {
    client: Client,
    config: FetchConfig,
}

impl Aria2Fetcher {
    /// Create a fetcher from an explicit configuration.
    pub fn new(config: FetchConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Create a fetcher configured from the process environment.
    pub fn from_env() -> Result<Self> {
        Self::new(FetchConfig::from_env())
    }

    /// The configuration this fetcher was built with.
    #[must_use]
    pub const fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetch the first page of releases of a repository.
    pub async fn list_releases(&self, repository: &str) -> Result<Vec<Release>> {
        let url = format!(
            "{}/repos/{}/releases",
            self.config.api_base_url.trim_end_matches('/'),
            repository
        );
        debug!(%url, "fetching release listing");

        let response = self.client.get(&url).header(ACCEPT, GITHUB_JSON).send().await?;
        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                url,
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|source| Error::InvalidListing { url, source })
    }

    /// Find the asset to download for a target and classify its format.
    pub async fn resolve(&self, target: Target) -> Result<ResolvedTarget> {
        let repository = repository_for(target.platform());
        let releases = self.list_releases(repository).await?;
        debug!(
            repository,
            releases = releases.len(),
            "scanning releases for {target}"
        );

        let asset = select_asset(&releases, target)
            .ok_or_else(|| Error::no_matching_asset(repository, target.to_string()))?;
        debug!(
            url = %asset.url,
            version = %asset.version,
            release = %asset.tag,
            "selected asset"
        );

        let resolved = ResolvedTarget::from_asset(asset)?;
        info!(
            version = %resolved.version,
            format = %resolved.format,
            "resolved aria2 for {target}"
        );
        Ok(resolved)
    }

    /// Start downloading an asset and expose its body as a byte stream.
    ///
    /// Transport failures mid-body surface as I/O errors in the stream.
    pub async fn fetch_archive(&self, url: &str) -> Result<ArchiveStream> {
        debug!(%url, "downloading asset");

        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(Error::HttpStatus {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        Ok(Box::pin(response.bytes_stream().map_err(io::Error::other)))
    }

    /// Resolve, download and extract aria2c.
    ///
    /// Missing platform or arch default to the running system. Both are
    /// validated before any request is made.
    pub async fn get_binary(
        &self,
        platform: Option<&str>,
        arch: Option<&str>,
    ) -> Result<ExtractionResult> {
        let target = Target::from_options(platform, arch)?;
        self.get_binary_for(target).await
    }

    /// Resolve, download and extract aria2c for a validated target.
    pub async fn get_binary_for(&self, target: Target) -> Result<ExtractionResult> {
        let resolved = self.resolve(target).await?;
        let archive = self.fetch_archive(&resolved.url).await?;
        extract(archive, resolved.format, resolved.version).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_keeps_config() {
        let config = FetchConfig::new().with_api_base_url("http://127.0.0.1:1");
        let fetcher = Aria2Fetcher::new(config.clone()).unwrap();
        assert_eq!(fetcher.config(), &config);
    }

    #[tokio::test]
    async fn test_invalid_target_fails_before_network() {
        // Nothing listens on port 1; reaching the network would be a transport error
        let fetcher =
            Aria2Fetcher::new(FetchConfig::new().with_api_base_url("http://127.0.0.1:1")).unwrap();

        let err = fetcher
            .get_binary(Some("win32"), Some("arm"))
            .await
            .unwrap_err();
        assert!(err.is_configuration());

        let err = fetcher
            .get_binary(Some("plan9"), Some("x64"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::UnsupportedPlatform { .. }));
    }
}
