//! Fetch the aria2c binary for a platform straight out of a GitHub release.
//!
//! The release listing is scanned for the newest asset built for the
//! requested platform and architecture, the asset is downloaded, and the
//! binary is extracted from the archive while it streams in. The archive is
//! never written to disk and the caller gets the binary's bytes as soon as
//! its entry is reached.
//!
//! ```no_run
//! # async fn run() -> get_aria2::Result<()> {
//! use futures::StreamExt;
//!
//! let result = get_aria2::get_binary(Some("linux"), Some("x64")).await?;
//! println!("aria2 {}", result.version);
//!
//! let mut stream = result.binary_stream;
//! while let Some(chunk) = stream.next().await {
//!     let _bytes = chunk?;
//! }
//! # Ok(())
//! # }
//! ```
//!
//! Proxy and token settings are never read implicitly below the top-level
//! [`get_binary`]; build an [`Aria2Fetcher`] from a [`FetchConfig`] to
//! control them.

pub mod asset;
mod client;
pub mod config;
mod error;
pub mod extract;
pub mod format;
pub mod platform;
pub mod resolver;

pub use asset::{AssetInfo, match_asset};
pub use client::{Aria2Fetcher, ArchiveStream};
pub use config::FetchConfig;
pub use error::{Error, Result};
pub use extract::{BinaryStream, DrainHandle, ExtractionResult, extract};
pub use format::{ArchiveFormat, classify};
pub use platform::{Arch, Platform, Target};
pub use resolver::{ResolvedTarget, repository_for, select_asset};

/// Resolve, download and extract aria2c using settings from the environment.
///
/// `platform` and `arch` default to the running system. They are validated
/// before the environment is read or any request is made.
pub async fn get_binary(platform: Option<&str>, arch: Option<&str>) -> Result<ExtractionResult> {
    let target = Target::from_options(platform, arch)?;
    Aria2Fetcher::from_env()?.get_binary_for(target).await
}
