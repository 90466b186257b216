//! Error types for resolving and extracting the aria2c binary.

use miette::Diagnostic;
use thiserror::Error;

/// Result type alias for get-aria2 operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while resolving, fetching or extracting the binary.
///
/// Every failure in the pipeline aborts it; callers see exactly one of these.
#[derive(Error, Debug, Diagnostic)]
pub enum Error {
    /// The requested platform is not one of the supported platforms.
    #[error("Unsupported platform \"{platform}\"")]
    #[diagnostic(
        code(get_aria2::config::unsupported_platform),
        help("Supported platforms are win32, darwin, linux and android")
    )]
    UnsupportedPlatform {
        /// The platform that was requested
        platform: String,
    },

    /// The requested architecture is not built for the requested platform.
    #[error("Architecture \"{arch}\" is not supported on \"{platform}\"")]
    #[diagnostic(code(get_aria2::config::unsupported_arch), help("{supported}"))]
    UnsupportedArch {
        /// The architecture that was requested
        arch: String,
        /// The platform it was requested for
        platform: String,
        /// Human readable list of what the platform does support
        supported: String,
    },

    /// No release asset matched the requested target.
    #[error("No matching aria2 asset found for {target} in {repository}")]
    #[diagnostic(
        code(get_aria2::resolve::no_matching_asset),
        help("Only the first page of releases is inspected; the repository may not publish this target")
    )]
    NoMatchingAsset {
        /// Repository whose releases were scanned
        repository: String,
        /// The platform/arch pair that was requested
        target: String,
    },

    /// The resolved asset is not an archive format we can read.
    #[error("The URL \"{url}\" was not formatted properly. Could not determine archive type")]
    #[diagnostic(
        code(get_aria2::format::unsupported_archive),
        help("Supported archives are .zip, .tar.gz, .tgz, .tar.bz2 and .tar")
    )]
    UnsupportedArchive {
        /// The asset URL
        url: String,
    },

    /// The HTTP request itself failed.
    #[error("HTTP request failed: {0}")]
    #[diagnostic(code(get_aria2::transport::http))]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status.
    #[error("Request to {url} failed with HTTP {status}")]
    #[diagnostic(code(get_aria2::transport::status))]
    HttpStatus {
        /// The requested URL
        url: String,
        /// The HTTP status code
        status: u16,
    },

    /// The release listing could not be decoded.
    #[error("Invalid release listing from {url}: {source}")]
    #[diagnostic(code(get_aria2::transport::invalid_listing))]
    InvalidListing {
        /// The listing URL
        url: String,
        /// The decoding error
        #[source]
        source: serde_json::Error,
    },

    /// Reading, decompressing or parsing the archive failed.
    #[error("Failed to read archive: {0}")]
    #[diagnostic(code(get_aria2::archive::read))]
    Archive(#[from] std::io::Error),

    /// The zip container is malformed or uses an unsupported feature, such
    /// as entries sized only by a trailing data descriptor.
    #[error("Failed to read zip archive: {0}")]
    #[diagnostic(code(get_aria2::archive::zip))]
    Zip(#[from] zip::result::ZipError),

    /// The whole archive was read without finding the binary.
    #[error("Binary \"aria2c\" not found in archive")]
    #[diagnostic(code(get_aria2::archive::binary_not_found))]
    BinaryNotFound,

    /// The background extraction task stopped without reporting an outcome.
    #[error("Extraction task aborted: {message}")]
    #[diagnostic(code(get_aria2::archive::aborted))]
    ExtractionAborted {
        /// What happened to the task
        message: String,
    },
}

impl Error {
    /// Create an unsupported platform error.
    #[must_use]
    pub fn unsupported_platform(platform: impl Into<String>) -> Self {
        Self::UnsupportedPlatform {
            platform: platform.into(),
        }
    }

    /// Create an unsupported architecture error.
    #[must_use]
    pub fn unsupported_arch(
        arch: impl Into<String>,
        platform: impl Into<String>,
        supported: impl Into<String>,
    ) -> Self {
        Self::UnsupportedArch {
            arch: arch.into(),
            platform: platform.into(),
            supported: supported.into(),
        }
    }

    /// Create a "no matching asset" error.
    #[must_use]
    pub fn no_matching_asset(repository: impl Into<String>, target: impl Into<String>) -> Self {
        Self::NoMatchingAsset {
            repository: repository.into(),
            target: target.into(),
        }
    }

    /// Create an unsupported archive error.
    #[must_use]
    pub fn unsupported_archive(url: impl Into<String>) -> Self {
        Self::UnsupportedArchive { url: url.into() }
    }

    /// Create an extraction aborted error.
    #[must_use]
    pub fn extraction_aborted(message: impl Into<String>) -> Self {
        Self::ExtractionAborted {
            message: message.into(),
        }
    }

    /// Whether this error was raised before any network access.
    #[must_use]
    pub const fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedPlatform { .. } | Self::UnsupportedArch { .. }
        )
    }
}
