//! Release resolution: picking the asset to download for a target.
//!
//! Releases are scanned in listing order (newest first) and assets within a
//! release in listing order; the first asset built for the target wins. This
//! approximates "latest compatible release" without comparing versions.

use serde::Deserialize;

use crate::asset::match_asset;
use crate::format::{ArchiveFormat, classify};
use crate::platform::{Platform, Target};
use crate::Result;

/// Upstream aria2 repository.
pub const UPSTREAM_REPOSITORY: &str = "aria2/aria2";

/// Community static builds, used for Linux where upstream ships no binaries.
pub const LINUX_STATIC_REPOSITORY: &str = "q3aql/aria2-static-builds";

/// Marker of macOS disk images, which are never selected.
const DISK_IMAGE_MARKER: &str = ".dmg";

/// A release from the GitHub listing.
#[derive(Debug, Clone, Deserialize)]
pub struct Release {
    /// Tag the release was published under.
    #[serde(default)]
    pub tag_name: String,
    /// Files attached to the release.
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

/// A downloadable file attached to a release.
#[derive(Debug, Clone, Deserialize)]
pub struct ReleaseAsset {
    /// Display name, parsed by [`match_asset`].
    pub name: String,
    /// Direct download URL.
    pub browser_download_url: String,
}

/// The asset chosen for a target, before its archive format is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAsset {
    /// Download URL.
    pub url: String,
    /// Version parsed from the asset name.
    pub version: String,
    /// Tag of the release the asset belongs to.
    pub tag: String,
}

/// The asset chosen for a target together with its archive format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    /// Download URL.
    pub url: String,
    /// Version parsed from the asset name.
    pub version: String,
    /// Archive format, from the URL's extension.
    pub format: ArchiveFormat,
}

impl ResolvedTarget {
    /// Classify a selected asset. Fails before any download when the
    /// extension is not a supported archive.
    pub fn from_asset(asset: ResolvedAsset) -> Result<Self> {
        let format = classify(&asset.url)?;
        Ok(Self {
            url: asset.url,
            version: asset.version,
            format,
        })
    }
}

/// Repository that publishes builds for a platform.
#[must_use]
pub const fn repository_for(platform: Platform) -> &'static str {
    match platform {
        Platform::Linux => LINUX_STATIC_REPOSITORY,
        Platform::Win32 | Platform::Darwin | Platform::Android => UPSTREAM_REPOSITORY,
    }
}

/// Pick the first asset built for `target`, across all releases.
///
/// Disk images are skipped even when their name matches.
#[must_use]
pub fn select_asset(releases: &[Release], target: Target) -> Option<ResolvedAsset> {
    releases.iter().find_map(|release| {
        release
            .assets
            .iter()
            .filter(|asset| !asset.browser_download_url.contains(DISK_IMAGE_MARKER))
            .find_map(|asset| {
                let info = match_asset(&asset.name)?;
                info.is_for(target.platform(), target.arch())
                    .then(|| ResolvedAsset {
                        url: asset.browser_download_url.clone(),
                        version: info.version,
                        tag: release.tag_name.clone(),
                    })
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::platform::Arch;

    fn asset(name: &str) -> ReleaseAsset {
        ReleaseAsset {
            name: name.to_string(),
            browser_download_url: format!("https://github.com/dl/{name}"),
        }
    }

    fn release(tag: &str, names: &[&str]) -> Release {
        Release {
            tag_name: tag.to_string(),
            assets: names.iter().map(|n| asset(n)).collect(),
        }
    }

    fn target(platform: Platform, arch: Arch) -> Target {
        Target::new(platform, arch).unwrap()
    }

    #[test]
    fn test_repository_for() {
        assert_eq!(repository_for(Platform::Linux), "q3aql/aria2-static-builds");
        assert_eq!(repository_for(Platform::Win32), "aria2/aria2");
        assert_eq!(repository_for(Platform::Darwin), "aria2/aria2");
        assert_eq!(repository_for(Platform::Android), "aria2/aria2");
    }

    #[test]
    fn test_select_linux_x64_among_all_targets() {
        let releases = vec![release(
            "v1.35.0",
            &[
                "aria2-1.35.0-linux-gnu-32bit-build1.tar.bz2",
                "aria2-1.35.0-linux-gnu-64bit-build1.tar.bz2",
                "aria2-1.35.0-linux-gnu-arm-rbpi-build1.tar.bz2",
                "SHA256SUMS",
            ],
        )];

        let selected = select_asset(&releases, target(Platform::Linux, Arch::X64)).unwrap();
        assert_eq!(
            selected.url,
            "https://github.com/dl/aria2-1.35.0-linux-gnu-64bit-build1.tar.bz2"
        );
        assert_eq!(selected.version, "1.35.0");
    }

    #[test]
    fn test_newest_release_wins() {
        let releases = vec![
            release("release-1.37.0", &["aria2-1.37.0-win-64bit-build1.zip"]),
            release("release-1.36.0", &["aria2-1.36.0-win-64bit-build1.zip"]),
        ];

        let selected = select_asset(&releases, target(Platform::Win32, Arch::X64)).unwrap();
        assert_eq!(selected.version, "1.37.0");
        assert_eq!(selected.tag, "release-1.37.0");
    }

    #[test]
    fn test_falls_back_to_older_release() {
        let releases = vec![
            release("release-1.37.0", &["aria2-1.37.0.tar.xz"]),
            release(
                "release-1.34.0",
                &["aria2-1.34.0-android-arm-build1.zip"],
            ),
        ];

        let selected = select_asset(&releases, target(Platform::Android, Arch::Arm)).unwrap();
        assert_eq!(selected.version, "1.34.0");
        assert_eq!(selected.tag, "release-1.34.0");
    }

    #[test]
    fn test_disk_images_skipped() {
        let releases = vec![release(
            "release-1.35.0",
            &[
                "aria2-1.35.0-osx-darwin.dmg",
                "aria2-1.35.0-osx-darwin.tar.bz2",
            ],
        )];

        let selected = select_asset(&releases, target(Platform::Darwin, Arch::X64)).unwrap();
        assert!(selected.url.ends_with("aria2-1.35.0-osx-darwin.tar.bz2"));
    }

    #[test]
    fn test_only_disk_image_yields_nothing() {
        let releases = vec![release("release-1.35.0", &["aria2-1.35.0-osx-darwin.dmg"])];
        assert!(select_asset(&releases, target(Platform::Darwin, Arch::X64)).is_none());
    }

    #[test]
    fn test_no_match() {
        let releases = vec![release(
            "release-1.37.0",
            &["aria2-1.37.0-win-32bit-build1.zip", "aria2-1.37.0.tar.gz"],
        )];
        assert!(select_asset(&releases, target(Platform::Win32, Arch::X64)).is_none());
        assert!(select_asset(&[], target(Platform::Win32, Arch::X64)).is_none());
    }

    #[test]
    fn test_listing_deserializes_extra_fields() {
        let json = r#"[
            {
                "tag_name": "release-1.37.0",
                "name": "aria2 1.37.0",
                "draft": false,
                "assets": [
                    {
                        "name": "aria2-1.37.0-win-64bit-build1.zip",
                        "size": 4523811,
                        "browser_download_url": "https://github.com/aria2/aria2/releases/download/release-1.37.0/aria2-1.37.0-win-64bit-build1.zip"
                    }
                ]
            },
            { "tag_name": "empty" }
        ]"#;

        let releases: Vec<Release> = serde_json::from_str(json).unwrap();
        assert_eq!(releases.len(), 2);
        assert_eq!(releases[0].assets.len(), 1);
        assert!(releases[1].assets.is_empty());
    }

    #[test]
    fn test_resolved_target_classifies() {
        let resolved = ResolvedTarget::from_asset(ResolvedAsset {
            url: "https://github.com/dl/aria2-1.37.0-win-64bit-build1.zip".to_string(),
            version: "1.37.0".to_string(),
            tag: "release-1.37.0".to_string(),
        })
        .unwrap();
        assert_eq!(resolved.format, ArchiveFormat::Zip);

        let err = ResolvedTarget::from_asset(ResolvedAsset {
            url: "https://github.com/dl/aria2-1.37.0-win-64bit-build1.7z".to_string(),
            version: "1.37.0".to_string(),
            tag: "release-1.37.0".to_string(),
        })
        .unwrap_err();
        assert!(matches!(err, crate::Error::UnsupportedArchive { .. }));
    }
}
