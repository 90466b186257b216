//! Release asset name parsing.
//!
//! aria2 release assets are named like `aria2-1.37.0-win-64bit-build1.zip` or
//! `aria2-1.35.0-linux-gnu-64bit-build1.tar.bz2`. The name carries the version,
//! the platform token and, for most platforms, an architecture token.

use std::sync::LazyLock;

use regex::Regex;

use crate::platform::{Arch, Platform};

/// Version, then a separator, then a platform token, then an optional arch token.
///
/// The match is not anchored: the version is the first dotted number group
/// that is directly followed by a platform token.
#[allow(clippy::expect_used)]
static ASSET_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"((?:\d+\.)?(?:\d+\.)?(?:\*|\d+))-.?(android|osx-darwin|win|linux-gnu)(?:-(arm|64bit|32bit))?",
    )
    .expect("asset name pattern is valid")
});

/// Information derived from a release asset name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssetInfo {
    /// Version string as it appears in the name (e.g. `1.37.0`).
    pub version: String,
    /// Platform the asset was built for.
    pub platform: Platform,
    /// Architecture the asset was built for.
    ///
    /// `None` when the name carries no architecture token; such an asset can
    /// never be selected. Darwin builds are always `x64`.
    pub arch: Option<Arch>,
}

impl AssetInfo {
    /// Whether this asset was built for the given platform and arch.
    #[must_use]
    pub fn is_for(&self, platform: Platform, arch: Arch) -> bool {
        self.platform == platform && self.arch == Some(arch)
    }
}

/// Parse a release asset name.
///
/// Returns `None` for names that do not follow the naming scheme, such as
/// checksum files or source tarballs. That is an expected outcome, not an
/// error.
#[must_use]
pub fn match_asset(name: &str) -> Option<AssetInfo> {
    let caps = ASSET_NAME.captures(name)?;

    let version = caps.get(1)?.as_str().to_string();
    let platform = platform_for_token(caps.get(2)?.as_str())?;
    let arch = if platform == Platform::Darwin {
        // Mac builds are published for a single architecture
        Some(Arch::X64)
    } else {
        caps.get(3).and_then(|m| arch_for_token(m.as_str()))
    };

    Some(AssetInfo {
        version,
        platform,
        arch,
    })
}

fn platform_for_token(token: &str) -> Option<Platform> {
    match token {
        "win" => Some(Platform::Win32),
        "linux-gnu" => Some(Platform::Linux),
        "osx-darwin" => Some(Platform::Darwin),
        "android" => Some(Platform::Android),
        _ => None,
    }
}

fn arch_for_token(token: &str) -> Option<Arch> {
    match token {
        "32bit" => Some(Arch::X32),
        "64bit" => Some(Arch::X64),
        "arm" => Some(Arch::Arm),
        _ => None,
    }
}
