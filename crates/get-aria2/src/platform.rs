//! Target platform identification and the platform/arch support policy.
//!
//! Platform and architecture names follow the Node.js conventions used by the
//! aria2 release assets (`win32`, `darwin`, `x32`, `x64`, ...), not Rust's
//! `std::env::consts` names.

use std::fmt;
use std::str::FromStr;

use crate::{Error, Result};

/// Operating system an aria2c build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    /// Windows.
    Win32,
    /// macOS.
    Darwin,
    /// Linux (static builds).
    Linux,
    /// Android.
    Android,
}

/// CPU architecture an aria2c build targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arch {
    /// 32-bit x86.
    X32,
    /// 64-bit x86.
    X64,
    /// ARM.
    Arm,
}

/// Architectures published for each platform.
///
/// A (platform, arch) pair outside this table is rejected before any request
/// is made.
pub const POLICY: &[(Platform, &[Arch])] = &[
    (Platform::Win32, &[Arch::X32, Arch::X64]),
    (Platform::Linux, &[Arch::X32, Arch::X64, Arch::Arm]),
    (Platform::Android, &[Arch::Arm]),
    (Platform::Darwin, &[Arch::X64]),
];

impl Platform {
    /// All supported platforms.
    pub const ALL: [Self; 4] = [Self::Win32, Self::Darwin, Self::Linux, Self::Android];

    /// Canonical name of the platform.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Win32 => "win32",
            Self::Darwin => "darwin",
            Self::Linux => "linux",
            Self::Android => "android",
        }
    }

    /// Architectures this platform is published for.
    #[must_use]
    pub fn supported_archs(self) -> &'static [Arch] {
        for (platform, archs) in POLICY {
            if *platform == self {
                return archs;
            }
        }
        &[]
    }

    /// Whether the platform has a notion of an executable permission bit.
    #[must_use]
    pub const fn has_exec_bit(self) -> bool {
        !matches!(self, Self::Win32)
    }

    /// Platform of the running system.
    pub fn current() -> Result<Self> {
        match std::env::consts::OS {
            "windows" => Ok(Self::Win32),
            "macos" => Ok(Self::Darwin),
            "linux" => Ok(Self::Linux),
            "android" => Ok(Self::Android),
            other => Err(Error::unsupported_platform(other)),
        }
    }
}

impl Arch {
    /// Canonical name of the architecture.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X32 => "x32",
            Self::X64 => "x64",
            Self::Arm => "arm",
        }
    }

    /// Architecture of the running system.
    pub fn current() -> Result<Self> {
        match std::env::consts::ARCH {
            "x86_64" => Ok(Self::X64),
            "x86" => Ok(Self::X32),
            "arm" | "aarch64" => Ok(Self::Arm),
            other => Err(Error::unsupported_arch(
                other,
                std::env::consts::OS,
                "Supported architectures are x32, x64 and arm",
            )),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Arch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str() == s)
            .ok_or_else(|| Error::unsupported_platform(s))
    }
}

impl FromStr for Arch {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "x32" => Ok(Self::X32),
            "x64" => Ok(Self::X64),
            "arm" => Ok(Self::Arm),
            other => Err(Error::unsupported_arch(
                other,
                "any platform",
                "Supported architectures are x32, x64 and arm",
            )),
        }
    }
}

/// A validated (platform, arch) pair.
///
/// Can only be constructed for pairs listed in [`POLICY`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Target {
    platform: Platform,
    arch: Arch,
}

impl Target {
    /// Validate a platform/arch pair against the support policy.
    pub fn new(platform: Platform, arch: Arch) -> Result<Self> {
        if !platform.supported_archs().contains(&arch) {
            return Err(Error::unsupported_arch(
                arch.as_str(),
                platform.as_str(),
                supported_help(platform),
            ));
        }
        Ok(Self { platform, arch })
    }

    /// Parse and validate platform and arch names.
    ///
    /// The platform is checked first, so an unknown platform is reported as
    /// such even when the arch is unknown too.
    pub fn parse(platform: &str, arch: &str) -> Result<Self> {
        Self::from_options(Some(platform), Some(arch))
    }

    /// Resolve optional names, defaulting each missing one to the running system.
    pub fn from_options(platform: Option<&str>, arch: Option<&str>) -> Result<Self> {
        let platform = match platform {
            Some(name) => name.parse()?,
            None => Platform::current()?,
        };
        let arch = match arch {
            Some(name) => name.parse().map_err(|_| {
                Error::unsupported_arch(name, platform.as_str(), supported_help(platform))
            })?,
            None => Arch::current()?,
        };
        Self::new(platform, arch)
    }

    /// The target platform.
    #[must_use]
    pub const fn platform(self) -> Platform {
        self.platform
    }

    /// The target architecture.
    #[must_use]
    pub const fn arch(self) -> Arch {
        self.arch
    }
}

fn supported_help(platform: Platform) -> String {
    let names: Vec<&str> = platform
        .supported_archs()
        .iter()
        .map(|a| a.as_str())
        .collect();
    format!("\"{}\" supports: {}", platform, names.join(", "))
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.platform, self.arch)
    }
}
