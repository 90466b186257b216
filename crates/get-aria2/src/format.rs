//! Archive format detection and the per-format decoding pipeline.
//!
//! Detection is purely lexical: the file name at the end of the asset URL
//! decides the format before a single byte is downloaded.

use std::fmt;
use std::io::Read;

use bzip2::read::MultiBzDecoder;
use flate2::read::GzDecoder;
use reqwest::Url;

use crate::{Error, Result};

/// Container formats aria2 releases are published in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveFormat {
    /// Uncompressed tarball.
    Tar,
    /// Gzip-compressed tarball (`.tar.gz`, `.tgz`).
    TarGz,
    /// Bzip2-compressed tarball.
    TarBz2,
    /// Zip archive; compression is per entry.
    Zip,
}

/// Recognised suffixes, longest first so `.tar.gz` wins over `.tar`.
const SUFFIXES: &[(&str, ArchiveFormat)] = &[
    (".tar.bz2", ArchiveFormat::TarBz2),
    (".tar.gz", ArchiveFormat::TarGz),
    (".tgz", ArchiveFormat::TarGz),
    (".zip", ArchiveFormat::Zip),
    (".tar", ArchiveFormat::Tar),
];

impl ArchiveFormat {
    /// Canonical extension of the format.
    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Tar => ".tar",
            Self::TarGz => ".tar.gz",
            Self::TarBz2 => ".tar.bz2",
            Self::Zip => ".zip",
        }
    }

    /// The decoding pipeline for this format.
    pub(crate) const fn pipeline(self) -> Pipeline {
        match self {
            Self::Tar => TAR,
            Self::TarGz => TAR_GZ,
            Self::TarBz2 => TAR_BZ2,
            Self::Zip => ZIP,
        }
    }
}

const TAR: Pipeline = Pipeline {
    stages: &[],
    container: Container::Tar,
};

const TAR_GZ: Pipeline = Pipeline {
    stages: &[gunzip],
    container: Container::Tar,
};

const TAR_BZ2: Pipeline = Pipeline {
    stages: &[bunzip2],
    container: Container::Tar,
};

const ZIP: Pipeline = Pipeline {
    stages: &[],
    container: Container::Zip,
};

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension().trim_start_matches('.'))
    }
}

/// Classify an asset URL (or bare file name) by its extension.
pub fn classify(url: &str) -> Result<ArchiveFormat> {
    let name = file_name(url).to_ascii_lowercase();
    SUFFIXES
        .iter()
        .find(|(suffix, _)| name.ends_with(suffix))
        .map(|(_, format)| *format)
        .ok_or_else(|| Error::unsupported_archive(url))
}

/// Last path segment of a URL, without query or fragment.
fn file_name(url: &str) -> String {
    if let Ok(parsed) = Url::parse(url)
        && let Some(last) = parsed.path_segments().and_then(|mut s| s.next_back())
    {
        return last.to_string();
    }

    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.rsplit('/').next().unwrap_or(path).to_string()
}

/// A boxed blocking byte source.
pub(crate) type Source = Box<dyn Read + Send>;

/// A decompression stage wrapping the previous source.
pub(crate) type Stage = fn(Source) -> Source;

/// Container parser at the end of a pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Container {
    Tar,
    Zip,
}

/// Ordered decompression stages followed by a container parser.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Pipeline {
    pub(crate) stages: &'static [Stage],
    pub(crate) container: Container,
}

impl Pipeline {
    /// Wrap a raw archive source in every decompression stage, in order.
    pub(crate) fn decode(&self, source: Source) -> Source {
        self.stages.iter().fold(source, |inner, stage| stage(inner))
    }
}

fn gunzip(source: Source) -> Source {
    Box::new(GzDecoder::new(source))
}

fn bunzip2(source: Source) -> Source {
    Box::new(MultiBzDecoder::new(source))
}
