//! Writing the downloaded binary to its destination.

use std::io;
use std::path::{Path, PathBuf};

use get_aria2::{BinaryStream, Platform};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::debug;

/// Mode given to the binary by `--chmod`.
pub const EXECUTABLE_MODE: u32 = 0o755;

/// Errors while writing the binary out.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
pub enum InstallError {
    /// The destination could not be created or written.
    #[error("Failed to write {path}: {source}")]
    #[diagnostic(code(get_aria2_cli::install::write))]
    Write {
        /// The destination path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: io::Error,
    },

    /// The binary stream failed while it was being copied.
    #[error("Download interrupted: {0}")]
    #[diagnostic(code(get_aria2_cli::install::stream))]
    Stream(#[source] io::Error),

    /// Permissions could not be changed.
    #[error("Failed to mark {path} executable: {source}")]
    #[diagnostic(code(get_aria2_cli::install::chmod))]
    Chmod {
        /// The destination path
        path: PathBuf,
        /// The underlying error
        #[source]
        source: io::Error,
    },
}

/// Final path of the binary: `.exe` is appended for Windows when requested.
#[must_use]
pub fn output_path(destination: &Path, platform: Platform, ext: bool) -> PathBuf {
    if ext && platform == Platform::Win32 {
        let mut name = destination.as_os_str().to_owned();
        name.push(".exe");
        PathBuf::from(name)
    } else {
        destination.to_path_buf()
    }
}

/// Whether `--chmod` applies to a binary built for `platform`.
#[must_use]
pub const fn should_chmod(chmod: bool, platform: Platform) -> bool {
    chmod && platform.has_exec_bit()
}

/// Copy the binary stream into a writer, returning the bytes written.
pub async fn copy_binary<W>(stream: BinaryStream, writer: &mut W) -> io::Result<u64>
where
    W: AsyncWrite + Unpin,
{
    let mut reader = stream.into_async_read();
    let written = tokio::io::copy(&mut reader, writer).await?;
    writer.flush().await?;
    Ok(written)
}

/// Write the binary stream to a file, creating parent directories.
pub async fn write_to_file(stream: BinaryStream, path: &Path) -> Result<u64, InstallError> {
    let write_err = |source| InstallError::Write {
        path: path.to_path_buf(),
        source,
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await.map_err(write_err)?;
    }
    let mut file = tokio::fs::File::create(path).await.map_err(write_err)?;

    let written = copy_binary(stream, &mut file)
        .await
        .map_err(InstallError::Stream)?;
    file.sync_all().await.map_err(write_err)?;

    debug!(path = %path.display(), bytes = written, "wrote binary");
    Ok(written)
}

/// Write the binary stream to standard output.
pub async fn write_to_stdout(stream: BinaryStream) -> Result<u64, InstallError> {
    let mut stdout = tokio::io::stdout();
    copy_binary(stream, &mut stdout)
        .await
        .map_err(InstallError::Stream)
}

/// Give the file at `path` the executable mode.
#[cfg(unix)]
pub fn make_executable(path: &Path) -> Result<(), InstallError> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(EXECUTABLE_MODE)).map_err(
        |source| InstallError::Chmod {
            path: path.to_path_buf(),
            source,
        },
    )
}

/// Executable bits do not exist here; nothing to do.
#[cfg(not(unix))]
pub fn make_executable(_path: &Path) -> Result<(), InstallError> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use get_aria2::ArchiveFormat;
    use tempfile::TempDir;

    async fn binary_stream(content: &'static [u8]) -> BinaryStream {
        let mut builder = tar::Builder::new(Vec::new());
        let mut header = tar::Header::new_gnu();
        header.set_path("aria2-1.0/bin/aria2c").unwrap();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder.append(&header, content).unwrap();
        let archive = builder.into_inner().unwrap();

        let source = futures::stream::iter(vec![Ok::<_, io::Error>(Bytes::from(archive))]);
        get_aria2::extract(source, ArchiveFormat::Tar, "1.0")
            .await
            .unwrap()
            .binary_stream
    }

    #[test]
    fn test_output_path_ext() {
        let dest = Path::new("bin/aria2c");
        assert_eq!(
            output_path(dest, Platform::Win32, true),
            PathBuf::from("bin/aria2c.exe")
        );
        assert_eq!(output_path(dest, Platform::Win32, false), dest);
        assert_eq!(output_path(dest, Platform::Linux, true), dest);
    }

    #[test]
    fn test_should_chmod() {
        assert!(should_chmod(true, Platform::Linux));
        assert!(should_chmod(true, Platform::Darwin));
        assert!(should_chmod(true, Platform::Android));
        assert!(!should_chmod(true, Platform::Win32));
        assert!(!should_chmod(false, Platform::Linux));
    }

    #[tokio::test]
    async fn test_copy_binary() {
        let stream = binary_stream(b"aria2c bytes").await;
        let mut out = Vec::new();
        let written = copy_binary(stream, &mut out).await.unwrap();
        assert_eq!(written, 12);
        assert_eq!(out, b"aria2c bytes");
    }

    #[tokio::test]
    async fn test_write_to_file_creates_parents() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("nested").join("aria2c");

        let stream = binary_stream(b"binary").await;
        write_to_file(stream, &path).await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"binary");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_make_executable() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let path = temp.path().join("aria2c");
        std::fs::write(&path, b"x").unwrap();

        make_executable(&path).unwrap();
        let mode = std::fs::metadata(&path).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, EXECUTABLE_MODE);
    }

    #[test]
    fn test_chmod_missing_file_errors() {
        let temp = TempDir::new().unwrap();
        let result = make_executable(&temp.path().join("missing"));
        if cfg!(unix) {
            assert!(matches!(result, Err(InstallError::Chmod { .. })));
        }
    }
}
