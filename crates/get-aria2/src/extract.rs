//! Streaming extraction of the aria2c binary from an archive byte stream.
//!
//! The archive is never buffered. Bytes flow from the source stream through
//! the format's decompression stages into a synchronous container parser that
//! runs on a blocking worker. Entries are matched against the binary name as
//! their headers arrive:
//!
//! - entries that do not match are read and discarded,
//! - the first matching entry resolves [`extract`] and its body is pumped into
//!   a bounded channel read by the caller through [`BinaryStream`],
//! - everything after it keeps draining in the background until the source
//!   is exhausted, reported through [`DrainHandle`].
//!
//! Dropping the [`BinaryStream`] cancels the worker and releases the source,
//! even while a later entry is being drained.

use std::io::{self, Read};
use std::pin::Pin;
use std::sync::LazyLock;
use std::task::{Context, Poll};

use bytes::Bytes;
use futures::{Stream, StreamExt};
use regex::Regex;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::io::{StreamReader, SyncIoBridge};
use tokio_util::sync::{CancellationToken, DropGuard};
use tracing::{debug, trace, warn};

use crate::format::{ArchiveFormat, Container, Source};
use crate::{Error, Result};

/// `aria2c` or `aria2c.exe`, as the whole path or its last component.
#[allow(clippy::expect_used)]
static BINARY_PATH: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(^|/)aria2c(\.exe)?$").expect("binary path pattern is valid"));

/// Size of the chunks the binary body is forwarded in.
const CHUNK_SIZE: usize = 64 * 1024;

/// Chunks buffered ahead of the consumer.
const CHANNEL_CAPACITY: usize = 16;

/// Whether an archive entry path names the aria2c binary.
#[must_use]
pub fn is_binary_path(path: &str) -> bool {
    BINARY_PATH.is_match(path)
}

/// The body of the matched archive entry, delivered as it is decompressed.
///
/// The producer blocks once [`CHANNEL_CAPACITY`] chunks are waiting, so the
/// download only progresses as fast as this stream is drained.
#[derive(Debug)]
pub struct BinaryStream {
    rx: mpsc::Receiver<io::Result<Bytes>>,
    _cancel_on_drop: DropGuard,
}

impl BinaryStream {
    /// Adapt the stream to [`tokio::io::AsyncRead`].
    #[must_use]
    pub fn into_async_read(self) -> StreamReader<Self, Bytes> {
        StreamReader::new(self)
    }
}

impl Stream for BinaryStream {
    type Item = io::Result<Bytes>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.rx.poll_recv(cx)
    }
}

/// Completion of the background drain that follows a match.
#[derive(Debug)]
pub struct DrainHandle {
    task: JoinHandle<Result<()>>,
}

impl DrainHandle {
    /// Wait until the rest of the archive has been consumed.
    ///
    /// Returns the first error hit after the binary was found. Dropping the
    /// handle instead leaves the drain running detached.
    pub async fn wait(self) -> Result<()> {
        self.task
            .await
            .map_err(|e| Error::extraction_aborted(e.to_string()))?
    }
}

/// A located binary plus the version it was resolved for.
#[derive(Debug)]
pub struct ExtractionResult {
    /// Live body of the matched entry.
    pub binary_stream: BinaryStream,
    /// Version parsed from the release asset name.
    pub version: String,
    drain: DrainHandle,
}

impl ExtractionResult {
    /// Split into the binary stream, the version and the drain handle.
    #[must_use]
    pub fn into_parts(self) -> (BinaryStream, String, DrainHandle) {
        (self.binary_stream, self.version, self.drain)
    }
}

/// Extract the aria2c binary from an archive byte stream.
///
/// Resolves as soon as the matching entry's header has been read, before
/// its body is downloaded. Fails with [`Error::BinaryNotFound`] when the
/// archive ends without a match, or with the parser's error when the
/// archive is malformed before one is found.
pub async fn extract<S>(
    source: S,
    format: ArchiveFormat,
    version: impl Into<String>,
) -> Result<ExtractionResult>
where
    S: Stream<Item = io::Result<Bytes>> + Send + 'static,
{
    let version = version.into();
    let pipeline = format.pipeline();
    debug!(%format, %version, "extracting aria2c");

    // Cancellation ends the source, so a worker parked on a slow read wakes up
    let cancel = CancellationToken::new();
    let source = source.take_until(cancel.clone().cancelled_owned());

    // The bridge captures the current runtime handle, so it is built here
    // and only read on the blocking worker.
    let reader: Source = Box::new(SyncIoBridge::new(StreamReader::new(Box::pin(source))));

    let (found_tx, found_rx) = oneshot::channel();
    let (body_tx, body_rx) = mpsc::channel(CHANNEL_CAPACITY);
    let mut scanner = Scanner {
        found: Some(found_tx),
        body: Some(body_tx),
        cancel: cancel.clone(),
        scratch: vec![0u8; CHUNK_SIZE],
    };

    let task = tokio::task::spawn_blocking(move || {
        let decoded = pipeline.decode(reader);
        let outcome = match pipeline.container {
            Container::Tar => scan_tar(&mut scanner, decoded),
            Container::Zip => scan_zip(&mut scanner, decoded),
        };
        scanner.finish(outcome)
    });
    let binary_stream = BinaryStream {
        rx: body_rx,
        _cancel_on_drop: cancel.drop_guard(),
    };

    match found_rx.await {
        Ok(Ok(())) => Ok(ExtractionResult {
            binary_stream,
            version,
            drain: DrainHandle { task },
        }),
        Ok(Err(err)) => Err(err),
        Err(_) => Err(match task.await {
            Ok(Err(err)) => err,
            Ok(Ok(())) => Error::extraction_aborted("worker finished without an outcome"),
            Err(join) => Error::extraction_aborted(join.to_string()),
        }),
    }
}

/// Whether the walk over the container should go on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Stop,
}

/// Per-entry decisions shared by the tar and zip walks.
struct Scanner {
    found: Option<oneshot::Sender<Result<()>>>,
    body: Option<mpsc::Sender<io::Result<Bytes>>>,
    cancel: CancellationToken,
    scratch: Vec<u8>,
}

impl Scanner {
    fn entry(&mut self, path: &str, is_file: bool, reader: &mut dyn Read) -> Result<Flow> {
        if self.cancel.is_cancelled() {
            debug!("binary stream dropped, stopping extraction");
            return Ok(Flow::Stop);
        }

        if is_file
            && is_binary_path(path)
            && let Some(body) = self.body.take()
        {
            debug!(path, "found aria2c entry");
            if let Some(found) = self.found.take() {
                let _ = found.send(Ok(()));
            }
            // `body` is dropped on return, which ends the caller's stream
            return pump(reader, &body);
        }

        trace!(path, "draining entry");
        self.drain(reader)
    }

    /// Discard an entry body, giving up as soon as the consumer is gone.
    fn drain(&mut self, reader: &mut dyn Read) -> Result<Flow> {
        loop {
            if self.cancel.is_cancelled() {
                debug!("binary stream dropped mid-entry, stopping extraction");
                return Ok(Flow::Stop);
            }
            match reader.read(&mut self.scratch) {
                Ok(0) => return Ok(Flow::Continue),
                Ok(_) => {}
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn finish(mut self, outcome: Result<Flow>) -> Result<()> {
        if let Some(found) = self.found.take() {
            let err = outcome.err().unwrap_or(Error::BinaryNotFound);
            let _ = found.send(Err(err));
            return Ok(());
        }

        match outcome {
            Ok(_) => {
                debug!("archive drained");
                Ok(())
            }
            // The source was cut short on purpose
            Err(_) if self.cancel.is_cancelled() => {
                debug!("drain abandoned after binary stream was dropped");
                Ok(())
            }
            Err(err) => {
                warn!(error = %err, "failed to drain archive after aria2c was found");
                Err(err)
            }
        }
    }
}

/// Forward an entry body to the consumer chunk by chunk.
fn pump(reader: &mut dyn Read, body: &mpsc::Sender<io::Result<Bytes>>) -> Result<Flow> {
    let mut buf = vec![0u8; CHUNK_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => return Ok(Flow::Continue),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => {
                let _ = body.blocking_send(Err(io::Error::new(e.kind(), e.to_string())));
                return Err(e.into());
            }
        };

        if body
            .blocking_send(Ok(Bytes::copy_from_slice(&buf[..n])))
            .is_err()
        {
            debug!("binary stream dropped mid-body, stopping extraction");
            return Ok(Flow::Stop);
        }
    }
}

fn scan_tar(scanner: &mut Scanner, source: Source) -> Result<Flow> {
    let mut archive = tar::Archive::new(source);
    for entry in archive.entries()? {
        let mut entry = entry?;
        let path = entry.path()?.to_string_lossy().into_owned();
        let is_file = entry.header().entry_type().is_file();
        if scanner.entry(&path, is_file, &mut entry)? == Flow::Stop {
            return Ok(Flow::Stop);
        }
    }
    Ok(Flow::Continue)
}

/// Walk local file headers in stream order; the central directory ends the walk.
///
/// Entries whose sizes only appear in a trailing data descriptor cannot be
/// read this way and fail with [`Error::Zip`].
fn scan_zip(scanner: &mut Scanner, mut source: Source) -> Result<Flow> {
    while let Some(mut file) = zip::read::read_zipfile_from_stream(&mut source)? {
        let path = file.name().to_string();
        let is_file = file.is_file();
        if scanner.entry(&path, is_file, &mut file)? == Flow::Stop {
            return Ok(Flow::Stop);
        }
    }
    Ok(Flow::Continue)
}
