//! Streaming persistence of upload bodies.
//!
//! The body is copied to disk chunk by chunk, so memory stays bounded by the
//! chunk size no matter how large the upload is.

use std::fmt::Display;
use std::io;
use std::path::Path;
use std::time::Duration;

use bytes::Bytes;
use futures::{Stream, StreamExt};
use ms_core::StorageError;
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

/// Error yielded by an upload body stream.
pub trait BodyError: Display {
    /// Whether the body was cut off for exceeding a size limit.
    fn exceeds_limit(&self) -> bool {
        false
    }
}

impl BodyError for io::Error {}
impl BodyError for String {}
impl BodyError for &str {}

/// Write every chunk of `stream` to a new file at `path`.
///
/// The file must not exist yet; an existing file is reported as
/// [`StorageError::Collision`] and left untouched. If no chunk arrives within
/// `idle_timeout` the copy is abandoned with [`StorageError::UploadTimeout`].
/// A body error that [`exceeds_limit`](BodyError::exceeds_limit) becomes
/// [`StorageError::TooLarge`], any other [`StorageError::Upload`].
/// On any error a partially written file may remain; the caller owns its
/// removal.
///
/// Returns the number of bytes written.
pub async fn persist_stream<S, E>(
    path: &Path,
    stream: S,
    idle_timeout: Duration,
) -> Result<u64, StorageError>
where
    S: Stream<Item = Result<Bytes, E>>,
    E: BodyError,
{
    let write_err = |source: io::Error| StorageError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
        .map_err(|e| {
            if e.kind() == io::ErrorKind::AlreadyExists {
                StorageError::Collision(path.to_path_buf())
            } else {
                write_err(e)
            }
        })?;

    let mut stream = std::pin::pin!(stream);
    let mut written: u64 = 0;

    loop {
        let next = tokio::time::timeout(idle_timeout, stream.next())
            .await
            .map_err(|_| StorageError::UploadTimeout(idle_timeout))?;

        let Some(chunk) = next else {
            break;
        };
        let chunk = chunk.map_err(|e| {
            if e.exceeds_limit() {
                StorageError::TooLarge(e.to_string())
            } else {
                StorageError::Upload(e.to_string())
            }
        })?;
        file.write_all(&chunk).await.map_err(write_err)?;
        written += chunk.len() as u64;
    }

    file.flush().await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;

    tracing::debug!(path = %path.display(), bytes = written, "Upload persisted");
    Ok(written)
}

/// Stream a local file as a sequence of byte chunks.
///
/// Lets local files go through the same persistence path as HTTP uploads.
pub fn file_stream(file: tokio::fs::File) -> impl Stream<Item = Result<Bytes, io::Error>> {
    tokio_util::io::ReaderStream::new(file)
}
