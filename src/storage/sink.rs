//! Streams image bodies to disk

use futures_util::{Stream, StreamExt};
use std::path::Path;
use thiserror::Error;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

/// Errors that can occur while writing an image
#[derive(Debug, Error)]
pub enum SinkError {
    /// The response body failed mid-transfer
    #[error("Body stream failed: {0}")]
    Body(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The file could not be created or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Writes a stream of body chunks to `path` through a `chunk_size` buffer
///
/// On any error the partially written file is removed.
///
/// # Returns
///
/// The number of bytes written
pub async fn write_stream<S, B, E>(stream: S, path: &Path, chunk_size: usize) -> Result<u64, SinkError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let result = copy_stream(stream, path, chunk_size).await;
    if result.is_err() {
        if let Err(e) = tokio::fs::remove_file(path).await {
            tracing::debug!("Could not remove partial file {}: {}", path.display(), e);
        }
    }
    result
}

async fn copy_stream<S, B, E>(stream: S, path: &Path, chunk_size: usize) -> Result<u64, SinkError>
where
    S: Stream<Item = Result<B, E>>,
    B: AsRef<[u8]>,
    E: std::error::Error + Send + Sync + 'static,
{
    let file = File::create(path).await?;
    let mut writer = BufWriter::with_capacity(chunk_size, file);
    let mut stream = std::pin::pin!(stream);
    let mut written = 0u64;

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(|e| SinkError::Body(Box::new(e)))?;
        let bytes = chunk.as_ref();
        writer.write_all(bytes).await?;
        written += bytes.len() as u64;
    }

    writer.flush().await?;
    Ok(written)
}
