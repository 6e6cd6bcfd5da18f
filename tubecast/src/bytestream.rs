use std::path::Path;

use bytes::Bytes;
use tokio::fs::File;
use tokio_stream::StreamExt;

/// Stream of audio/artifact bytes flowing between the remote service, blob
/// storage and the HTTP layer.
pub type ByteStream = Box<dyn tokio_stream::Stream<Item = std::io::Result<Bytes>> + Send + Unpin>;

pub async fn to_file(stream: ByteStream, path: &Path) -> std::io::Result<u64> {
    let mut file = File::create(path).await?;
    let mut reader = tokio_util::io::StreamReader::new(stream);
    let written = tokio::io::copy(&mut reader, &mut file).await?;
    Ok(written)
}

pub async fn from_file(path: &Path) -> std::io::Result<ByteStream> {
    let file = File::open(path).await?;
    Ok(Box::new(tokio_util::io::ReaderStream::new(
        tokio::io::BufReader::new(file),
    )))
}

pub async fn to_bytes(mut stream: ByteStream) -> std::io::Result<Bytes> {
    let mut bytes = bytes::BytesMut::new();
    while let Some(buf) = stream.next().await {
        bytes.extend_from_slice(&buf?);
    }
    Ok(bytes.freeze())
}

pub fn from_bytes(bytes: impl Into<Bytes>) -> ByteStream {
    Box::new(tokio_stream::once(Ok(bytes.into())))
}
