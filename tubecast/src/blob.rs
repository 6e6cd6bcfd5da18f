use std::io::Result;

use bytes::Bytes;

use crate::{async_trait, bytestream, bytestream::ByteStream};

mod filesystem;
pub use filesystem::FilesystemBlobStorage;

mod memory;
pub use memory::MemoryBlobStorage;

/// Storage for downloaded audio artifacts, keyed by opaque string.
///
/// The episode store records the key of each downloaded artifact; the refresh
/// engine is the only writer, the feed/audio gateway the only reader.
#[async_trait]
pub trait BlobStorage: std::fmt::Debug + Send + Sync + 'static {
    async fn get(&self, key: &str) -> Result<Bytes> {
        let stream = self.read(key).await?;
        bytestream::to_bytes(stream).await
    }
    async fn read(&self, key: &str) -> Result<ByteStream>;
    async fn put(&self, key: &str, bytes: Bytes) -> Result<()>;
    async fn write(&self, key: &str, reader: ByteStream) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
}
