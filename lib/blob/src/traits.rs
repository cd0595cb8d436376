use crate::error::BlobError;

/// BlobStore provides storage for uploaded nameplate photos.
///
/// Keys are flat file names like `3f2a9c...d1.jpg` — one entry per equipment
/// record image. The default implementation (`FileStore`) maps keys to files
/// under the uploads directory; the record's `imageUrl` then points at
/// `/uploads/{key}`. Can be swapped for an object-store backend by
/// implementing this trait.
pub trait BlobStore: Send + Sync {
    /// Store a blob. Overwrites if the key already exists.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError>;

    /// Retrieve a blob. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError>;

    /// Delete a blob. No-op if the key does not exist.
    fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Check whether a blob exists.
    fn exists(&self, key: &str) -> Result<bool, BlobError>;
}
