// Record store adapter for the "Music" collection
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::models::song::{NewSong, Song, SongPatch};

pub mod memory;
pub mod postgres;

pub use memory::MemoryStore;
pub use postgres::Database;

/// Name of the collection songs are persisted in.
pub const COLLECTION: &str = "Music";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid identifier: {0:?}")]
    InvalidIdentifier(String),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("store operation failed: {0}")]
    Operation(String),
}

/// Converts a route parameter into the store's native identifier.
pub fn parse_id(raw: &str) -> Result<Uuid, StoreError> {
    Uuid::parse_str(raw).map_err(|_| StoreError::InvalidIdentifier(raw.to_string()))
}

#[async_trait]
pub trait SongStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<Song>, StoreError>;

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Song>, StoreError>;

    /// Stores a new song and returns its generated id.
    async fn insert(&self, song: NewSong) -> Result<Uuid, StoreError>;

    /// Returns the number of matched records (0 or 1).
    async fn update_by_id(&self, id: Uuid, patch: SongPatch) -> Result<u64, StoreError>;

    /// Returns the number of deleted records (0 or 1).
    async fn delete_by_id(&self, id: Uuid) -> Result<u64, StoreError>;
}
