use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{SongStore, StoreError};
use crate::models::song::{NewSong, Song, SongPatch};

/// In-process song store. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    songs: RwLock<Vec<Song>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SongStore for MemoryStore {
    async fn list_all(&self) -> Result<Vec<Song>, StoreError> {
        Ok(self.songs.read().await.clone())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Song>, StoreError> {
        let songs = self.songs.read().await;
        Ok(songs.iter().find(|song| song.id == id).cloned())
    }

    async fn insert(&self, song: NewSong) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        self.songs.write().await.push(song.into_song(id));
        Ok(id)
    }

    async fn update_by_id(&self, id: Uuid, patch: SongPatch) -> Result<u64, StoreError> {
        let mut songs = self.songs.write().await;
        match songs.iter_mut().find(|song| song.id == id) {
            Some(song) => {
                patch.apply(song);
                Ok(1)
            }
            None => Ok(0),
        }
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<u64, StoreError> {
        let mut songs = self.songs.write().await;
        let before = songs.len();
        songs.retain(|song| song.id != id);
        Ok((before - songs.len()) as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::song::{Ratings, RatingsPatch};

    fn new_song(title: &str) -> NewSong {
        NewSong {
            title: title.to_string(),
            genre: "Post-Rock".to_string(),
            artist: "Slint".to_string(),
            released_year: 1991,
            ratings: Ratings { rym: 4.0, ranked: 5 },
        }
    }

    #[tokio::test]
    async fn lists_in_insertion_order() {
        let store = MemoryStore::new();
        let first = store.insert(new_song("Breadcrumb Trail")).await.unwrap();
        let second = store.insert(new_song("Nosferatu Man")).await.unwrap();

        let ids: Vec<Uuid> = store.list_all().await.unwrap().iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![first, second]);
    }

    #[tokio::test]
    async fn update_reports_matched_count() {
        let store = MemoryStore::new();
        let id = store.insert(new_song("Washer")).await.unwrap();
        let patch = SongPatch {
            ratings: Some(RatingsPatch { rym: Some(4.5), ranked: None }),
            ..Default::default()
        };

        assert_eq!(store.update_by_id(id, patch.clone()).await.unwrap(), 1);
        assert_eq!(store.update_by_id(Uuid::new_v4(), patch).await.unwrap(), 0);

        let song = store.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(song.ratings, Ratings { rym: 4.5, ranked: 5 });
    }

    #[tokio::test]
    async fn delete_removes_once() {
        let store = MemoryStore::new();
        let id = store.insert(new_song("Good Morning, Captain")).await.unwrap();

        assert_eq!(store.delete_by_id(id).await.unwrap(), 1);
        assert_eq!(store.delete_by_id(id).await.unwrap(), 0);
        assert!(store.get_by_id(id).await.unwrap().is_none());
    }
}
