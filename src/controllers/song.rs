use std::sync::Arc;

use axum::{Json, http::StatusCode};
use serde_json::Value;
use tracing::{error, info, warn};

use crate::{
    db::{SongStore, StoreError, parse_id},
    errors::ApiError,
    models::song::{MessageResponse, Song, SongCreatedResponse},
    validator::{validate_create, validate_update},
};

/// Maps song endpoints onto the injected store.
#[derive(Clone)]
pub struct SongController {
    store: Arc<dyn SongStore>,
}

impl SongController {
    pub fn new(store: Arc<dyn SongStore>) -> Self {
        SongController { store }
    }

    pub async fn list_songs(&self) -> Result<Json<Vec<Song>>, ApiError> {
        match self.store.list_all().await {
            Ok(songs) => Ok(Json(songs)),
            Err(e @ StoreError::Unavailable(_)) => {
                Err(failure("Database connection not established!")(e))
            }
            Err(e) => Err(failure("Unable to fetch songs")(e)),
        }
    }

    pub async fn get_song(&self, raw_id: &str) -> Result<Json<Song>, ApiError> {
        let id = parse_id(raw_id).map_err(failure("Internal Error"))?;
        let song = self
            .store
            .get_by_id(id)
            .await
            .map_err(failure("Internal Error"))?;

        song.map(Json).ok_or(ApiError::NotFound("Data not found"))
    }

    pub async fn create_song(
        &self,
        payload: Value,
    ) -> Result<(StatusCode, Json<SongCreatedResponse>), ApiError> {
        let song = validate_create(&payload)?;
        let id = self
            .store
            .insert(song)
            .await
            .map_err(failure("Unable to add song!"))?;

        info!("Added song {}", id);
        Ok((
            StatusCode::CREATED,
            Json(SongCreatedResponse {
                id,
                message: "Song added!".to_string(),
            }),
        ))
    }

    pub async fn update_song(
        &self,
        raw_id: &str,
        payload: Value,
    ) -> Result<Json<MessageResponse>, ApiError> {
        let patch = validate_update(&payload)?;
        let id = parse_id(raw_id).map_err(failure("Unable to update"))?;
        let matched = self
            .store
            .update_by_id(id, patch)
            .await
            .map_err(failure("Unable to update"))?;

        if matched == 0 {
            return Err(ApiError::NotFound("Song not found"));
        }
        info!("Updated song {}", id);
        Ok(Json(MessageResponse {
            message: "Song Updated".to_string(),
        }))
    }

    pub async fn delete_song(&self, raw_id: &str) -> Result<Json<MessageResponse>, ApiError> {
        let id = parse_id(raw_id).map_err(failure("Unable to delete song"))?;
        let deleted = self
            .store
            .delete_by_id(id)
            .await
            .map_err(failure("Unable to delete song"))?;

        if deleted == 0 {
            return Err(ApiError::NotFound("Song not found"));
        }
        info!("Deleted song {}", id);
        Ok(Json(MessageResponse {
            message: "Song deleted".to_string(),
        }))
    }
}

/// Logs a store failure and wraps it with the message the client gets.
fn failure(message: &'static str) -> impl FnOnce(StoreError) -> ApiError {
    move |source| {
        match &source {
            StoreError::InvalidIdentifier(_) => warn!("{}: {}", message, source),
            _ => error!("{}: {}", message, source),
        }
        ApiError::Store { message, source }
    }
}
