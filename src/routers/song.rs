use axum::{
    Json, Router,
    extract::{
        Path, State,
        rejection::{JsonRejection, PathRejection},
    },
    response::{IntoResponse, Response},
    routing::get,
};
use serde_json::Value;

use crate::controllers::SongController;
use crate::errors::ApiError;

/// A path that cannot be decoded still reaches the controller, where it fails id parsing.
fn raw_id(path: Result<Path<String>, PathRejection>) -> String {
    match path {
        Ok(Path(id)) => id,
        Err(rejection) => rejection.body_text(),
    }
}

pub async fn list_songs_route(State(controller): State<SongController>) -> Response {
    controller.list_songs().await.into_response()
}

pub async fn get_song_route(
    State(controller): State<SongController>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    controller.get_song(&raw_id(path)).await.into_response()
}

pub async fn create_song_route(
    State(controller): State<SongController>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => controller.create_song(payload).await.into_response(),
        Err(rejection) => ApiError::from(rejection).into_response(),
    }
}

pub async fn update_song_route(
    State(controller): State<SongController>,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Response {
    match payload {
        Ok(Json(payload)) => controller.update_song(&raw_id(path), payload).await.into_response(),
        Err(rejection) => ApiError::from(rejection).into_response(),
    }
}

pub async fn delete_song_route(
    State(controller): State<SongController>,
    path: Result<Path<String>, PathRejection>,
) -> Response {
    controller.delete_song(&raw_id(path)).await.into_response()
}

pub fn song_routes() -> Router<SongController> {
    Router::new()
        .route("/", get(list_songs_route).post(create_song_route))
        .route(
            "/{id}",
            get(get_song_route)
                .put(update_song_route)
                .delete(delete_song_route),
        )
}
