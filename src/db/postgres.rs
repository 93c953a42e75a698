use async_trait::async_trait;
use sqlx::{FromRow, PgPool, postgres::PgPoolOptions};
use tracing::debug;
use uuid::Uuid;

use super::{SongStore, StoreError};
use crate::models::song::{NewSong, Ratings, Song, SongPatch};

#[derive(Debug, FromRow)]
struct SongRow {
    id: Uuid,
    title: String,
    genre: String,
    artist: String,
    released_year: i64,
    rating_rym: f64,
    rating_ranked: i64,
}

impl From<SongRow> for Song {
    fn from(row: SongRow) -> Self {
        Song {
            id: row.id,
            title: row.title,
            genre: row.genre,
            artist: row.artist,
            released_year: row.released_year,
            ratings: Ratings {
                rym: row.rating_rym,
                ranked: row.rating_ranked,
            },
        }
    }
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StoreError::Unavailable(err.to_string())
            }
            other => StoreError::Operation(other.to_string()),
        }
    }
}

/// PostgreSQL-backed song store.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    pub async fn connect(database_url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        debug!("Connecting to song store with max_connections={}", max_connections);

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await?;

        Ok(Self { pool })
    }

    pub async fn migrate(&self) -> Result<(), sqlx::migrate::MigrateError> {
        sqlx::migrate!("./migrations").run(&self.pool).await
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl SongStore for Database {
    async fn list_all(&self) -> Result<Vec<Song>, StoreError> {
        let rows = sqlx::query_as::<_, SongRow>(
            r#"SELECT id, title, genre, artist, released_year, rating_rym, rating_ranked
               FROM "Music" ORDER BY created_at"#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Song::from).collect())
    }

    async fn get_by_id(&self, id: Uuid) -> Result<Option<Song>, StoreError> {
        let row = sqlx::query_as::<_, SongRow>(
            r#"SELECT id, title, genre, artist, released_year, rating_rym, rating_ranked
               FROM "Music" WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Song::from))
    }

    async fn insert(&self, song: NewSong) -> Result<Uuid, StoreError> {
        let id = Uuid::new_v4();
        sqlx::query(
            r#"INSERT INTO "Music" (id, title, genre, artist, released_year, rating_rym, rating_ranked)
               VALUES ($1, $2, $3, $4, $5, $6, $7)"#,
        )
        .bind(id)
        .bind(song.title)
        .bind(song.genre)
        .bind(song.artist)
        .bind(song.released_year)
        .bind(song.ratings.rym)
        .bind(song.ratings.ranked)
        .execute(&self.pool)
        .await?;

        Ok(id)
    }

    async fn update_by_id(&self, id: Uuid, patch: SongPatch) -> Result<u64, StoreError> {
        let (rym, ranked) = (patch.rym(), patch.ranked());
        // COALESCE keeps the stored value for every column the patch leaves out.
        let result = sqlx::query(
            r#"UPDATE "Music" SET
                   title = COALESCE($2, title),
                   genre = COALESCE($3, genre),
                   artist = COALESCE($4, artist),
                   released_year = COALESCE($5, released_year),
                   rating_rym = COALESCE($6, rating_rym),
                   rating_ranked = COALESCE($7, rating_ranked)
               WHERE id = $1"#,
        )
        .bind(id)
        .bind(patch.title)
        .bind(patch.genre)
        .bind(patch.artist)
        .bind(patch.released_year)
        .bind(rym)
        .bind(ranked)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: Uuid) -> Result<u64, StoreError> {
        let result = sqlx::query(r#"DELETE FROM "Music" WHERE id = $1"#)
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::song::RatingsPatch;

    #[test]
    fn pool_and_io_errors_mean_unavailable() {
        let errors = [
            sqlx::Error::PoolTimedOut,
            sqlx::Error::PoolClosed,
            sqlx::Error::Io(std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused")),
        ];
        for err in errors {
            assert!(matches!(StoreError::from(err), StoreError::Unavailable(_)));
        }
    }

    #[test]
    fn other_errors_are_operation_failures() {
        let err = StoreError::from(sqlx::Error::RowNotFound);
        assert!(matches!(err, StoreError::Operation(_)));

        let err = StoreError::from(sqlx::Error::Protocol("unexpected message".to_string()));
        assert!(matches!(err, StoreError::Operation(_)));
    }

    #[tokio::test]
    #[ignore = "needs a PostgreSQL server in TEST_DATABASE_URL"]
    async fn partial_update_keeps_unsupplied_columns() {
        let url = std::env::var("TEST_DATABASE_URL").expect("TEST_DATABASE_URL");
        let db = Database::connect(&url, 1).await.unwrap();
        db.migrate().await.unwrap();

        let id = db
            .insert(NewSong {
                title: "Roygbiv".to_string(),
                genre: "IDM".to_string(),
                artist: "Boards of Canada".to_string(),
                released_year: 1998,
                ratings: Ratings { rym: 3.9, ranked: 8 },
            })
            .await
            .unwrap();

        let patch = SongPatch {
            artist: Some("BoC".to_string()),
            ratings: Some(RatingsPatch { rym: None, ranked: Some(2) }),
            ..Default::default()
        };
        assert_eq!(db.update_by_id(id, patch.clone()).await.unwrap(), 1);
        assert_eq!(db.update_by_id(id, patch).await.unwrap(), 1);
        assert_eq!(db.update_by_id(Uuid::new_v4(), SongPatch::default()).await.unwrap(), 0);

        let song = db.get_by_id(id).await.unwrap().unwrap();
        assert_eq!(song.title, "Roygbiv");
        assert_eq!(song.artist, "BoC");
        assert_eq!(song.released_year, 1998);
        assert_eq!(song.ratings, Ratings { rym: 3.9, ranked: 2 });

        assert_eq!(db.delete_by_id(id).await.unwrap(), 1);
        assert_eq!(db.delete_by_id(id).await.unwrap(), 0);
    }
}
