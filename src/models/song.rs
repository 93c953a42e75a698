use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Ratings {
    pub rym: f64,
    pub ranked: i64,
}

/// A stored song document as returned to clients.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct Song {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub title: String,
    pub genre: String,
    pub artist: String,
    pub released_year: i64,
    pub ratings: Ratings,
}

/// A fully validated create payload.
#[derive(Deserialize, Serialize, Clone, Debug, PartialEq)]
pub struct NewSong {
    pub title: String,
    pub genre: String,
    pub artist: String,
    pub released_year: i64,
    pub ratings: Ratings,
}

impl NewSong {
    pub fn into_song(self, id: Uuid) -> Song {
        Song {
            id,
            title: self.title,
            genre: self.genre,
            artist: self.artist,
            released_year: self.released_year,
            ratings: self.ratings,
        }
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct RatingsPatch {
    pub rym: Option<f64>,
    pub ranked: Option<i64>,
}

/// A validated update payload. `None` fields are left untouched.
#[derive(Deserialize, Serialize, Clone, Debug, Default, PartialEq)]
pub struct SongPatch {
    pub title: Option<String>,
    pub genre: Option<String>,
    pub artist: Option<String>,
    pub released_year: Option<i64>,
    pub ratings: Option<RatingsPatch>,
}

impl SongPatch {
    pub fn rym(&self) -> Option<f64> {
        self.ratings.as_ref().and_then(|r| r.rym)
    }

    pub fn ranked(&self) -> Option<i64> {
        self.ratings.as_ref().and_then(|r| r.ranked)
    }

    pub fn apply(&self, song: &mut Song) {
        if let Some(title) = &self.title {
            song.title = title.clone();
        }
        if let Some(genre) = &self.genre {
            song.genre = genre.clone();
        }
        if let Some(artist) = &self.artist {
            song.artist = artist.clone();
        }
        if let Some(year) = self.released_year {
            song.released_year = year;
        }
        if let Some(rym) = self.rym() {
            song.ratings.rym = rym;
        }
        if let Some(ranked) = self.ranked() {
            song.ratings.ranked = ranked;
        }
    }
}

#[derive(Serialize, Deserialize, Debug)]
pub struct SongCreatedResponse {
    pub id: Uuid,
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Song {
        Song {
            id: Uuid::new_v4(),
            title: "Loveless".to_string(),
            genre: "Shoegaze".to_string(),
            artist: "My Bloody Valentine".to_string(),
            released_year: 1991,
            ratings: Ratings { rym: 4.2, ranked: 3 },
        }
    }

    #[test]
    fn patch_only_touches_supplied_fields() {
        let mut song = sample();
        let patch = SongPatch {
            genre: Some("Dream Pop".to_string()),
            ratings: Some(RatingsPatch { rym: None, ranked: Some(1) }),
            ..Default::default()
        };
        patch.apply(&mut song);

        assert_eq!(song.genre, "Dream Pop");
        assert_eq!(song.title, "Loveless");
        assert_eq!(song.ratings.rym, 4.2);
        assert_eq!(song.ratings.ranked, 1);
    }

    #[test]
    fn song_serializes_id_as_underscore_id() {
        let song = sample();
        let value = serde_json::to_value(&song).unwrap();
        assert_eq!(value["_id"], serde_json::json!(song.id.to_string()));
        assert_eq!(value["ratings"]["ranked"], serde_json::json!(3));
    }
}
