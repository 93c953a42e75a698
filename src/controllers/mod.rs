pub mod song;
pub use song::SongController;
