use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Track {
    pub path: PathBuf,
    pub title: String,
    pub artist: Option<String>,
}

impl Track {
    /// Display line for the track-info marquee.
    pub fn info_line(&self) -> String {
        let artist = self
            .artist
            .as_deref()
            .filter(|artist| !artist.trim().is_empty())
            .unwrap_or("Unknown Artist");
        format!("{} - {artist}", self.title)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Settings {
    pub folders: Vec<PathBuf>,
    #[serde(default = "default_saved_volume")]
    pub saved_volume: f32,
}

fn default_saved_volume() -> f32 {
    1.0
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            folders: Vec::new(),
            saved_volume: default_saved_volume(),
        }
    }
}
