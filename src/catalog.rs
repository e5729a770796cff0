use crate::model::Track;
use anyhow::{Result, bail};
use lofty::file::TaggedFileExt;
use lofty::prelude::Accessor;
use lofty::probe::Probe;
use rand::Rng;
use rand::rngs::SmallRng;
use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

const AUDIO_EXTENSIONS: &[&str] = &["mp3", "flac", "wav", "ogg", "m4a", "aac", "opus"];

/// The static track catalog the queue draws from. Built once at startup,
/// read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    tracks: Vec<Track>,
}

impl Catalog {
    pub fn from_folders(folders: &[PathBuf]) -> Self {
        let mut tracks = Vec::new();
        for folder in folders {
            tracks.append(&mut scan_folder(folder));
        }
        tracks.sort_by(|a, b| a.path.cmp(&b.path));
        tracks.dedup_by(|a, b| a.path == b.path);
        Self { tracks }
    }

    pub fn from_tracks(tracks: Vec<Track>) -> Self {
        Self { tracks }
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Uniform random selection. An empty catalog is an explicit error, not
    /// an out-of-bounds access.
    pub fn pick_random(&self, rng: &mut SmallRng) -> Result<&Track> {
        if self.tracks.is_empty() {
            bail!("track catalog is empty; add a music folder first");
        }
        let idx = rng.random_range(0..self.tracks.len());
        Ok(&self.tracks[idx])
    }
}

pub fn scan_folder(root: &Path) -> Vec<Track> {
    let mut tracks = Vec::new();

    for entry in WalkDir::new(root)
        .follow_links(true)
        .into_iter()
        .filter_map(Result::ok)
    {
        let path = entry.path();
        if !entry.file_type().is_file() || !is_audio(path) {
            continue;
        }

        let (title, artist) = embedded_tags(path);
        let title = title
            .filter(|title| !title.trim().is_empty())
            .unwrap_or_else(|| {
                path.file_stem()
                    .and_then(OsStr::to_str)
                    .unwrap_or("unknown")
                    .to_string()
            });

        tracks.push(Track {
            path: PathBuf::from(path),
            title,
            artist,
        });
    }

    tracks.sort_by(|a, b| a.path.cmp(&b.path));
    tracks
}

fn is_audio(path: &Path) -> bool {
    let ext = path.extension().and_then(OsStr::to_str).unwrap_or_default();
    AUDIO_EXTENSIONS
        .iter()
        .any(|supported| ext.eq_ignore_ascii_case(supported))
}

fn embedded_tags(path: &Path) -> (Option<String>, Option<String>) {
    let Ok(tagged) = Probe::open(path).and_then(|probe| probe.read()) else {
        return (None, None);
    };

    let tag = tagged.primary_tag().or_else(|| tagged.first_tag());
    let title = tag.and_then(|tag| tag.title().map(|title| title.to_string()));
    let artist = tag.and_then(|tag| tag.artist().map(|artist| artist.to_string()));
    (title, artist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::fs;
    use tempfile::tempdir;

    fn track(name: &str) -> Track {
        Track {
            path: PathBuf::from(name),
            title: String::from(name),
            artist: None,
        }
    }

    #[test]
    fn pick_random_from_empty_catalog_is_an_error() {
        let catalog = Catalog::default();
        let mut rng = SmallRng::seed_from_u64(7);
        let err = catalog.pick_random(&mut rng).expect_err("must fail");
        assert!(err.to_string().contains("catalog is empty"));
    }

    #[test]
    fn pick_random_returns_a_catalog_member() {
        let catalog = Catalog::from_tracks(vec![track("a.mp3"), track("b.mp3"), track("c.mp3")]);
        let mut rng = SmallRng::seed_from_u64(7);
        for _ in 0..32 {
            let picked = catalog.pick_random(&mut rng).expect("pick");
            assert!(catalog.tracks().contains(picked));
        }
    }

    #[test]
    fn scan_skips_non_audio_and_falls_back_to_file_stem() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("one.mp3"), b"not really audio").expect("write");
        fs::write(dir.path().join("notes.txt"), b"skip me").expect("write");
        fs::create_dir(dir.path().join("sub")).expect("mkdir");
        fs::write(dir.path().join("sub").join("two.FLAC"), b"also fake").expect("write");

        let tracks = scan_folder(dir.path());
        let mut titles: Vec<&str> = tracks.iter().map(|track| track.title.as_str()).collect();
        titles.sort_unstable();
        assert_eq!(titles, vec!["one", "two"]);
    }

    #[test]
    fn from_folders_dedups_overlapping_scans() {
        let dir = tempdir().expect("tempdir");
        fs::write(dir.path().join("one.mp3"), b"fake").expect("write");

        let folders = vec![dir.path().to_path_buf(), dir.path().to_path_buf()];
        let catalog = Catalog::from_folders(&folders);
        assert_eq!(catalog.len(), 1);
    }
}
