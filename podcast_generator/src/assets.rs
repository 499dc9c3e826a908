//! Incidental audio assets: short fixed clips layered around narration.
//!
//! Assets resolve against a short ordered list of base directories so
//! the same logical name works across deployment layouts. A miss on
//! every candidate yields an empty buffer, which the mixer treats as
//! "layer absent" rather than an error.
use rand::Rng;
use std::path::PathBuf;

pub const INTRO_STINGERS: &[&str] =
    &["Opening Bell.wav", "Morning Brief Sting.wav"];

pub const INTRO_TRACKS: &[&str] =
    &["Ticker Tape Theme.wav", "Blue Chip Groove.wav"];

pub const OUTRO_TRACKS: &[&str] =
    &["Ticker Tape Theme.wav", "Blue Chip Groove.wav"];

const DEFAULT_ASSET_DIRS: &[&str] =
    &["/opt/marketcast/audio", "./assets/audio", "./audio"];

/// How a track is picked from a catalog. The default is uniform random;
/// tests inject a deterministic selector.
pub trait TrackSelector: Send + Sync {
    fn pick<'a>(&self, catalog: &'a [&'a str]) -> &'a str;
}

pub struct UniformRandom;

impl TrackSelector for UniformRandom {
    fn pick<'a>(&self, catalog: &'a [&'a str]) -> &'a str {
        catalog[rand::thread_rng().gen_range(0..catalog.len())]
    }
}

pub trait AssetSource {
    fn pick_intro_stinger(&self) -> String;
    fn pick_intro_track(&self) -> String;
    fn pick_outro_track(&self) -> String;

    /// Load a named asset, or an empty buffer when it cannot be found.
    async fn load(&self, name: &str) -> Vec<u8>;
}

pub struct AssetLoader {
    base_dirs: Vec<PathBuf>,
    selector: Box<dyn TrackSelector>,
}

impl AssetLoader {
    #[must_use]
    pub fn new(
        base_dirs: Vec<PathBuf>,
        selector: Box<dyn TrackSelector>,
    ) -> Self {
        Self {
            base_dirs,
            selector,
        }
    }

    #[must_use]
    pub fn with_default_dirs(selector: Box<dyn TrackSelector>) -> Self {
        Self::new(
            DEFAULT_ASSET_DIRS.iter().map(PathBuf::from).collect(),
            selector,
        )
    }
}

impl AssetSource for AssetLoader {
    fn pick_intro_stinger(&self) -> String {
        self.selector.pick(INTRO_STINGERS).to_string()
    }

    fn pick_intro_track(&self) -> String {
        self.selector.pick(INTRO_TRACKS).to_string()
    }

    fn pick_outro_track(&self) -> String {
        self.selector.pick(OUTRO_TRACKS).to_string()
    }

    async fn load(&self, name: &str) -> Vec<u8> {
        for dir in &self.base_dirs {
            let path = dir.join(name);
            match tokio::fs::read(&path).await {
                Ok(bytes) => {
                    tracing::debug!(
                        "loaded audio asset from {}",
                        path.display()
                    );
                    return bytes;
                }
                Err(e) => {
                    tracing::debug!(
                        "no audio asset at {}: {e}",
                        path.display()
                    );
                }
            }
        }

        tracing::warn!(
            "audio asset {name} not found in any candidate directory, \
mixing without it"
        );
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Always picks the first catalog entry.
    struct FirstTrack;

    impl TrackSelector for FirstTrack {
        fn pick<'a>(&self, catalog: &'a [&'a str]) -> &'a str {
            catalog[0]
        }
    }

    #[test]
    fn selection_is_pluggable_and_deterministic() {
        let loader = AssetLoader::with_default_dirs(Box::new(FirstTrack));
        assert_eq!(loader.pick_intro_stinger(), INTRO_STINGERS[0]);
        assert_eq!(loader.pick_intro_track(), INTRO_TRACKS[0]);
        assert_eq!(loader.pick_outro_track(), OUTRO_TRACKS[0]);
    }

    #[test]
    fn uniform_random_stays_inside_the_catalog() {
        let selector = UniformRandom;
        for _ in 0..50 {
            let name = selector.pick(INTRO_TRACKS);
            assert!(INTRO_TRACKS.contains(&name));
        }
    }

    #[tokio::test]
    async fn load_falls_through_candidate_directories() {
        let missing = tempfile::tempdir().unwrap();
        let present = tempfile::tempdir().unwrap();
        std::fs::write(present.path().join("bed.wav"), b"audio bytes")
            .unwrap();

        let loader = AssetLoader::new(
            vec![missing.path().to_path_buf(), present.path().to_path_buf()],
            Box::new(FirstTrack),
        );

        assert_eq!(loader.load("bed.wav").await, b"audio bytes");
    }

    #[tokio::test]
    async fn load_returns_empty_buffer_when_exhausted() {
        let empty = tempfile::tempdir().unwrap();
        let loader = AssetLoader::new(
            vec![empty.path().to_path_buf()],
            Box::new(FirstTrack),
        );

        assert!(loader.load("nowhere.wav").await.is_empty());
    }
}
