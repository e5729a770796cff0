#![no_main]

use libfuzzer_sys::fuzz_target;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use shufflebox::catalog::Catalog;
use shufflebox::history::PlayHistory;
use shufflebox::model::Track;
use std::path::PathBuf;

fuzz_target!(|data: &[u8]| {
    let catalog = Catalog::from_tracks(
        (0..8)
            .map(|idx| Track {
                path: PathBuf::from(format!("track_{idx}.mp3")),
                title: format!("track_{idx}"),
                artist: None,
            })
            .collect(),
    );
    let mut rng = SmallRng::seed_from_u64(data.len() as u64);
    let mut history = PlayHistory::new();

    for byte in data {
        match byte % 3 {
            0 => {
                let _ = history.go_to_next(&catalog, &mut rng);
            }
            1 => {
                let _ = history.go_to_prev();
            }
            _ => {
                let _ = history.add_random_track(&catalog, &mut rng);
            }
        }

        if let Some(cursor) = history.cursor() {
            assert!(cursor < history.len());
        }
    }
});
