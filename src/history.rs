use crate::catalog::Catalog;
use crate::model::Track;
use anyhow::Result;
use rand::rngs::SmallRng;
use std::fmt;

/// Snapshot handed to change subscribers after every queue mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryChange {
    pub len: usize,
    pub cursor: Option<usize>,
}

type Subscriber = Box<dyn FnMut(HistoryChange)>;

/// Ordered play history with a current-position cursor.
///
/// The track list is append-only and doubles as backward history and forward
/// lookahead: advancing past the end lazily appends a random catalog pick
/// instead of pre-generating a playlist. Growth over a long session is
/// unbounded; that tradeoff is accepted.
#[derive(Default)]
pub struct PlayHistory {
    tracks: Vec<Track>,
    cursor: Option<usize>,
    subscribers: Vec<Subscriber>,
}

impl fmt::Debug for PlayHistory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PlayHistory")
            .field("tracks", &self.tracks)
            .field("cursor", &self.cursor)
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl PlayHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a change subscriber. Subscribers are notified in
    /// registration order after every mutation.
    pub fn subscribe(&mut self, subscriber: impl FnMut(HistoryChange) + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    /// `None` until the first track starts playing.
    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn current(&self) -> Option<&Track> {
        self.tracks.get(self.cursor?)
    }

    pub fn can_skip_prev(&self) -> bool {
        self.cursor.is_some_and(|cursor| cursor > 0)
    }

    /// Appends a uniformly random catalog track and notifies subscribers.
    /// Does not move the cursor.
    pub fn add_random_track(&mut self, catalog: &Catalog, rng: &mut SmallRng) -> Result<()> {
        let track = catalog.pick_random(rng)?.clone();
        self.tracks.push(track);
        self.notify();
        Ok(())
    }

    /// Moves the cursor back one track. A no-op (no cursor change, no
    /// notification) when there is no previous track.
    pub fn go_to_prev(&mut self) -> Option<&Track> {
        let cursor = self.cursor?;
        if cursor == 0 || self.tracks.is_empty() {
            return None;
        }
        self.cursor = Some(cursor - 1);
        self.notify();
        self.current()
    }

    /// Advances the cursor, appending a random track when moving past the
    /// end. Returns the track now at the cursor so the caller can start
    /// playback. On an empty catalog the cursor is left untouched.
    pub fn go_to_next(&mut self, catalog: &Catalog, rng: &mut SmallRng) -> Result<&Track> {
        let next = self.cursor.map_or(0, |cursor| cursor + 1);
        if next < self.tracks.len() {
            self.cursor = Some(next);
            self.notify();
        } else {
            let track = catalog.pick_random(rng)?.clone();
            self.tracks.push(track);
            self.cursor = Some(next);
            self.notify();
        }
        Ok(&self.tracks[next])
    }

    fn notify(&mut self) {
        let change = HistoryChange {
            len: self.tracks.len(),
            cursor: self.cursor,
        };
        for subscriber in &mut self.subscribers {
            subscriber(change);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use std::cell::{Cell, RefCell};
    use std::path::PathBuf;
    use std::rc::Rc;

    fn catalog(names: &[&str]) -> Catalog {
        Catalog::from_tracks(
            names
                .iter()
                .map(|name| Track {
                    path: PathBuf::from(name),
                    title: String::from(*name),
                    artist: None,
                })
                .collect(),
        )
    }

    fn rng() -> SmallRng {
        SmallRng::seed_from_u64(42)
    }

    #[test]
    fn next_appends_one_track_per_call_and_tracks_cursor() {
        let catalog = catalog(&["a.mp3", "b.mp3", "c.mp3"]);
        let mut rng = rng();
        let mut history = PlayHistory::new();

        for call in 1..=5 {
            history.go_to_next(&catalog, &mut rng).expect("next");
            assert_eq!(history.len(), call);
            assert_eq!(history.cursor(), Some(call - 1));
        }
    }

    #[test]
    fn prev_is_a_noop_at_the_start() {
        let catalog = catalog(&["a.mp3"]);
        let mut rng = rng();
        let mut history = PlayHistory::new();

        let notified = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&notified);
        history.subscribe(move |_| counter.set(counter.get() + 1));

        assert!(history.go_to_prev().is_none(), "empty history");
        assert_eq!(notified.get(), 0);

        history.go_to_next(&catalog, &mut rng).expect("next");
        let after_next = notified.get();
        assert!(history.go_to_prev().is_none(), "cursor already at zero");
        assert_eq!(history.cursor(), Some(0));
        assert_eq!(notified.get(), after_next, "no-op must not notify");
    }

    #[test]
    fn next_behind_the_end_reuses_the_existing_track() {
        let catalog = catalog(&["a.mp3", "b.mp3", "c.mp3"]);
        let mut rng = rng();
        let mut history = PlayHistory::new();

        history.go_to_next(&catalog, &mut rng).expect("next");
        history.go_to_next(&catalog, &mut rng).expect("next");
        let second = history.current().expect("current").clone();

        history.go_to_prev().expect("prev");
        assert_eq!(history.cursor(), Some(0));
        assert!(!history.can_skip_prev());

        let replayed = history.go_to_next(&catalog, &mut rng).expect("next").clone();
        assert_eq!(history.len(), 2, "no third track fetched");
        assert_eq!(replayed, second);
    }

    #[test]
    fn next_with_empty_catalog_fails_and_leaves_state_untouched() {
        let catalog = Catalog::default();
        let mut rng = rng();
        let mut history = PlayHistory::new();

        let notified = Rc::new(Cell::new(0usize));
        let counter = Rc::clone(&notified);
        history.subscribe(move |_| counter.set(counter.get() + 1));

        assert!(history.go_to_next(&catalog, &mut rng).is_err());
        assert_eq!(history.cursor(), None);
        assert_eq!(history.len(), 0);
        assert_eq!(notified.get(), 0);
    }

    #[test]
    fn subscribers_are_notified_in_registration_order() {
        let catalog = catalog(&["a.mp3"]);
        let mut rng = rng();
        let mut history = PlayHistory::new();

        let order = Rc::new(RefCell::new(Vec::new()));
        for id in 0..3 {
            let order = Rc::clone(&order);
            history.subscribe(move |change| order.borrow_mut().push((id, change.len)));
        }

        history.go_to_next(&catalog, &mut rng).expect("next");
        assert_eq!(&*order.borrow(), &[(0, 1), (1, 1), (2, 1)]);
    }

    #[test]
    fn change_snapshot_reflects_the_new_cursor() {
        let catalog = catalog(&["a.mp3"]);
        let mut rng = rng();
        let mut history = PlayHistory::new();

        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        history.subscribe(move |change| sink.borrow_mut().push(change));

        history.go_to_next(&catalog, &mut rng).expect("next");
        history.go_to_next(&catalog, &mut rng).expect("next");
        history.go_to_prev().expect("prev");

        assert_eq!(
            &*seen.borrow(),
            &[
                HistoryChange {
                    len: 1,
                    cursor: Some(0)
                },
                HistoryChange {
                    len: 2,
                    cursor: Some(1)
                },
                HistoryChange {
                    len: 2,
                    cursor: Some(0)
                },
            ]
        );
    }

    proptest::proptest! {
        #[test]
        fn cursor_stays_in_bounds_after_random_ops(ops in proptest::collection::vec(0u8..3, 1..200)) {
            let catalog = catalog(&["a.mp3", "b.mp3", "c.mp3", "d.mp3"]);
            let mut rng = rng();
            let mut history = PlayHistory::new();
            let mut appends = 0usize;

            for op in ops {
                match op {
                    0 => {
                        history.go_to_next(&catalog, &mut rng).expect("next");
                    }
                    1 => {
                        let _ = history.go_to_prev();
                    }
                    _ => {
                        history.add_random_track(&catalog, &mut rng).expect("add");
                        appends += 1;
                    }
                }

                if let Some(cursor) = history.cursor() {
                    proptest::prop_assert!(cursor < history.len());
                }
            }

            proptest::prop_assert!(history.len() >= appends);
        }
    }
}
