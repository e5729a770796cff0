use crate::catalog::Catalog;
use crate::history::PlayHistory;
use crate::media::{MediaElement, MediaEvent};
use crate::model::Track;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

pub const VOLUME_STEP: f32 = 0.1;

const MARQUEE_HOLD: Duration = Duration::from_secs(3);
const MARQUEE_STEP: Duration = Duration::from_millis(250);
const MARQUEE_GAP: &str = "   ";

/// Which transport glyph to show. A pure function of controller state,
/// recomputed every frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportIcon {
    Play,
    Pause,
    Loading,
}

/// Owns the play history, the catalog, the media engine, and every transient
/// player flag. Presentation reads it through the view methods; nothing else
/// mutates playback state.
pub struct PlaybackController {
    history: PlayHistory,
    catalog: Catalog,
    media: Box<dyn MediaElement>,
    rng: SmallRng,
    started: bool,
    playing: bool,
    loading: bool,
    awaiting_ready: Option<u64>,
    status: String,
    marquee: Marquee,
    dirty: Rc<Cell<bool>>,
}

impl PlaybackController {
    pub fn new(catalog: Catalog, media: Box<dyn MediaElement>, saved_volume: f32) -> Self {
        let mut controller = Self {
            history: PlayHistory::new(),
            catalog,
            media,
            rng: SmallRng::from_os_rng(),
            started: false,
            playing: false,
            loading: false,
            awaiting_ready: None,
            status: String::from("Ready"),
            marquee: Marquee::new(),
            dirty: Rc::new(Cell::new(true)),
        };

        let dirty = Rc::clone(&controller.dirty);
        controller.history.subscribe(move |_| dirty.set(true));
        controller.media.set_volume(saved_volume.clamp(0.0, 1.0));
        controller
    }

    /// Master control. First activation seeds the queue with one random track
    /// and requests playback; afterwards it toggles pause/resume. Inert while
    /// a load is in flight.
    pub fn toggle_master(&mut self) {
        if self.loading {
            return;
        }

        if !self.started {
            if self.advance() {
                self.started = true;
                self.playing = true;
            }
            self.mark_dirty();
            return;
        }

        if self.media.is_paused() {
            match self.media.play() {
                Ok(()) => self.playing = true,
                Err(err) => self.status = format!("playback error: {err:#}"),
            }
        } else {
            self.media.pause();
            self.playing = false;
        }
        self.mark_dirty();
    }

    /// Skip forward. A no-op until the first track has been queued.
    pub fn skip_next(&mut self) {
        if self.history.is_empty() {
            return;
        }
        // Skipping implies playback; the media events correct this if the
        // start request is rejected.
        self.playing = true;
        self.advance();
        self.mark_dirty();
    }

    /// Skip backward. The history guards against moving before the start.
    pub fn skip_prev(&mut self) {
        let track = self.history.go_to_prev().cloned();
        if let Some(track) = track {
            self.start_track(&track);
        }
    }

    pub fn volume_up(&mut self) {
        self.step_volume(VOLUME_STEP);
    }

    pub fn volume_down(&mut self) {
        self.step_volume(-VOLUME_STEP);
    }

    fn step_volume(&mut self, delta: f32) {
        let next = (self.media.volume() + delta).clamp(0.0, 1.0);
        self.media.set_volume(next);
        self.mark_dirty();
    }

    /// Drains media events and applies them to the transient state. Called
    /// once per event-loop iteration.
    pub fn pump_media(&mut self) {
        for event in self.media.poll_events() {
            match event {
                MediaEvent::LoadStart { generation } => {
                    // No loading UI before the first interaction, and none
                    // for a load that already failed or was superseded.
                    if self.started && self.awaiting_ready == Some(generation) {
                        self.loading = true;
                    }
                }
                MediaEvent::LoadedMetadata { generation } => {
                    if self.awaiting_ready == Some(generation) {
                        self.loading = false;
                    }
                }
                MediaEvent::Ready { generation } => {
                    if self.awaiting_ready == Some(generation) {
                        self.awaiting_ready = None;
                        match self.media.play() {
                            Ok(()) => self.playing = true,
                            Err(err) => self.status = format!("playback error: {err:#}"),
                        }
                    }
                }
                MediaEvent::Play => self.playing = true,
                MediaEvent::Pause => self.playing = false,
                MediaEvent::Ended => {
                    self.advance();
                }
                MediaEvent::VolumeChange => {}
            }
            self.mark_dirty();
        }
    }

    /// Advances the marquee. Returns nothing; redraws are driven by the
    /// dirty flag.
    pub fn tick(&mut self) {
        if self.marquee.tick() {
            self.mark_dirty();
        }
    }

    fn advance(&mut self) -> bool {
        let track = match self.history.go_to_next(&self.catalog, &mut self.rng) {
            Ok(track) => track.clone(),
            Err(err) => {
                self.status = format!("queue error: {err:#}");
                self.loading = false;
                self.mark_dirty();
                return false;
            }
        };
        self.start_track(&track);
        true
    }

    fn start_track(&mut self, track: &Track) {
        self.marquee.set_text(track.info_line());
        self.status = format!("Now playing: {}", track.info_line());
        match self.media.load(&track.path) {
            Ok(generation) => {
                // One-shot: cleared when the matching Ready arrives; a stale
                // Ready from a superseded load never matches.
                self.awaiting_ready = Some(generation);
            }
            Err(err) => {
                self.awaiting_ready = None;
                self.loading = false;
                self.status = format!("load error: {err:#}");
            }
        }
        self.mark_dirty();
    }

    fn mark_dirty(&self) {
        self.dirty.set(true);
    }

    pub fn take_dirty(&self) -> bool {
        self.dirty.replace(false)
    }

    // View methods for presentation.

    pub fn icon(&self) -> TransportIcon {
        if self.loading {
            TransportIcon::Loading
        } else if self.playing {
            TransportIcon::Pause
        } else {
            TransportIcon::Play
        }
    }

    pub fn history(&self) -> &PlayHistory {
        &self.history
    }

    pub fn can_skip_prev(&self) -> bool {
        self.history.can_skip_prev()
    }

    pub fn can_skip_next(&self) -> bool {
        !self.history.is_empty()
    }

    pub fn started(&self) -> bool {
        self.started
    }

    pub fn playing(&self) -> bool {
        self.playing
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn catalog_len(&self) -> usize {
        self.catalog.len()
    }

    pub fn volume(&self) -> f32 {
        self.media.volume()
    }

    pub fn volume_percent(&self) -> u16 {
        (self.media.volume() * 100.0).round() as u16
    }

    pub fn position(&self) -> Option<Duration> {
        self.media.position()
    }

    pub fn duration(&self) -> Option<Duration> {
        self.media.duration()
    }

    pub fn marquee_view(&self, width: usize) -> String {
        self.marquee.view(width)
    }
}

/// Scrolling window over the track-info line. On a track change the offset
/// resets and holds for a fixed delay before scrolling resumes; purely
/// cosmetic timing.
struct Marquee {
    text: String,
    offset: usize,
    hold_until: Option<Instant>,
    last_step: Instant,
}

impl Marquee {
    fn new() -> Self {
        Self {
            text: String::new(),
            offset: 0,
            hold_until: None,
            last_step: Instant::now(),
        }
    }

    fn set_text(&mut self, text: String) {
        self.text = text;
        self.offset = 0;
        self.hold_until = Some(Instant::now() + MARQUEE_HOLD);
        self.last_step = Instant::now();
    }

    fn tick(&mut self) -> bool {
        if self.text.is_empty() {
            return false;
        }
        if let Some(hold) = self.hold_until {
            if Instant::now() < hold {
                return false;
            }
            self.hold_until = None;
        }
        if self.last_step.elapsed() < MARQUEE_STEP {
            return false;
        }
        self.last_step = Instant::now();
        let cycle = self.text.chars().count() + MARQUEE_GAP.chars().count();
        self.offset = (self.offset + 1) % cycle;
        true
    }

    fn view(&self, width: usize) -> String {
        if width == 0 || self.text.is_empty() {
            return String::new();
        }
        let chars: Vec<char> = self.text.chars().collect();
        if chars.len() <= width {
            return self.text.clone();
        }
        let cycle: Vec<char> = chars
            .into_iter()
            .chain(MARQUEE_GAP.chars())
            .collect();
        (0..width)
            .map(|idx| cycle[(self.offset + idx) % cycle.len()])
            .collect()
    }
}
