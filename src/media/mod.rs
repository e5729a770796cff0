use anyhow::{Context, Result};
use rodio::Source;
use rodio::cpal::traits::HostTrait;
use rodio::{Decoder, DeviceSinkBuilder, MixerDeviceSink, Player};
#[cfg(unix)]
use std::ffi::CString;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Lifecycle events produced by a media engine, drained once per loop tick.
///
/// Load-related events carry the generation of the load that produced them so
/// a stale `Ready` from a superseded load can never start playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaEvent {
    LoadStart { generation: u64 },
    LoadedMetadata { generation: u64 },
    Ready { generation: u64 },
    Play,
    Pause,
    Ended,
    VolumeChange,
}

/// The platform media element, reduced to the operations the player consumes.
pub trait MediaElement {
    /// Assigns a source and requests a load. Returns the load generation;
    /// the matching `Ready` event signals the source is playable.
    fn load(&mut self, path: &Path) -> Result<u64>;
    /// Requests playback start. Rejection is recoverable, never fatal.
    fn play(&mut self) -> Result<()>;
    fn pause(&mut self);
    fn is_paused(&self) -> bool;
    fn current_source(&self) -> Option<&Path>;
    fn position(&self) -> Option<Duration>;
    fn duration(&self) -> Option<Duration>;
    fn volume(&self) -> f32;
    /// Volume is clamped to [0, 1] here; out-of-range input is not a fault.
    fn set_volume(&mut self, volume: f32);
    /// Drains pending events in production order.
    fn poll_events(&mut self) -> Vec<MediaEvent>;
}

pub struct RodioMediaElement {
    stream: MixerDeviceSink,
    sink: Player,
    current: Option<PathBuf>,
    track_duration: Option<Duration>,
    volume: f32,
    generation: u64,
    events: Vec<MediaEvent>,
}

impl RodioMediaElement {
    pub fn new() -> Result<Self> {
        let (stream, sink) = open_output_stream()?;
        Ok(Self {
            stream,
            sink,
            current: None,
            track_duration: None,
            volume: 1.0,
            generation: 0,
            events: Vec::new(),
        })
    }
}

impl MediaElement for RodioMediaElement {
    fn load(&mut self, path: &Path) -> Result<u64> {
        // Open and decode before touching any state. A failed load must
        // queue nothing: a stray LoadStart with no LoadedMetadata after it
        // would pin the loading indicator.
        let file =
            File::open(path).with_context(|| format!("failed to open track {}", path.display()))?;
        let source = Decoder::try_from(file)
            .with_context(|| format!("failed to decode {}", path.display()))?;

        self.generation += 1;
        let generation = self.generation;
        self.events.push(MediaEvent::LoadStart { generation });

        self.sink.stop();
        self.sink = Player::connect_new(self.stream.mixer());

        self.track_duration = source.total_duration();
        self.sink.append(source);
        // Loaded but held until play() is requested.
        self.sink.pause();
        self.sink.set_volume(self.volume);
        self.current = Some(path.to_path_buf());

        self.events.push(MediaEvent::LoadedMetadata { generation });
        self.events.push(MediaEvent::Ready { generation });
        Ok(generation)
    }

    fn play(&mut self) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no source loaded"));
        }
        self.sink.play();
        self.events.push(MediaEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.sink.pause();
        self.events.push(MediaEvent::Pause);
    }

    fn is_paused(&self) -> bool {
        self.sink.is_paused()
    }

    fn current_source(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.sink.get_pos())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.sink.set_volume(self.volume);
        self.events.push(MediaEvent::VolumeChange);
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        if self.current.is_some() && !self.sink.is_paused() && self.sink.empty() {
            self.current = None;
            self.track_duration = None;
            self.events.push(MediaEvent::Ended);
        }
        std::mem::take(&mut self.events)
    }
}

fn open_output_stream() -> Result<(MixerDeviceSink, Player)> {
    let mut stream = with_silenced_stderr(|| {
        match DeviceSinkBuilder::from_default_device()
            .context("failed to open default system output device")
            .and_then(|builder| {
                builder
                    .with_error_callback(|_| {})
                    .open_sink_or_fallback()
                    .context("failed to start default output stream")
            }) {
            Ok(stream) => Ok(stream),
            Err(default_err) => {
                let host = rodio::cpal::default_host();
                let mut started: Option<MixerDeviceSink> = None;
                for device in host.output_devices().ok().into_iter().flatten() {
                    let opened = DeviceSinkBuilder::from_device(device)
                        .context("failed to open fallback output device")
                        .and_then(|builder| {
                            builder
                                .with_error_callback(|_| {})
                                .open_sink_or_fallback()
                                .context("failed to start fallback output stream")
                        });
                    if let Ok(stream) = opened {
                        started = Some(stream);
                        break;
                    }
                }

                started.with_context(|| {
                    format!("unable to start any audio output stream: {default_err:#}")
                })
            }
        }
    })?;
    stream.log_on_drop(false);
    let sink = Player::connect_new(stream.mixer());
    Ok((stream, sink))
}

#[cfg(unix)]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    let saved = unsafe { libc::dup(libc::STDERR_FILENO) };
    if saved < 0 {
        return operation();
    }

    let devnull = CString::new("/dev/null")
        .ok()
        .map(|path| unsafe { libc::open(path.as_ptr(), libc::O_WRONLY) })
        .unwrap_or(-1);

    if devnull >= 0 {
        unsafe {
            libc::dup2(devnull, libc::STDERR_FILENO);
            libc::close(devnull);
        }
    }

    let result = operation();

    unsafe {
        libc::dup2(saved, libc::STDERR_FILENO);
        libc::close(saved);
    }

    result
}

#[cfg(not(unix))]
fn with_silenced_stderr<T>(operation: impl FnOnce() -> T) -> T {
    operation()
}

/// Headless engine: used when no output device is available and as the
/// deterministic engine in tests. Keeps a synthetic playback clock.
pub struct NullMediaElement {
    paused: bool,
    current: Option<PathBuf>,
    volume: f32,
    generation: u64,
    started_at: Option<Instant>,
    position_offset: Duration,
    track_duration: Option<Duration>,
    events: Vec<MediaEvent>,
}

impl NullMediaElement {
    pub fn new() -> Self {
        Self {
            paused: false,
            current: None,
            volume: 1.0,
            generation: 0,
            started_at: None,
            position_offset: Duration::ZERO,
            track_duration: None,
            events: Vec::new(),
        }
    }

    fn estimate_duration(path: &Path) -> Option<Duration> {
        let file = File::open(path).ok()?;
        let source = Decoder::try_from(file).ok()?;
        source
            .total_duration()
            .filter(|duration| !duration.is_zero())
    }

    fn current_position(&self) -> Duration {
        let mut position = self.position_offset;
        if !self.paused
            && self.current.is_some()
            && let Some(started_at) = self.started_at
        {
            position = position.saturating_add(started_at.elapsed());
        }
        if let Some(duration) = self.track_duration {
            return position.min(duration);
        }
        position
    }

    fn has_ended(&self) -> bool {
        let Some(duration) = self.track_duration else {
            return false;
        };
        self.current.is_some() && !self.paused && self.current_position() >= duration
    }
}

impl Default for NullMediaElement {
    fn default() -> Self {
        Self::new()
    }
}

impl MediaElement for NullMediaElement {
    fn load(&mut self, path: &Path) -> Result<u64> {
        self.generation += 1;
        let generation = self.generation;
        self.events.push(MediaEvent::LoadStart { generation });

        self.paused = true;
        self.current = Some(path.to_path_buf());
        self.started_at = None;
        self.position_offset = Duration::ZERO;
        self.track_duration = Self::estimate_duration(path);

        self.events.push(MediaEvent::LoadedMetadata { generation });
        self.events.push(MediaEvent::Ready { generation });
        Ok(generation)
    }

    fn play(&mut self) -> Result<()> {
        if self.current.is_none() {
            return Err(anyhow::anyhow!("no source loaded"));
        }
        self.started_at = Some(Instant::now());
        self.paused = false;
        self.events.push(MediaEvent::Play);
        Ok(())
    }

    fn pause(&mut self) {
        self.position_offset = self.current_position();
        self.started_at = None;
        self.paused = true;
        self.events.push(MediaEvent::Pause);
    }

    fn is_paused(&self) -> bool {
        self.paused
    }

    fn current_source(&self) -> Option<&Path> {
        self.current.as_deref()
    }

    fn position(&self) -> Option<Duration> {
        self.current.as_ref()?;
        Some(self.current_position())
    }

    fn duration(&self) -> Option<Duration> {
        self.track_duration
    }

    fn volume(&self) -> f32 {
        self.volume
    }

    fn set_volume(&mut self, volume: f32) {
        self.volume = volume.clamp(0.0, 1.0);
        self.events.push(MediaEvent::VolumeChange);
    }

    fn poll_events(&mut self) -> Vec<MediaEvent> {
        if self.has_ended() {
            self.current = None;
            self.track_duration = None;
            self.started_at = None;
            self.position_offset = Duration::ZERO;
            self.events.push(MediaEvent::Ended);
        }
        std::mem::take(&mut self.events)
    }
}
