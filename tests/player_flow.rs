use shufflebox::catalog::Catalog;
use shufflebox::controller::{PlaybackController, TransportIcon};
use shufflebox::media::NullMediaElement;
use shufflebox::model::Track;
use std::path::PathBuf;

fn catalog() -> Catalog {
    Catalog::from_tracks(
        ["a.mp3", "b.mp3", "c.mp3"]
            .iter()
            .map(|name| Track {
                path: PathBuf::from(name),
                title: String::from(*name),
                artist: None,
            })
            .collect(),
    )
}

fn controller() -> PlaybackController {
    PlaybackController::new(catalog(), Box::new(NullMediaElement::new()), 1.0)
}

#[test]
fn first_click_starts_playback_through_the_ready_signal() {
    let mut controller = controller();
    assert_eq!(controller.icon(), TransportIcon::Play);

    controller.toggle_master();
    controller.pump_media();

    assert!(controller.started());
    assert!(controller.playing());
    assert!(!controller.loading(), "metadata event cleared loading");
    assert_eq!(controller.icon(), TransportIcon::Pause);
    assert_eq!(controller.history().len(), 1);
    assert_eq!(controller.history().cursor(), Some(0));
    assert!(!controller.can_skip_prev());
}

#[test]
fn skipping_back_and_forward_replays_history() {
    let mut controller = controller();
    controller.toggle_master();
    controller.pump_media();
    controller.skip_next();
    controller.pump_media();

    let second = controller.history().current().cloned().expect("current");
    assert_eq!(controller.history().len(), 2);

    controller.skip_prev();
    controller.pump_media();
    assert_eq!(controller.history().cursor(), Some(0));
    assert!(!controller.can_skip_prev());

    controller.skip_next();
    controller.pump_media();
    assert_eq!(controller.history().len(), 2, "forward replay, no new fetch");
    assert_eq!(controller.history().current(), Some(&second));
}

#[test]
fn pause_and_resume_follow_the_master_control() {
    let mut controller = controller();
    controller.toggle_master();
    controller.pump_media();
    assert!(controller.playing());

    controller.toggle_master();
    controller.pump_media();
    assert!(!controller.playing());
    assert_eq!(controller.icon(), TransportIcon::Play);

    controller.toggle_master();
    controller.pump_media();
    assert!(controller.playing());
    assert_eq!(controller.icon(), TransportIcon::Pause);
}

#[test]
fn volume_keys_step_by_a_tenth_and_clamp() {
    let mut controller = PlaybackController::new(catalog(), Box::new(NullMediaElement::new()), 0.5);
    controller.volume_up();
    assert!((controller.volume() - 0.6).abs() < 1e-6);

    for _ in 0..10 {
        controller.volume_up();
    }
    assert_eq!(controller.volume(), 1.0);
    assert_eq!(controller.volume_percent(), 100);
}

#[test]
fn empty_catalog_surfaces_a_queue_error() {
    let mut controller =
        PlaybackController::new(Catalog::default(), Box::new(NullMediaElement::new()), 1.0);
    controller.toggle_master();
    controller.pump_media();

    assert!(!controller.started());
    assert!(controller.status().contains("queue error"));
    assert_eq!(controller.history().len(), 0);
}
