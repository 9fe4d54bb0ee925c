//! End-to-end scenarios for the playback state machine
//!
//! The engine is driven exactly as the control loop drives it: user calls
//! interleaved with device events, with a recording device standing in for
//! real audio output.

mod common;

use cadence_playback::{DeviceEvent, DeviceEventKind, PlaybackEvent, PlaybackStatus};
use common::*;

// ============================================================================
// LOAD RACES
// ============================================================================

#[test]
fn test_stale_load_discarded_when_first_load_finishes_late() {
    let (mut engine, device) = create_engine();

    engine.play(Some(create_test_track("a")));
    engine.play(Some(create_test_track("b")));

    let gen_a = device.generation_of(&source_of("a")).unwrap();
    let gen_b = device.generation_of(&source_of("b")).unwrap();
    assert!(gen_b > gen_a);

    // B completes first, then A's late completion arrives
    engine.handle_device_event(DeviceEvent::new(gen_b, DeviceEventKind::Loaded));
    engine.handle_device_event(DeviceEvent::new(gen_b, DeviceEventKind::Started));
    engine.handle_device_event(DeviceEvent::new(gen_a, DeviceEventKind::Loaded));
    engine.handle_device_event(DeviceEvent::new(gen_a, DeviceEventKind::DurationKnown(3.0)));
    engine.handle_device_event(DeviceEvent::new(gen_a, DeviceEventKind::Finished));

    let state = engine.state();
    assert_eq!(state.current_track_id().unwrap().as_str(), "b");
    assert_eq!(state.status, PlaybackStatus::Playing);
    assert_eq!(state.duration, None);

    // Only B was ever asked to start
    let plays = device
        .calls()
        .iter()
        .filter(|call| **call == DeviceCall::Play)
        .count();
    assert_eq!(plays, 1);
}

#[test]
fn test_stale_load_discarded_when_first_load_finishes_early() {
    let (mut engine, device) = create_engine();

    engine.play(Some(create_test_track("a")));
    let gen_a = engine.generation();
    engine.play(Some(create_test_track("b")));
    let gen_b = engine.generation();

    engine.handle_device_event(DeviceEvent::new(gen_a, DeviceEventKind::Loaded));
    engine.handle_device_event(DeviceEvent::new(gen_a, DeviceEventKind::Started));
    assert_eq!(engine.state().status, PlaybackStatus::Loading);

    engine.handle_device_event(DeviceEvent::new(gen_b, DeviceEventKind::Loaded));
    engine.handle_device_event(DeviceEvent::new(gen_b, DeviceEventKind::Started));

    assert_eq!(engine.state().current_track_id().unwrap().as_str(), "b");
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
    assert_eq!(engine.queue().current_index(), Some(1));
    assert!(device.calls().contains(&DeviceCall::Play));
}

#[test]
fn test_stale_events_do_not_notify() {
    let (mut engine, _device) = create_engine();
    engine.play(Some(create_test_track("a")));
    let gen_a = engine.generation();
    engine.play(Some(create_test_track("b")));

    let events = record_events(&mut engine);
    engine.handle_device_event(DeviceEvent::new(gen_a, DeviceEventKind::TimeAdvanced(1.0)));

    assert!(events.lock().unwrap().is_empty());
}

// ============================================================================
// PAUSE / RESUME
// ============================================================================

#[test]
fn test_pause_waits_for_device_confirmation() {
    let (mut engine, device) = create_engine();
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);

    engine.pause();
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
    assert_eq!(device.calls().last(), Some(&DeviceCall::Pause));

    device_says(&mut engine, DeviceEventKind::Paused);
    assert_eq!(engine.state().status, PlaybackStatus::Paused);
}

#[test]
fn test_double_pause_is_harmless() {
    let (mut engine, device) = create_engine();
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);

    engine.pause();
    device_says(&mut engine, DeviceEventKind::Paused);
    device.clear();
    engine.pause();

    assert!(device.calls().is_empty());
    assert_eq!(engine.state().status, PlaybackStatus::Paused);
}

#[test]
fn test_resume_after_pause_asks_device() {
    let (mut engine, device) = create_engine();
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);
    engine.pause();
    device_says(&mut engine, DeviceEventKind::Paused);
    device.clear();

    engine.play(None);
    assert_eq!(device.calls(), vec![DeviceCall::Play]);
    assert_eq!(engine.state().status, PlaybackStatus::Paused);

    device_says(&mut engine, DeviceEventKind::Started);
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
}

#[test]
fn test_pause_during_load_keeps_device_silent() {
    let (mut engine, device) = create_engine();
    let events = record_events(&mut engine);
    engine.play(Some(create_test_track("a")));

    engine.pause();
    device_says(&mut engine, DeviceEventKind::Loaded);

    assert!(!device.calls().contains(&DeviceCall::Play));
    assert_eq!(engine.state().status, PlaybackStatus::Paused);
    assert_eq!(events.lock().unwrap().len(), 2);

    engine.play(None);
    assert_eq!(device.calls().last(), Some(&DeviceCall::Play));
    device_says(&mut engine, DeviceEventKind::Started);
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
}

#[test]
fn test_play_during_load_withdraws_held_pause() {
    let (mut engine, device) = create_engine();
    engine.play(Some(create_test_track("a")));

    engine.pause();
    engine.play(None);
    device_says(&mut engine, DeviceEventKind::Loaded);

    assert_eq!(device.calls().last(), Some(&DeviceCall::Play));
    assert_eq!(engine.state().status, PlaybackStatus::Loading);
}

#[test]
fn test_held_pause_does_not_carry_to_next_load() {
    let (mut engine, device) = create_engine();
    engine.play(Some(create_test_track("a")));
    engine.pause();

    engine.play(Some(create_test_track("b")));
    device_says(&mut engine, DeviceEventKind::Loaded);

    assert_eq!(device.calls().last(), Some(&DeviceCall::Play));
    assert_eq!(engine.state().current_track_id().unwrap().as_str(), "b");
}

#[test]
fn test_resume_after_stop_keeps_queue_position_with_repeated_ids() {
    let (mut engine, _device) = create_engine();
    engine.play_queue(
        vec![
            create_test_track("a"),
            create_test_track("b"),
            create_test_track("a"),
            create_test_track("c"),
        ],
        3,
    );
    start_current(&mut engine);
    assert_eq!(engine.queue().len(), 3);

    engine.stop();
    engine.play(None);

    assert_eq!(engine.queue().current_index(), Some(2));
    assert_eq!(engine.state().current_track_id().unwrap().as_str(), "c");
    assert_eq!(engine.state().status, PlaybackStatus::Loading);
}

#[test]
fn test_play_same_track_while_playing_is_noop() {
    let (mut engine, device) = create_engine();
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);
    let generation = engine.generation();
    device.clear();

    engine.play(Some(create_test_track("a")));

    assert!(device.calls().is_empty());
    assert_eq!(engine.generation(), generation);
    assert_eq!(engine.queue().len(), 1);
}

#[test]
fn test_play_already_queued_track_selects_it() {
    let (mut engine, device) = create_engine();
    engine.play_queue(
        vec![
            create_test_track("a"),
            create_test_track("b"),
            create_test_track("c"),
        ],
        0,
    );
    start_current(&mut engine);

    engine.play(Some(create_test_track("c")));

    assert_eq!(engine.queue().len(), 3);
    assert_eq!(engine.queue().current_index(), Some(2));
    assert_eq!(engine.state().status, PlaybackStatus::Loading);
    assert_eq!(device.generation_of(&source_of("c")), Some(engine.generation()));
}

// ============================================================================
// SEEK
// ============================================================================

#[test]
fn test_seek_position_moves_only_on_device_report() {
    let (mut engine, device) = create_engine();
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);
    device_says(&mut engine, DeviceEventKind::TimeAdvanced(5.0));

    engine.seek(42.0);
    assert_eq!(engine.state().position, 5.0);
    assert_eq!(device.calls().last(), Some(&DeviceCall::Seek(42.0)));

    device_says(&mut engine, DeviceEventKind::TimeAdvanced(42.0));
    assert_eq!(engine.state().position, 42.0);
}

#[test]
fn test_seek_without_duration_only_clamps_below() {
    let (mut engine, device) = create_engine();
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);

    engine.seek(10_000.0);
    engine.seek(-3.0);
    engine.seek(f64::NAN);

    let seeks: Vec<DeviceCall> = device
        .calls()
        .into_iter()
        .filter(|call| matches!(call, DeviceCall::Seek(_)))
        .collect();
    assert_eq!(seeks, vec![DeviceCall::Seek(10_000.0), DeviceCall::Seek(0.0)]);
}

// ============================================================================
// AUTO-ADVANCE
// ============================================================================

#[test]
fn test_auto_advance_to_next_track() {
    let (mut engine, device) = create_engine();
    engine.play_queue(
        vec![
            create_test_track("a").with_duration(3.0),
            create_test_track("b").with_duration(4.0),
        ],
        0,
    );
    start_current(&mut engine);
    let events = record_events(&mut engine);

    device_says(&mut engine, DeviceEventKind::Finished);

    assert_eq!(engine.state().status, PlaybackStatus::Loading);
    assert_eq!(engine.state().current_track_id().unwrap().as_str(), "b");
    assert_eq!(engine.state().duration, Some(4.0));
    assert_eq!(engine.queue().current_index(), Some(1));
    assert_eq!(events.lock().unwrap().len(), 1);

    start_current(&mut engine);
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
    assert_eq!(device.generation_of(&source_of("b")), Some(engine.generation()));
}

#[test]
fn test_end_of_queue() {
    let (mut engine, device) = create_engine();
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);

    device_says(&mut engine, DeviceEventKind::Finished);

    assert_eq!(engine.state().status, PlaybackStatus::Ended);
    assert_eq!(engine.state().current_track_id().unwrap().as_str(), "a");
    assert_eq!(device.calls().last(), Some(&DeviceCall::Stop));

    // Nothing further happens on its own
    device.clear();
    device_says(&mut engine, DeviceEventKind::Finished);
    engine.play(None);
    assert!(device.calls().is_empty());
    assert_eq!(engine.state().status, PlaybackStatus::Ended);
}

#[test]
fn test_explicit_play_after_end_restarts() {
    let (mut engine, _device) = create_engine();
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);
    device_says(&mut engine, DeviceEventKind::Finished);

    engine.play(Some(create_test_track("a")));

    assert_eq!(engine.state().status, PlaybackStatus::Loading);
    assert_eq!(engine.queue().len(), 1);
}

#[test]
fn test_previous_moves_back_and_stops_at_start() {
    let (mut engine, device) = create_engine();
    engine.play_queue(vec![create_test_track("a"), create_test_track("b")], 1);
    start_current(&mut engine);

    engine.previous();
    assert_eq!(engine.queue().current_index(), Some(0));
    assert_eq!(engine.state().current_track_id().unwrap().as_str(), "a");

    start_current(&mut engine);
    device.clear();
    engine.previous();

    // At the first track: restart in place
    assert_eq!(device.calls(), vec![DeviceCall::Seek(0.0)]);
    assert_eq!(engine.queue().current_index(), Some(0));
}

// ============================================================================
// VOLUME
// ============================================================================

#[test]
fn test_mute_round_trip_restores_volume() {
    let (mut engine, device) = create_engine();

    engine.set_volume(0.7);
    engine.toggle_mute();
    assert!(engine.state().muted);
    assert_eq!(engine.state().volume, 0.7);

    engine.toggle_mute();
    assert!(!engine.state().muted);
    assert_eq!(engine.state().volume, 0.7);

    assert_eq!(
        device.calls(),
        vec![
            DeviceCall::SetVolume(0.7),
            DeviceCall::SetVolume(0.0),
            DeviceCall::SetVolume(0.7),
        ]
    );
}

#[test]
fn test_volume_is_clamped() {
    let (mut engine, _device) = create_engine();
    engine.set_volume(3.0);
    assert_eq!(engine.state().volume, 1.0);
    engine.set_volume(f32::NAN);
    assert_eq!(engine.state().volume, 1.0);
}

// ============================================================================
// QUEUE MUTATION WHILE PLAYING
// ============================================================================

#[test]
fn test_remove_current_while_playing_starts_follower() {
    let (mut engine, device) = create_engine();
    engine.play_queue(
        vec![
            create_test_track("a"),
            create_test_track("b"),
            create_test_track("c"),
        ],
        1,
    );
    start_current(&mut engine);

    engine.remove_at(1);

    assert_eq!(engine.queue().len(), 2);
    assert_eq!(engine.state().current_track_id().unwrap().as_str(), "c");
    assert_eq!(engine.state().status, PlaybackStatus::Loading);
    assert!(device.calls().contains(&DeviceCall::Stop));
}

#[test]
fn test_remove_current_last_track_goes_idle() {
    let (mut engine, _device) = create_engine();
    engine.play_queue(vec![create_test_track("a"), create_test_track("b")], 1);
    start_current(&mut engine);
    let stale = engine.generation();

    engine.remove_at(1);

    assert_eq!(engine.state().status, PlaybackStatus::Idle);
    assert_eq!(engine.state().current_track_id().unwrap().as_str(), "a");
    assert_eq!(engine.queue().current_index(), Some(0));

    // The removed track can no longer drive the state
    engine.handle_device_event(DeviceEvent::new(stale, DeviceEventKind::Started));
    assert_eq!(engine.state().status, PlaybackStatus::Idle);
}

#[test]
fn test_remove_before_current_keeps_playing() {
    let (mut engine, device) = create_engine();
    engine.play_queue(vec![create_test_track("a"), create_test_track("b")], 1);
    start_current(&mut engine);
    device.clear();

    engine.remove_at(0);

    assert!(device.calls().is_empty());
    assert_eq!(engine.queue().current_index(), Some(0));
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
}

#[test]
fn test_remove_only_track_resets() {
    let (mut engine, _device) = create_engine();
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);

    engine.remove_at(0);

    assert!(engine.state().current_track.is_none());
    assert_eq!(engine.state().status, PlaybackStatus::Idle);
    assert!(engine.queue().is_empty());
}

#[test]
fn test_play_next_then_advance() {
    let (mut engine, _device) = create_engine();
    engine.play_queue(vec![create_test_track("a"), create_test_track("b")], 0);
    start_current(&mut engine);

    engine.play_next(create_test_track("x"));
    device_says(&mut engine, DeviceEventKind::Finished);

    assert_eq!(engine.state().current_track_id().unwrap().as_str(), "x");
}

#[test]
fn test_enqueue_duplicate_does_not_notify() {
    let (mut engine, _device) = create_engine();
    engine.enqueue(create_test_track("a"));
    let events = record_events(&mut engine);

    engine.enqueue(create_test_track("a"));

    assert_eq!(engine.queue().len(), 1);
    assert!(events.lock().unwrap().is_empty());
}

#[test]
fn test_clear_resets_to_idle_and_keeps_volume() {
    let (mut engine, device) = create_engine();
    engine.set_volume(0.3);
    engine.play(Some(create_test_track("a")));
    start_current(&mut engine);
    let stale = engine.generation();

    engine.clear();

    assert!(engine.queue().is_empty());
    assert_eq!(engine.state().status, PlaybackStatus::Idle);
    assert!(engine.state().current_track.is_none());
    assert_eq!(engine.state().volume, 0.3);
    assert_eq!(device.calls().last(), Some(&DeviceCall::Stop));

    engine.handle_device_event(DeviceEvent::new(stale, DeviceEventKind::Finished));
    assert_eq!(engine.state().status, PlaybackStatus::Idle);
}

// ============================================================================
// DEVICE ERRORS
// ============================================================================

#[test]
fn test_device_failure_goes_idle_with_one_error() {
    let (mut engine, _device) = create_engine();
    engine.play(Some(create_test_track("a")));
    let events = record_events(&mut engine);

    device_says(&mut engine, DeviceEventKind::Failed("404 Not Found".to_string()));

    assert_eq!(engine.state().status, PlaybackStatus::Idle);
    let events = events.lock().unwrap();
    assert_eq!(events.len(), 2);
    assert!(matches!(events[0], PlaybackEvent::StateChanged(_)));
    match &events[1] {
        PlaybackEvent::Error { track_id, message } => {
            assert_eq!(track_id.as_ref().unwrap().as_str(), "a");
            assert!(message.contains("404"));
        }
        other => panic!("expected error event, got {:?}", other),
    }
}

#[test]
fn test_play_recovers_after_failure() {
    let (mut engine, _device) = create_engine();
    engine.play(Some(create_test_track("a")));
    device_says(&mut engine, DeviceEventKind::Failed("timeout".to_string()));

    engine.play(None);
    assert_eq!(engine.state().status, PlaybackStatus::Loading);

    start_current(&mut engine);
    assert_eq!(engine.state().status, PlaybackStatus::Playing);
}

// ============================================================================
// SUBSCRIBERS
// ============================================================================

#[test]
fn test_snapshot_is_current_when_listener_runs() {
    let (mut engine, _device) = create_engine();
    let events = record_events(&mut engine);

    engine.play(Some(create_test_track("a")));

    let events = events.lock().unwrap();
    let snapshot = events[0].snapshot().unwrap();
    assert_eq!(snapshot.state, *engine.state());
    assert_eq!(snapshot.queue, engine.queue().snapshot());
}

#[test]
fn test_unsubscribed_listener_is_silent() {
    let (mut engine, _device) = create_engine();
    let count = std::sync::Arc::new(std::sync::Mutex::new(0));
    let counter = std::sync::Arc::clone(&count);
    let subscription = engine.subscribe(Box::new(move |_| *counter.lock().unwrap() += 1));

    engine.set_volume(0.5);
    assert!(engine.unsubscribe(subscription));
    engine.set_volume(0.6);

    assert_eq!(*count.lock().unwrap(), 1);
}
