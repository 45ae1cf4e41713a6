use crate::{
    AudioError, AudioFormat, AudioSpec, HotkeyBus, Key, PlaybackSession, PlaybackSource,
    PlaybackState, encode,
    tests::support::{FakeHotkeyBus, RecordingSink, wait_for},
};

use std::{
    sync::{Arc, atomic::Ordering},
    thread,
    time::Duration,
};

const RATE: u32 = 44_100;
const SPEC: AudioSpec = AudioSpec::mono(RATE);

#[allow(clippy::unwrap_used)]
fn key(symbol: char) -> Key {
    Key::from_char(symbol).unwrap()
}

#[allow(clippy::unwrap_used)]
fn wav_clip(sample_count: usize) -> Vec<u8> {
    encode(&vec![0.1; sample_count], SPEC, AudioFormat::Wav)
        .unwrap()
        .into_bytes()
}

fn playback(
    bus: &Arc<FakeHotkeyBus>,
    sink: RecordingSink,
) -> Arc<PlaybackSession<RecordingSink>> {
    Arc::new(PlaybackSession::new(
        Arc::clone(bus) as Arc<dyn HotkeyBus>,
        sink,
        key('s'),
        SPEC,
    ))
}

/// WHAT: A short clip plays to natural completion with the stop key unpressed
/// WHY: play must return only after both units observed completion and the
/// stop listener exited (scenario C)
#[test]
#[allow(clippy::unwrap_used)]
fn given_short_clip_when_never_stopping_then_full_clip_streamed() {
    // Given: A ~30ms clip and a counting sink
    let bus = FakeHotkeyBus::new();
    let sink = RecordingSink::new(256, Duration::from_millis(1));
    let streamed = sink.streamed();
    let session = playback(&bus, sink);
    let clip_samples = RATE as usize * 30 / 1000;

    // When: Playing without ever pressing stop
    session
        .play(PlaybackSource::Bytes(wav_clip(clip_samples)), AudioFormat::Wav)
        .unwrap();

    // Then: Every sample reached the sink, the listener is gone, the stop
    // hotkey is deregistered
    assert_eq!(streamed.load(Ordering::SeqCst), clip_samples);
    assert_eq!(session.state(), PlaybackState::Finished);
    assert_eq!(bus.registration_count(), 0);
}

/// WHAT: The stop key aborts playback mid-stream
/// WHY: Barge-in is the whole point of the concurrent stop listener
#[test]
#[allow(clippy::unwrap_used)]
fn given_long_clip_when_pressing_stop_then_stream_aborts_early() {
    // Given: A clip paced to take ~400ms through the sink
    let bus = FakeHotkeyBus::new();
    let sink = RecordingSink::new(1024, Duration::from_millis(5));
    let streamed = sink.streamed();
    let aborted = sink.aborted();
    let session = playback(&bus, sink);
    let clip_samples = 1024 * 80;

    let player = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            session.play(PlaybackSource::Bytes(wav_clip(clip_samples)), AudioFormat::Wav)
        })
    };

    // When: Pressing stop once streaming has begun
    assert!(wait_for(
        || streamed.load(Ordering::SeqCst) > 0,
        Duration::from_secs(2)
    ));
    bus.press(key('s'));

    // Then: play returns, the sink observed the abort, the stream is partial
    player.join().unwrap().unwrap();
    assert!(aborted.load(Ordering::SeqCst));
    assert!(streamed.load(Ordering::SeqCst) < clip_samples);
    assert_eq!(bus.registration_count(), 0);
}

/// WHAT: Stop pressed after natural completion is a no-op
/// WHY: Cancellation after the clip ends must not corrupt session state
#[test]
#[allow(clippy::unwrap_used)]
fn given_finished_playback_when_pressing_stop_then_no_effect() {
    let bus = FakeHotkeyBus::new();
    let sink = RecordingSink::new(256, Duration::from_millis(1));
    let calls = sink.calls();
    let session = playback(&bus, sink);

    session
        .play(PlaybackSource::Bytes(wav_clip(512)), AudioFormat::Wav)
        .unwrap();

    bus.press(key('s'));
    assert_eq!(session.state(), PlaybackState::Finished);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

/// WHAT: Overlapping play calls fail fast
/// WHY: Concurrent playback on one session is unsupported by contract
#[test]
#[allow(clippy::unwrap_used)]
fn given_playback_in_flight_when_playing_again_then_session_busy() {
    let bus = FakeHotkeyBus::new();
    let sink = RecordingSink::new(1024, Duration::from_millis(5));
    let streamed = sink.streamed();
    let session = playback(&bus, sink);

    let player = {
        let session = Arc::clone(&session);
        thread::spawn(move || {
            session.play(PlaybackSource::Bytes(wav_clip(1024 * 60)), AudioFormat::Wav)
        })
    };
    assert!(wait_for(
        || streamed.load(Ordering::SeqCst) > 0,
        Duration::from_secs(2)
    ));

    let result = session.play(PlaybackSource::Bytes(wav_clip(256)), AudioFormat::Wav);
    assert!(matches!(result, Err(AudioError::SessionBusy { .. })));

    bus.press(key('s'));
    player.join().unwrap().unwrap();
}

/// WHAT: Empty and undecodable sources are rejected before any threads spawn
/// WHY: Playback with nothing to play is a caller precondition failure
#[test]
fn given_empty_source_when_playing_then_no_audio_source_error() {
    let bus = FakeHotkeyBus::new();
    let sink = RecordingSink::new(256, Duration::from_millis(1));
    let session = playback(&bus, sink);

    let result = session.play(PlaybackSource::Bytes(Vec::new()), AudioFormat::Wav);
    assert!(matches!(result, Err(AudioError::NoAudioSource { .. })));

    let missing = PlaybackSource::File(std::path::PathBuf::from("/nonexistent/reply.mp3"));
    let result = session.play(missing, AudioFormat::Mp3);
    assert!(matches!(result, Err(AudioError::NoAudioSource { .. })));

    // No hotkey was ever registered for the failed attempts
    assert_eq!(bus.registration_count(), 0);
}
