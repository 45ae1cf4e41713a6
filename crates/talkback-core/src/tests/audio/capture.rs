use crate::{
    AudioError, AudioFormat, AudioSpec, CaptureKeys, CaptureOutcome, CaptureSession, HotkeyBus,
    Key, RecordingState, decode,
    tests::support::{FakeHotkeyBus, ScriptedInput, wait_for},
};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
    time::Duration,
};

const RATE: u32 = 44_100;
const CHUNK: usize = 1024;

#[allow(clippy::unwrap_used)]
fn key(symbol: char) -> Key {
    Key::from_char(symbol).unwrap()
}

fn keys() -> CaptureKeys {
    CaptureKeys {
        start: key('c'),
        stop: key('s'),
        cancel: key('x'),
    }
}

fn session(
    bus: &Arc<FakeHotkeyBus>,
    chunks: Vec<Vec<f32>>,
) -> (
    Arc<CaptureSession<ScriptedInput>>,
    Arc<std::sync::Mutex<std::collections::VecDeque<Vec<f32>>>>,
) {
    let (input, script) = ScriptedInput::new(chunks, RATE);
    let session = CaptureSession::new(
        Arc::clone(bus) as Arc<dyn HotkeyBus>,
        input,
        keys(),
        AudioSpec::mono(RATE),
        AudioFormat::Wav,
    );
    (Arc::new(session), script)
}

/// WHAT: Stop after three scripted frames yields a WAV with exactly those frames
/// WHY: Buffer duration must be proportional to recording time (scenario A)
#[test]
#[allow(clippy::unwrap_used, clippy::panic)]
fn given_three_frames_when_stopping_then_wav_contains_three_frames() {
    // Given: A session whose input scripts three chunks of silence
    let bus = FakeHotkeyBus::new();
    let (session, script) = session(&bus, vec![vec![0.0; CHUNK]; 3]);

    let worker = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.await_capture())
    };

    // When: Starting, letting the worker drain the script, then stopping
    bus.press_for_waiter(key('c'));
    assert!(wait_for(
        || script.lock().unwrap().is_empty(),
        Duration::from_secs(2)
    ));
    bus.press(key('s'));

    // Then: The outcome is a WAV buffer holding exactly 3 chunks of frames
    let outcome = worker.join().unwrap().unwrap();
    let buffer = match outcome {
        CaptureOutcome::Captured(buffer) => buffer,
        CaptureOutcome::Cancelled => panic!("expected a captured buffer"),
    };
    assert!(session.has_audio());

    let (samples, sample_rate) = decode(buffer.bytes(), AudioFormat::Wav, buffer.spec()).unwrap();
    assert_eq!(sample_rate, RATE);
    assert_eq!(samples.len(), 3 * CHUNK);
}

/// WHAT: Cancel discards the recording without error
/// WHY: Cancellation is a normal outcome, not a failure (scenario B)
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_when_cancelling_then_no_audio_and_no_error() {
    // Given: A recording in flight
    let bus = FakeHotkeyBus::new();
    let (session, _script) = session(&bus, vec![vec![0.0; CHUNK]]);

    let worker = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.await_capture())
    };

    bus.press_for_waiter(key('c'));
    assert!(wait_for(
        || session.state() == RecordingState::Recording,
        Duration::from_secs(2)
    ));

    // When: Pressing the cancel key
    bus.press(key('x'));

    // Then: The outcome is Cancelled, no buffer exists, audio() refuses
    let outcome = worker.join().unwrap().unwrap();
    assert!(matches!(outcome, CaptureOutcome::Cancelled));
    assert!(!session.has_audio());
    assert!(matches!(
        session.audio(AudioFormat::Wav),
        Err(AudioError::NoAudioCaptured { .. })
    ));
}

/// WHAT: Stop with nothing recorded yields a valid empty buffer
/// WHY: Rejecting silence belongs to the transcription collaborator
#[test]
#[allow(clippy::unwrap_used, clippy::panic)]
fn given_empty_script_when_stopping_immediately_then_empty_buffer() {
    let bus = FakeHotkeyBus::new();
    let (session, _script) = session(&bus, Vec::new());

    let worker = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.await_capture())
    };

    bus.press_for_waiter(key('c'));
    assert!(wait_for(
        || session.state() == RecordingState::Recording,
        Duration::from_secs(2)
    ));
    bus.press(key('s'));

    let outcome = worker.join().unwrap().unwrap();
    let buffer = match outcome {
        CaptureOutcome::Captured(buffer) => buffer,
        CaptureOutcome::Cancelled => panic!("expected a captured buffer"),
    };

    let (samples, _) = decode(buffer.bytes(), AudioFormat::Wav, buffer.spec()).unwrap();
    assert!(samples.is_empty());
}

/// WHAT: Hotkeys are gone after a cycle and the next cycle re-registers fresh
/// WHY: A stale stop callback firing into a finished session is the single
/// highest-risk ordering bug in the component
#[test]
#[allow(clippy::unwrap_used)]
fn given_two_sequential_cycles_when_reusing_keys_then_no_stale_callbacks() {
    let bus = FakeHotkeyBus::new();
    let (session, _script) = session(&bus, Vec::new());

    // Given: A completed first cycle
    for _ in 0..2 {
        let worker = {
            let session = Arc::clone(&session);
            thread::spawn(move || session.await_capture())
        };
        bus.press_for_waiter(key('c'));
        assert!(wait_for(
            || session.state() == RecordingState::Recording,
            Duration::from_secs(2)
        ));
        bus.press(key('s'));
        assert!(worker.join().unwrap().is_ok());

        // Then: Every handle the cycle registered has been removed
        assert_eq!(bus.registration_count(), 0);

        // And: Pressing the stop key between cycles is inert
        bus.press(key('s'));
        assert_eq!(session.state(), RecordingState::Idle);
    }
}

/// WHAT: Extra start presses while recording are no-ops
/// WHY: Only the blocking wait consumes a start press; repeats must not
/// re-arm or auto-start the next cycle
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_when_pressing_start_again_then_idempotent() {
    let bus = FakeHotkeyBus::new();
    let (session, _script) = session(&bus, Vec::new());

    let worker = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.await_capture())
    };

    bus.press_for_waiter(key('c'));
    assert!(wait_for(
        || session.state() == RecordingState::Recording,
        Duration::from_secs(2)
    ));

    // When: Hammering the start key mid-recording
    bus.press(key('c'));
    bus.press(key('c'));
    assert_eq!(session.state(), RecordingState::Recording);

    bus.press(key('s'));
    assert!(worker.join().unwrap().is_ok());

    // Then: The stale presses do not satisfy the next cycle's start wait
    let second = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.await_capture())
    };
    thread::sleep(Duration::from_millis(50));
    assert_eq!(session.state(), RecordingState::Idle);
    bus.press_for_waiter(key('c'));
    bus.press(key('x'));
    assert!(second.join().unwrap().is_ok());
}

/// WHAT: audio() blocks while the worker is still recording
/// WHY: Callers must never observe a partial buffer
#[test]
#[allow(clippy::unwrap_used)]
fn given_recording_in_flight_when_requesting_audio_then_blocks_until_done() {
    let bus = FakeHotkeyBus::new();
    let (session, _script) = session(&bus, vec![vec![0.25; CHUNK]]);

    let worker = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.await_capture())
    };
    bus.press_for_waiter(key('c'));
    assert!(wait_for(
        || session.state() == RecordingState::Recording,
        Duration::from_secs(2)
    ));

    // When: Requesting audio mid-recording from another thread
    let returned = Arc::new(AtomicBool::new(false));
    let reader = {
        let session = Arc::clone(&session);
        let returned = Arc::clone(&returned);
        thread::spawn(move || {
            let audio = session.audio(AudioFormat::Wav);
            returned.store(true, Ordering::SeqCst);
            audio
        })
    };

    // Then: The call is still blocked while recording continues
    thread::sleep(Duration::from_millis(80));
    assert!(!returned.load(Ordering::SeqCst));

    // And: It returns the finished buffer once the stop key ends the cycle
    bus.press(key('s'));
    assert!(worker.join().unwrap().is_ok());
    let audio = reader.join().unwrap().unwrap();
    assert!(returned.load(Ordering::SeqCst));
    assert!(!audio.bytes().is_empty());
}

/// WHAT: A second await_capture while one is in flight fails fast
/// WHY: At most one capture session cycle may be active system-wide
#[test]
#[allow(clippy::unwrap_used)]
fn given_cycle_in_flight_when_calling_await_capture_again_then_busy() {
    let bus = FakeHotkeyBus::new();
    let (session, _script) = session(&bus, Vec::new());

    let worker = {
        let session = Arc::clone(&session);
        thread::spawn(move || session.await_capture())
    };
    bus.press_for_waiter(key('c'));
    assert!(wait_for(
        || session.state() == RecordingState::Recording,
        Duration::from_secs(2)
    ));

    assert!(matches!(
        session.await_capture(),
        Err(AudioError::SessionBusy { .. })
    ));

    bus.press(key('s'));
    assert!(worker.join().unwrap().is_ok());
}
