//! Talkback: a push-to-talk voice assistant driven by global hotkeys.

mod agent;
mod app_event;
mod assistant;
mod config;
mod error;
mod hotkey_bus;
mod stt;
mod tts;

pub(crate) use {
    app_event::AppEvent,
    assistant::Assistant,
    error::{AppError, Result as AppResult},
    hotkey_bus::GlobalHotkeyBus,
};

use crate::{
    agent::OpenAiAgent, config::Config, stt::GoogleSpeechToText, tts::ElevenLabsSynthesizer,
};

use std::{panic::Location, sync::Arc};

use error_location::ErrorLocation;
use global_hotkey::GlobalHotKeyManager;
use talkback_core::{CaptureSession, CpalInput, CpalOutput, HotkeyBus, PlaybackSession};
use tao::{
    event::Event,
    event_loop::{ControlFlow, EventLoopBuilder, EventLoopProxy},
};
use tracing::error;

/// Application entry point.
fn main() {
    tracing_subscriber::fmt()
        .with_env_filter("talkback=debug")
        .init();

    let event_loop = EventLoopBuilder::<AppEvent>::with_user_event().build();
    let proxy = event_loop.create_proxy();

    // Persists across event loop iterations — dropping it unregisters every
    // hotkey.
    let mut hotkey_manager: Option<GlobalHotKeyManager> = None;

    event_loop.run(move |event, _, control_flow| {
        *control_flow = ControlFlow::Wait;

        match event {
            Event::UserEvent(AppEvent::Shutdown) => {
                *control_flow = ControlFlow::ExitWithCode(0);
            }
            Event::NewEvents(tao::event::StartCause::Init) => {
                // Hotkeys must be registered on the main thread — tao's
                // event loop pumps the Windows messages needed for
                // WM_HOTKEY delivery.
                if let Err(e) = bootstrap(&mut hotkey_manager, proxy.clone()) {
                    error!(error = ?e, "Startup failed");
                    std::process::exit(1);
                }
            }
            _ => {}
        }

        // Keep hotkey_manager alive in the closure for the app's lifetime.
        let _ = &hotkey_manager;
    });
}

/// Load config, register hotkeys, open devices, and start the assistant.
///
/// The [`GlobalHotKeyManager`] is handed back through `hotkey_manager` so
/// the event loop closure owns it for the process lifetime.
fn bootstrap(
    hotkey_manager: &mut Option<GlobalHotKeyManager>,
    proxy: EventLoopProxy<AppEvent>,
) -> AppResult<()> {
    let config = Config::load()?;

    let capture_keys = config.keys.capture_keys()?;
    let stop_key = config.keys.stop_key()?;
    let quit_key = config.keys.quit_key()?;

    let google_key = env_key("GOOGLE_SPEECH_API_KEY")?;
    let elevenlabs_key = env_key("ELEVENLABS_API_KEY")?;
    let openai_key = env_key("OPENAI_API_KEY")?;

    let manager =
        GlobalHotKeyManager::new().map_err(|e| AppError::HotkeyRegistrationFailed {
            reason: format!("Failed to create manager: {}", e),
            location: ErrorLocation::from(Location::caller()),
        })?;

    let bus = GlobalHotkeyBus::start(
        &manager,
        &[
            capture_keys.start,
            capture_keys.stop,
            capture_keys.cancel,
            quit_key,
        ],
    )?;
    *hotkey_manager = Some(manager);

    let spec = config.audio.spec();
    let container = config.audio.container()?;

    let input = CpalInput::new(config.audio.chunk_frames)?;
    let output = CpalOutput::new()?;

    let capture = CaptureSession::new(
        Arc::clone(&bus) as Arc<dyn HotkeyBus>,
        input,
        capture_keys,
        spec,
        container,
    );
    let playback = PlaybackSession::new(
        Arc::clone(&bus) as Arc<dyn HotkeyBus>,
        output,
        stop_key,
        spec,
    );

    let assistant = Arc::new(Assistant::new(
        capture,
        playback,
        GoogleSpeechToText::new(google_key, config.speech.language.clone()),
        OpenAiAgent::new(openai_key, config.agent.model.clone()),
        ElevenLabsSynthesizer::new(elevenlabs_key, config.voice.clone()),
        Arc::clone(&bus) as Arc<dyn HotkeyBus>,
        quit_key,
    ));

    let _conversation = assistant.spawn_conversation();

    // The quit watcher parks on the bus and turns the quit key into an
    // event-loop exit.
    std::thread::spawn(move || {
        assistant.wait_for_quit();
        let _ = proxy.send_event(AppEvent::Shutdown);
    });

    Ok(())
}

fn env_key(name: &str) -> AppResult<String> {
    std::env::var(name).map_err(|_| AppError::ConfigError {
        reason: format!("{} must be set in the environment", name),
        location: ErrorLocation::from(Location::caller()),
    })
}
