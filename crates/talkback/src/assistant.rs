//! The conversation loop tying capture, collaborators, and playback together.
//!
//! Each turn is: record a question under hotkey control, transcribe it,
//! ask the agent, synthesize the reply, and play it. Any collaborator
//! failure ends the turn quietly; the loop immediately offers the user the
//! next turn. Only a quit-key press stops the loop.

use crate::{
    AppResult, agent::ConversationalAgent, stt::Transcriber, tts::Synthesizer,
};

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, Ordering},
    },
    thread,
};

use talkback_core::{
    AudioBuffer, AudioFormat, CaptureOutcome, CaptureSession, HotkeyBus, InputSource, Key,
    OutputSink, PlaybackSession, PlaybackSource,
};
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

/// A voice assistant over one microphone, one speaker, and three
/// collaborator services.
pub struct Assistant<I, O, T, A, S>
where
    I: InputSource,
    O: OutputSink,
    T: Transcriber,
    A: ConversationalAgent,
    S: Synthesizer,
{
    capture: CaptureSession<I>,
    playback: PlaybackSession<O>,
    transcriber: T,
    agent: A,
    synthesizer: S,
    bus: Arc<dyn HotkeyBus>,
    quit_key: Key,
    quit: AtomicBool,
}

impl<I, O, T, A, S> Assistant<I, O, T, A, S>
where
    I: InputSource + 'static,
    O: OutputSink + 'static,
    T: Transcriber + 'static,
    A: ConversationalAgent + 'static,
    S: Synthesizer + 'static,
{
    /// Wire an assistant from its sessions and collaborators.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        capture: CaptureSession<I>,
        playback: PlaybackSession<O>,
        transcriber: T,
        agent: A,
        synthesizer: S,
        bus: Arc<dyn HotkeyBus>,
        quit_key: Key,
    ) -> Self {
        Self {
            capture,
            playback,
            transcriber,
            agent,
            synthesizer,
            bus,
            quit_key,
            quit: AtomicBool::new(false),
        }
    }

    /// Spawn the conversation loop on its own thread.
    ///
    /// The loop runs turns until [`wait_for_quit`](Self::wait_for_quit)
    /// observes the quit key. A turn already recording when quit fires
    /// finishes with the process.
    pub fn spawn_conversation(self: &Arc<Self>) -> thread::JoinHandle<()> {
        info!("Assistant started");
        let assistant = Arc::clone(self);
        thread::Builder::new()
            .name("conversation".to_string())
            .spawn(move || {
                while !assistant.quit.load(Ordering::Acquire) {
                    if let Err(e) = assistant.run_cycle() {
                        error!(error = ?e, "Conversation turn failed");
                    }
                }
            })
            .unwrap_or_else(|e| {
                // Thread spawn failing at startup leaves nothing to run.
                error!(error = ?e, "Failed to spawn conversation thread");
                std::process::exit(1);
            })
    }

    /// Block the calling thread until the quit key is pressed, then flag
    /// the loop down.
    pub fn wait_for_quit(&self) {
        info!(quit = %self.quit_key, "Press the quit key to shut down");
        self.bus.block_until(self.quit_key);
        self.quit.store(true, Ordering::Release);
        info!("Assistant stopped");
    }

    /// One full turn: capture, then respond.
    ///
    /// # Errors
    ///
    /// Returns an error only for capture-side failures; every collaborator
    /// failure is logged and swallowed so the loop offers the next turn.
    #[instrument(skip(self))]
    fn run_cycle(&self) -> AppResult<()> {
        let turn_id = Uuid::new_v4();

        match self.capture.await_capture()? {
            CaptureOutcome::Cancelled => {
                info!(turn_id = %turn_id, "Turn cancelled by the user");
                Ok(())
            }
            CaptureOutcome::Captured(_) => {
                // The recognizer wants raw LINEAR16 frames, whatever
                // container the session stores.
                let audio = self.capture.audio(AudioFormat::Pcm)?;
                self.respond(turn_id, &audio);
                Ok(())
            }
        }
    }

    /// Transcribe the question and speak the agent's answer.
    ///
    /// Failures degrade to silence: the turn ends without playback and the
    /// user simply hears nothing.
    pub(crate) fn respond(&self, turn_id: Uuid, audio: &AudioBuffer) {
        let transcript = match self.transcriber.transcribe(audio) {
            Ok(transcript) => transcript,
            Err(e) => {
                warn!(turn_id = %turn_id, error = ?e, "Transcription failed, ending turn");
                return;
            }
        };

        let reply = match self.ask_with_retry(&transcript) {
            Ok(reply) => reply,
            Err(e) => {
                warn!(turn_id = %turn_id, error = ?e, "Agent gave no reply, ending turn");
                return;
            }
        };

        let speech = match self.synthesizer.synthesize(&reply) {
            Ok(speech) => speech,
            Err(e) => {
                warn!(turn_id = %turn_id, error = ?e, "Synthesis failed, ending turn");
                return;
            }
        };

        if let Err(e) = self
            .playback
            .play(PlaybackSource::Bytes(speech), AudioFormat::Mp3)
        {
            warn!(turn_id = %turn_id, error = ?e, "Playback failed");
        }
    }

    /// Ask the agent, retrying exactly once on failure.
    fn ask_with_retry(&self, prompt: &str) -> AppResult<String> {
        match self.agent.ask(prompt) {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!(error = ?e, "Agent request failed, retrying once");
                self.agent.ask(prompt)
            }
        }
    }
}
