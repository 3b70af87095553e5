//! Owner of the single live [`AudioSession`].

use std::path::{Path, PathBuf};
use std::sync::atomic::Ordering;

use minute_audio::{AudioError, AudioSession, ErrorSink, SessionOptions};

use crate::machine::AudioControl;

/// Playback operations the slot needs from a running session.
pub trait Session {
    fn play_bang(&self);
    fn play_declaration(&self, path: &Path) -> Result<(), AudioError>;
}

impl Session for AudioSession {
    fn play_bang(&self) {
        AudioSession::play_bang(self);
    }

    fn play_declaration(&self, path: &Path) -> Result<(), AudioError> {
        AudioSession::play_declaration(self, path)
    }
}

type Starter<S> = Box<dyn FnMut(&SessionOptions) -> Result<S, AudioError>>;

/// Holds at most one session and reports failures to the error sink.
///
/// Engagement is retried on every call, but a start failure that repeats the previous
/// one is only logged, so the user sees each distinct failure once.
pub struct SessionSlot<S: Session = AudioSession> {
    session: Option<S>,
    start: Starter<S>,
    options: SessionOptions,
    declaration: PathBuf,
    errors: ErrorSink,
    last_failure: Option<String>,
}

impl SessionSlot<AudioSession> {
    pub fn new(options: SessionOptions, declaration: PathBuf, errors: ErrorSink) -> Self {
        Self::with_starter(options, declaration, errors, |opts| {
            AudioSession::start(opts.clone())
        })
    }
}

impl<S: Session> SessionSlot<S> {
    /// Slot whose sessions are created by `start`.
    pub fn with_starter<F>(
        options: SessionOptions,
        declaration: PathBuf,
        errors: ErrorSink,
        start: F,
    ) -> Self
    where
        F: FnMut(&SessionOptions) -> Result<S, AudioError> + 'static,
    {
        Self {
            session: None,
            start: Box::new(start),
            options,
            declaration,
            errors,
            last_failure: None,
        }
    }

    /// Tear down the current session, if any.
    pub fn stop(&mut self) {
        self.session = None;
    }
}

impl<S: Session> AudioControl for SessionSlot<S> {
    fn is_engaged(&self) -> bool {
        self.session.is_some()
    }

    fn engage(&mut self) -> bool {
        self.stop();
        match (self.start)(&self.options) {
            Ok(session) => {
                self.session = Some(session);
                self.last_failure = None;
                true
            }
            Err(e) => {
                let message = e.to_string();
                if self.last_failure.as_deref() == Some(message.as_str()) {
                    tracing::debug!("audio start still failing: {message}");
                } else {
                    self.errors.report(e);
                    self.last_failure = Some(message);
                }
                false
            }
        }
    }

    fn play_bang(&mut self) {
        if let Some(session) = &self.session {
            session.play_bang();
        }
    }

    fn play_declaration(&mut self) {
        let Some(session) = &self.session else {
            tracing::debug!("declaration skipped; audio not engaged");
            return;
        };
        if let Err(e) = session.play_declaration(&self.declaration) {
            self.errors.report(e);
        }
    }

    fn volume_percent(&self) -> u8 {
        self.options.volume_percent.load(Ordering::Relaxed)
    }
}

impl<S: Session> Drop for SessionSlot<S> {
    fn drop(&mut self) {
        self.stop();
    }
}
