//! Typed audio errors and the best-effort notification sink.

use crossbeam_channel::{Receiver, Sender, TrySendError};
use thiserror::Error;

/// Everything that can go wrong while engaging or driving the output device.
///
/// None of these are fatal: the caller reports them and retries on a later tick.
#[derive(Debug, Error)]
pub enum AudioError {
    /// The host has no usable output path.
    #[error("Cannot access speaker")]
    NoOutput,
    /// The device reported a non-positive (or non-finite) sample rate.
    #[error("Bad speaker audio parameters")]
    BadSampleRate,
    /// The device format cannot carry our mono stream.
    #[error("Cannot process audio format")]
    BadOutputFormat,
    /// The sample buffer could not be allocated.
    #[error("Failed memory allocation")]
    MemoryAllocation,
    #[error(transparent)]
    DefaultConfig(#[from] cpal::DefaultStreamConfigError),
    #[error(transparent)]
    BuildStream(#[from] cpal::BuildStreamError),
    #[error(transparent)]
    PlayStream(#[from] cpal::PlayStreamError),
    /// The declaration clip could not be read or decoded.
    #[error("declaration clip: {0:#}")]
    Declaration(anyhow::Error),
}

/// Best-effort error observer.
///
/// Every reported error is logged. When a receiver is attached it is also forwarded for
/// user display; a missing or disconnected receiver is silently ignored.
#[derive(Clone, Debug, Default)]
pub struct ErrorSink {
    tx: Option<Sender<AudioError>>,
}

impl ErrorSink {
    /// Create a sink with an attached receiver for user-facing notifications.
    pub fn channel() -> (Self, Receiver<AudioError>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        (Self { tx: Some(tx) }, rx)
    }

    /// A sink with no observer; errors are only logged.
    pub fn detached() -> Self {
        Self { tx: None }
    }

    /// Log `err` and forward it to the observer, if any.
    pub fn report(&self, err: AudioError) {
        tracing::warn!("audio error: {err}");
        let Some(tx) = &self.tx else {
            return;
        };
        match tx.try_send(err) {
            Ok(()) => {}
            Err(TrySendError::Disconnected(_)) => {
                tracing::debug!("error observer gone; notification dropped");
            }
            Err(TrySendError::Full(_)) => {}
        }
    }
}
