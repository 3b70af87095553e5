//! Main control loop.
//!
//! Everything runs on the calling thread: a 1 s poll drives the state machine, a 2 s
//! trigger exists only while the event minute is active, audio errors are surfaced to
//! the user as they arrive and Ctrl-C ends the run. The CPAL callback thread only drains
//! the session queue.

use std::sync::Arc;
use std::sync::atomic::AtomicU8;
use std::time::{Duration, Instant};

use anyhow::Result;
use crossbeam_channel::{Receiver, select};
use minute_audio::{AudioError, ErrorSink, SessionOptions};

use crate::clock::{self, Clock, ZonedClock};
use crate::config::Settings;
use crate::machine::{AudioControl, MinuteMachine, TickInput, TickOutcome, ToneTimer};
use crate::sound::SessionSlot;
use crate::view::TerminalDisplay;

const TICK_INTERVAL: Duration = Duration::from_secs(1);
const TONE_INTERVAL: Duration = Duration::from_secs(2);

/// Run until Ctrl-C.
///
/// Fails only on startup misconfiguration: a missing Kyiv timezone.
pub fn run(settings: Settings) -> Result<()> {
    let tz = clock::kyiv_timezone()?;
    let clock = match settings.start_at {
        Some(start) => {
            tracing::info!(start = %start, "simulated clock");
            ZonedClock::starting_at(tz, start)
        }
        None => ZonedClock::new(tz),
    };
    tracing::info!(timezone = clock.timezone().name(), "clock ready");

    let (errors, error_rx) = ErrorSink::channel();
    let (shutdown_tx, shutdown_rx) = crossbeam_channel::bounded::<()>(1);
    if let Err(e) = ctrlc::set_handler(move || {
        let _ = shutdown_tx.try_send(());
    }) {
        tracing::warn!("ctrl-c handler not installed: {e}");
    }

    let options = SessionOptions {
        device: settings.device.clone(),
        volume_percent: Arc::new(AtomicU8::new(settings.volume_percent)),
        playback: settings.playback.clone(),
    };
    tracing::info!(
        device = settings.device.as_deref().unwrap_or("default"),
        volume_percent = settings.volume_percent,
        declaration = ?settings.declaration_path,
        "audio settings"
    );
    let mut audio = SessionSlot::new(options, settings.declaration_path.clone(), errors);
    let mut machine = MinuteMachine::new(settings.show_volume_control);
    let mut display = TerminalDisplay::new();

    let result = run_loop(
        &clock,
        &mut machine,
        &mut audio,
        &mut display,
        &error_rx,
        &shutdown_rx,
    );

    display.finish();
    audio.stop();
    tracing::info!("stopped");
    result
}

fn run_loop(
    clock: &dyn Clock,
    machine: &mut MinuteMachine,
    audio: &mut SessionSlot,
    display: &mut TerminalDisplay,
    error_rx: &Receiver<AudioError>,
    shutdown_rx: &Receiver<()>,
) -> Result<()> {
    let ticker = crossbeam_channel::tick(TICK_INTERVAL);
    let mut tone_ticker = crossbeam_channel::never();

    let first = TickInput {
        force: true,
        foreground: true,
    };
    let outcome = machine.tick(clock.now(), first, audio);
    after_tick(&outcome, &mut tone_ticker);
    display.show(machine.view())?;

    loop {
        select! {
            recv(ticker) -> _ => {
                let outcome = machine.tick(clock.now(), TickInput::FOREGROUND, audio);
                after_tick(&outcome, &mut tone_ticker);
                if outcome.needs_redraw {
                    display.show(machine.view())?;
                }
            }
            recv(tone_ticker) -> _ => audio.play_bang(),
            recv(error_rx) -> err => {
                if let Ok(err) = err {
                    display.notify(&err.to_string());
                }
            }
            recv(shutdown_rx) -> _ => {
                tracing::info!("shutdown requested");
                return Ok(());
            }
        }
    }
}

/// Apply timer and lock side effects reported by a tick.
fn after_tick(outcome: &TickOutcome, tone_ticker: &mut Receiver<Instant>) {
    match outcome.tone {
        ToneTimer::Arm => {
            tracing::info!(
                interval_ms = TONE_INTERVAL.as_millis() as u64,
                "tone trigger armed"
            );
            *tone_ticker = crossbeam_channel::tick(TONE_INTERVAL);
        }
        ToneTimer::Cancel => {
            tracing::info!("tone trigger cancelled");
            *tone_ticker = crossbeam_channel::never();
        }
        ToneTimer::Unchanged => {}
    }
    if let Some(engaged) = outcome.idle_lock {
        tracing::info!(engaged, "idle-timer lock");
    }
}
