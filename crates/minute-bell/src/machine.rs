//! Minute state machine.
//!
//! Polled once per second with the current Kyiv wall time. Each tick derives the
//! [`Phase`] from `hhmm`, diffs it against the previous tick, updates the [`View`] and
//! drives the injected [`AudioControl`]:
//!
//! - the declaration plays once when the countdown reaches its last seconds, provided it
//!   was armed by a tick before 08:55 (the first tick of a run, or any tick after the
//!   clock wraps past midnight);
//! - entering the event minute plays one tone burst and arms the repeating trigger,
//!   leaving it cancels the trigger;
//! - a disengaged audio session is retried on every foreground tick.
//!
//! The machine owns no timers. The repeating tone trigger is reported through
//! [`ToneTimer`] and run by the caller.

use crate::clock::{WallTime, format_time};
use crate::phase::{
    DECLARATION_ARM_BEFORE, DECLARATION_LEAD_SECONDS, EVENT_UNTIL, Phase, PhaseChange,
    seconds_left, volume_check_allowed,
};
use crate::view::{
    CURRENT_TIME, LOUD_ENOUGH_ABOVE_PERCENT, TITLE_AFTER, TITLE_BEFORE, TITLE_COUNTDOWN, View,
    VolumeCheckView,
};

/// Audio operations the machine triggers.
pub trait AudioControl {
    /// Whether a playback session is currently open.
    fn is_engaged(&self) -> bool;
    /// Open a playback session, replacing any previous one.
    ///
    /// Returns `false` on failure; the implementation reports the error itself.
    fn engage(&mut self) -> bool;
    /// Schedule one tone burst. No-op while disengaged.
    fn play_bang(&mut self);
    /// Schedule the declaration clip once. No-op while disengaged.
    fn play_declaration(&mut self);
    /// Output volume percent used by the volume check.
    fn volume_percent(&self) -> u8;
}

/// What the caller must do with the repeating 2 s tone trigger.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ToneTimer {
    Unchanged,
    /// Start repeating; the first burst has already been played.
    Arm,
    Cancel,
}

/// Per-tick flags from the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickInput {
    /// Refresh every label regardless of what changed.
    pub force: bool,
    /// Host is in the foreground; audio may be engaged.
    pub foreground: bool,
}

impl TickInput {
    pub const FOREGROUND: Self = Self {
        force: false,
        foreground: true,
    };
}

/// Result of one tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TickOutcome {
    pub phase: Phase,
    pub tone: ToneTimer,
    /// The view differs from the previous tick, or a redraw was forced.
    pub needs_redraw: bool,
    /// `Some(engaged)` when the idle-timer lock flipped on this tick.
    pub idle_lock: Option<bool>,
    pub declaration_played: bool,
}

#[derive(Debug)]
pub struct MinuteMachine {
    prev_hhmm: Option<u32>,
    expecting_declaration: bool,
    tone_armed: bool,
    idle_lock: bool,
    show_volume_control: bool,
    view: View,
}

impl MinuteMachine {
    pub fn new(show_volume_control: bool) -> Self {
        Self {
            prev_hhmm: None,
            expecting_declaration: false,
            tone_armed: false,
            idle_lock: false,
            show_volume_control,
            view: View::default(),
        }
    }

    pub fn view(&self) -> &View {
        &self.view
    }

    pub fn is_expecting_declaration(&self) -> bool {
        self.expecting_declaration
    }

    pub fn is_tone_armed(&self) -> bool {
        self.tone_armed
    }

    pub fn tick<A>(&mut self, now: WallTime, input: TickInput, audio: &mut A) -> TickOutcome
    where
        A: AudioControl + ?Sized,
    {
        let hhmm = now.hhmm();
        let first = self.prev_hhmm.is_none();
        let previous = self.prev_hhmm.map(Phase::from_hhmm);
        let change = PhaseChange::new(previous, Phase::from_hhmm(hhmm));
        let phase = change.current;
        let minute_changed = self.prev_hhmm != Some(hhmm);
        let refresh_title = input.force || change.entered();
        let before = self.view.clone();

        self.arm_declaration(first, hhmm);

        if !audio.is_engaged() && input.foreground && audio.engage() {
            tracing::debug!("audio engaged");
        }

        let mut declaration_played = false;
        match phase {
            Phase::Idle | Phase::PostEvent => {
                if refresh_title {
                    let title = if phase == Phase::Idle {
                        TITLE_BEFORE
                    } else {
                        TITLE_AFTER
                    };
                    self.view.title = title.to_string();
                }
                if input.force || minute_changed {
                    self.view.time_text =
                        format!("{CURRENT_TIME} {}", format_time(now.hour, now.minute));
                }
            }
            Phase::Countdown => {
                if refresh_title {
                    self.view.title = TITLE_COUNTDOWN.to_string();
                }
                let left = seconds_left(now.minute, now.second);
                self.view.time_text = left.to_string();
                if left <= DECLARATION_LEAD_SECONDS && self.expecting_declaration {
                    tracing::info!(seconds_left = left, "playing declaration");
                    audio.play_declaration();
                    self.expecting_declaration = false;
                    declaration_played = true;
                }
            }
            Phase::Active => {
                self.view.time_text = now.second.to_string();
            }
        }
        self.view.title_visible = phase != Phase::Active;
        self.view.bell_visible = phase == Phase::Active;
        self.view.volume = self.volume_check(hhmm, audio.volume_percent());

        let idle_lock = self.update_idle_lock(phase);
        self.prev_hhmm = Some(hhmm);
        let tone = self.update_tone(phase, audio);

        if change.entered() {
            tracing::info!(phase = ?phase, hhmm, "phase entered");
        }

        TickOutcome {
            phase,
            tone,
            needs_redraw: first || input.force || self.view != before,
            idle_lock,
            declaration_played,
        }
    }

    /// Arm on a first tick before 08:55, and re-arm when the clock wraps past midnight.
    fn arm_declaration(&mut self, first: bool, hhmm: u32) {
        if first {
            self.expecting_declaration = hhmm < DECLARATION_ARM_BEFORE;
        } else if !self.expecting_declaration && hhmm < DECLARATION_ARM_BEFORE {
            tracing::debug!(hhmm, "declaration re-armed");
            self.expecting_declaration = true;
        }
    }

    fn volume_check(&self, hhmm: u32, volume_percent: u8) -> VolumeCheckView {
        if !self.show_volume_control || !volume_check_allowed(hhmm) {
            return VolumeCheckView::default();
        }
        let loud = volume_percent > LOUD_ENOUGH_ABOVE_PERCENT;
        VolumeCheckView {
            control: Some(volume_percent),
            low_volume_hint: !loud && hhmm < EVENT_UNTIL,
        }
    }

    fn update_idle_lock(&mut self, phase: Phase) -> Option<bool> {
        let wanted = phase.keeps_awake();
        self.view.keep_awake = wanted;
        if wanted == self.idle_lock {
            return None;
        }
        self.idle_lock = wanted;
        Some(wanted)
    }

    fn update_tone<A>(&mut self, phase: Phase, audio: &mut A) -> ToneTimer
    where
        A: AudioControl + ?Sized,
    {
        match (phase == Phase::Active, self.tone_armed) {
            (true, false) => {
                self.tone_armed = true;
                audio.play_bang();
                ToneTimer::Arm
            }
            (false, true) => {
                self.tone_armed = false;
                ToneTimer::Cancel
            }
            _ => ToneTimer::Unchanged,
        }
    }
}
