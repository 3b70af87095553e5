//! Phases of the observance day, derived from `hhmm` alone.

/// Countdown begins at 08:50.
pub const COUNTDOWN_FROM: u32 = 850;
/// The minute of silence is 09:00..09:01.
pub const EVENT_FROM: u32 = 900;
pub const EVENT_UNTIL: u32 = 901;
/// Volume check stays available one extra minute after the event.
pub const VOLUME_CHECK_UNTIL: u32 = 902;
/// Ticks before 08:55 (re-)arm the declaration.
pub const DECLARATION_ARM_BEFORE: u32 = 855;
/// The declaration starts this many seconds before 09:00.
pub const DECLARATION_LEAD_SECONDS: u32 = 7;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    /// Before 08:50.
    Idle,
    /// 08:50..09:00, counting seconds down.
    Countdown,
    /// 09:00..09:01, the tone burst repeats.
    Active,
    /// From 09:01 for the rest of the day.
    PostEvent,
}

impl Phase {
    pub fn from_hhmm(hhmm: u32) -> Self {
        match hhmm {
            h if h < COUNTDOWN_FROM => Phase::Idle,
            h if h < EVENT_FROM => Phase::Countdown,
            h if h < EVENT_UNTIL => Phase::Active,
            _ => Phase::PostEvent,
        }
    }

    /// Whether the display must be kept awake.
    pub fn keeps_awake(self) -> bool {
        matches!(self, Phase::Countdown | Phase::Active)
    }
}

/// Difference between the previous tick's phase and the current one.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PhaseChange {
    pub previous: Option<Phase>,
    pub current: Phase,
}

impl PhaseChange {
    pub fn new(previous: Option<Phase>, current: Phase) -> Self {
        Self { previous, current }
    }

    /// True on the first tick and whenever the phase differs from the last tick.
    pub fn entered(&self) -> bool {
        self.previous != Some(self.current)
    }

    pub fn entered_phase(&self, phase: Phase) -> bool {
        self.current == phase && self.entered()
    }

    pub fn left_phase(&self, phase: Phase) -> bool {
        self.previous == Some(phase) && self.current != phase
    }
}

/// Seconds until 09:00 during the countdown hour.
pub fn seconds_left(minute: u32, second: u32) -> u32 {
    3600u32.saturating_sub(60 * minute + second)
}

/// Whether the volume check may be shown at `hhmm`.
pub fn volume_check_allowed(hhmm: u32) -> bool {
    (COUNTDOWN_FROM..VOLUME_CHECK_UNTIL).contains(&hhmm)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_hhmm() -> impl Iterator<Item = u32> {
        (0..24).flat_map(|h| (0..60).map(move |m| 100 * h + m))
    }

    #[test]
    fn phase_ranges_cover_the_day() {
        for hhmm in all_hhmm() {
            let expected = if hhmm < 850 {
                Phase::Idle
            } else if hhmm < 900 {
                Phase::Countdown
            } else if hhmm < 901 {
                Phase::Active
            } else {
                Phase::PostEvent
            };
            assert_eq!(Phase::from_hhmm(hhmm), expected, "hhmm {hhmm}");
        }
    }

    #[test]
    fn phase_boundaries() {
        assert_eq!(Phase::from_hhmm(849), Phase::Idle);
        assert_eq!(Phase::from_hhmm(850), Phase::Countdown);
        assert_eq!(Phase::from_hhmm(859), Phase::Countdown);
        assert_eq!(Phase::from_hhmm(900), Phase::Active);
        assert_eq!(Phase::from_hhmm(901), Phase::PostEvent);
        assert_eq!(Phase::from_hhmm(2359), Phase::PostEvent);
    }

    #[test]
    fn seconds_left_counts_to_the_hour() {
        assert_eq!(seconds_left(59, 54), 6);
        assert_eq!(seconds_left(50, 0), 600);
        assert_eq!(seconds_left(59, 59), 1);
    }

    #[test]
    fn volume_check_window() {
        assert!(!volume_check_allowed(849));
        assert!(volume_check_allowed(850));
        assert!(volume_check_allowed(901));
        assert!(!volume_check_allowed(902));
    }

    #[test]
    fn phase_change_entry_and_exit() {
        let first = PhaseChange::new(None, Phase::Active);
        assert!(first.entered_phase(Phase::Active));
        assert!(!first.left_phase(Phase::Active));

        let steady = PhaseChange::new(Some(Phase::Active), Phase::Active);
        assert!(!steady.entered());

        let exit = PhaseChange::new(Some(Phase::Active), Phase::PostEvent);
        assert!(exit.left_phase(Phase::Active));
        assert!(exit.entered_phase(Phase::PostEvent));
    }

    #[test]
    fn only_countdown_and_active_keep_awake() {
        assert!(!Phase::Idle.keeps_awake());
        assert!(Phase::Countdown.keeps_awake());
        assert!(Phase::Active.keeps_awake());
        assert!(!Phase::PostEvent.keeps_awake());
    }
}
