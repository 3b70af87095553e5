//! What the screen shows, and a plain terminal renderer for it.

use std::io::{self, IsTerminal, Write};

pub const TITLE_BEFORE: &str = "The event will begin today at 9:00 Kyiv time";
pub const TITLE_COUNTDOWN: &str = "Seconds to start:";
pub const TITLE_AFTER: &str = "The event did occur today at 9:00 Kyiv time";
pub const CURRENT_TIME: &str = "current time";
pub const LOW_VOLUME_HINT: &str = "Let's increase audio volume";

/// Volume at or below this percent triggers the low-volume hint.
pub const LOUD_ENOUGH_ABOVE_PERCENT: u8 = 60;

/// Volume-check area under the labels.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct VolumeCheckView {
    /// Output volume when the control is shown, `None` when hidden.
    pub control: Option<u8>,
    pub low_volume_hint: bool,
}

/// Complete view state after a tick.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct View {
    pub title: String,
    pub title_visible: bool,
    pub time_text: String,
    pub bell_visible: bool,
    pub volume: VolumeCheckView,
    /// Display sleep is inhibited.
    pub keep_awake: bool,
}

/// One-line text rendering of `view`.
pub fn render_line(view: &View) -> String {
    let mut parts = Vec::new();
    if view.bell_visible {
        parts.push(format!("🔔 {}", view.time_text));
    } else {
        if view.title_visible && !view.title.is_empty() {
            parts.push(view.title.clone());
        }
        if !view.time_text.is_empty() {
            parts.push(view.time_text.clone());
        }
    }
    if let Some(percent) = view.volume.control {
        parts.push(format!("volume {percent}%"));
    }
    if view.volume.low_volume_hint {
        parts.push(LOW_VOLUME_HINT.to_string());
    }
    parts.join(" | ")
}

/// Prints the view whenever its rendering changes.
///
/// On a terminal the line is redrawn in place; otherwise each change is a new line.
pub struct TerminalDisplay {
    last: Option<String>,
    inline: bool,
}

impl TerminalDisplay {
    pub fn new() -> Self {
        Self {
            last: None,
            inline: io::stdout().is_terminal(),
        }
    }

    pub fn show(&mut self, view: &View) -> io::Result<()> {
        let line = render_line(view);
        if self.last.as_deref() == Some(line.as_str()) {
            return Ok(());
        }
        let mut out = io::stdout().lock();
        if self.inline {
            write!(out, "\r\x1b[2K{line}")?;
        } else {
            writeln!(out, "{line}")?;
        }
        out.flush()?;
        self.last = Some(line);
        Ok(())
    }

    /// Print a user-facing notice on stderr, then redraw the current line.
    pub fn notify(&mut self, message: &str) {
        if self.inline && self.last.is_some() {
            println!();
        }
        eprintln!("{message}");
        if let (true, Some(line)) = (self.inline, self.last.as_deref()) {
            print!("{line}");
            let _ = io::stdout().flush();
        }
    }

    /// Leave the cursor on a fresh line.
    pub fn finish(&mut self) {
        if self.inline && self.last.is_some() {
            println!();
        }
    }
}

impl Default for TerminalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_view_shows_title_and_time() {
        let view = View {
            title: TITLE_BEFORE.to_string(),
            title_visible: true,
            time_text: "current time 8:12".to_string(),
            ..View::default()
        };
        assert_eq!(
            render_line(&view),
            "The event will begin today at 9:00 Kyiv time | current time 8:12"
        );
    }

    #[test]
    fn active_view_shows_bell_and_seconds() {
        let view = View {
            title: TITLE_COUNTDOWN.to_string(),
            title_visible: false,
            time_text: "12".to_string(),
            bell_visible: true,
            volume: VolumeCheckView {
                control: Some(40),
                low_volume_hint: true,
            },
            keep_awake: true,
        };
        assert_eq!(
            render_line(&view),
            "🔔 12 | volume 40% | Let's increase audio volume"
        );
    }

    #[test]
    fn hidden_title_is_not_rendered() {
        let view = View {
            title: TITLE_AFTER.to_string(),
            title_visible: false,
            time_text: "7".to_string(),
            ..View::default()
        };
        assert_eq!(render_line(&view), "7");
    }
}
