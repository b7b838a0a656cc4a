use super::trail::Trail;
use crate::models::Phase;
use crate::trajectory::warp::{screen_y, warp_percent};

/// Above this the line is drawn in the "high" tone.
pub const HIGH_TONE_THRESHOLD: f64 = 110.0;

/// Colour family of the line and head.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    Negative,
    Positive,
    High,
}

impl Tone {
    pub fn for_value(v: f64) -> Self {
        if v > HIGH_TONE_THRESHOLD {
            Tone::High
        } else if v > 0.0 {
            Tone::Positive
        } else {
            Tone::Negative
        }
    }
}

/// Betting countdown overlay.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Countdown {
    /// Whole seconds left, rounded up.
    pub remaining_secs: i64,
    /// Elapsed share of the betting window, 0..1.
    pub progress: f64,
}

impl Countdown {
    pub fn new(elapsed_ms: f64, betting_duration_ms: i64) -> Self {
        let duration = betting_duration_ms.max(1) as f64;
        let max_secs = (duration / 1000.0).ceil().max(1.0) as i64;
        let remaining = ((duration - elapsed_ms) / 1000.0).ceil() as i64;
        Self {
            remaining_secs: remaining.clamp(0, max_secs),
            progress: (elapsed_ms / duration).clamp(0.0, 1.0),
        }
    }
}

/// Everything a surface needs to paint one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Virtual time of the frame, ms.
    pub now_ms: f64,
    /// None until the first poll lands.
    pub phase: Option<Phase>,
    pub value: f64,
    /// `value` warped into (-1, 1) for vertical placement.
    pub head_y: f64,
    /// Horizontal head position, 0..1.
    pub head_x: f64,
    /// Horizontal position of the oldest trail point; negative once it has
    /// scrolled off the left edge.
    pub tail_x: Option<f64>,
    pub tone: Tone,
    /// Percentage label, hidden while betting.
    pub badge: Option<String>,
    pub countdown: Option<Countdown>,
    pub round_id: Option<String>,
    /// Settled outcomes, newest first.
    pub recent: Vec<f64>,
}

impl Frame {
    pub fn new(now_ms: f64, phase: Option<Phase>, value: f64, head_x: f64) -> Self {
        let badge = match phase {
            Some(Phase::Revealing) | Some(Phase::Settled) => Some(format!("{value:.0}%")),
            _ => None,
        };
        Self {
            now_ms,
            phase,
            value,
            head_y: warp_percent(value),
            head_x,
            tail_x: None,
            tone: Tone::for_value(value),
            badge,
            countdown: None,
            round_id: None,
            recent: Vec::new(),
        }
    }
}

/// Recent outcomes as `▲42 ▼-13 …`; zero counts as up.
pub fn outcome_strip(recent: &[f64]) -> String {
    recent
        .iter()
        .map(|v| {
            let marker = if *v >= 0.0 { '▲' } else { '▼' };
            format!("{marker}{v:.0}")
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Drawing surface driven by the viewer's frame loop.
pub trait Renderer {
    fn draw(&mut self, frame: &Frame, trail: &Trail);

    /// Called once when the loop stops.
    fn finish(&mut self) {}
}

/// Renders frames as throttled structured log lines.
#[derive(Debug)]
pub struct LogRenderer {
    every: u64,
    frames: u64,
    /// Height of the imaginary plot the head row is reported against.
    plot_rows: f64,
}

impl LogRenderer {
    pub fn new(every: u64, plot_rows: f64) -> Self {
        Self {
            every: every.max(1),
            frames: 0,
            plot_rows: plot_rows.max(1.0),
        }
    }

    /// Row of the head in a `plot_rows`-high plot, 0 at the top.
    pub fn head_row(&self, frame: &Frame) -> f64 {
        screen_y(frame.value, 0.0, self.plot_rows)
    }
}

impl Renderer for LogRenderer {
    fn draw(&mut self, frame: &Frame, trail: &Trail) {
        self.frames += 1;
        if self.frames % self.every != 0 {
            return;
        }

        tracing::info!(
            phase = frame.phase.map(|p| p.as_str()).unwrap_or("WAITING"),
            round_id = frame.round_id.as_deref().unwrap_or("-"),
            value = format_args!("{:.2}", frame.value),
            head_y = format_args!("{:.3}", frame.head_y),
            row = format_args!("{:.1}", self.head_row(frame)),
            head_x = format_args!("{:.2}", frame.head_x),
            tail_x = frame.tail_x.map(|x| (x * 100.0).round() / 100.0),
            tone = ?frame.tone,
            badge = frame.badge.as_deref().unwrap_or(""),
            countdown = frame.countdown.map(|c| c.remaining_secs),
            trail = trail.len(),
            recent = %outcome_strip(&frame.recent),
            "frame"
        );
    }

    fn finish(&mut self) {
        tracing::info!(frames = self.frames, "Viewer stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_countdown_rounds_up_and_clamps() {
        let c = Countdown::new(0.0, 7_000);
        assert_eq!(c.remaining_secs, 7);
        assert_eq!(c.progress, 0.0);

        let c = Countdown::new(6_100.0, 7_000);
        assert_eq!(c.remaining_secs, 1);

        let c = Countdown::new(9_000.0, 7_000);
        assert_eq!(c.remaining_secs, 0);
        assert_eq!(c.progress, 1.0);

        let c = Countdown::new(-3_000.0, 7_000);
        assert_eq!(c.remaining_secs, 7);
    }

    #[test]
    fn test_badge_hidden_while_betting() {
        assert!(Frame::new(0.0, Some(Phase::Betting), 4.0, 0.85).badge.is_none());
        assert_eq!(
            Frame::new(0.0, Some(Phase::Revealing), 41.6, 0.85).badge.as_deref(),
            Some("42%")
        );
    }

    #[test]
    fn test_outcome_strip_marks_direction() {
        assert_eq!(outcome_strip(&[42.4, -13.0, 0.0]), "▲42 ▼-13 ▲0");
        assert_eq!(outcome_strip(&[]), "");
    }

    #[test]
    fn test_head_row_follows_warp() {
        let renderer = LogRenderer::new(1, 24.0);
        let flat = Frame::new(0.0, Some(Phase::Revealing), 0.0, 0.85);
        let up = Frame::new(0.0, Some(Phase::Revealing), 80.0, 0.85);
        let down = Frame::new(0.0, Some(Phase::Revealing), -80.0, 0.85);
        assert_eq!(renderer.head_row(&flat), 12.0);
        assert!(renderer.head_row(&up) < 12.0);
        assert!(renderer.head_row(&down) > 12.0);
        assert!(renderer.head_row(&up) >= 0.0 && renderer.head_row(&down) <= 24.0);
    }

    #[test]
    fn test_tone_bands() {
        assert_eq!(Tone::for_value(-1.0), Tone::Negative);
        assert_eq!(Tone::for_value(0.0), Tone::Negative);
        assert_eq!(Tone::for_value(50.0), Tone::Positive);
        assert_eq!(Tone::for_value(111.0), Tone::High);
    }
}
