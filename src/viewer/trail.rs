use std::collections::VecDeque;

use crate::trajectory::TrailPoint;

/// Horizontal framing of the chart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    /// Visible time span, ms.
    pub window_ms: f64,
    /// Where "now" sits across the width, 0..1.
    pub head_ratio: f64,
    /// Points this far left of the window are dropped, ms.
    pub prune_margin_ms: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            window_ms: 26_000.0,
            head_ratio: 0.85,
            prune_margin_ms: 2_500.0,
        }
    }
}

impl Camera {
    pub fn window_start(&self, now_ms: f64) -> f64 {
        now_ms - self.window_ms * self.head_ratio
    }

    /// Horizontal position of `t` in 0..1 of the plot width.
    pub fn x_ratio(&self, t: f64, now_ms: f64) -> f64 {
        (t - self.window_start(now_ms)) / self.window_ms
    }
}

/// The drawn line: time-ordered samples inside the camera window.
#[derive(Debug, Clone, Default)]
pub struct Trail {
    points: VecDeque<TrailPoint>,
}

impl Trail {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<TrailPoint> {
        self.points.front().copied()
    }

    pub fn last(&self) -> Option<TrailPoint> {
        self.points.back().copied()
    }

    /// Append a sample; samples older than the newest one are ignored.
    pub fn push(&mut self, point: TrailPoint) -> bool {
        if self.points.back().is_some_and(|last| point.t < last.t) {
            return false;
        }
        self.points.push_back(point);
        true
    }

    pub fn extend<I: IntoIterator<Item = TrailPoint>>(&mut self, points: I) {
        for p in points {
            self.push(p);
        }
    }

    /// Drop points left of the camera, keeping at least two for the line.
    pub fn prune(&mut self, camera: &Camera, now_ms: f64) {
        let cutoff = camera.window_start(now_ms) - camera.prune_margin_ms;
        while self.points.len() > 2 && self.points.front().is_some_and(|p| p.t < cutoff) {
            self.points.pop_front();
        }
    }

    pub fn points(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }
}
