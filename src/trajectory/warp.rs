use crate::models::clamp_percent;

/// Scale of the tanh warp above zero.
pub const POSITIVE_SCALE: f64 = 18.0;
/// Scale of the tanh warp below zero.
pub const NEGATIVE_SCALE: f64 = 22.0;
/// Power applied after the tanh; below 1 it lifts small values.
pub const SHARPEN: f64 = 0.85;
/// Share of the plot height one side of the warp may use.
pub const VERTICAL_SPAN: f64 = 0.46;

/// Map a percentage onto (-1, 1) for drawing, spending more resolution near 0.
///
/// Display only: the result must never be fed back into synthesized values.
pub fn warp_percent(p: f64) -> f64 {
    let x = clamp_percent(p);
    let k = if x >= 0.0 { POSITIVE_SCALE } else { NEGATIVE_SCALE };
    let w = (x / k).tanh();
    w.signum() * w.abs().powf(SHARPEN)
}

/// Vertical pixel position of `p` inside a plot (y grows downward).
pub fn screen_y(p: f64, plot_top: f64, plot_height: f64) -> f64 {
    plot_top + plot_height / 2.0 - warp_percent(p) * (plot_height * VERTICAL_SPAN)
}
