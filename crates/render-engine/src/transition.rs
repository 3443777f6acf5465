//! Clip boundary transitions.

use cutline_project_model::{Clip, TransitionKind};

use crate::frame::{Frame, PixelBuffer, CHANNELS};

/// Transition progress for `clip` at `time`, or `None` when the clip has no
/// transition or `time` is outside both transition windows.
///
/// Entering, progress runs `0 -> 1` over the first `transitionDuration`
/// seconds; leaving, it runs `1 -> 0` over the last. Where the windows
/// overlap the smaller value wins.
pub fn transition_progress(clip: &Clip, time: f64) -> Option<f64> {
    let td = clip.transition_duration;
    if clip.transition.is_none() || td.is_nan() || td <= 0.0 {
        return None;
    }

    let entering = time - clip.start_time;
    let leaving = clip.end_time() - time;
    let windows = [entering, leaving]
        .into_iter()
        .filter(|&d| d < td)
        .map(|d| (d / td).clamp(0.0, 1.0));
    windows.reduce(f64::min)
}

/// Apply a transition at `progress` to a clip layer.
pub fn apply_transition(layer: &mut Frame, kind: TransitionKind, progress: f64) {
    let progress = progress.clamp(0.0, 1.0);
    match kind {
        TransitionKind::Fade | TransitionKind::Dissolve => layer.multiply_alpha(progress),
        TransitionKind::WipeLeft | TransitionKind::WipeRight => {
            let width = layer.width() as usize;
            let visible = (progress * width as f64).round() as usize;
            let hidden = |x: usize| match kind {
                TransitionKind::WipeLeft => x >= visible,
                _ => x < width - visible,
            };
            for row in layer.pixels_mut().chunks_exact_mut(width.max(1) * CHANNELS) {
                for (x, px) in row.chunks_exact_mut(CHANNELS).enumerate() {
                    if hidden(x) {
                        px[3] = 0;
                    }
                }
            }
        }
    }
}
