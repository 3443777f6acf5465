use cutline_project_model::{Clip, ClipId, ClipKind, Effect, EffectKind, TransitionKind};
use cutline_render_engine::{apply_effects, transition_progress, Frame, PixelBuffer};
use proptest::prelude::*;

fn effect() -> impl Strategy<Value = Effect> {
    (0..EffectKind::ALL.len(), 0.0..=100.0f64)
        .prop_map(|(k, i)| Effect::new(EffectKind::ALL[k], i))
}

proptest! {
    #[test]
    fn effects_leave_alpha_untouched(
        pixels in proptest::collection::vec(any::<u8>(), 4 * 4 * 3),
        effects in proptest::collection::vec(effect(), 0..5),
    ) {
        let mut frame = Frame::from_rgba(4, 3, pixels.clone()).unwrap();
        apply_effects(&mut frame, &effects);
        let before: Vec<u8> = pixels.chunks_exact(4).map(|p| p[3]).collect();
        let after: Vec<u8> = frame.pixels().chunks_exact(4).map(|p| p[3]).collect();
        prop_assert_eq!(before, after);
    }

    #[test]
    fn transition_progress_stays_in_unit_range(
        start in 0.0..10.0f64,
        duration in 0.1..10.0f64,
        td in 0.01..5.0f64,
        offset in 0.0..1.0f64,
    ) {
        let mut clip = Clip::new(ClipId(1), ClipKind::Video, "c", start, duration);
        clip.transition = Some(TransitionKind::Fade);
        clip.transition_duration = td;
        let time = start + offset * duration;
        if let Some(p) = transition_progress(&clip, time) {
            prop_assert!((0.0..=1.0).contains(&p));
        }
    }
}
