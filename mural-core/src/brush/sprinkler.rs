//! The sprinkler brush: seeded particle bursts.
//!
//! Each sample sprays a burst of particles whose attributes derive from a
//! base seed, so peers reproduce the burst from a few dozen bytes instead of
//! receiving pixels. The origin expands the burst once and ships the spawn
//! list; receivers use the shipped list when present and re-derive from the
//! seed otherwise.

use crate::brush::{Brush, BrushParams, StrokeSample};
use crate::canvas::Canvas;
use crate::geometry::Vec2;
use crate::particle::expand_burst;
use crate::symmetry::{replicate, RadialArgs};

pub const SPRINKLER_BRUSH_ID: &str = "sprinkler";

/// Normalized pointer delta → particle speed in px/s.
const SPEED_GAIN: f32 = 30_000.0;
const SPEED_MIN: f32 = 40.0;
const SPEED_MAX: f32 = 400.0;

pub struct SprinklerBrush;

impl Brush for SprinklerBrush {
    fn id(&self) -> &'static str {
        SPRINKLER_BRUSH_ID
    }

    fn draw(&self, canvas: &mut Canvas, sample: StrokeSample, params: &BrushParams) {
        let BrushParams::Sprinkler { seed, direction, speed, count, size, segments, expanded } =
            params
        else {
            log::debug!("sprinkler brush handed {} params; ignoring", params.brush_id());
            return;
        };

        let spawns = match expanded {
            Some(list) => list.clone(),
            None => expand_burst(*seed, sample.position, *direction, *speed, *count, *size),
        };

        let center = canvas.center();
        for spawn in &spawns {
            let position = canvas.to_canvas(spawn.position);
            let args = RadialArgs::at(position).with_velocity(spawn.velocity);
            replicate(center, *segments, args, |copy| {
                canvas.particles_mut().spawn(
                    copy.position,
                    copy.velocity.unwrap_or(Vec2::ZERO),
                    spawn.size,
                    spawn.color_seed,
                );
            });
        }
    }

    fn sync_data(&self, sample: StrokeSample, params: &BrushParams) -> BrushParams {
        let BrushParams::Sprinkler { seed, count, size, segments, .. } = params else {
            return params.clone();
        };

        let from = sample.from.unwrap_or(sample.position);
        let delta = sample.position - from;
        let direction = if delta.length() > 0.0 { delta.angle() } else { 0.0 };
        let speed = (delta.length() * SPEED_GAIN).clamp(SPEED_MIN, SPEED_MAX);

        BrushParams::Sprinkler {
            seed: *seed,
            direction,
            speed,
            count: *count,
            size: *size,
            segments: *segments,
            expanded: Some(expand_burst(*seed, sample.position, direction, speed, *count, *size)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn seeded_params(seed: u32) -> BrushParams {
        let mut params = BrushParams::sprinkler(12, 6.0);
        params.reseed(seed);
        params
    }

    #[test]
    fn test_sync_data_embeds_expansion() {
        let sample =
            StrokeSample::with_from(Vec2::new(0.52, 0.5), Vec2::new(0.5, 0.5));
        let bag = SprinklerBrush.sync_data(sample, &seeded_params(7));
        match bag {
            BrushParams::Sprinkler { seed, expanded, direction, speed, .. } => {
                assert_eq!(seed, 7);
                assert_eq!(expanded.unwrap().len(), 12);
                assert!(direction.is_finite());
                assert!(speed >= SPEED_MIN && speed <= SPEED_MAX);
            }
            other => panic!("expected sprinkler bag, got {other:?}"),
        }
    }

    #[test]
    fn test_sync_data_without_from_is_finite() {
        let bag = SprinklerBrush.sync_data(StrokeSample::at(Vec2::new(0.5, 0.5)), &seeded_params(7));
        match bag {
            BrushParams::Sprinkler { direction, speed, .. } => {
                assert!(direction.is_finite());
                assert!(speed.is_finite());
            }
            other => panic!("expected sprinkler bag, got {other:?}"),
        }
    }

    #[test]
    fn test_expanded_and_derived_replay_agree() {
        // A receiver without the expanded list derives the same particles.
        let sample =
            StrokeSample::with_from(Vec2::new(0.51, 0.48), Vec2::new(0.5, 0.5));
        let bag = SprinklerBrush.sync_data(sample, &seeded_params(42));

        let stripped = match &bag {
            BrushParams::Sprinkler { seed, direction, speed, count, size, segments, .. } => {
                BrushParams::Sprinkler {
                    seed: *seed,
                    direction: *direction,
                    speed: *speed,
                    count: *count,
                    size: *size,
                    segments: *segments,
                    expanded: None,
                }
            }
            other => panic!("expected sprinkler bag, got {other:?}"),
        };

        let mut with_list = Canvas::new(300, 300);
        let mut derived = Canvas::new(300, 300);
        SprinklerBrush.draw(&mut with_list, sample, &bag);
        SprinklerBrush.draw(&mut derived, sample, &stripped);

        assert_eq!(with_list.particles().particles(), derived.particles().particles());
    }

    #[test]
    fn test_draw_spawns_count_particles() {
        let mut canvas = Canvas::new(200, 200);
        let bag = SprinklerBrush.sync_data(
            StrokeSample::with_from(Vec2::new(0.5, 0.5), Vec2::new(0.4, 0.5)),
            &seeded_params(3),
        );
        SprinklerBrush.draw(&mut canvas, StrokeSample::at(Vec2::new(0.5, 0.5)), &bag);
        assert_eq!(canvas.particles().len(), 12);
    }

    #[test]
    fn test_draw_with_segments_multiplies_particles() {
        let mut canvas = Canvas::new(200, 200);
        let mut params = seeded_params(3);
        params.set_segments(4);
        let bag = SprinklerBrush.sync_data(
            StrokeSample::with_from(Vec2::new(0.5, 0.4), Vec2::new(0.5, 0.5)),
            &params,
        );
        SprinklerBrush.draw(&mut canvas, StrokeSample::at(Vec2::new(0.5, 0.4)), &bag);
        assert_eq!(canvas.particles().len(), 12 * 4);
    }

    #[test]
    fn test_foreign_params_ignored() {
        let mut canvas = Canvas::new(50, 50);
        let params = BrushParams::classic(4.0, crate::color::Rgba::BLACK);
        SprinklerBrush.draw(&mut canvas, StrokeSample::at(Vec2::new(0.5, 0.5)), &params);
        assert!(canvas.particles().is_empty());
    }

    #[test]
    fn test_gesture_seed_stability() {
        // sync_data never rewrites the seed: a whole gesture derives from
        // the seed installed at gesture start.
        let params = seeded_params(1234);
        let mut bag = params.clone();
        for i in 0..5 {
            let t = i as f32 * 0.01;
            let sample = StrokeSample::with_from(
                Vec2::new(0.5 + t, 0.5),
                Vec2::new(0.49 + t, 0.5),
            );
            bag = SprinklerBrush.sync_data(sample, &bag);
            match &bag {
                BrushParams::Sprinkler { seed, .. } => assert_eq!(*seed, 1234),
                other => panic!("expected sprinkler bag, got {other:?}"),
            }
        }
    }
}
