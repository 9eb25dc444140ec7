//! The classic brush: round stamped strokes.

use crate::brush::{Brush, BrushParams, StrokeSample};
use crate::canvas::Canvas;
use crate::symmetry::{replicate, RadialArgs};

pub const CLASSIC_BRUSH_ID: &str = "classic";

/// Solid round brush. A sample with a previous point strokes a line segment;
/// a lone sample stamps a dot.
pub struct ClassicBrush;

impl Brush for ClassicBrush {
    fn id(&self) -> &'static str {
        CLASSIC_BRUSH_ID
    }

    fn draw(&self, canvas: &mut Canvas, sample: StrokeSample, params: &BrushParams) {
        let BrushParams::Classic { size, color, segments } = params else {
            log::debug!("classic brush handed {} params; ignoring", params.brush_id());
            return;
        };

        let to = canvas.to_canvas(sample.position);
        let from = sample.from.map(|f| canvas.to_canvas(f));
        let center = canvas.center();

        replicate(center, *segments, RadialArgs::at(to).with_from(from), |args| {
            match args.from {
                Some(f) => canvas.buffer_mut().stroke_line(f, args.position, *size, *color),
                None => canvas.buffer_mut().stamp_disc(args.position, *size * 0.5, *color),
            }
        });
    }

    fn sync_data(&self, _sample: StrokeSample, params: &BrushParams) -> BrushParams {
        // Nothing stochastic to capture: size, color and symmetry replay as-is.
        params.clone()
    }
}
