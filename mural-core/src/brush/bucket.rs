//! The bucket brush: area fill through the same dispatch path as any other
//! brush, so fills originate and replay exactly like strokes.

use crate::brush::{Brush, BrushParams, StrokeSample};
use crate::canvas::Canvas;
use crate::fill::{flood_fill, DEFAULT_FILL_BUDGET};

pub const BUCKET_BRUSH_ID: &str = "bucket";

pub struct BucketBrush;

impl Brush for BucketBrush {
    fn id(&self) -> &'static str {
        BUCKET_BRUSH_ID
    }

    fn draw(&self, canvas: &mut Canvas, sample: StrokeSample, params: &BrushParams) {
        let BrushParams::Bucket { color, tolerance } = params else {
            log::debug!("bucket brush handed {} params; ignoring", params.brush_id());
            return;
        };

        let p = canvas.to_canvas(sample.position);
        // Normalized 1.0 lands on the edge; pull it onto the last pixel.
        let x = (p.x.floor() as i32).min(canvas.width() as i32 - 1);
        let y = (p.y.floor() as i32).min(canvas.height() as i32 - 1);

        let report =
            flood_fill(canvas.buffer_mut(), x, y, *color, *tolerance, DEFAULT_FILL_BUDGET);
        log::trace!(
            "bucket fill at ({x},{y}): {} pixels, completed={}",
            report.pixels_filled,
            report.completed
        );
    }

    fn sync_data(&self, _sample: StrokeSample, params: &BrushParams) -> BrushParams {
        params.clone()
    }
}
