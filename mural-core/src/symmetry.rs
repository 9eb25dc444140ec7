//! Radial replication (kaleidoscope) transform.
//!
//! A draw call is replicated N times, rotated evenly about a shared center.
//! Every peer applies the same transform with the same center, so the
//! replicated copies line up across the session. Positions rotate about the
//! center; direction vectors (velocities) rotate in place by the same angle
//! so a rotated particle's motion stays consistent with its rotated frame.

use std::f32::consts::TAU;

use crate::geometry::Vec2;

/// The positional and directional quantities of one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RadialArgs {
    /// Primary position, canvas coordinates.
    pub position: Vec2,
    /// Trailing point of a line segment, if the primitive has one.
    pub from: Option<Vec2>,
    /// Direction vector, if the primitive has one.
    pub velocity: Option<Vec2>,
}

impl RadialArgs {
    pub fn at(position: Vec2) -> Self {
        Self { position, from: None, velocity: None }
    }

    pub fn with_from(mut self, from: Option<Vec2>) -> Self {
        self.from = from;
        self
    }

    pub fn with_velocity(mut self, velocity: Vec2) -> Self {
        self.velocity = Some(velocity);
        self
    }
}

/// Invoke `f` once per segment with `args` rotated by `i·2π/N` about
/// `center`. With `segments <= 1` the transform is a no-op: `f` runs exactly
/// once with `args` unmodified.
pub fn replicate<F: FnMut(RadialArgs)>(center: Vec2, segments: u32, args: RadialArgs, mut f: F) {
    if segments <= 1 {
        f(args);
        return;
    }
    let step = TAU / segments as f32;
    for i in 0..segments {
        let angle = step * i as f32;
        f(RadialArgs {
            position: args.position.rotate_about(&center, angle),
            from: args.from.map(|p| p.rotate_about(&center, angle)),
            velocity: args.velocity.map(|v| v.rotate(angle)),
        });
    }
}
