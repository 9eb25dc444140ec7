//! One peer's drawing surface: pixels, particles, and the shared state every
//! brush needs.
//!
//! The canvas owns the pixel buffer and the particle system together so a
//! single `tick` advances the whole animated state without locking — pointer
//! input, remote replay, and the tick are non-overlapping tasks on one loop.

use crate::buffer::PixelBuffer;
use crate::color::Rgba;
use crate::geometry::Vec2;
use crate::noise::FlowField;
use crate::particle::ParticleSystem;

pub struct Canvas {
    buffer: PixelBuffer,
    particles: ParticleSystem,
    flow: Option<FlowField>,
    /// Shared center for the radial symmetry transform, canvas coordinates.
    /// Must agree across peers or kaleidoscope output diverges.
    center: Vec2,
    background: Rgba,
}

impl Canvas {
    /// A white canvas with the symmetry center at its middle.
    pub fn new(width: u32, height: u32) -> Self {
        Self::with_background(width, height, Rgba::WHITE)
    }

    pub fn with_background(width: u32, height: u32, background: Rgba) -> Self {
        Self {
            buffer: PixelBuffer::filled(width, height, background),
            particles: ParticleSystem::new(),
            flow: None,
            center: Vec2::new(width as f32 / 2.0, height as f32 / 2.0),
            background,
        }
    }

    pub fn width(&self) -> u32 {
        self.buffer.width()
    }

    pub fn height(&self) -> u32 {
        self.buffer.height()
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    pub fn buffer_mut(&mut self) -> &mut PixelBuffer {
        &mut self.buffer
    }

    pub fn particles(&self) -> &ParticleSystem {
        &self.particles
    }

    pub fn particles_mut(&mut self) -> &mut ParticleSystem {
        &mut self.particles
    }

    /// Rescale a normalized [0, 1] position to this canvas's dimensions.
    pub fn to_canvas(&self, normalized: Vec2) -> Vec2 {
        Vec2::new(
            normalized.x.clamp(0.0, 1.0) * self.width() as f32,
            normalized.y.clamp(0.0, 1.0) * self.height() as f32,
        )
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    /// Override the shared symmetry center (canvas coordinates).
    pub fn set_center(&mut self, center: Vec2) {
        self.center = center;
    }

    /// Install a flow field from its shared (seed, cell size, z) description.
    pub fn set_flow_field(&mut self, seed: u32, cell_size: f32, z: f32) {
        self.flow = Some(FlowField::with_offset(seed, cell_size, z));
    }

    pub fn flow_field(&self) -> Option<&FlowField> {
        self.flow.as_ref()
    }

    /// Reset pixels to the background and drop all live particles.
    /// Idempotent; repeated or reordered clears are harmless.
    pub fn clear(&mut self) {
        self.buffer.clear(self.background);
        self.particles.clear();
    }

    /// Advance animated state by `dt` seconds: particles integrate, paint
    /// their dabs, and expire; the flow field drifts forward in time.
    pub fn tick(&mut self, dt: f32) {
        if let Some(flow) = &mut self.flow {
            flow.advance(dt);
        }
        self.particles.tick(dt, self.flow.as_ref(), &mut self.buffer);
    }
}
