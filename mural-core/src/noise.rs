//! Seeded coherent noise and the flow field that steers particles.
//!
//! A `NoiseField` is a deterministic function of (seed, x, y, z): the same
//! inputs produce the same output on every peer, so a whole animated
//! directional field can be shared by synchronizing only the seed and the
//! current z offset — never the field itself.

use std::f32::consts::TAU;

use crate::geometry::Vec2;
use crate::rng::next_seed;

/// Seeded 3D value noise over an integer lattice.
#[derive(Debug, Clone, Copy)]
pub struct NoiseField {
    seed: u32,
}

impl NoiseField {
    pub fn new(seed: u32) -> Self {
        Self { seed }
    }

    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Hash one lattice corner to [0, 1).
    fn lattice(&self, x: i32, y: i32, z: i32) -> f32 {
        let h = (x as u32).wrapping_mul(1_619)
            ^ (y as u32).wrapping_mul(31_337)
            ^ (z as u32).wrapping_mul(6_971)
            ^ self.seed.wrapping_mul(1_013);
        // Two LCG steps to break up lattice artifacts from the xor mix.
        (next_seed(next_seed(h)) >> 8) as f32 / 16_777_216.0
    }

    /// Smoothly interpolated noise value in [0, 1) at a continuous point.
    pub fn sample(&self, x: f32, y: f32, z: f32) -> f32 {
        let (x0, fx) = split(x);
        let (y0, fy) = split(y);
        let (z0, fz) = split(z);

        let (ux, uy, uz) = (fade(fx), fade(fy), fade(fz));

        let corner = |dx: i32, dy: i32, dz: i32| self.lattice(x0 + dx, y0 + dy, z0 + dz);

        let xy0 = lerp(
            lerp(corner(0, 0, 0), corner(1, 0, 0), ux),
            lerp(corner(0, 1, 0), corner(1, 1, 0), ux),
            uy,
        );
        let xy1 = lerp(
            lerp(corner(0, 0, 1), corner(1, 0, 1), ux),
            lerp(corner(0, 1, 1), corner(1, 1, 1), ux),
            uy,
        );
        lerp(xy0, xy1, uz)
    }

    /// Direction angle in [0, 2π) at grid cell (col, row), time offset z.
    pub fn angle(&self, col: f32, row: f32, z: f32) -> f32 {
        self.sample(col, row, z) * TAU
    }
}

/// Integer cell and fractional offset, correct for negative coordinates.
fn split(v: f32) -> (i32, f32) {
    let floor = v.floor();
    (floor as i32, v - floor)
}

/// Smoothstep fade: t² (3 − 2t).
fn fade(t: f32) -> f32 {
    t * t * (3.0 - 2.0 * t)
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

/// A grid view over a `NoiseField` that animates over time.
///
/// Positions are mapped to lattice cells by `cell_size` (canvas pixels per
/// cell); `advance` moves the field through its third dimension so the
/// directions drift smoothly. Peers that share seed and z agree on every
/// angle.
#[derive(Debug, Clone, Copy)]
pub struct FlowField {
    noise: NoiseField,
    cell_size: f32,
    z: f32,
}

impl FlowField {
    pub fn new(seed: u32, cell_size: f32) -> Self {
        Self::with_offset(seed, cell_size, 0.0)
    }

    /// Reconstruct a field at a shared time offset.
    pub fn with_offset(seed: u32, cell_size: f32, z: f32) -> Self {
        Self {
            noise: NoiseField::new(seed),
            cell_size: cell_size.max(1.0),
            z,
        }
    }

    pub fn seed(&self) -> u32 {
        self.noise.seed()
    }

    pub fn z(&self) -> f32 {
        self.z
    }

    /// Evolve the field through time.
    pub fn advance(&mut self, dz: f32) {
        self.z += dz;
    }

    /// Flow direction at a canvas-space position.
    pub fn angle_at(&self, position: Vec2) -> f32 {
        self.noise
            .angle(position.x / self.cell_size, position.y / self.cell_size, self.z)
    }
}
