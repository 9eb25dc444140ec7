//! Transient particles for animated brush effects.
//!
//! Particles never cross the wire as objects. A stroke ships a small burst
//! description (seed, direction, speed, count — or the fully expanded spawn
//! list) and every peer instantiates its own particle set from it; identical
//! inputs produce identical particles at construction time.

use serde::{Deserialize, Serialize};

use crate::buffer::PixelBuffer;
use crate::color::Rgba;
use crate::geometry::Vec2;
use crate::noise::FlowField;
use crate::rng::{linear_sequence, SeedStream};

/// Angular jitter applied around a burst's base direction, in radians.
const BURST_SPREAD: f32 = 0.9;
/// Positional jitter around a burst's origin, in normalized units.
const BURST_JITTER: f32 = 0.012;
/// Acceleration applied along the flow field direction, in px/s².
const FLOW_STRENGTH: f32 = 60.0;

/// One particle's attributes at construction, as shipped inside a stroke's
/// parameter bag. Position is normalized; velocity is in canvas px/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParticleSpawn {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    pub color_seed: u32,
}

/// A live particle, owned by the peer that created it.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    pub size: f32,
    /// Remaining lifetime, 1.0 at birth down to 0.
    pub life: f32,
    /// Lifetime lost per second.
    pub decay: f32,
    pub color: Rgba,
}

impl Particle {
    /// Construct from resolved canvas-space attributes. Color and decay are
    /// pure functions of the color seed, so every peer derives the same pair.
    pub fn new(position: Vec2, velocity: Vec2, size: f32, color_seed: u32) -> Self {
        Self {
            position,
            velocity,
            size,
            life: 1.0,
            decay: 0.6 + linear_sequence(color_seed) * 0.8,
            color: Rgba::from_seed(color_seed),
        }
    }
}

/// Deterministically expand a burst description into per-particle spawns.
///
/// `origin` is normalized; `direction` is radians; `speed` and `size` are in
/// canvas pixels. The expansion is a pure function of its arguments: origin
/// peers expand once and ship the result, and a receiver without the
/// expanded list recomputes exactly the same spawns from the seed.
pub fn expand_burst(
    seed: u32,
    origin: Vec2,
    direction: f32,
    speed: f32,
    count: u32,
    size: f32,
) -> Vec<ParticleSpawn> {
    let mut stream = SeedStream::new(seed);
    (0..count)
        .map(|_| {
            let angle = direction + (stream.next_f32() - 0.5) * BURST_SPREAD;
            let velocity = Vec2::from_angle(angle, speed * stream.next_range(0.4, 1.2));
            let jitter = Vec2::new(
                (stream.next_f32() - 0.5) * BURST_JITTER,
                (stream.next_f32() - 0.5) * BURST_JITTER,
            );
            ParticleSpawn {
                position: origin + jitter,
                velocity,
                size: size * stream.next_range(0.5, 1.5),
                color_seed: stream.next_u32(),
            }
        })
        .collect()
}

/// All live particles for one peer's surface.
#[derive(Debug, Default)]
pub struct ParticleSystem {
    particles: Vec<Particle>,
}

impl ParticleSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Instantiate one particle at a resolved canvas-space position.
    pub fn spawn(&mut self, position: Vec2, velocity: Vec2, size: f32, color_seed: u32) {
        self.particles.push(Particle::new(position, velocity, size, color_seed));
    }

    /// Drop all live particles without painting.
    pub fn clear(&mut self) {
        self.particles.clear();
    }

    /// Advance the simulation by `dt` seconds, painting each particle's dab
    /// into `buffer` as it moves.
    ///
    /// Dead entries are removed in a single reverse pass with swap-with-last,
    /// so removal stays O(1) per particle regardless of population.
    pub fn tick(&mut self, dt: f32, flow: Option<&FlowField>, buffer: &mut PixelBuffer) {
        for p in &mut self.particles {
            if let Some(field) = flow {
                let steer = Vec2::from_angle(field.angle_at(p.position), FLOW_STRENGTH);
                p.velocity = p.velocity + steer * dt;
            }
            p.position = p.position + p.velocity * dt;
            p.life -= p.decay * dt;
            if p.life > 0.0 {
                let radius = p.size * 0.5 * p.life;
                buffer.stamp_disc(p.position, radius, p.color.with_alpha_scaled(p.life));
            }
        }

        for i in (0..self.particles.len()).rev() {
            if self.particles[i].life <= 0.0 {
                self.particles.swap_remove(i);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst() -> Vec<ParticleSpawn> {
        expand_burst(4242, Vec2::new(0.5, 0.5), 1.2, 120.0, 16, 8.0)
    }

    #[test]
    fn test_expand_burst_deterministic() {
        assert_eq!(burst(), burst());
    }

    #[test]
    fn test_expand_burst_count() {
        assert_eq!(burst().len(), 16);
        assert!(expand_burst(1, Vec2::ZERO, 0.0, 1.0, 0, 1.0).is_empty());
    }

    #[test]
    fn test_expand_burst_seed_changes_everything() {
        let a = expand_burst(1, Vec2::new(0.5, 0.5), 1.2, 120.0, 8, 8.0);
        let b = expand_burst(2, Vec2::new(0.5, 0.5), 1.2, 120.0, 8, 8.0);
        assert_ne!(a, b);
    }

    #[test]
    fn test_expand_burst_spawns_near_origin() {
        for spawn in burst() {
            assert!((spawn.position.x - 0.5).abs() <= BURST_JITTER);
            assert!((spawn.position.y - 0.5).abs() <= BURST_JITTER);
        }
    }

    #[test]
    fn test_expand_burst_direction_within_spread() {
        for spawn in burst() {
            let angle = spawn.velocity.angle();
            assert!((angle - 1.2).abs() <= BURST_SPREAD / 2.0 + 1e-5);
        }
    }

    #[test]
    fn test_replay_identical_particle_sets() {
        // Consuming the same expanded bag on two independent systems yields
        // pairwise-identical particles at construction time.
        let spawns = burst();
        let mut left = ParticleSystem::new();
        let mut right = ParticleSystem::new();
        for s in &spawns {
            left.spawn(s.position * 600.0, s.velocity, s.size, s.color_seed);
            right.spawn(s.position * 600.0, s.velocity, s.size, s.color_seed);
        }
        assert_eq!(left.particles(), right.particles());
    }

    #[test]
    fn test_particle_color_and_decay_from_seed() {
        let a = Particle::new(Vec2::ZERO, Vec2::ZERO, 4.0, 777);
        let b = Particle::new(Vec2::new(9.0, 9.0), Vec2::ZERO, 2.0, 777);
        assert_eq!(a.color, b.color);
        assert_eq!(a.decay, b.decay);
        assert!(a.decay >= 0.6 && a.decay <= 1.4);
    }

    #[test]
    fn test_tick_integrates_position() {
        let mut system = ParticleSystem::new();
        system.spawn(Vec2::new(10.0, 10.0), Vec2::new(30.0, 0.0), 4.0, 1);
        let mut buffer = PixelBuffer::new(64, 64);
        system.tick(0.1, None, &mut buffer);
        let p = &system.particles()[0];
        assert!((p.position.x - 13.0).abs() < 1e-4);
        assert!((p.position.y - 10.0).abs() < 1e-4);
    }

    #[test]
    fn test_tick_paints_dabs() {
        let mut system = ParticleSystem::new();
        system.spawn(Vec2::new(32.0, 32.0), Vec2::ZERO, 8.0, 1);
        let mut buffer = PixelBuffer::new(64, 64);
        system.tick(0.016, None, &mut buffer);
        assert_ne!(buffer.pixel(32, 32), Some(Rgba::TRANSPARENT));
    }

    #[test]
    fn test_tick_removes_dead_particles() {
        let mut system = ParticleSystem::new();
        for i in 0..10 {
            system.spawn(Vec2::new(5.0, 5.0), Vec2::ZERO, 2.0, i);
        }
        let mut buffer = PixelBuffer::new(16, 16);
        // Max decay is 1.4/s, so 2 seconds of ticks kills everything.
        for _ in 0..20 {
            system.tick(0.1, None, &mut buffer);
        }
        assert!(system.is_empty());
    }

    #[test]
    fn test_tick_flow_field_bends_velocity() {
        let mut with_flow = ParticleSystem::new();
        let mut without = ParticleSystem::new();
        with_flow.spawn(Vec2::new(50.0, 50.0), Vec2::new(10.0, 0.0), 2.0, 3);
        without.spawn(Vec2::new(50.0, 50.0), Vec2::new(10.0, 0.0), 2.0, 3);

        let field = FlowField::new(21, 16.0);
        let mut buffer = PixelBuffer::new(128, 128);
        with_flow.tick(0.1, Some(&field), &mut buffer);
        without.tick(0.1, None, &mut buffer);

        assert_ne!(with_flow.particles()[0].velocity, without.particles()[0].velocity);
    }

    #[test]
    fn test_clear_drops_particles() {
        let mut system = ParticleSystem::new();
        system.spawn(Vec2::ZERO, Vec2::ZERO, 1.0, 1);
        system.clear();
        assert!(system.is_empty());
    }
}
