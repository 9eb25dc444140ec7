//! Brush dispatch: a closed set of drawing tools behind one capability
//! interface.
//!
//! Every brush implements the same contract — `draw` renders one pointer
//! sample into the canvas, `sync_data` packages the minimal reproducible
//! description of that draw for the wire. The *same* `draw` runs on the
//! origin peer and on every replaying peer; handed the same parameter bag,
//! both produce the same primitives, which is the whole consistency model.
//!
//! Brushes live in a registry keyed by identifier. Dispatch against an
//! unknown identifier is a silent no-op: one peer's unsupported brush never
//! takes down another peer's session.

mod bucket;
mod classic;
mod sprinkler;

pub use bucket::{BucketBrush, BUCKET_BRUSH_ID};
pub use classic::{ClassicBrush, CLASSIC_BRUSH_ID};
pub use sprinkler::{SprinklerBrush, SPRINKLER_BRUSH_ID};

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::canvas::Canvas;
use crate::color::Rgba;
use crate::geometry::Vec2;
use crate::particle::ParticleSpawn;

/// One pointer sample, in normalized [0, 1] coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StrokeSample {
    pub position: Vec2,
    /// Previous sample of the same gesture, if any. Direction-dependent
    /// brushes derive their angle from `from → position`.
    pub from: Option<Vec2>,
}

impl StrokeSample {
    pub fn at(position: Vec2) -> Self {
        Self { position, from: None }
    }

    pub fn with_from(position: Vec2, from: Vec2) -> Self {
        Self { position, from: Some(from) }
    }
}

/// Brush-specific parameter bag, the `params` payload of a drawing event.
///
/// Sizes and speeds are in canvas pixels; embedded positions are normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BrushParams {
    /// Round stamped strokes.
    Classic {
        size: f32,
        color: Rgba,
        segments: u32,
    },
    /// Deterministic particle burst. Carries the base seed plus the derived
    /// inputs to recompute every particle, and optionally the fully expanded
    /// spawn list — preferred on replay because it stays bit-identical even
    /// if derivation logic ever diverges between builds.
    Sprinkler {
        seed: u32,
        direction: f32,
        speed: f32,
        count: u32,
        size: f32,
        segments: u32,
        expanded: Option<Vec<ParticleSpawn>>,
    },
    /// Area fill.
    Bucket {
        color: Rgba,
        tolerance: u8,
    },
}

impl BrushParams {
    pub fn classic(size: f32, color: Rgba) -> Self {
        Self::Classic { size, color, segments: 1 }
    }

    pub fn sprinkler(count: u32, size: f32) -> Self {
        Self::Sprinkler {
            seed: 0,
            direction: 0.0,
            speed: 0.0,
            count,
            size,
            segments: 1,
            expanded: None,
        }
    }

    pub fn bucket(color: Rgba, tolerance: u8) -> Self {
        Self::Bucket { color, tolerance }
    }

    /// The identifier of the brush this bag belongs to.
    pub fn brush_id(&self) -> &'static str {
        match self {
            Self::Classic { .. } => CLASSIC_BRUSH_ID,
            Self::Sprinkler { .. } => SPRINKLER_BRUSH_ID,
            Self::Bucket { .. } => BUCKET_BRUSH_ID,
        }
    }

    /// Radial symmetry segment count; 1 where the brush has no symmetry.
    pub fn segments(&self) -> u32 {
        match self {
            Self::Classic { segments, .. } | Self::Sprinkler { segments, .. } => *segments,
            Self::Bucket { .. } => 1,
        }
    }

    /// Set the symmetry segment count on brushes that support it.
    pub fn set_segments(&mut self, n: u32) {
        match self {
            Self::Classic { segments, .. } | Self::Sprinkler { segments, .. } => *segments = n,
            Self::Bucket { .. } => {}
        }
    }

    /// Install a fresh base seed on brushes that derive from one. Called at
    /// gesture start; the seed then stays fixed for the whole gesture.
    pub fn reseed(&mut self, seed: u32) {
        if let Self::Sprinkler { seed: s, expanded, .. } = self {
            *s = seed;
            *expanded = None;
        }
    }
}

/// The brush capability contract.
pub trait Brush: Send + Sync {
    /// Registry identifier.
    fn id(&self) -> &'static str;

    /// Render one sample into the canvas. Runs identically on the origin
    /// peer and on every replaying peer; a bag the brush does not recognize
    /// is ignored.
    fn draw(&self, canvas: &mut Canvas, sample: StrokeSample, params: &BrushParams);

    /// The minimal reproducible description of this draw for the wire.
    fn sync_data(&self, sample: StrokeSample, params: &BrushParams) -> BrushParams;
}

/// Lookup table of available brushes, keyed by identifier.
pub struct BrushRegistry {
    brushes: HashMap<&'static str, Box<dyn Brush>>,
}

impl BrushRegistry {
    pub fn new() -> Self {
        Self { brushes: HashMap::new() }
    }

    /// Registry with the built-in brush set.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(ClassicBrush));
        registry.register(Box::new(SprinklerBrush));
        registry.register(Box::new(BucketBrush));
        registry
    }

    /// Register a brush; a later registration replaces an earlier one with
    /// the same identifier.
    pub fn register(&mut self, brush: Box<dyn Brush>) {
        self.brushes.insert(brush.id(), brush);
    }

    pub fn get(&self, id: &str) -> Option<&dyn Brush> {
        self.brushes.get(id).map(|b| b.as_ref())
    }

    pub fn ids(&self) -> Vec<&'static str> {
        self.brushes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.brushes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.brushes.is_empty()
    }
}

impl Default for BrushRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}
