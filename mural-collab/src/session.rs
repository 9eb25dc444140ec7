//! Per-peer stroke synchronization: gesture tracking, outbound event
//! capture, and remote replay dispatch.
//!
//! State machine per pointer gesture:
//!
//! ```text
//! Idle ──pointer_down──► Active ──pointer_move──► Active ──pointer_up──► Idle
//!              │                      │
//!              ▼                      ▼
//!        local render +         local render +
//!        DrawEvent out          DrawEvent out
//! ```
//!
//! Local rendering is immediate and synchronous — the user never waits on a
//! round-trip to see their own stroke. The send/receive toggles live in an
//! explicit per-peer [`SessionOptions`] object (never globals) and gate only
//! the wire: disabling sends never suppresses local rendering.

use std::collections::HashSet;

use uuid::Uuid;

use mural_core::brush::{BrushParams, BrushRegistry, StrokeSample};
use mural_core::canvas::Canvas;
use mural_core::geometry::Vec2;

use crate::protocol::DrawEvent;

/// Below this normalized distance, the previous gesture point is replaced by
/// a synthesized minimally-offset one so direction-dependent brushes derive
/// a well-defined angle instead of NaN.
const MIN_SAMPLE_DISTANCE: f32 = 1e-4;

/// Per-peer synchronization switches and the session's brush allow-list.
#[derive(Debug, Clone)]
pub struct SessionOptions {
    /// Gate on outbound events only; local rendering is unaffected.
    pub send_enabled: bool,
    /// Gate on replaying inbound events.
    pub receive_enabled: bool,
    /// Brush identifiers permitted in this session; `None` allows all.
    pub allowed_brushes: Option<HashSet<String>>,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            send_enabled: true,
            receive_enabled: true,
            allowed_brushes: None,
        }
    }
}

impl SessionOptions {
    /// Restrict the session to the given brush identifiers.
    pub fn with_allowed<I, S>(brushes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allowed_brushes: Some(brushes.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    pub fn allows(&self, brush_id: &str) -> bool {
        match &self.allowed_brushes {
            Some(set) => set.contains(brush_id),
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum GesturePhase {
    Idle,
    Active { last: Vec2 },
}

/// One peer's protocol handler.
///
/// Owns the brush registry, the per-peer options, and the gesture state.
/// Pointer input renders locally and yields the event to put on the wire;
/// [`PeerSession::handle_remote`] replays a peer's event through exactly the
/// same brush dispatch.
pub struct PeerSession {
    registry: BrushRegistry,
    options: SessionOptions,
    active_brush: String,
    /// Brush settings as configured (size, color, symmetry).
    active_params: BrushParams,
    /// Seed-stable bag for the gesture in progress.
    gesture_params: BrushParams,
    phase: GesturePhase,
}

impl PeerSession {
    pub fn new(registry: BrushRegistry, options: SessionOptions) -> Self {
        let active_params = BrushParams::classic(10.0, mural_core::Rgba::BLACK);
        Self {
            registry,
            options,
            active_brush: active_params.brush_id().to_string(),
            gesture_params: active_params.clone(),
            active_params,
            phase: GesturePhase::Idle,
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn options_mut(&mut self) -> &mut SessionOptions {
        &mut self.options
    }

    /// Select the active brush via its parameter bag.
    pub fn set_brush(&mut self, params: BrushParams) {
        self.active_brush = params.brush_id().to_string();
        self.active_params = params;
    }

    pub fn active_brush(&self) -> &str {
        &self.active_brush
    }

    /// Begin a gesture: install a fresh base seed (kept for the whole
    /// gesture), render the first sample, and capture its event.
    pub fn pointer_down(&mut self, position: Vec2, canvas: &mut Canvas) -> Option<DrawEvent> {
        let mut params = self.active_params.clone();
        params.reseed(gesture_seed());
        self.gesture_params = params;
        self.phase = GesturePhase::Active { last: position };
        self.emit(StrokeSample::at(position), canvas)
    }

    /// Continue a gesture. Renders immediately; returns the event to send
    /// when outbound sync is enabled.
    pub fn pointer_move(&mut self, position: Vec2, canvas: &mut Canvas) -> Option<DrawEvent> {
        let GesturePhase::Active { last } = self.phase else {
            return None;
        };
        let from = if position.distance(&last) < MIN_SAMPLE_DISTANCE {
            Vec2::new(position.x - MIN_SAMPLE_DISTANCE, position.y)
        } else {
            last
        };
        self.phase = GesturePhase::Active { last: position };
        self.emit(StrokeSample::with_from(position, from), canvas)
    }

    /// End the gesture.
    pub fn pointer_up(&mut self) {
        self.phase = GesturePhase::Idle;
    }

    /// Clear the local surface and capture the clear event.
    pub fn clear(&mut self, canvas: &mut Canvas) -> Option<DrawEvent> {
        canvas.clear();
        self.options.send_enabled.then(DrawEvent::clear)
    }

    fn emit(&mut self, sample: StrokeSample, canvas: &mut Canvas) -> Option<DrawEvent> {
        if !self.options.allows(&self.active_brush) {
            log::debug!("brush {:?} not on the session allow-list", self.active_brush);
            return None;
        }
        let Some(brush) = self.registry.get(&self.active_brush) else {
            log::debug!("active brush {:?} not registered", self.active_brush);
            return None;
        };

        let bag = brush.sync_data(sample, &self.gesture_params);
        brush.draw(canvas, sample, &bag);
        self.gesture_params = bag.clone();

        if !self.options.send_enabled {
            return None;
        }
        Some(DrawEvent::draw(sample.position, sample.from, bag))
    }

    /// Replay a peer's event: rescaling, allow-list and brush lookup, then
    /// the same `draw` call the origin ran. Every failure is a silent no-op
    /// — one peer's unsupported brush never interrupts another's session.
    pub fn handle_remote(&self, event: &DrawEvent, canvas: &mut Canvas) {
        if !self.options.receive_enabled {
            return;
        }
        if event.is_clear {
            canvas.clear();
            return;
        }
        let Some(params) = &event.params else {
            log::debug!("draw event without params; dropping");
            return;
        };
        if !self.options.allows(&event.brush_id) {
            log::debug!("remote brush {:?} not on the session allow-list", event.brush_id);
            return;
        }
        let Some(brush) = self.registry.get(&event.brush_id) else {
            log::debug!("unknown remote brush {:?}; dropping event", event.brush_id);
            return;
        };

        let sample = StrokeSample { position: event.position, from: event.from };
        brush.draw(canvas, sample, params);
    }
}

/// Fresh base seed for a gesture. Peers only ever agree on seeds through the
/// wire, so the origin is free to draw them from local entropy.
fn gesture_seed() -> u32 {
    Uuid::new_v4().as_u128() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use mural_core::{BrushRegistry, Rgba, CLASSIC_BRUSH_ID, SPRINKLER_BRUSH_ID};

    const RED: Rgba = Rgba { r: 255, g: 0, b: 0, a: 255 };

    fn session() -> PeerSession {
        PeerSession::new(BrushRegistry::with_defaults(), SessionOptions::default())
    }

    fn red_classic(session: &mut PeerSession) {
        session.set_brush(BrushParams::classic(10.0, RED));
    }

    #[test]
    fn test_pointer_down_renders_and_emits() {
        let mut session = session();
        red_classic(&mut session);
        let mut canvas = Canvas::new(100, 100);

        let event = session.pointer_down(Vec2::new(0.5, 0.5), &mut canvas);

        assert_eq!(canvas.buffer().pixel(50, 50), Some(RED));
        let event = event.expect("pointer_down should emit an event");
        assert_eq!(event.brush_id, CLASSIC_BRUSH_ID);
        assert!(!event.is_clear);
        assert!(event.from.is_none());
    }

    #[test]
    fn test_pointer_move_requires_active_gesture() {
        let mut session = session();
        let mut canvas = Canvas::new(100, 100);
        assert!(session.pointer_move(Vec2::new(0.5, 0.5), &mut canvas).is_none());
    }

    #[test]
    fn test_send_toggle_gates_wire_not_rendering() {
        let mut session = session();
        red_classic(&mut session);
        session.options_mut().send_enabled = false;
        let mut canvas = Canvas::new(100, 100);

        let event = session.pointer_down(Vec2::new(0.5, 0.5), &mut canvas);

        assert!(event.is_none(), "send toggle must suppress the event");
        assert_eq!(canvas.buffer().pixel(50, 50), Some(RED), "but never local rendering");
    }

    #[test]
    fn test_receive_toggle_gates_replay() {
        let mut session = session();
        session.options_mut().receive_enabled = false;
        let mut canvas = Canvas::new(100, 100);

        let event = DrawEvent::draw(Vec2::new(0.5, 0.5), None, BrushParams::classic(10.0, RED));
        session.handle_remote(&event, &mut canvas);
        assert_eq!(canvas.buffer().pixel(50, 50), Some(Rgba::WHITE));
    }

    #[test]
    fn test_remote_event_replays_at_own_scale() {
        // Origin drew at the center of *its* canvas; a receiver with a
        // different viewport renders at the center of its own.
        let session = session();
        let mut canvas = Canvas::new(200, 120);

        let event = DrawEvent::draw(Vec2::new(0.5, 0.5), None, BrushParams::classic(10.0, RED));
        session.handle_remote(&event, &mut canvas);
        assert_eq!(canvas.buffer().pixel(100, 60), Some(RED));
    }

    #[test]
    fn test_unknown_remote_brush_is_silent_noop() {
        let session = session();
        let mut canvas = Canvas::new(100, 100);

        let mut event =
            DrawEvent::draw(Vec2::new(0.5, 0.5), None, BrushParams::classic(10.0, RED));
        event.brush_id = "laser-cannon".to_string();
        session.handle_remote(&event, &mut canvas);
        assert_eq!(canvas.buffer().count_exact(RED), 0);
    }

    #[test]
    fn test_allow_list_blocks_both_directions() {
        let options = SessionOptions::with_allowed([SPRINKLER_BRUSH_ID]);
        let mut session = PeerSession::new(BrushRegistry::with_defaults(), options);
        red_classic(&mut session);
        let mut canvas = Canvas::new(100, 100);

        // Local dispatch refused.
        assert!(session.pointer_down(Vec2::new(0.5, 0.5), &mut canvas).is_none());
        assert_eq!(canvas.buffer().count_exact(RED), 0);

        // Remote dispatch refused.
        let event = DrawEvent::draw(Vec2::new(0.5, 0.5), None, BrushParams::classic(10.0, RED));
        session.handle_remote(&event, &mut canvas);
        assert_eq!(canvas.buffer().count_exact(RED), 0);
    }

    #[test]
    fn test_clear_event_roundtrip() {
        let mut origin = session();
        let replica = session();
        let mut canvas_a = Canvas::new(50, 50);
        let mut canvas_b = Canvas::new(80, 80);

        canvas_b.buffer_mut().set_pixel(3, 3, RED);
        let event = origin.clear(&mut canvas_a).expect("clear should emit");
        assert!(event.is_clear);

        replica.handle_remote(&event, &mut canvas_b);
        assert_eq!(canvas_b.buffer().pixel(3, 3), Some(Rgba::WHITE));

        // Idempotent: replaying the clear again changes nothing.
        replica.handle_remote(&event, &mut canvas_b);
        assert_eq!(canvas_b.buffer().pixel(3, 3), Some(Rgba::WHITE));
    }

    #[test]
    fn test_sub_threshold_move_synthesizes_offset_from() {
        let mut session = session();
        session.set_brush(BrushParams::sprinkler(8, 4.0));
        let mut canvas = Canvas::new(100, 100);

        let p = Vec2::new(0.5, 0.5);
        session.pointer_down(p, &mut canvas);
        let event = session.pointer_move(p, &mut canvas).expect("move should emit");

        let from = event.from.expect("move events carry a previous point");
        assert_ne!(from, p, "synthesized point must differ from the sample");

        // The derived direction is a usable angle, not NaN.
        match event.params.unwrap() {
            BrushParams::Sprinkler { direction, speed, .. } => {
                assert!(direction.is_finite());
                assert!(speed.is_finite());
            }
            other => panic!("expected sprinkler bag, got {other:?}"),
        }
    }

    #[test]
    fn test_gesture_is_seed_stable() {
        let mut session = session();
        session.set_brush(BrushParams::sprinkler(8, 4.0));
        let mut canvas = Canvas::new(100, 100);

        let down = session.pointer_down(Vec2::new(0.4, 0.4), &mut canvas).unwrap();
        let move1 = session.pointer_move(Vec2::new(0.45, 0.4), &mut canvas).unwrap();
        let move2 = session.pointer_move(Vec2::new(0.5, 0.45), &mut canvas).unwrap();

        let seed_of = |e: &DrawEvent| match e.params.as_ref().unwrap() {
            BrushParams::Sprinkler { seed, .. } => *seed,
            other => panic!("expected sprinkler bag, got {other:?}"),
        };
        let s0 = seed_of(&down);
        assert_eq!(s0, seed_of(&move1));
        assert_eq!(s0, seed_of(&move2));

        // A new gesture draws a new seed.
        session.pointer_up();
        let next = session.pointer_down(Vec2::new(0.1, 0.1), &mut canvas).unwrap();
        assert_ne!(s0, seed_of(&next));
    }

    #[test]
    fn test_origin_and_replica_converge() {
        // The full loop: origin draws, replica replays the emitted events,
        // both surfaces end up identical.
        let mut origin = session();
        let replica = session();
        red_classic(&mut origin);

        let mut canvas_a = Canvas::new(160, 160);
        let mut canvas_b = Canvas::new(160, 160);

        let mut events = Vec::new();
        events.extend(origin.pointer_down(Vec2::new(0.2, 0.2), &mut canvas_a));
        events.extend(origin.pointer_move(Vec2::new(0.4, 0.35), &mut canvas_a));
        events.extend(origin.pointer_move(Vec2::new(0.6, 0.5), &mut canvas_a));
        origin.pointer_up();

        for event in &events {
            replica.handle_remote(event, &mut canvas_b);
        }
        assert_eq!(canvas_a.buffer().data(), canvas_b.buffer().data());
    }

    #[test]
    fn test_sprinkler_replay_constructs_identical_particles() {
        let mut origin = session();
        let replica = session();
        origin.set_brush(BrushParams::sprinkler(10, 5.0));

        let mut canvas_a = Canvas::new(160, 160);
        let mut canvas_b = Canvas::new(160, 160);

        origin.pointer_down(Vec2::new(0.5, 0.5), &mut canvas_a);
        let event = origin
            .pointer_move(Vec2::new(0.55, 0.5), &mut canvas_a)
            .expect("move should emit");
        // Only compare the particles of this one event.
        canvas_a.particles_mut().clear();

        let mut fresh = Canvas::new(160, 160);
        let sample = StrokeSample {
            position: event.position,
            from: event.from,
        };
        origin
            .registry
            .get(SPRINKLER_BRUSH_ID)
            .unwrap()
            .draw(&mut fresh, sample, event.params.as_ref().unwrap());

        replica.handle_remote(&event, &mut canvas_b);
        assert_eq!(fresh.particles().particles(), canvas_b.particles().particles());
    }
}
