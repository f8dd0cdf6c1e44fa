//! Drag-to-scroll with post-release momentum.
//!
//! The controller never schedules anything itself. Releasing a drag hands the
//! host a [`CoastToken`]; the host calls [`DragMomentum::on_frame`] with that
//! token once per animation frame until it reports [`FrameOutcome::Finished`].
//! Cancelling a coast (new pointer-down) invalidates the token, so any frame
//! the host had already queued becomes a no-op.
//!
//! Direction: the texture follows the pointer. `offset_px` is the texture
//! column drawn at the viewport's left edge, so moving the pointer right by
//! `delta` decreases the offset by `delta` and reveals regions to the west.
//! Velocity is kept in offset units, which lets coasting simply add it.

use log::debug;
use serde::{Deserialize, Serialize};

use crate::projection::wrap_offset;

/// Tunables for drag gain and deceleration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MomentumParams {
    /// Pointer delta to velocity multiplier.
    pub drag_gain: f64,
    /// Per-frame velocity multiplier while coasting.
    pub friction: f64,
    /// Coasting stops once |velocity| drops below this.
    pub stop_threshold: f64,
}

impl Default for MomentumParams {
    fn default() -> Self {
        Self {
            drag_gain: 1.5,
            friction: 0.95,
            stop_threshold: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScrollState {
    /// Always in `[0, texture_width_px)`.
    pub offset_px: f64,
    pub velocity_px: f64,
}

/// Identifies one coast run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CoastToken(u64);

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Phase {
    Idle,
    Dragging { last_x: f64 },
    Coasting(CoastToken),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    /// Still moving; schedule another frame.
    Continue,
    /// Velocity fell below the threshold; the controller is idle again.
    Finished,
    /// The token no longer names the running coast.
    Ignored,
}

#[derive(Debug, Clone)]
pub struct DragMomentum {
    texture_width_px: f64,
    params: MomentumParams,
    scroll: ScrollState,
    phase: Phase,
    was_dragging: bool,
    next_token: u64,
}

impl DragMomentum {
    /// `texture_width_px` must be positive; [`crate::ViewportGeometry`]
    /// guarantees that for widget-owned controllers.
    pub fn new(texture_width_px: f64, params: MomentumParams) -> Self {
        Self {
            texture_width_px,
            params,
            scroll: ScrollState::default(),
            phase: Phase::Idle,
            was_dragging: false,
            next_token: 0,
        }
    }

    pub fn scroll(&self) -> ScrollState {
        self.scroll
    }

    pub fn offset_px(&self) -> f64 {
        self.scroll.offset_px
    }

    pub fn velocity_px(&self) -> f64 {
        self.scroll.velocity_px
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn params(&self) -> MomentumParams {
        self.params
    }

    pub fn is_dragging(&self) -> bool {
        matches!(self.phase, Phase::Dragging { .. })
    }

    pub fn is_coasting(&self) -> bool {
        matches!(self.phase, Phase::Coasting(_))
    }

    /// True if the current (or last) press moved the pointer.
    pub fn was_dragging(&self) -> bool {
        self.was_dragging
    }

    /// Jump to an offset without animating, e.g. to sync two globes.
    pub fn set_offset(&mut self, offset_px: f64) {
        self.scroll.offset_px = wrap_offset(offset_px, self.texture_width_px);
    }

    pub fn pointer_down(&mut self, x: f64) {
        self.cancel_coast();
        self.scroll.velocity_px = 0.0;
        self.was_dragging = false;
        self.phase = Phase::Dragging { last_x: x };
    }

    /// Returns `true` if the offset changed.
    pub fn pointer_move(&mut self, x: f64) -> bool {
        let Phase::Dragging { last_x } = self.phase else {
            return false;
        };

        let delta = x - last_x;
        self.phase = Phase::Dragging { last_x: x };
        if delta == 0.0 {
            return false;
        }

        self.scroll.velocity_px = -delta * self.params.drag_gain;
        self.scroll.offset_px = wrap_offset(self.scroll.offset_px - delta, self.texture_width_px);
        self.was_dragging = true;
        true
    }

    /// End the drag. Returns a token when there is enough velocity to coast.
    pub fn pointer_up(&mut self) -> Option<CoastToken> {
        if !self.is_dragging() {
            return None;
        }

        if self.scroll.velocity_px.abs() < self.params.stop_threshold {
            self.scroll.velocity_px = 0.0;
            self.phase = Phase::Idle;
            return None;
        }

        let token = CoastToken(self.next_token);
        self.next_token = self.next_token.wrapping_add(1);
        self.phase = Phase::Coasting(token);
        debug!(
            "coast {:?} started at velocity {:.2}",
            token, self.scroll.velocity_px
        );
        Some(token)
    }

    /// Stop a running coast. No-op when nothing is coasting.
    pub fn cancel_coast(&mut self) {
        if let Phase::Coasting(token) = self.phase {
            debug!("coast {token:?} cancelled");
            self.phase = Phase::Idle;
        }
    }

    /// Advance one animation frame of the coast identified by `token`.
    pub fn on_frame(&mut self, token: CoastToken) -> FrameOutcome {
        if self.phase != Phase::Coasting(token) {
            return FrameOutcome::Ignored;
        }

        self.scroll.velocity_px *= self.params.friction;
        self.scroll.offset_px = wrap_offset(
            self.scroll.offset_px + self.scroll.velocity_px,
            self.texture_width_px,
        );

        if self.scroll.velocity_px.abs() < self.params.stop_threshold {
            self.phase = Phase::Idle;
            FrameOutcome::Finished
        } else {
            FrameOutcome::Continue
        }
    }

    /// Drive a coast to completion without a host frame clock.
    ///
    /// Returns the number of frames run, capped at `max_frames`.
    pub fn run_to_rest(&mut self, token: CoastToken, max_frames: usize) -> usize {
        let mut frames = 0;
        while frames < max_frames {
            match self.on_frame(token) {
                FrameOutcome::Continue => frames += 1,
                FrameOutcome::Finished => return frames + 1,
                FrameOutcome::Ignored => return frames,
            }
        }
        frames
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TEXTURE: f64 = 500.0;

    fn controller() -> DragMomentum {
        DragMomentum::new(TEXTURE, MomentumParams::default())
    }

    fn circular_distance(a: f64, b: f64) -> f64 {
        let d = (a - b).abs() % TEXTURE;
        d.min(TEXTURE - d)
    }

    #[test]
    fn drag_right_then_left_restores_offset() {
        for start in [0.0, 13.5, 250.0, 499.9] {
            for delta in [1.0, 37.25, 480.0, 1234.5] {
                let mut m = controller();
                m.set_offset(start);
                m.pointer_down(100.0);
                m.pointer_move(100.0 + delta);
                m.pointer_move(100.0);
                assert!(
                    circular_distance(m.offset_px(), start) < 1e-9,
                    "start {start} delta {delta} -> {}",
                    m.offset_px()
                );
            }
        }
    }

    #[test]
    fn texture_follows_the_pointer() {
        let mut m = controller();
        m.set_offset(100.0);
        m.pointer_down(0.0);
        assert!(m.pointer_move(10.0));
        assert_eq!(m.offset_px(), 90.0);
        assert_eq!(m.velocity_px(), -15.0);
        assert!(m.was_dragging());
    }

    #[test]
    fn offset_wraps_non_negative() {
        let mut m = controller();
        m.pointer_down(0.0);
        m.pointer_move(30.0);
        assert_eq!(m.offset_px(), 470.0);
        m.pointer_move(-500.0);
        assert!((0.0..TEXTURE).contains(&m.offset_px()));
    }

    #[test]
    fn moves_without_press_are_ignored() {
        let mut m = controller();
        assert!(!m.pointer_move(50.0));
        assert_eq!(m.offset_px(), 0.0);
        assert!(!m.was_dragging());
    }

    #[test]
    fn zero_delta_is_not_a_drag() {
        let mut m = controller();
        m.pointer_down(42.0);
        assert!(!m.pointer_move(42.0));
        assert!(!m.was_dragging());
        assert_eq!(m.pointer_up(), None);
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn coast_from_velocity_ten_terminates_near_59_frames() {
        let mut m = DragMomentum::new(TEXTURE, MomentumParams::default());
        m.pointer_down(0.0);
        // delta * 1.5 gain == 10 px/frame of velocity (negative direction)
        m.pointer_move(-10.0 / 1.5);
        assert!((m.velocity_px() - 10.0).abs() < 1e-9);

        let token = m.pointer_up().expect("enough velocity to coast");
        let frames = m.run_to_rest(token, 10_000);

        let expected = ((0.5_f64 / 10.0).ln() / 0.95_f64.ln()).ceil() as usize;
        assert_eq!(expected, 59);
        assert!(frames.abs_diff(expected) <= 1, "ran {frames} frames");
        assert_eq!(m.phase(), Phase::Idle);
        assert!(m.velocity_px().abs() < 0.5);
    }

    #[test]
    fn new_press_cancels_coast_and_stales_token() {
        let mut m = controller();
        m.pointer_down(0.0);
        m.pointer_move(20.0);
        let token = m.pointer_up().expect("coasting");
        assert_eq!(m.on_frame(token), FrameOutcome::Continue);

        m.pointer_down(5.0);
        assert!(m.is_dragging());
        assert_eq!(m.velocity_px(), 0.0);

        let before = m.offset_px();
        assert_eq!(m.on_frame(token), FrameOutcome::Ignored);
        assert_eq!(m.offset_px(), before);
    }

    #[test]
    fn cancel_when_idle_is_noop() {
        let mut m = controller();
        m.cancel_coast();
        m.cancel_coast();
        assert_eq!(m.phase(), Phase::Idle);
    }

    #[test]
    fn each_coast_gets_a_fresh_token() {
        let mut m = controller();
        m.pointer_down(0.0);
        m.pointer_move(20.0);
        let first = m.pointer_up().expect("coasting");
        m.pointer_down(0.0);
        m.pointer_move(20.0);
        let second = m.pointer_up().expect("coasting");
        assert_ne!(first, second);
        assert_eq!(m.on_frame(first), FrameOutcome::Ignored);
        assert_eq!(m.on_frame(second), FrameOutcome::Continue);
    }
}
