//! Turtle state, operations and the segments a turtle emits.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

/// Pose of the drawing turtle in normalized `[0, 1]²` space.
///
/// Lives for a single interpretation pass; the branch stack is a plain
/// `Vec<TurtleState>`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TurtleState {
    pub position: Vec2,
    /// Heading in radians, counter-clockwise from `+X`.
    pub heading: f32,
}

impl TurtleState {
    pub fn new(position: Vec2, heading: f32) -> Self {
        Self { position, heading }
    }

    /// Unit vector along the current heading.
    pub fn direction(&self) -> Vec2 {
        Vec2::from_angle(self.heading)
    }

    /// Position reached by advancing `step` along the heading.
    pub fn advanced(&self, step: f32) -> Vec2 {
        self.position + self.direction() * step
    }

    pub fn turn(&mut self, angle: f32) {
        self.heading += angle;
    }
}

/// Per-shape inputs to one interpretation pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TurtleParams {
    pub start: TurtleState,
    /// Distance covered by one draw or move symbol.
    pub step: f32,
    /// Turn increment in radians.
    pub turn_angle: f32,
    /// Stroke color attached to every emitted segment.
    pub color: Vec3,
}

/// A stroke between two points in normalized space.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct LineSegment {
    pub start: Vec2,
    pub end: Vec2,
    pub color: Vec3,
}

impl LineSegment {
    pub fn new(start: Vec2, end: Vec2, color: Vec3) -> Self {
        Self { start, end, color }
    }

    pub fn length(&self) -> f32 {
        self.start.distance(self.end)
    }
}

/// Operations that can be bound to a symbol.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TurtleOp {
    /// Advance one step and emit a segment (`F`, `G`).
    Draw,
    /// Advance one step without drawing (`f`).
    Move,
    /// Turn by `sign` times the turn increment (`+` / `-`).
    Turn(f32),
    /// Turn 180 degrees (`|`).
    TurnAround,
    /// Save the pose onto the branch stack (`[`).
    Push,
    /// Restore the most recently pushed pose (`]`).
    Pop,
    /// No-op; symbol only matters during expansion.
    Ignore,
}
