//! Turtle/Color/Position value objects and the `GuiHost` seam (spec.md §6).
//!
//! Grounded in `Turtle/Turtle.py`, `Turtle/Color.py`, `Turtle/Position.py`:
//! every host-mutating operation only commits local state if the matching
//! `GuiHost` call returns `true`, making a refused call a no-op rather than
//! an error.

use std::f64::consts::PI;

use tracing::trace;

/// An RGB color, each channel clamped into `0..=255` on construction
/// (`Color.py`'s range-based clamp).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Color {
    pub r: i64,
    pub g: i64,
    pub b: i64,
}

impl Color {
    pub fn new(r: i64, g: i64, b: i64) -> Self {
        Self {
            r: Self::clamp(r),
            g: Self::clamp(g),
            b: Self::clamp(b),
        }
    }

    fn clamp(channel: i64) -> i64 {
        if channel < 0 {
            0
        } else if channel > 255 {
            255
        } else {
            channel
        }
    }
}

/// A 2-D coordinate pair (`Position.py`); unclamped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Position {
    pub x: i64,
    pub y: i64,
}

impl Position {
    pub fn new(x: i64, y: i64) -> Self {
        Self { x, y }
    }
}

/// The narrow interface the interpreter uses to surface turtle-state
/// changes to an external drawing host (spec.md §6). Every method returns
/// whether the host accepted the change; `false` leaves local state
/// unchanged.
pub trait GuiHost: Send + Sync {
    fn add_turtle(&self, turtle: &Turtle) -> bool;
    fn set_color(&self, id: u64, color: Color) -> bool;
    fn set_position(&self, id: u64, position: Position) -> bool;
    fn set_orientation(&self, id: u64, orientation: i64) -> bool;
    fn go_forward(&self, id: u64, new_position: Position) -> bool;
}

/// A `GuiHost` that accepts every call (`GuiMock.py`'s role): used headless,
/// in tests, and by the batch CLI runner when no drawing surface is
/// attached.
#[derive(Default)]
pub struct GuiMock;

impl GuiHost for GuiMock {
    fn add_turtle(&self, turtle: &Turtle) -> bool {
        trace!(id = turtle.id, "gui mock: add_turtle");
        true
    }

    fn set_color(&self, id: u64, color: Color) -> bool {
        trace!(id, r = color.r, g = color.g, b = color.b, "gui mock: set_color");
        true
    }

    fn set_position(&self, id: u64, position: Position) -> bool {
        trace!(id, x = position.x, y = position.y, "gui mock: set_position");
        true
    }

    fn set_orientation(&self, id: u64, orientation: i64) -> bool {
        trace!(id, orientation, "gui mock: set_orientation");
        true
    }

    fn go_forward(&self, id: u64, new_position: Position) -> bool {
        trace!(id, x = new_position.x, y = new_position.y, "gui mock: go_forward");
        true
    }
}

/// A turtle handle's local state (`Turtle.py`). `id` is assigned by the
/// interpreter from a counter reset at the start of every top-level
/// `execute`.
#[derive(Clone, Debug)]
pub struct Turtle {
    pub id: u64,
    pub color: Color,
    pub position: Position,
    pub orientation: i64,
}

impl Turtle {
    pub fn new(id: u64) -> Self {
        Self {
            id,
            color: Color::new(255, 0, 0),
            position: Position::new(0, 0),
            orientation: 0,
        }
    }

    pub fn set_color(&mut self, host: &dyn GuiHost, color: Color) {
        if host.set_color(self.id, color) {
            self.color = color;
        }
    }

    pub fn set_position(&mut self, host: &dyn GuiHost, position: Position) {
        if host.set_position(self.id, position) {
            self.position = position;
        }
    }

    pub fn set_orientation(&mut self, host: &dyn GuiHost, orientation: i64) {
        let normalized = orientation.rem_euclid(360);
        if host.set_orientation(self.id, normalized) {
            self.orientation = normalized;
        }
    }

    pub fn turn_left(&mut self, host: &dyn GuiHost) {
        self.set_orientation(host, self.orientation + 90);
    }

    pub fn turn_right(&mut self, host: &dyn GuiHost) {
        self.set_orientation(host, self.orientation - 90);
    }

    /// 0 degrees points along +Y; positive angles turn toward +X
    /// (`Turtle.py::forward`).
    pub fn forward(&mut self, host: &dyn GuiHost, distance: i64) {
        let theta = (self.orientation as f64) / 360.0 * 2.0 * PI;
        let dx = theta.sin() * distance as f64;
        let dy = theta.cos() * distance as f64;
        let new_position = Position::new(
            self.position.x + dx.round() as i64,
            self.position.y + dy.round() as i64,
        );
        if host.go_forward(self.id, new_position) {
            self.position = new_position;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_clamps_out_of_range_channels() {
        let c = Color::new(-10, 300, 128);
        assert_eq!(c, Color { r: 0, g: 255, b: 128 });
    }

    #[test]
    fn forward_from_zero_orientation_moves_along_plus_y() {
        let mut turtle = Turtle::new(0);
        turtle.forward(&GuiMock, 10);
        assert_eq!(turtle.position, Position::new(0, 10));
    }

    #[test]
    fn forward_from_90_degrees_moves_along_plus_x() {
        let mut turtle = Turtle::new(0);
        turtle.set_orientation(&GuiMock, 90);
        turtle.forward(&GuiMock, 10);
        assert_eq!(turtle.position, Position::new(10, 0));
    }

    #[test]
    fn turn_left_and_right_normalize_mod_360() {
        let mut turtle = Turtle::new(0);
        turtle.set_orientation(&GuiMock, 350);
        turtle.turn_left(&GuiMock);
        assert_eq!(turtle.orientation, 80);
        turtle.turn_right(&GuiMock);
        turtle.turn_right(&GuiMock);
        assert_eq!(turtle.orientation, 260);
    }

    struct RefusingHost;
    impl GuiHost for RefusingHost {
        fn add_turtle(&self, _: &Turtle) -> bool {
            true
        }
        fn set_color(&self, _: u64, _: Color) -> bool {
            false
        }
        fn set_position(&self, _: u64, _: Position) -> bool {
            false
        }
        fn set_orientation(&self, _: u64, _: i64) -> bool {
            false
        }
        fn go_forward(&self, _: u64, _: Position) -> bool {
            false
        }
    }

    #[test]
    fn refused_host_calls_leave_state_unchanged() {
        let mut turtle = Turtle::new(0);
        turtle.set_color(&RefusingHost, Color::new(1, 2, 3));
        turtle.set_position(&RefusingHost, Position::new(5, 5));
        turtle.set_orientation(&RefusingHost, 90);
        turtle.forward(&RefusingHost, 10);
        assert_eq!(turtle.color, Color::new(255, 0, 0));
        assert_eq!(turtle.position, Position::new(0, 0));
        assert_eq!(turtle.orientation, 0);
    }
}
