use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Frame capture time in milliseconds. Frame timestamps are expected to be
/// monotonically non-decreasing within one stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct Timestamp(i64);

impl Timestamp {
    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }
    pub fn as_millis(&self) -> i64 {
        self.0
    }
    /// dt in milliseconds
    pub fn duration_since(&self, other: &Timestamp) -> i64 {
        self.0 - other.0
    }
}

/// Reported camera position: the translation column of the world pose, cast
/// down to `f32` for the listener.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Position {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

impl From<Vector3<f64>> for Position {
    fn from(t: Vector3<f64>) -> Self {
        Self::new(t.x as f32, t.y as f32, t.z as f32)
    }
}

/// Borrowed view of one RGBA8 camera frame.
///
/// The pixel buffer stays owned by the producer; borrowing it for the
/// duration of one call guarantees it is handed back on every exit path,
/// including frames the gate rejects.
#[derive(Clone, Copy)]
pub struct Frame<'a> {
    pub pixels: &'a [u8],
    pub width: u32,
    pub height: u32,
    /// Clockwise display rotation hint in degrees (0/90/180/270).
    pub rotation_degrees: i32,
    pub timestamp: Timestamp,
}

impl<'a> Frame<'a> {
    pub fn rgba(
        pixels: &'a [u8],
        width: u32,
        height: u32,
        rotation_degrees: i32,
        timestamp: Timestamp,
    ) -> Self {
        assert_eq!(pixels.len(), (width * height * 4) as usize);
        Self {
            pixels,
            width,
            height,
            rotation_degrees,
            timestamp,
        }
    }
}
