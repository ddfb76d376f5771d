//! Spatial registry of drop zones for touch-driven drag and drop.
//!
//! Drop-target components register their bounding boxes when a drag starts;
//! a touch release is resolved by point-in-rectangle lookup against the
//! registered zones.

use serde::{Deserialize, Serialize};

/// A point in host layout coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal position.
    pub x: f64,
    /// Vertical position.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle.
///
/// Containment is half-open: the left and top edges belong to the
/// rectangle, the right and bottom edges do not, so adjacent zones never
/// both contain a point on their shared border.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    /// Left edge.
    pub x: f64,
    /// Top edge.
    pub y: f64,
    /// Width; a non-positive width contains nothing.
    pub width: f64,
    /// Height; a non-positive height contains nothing.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and size.
    #[must_use]
    pub const fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Returns `true` if `point` lies inside the rectangle.
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.x
            && point.x < self.x + self.width
            && point.y >= self.y
            && point.y < self.y + self.height
    }
}

/// Registered drop zones keyed by category id.
#[derive(Debug, Clone, Default)]
pub struct DropZoneRegistry {
    // Registration order doubles as stacking order: later entries are on top.
    zones: Vec<(String, Rect)>,
}

impl DropZoneRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers or moves the zone for `category_id`.
    ///
    /// Re-registering an existing zone replaces its bounds and brings it to
    /// the top.
    pub fn register(&mut self, category_id: impl Into<String>, bounds: Rect) {
        let category_id = category_id.into();
        self.zones.retain(|(id, _)| *id != category_id);
        self.zones.push((category_id, bounds));
    }

    /// Removes the zone for `category_id`, returning its last bounds.
    pub fn unregister(&mut self, category_id: &str) -> Option<Rect> {
        let index = self.zones.iter().position(|(id, _)| id == category_id)?;
        Some(self.zones.remove(index).1)
    }

    /// Removes every zone.
    pub fn clear(&mut self) {
        self.zones.clear();
    }

    /// Number of registered zones.
    #[must_use]
    pub fn len(&self) -> usize {
        self.zones.len()
    }

    /// Returns `true` if no zones are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.zones.is_empty()
    }

    /// The topmost zone containing `point`.
    #[must_use]
    pub fn zone_at(&self, point: Point) -> Option<&str> {
        self.zones
            .iter()
            .rev()
            .find(|(_, rect)| rect.contains(point))
            .map(|(id, _)| id.as_str())
    }
}
