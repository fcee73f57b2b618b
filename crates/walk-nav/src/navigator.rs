use crate::Vec2;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Ordered waypoints from source to destination.
///
/// An empty path means the destination is unreachable; that is a normal result, not an error.
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NavPath {
    pub points: Vec<Vec2>,
}

impl NavPath {
    pub fn new(points: Vec<Vec2>) -> Self {
        Self { points }
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn first(&self) -> Option<Vec2> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<Vec2> {
        self.points.last().copied()
    }

    /// Total polyline length.
    pub fn length(&self) -> f32 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }
}

/// Query surface consumed by movement controllers.
pub trait Navigator {
    /// Waypoints from `start` to `goal`, or an empty path when `goal` cannot be reached.
    ///
    /// Endpoints may be moved onto navigable space before searching; the returned path starts
    /// and ends at the adjusted points.
    fn find_path(&self, start: Vec2, goal: Vec2) -> NavPath;

    /// Project a point onto the nearest navigable position.
    ///
    /// Backends that don't support projection may return `None`.
    fn nearest_point(&self, _point: Vec2) -> Option<Vec2> {
        None
    }
}
