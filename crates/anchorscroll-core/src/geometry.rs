//! Coordinate types shared by the resolver, detector and navigation paths.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::Add;

/// A point in viewport content space (or, for raw measurements, screen space)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub x: f64,
    pub y: f64,
}

impl Coordinates {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Component along `axis`
    #[inline]
    pub fn along(&self, axis: Axis) -> f64 {
        match axis {
            Axis::X => self.x,
            Axis::Y => self.y,
        }
    }
}

impl Add for Coordinates {
    type Output = Coordinates;

    fn add(self, rhs: Coordinates) -> Coordinates {
        Coordinates::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    pub const ALL: [Axis; 2] = [Axis::Y, Axis::X];
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::X => f.write_str("x"),
            Axis::Y => f.write_str("y"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Asc,
    Desc,
}

/// Sort resolved anchors by their coordinate along `axis`.
///
/// The sort is stable, so anchors sharing a coordinate keep the iteration
/// order of `anchors` (name order for a `BTreeMap`).
pub fn sort_anchors<'a>(
    anchors: &'a BTreeMap<String, Coordinates>,
    axis: Axis,
    order: SortOrder,
) -> Vec<(&'a str, Coordinates)> {
    let mut sorted: Vec<(&str, Coordinates)> = anchors
        .iter()
        .map(|(name, coords)| (name.as_str(), *coords))
        .collect();

    sorted.sort_by(|(_, a), (_, b)| {
        let (a, b) = (a.along(axis), b.along(axis));
        match order {
            SortOrder::Asc => a.total_cmp(&b),
            SortOrder::Desc => b.total_cmp(&a),
        }
    });

    sorted
}
