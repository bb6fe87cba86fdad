//! Decides which anchor the viewport has scrolled past on each axis.

use std::collections::BTreeMap;

use crate::geometry::{sort_anchors, Axis, Coordinates, SortOrder};

/// Reached anchor per axis for one scroll position
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReachedAnchors {
    pub x: Option<String>,
    pub y: Option<String>,
}

impl ReachedAnchors {
    pub fn get(&self, axis: Axis) -> Option<&str> {
        match axis {
            Axis::X => self.x.as_deref(),
            Axis::Y => self.y.as_deref(),
        }
    }
}

/// The anchor furthest along `axis` whose coordinate is at or before
/// `position`.
///
/// When the viewport sits before every anchor, `keep_in_bounds` selects the
/// anchor with the smallest coordinate instead of reporting nothing.
pub fn find_reached(
    anchors: &BTreeMap<String, Coordinates>,
    position: f64,
    axis: Axis,
    keep_in_bounds: bool,
) -> Option<&str> {
    let sorted = sort_anchors(anchors, axis, SortOrder::Desc);

    let reached = sorted
        .iter()
        .find(|(_, coords)| coords.along(axis) <= position)
        .or_else(|| if keep_in_bounds { sorted.last() } else { None });

    reached.map(|(name, _)| *name)
}

/// Run [`find_reached`] on both axes for the scroll `offset`
pub fn detect(
    anchors: &BTreeMap<String, Coordinates>,
    offset: Coordinates,
    keep_in_bounds: bool,
) -> ReachedAnchors {
    let reached = |axis| find_reached(anchors, offset.along(axis), axis, keep_in_bounds).map(str::to_string);

    ReachedAnchors {
        x: reached(Axis::X),
        y: reached(Axis::Y),
    }
}
