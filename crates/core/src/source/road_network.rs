//! Collections of road sources and their horizontal extent

use super::line_source::LineSource;
use crate::grid::DomainBounds;

/// Ordered set of road segments, typically built by a geometry loader
#[derive(Debug, Clone, Default)]
pub struct RoadNetwork {
    roads: Vec<LineSource>,
}

impl RoadNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, road: LineSource) {
        self.roads.push(road);
    }

    pub fn len(&self) -> usize {
        self.roads.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roads.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, LineSource> {
        self.roads.iter()
    }

    /// Bounding box of all segment endpoints, with the default top altitude
    ///
    /// Returns `None` for an empty network.
    pub fn bounds(&self) -> Option<DomainBounds> {
        let mut points = self.roads.iter().flat_map(|r| [r.start(), r.end()]);
        let first = points.next()?;
        let (mut ns, mut we) = ((first.x, first.x), (first.y, first.y));
        for p in points {
            ns = (ns.0.min(p.x), ns.1.max(p.x));
            we = (we.0.min(p.y), we.1.max(p.y));
        }
        Some(DomainBounds::new(ns, we))
    }

    /// Consume the network, yielding roads in insertion order
    pub fn into_roads(self) -> Vec<LineSource> {
        self.roads
    }
}

impl<'a> IntoIterator for &'a RoadNetwork {
    type Item = &'a LineSource;
    type IntoIter = std::slice::Iter<'a, LineSource>;

    fn into_iter(self) -> Self::IntoIter {
        self.roads.iter()
    }
}
