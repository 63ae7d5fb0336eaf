//! Straight line emission sources (road segments)
//!
//! A line source is rasterized onto horizontal grid cells by sampling the
//! segment at evenly spaced points and keeping each visited cell once, in
//! order of first visit. No clipping happens here: cells outside the grid
//! are kept and dropped later when emissions are injected.

use crate::core_types::GroundPoint;
use crate::emission::EmissionProfile;
use crate::error::TransportError;
use rustc_hash::FxHashSet;
use std::fmt;
use std::sync::Arc;

/// Largest `steps` value [`LineSource::rasterize`] will sample
pub const MAX_RASTER_STEPS: usize = 1 << 24;

/// Horizontal cell index `(i, j)`; may lie outside the grid
pub type CellIndex = (i64, i64);

/// Directed line segment in the horizontal plane with an emission profile
#[derive(Clone)]
pub struct LineSource {
    start: GroundPoint,
    end: GroundPoint,
    profile: Arc<dyn EmissionProfile>,
    name: Option<String>,
}

impl LineSource {
    /// Create an unnamed source
    ///
    /// # Arguments
    ///
    /// * `start` - Segment start `(north_south, west_east)` in metres
    /// * `end` - Segment end `(north_south, west_east)` in metres
    /// * `profile` - Emission rate as a function of time
    pub fn new(
        start: GroundPoint,
        end: GroundPoint,
        profile: impl EmissionProfile + 'static,
    ) -> Self {
        Self::with_shared_profile(start, end, Arc::new(profile))
    }

    /// Create a source sharing a profile with other sources
    pub fn with_shared_profile(
        start: GroundPoint,
        end: GroundPoint,
        profile: Arc<dyn EmissionProfile>,
    ) -> Self {
        Self {
            start,
            end,
            profile,
            name: None,
        }
    }

    /// Collapse a polyline to the segment from its first to its last vertex
    ///
    /// Returns `None` for an empty polyline.
    pub fn from_polyline(
        points: &[GroundPoint],
        profile: Arc<dyn EmissionProfile>,
    ) -> Option<Self> {
        let (first, last) = (points.first()?, points.last()?);
        Some(Self::with_shared_profile(*first, *last, profile))
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn start(&self) -> GroundPoint {
        self.start
    }

    pub fn end(&self) -> GroundPoint {
        self.end
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn profile(&self) -> &dyn EmissionProfile {
        self.profile.as_ref()
    }

    /// Whether both endpoints have finite coordinates
    pub fn is_finite(&self) -> bool {
        self.start.iter().chain(self.end.iter()).all(|c| c.is_finite())
    }

    /// Grid cells crossed by the segment, deduplicated in first-visit order
    ///
    /// The segment is sampled at `steps + 1` evenly spaced points where
    /// `steps = floor(max(|Δx / dx|, |Δy / dy|)) + 1`, and each sample maps to
    /// `(floor(x / dx), floor(y / dy))`.
    ///
    /// # Errors
    ///
    /// Returns [`TransportError::Configuration`] if an endpoint is not finite
    /// or `steps` exceeds [`MAX_RASTER_STEPS`].
    pub fn rasterize(&self, dx: f64, dy: f64) -> Result<Vec<CellIndex>, TransportError> {
        let delta = self.end - self.start;
        let steps = (delta.x / dx).abs().max((delta.y / dy).abs()).floor() + 1.0;
        // NaN comes from non-finite endpoints
        if steps.is_nan() || steps > MAX_RASTER_STEPS as f64 {
            return Err(TransportError::configuration(format!(
                "segment {:?} -> {:?} needs {steps} steps at {dx}x{dy} cells, \
                 limit is {MAX_RASTER_STEPS}",
                self.start, self.end
            )));
        }
        let steps = steps as usize;

        let mut seen = FxHashSet::default();
        let mut cells = Vec::new();
        for s in 0..=steps {
            let t = s as f64 / steps as f64;
            let point = self.start + delta * t;
            let cell = ((point.x / dx).floor() as i64, (point.y / dy).floor() as i64);
            if seen.insert(cell) {
                cells.push(cell);
            }
        }
        Ok(cells)
    }
}

impl fmt::Debug for LineSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineSource")
            .field("start", &self.start)
            .field("end", &self.end)
            .field("profile", &self.profile.describe())
            .field("name", &self.name)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::emission::ConstantRate;

    fn source(start: (f64, f64), end: (f64, f64)) -> LineSource {
        LineSource::new(
            GroundPoint::new(start.0, start.1),
            GroundPoint::new(end.0, end.1),
            ConstantRate(1.0),
        )
    }

    #[test]
    fn test_north_south_road() {
        let cells = source((0.0, 10000.0), (16900.0, 10000.0))
            .rasterize(1000.0, 1000.0)
            .unwrap();
        let expected: Vec<CellIndex> = (0..=16).map(|i| (i, 10)).collect();
        assert_eq!(cells, expected);
    }

    #[test]
    fn test_zero_length_segment() {
        let cells = source((2500.0, 700.0), (2500.0, 700.0))
            .rasterize(1000.0, 1000.0)
            .unwrap();
        assert_eq!(cells, vec![(2, 0)]);
    }

    #[test]
    fn test_diagonal_preserves_first_visit_order() {
        let cells = source((0.0, 0.0), (3000.0, 1500.0))
            .rasterize(1000.0, 1000.0)
            .unwrap();
        assert_eq!(cells.first(), Some(&(0, 0)));
        assert_eq!(cells.last(), Some(&(3, 1)));

        let unique: FxHashSet<_> = cells.iter().copied().collect();
        assert_eq!(unique.len(), cells.len());

        // Walking forward never decreases either index
        for pair in cells.windows(2) {
            assert!(pair[1].0 >= pair[0].0 && pair[1].1 >= pair[0].1);
        }
    }

    #[test]
    fn test_reverse_direction() {
        let cells = source((4500.0, 0.0), (0.0, 0.0))
            .rasterize(1000.0, 1000.0)
            .unwrap();
        assert_eq!(cells, vec![(4, 0), (3, 0), (2, 0), (1, 0), (0, 0)]);
    }

    #[test]
    fn test_keeps_cells_outside_grid() {
        let cells = source((-1500.0, 0.0), (500.0, 0.0))
            .rasterize(1000.0, 1000.0)
            .unwrap();
        assert_eq!(cells, vec![(-2, 0), (-1, 0), (0, 0)]);
    }

    #[test]
    fn test_from_polyline_uses_endpoints() {
        let points = [
            GroundPoint::new(0.0, 0.0),
            GroundPoint::new(50.0, 900.0),
            GroundPoint::new(100.0, 2000.0),
        ];
        let road = LineSource::from_polyline(&points, Arc::new(ConstantRate(1.0)))
            .unwrap()
            .named("Bangerter");
        assert_eq!(road.start(), points[0]);
        assert_eq!(road.end(), points[2]);
        assert_eq!(road.name(), Some("Bangerter"));

        assert!(LineSource::from_polyline(&[], Arc::new(ConstantRate(1.0))).is_none());
    }

    #[test]
    fn test_rejects_segments_needing_too_many_samples() {
        let err = source((0.0, 0.0), (1e300, 0.0))
            .rasterize(1000.0, 1000.0)
            .unwrap_err();
        assert!(matches!(err, TransportError::Configuration(msg) if msg.contains("limit")));

        // One step past the limit along the west-east axis
        let long = MAX_RASTER_STEPS as f64;
        assert!(source((0.0, 0.0), (0.0, long)).rasterize(1000.0, 1.0).is_err());
    }

    #[test]
    fn test_rasterize_rejects_non_finite_endpoints() {
        assert!(source((f64::INFINITY, 0.0), (0.0, 0.0))
            .rasterize(1000.0, 1000.0)
            .is_err());
    }

    #[test]
    fn test_is_finite() {
        assert!(source((0.0, 0.0), (1.0, 1.0)).is_finite());
        assert!(!source((f64::NAN, 0.0), (1.0, 1.0)).is_finite());
    }
}
