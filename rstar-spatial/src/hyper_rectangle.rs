use std::fmt;

use serde::{Deserialize, Serialize};

use crate::disk_rtree::rtree_types::{SpatialError, SpatialResult};

/// An axis-aligned minimum bounding rectangle in `D` dimensions.
///
/// `HyperRectangle` stores the lower and upper corner of a box. It is used for
/// every MBR in the tree as well as for query regions. Binary operations
/// require both operands to share the same dimension and fail with
/// [`SpatialError::DimensionMismatch`] otherwise.
///
/// All combinators return new rectangles. The only in-place mutations are
/// [`absorb`](Self::absorb) and [`absorb_point`](Self::absorb_point), which grow
/// the box just enough to cover their argument and never shrink it.
///
/// # Examples
///
/// ```rust
/// use rstar_spatial::HyperRectangle;
///
/// let a = HyperRectangle::new(vec![0.0, 0.0], vec![1.0, 1.0]).unwrap();
/// let b = HyperRectangle::new(vec![2.0, 2.0], vec![3.0, 3.0]).unwrap();
///
/// let union = a.union(&b).unwrap();
/// assert_eq!(union, HyperRectangle::new(vec![0.0, 0.0], vec![3.0, 3.0]).unwrap());
/// assert_eq!(a.overlap_volume(&b).unwrap(), 0.0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HyperRectangle {
    min: Vec<f64>,
    max: Vec<f64>,
}

impl HyperRectangle {
    /// Creates a rectangle from its lower and upper corners.
    ///
    /// Fails when the corners have different lengths, are empty, contain a
    /// non-finite value, or when `min[i] > max[i]` for any dimension.
    pub fn new(min: Vec<f64>, max: Vec<f64>) -> SpatialResult<Self> {
        if min.len() != max.len() {
            return Err(SpatialError::DimensionMismatch {
                expected: min.len(),
                actual: max.len(),
            });
        }
        if min.is_empty() {
            return Err(SpatialError::InvalidOperation(
                "rectangle must have at least one dimension".into(),
            ));
        }
        for (axis, (lo, hi)) in min.iter().zip(max.iter()).enumerate() {
            if !lo.is_finite() || !hi.is_finite() {
                return Err(SpatialError::InvalidOperation(format!(
                    "non-finite bound on axis {}",
                    axis
                )));
            }
            if lo > hi {
                return Err(SpatialError::InvalidOperation(format!(
                    "min {} exceeds max {} on axis {}",
                    lo, hi, axis
                )));
            }
        }
        Ok(Self { min, max })
    }

    /// Creates the degenerate rectangle covering exactly one point.
    pub(crate) fn from_point(coordinates: &[f64]) -> Self {
        Self {
            min: coordinates.to_vec(),
            max: coordinates.to_vec(),
        }
    }

    /// Number of dimensions.
    pub fn dimension(&self) -> usize {
        self.min.len()
    }

    /// Lower corner.
    pub fn min(&self) -> &[f64] {
        &self.min
    }

    /// Upper corner.
    pub fn max(&self) -> &[f64] {
        &self.max
    }

    /// Centre of the rectangle.
    pub fn center(&self) -> Vec<f64> {
        self.min
            .iter()
            .zip(self.max.iter())
            .map(|(lo, hi)| (lo + hi) / 2.0)
            .collect()
    }

    fn check_dimension(&self, other: &HyperRectangle) -> SpatialResult<()> {
        if self.dimension() != other.dimension() {
            return Err(SpatialError::DimensionMismatch {
                expected: self.dimension(),
                actual: other.dimension(),
            });
        }
        Ok(())
    }

    /// Smallest rectangle covering both `self` and `other`.
    pub fn union(&self, other: &HyperRectangle) -> SpatialResult<HyperRectangle> {
        self.check_dimension(other)?;
        Ok(self.merged(other))
    }

    /// Region covered by both rectangles.
    ///
    /// Returns `None` when any dimension has `min >= max`: rectangles that only
    /// share a boundary do not intersect.
    pub fn intersection(&self, other: &HyperRectangle) -> SpatialResult<Option<HyperRectangle>> {
        self.check_dimension(other)?;

        let mut min = Vec::with_capacity(self.dimension());
        let mut max = Vec::with_capacity(self.dimension());
        for i in 0..self.dimension() {
            let lo = self.min[i].max(other.min[i]);
            let hi = self.max[i].min(other.max[i]);
            if lo >= hi {
                return Ok(None);
            }
            min.push(lo);
            max.push(hi);
        }
        Ok(Some(HyperRectangle { min, max }))
    }

    /// Product of the extents. Degenerate rectangles have volume 0.
    pub fn volume(&self) -> f64 {
        self.min
            .iter()
            .zip(self.max.iter())
            .map(|(lo, hi)| hi - lo)
            .product()
    }

    /// Sum of the extents.
    pub fn perimeter(&self) -> f64 {
        self.min
            .iter()
            .zip(self.max.iter())
            .map(|(lo, hi)| hi - lo)
            .sum()
    }

    /// Synonym of [`perimeter`](Self::perimeter), used by split-axis selection.
    pub fn margin(&self) -> f64 {
        self.perimeter()
    }

    /// Volume of the region shared by both rectangles, 0 when they only touch.
    pub fn overlap_volume(&self, other: &HyperRectangle) -> SpatialResult<f64> {
        self.check_dimension(other)?;
        Ok(self.overlap(other))
    }

    /// Volume growth of `self` when it is extended to cover `addition`.
    pub fn enlargement_delta(&self, addition: &HyperRectangle) -> SpatialResult<f64> {
        self.check_dimension(addition)?;
        Ok(self.enlargement(addition))
    }

    /// Closed-interval intersection test: shared boundaries count.
    pub fn intersects(&self, other: &HyperRectangle) -> SpatialResult<bool> {
        self.check_dimension(other)?;
        Ok(self.touches(other))
    }

    /// Whether `other` lies completely inside `self`.
    pub fn contains(&self, other: &HyperRectangle) -> SpatialResult<bool> {
        self.check_dimension(other)?;
        Ok((0..self.dimension())
            .all(|i| self.min[i] <= other.min[i] && other.max[i] <= self.max[i]))
    }

    /// Whether the point lies inside the rectangle, bounds included.
    pub fn contains_point(&self, coordinates: &[f64]) -> SpatialResult<bool> {
        if coordinates.len() != self.dimension() {
            return Err(SpatialError::DimensionMismatch {
                expected: self.dimension(),
                actual: coordinates.len(),
            });
        }
        Ok(self.covers_point(coordinates))
    }

    /// Grows `self` to cover `other`. Never shrinks.
    pub fn absorb(&mut self, other: &HyperRectangle) -> SpatialResult<()> {
        self.check_dimension(other)?;
        self.expand(other);
        Ok(())
    }

    /// Grows `self` to cover the point. Never shrinks.
    pub fn absorb_point(&mut self, coordinates: &[f64]) -> SpatialResult<()> {
        if coordinates.len() != self.dimension() {
            return Err(SpatialError::DimensionMismatch {
                expected: self.dimension(),
                actual: coordinates.len(),
            });
        }
        self.expand_point(coordinates);
        Ok(())
    }

    // The unchecked helpers below are used by the tree engine once the
    // dimension of every input has been validated at the public boundary.

    pub(crate) fn merged(&self, other: &HyperRectangle) -> HyperRectangle {
        debug_assert_eq!(self.dimension(), other.dimension());
        let mut result = self.clone();
        result.expand(other);
        result
    }

    pub(crate) fn expand(&mut self, other: &HyperRectangle) {
        for i in 0..self.min.len() {
            self.min[i] = self.min[i].min(other.min[i]);
            self.max[i] = self.max[i].max(other.max[i]);
        }
    }

    pub(crate) fn expand_point(&mut self, coordinates: &[f64]) {
        for (i, value) in coordinates.iter().enumerate() {
            self.min[i] = self.min[i].min(*value);
            self.max[i] = self.max[i].max(*value);
        }
    }

    pub(crate) fn overlap(&self, other: &HyperRectangle) -> f64 {
        debug_assert_eq!(self.dimension(), other.dimension());
        let mut overlap = 1.0;
        for i in 0..self.min.len() {
            let omax = self.max[i].min(other.max[i]);
            let omin = self.min[i].max(other.min[i]);
            if omax <= omin {
                return 0.0;
            }
            overlap *= omax - omin;
        }
        overlap
    }

    pub(crate) fn enlargement(&self, addition: &HyperRectangle) -> f64 {
        (self.merged(addition).volume() - self.volume()).max(0.0)
    }

    pub(crate) fn touches(&self, other: &HyperRectangle) -> bool {
        (0..self.min.len()).all(|i| self.min[i] <= other.max[i] && other.min[i] <= self.max[i])
    }

    pub(crate) fn covers_point(&self, coordinates: &[f64]) -> bool {
        coordinates
            .iter()
            .enumerate()
            .all(|(i, value)| self.min[i] <= *value && *value <= self.max[i])
    }
}

impl fmt::Display for HyperRectangle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HyperRectangle(")?;
        for i in 0..self.min.len() {
            if i > 0 {
                write!(f, " x ")?;
            }
            write!(f, "[{}, {}]", self.min[i], self.max[i])?;
        }
        write!(f, ")")
    }
}
