use std::fmt;

use serde::{Deserialize, Serialize};

use crate::disk_rtree::rtree_types::{SpatialError, SpatialResult};
use crate::hyper_rectangle::HyperRectangle;

/// Opaque reference to the external record a point indexes.
pub type ObjectId = u64;

/// A point in `D` dimensions tagged with the id of the record it locates.
///
/// Points are immutable once built. After insertion a point is owned by
/// exactly one leaf entry of the tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpatialPoint {
    coordinates: Vec<f64>,
    object_id: ObjectId,
}

impl SpatialPoint {
    /// Creates a point. Coordinates must be non-empty and finite.
    pub fn new(coordinates: Vec<f64>, object_id: ObjectId) -> SpatialResult<Self> {
        if coordinates.is_empty() {
            return Err(SpatialError::InvalidOperation(
                "point must have at least one coordinate".into(),
            ));
        }
        if let Some(axis) = coordinates.iter().position(|c| !c.is_finite()) {
            return Err(SpatialError::InvalidOperation(format!(
                "non-finite coordinate on axis {}",
                axis
            )));
        }
        Ok(Self {
            coordinates,
            object_id,
        })
    }

    pub fn coordinates(&self) -> &[f64] {
        &self.coordinates
    }

    pub fn object_id(&self) -> ObjectId {
        self.object_id
    }

    pub fn dimension(&self) -> usize {
        self.coordinates.len()
    }

    /// The degenerate rectangle covering this point.
    pub fn mbr(&self) -> HyperRectangle {
        HyperRectangle::from_point(&self.coordinates)
    }
}

impl fmt::Display for SpatialPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{} [", self.object_id)?;
        for (i, c) in self.coordinates.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", c)?;
        }
        write!(f, "]")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_accessors() {
        let point = SpatialPoint::new(vec![1.0, 2.5, -3.0], 42).unwrap();
        assert_eq!(point.dimension(), 3);
        assert_eq!(point.object_id(), 42);
        assert_eq!(point.coordinates(), &[1.0, 2.5, -3.0]);
    }

    #[test]
    fn test_point_mbr_is_degenerate() {
        let point = SpatialPoint::new(vec![1.0, 2.0], 7).unwrap();
        let mbr = point.mbr();
        assert_eq!(mbr.min(), mbr.max());
        assert_eq!(mbr.volume(), 0.0);
        assert_eq!(
            mbr,
            HyperRectangle::new(vec![1.0, 2.0], vec![1.0, 2.0]).unwrap()
        );
    }

    #[test]
    fn test_point_rejects_empty_and_nan() {
        assert!(SpatialPoint::new(vec![], 1).is_err());
        assert!(SpatialPoint::new(vec![0.0, f64::NAN], 1).is_err());
        assert!(SpatialPoint::new(vec![f64::INFINITY], 1).is_err());
    }

    #[test]
    fn test_point_display() {
        let point = SpatialPoint::new(vec![1.0, 2.0], 9).unwrap();
        assert_eq!(point.to_string(), "#9 [1, 2]");
    }
}
