//! Math Primitives
//!
//! Vector, matrix, and bounding-box types used by every node.
//!
//! Vectors are thin aliases over [`glam`] types. [`Matrix44`] wraps
//! [`glam::DMat4`] but presents a **row-major** face: transformation
//! documents store matrices as four row arrays, and importers hand rows in,
//! so the row-major view is the one that appears everywhere in this crate.

use glam::{DMat4, DVec4};

/// 2D vector (UV coordinates, outline points).
pub type Vector2 = glam::DVec2;

/// 3D vector (positions, normals, offsets).
pub type Vector3 = glam::DVec3;

/// Tolerance for the affine last-row check of [`Matrix44`].
const LAST_ROW_TOLERANCE: f64 = 1e-5;

/// A 4×4 transformation matrix with row-major construction and storage
/// semantics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Matrix44(DMat4);

impl Matrix44 {
    /// The identity matrix.
    #[must_use]
    pub const fn identity() -> Self {
        Self(DMat4::IDENTITY)
    }

    /// Builds a matrix from four rows.
    #[must_use]
    pub fn from_rows(rows: [[f64; 4]; 4]) -> Self {
        // glam is column-major; rows go in as columns of the transpose.
        Self(
            DMat4::from_cols(
                DVec4::from_array(rows[0]),
                DVec4::from_array(rows[1]),
                DVec4::from_array(rows[2]),
                DVec4::from_array(rows[3]),
            )
            .transpose(),
        )
    }

    /// Builds a matrix from 16 values in row-major order.
    ///
    /// Returns `None` when the slice does not hold exactly 16 values.
    #[must_use]
    pub fn from_flat(values: &[f64]) -> Option<Self> {
        if values.len() != 16 {
            return None;
        }
        let mut rows = [[0.0; 4]; 4];
        for (i, row) in rows.iter_mut().enumerate() {
            row.copy_from_slice(&values[i * 4..i * 4 + 4]);
        }
        Some(Self::from_rows(rows))
    }

    /// A pure translation matrix.
    #[must_use]
    pub fn from_translation(offset: Vector3) -> Self {
        Self(DMat4::from_translation(offset))
    }

    /// Returns the four rows.
    #[must_use]
    pub fn rows(&self) -> [[f64; 4]; 4] {
        [
            self.0.row(0).to_array(),
            self.0.row(1).to_array(),
            self.0.row(2).to_array(),
            self.0.row(3).to_array(),
        ]
    }

    /// Returns the 16 values in row-major order.
    #[must_use]
    pub fn to_flat(&self) -> [f64; 16] {
        let rows = self.rows();
        let mut flat = [0.0; 16];
        for (i, row) in rows.iter().enumerate() {
            flat[i * 4..i * 4 + 4].copy_from_slice(row);
        }
        flat
    }

    #[must_use]
    pub fn transpose(&self) -> Self {
        Self(self.0.transpose())
    }

    #[must_use]
    pub fn determinant(&self) -> f64 {
        self.0.determinant()
    }

    /// Inverts the matrix, failing on a zero determinant.
    pub fn invert(&self) -> crate::errors::Result<Self> {
        if self.determinant() == 0.0 {
            return Err(crate::errors::TrellisError::SingularMatrix);
        }
        Ok(Self(self.0.inverse()))
    }

    /// Whether the last row is `[0, 0, 0, 1]` within tolerance.
    #[must_use]
    pub fn has_affine_last_row(&self) -> bool {
        let last = self.0.row(3);
        last.x.abs() <= LAST_ROW_TOLERANCE
            && last.y.abs() <= LAST_ROW_TOLERANCE
            && last.z.abs() <= LAST_ROW_TOLERANCE
            && (last.w - 1.0).abs() <= LAST_ROW_TOLERANCE
    }

    /// Transforms a point, treating the matrix as affine.
    ///
    /// A last row other than `[0, 0, 0, 1]` is flagged as a warning (the
    /// affine result is still returned); importers occasionally emit such
    /// matrices and the policy is to tolerate them.
    #[must_use]
    pub fn transform_point(&self, point: Vector3) -> Vector3 {
        if !self.has_affine_last_row() {
            log::warn!(
                "Potentially incorrect transformation: expected last row [0, 0, 0, 1], got {:?}",
                self.0.row(3).to_array()
            );
        }
        self.transform_point_affine(point)
    }

    /// [`Matrix44::transform_point`] without the last-row check; for bulk
    /// vertex paths that perform the check once up front.
    #[must_use]
    pub fn transform_point_affine(&self, point: Vector3) -> Vector3 {
        let rows = self.rows();
        Vector3::new(
            rows[0][0] * point.x + rows[0][1] * point.y + rows[0][2] * point.z + rows[0][3],
            rows[1][0] * point.x + rows[1][1] * point.y + rows[1][2] * point.z + rows[1][3],
            rows[2][0] * point.x + rows[2][1] * point.y + rows[2][2] * point.z + rows[2][3],
        )
    }

    /// Transforms a direction using only the upper-left 3×3 part (no
    /// translation). Used for normals.
    #[must_use]
    pub fn transform_direction(&self, direction: Vector3) -> Vector3 {
        let rows = self.rows();
        Vector3::new(
            rows[0][0] * direction.x + rows[0][1] * direction.y + rows[0][2] * direction.z,
            rows[1][0] * direction.x + rows[1][1] * direction.y + rows[1][2] * direction.z,
            rows[2][0] * direction.x + rows[2][1] * direction.y + rows[2][2] * direction.z,
        )
    }

    #[must_use]
    pub fn is_identity(&self) -> bool {
        self.0.abs_diff_eq(DMat4::IDENTITY, LAST_ROW_TOLERANCE)
    }
}

impl Default for Matrix44 {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Matrix44 {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self {
        Self(self.0 * rhs.0)
    }
}

/// An axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min: Vector3,
    pub max: Vector3,
}

impl BoundingBox {
    /// An empty box that any expansion will overwrite.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            min: Vector3::splat(f64::INFINITY),
            max: Vector3::splat(f64::NEG_INFINITY),
        }
    }

    /// Builds the box enclosing all given points; empty input yields
    /// [`BoundingBox::empty`].
    #[must_use]
    pub fn from_points<I>(points: I) -> Self
    where
        I: IntoIterator<Item = Vector3>,
    {
        let mut bbox = Self::empty();
        for point in points {
            bbox.expand_point(point);
        }
        bbox
    }

    pub fn expand_point(&mut self, point: Vector3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        Self {
            min: self.min.min(other.min),
            max: self.max.max(other.max),
        }
    }

    /// Whether the box encloses at least one point.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }
}
