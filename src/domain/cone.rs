//! Generalized inequalities describing convex footprints.
//!
//! A convex region in the body frame of a robot is written as `{p : G·p ≤_K g}`, i.e. the point
//! `p` belongs to the region iff `G·p - g` lies in the cone `-K`. Two cone families cover all
//! supported appearances: the nonnegative orthant for polygons and the second-order cone for
//! disks.

use std::f64::consts::PI;

use nalgebra::{DMatrix, DVector};
use thiserror::Error;

use super::Position;

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum ConeType {
    /// Componentwise ordering: every entry of `G·p - g` must be non-positive.
    #[default]
    RPositive,
    /// Second-order cone: `‖y[..n-1]‖ - y[n-1] ≤ 0`.
    Norm2,
}

/// Tests whether `y = G·p - g` satisfies the generalized inequality of `cone_type`.
pub fn in_cone(y: &DVector<f64>, cone_type: ConeType) -> bool {
    match cone_type {
        ConeType::RPositive => y.iter().all(|v| *v <= 0.0),
        ConeType::Norm2 => match y.as_slice().split_last() {
            Some((tail, head)) => {
                head.iter().map(|v| v * v).sum::<f64>().sqrt() - tail <= 0.0
            }
            None => false,
        },
    }
}

/// Body-frame collision boundary of a robot.
#[derive(Clone, Debug, PartialEq)]
pub struct Footprint {
    g_matrix: DMatrix<f64>,
    g: DVector<f64>,
    cone_type: ConeType,
}

impl Footprint {
    pub fn new(
        g_matrix: DMatrix<f64>,
        g: DVector<f64>,
        cone_type: ConeType,
    ) -> Result<Self, FootprintError> {
        if g_matrix.ncols() != 2 {
            return Err(FootprintError::ColumnMismatch(g_matrix.ncols()));
        }
        if g_matrix.nrows() != g.len() {
            return Err(FootprintError::RowMismatch {
                rows: g_matrix.nrows(),
                len: g.len(),
            });
        }
        Ok(Self {
            g_matrix,
            g,
            cone_type,
        })
    }

    /// Disk of radius `radius` centered on the body origin. A zero radius leaves the origin as
    /// the only point inside.
    pub fn circle(radius: f64) -> Result<Self, FootprintError> {
        if !(radius >= 0.0 && radius.is_finite()) {
            return Err(FootprintError::NegativeRadius(radius));
        }
        Self::new(
            DMatrix::from_row_slice(3, 2, &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0]),
            DVector::from_column_slice(&[0.0, 0.0, -radius]),
            ConeType::Norm2,
        )
    }

    /// Axis-aligned rectangle centered on the body origin, `length` along the heading.
    pub fn rectangle(length: f64, width: f64) -> Result<Self, FootprintError> {
        for side in [length, width] {
            if !(side > 0.0 && side.is_finite()) {
                return Err(FootprintError::NonPositiveLength(side));
            }
        }
        Self::new(
            DMatrix::from_row_slice(4, 2, &[1.0, 0.0, 0.0, 1.0, -1.0, 0.0, 0.0, -1.0]),
            DVector::from_column_slice(&[length / 2.0, width / 2.0, length / 2.0, width / 2.0]),
            ConeType::RPositive,
        )
    }

    /// Convex polygon given by its body-frame vertices in either winding order.
    ///
    /// Every edge `a → b` contributes the half-space `n·p ≤ n·a` with `n` the outward normal.
    pub fn polygon(vertices: &[Position]) -> Result<Self, FootprintError> {
        let orientation = convex_orientation(vertices)?;
        let mut rows = Vec::with_capacity(2 * vertices.len());
        let mut bounds = Vec::with_capacity(vertices.len());
        for (i, a) in vertices.iter().enumerate() {
            let b = vertices[(i + 1) % vertices.len()];
            let edge = b - *a;
            // Outward normal: right-hand normal for counter-clockwise polygons.
            let normal = Position::new(edge.y(), -edge.x()).scale(orientation);
            rows.extend_from_slice(&[normal.x(), normal.y()]);
            bounds.push(normal.dot(*a));
        }
        Self::new(
            DMatrix::from_row_slice(vertices.len(), 2, &rows),
            DVector::from_vec(bounds),
            ConeType::RPositive,
        )
    }

    pub fn g_matrix(&self) -> &DMatrix<f64> {
        &self.g_matrix
    }

    pub fn g(&self) -> &DVector<f64> {
        &self.g
    }

    pub fn cone_type(&self) -> ConeType {
        self.cone_type
    }

    /// Tests a body-frame point, boundary inclusive.
    pub fn contains(&self, point: Position) -> bool {
        let y = &self.g_matrix * DVector::from_column_slice(&[point.x(), point.y()]) - &self.g;
        in_cone(&y, self.cone_type)
    }
}

/// Returns `1.0` for counter-clockwise and `-1.0` for clockwise convex polygons.
///
/// All turns must share one sign and the exterior angles must add up to a single revolution,
/// which rules out self-intersecting stars.
fn convex_orientation(vertices: &[Position]) -> Result<f64, FootprintError> {
    if vertices.len() < 3 {
        return Err(FootprintError::TooFewVertices(vertices.len()));
    }
    let mut sign = 0.0;
    let mut winding = 0.0;
    for (i, a) in vertices.iter().enumerate() {
        let b = vertices[(i + 1) % vertices.len()];
        let c = vertices[(i + 2) % vertices.len()];
        let (incoming, outgoing) = (b - *a, c - b);
        let turn = incoming.cross(outgoing);
        if turn.abs() <= f64::EPSILON {
            return Err(FootprintError::NotConvex);
        }
        if sign == 0.0 {
            sign = turn.signum();
        } else if turn.signum() != sign {
            return Err(FootprintError::NotConvex);
        }
        winding += turn.atan2(incoming.dot(outgoing));
    }
    if (winding.abs() - 2.0 * PI).abs() > 1e-6 {
        return Err(FootprintError::NotConvex);
    }
    Ok(sign)
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum FootprintError {
    #[error("inequality matrix has {rows} rows but the bound vector has {len} entries")]
    RowMismatch { rows: usize, len: usize },
    #[error("inequality matrix has {0} columns, expected 2")]
    ColumnMismatch(usize),
    #[error("circle radius must be non-negative, got {0}")]
    NegativeRadius(f64),
    #[error("rectangle side must be positive, got {0}")]
    NonPositiveLength(f64),
    #[error("polygon needs at least 3 vertices, got {0}")]
    TooFewVertices(usize),
    #[error("polygon is not strictly convex and simple")]
    NotConvex,
}
