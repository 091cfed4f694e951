//! Exact point-in-cell collision tests.
//!
//! The tests are boundary-inclusive: a point on a face, edge or vertex of a cell
//! collides with it. A point on an entity shared between several cells therefore
//! collides with all of them.

use crate::element::{CellGeometry, CellType, InverseMapSettings};
use crate::space::FunctionSpace;
use crate::{CellIndex, Real};
use nalgebra::{distance, Point3};

/// Tolerance used by the boundary-inclusive collision tests.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct CollisionTolerance<T> {
    /// Half-width of the inclusion band around the reference cell: a reference
    /// coordinate is accepted if it lies in `[-reference, 1 + reference]`.
    pub reference: T,
}

impl<T: Real> CollisionTolerance<T> {
    /// The absolute physical-space tolerance for a cell of diameter `h`.
    pub fn absolute(&self, h: T) -> T {
        self.reference * h
    }
}

impl<T: Real> Default for CollisionTolerance<T> {
    /// A small multiple of machine epsilon. In physical space the tolerance is
    /// additionally scaled by the local cell diameter.
    fn default() -> Self {
        Self {
            reference: T::from_f64(512.0).expect("Literal must fit in T") * T::default_epsilon(),
        }
    }
}

/// Tests whether `point` lies inside (or on the boundary of) the cell with the
/// given ordered vertices and cell type.
///
/// Simplex cells are tested through the barycentric coordinates obtained by
/// inverting the affine cell map; tensor-product cells through a bounded Newton
/// inversion of the multilinear map. Cells with near-zero measure or non-finite
/// vertex data never collide. Cells embedded with lower topological than geometric
/// dimension additionally require the point to lie in the cell's plane (or on its
/// line) up to the size-relative tolerance.
///
/// # Panics
///
/// Panics if the number of vertices does not match `cell_type`.
pub fn collides<T: Real>(
    vertices: &[Point3<T>],
    cell_type: CellType,
    point: &Point3<T>,
    tol: &CollisionTolerance<T>,
) -> bool {
    let geometry = CellGeometry::from_vertices(cell_type, vertices);
    if !geometry.is_finite() || !point.coords.iter().all(|x| x.is_finite()) {
        return false;
    }

    // Degenerate cells and diverging Newton iterations report as non-colliding
    // rather than failing: a candidate for which the inverse map has no meaningful
    // solution cannot contain the point.
    let settings = InverseMapSettings::default();
    let xi = match geometry.invert_map(point, &settings) {
        Ok(xi) => xi,
        Err(_) => return false,
    };

    if !geometry.contains_reference_point(&xi, tol.reference) {
        return false;
    }

    // Forward-map residual check. For cells of full topological dimension this is
    // trivially satisfied by the inversion; for embedded cells it rejects points
    // off the cell's plane or line.
    let mapped = geometry.map_reference_coords(&xi);
    distance(&mapped, point) <= tol.absolute(geometry.diameter())
}

/// Tests `point` against every cell in `cells`, returning one boolean per cell in
/// input order.
pub fn collides_many<T, S>(
    cells: &[CellIndex],
    space: &S,
    point: &Point3<T>,
    tol: &CollisionTolerance<T>,
) -> Vec<bool>
where
    T: Real,
    S: FunctionSpace<T>,
{
    cells
        .iter()
        .map(|&cell| collides(&space.cell_vertices(cell), space.cell_type(cell), point, tol))
        .collect()
}
