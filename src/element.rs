//! Reference cells, geometric maps and their inverses.
//!
//! Each supported cell shape has an element type storing its vertex coordinates and
//! providing the reference-to-physical geometric map, its Jacobian and the reference
//! basis of the geometric (P1/Q1) interpolation. [`CellGeometry`] is the closed
//! tagged-variant dispatch over these types keyed by [`CellType`].
//!
//! Physical coordinates are always three-dimensional; cells whose reference dimension
//! `d` is lower than three ignore the trailing reference components. Reference cells
//! are the unit cells: `[0, 1]` for the interval, the unit triangle/tetrahedron for
//! the simplices and `[0, 1]^d` with tensor-product vertex ordering for the
//! quadrilateral and hexahedron.

use crate::error::InverseMapError;
use crate::Real;
use itertools::{izip, Itertools};
use nalgebra::{
    distance, Matrix1x2, Matrix1x3, Matrix1x4, Matrix2, Matrix2x3, Matrix2x4, Matrix3, Matrix3x2,
    Matrix3x4, OMatrix, Point3, Vector2, Vector3, U1, U2, U3, U8,
};
use numeric_literals::replace_float_literals;

/// The shape of a reference cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellType {
    Interval,
    Triangle,
    Quadrilateral,
    Tetrahedron,
    Hexahedron,
}

impl CellType {
    pub fn num_vertices(&self) -> usize {
        match self {
            CellType::Interval => 2,
            CellType::Triangle => 3,
            CellType::Quadrilateral => 4,
            CellType::Tetrahedron => 4,
            CellType::Hexahedron => 8,
        }
    }

    /// The topological dimension of the reference cell.
    pub fn reference_dim(&self) -> usize {
        match self {
            CellType::Interval => 1,
            CellType::Triangle | CellType::Quadrilateral => 2,
            CellType::Tetrahedron | CellType::Hexahedron => 3,
        }
    }

    /// Whether the cell-to-reference map is affine.
    pub fn is_simplex(&self) -> bool {
        matches!(
            self,
            CellType::Interval | CellType::Triangle | CellType::Tetrahedron
        )
    }
}

/// Settings for Newton-based inversion of non-affine geometric maps.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct InverseMapSettings<T> {
    /// Hard cap on the number of Newton iterations. Exceeding it is a failure,
    /// not a retry.
    pub max_iterations: usize,
    /// Convergence tolerance relative to the cell diameter. Must stay well below
    /// the inclusion band of any collision test applied to the result, so that a
    /// converged inversion is never rejected by its own residual.
    pub relative_tolerance: T,
}

impl<T: Real> Default for InverseMapSettings<T> {
    fn default() -> Self {
        Self {
            max_iterations: 25,
            relative_tolerance: T::from_f64(32.0).expect("Literal must fit in T")
                * T::default_epsilon(),
        }
    }
}

/// The Piola pushforward variants for vector-valued elements.
///
/// The contravariant transform preserves normal continuity across cell boundaries
/// (H(div) elements), the covariant transform preserves tangential continuity
/// (H(curl) elements).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiolaKind {
    Contravariant,
    Covariant,
}

/// Measure threshold below which a cell of diameter `h` and reference dimension `d`
/// is considered degenerate.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
fn degeneracy_threshold<T: Real>(h: T, d: i32) -> T {
    100.0 * T::default_epsilon() * h.powi(d)
}

/// Linear basis functions on the unit interval `[0, 1]`.
#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
#[inline(always)]
fn phi_linear_1d<T: Real>(node: usize, x: T) -> T {
    if node == 0 {
        1.0 - x
    } else {
        x
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
#[inline(always)]
fn phi_linear_1d_grad<T: Real>(node: usize) -> T {
    if node == 0 {
        -1.0
    } else {
        1.0
    }
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct IntervalElement<T: Real> {
    vertices: [Point3<T>; 2],
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TriangleElement<T: Real> {
    vertices: [Point3<T>; 3],
}

/// A bilinear quadrilateral with tensor-product vertex ordering
/// `(0,0), (1,0), (0,1), (1,1)`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct QuadrilateralElement<T: Real> {
    vertices: [Point3<T>; 4],
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub struct TetrahedronElement<T: Real> {
    vertices: [Point3<T>; 4],
}

/// A trilinear hexahedron with tensor-product vertex ordering: vertex `i` sits at
/// reference coordinates given by the binary digits of `i`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct HexahedronElement<T: Real> {
    vertices: [Point3<T>; 8],
}

macro_rules! impl_element_common {
    ($element:ident, $num_vertices:literal) => {
        impl<T: Real> $element<T> {
            pub fn from_vertices(vertices: [Point3<T>; $num_vertices]) -> Self {
                Self { vertices }
            }

            pub fn vertices(&self) -> &[Point3<T>; $num_vertices] {
                &self.vertices
            }

            /// The diameter of the element: the largest distance between any two vertices.
            pub fn diameter(&self) -> T {
                self.vertices
                    .iter()
                    .tuple_combinations()
                    .map(|(x, y)| distance(x, y))
                    .fold(T::zero(), T::max)
            }
        }
    };
}

impl_element_common!(IntervalElement, 2);
impl_element_common!(TriangleElement, 3);
impl_element_common!(QuadrilateralElement, 4);
impl_element_common!(TetrahedronElement, 4);
impl_element_common!(HexahedronElement, 8);

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> IntervalElement<T> {
    pub fn reference() -> Self {
        Self::from_vertices([Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 0.0, 0.0)])
    }

    pub fn reference_basis(xi: &Point3<T>) -> Matrix1x2<T> {
        Matrix1x2::new(1.0 - xi.x, xi.x)
    }

    pub fn reference_basis_gradients(_xi: &Point3<T>) -> Matrix1x2<T> {
        Matrix1x2::new(-1.0, 1.0)
    }

    pub fn map_reference_coords(&self, xi: &Point3<T>) -> Point3<T> {
        let x = OMatrix::<T, U3, U2>::from_fn(|i, j| self.vertices[j][i]);
        let n = Self::reference_basis(xi);
        Point3::from(x * n.transpose())
    }

    pub fn reference_jacobian(&self, _xi: &Point3<T>) -> Vector3<T> {
        self.vertices[1] - self.vertices[0]
    }

    fn invert_map(&self, x: &Point3<T>) -> Result<Point3<T>, InverseMapError> {
        let a = self.vertices[1] - self.vertices[0];
        let a2 = a.norm_squared();
        let scale = 1.0 + self.vertices[0].coords.norm() + self.vertices[1].coords.norm();
        if a2 <= (T::default_epsilon() * scale).powi(2) {
            return Err(InverseMapError::SingularJacobian);
        }
        let t = a.dot(&(x - self.vertices[0])) / a2;
        Ok(Point3::new(t, 0.0, 0.0))
    }

    fn contains_reference_point(xi: &Point3<T>, eps: T) -> bool {
        xi.x >= -eps && xi.x <= 1.0 + eps
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> TriangleElement<T> {
    pub fn reference() -> Self {
        Self::from_vertices([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ])
    }

    pub fn reference_basis(xi: &Point3<T>) -> Matrix1x3<T> {
        Matrix1x3::new(1.0 - xi.x - xi.y, xi.x, xi.y)
    }

    #[rustfmt::skip]
    pub fn reference_basis_gradients(_xi: &Point3<T>) -> Matrix2x3<T> {
        Matrix2x3::new(
            -1.0, 1.0, 0.0,
            -1.0, 0.0, 1.0,
        )
    }

    pub fn map_reference_coords(&self, xi: &Point3<T>) -> Point3<T> {
        let x = Matrix3::from_fn(|i, j| self.vertices[j][i]);
        let n = Self::reference_basis(xi);
        Point3::from(x * n.transpose())
    }

    pub fn reference_jacobian(&self, _xi: &Point3<T>) -> Matrix3x2<T> {
        Matrix3x2::from_columns(&[
            self.vertices[1] - self.vertices[0],
            self.vertices[2] - self.vertices[0],
        ])
    }

    /// Inverts the affine map by solving the normal equations of the `3 x 2`
    /// edge-vector system, which also covers triangles embedded in 3D.
    fn invert_map(&self, x: &Point3<T>) -> Result<Point3<T>, InverseMapError> {
        let e1 = self.vertices[1] - self.vertices[0];
        let e2 = self.vertices[2] - self.vertices[0];
        let jtj = Matrix2::new(e1.dot(&e1), e1.dot(&e2), e1.dot(&e2), e2.dot(&e2));
        if jtj.determinant() <= degeneracy_threshold(self.diameter(), 2).powi(2) {
            return Err(InverseMapError::SingularJacobian);
        }
        let r = x - self.vertices[0];
        let rhs = Vector2::new(e1.dot(&r), e2.dot(&r));
        let xi = jtj.try_inverse().ok_or(InverseMapError::SingularJacobian)? * rhs;
        Ok(Point3::new(xi.x, xi.y, 0.0))
    }

    fn contains_reference_point(xi: &Point3<T>, eps: T) -> bool {
        // Barycentric coordinates are (1 - x - y, x, y); their sum is exactly one
        // by construction, so only the interval bounds need testing.
        let lambda0 = 1.0 - xi.x - xi.y;
        let in_bounds = |l: T| l >= -eps && l <= 1.0 + eps;
        in_bounds(lambda0) && in_bounds(xi.x) && in_bounds(xi.y)
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> QuadrilateralElement<T> {
    pub fn reference() -> Self {
        Self::from_vertices([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
        ])
    }

    pub fn reference_basis(xi: &Point3<T>) -> Matrix1x4<T> {
        let phi = |i, j| phi_linear_1d(i, xi.x) * phi_linear_1d(j, xi.y);
        Matrix1x4::new(phi(0, 0), phi(1, 0), phi(0, 1), phi(1, 1))
    }

    pub fn reference_basis_gradients(xi: &Point3<T>) -> Matrix2x4<T> {
        let phi_grad = |i: usize, j: usize| {
            Vector2::new(
                phi_linear_1d_grad::<T>(i) * phi_linear_1d(j, xi.y),
                phi_linear_1d(i, xi.x) * phi_linear_1d_grad(j),
            )
        };
        Matrix2x4::from_columns(&[phi_grad(0, 0), phi_grad(1, 0), phi_grad(0, 1), phi_grad(1, 1)])
    }

    pub fn map_reference_coords(&self, xi: &Point3<T>) -> Point3<T> {
        let x = Matrix3x4::from_fn(|i, j| self.vertices[j][i]);
        let n = Self::reference_basis(xi);
        Point3::from(x * n.transpose())
    }

    pub fn reference_jacobian(&self, xi: &Point3<T>) -> Matrix3x2<T> {
        let x = Matrix3x4::from_fn(|i, j| self.vertices[j][i]);
        let g = Self::reference_basis_gradients(xi);
        x * g.transpose()
    }

    /// Inverts the bilinear map with a Gauss-Newton iteration on the normal
    /// equations, starting from the reference-cell center. The normal-equation
    /// form also covers quadrilaterals embedded in 3D.
    fn invert_map(
        &self,
        x: &Point3<T>,
        settings: &InverseMapSettings<T>,
    ) -> Result<Point3<T>, InverseMapError> {
        let h = self.diameter();
        let tolerance = settings.relative_tolerance * h * h;
        let jtj_threshold = degeneracy_threshold(h, 2).powi(2);
        let x = *x;

        let mut xi = Vector2::new(0.5, 0.5);
        let mut iter = 0;
        loop {
            let xi_point = Point3::new(xi.x, xi.y, 0.0);
            let residual = self.map_reference_coords(&xi_point) - x;
            let j = self.reference_jacobian(&xi_point);
            let grad = j.transpose() * residual;
            if grad.norm() <= tolerance {
                return Ok(xi_point);
            }
            if iter == settings.max_iterations {
                return Err(InverseMapError::MaximumIterationsReached(iter));
            }
            let jtj = j.transpose() * j;
            if jtj.determinant() <= jtj_threshold {
                return Err(InverseMapError::SingularJacobian);
            }
            let step = jtj.try_inverse().ok_or(InverseMapError::SingularJacobian)? * grad;
            xi -= step;
            // A step at rounding level cannot improve the iterate further; this also
            // terminates least-squares inversions of points off an embedded cell's
            // plane, whose residual never vanishes.
            if step.norm() <= T::default_epsilon() * (1.0 + xi.norm()) {
                return Ok(Point3::new(xi.x, xi.y, 0.0));
            }
            iter += 1;
        }
    }

    fn contains_reference_point(xi: &Point3<T>, eps: T) -> bool {
        let in_bounds = |l: T| l >= -eps && l <= 1.0 + eps;
        in_bounds(xi.x) && in_bounds(xi.y)
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> TetrahedronElement<T> {
    pub fn reference() -> Self {
        Self::from_vertices([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
        ])
    }

    pub fn reference_basis(xi: &Point3<T>) -> Matrix1x4<T> {
        Matrix1x4::new(1.0 - xi.x - xi.y - xi.z, xi.x, xi.y, xi.z)
    }

    #[rustfmt::skip]
    pub fn reference_basis_gradients(_xi: &Point3<T>) -> Matrix3x4<T> {
        Matrix3x4::new(
            -1.0, 1.0, 0.0, 0.0,
            -1.0, 0.0, 1.0, 0.0,
            -1.0, 0.0, 0.0, 1.0,
        )
    }

    pub fn map_reference_coords(&self, xi: &Point3<T>) -> Point3<T> {
        let x = Matrix3x4::from_fn(|i, j| self.vertices[j][i]);
        let n = Self::reference_basis(xi);
        Point3::from(x * n.transpose())
    }

    pub fn reference_jacobian(&self, _xi: &Point3<T>) -> Matrix3<T> {
        Matrix3::from_columns(&[
            self.vertices[1] - self.vertices[0],
            self.vertices[2] - self.vertices[0],
            self.vertices[3] - self.vertices[0],
        ])
    }

    fn invert_map(&self, x: &Point3<T>) -> Result<Point3<T>, InverseMapError> {
        let j = self.reference_jacobian(&Point3::origin());
        if j.determinant().abs() <= degeneracy_threshold(self.diameter(), 3) {
            return Err(InverseMapError::SingularJacobian);
        }
        let r = x - self.vertices[0];
        let xi = j
            .full_piv_lu()
            .solve(&r)
            .ok_or(InverseMapError::SingularJacobian)?;
        Ok(Point3::from(xi))
    }

    fn contains_reference_point(xi: &Point3<T>, eps: T) -> bool {
        let lambda0 = 1.0 - xi.x - xi.y - xi.z;
        let in_bounds = |l: T| l >= -eps && l <= 1.0 + eps;
        in_bounds(lambda0) && in_bounds(xi.x) && in_bounds(xi.y) && in_bounds(xi.z)
    }
}

#[replace_float_literals(T::from_f64(literal).expect("Literal must fit in T"))]
impl<T: Real> HexahedronElement<T> {
    pub fn reference() -> Self {
        Self::from_vertices([
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
        ])
    }

    pub fn reference_basis(xi: &Point3<T>) -> OMatrix<T, U1, U8> {
        OMatrix::<T, U1, U8>::from_fn(|_, k| {
            phi_linear_1d(k & 1, xi.x)
                * phi_linear_1d((k >> 1) & 1, xi.y)
                * phi_linear_1d((k >> 2) & 1, xi.z)
        })
    }

    pub fn reference_basis_gradients(xi: &Point3<T>) -> OMatrix<T, U3, U8> {
        OMatrix::<T, U3, U8>::from_fn(|i, k| {
            let (nx, ny, nz) = (k & 1, (k >> 1) & 1, (k >> 2) & 1);
            match i {
                0 => phi_linear_1d_grad::<T>(nx) * phi_linear_1d(ny, xi.y) * phi_linear_1d(nz, xi.z),
                1 => phi_linear_1d(nx, xi.x) * phi_linear_1d_grad(ny) * phi_linear_1d(nz, xi.z),
                _ => phi_linear_1d(nx, xi.x) * phi_linear_1d(ny, xi.y) * phi_linear_1d_grad(nz),
            }
        })
    }

    pub fn map_reference_coords(&self, xi: &Point3<T>) -> Point3<T> {
        let x = OMatrix::<T, U3, U8>::from_fn(|i, j| self.vertices[j][i]);
        let n = Self::reference_basis(xi);
        Point3::from(x * n.transpose())
    }

    pub fn reference_jacobian(&self, xi: &Point3<T>) -> Matrix3<T> {
        let x = OMatrix::<T, U3, U8>::from_fn(|i, j| self.vertices[j][i]);
        let g = Self::reference_basis_gradients(xi);
        x * g.transpose()
    }

    /// Inverts the trilinear map with a bounded Newton iteration starting from the
    /// reference-cell center.
    fn invert_map(
        &self,
        x: &Point3<T>,
        settings: &InverseMapSettings<T>,
    ) -> Result<Point3<T>, InverseMapError> {
        let h = self.diameter();
        let tolerance = settings.relative_tolerance * h;
        let det_threshold = degeneracy_threshold(h, 3);
        let x = *x;

        let mut xi = Vector3::new(0.5, 0.5, 0.5);
        let mut iter = 0;
        loop {
            let xi_point = Point3::from(xi);
            let residual = self.map_reference_coords(&xi_point) - x;
            if residual.norm() <= tolerance {
                return Ok(xi_point);
            }
            if iter == settings.max_iterations {
                return Err(InverseMapError::MaximumIterationsReached(iter));
            }
            let j = self.reference_jacobian(&xi_point);
            if j.determinant().abs() <= det_threshold {
                return Err(InverseMapError::SingularJacobian);
            }
            let step = j
                .full_piv_lu()
                .solve(&residual)
                .ok_or(InverseMapError::SingularJacobian)?;
            xi -= step;
            // A step at rounding level cannot improve the iterate further
            if step.norm() <= T::default_epsilon() * (1.0 + xi.norm()) {
                return Ok(Point3::from(xi));
            }
            iter += 1;
        }
    }

    fn contains_reference_point(xi: &Point3<T>, eps: T) -> bool {
        let in_bounds = |l: T| l >= -eps && l <= 1.0 + eps;
        in_bounds(xi.x) && in_bounds(xi.y) && in_bounds(xi.z)
    }
}

/// Closed dispatch over the supported cell shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum CellGeometry<T: Real> {
    Interval(IntervalElement<T>),
    Triangle(TriangleElement<T>),
    Quadrilateral(QuadrilateralElement<T>),
    Tetrahedron(TetrahedronElement<T>),
    Hexahedron(HexahedronElement<T>),
}

impl<T: Real> CellGeometry<T> {
    /// Builds the geometry for the given cell type from its ordered vertex coordinates.
    ///
    /// # Panics
    ///
    /// Panics if the number of vertices does not match the cell type.
    pub fn from_vertices(cell_type: CellType, vertices: &[Point3<T>]) -> Self {
        assert_eq!(
            vertices.len(),
            cell_type.num_vertices(),
            "Number of vertices must match cell type"
        );
        match cell_type {
            CellType::Interval => {
                CellGeometry::Interval(IntervalElement::from_vertices(vertices.try_into().unwrap()))
            }
            CellType::Triangle => {
                CellGeometry::Triangle(TriangleElement::from_vertices(vertices.try_into().unwrap()))
            }
            CellType::Quadrilateral => CellGeometry::Quadrilateral(
                QuadrilateralElement::from_vertices(vertices.try_into().unwrap()),
            ),
            CellType::Tetrahedron => CellGeometry::Tetrahedron(TetrahedronElement::from_vertices(
                vertices.try_into().unwrap(),
            )),
            CellType::Hexahedron => CellGeometry::Hexahedron(HexahedronElement::from_vertices(
                vertices.try_into().unwrap(),
            )),
        }
    }

    pub fn cell_type(&self) -> CellType {
        match self {
            CellGeometry::Interval(_) => CellType::Interval,
            CellGeometry::Triangle(_) => CellType::Triangle,
            CellGeometry::Quadrilateral(_) => CellType::Quadrilateral,
            CellGeometry::Tetrahedron(_) => CellType::Tetrahedron,
            CellGeometry::Hexahedron(_) => CellType::Hexahedron,
        }
    }

    pub fn vertices(&self) -> &[Point3<T>] {
        match self {
            CellGeometry::Interval(e) => &e.vertices()[..],
            CellGeometry::Triangle(e) => &e.vertices()[..],
            CellGeometry::Quadrilateral(e) => &e.vertices()[..],
            CellGeometry::Tetrahedron(e) => &e.vertices()[..],
            CellGeometry::Hexahedron(e) => &e.vertices()[..],
        }
    }

    pub fn is_finite(&self) -> bool {
        self.vertices()
            .iter()
            .all(|v| v.coords.iter().all(|x| x.is_finite()))
    }

    pub fn diameter(&self) -> T {
        match self {
            CellGeometry::Interval(e) => e.diameter(),
            CellGeometry::Triangle(e) => e.diameter(),
            CellGeometry::Quadrilateral(e) => e.diameter(),
            CellGeometry::Tetrahedron(e) => e.diameter(),
            CellGeometry::Hexahedron(e) => e.diameter(),
        }
    }

    /// Maps reference coordinates to physical coordinates.
    pub fn map_reference_coords(&self, xi: &Point3<T>) -> Point3<T> {
        match self {
            CellGeometry::Interval(e) => e.map_reference_coords(xi),
            CellGeometry::Triangle(e) => e.map_reference_coords(xi),
            CellGeometry::Quadrilateral(e) => e.map_reference_coords(xi),
            CellGeometry::Tetrahedron(e) => e.map_reference_coords(xi),
            CellGeometry::Hexahedron(e) => e.map_reference_coords(xi),
        }
    }

    /// Maps a physical point to reference coordinates by inverting the geometric map.
    ///
    /// The inversion is closed-form for simplex cells and a bounded Newton iteration
    /// for tensor-product cells. The returned reference point is not clamped to the
    /// reference cell; use [`contains_reference_point`](Self::contains_reference_point)
    /// to test membership.
    pub fn invert_map(
        &self,
        x: &Point3<T>,
        settings: &InverseMapSettings<T>,
    ) -> Result<Point3<T>, InverseMapError> {
        match self {
            CellGeometry::Interval(e) => e.invert_map(x),
            CellGeometry::Triangle(e) => e.invert_map(x),
            CellGeometry::Quadrilateral(e) => e.invert_map(x, settings),
            CellGeometry::Tetrahedron(e) => e.invert_map(x),
            CellGeometry::Hexahedron(e) => e.invert_map(x, settings),
        }
    }

    /// Boundary-inclusive membership test in reference coordinates: every coordinate
    /// (and, for simplices, the complementary barycentric coordinate) must lie in
    /// `[-eps, 1 + eps]`.
    pub fn contains_reference_point(&self, xi: &Point3<T>, eps: T) -> bool {
        match self {
            CellGeometry::Interval(_) => IntervalElement::contains_reference_point(xi, eps),
            CellGeometry::Triangle(_) => TriangleElement::contains_reference_point(xi, eps),
            CellGeometry::Quadrilateral(_) => {
                QuadrilateralElement::contains_reference_point(xi, eps)
            }
            CellGeometry::Tetrahedron(_) => TetrahedronElement::contains_reference_point(xi, eps),
            CellGeometry::Hexahedron(_) => HexahedronElement::contains_reference_point(xi, eps),
        }
    }

    /// Applies a Piola pushforward to reference basis values evaluated at `xi`.
    ///
    /// `reference_values` holds `num_basis_functions` chunks of length `d` (the
    /// reference dimension), `physical_values` the corresponding chunks of length 3.
    pub fn push_forward_piola(
        &self,
        kind: PiolaKind,
        xi: &Point3<T>,
        reference_values: &[T],
        physical_values: &mut [T],
    ) -> Result<(), InverseMapError> {
        let d = self.cell_type().reference_dim();
        assert_eq!(reference_values.len() % d, 0);
        assert_eq!(physical_values.len(), reference_values.len() / d * 3);
        let h = self.diameter();

        match self {
            CellGeometry::Interval(e) => {
                let a = e.reference_jacobian(xi);
                let length = a.norm();
                if length <= degeneracy_threshold(h, 1) {
                    return Err(InverseMapError::SingularJacobian);
                }
                for (v_ref, v_phys) in izip!(
                    reference_values.chunks_exact(1),
                    physical_values.chunks_exact_mut(3)
                ) {
                    let mapped = match kind {
                        PiolaKind::Contravariant => a * (v_ref[0] / length),
                        PiolaKind::Covariant => a * (v_ref[0] / (length * length)),
                    };
                    v_phys.copy_from_slice(mapped.as_slice());
                }
            }
            CellGeometry::Triangle(_) | CellGeometry::Quadrilateral(_) => {
                let j = match self {
                    CellGeometry::Triangle(e) => e.reference_jacobian(xi),
                    CellGeometry::Quadrilateral(e) => e.reference_jacobian(xi),
                    _ => unreachable!(),
                };
                let jtj = j.transpose() * j;
                let det2 = jtj.determinant();
                if det2 <= degeneracy_threshold(h, 2).powi(2) {
                    return Err(InverseMapError::SingularJacobian);
                }
                let jtj_inv = jtj
                    .try_inverse()
                    .ok_or(InverseMapError::SingularJacobian)?;
                for (v_ref, v_phys) in izip!(
                    reference_values.chunks_exact(2),
                    physical_values.chunks_exact_mut(3)
                ) {
                    let v = Vector2::new(v_ref[0], v_ref[1]);
                    let mapped = match kind {
                        PiolaKind::Contravariant => (j * v) / det2.sqrt(),
                        PiolaKind::Covariant => j * (jtj_inv * v),
                    };
                    v_phys.copy_from_slice(mapped.as_slice());
                }
            }
            CellGeometry::Tetrahedron(_) | CellGeometry::Hexahedron(_) => {
                let j = match self {
                    CellGeometry::Tetrahedron(e) => e.reference_jacobian(xi),
                    CellGeometry::Hexahedron(e) => e.reference_jacobian(xi),
                    _ => unreachable!(),
                };
                let det = j.determinant();
                if det.abs() <= degeneracy_threshold(h, 3) {
                    return Err(InverseMapError::SingularJacobian);
                }
                let j_inv_t = j
                    .try_inverse()
                    .ok_or(InverseMapError::SingularJacobian)?
                    .transpose();
                for (v_ref, v_phys) in izip!(
                    reference_values.chunks_exact(3),
                    physical_values.chunks_exact_mut(3)
                ) {
                    let v = Vector3::new(v_ref[0], v_ref[1], v_ref[2]);
                    let mapped = match kind {
                        PiolaKind::Contravariant => (j * v) / det,
                        PiolaKind::Covariant => j_inv_t * v,
                    };
                    v_phys.copy_from_slice(mapped.as_slice());
                }
            }
        }
        Ok(())
    }
}

/// Evaluates the geometric (P1/Q1) reference basis of the given cell type at `xi`.
///
/// # Panics
///
/// Panics if `values` does not have exactly one entry per cell vertex.
pub fn populate_reference_basis_values<T: Real>(
    cell_type: CellType,
    xi: &Point3<T>,
    values: &mut [T],
) {
    assert_eq!(values.len(), cell_type.num_vertices());
    match cell_type {
        CellType::Interval => {
            values.copy_from_slice(IntervalElement::reference_basis(xi).as_slice())
        }
        CellType::Triangle => {
            values.copy_from_slice(TriangleElement::reference_basis(xi).as_slice())
        }
        CellType::Quadrilateral => {
            values.copy_from_slice(QuadrilateralElement::reference_basis(xi).as_slice())
        }
        CellType::Tetrahedron => {
            values.copy_from_slice(TetrahedronElement::reference_basis(xi).as_slice())
        }
        CellType::Hexahedron => {
            values.copy_from_slice(HexahedronElement::reference_basis(xi).as_slice())
        }
    }
}
