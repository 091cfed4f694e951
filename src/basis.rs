//! Evaluation of basis functions at arbitrary physical points.
//!
//! Given a cell assumed (or previously confirmed, see [`crate::collision`]) to contain
//! a physical point, [`evaluate_basis_functions`] maps the point back to the reference
//! cell, evaluates the reference basis there and pushes the values forward to physical
//! space according to the function space's prescribed transform.

use crate::element::{InverseMapSettings, PiolaKind};
use crate::error::{GeometryError, InverseMapError};
use crate::space::{FunctionSpace, Pushforward};
use crate::{CellIndex, Real};
use nalgebra::Point3;
use std::ops::Index;

/// A dense row-major matrix of basis values: one row per cell-local basis function,
/// one column per value component.
#[derive(Debug, Clone, PartialEq)]
pub struct BasisValues<T> {
    data: Vec<T>,
    rows: usize,
    cols: usize,
}

impl<T> BasisValues<T> {
    fn from_row_major(data: Vec<T>, rows: usize, cols: usize) -> Self {
        assert_eq!(data.len(), rows * cols);
        Self { data, rows, cols }
    }

    /// The number of basis functions.
    pub fn num_basis_functions(&self) -> usize {
        self.rows
    }

    /// The number of components per basis value.
    pub fn value_size(&self) -> usize {
        self.cols
    }

    /// The values of basis function `i`, one entry per component.
    pub fn basis_function(&self, i: usize) -> &[T] {
        &self.data[i * self.cols..(i + 1) * self.cols]
    }

    /// The underlying row-major storage.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }
}

impl<T> Index<(usize, usize)> for BasisValues<T> {
    type Output = T;

    fn index(&self, (i, j): (usize, usize)) -> &T {
        assert!(i < self.rows && j < self.cols);
        &self.data[i * self.cols + j]
    }
}

/// Evaluates the physical basis functions of `cell` at the physical point `point`.
///
/// The result has one row per cell-local basis function (ordered as the cell's dofmap)
/// and [`FunctionSpace::value_size`] columns. `point` is expected to lie inside the
/// cell; points slightly outside still evaluate through extrapolation of the reference
/// basis, but points far outside may fail to converge for tensor-product cells.
///
/// # Errors
///
/// Returns an error if the cell's vertex data is non-finite, if the cell is degenerate,
/// or if the Newton inversion of a tensor-product cell map does not converge.
///
/// # Panics
///
/// Panics if the space's `value_size` is inconsistent with its pushforward: the
/// identity pushforward preserves `reference_value_size`, the Piola transforms
/// produce one component per spatial dimension.
pub fn evaluate_basis_functions<T, S>(
    space: &S,
    point: &Point3<T>,
    cell: CellIndex,
) -> Result<BasisValues<T>, GeometryError>
where
    T: Real,
    S: FunctionSpace<T>,
{
    let geometry = space.cell_geometry(cell);
    if !geometry.is_finite() {
        return Err(GeometryError::NonFiniteGeometry { cell_index: cell });
    }

    let settings = InverseMapSettings::default();
    let xi = geometry
        .invert_map(point, &settings)
        .map_err(|err| geometry_error(err, cell, point))?;

    let num_basis_functions = space.cell_dofs(cell).len();
    let reference_value_size = space.reference_value_size();
    let mut reference_values = vec![T::zero(); num_basis_functions * reference_value_size];
    space.populate_reference_basis(&mut reference_values, cell, &xi);

    let kind = match space.pushforward() {
        Pushforward::Identity => {
            assert_eq!(
                space.value_size(),
                reference_value_size,
                "Identity pushforward leaves the value size unchanged"
            );
            return Ok(BasisValues::from_row_major(
                reference_values,
                num_basis_functions,
                reference_value_size,
            ));
        }
        Pushforward::ContravariantPiola => PiolaKind::Contravariant,
        Pushforward::CovariantPiola => PiolaKind::Covariant,
    };
    assert_eq!(
        reference_value_size,
        geometry.cell_type().reference_dim(),
        "Piola pushforward requires one reference value component per reference dimension"
    );
    assert_eq!(
        space.value_size(),
        3,
        "Piola pushforward produces one physical value component per spatial dimension"
    );
    let mut physical_values = vec![T::zero(); num_basis_functions * 3];
    geometry
        .push_forward_piola(kind, &xi, &reference_values, &mut physical_values)
        .map_err(|err| geometry_error(err, cell, point))?;
    Ok(BasisValues::from_row_major(
        physical_values,
        num_basis_functions,
        3,
    ))
}

fn geometry_error<T: Real>(
    err: InverseMapError,
    cell: CellIndex,
    point: &Point3<T>,
) -> GeometryError {
    match err {
        InverseMapError::SingularJacobian => GeometryError::DegenerateCell { cell_index: cell },
        InverseMapError::MaximumIterationsReached(iterations) => {
            GeometryError::NewtonDidNotConverge {
                cell_index: cell,
                point: [
                    nalgebra::try_convert(point.x).unwrap_or(f64::NAN),
                    nalgebra::try_convert(point.y).unwrap_or(f64::NAN),
                    nalgebra::try_convert(point.z).unwrap_or(f64::NAN),
                ],
                iterations,
            }
        }
    }
}
