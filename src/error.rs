//! Error types for the geometric and sparsity kernels.

use crate::{CellIndex, GlobalDofIndex};
use std::error::Error;
use std::fmt;
use std::fmt::Display;

/// Error produced when inverting the reference-to-physical map of a single element.
///
/// This is a low-level error without cell context; [`GeometryError`] wraps it with the
/// cell index and query point once the failing cell is known.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InverseMapError {
    /// The Newton iteration failed to converge within the configured iteration cap.
    MaximumIterationsReached(usize),
    /// The (normal equations of the) map Jacobian are singular, typically because the
    /// cell is degenerate (collinear or zero-volume).
    SingularJacobian,
}

impl Display for InverseMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InverseMapError::MaximumIterationsReached(max_iter) => {
                write!(
                    f,
                    "inverse map failed to converge within maximum number of iterations ({})",
                    max_iter
                )
            }
            InverseMapError::SingularJacobian => {
                write!(f, "map Jacobian is singular; cell is degenerate")
            }
        }
    }
}

impl Error for InverseMapError {}

/// A geometric operation failed for a particular cell.
#[derive(Debug, Clone, PartialEq)]
pub enum GeometryError {
    /// Newton-based inversion of the cell's geometric map did not converge
    /// within the iteration cap.
    NewtonDidNotConverge {
        cell_index: CellIndex,
        point: [f64; 3],
        iterations: usize,
    },
    /// The cell has zero or near-zero measure relative to its size.
    DegenerateCell { cell_index: CellIndex },
    /// The cell's vertex data contains non-finite coordinates.
    NonFiniteGeometry { cell_index: CellIndex },
}

impl Display for GeometryError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeometryError::NewtonDidNotConverge {
                cell_index,
                point,
                iterations,
            } => write!(
                f,
                "inverse map for cell {} did not converge after {} iterations \
                 (point [{}, {}, {}])",
                cell_index, iterations, point[0], point[1], point[2]
            ),
            GeometryError::DegenerateCell { cell_index } => {
                write!(f, "cell {} is degenerate (zero or near-zero measure)", cell_index)
            }
            GeometryError::NonFiniteGeometry { cell_index } => {
                write!(f, "cell {} has non-finite vertex coordinates", cell_index)
            }
        }
    }
}

impl Error for GeometryError {}

/// A caller violated an API contract.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractViolation {
    /// An insertion into a sparsity pattern was attempted after the pattern
    /// was finalized by its owner.
    InsertAfterFinalize {
        row: GlobalDofIndex,
        col: GlobalDofIndex,
    },
}

impl Display for ContractViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContractViolation::InsertAfterFinalize { row, col } => write!(
                f,
                "attempted to insert ({}, {}) into a finalized sparsity pattern",
                row, col
            ),
        }
    }
}

impl Error for ContractViolation {}
