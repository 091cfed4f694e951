//! Symbolic sparsity pattern construction for constrained assembly.
//!
//! A [`SparsityPattern`] accumulates the nonzero structure of a global matrix row by
//! row, then freezes into compressed (CSR-like) storage once finalized. The
//! [`extend_standard_pattern`] kernel inserts the standard per-cell dof coupling of a
//! bilinear form, which an MPC pipeline later augments with constraint couplings.

use crate::error::ContractViolation;
use crate::{CellIndex, GlobalDofIndex};
use rustc_hash::FxHashSet;

/// The nonzero structure of a sparse matrix under construction.
///
/// The pattern is row-major: insertions address (row, column) pairs, and duplicate
/// insertions are absorbed. [`finalize`](Self::finalize) converts the accumulated
/// structure into sorted compressed storage, after which further insertions are
/// rejected as a contract violation.
#[derive(Debug, Clone)]
pub struct SparsityPattern {
    major_dim: usize,
    minor_dim: usize,
    rows: Vec<FxHashSet<GlobalDofIndex>>,
    finalized: Option<CompressedRows>,
}

#[derive(Debug, Clone)]
struct CompressedRows {
    offsets: Vec<usize>,
    indices: Vec<GlobalDofIndex>,
}

impl SparsityPattern {
    /// Creates an empty pattern for a `major_dim x minor_dim` matrix.
    pub fn new(major_dim: usize, minor_dim: usize) -> Self {
        Self {
            major_dim,
            minor_dim,
            rows: vec![FxHashSet::default(); major_dim],
            finalized: None,
        }
    }

    pub fn major_dim(&self) -> usize {
        self.major_dim
    }

    pub fn minor_dim(&self) -> usize {
        self.minor_dim
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized.is_some()
    }

    /// Records the entry `(row, col)` as nonzero.
    ///
    /// Inserting an entry that is already present has no effect.
    ///
    /// # Errors
    ///
    /// Returns an error if the pattern has been finalized.
    ///
    /// # Panics
    ///
    /// Panics if `row` or `col` is out of bounds.
    pub fn insert(&mut self, row: GlobalDofIndex, col: GlobalDofIndex) -> Result<(), ContractViolation> {
        if self.is_finalized() {
            return Err(ContractViolation::InsertAfterFinalize { row, col });
        }
        assert!((row as usize) < self.major_dim, "Row index out of bounds");
        assert!((col as usize) < self.minor_dim, "Column index out of bounds");
        self.rows[row as usize].insert(col);
        Ok(())
    }

    /// The exact number of recorded nonzero entries.
    pub fn nnz(&self) -> usize {
        match &self.finalized {
            Some(compressed) => compressed.indices.len(),
            None => self.rows.iter().map(|row| row.len()).sum(),
        }
    }

    /// Freezes the pattern into compressed storage with sorted column indices per row.
    ///
    /// Finalizing an already finalized pattern has no effect.
    pub fn finalize(&mut self) {
        if self.is_finalized() {
            return;
        }
        let mut offsets = Vec::with_capacity(self.major_dim + 1);
        let mut indices = Vec::with_capacity(self.nnz());
        offsets.push(0);
        for row in &mut self.rows {
            let mut cols: Vec<_> = row.drain().collect();
            cols.sort_unstable();
            indices.extend_from_slice(&cols);
            offsets.push(indices.len());
        }
        self.rows = Vec::new();
        self.finalized = Some(CompressedRows { offsets, indices });
    }

    /// The compressed row offsets. Only available after [`finalize`](Self::finalize).
    pub fn offsets(&self) -> Option<&[usize]> {
        self.finalized.as_ref().map(|c| c.offsets.as_slice())
    }

    /// All column indices in compressed storage, grouped by row and sorted within
    /// each row. Only available after [`finalize`](Self::finalize).
    pub fn indices(&self) -> Option<&[GlobalDofIndex]> {
        self.finalized.as_ref().map(|c| c.indices.as_slice())
    }

    /// The sorted column indices of the given row. Only available after
    /// [`finalize`](Self::finalize).
    ///
    /// # Panics
    ///
    /// Panics if `row` is out of bounds.
    pub fn row(&self, row: GlobalDofIndex) -> Option<&[GlobalDofIndex]> {
        self.finalized
            .as_ref()
            .map(|c| &c.indices[c.offsets[row as usize]..c.offsets[row as usize + 1]])
    }
}

/// The per-cell dof coupling structure of a bilinear form.
///
/// The form reports the cells it integrates over and, for each such cell, the global
/// test and trial dofs whose basis functions are supported on it.
pub trait BilinearForm {
    /// The cells the form integrates over, typically all locally owned cells.
    fn integration_cells(&self) -> &[CellIndex];

    /// The global test-space dofs active on the given cell.
    fn test_dofs(&self, cell: CellIndex) -> &[GlobalDofIndex];

    /// The global trial-space dofs active on the given cell.
    fn trial_dofs(&self, cell: CellIndex) -> &[GlobalDofIndex];
}

/// Extends `pattern` with the standard coupling of `form`: for every integration
/// cell, every (test dof, trial dof) pair of that cell becomes a nonzero.
///
/// The extension is idempotent, since patterns absorb duplicate insertions.
///
/// # Errors
///
/// Returns an error if the pattern has been finalized.
pub fn extend_standard_pattern(
    pattern: &mut SparsityPattern,
    form: &impl BilinearForm,
) -> Result<(), ContractViolation> {
    for &cell in form.integration_cells() {
        let test_dofs = form.test_dofs(cell);
        let trial_dofs = form.trial_dofs(cell);
        for &row in test_dofs {
            for &col in trial_dofs {
                pattern.insert(row, col)?;
            }
        }
    }
    Ok(())
}
