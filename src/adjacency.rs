//! Cell → dof adjacency produced by the dof locator.

use crate::{CellIndex, GlobalDofIndex};
use rustc_hash::FxHashMap;

/// An ordered mapping from cell indices to the global dofs confirmed to lie inside
/// (or on the boundary of) each cell.
///
/// Cells appear in the order they are first matched, and the dof list of each cell
/// preserves discovery order; neither is resorted. A dof lying exactly on a shared
/// face, edge or vertex legitimately appears under every matching cell.
#[derive(Debug, Clone, Default)]
pub struct CellDofAdjacency {
    cells: Vec<CellIndex>,
    dofs: Vec<Vec<GlobalDofIndex>>,
    cell_positions: FxHashMap<CellIndex, usize>,
}

impl CellDofAdjacency {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `dof` to the dof list of `cell`, creating the cell entry if needed.
    pub fn push(&mut self, cell: CellIndex, dof: GlobalDofIndex) {
        let Self {
            cells,
            dofs,
            cell_positions,
        } = self;
        let position = *cell_positions.entry(cell).or_insert_with(|| {
            cells.push(cell);
            dofs.push(Vec::new());
            cells.len() - 1
        });
        dofs[position].push(dof);
    }

    /// The cells with at least one matched dof, in discovery order.
    pub fn cells(&self) -> &[CellIndex] {
        &self.cells
    }

    pub fn num_cells(&self) -> usize {
        self.cells.len()
    }

    /// The total number of (cell, dof) entries.
    pub fn num_entries(&self) -> usize {
        self.dofs.iter().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// The dofs matched to `cell` in discovery order, or `None` if no dof was
    /// matched to it.
    pub fn dofs_in_cell(&self, cell: CellIndex) -> Option<&[GlobalDofIndex]> {
        self.cell_positions
            .get(&cell)
            .map(|&position| self.dofs[position].as_slice())
    }

    /// Iterates over `(cell, dofs)` pairs in cell discovery order.
    pub fn iter(&self) -> impl Iterator<Item = (CellIndex, &[GlobalDofIndex])> {
        self.cells
            .iter()
            .zip(&self.dofs)
            .map(|(&cell, dofs)| (cell, dofs.as_slice()))
    }
}
