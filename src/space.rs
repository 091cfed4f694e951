//! The function space interface consumed by the kernels, and a concrete nodal
//! Lagrange space.

use crate::element::{populate_reference_basis_values, CellGeometry, CellType};
use crate::{CellIndex, GlobalDofIndex, Real};
use nalgebra::Point3;

/// How reference basis values are pushed forward to physical space.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pushforward {
    /// Values are unchanged by the geometric map (scalar nodal elements).
    Identity,
    /// The contravariant Piola transform, preserving normal continuity
    /// (H(div)-conforming vector elements).
    ContravariantPiola,
    /// The covariant Piola transform, preserving tangential continuity
    /// (H(curl)-conforming vector elements).
    CovariantPiola,
}

/// A finite element function space over the local mesh partition.
///
/// The space owns (or borrows from) the mesh and dofmap data; the kernels in this
/// crate only read through this trait for the duration of a call and never retain
/// references to the underlying data.
pub trait FunctionSpace<T: Real> {
    /// The number of cells in the local partition.
    fn num_cells(&self) -> usize;

    /// The reference cell shape of the given cell.
    fn cell_type(&self, cell: CellIndex) -> CellType;

    /// The ordered vertex coordinates of the given cell.
    fn cell_vertices(&self, cell: CellIndex) -> Vec<Point3<T>>;

    /// The cell-local-to-global dofmap of the given cell.
    fn cell_dofs(&self, cell: CellIndex) -> &[GlobalDofIndex];

    /// The physical coordinate associated with a global dof, or `None` if the dof
    /// is not known to the local partition.
    fn dof_coordinate(&self, dof: GlobalDofIndex) -> Option<Point3<T>>;

    /// The number of components of a reference basis value.
    fn reference_value_size(&self) -> usize;

    /// The number of components of a physical basis value.
    fn value_size(&self) -> usize;

    /// The pushforward prescribed by the space's reference element.
    fn pushforward(&self) -> Pushforward;

    /// Evaluates the reference basis functions of the given cell at the reference
    /// coordinates `xi`, writing a row-major
    /// `num_cell_dofs x reference_value_size` block into `values`.
    fn populate_reference_basis(&self, values: &mut [T], cell: CellIndex, xi: &Point3<T>);

    /// The geometry of the given cell.
    fn cell_geometry(&self, cell: CellIndex) -> CellGeometry<T> {
        CellGeometry::from_vertices(self.cell_type(cell), &self.cell_vertices(cell))
    }
}

/// A scalar continuous Lagrange space of lowest order (P1/Q1) whose dofs coincide
/// with the mesh vertices.
///
/// This is the canonical [`FunctionSpace`] implementation shipped with the crate;
/// richer spaces (higher order, vector-valued) live with the external function
/// space library and implement the trait themselves.
#[derive(Debug, Clone)]
pub struct LagrangeSpace<T: Real> {
    vertices: Vec<Point3<T>>,
    cell_types: Vec<CellType>,
    // Cell connectivity in CSR-like storage: dofs of cell c are
    // dofmap_indices[dofmap_offsets[c]..dofmap_offsets[c + 1]].
    dofmap_offsets: Vec<usize>,
    dofmap_indices: Vec<GlobalDofIndex>,
}

impl<T: Real> LagrangeSpace<T> {
    /// Creates a space from mesh vertices and cells given as (cell type, vertex indices).
    ///
    /// # Panics
    ///
    /// Panics if a cell's vertex count does not match its cell type, or if a vertex
    /// index is out of bounds.
    pub fn from_mesh(vertices: Vec<Point3<T>>, cells: &[(CellType, Vec<usize>)]) -> Self {
        let mut dofmap_offsets = Vec::with_capacity(cells.len() + 1);
        let mut dofmap_indices = Vec::new();
        dofmap_offsets.push(0);
        for (cell_type, cell_vertices) in cells {
            assert_eq!(
                cell_vertices.len(),
                cell_type.num_vertices(),
                "Number of vertices must match cell type"
            );
            for &v in cell_vertices {
                assert!(v < vertices.len(), "Vertex index out of bounds");
                dofmap_indices.push(v as GlobalDofIndex);
            }
            dofmap_offsets.push(dofmap_indices.len());
        }
        Self {
            vertices,
            cell_types: cells.iter().map(|(cell_type, _)| *cell_type).collect(),
            dofmap_offsets,
            dofmap_indices,
        }
    }

    pub fn num_dofs(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[Point3<T>] {
        &self.vertices
    }
}

impl<T: Real> FunctionSpace<T> for LagrangeSpace<T> {
    fn num_cells(&self) -> usize {
        self.cell_types.len()
    }

    fn cell_type(&self, cell: CellIndex) -> CellType {
        self.cell_types[cell as usize]
    }

    fn cell_vertices(&self, cell: CellIndex) -> Vec<Point3<T>> {
        self.cell_dofs(cell)
            .iter()
            .map(|&dof| self.vertices[dof as usize])
            .collect()
    }

    fn cell_dofs(&self, cell: CellIndex) -> &[GlobalDofIndex] {
        let cell = cell as usize;
        &self.dofmap_indices[self.dofmap_offsets[cell]..self.dofmap_offsets[cell + 1]]
    }

    fn dof_coordinate(&self, dof: GlobalDofIndex) -> Option<Point3<T>> {
        self.vertices.get(dof as usize).copied()
    }

    fn reference_value_size(&self) -> usize {
        1
    }

    fn value_size(&self) -> usize {
        1
    }

    fn pushforward(&self) -> Pushforward {
        Pushforward::Identity
    }

    fn populate_reference_basis(&self, values: &mut [T], cell: CellIndex, xi: &Point3<T>) {
        populate_reference_basis_values(self.cell_type(cell), xi, values);
    }
}
