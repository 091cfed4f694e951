//! Locating the cells that contain a set of dof coordinates.

use crate::adjacency::CellDofAdjacency;
use crate::collision::{collides, CollisionTolerance};
use crate::space::FunctionSpace;
use crate::{CellIndex, GlobalDofIndex, Real};
use log::debug;
use nalgebra::Point3;
use rayon::prelude::*;
use rstar::primitives::{GeomWithData, Rectangle};
use rstar::RTree;

/// Relative inflation applied to cell bounding boxes so that points on a cell
/// boundary are never excluded by floating point error in the coarse test.
const AABB_INFLATION: f64 = 0.01;

/// An R*-tree over the axis-aligned bounding boxes of all cells in a space.
///
/// The boxes are inflated slightly, so a candidate query over-approximates: every
/// cell that may contain a point is returned, and candidates are subsequently
/// confirmed with the exact collision test.
pub struct CellBoundingBoxTree {
    tree: RTree<GeomWithData<Rectangle<[f64; 3]>, CellIndex>>,
}

impl CellBoundingBoxTree {
    pub fn from_space<T: Real, S: FunctionSpace<T>>(space: &S) -> Self {
        let boxes = (0..space.num_cells())
            .map(|cell| {
                let cell = cell as CellIndex;
                let mut box_min = [f64::INFINITY; 3];
                let mut box_max = [f64::NEG_INFINITY; 3];
                for vertex in space.cell_vertices(cell) {
                    for i in 0..3 {
                        let x_i = nalgebra::try_convert(vertex[i]).unwrap_or(f64::NAN);
                        box_min[i] = box_min[i].min(x_i);
                        box_max[i] = box_max[i].max(x_i);
                    }
                }
                let max_extent = (0..3)
                    .map(|i| box_max[i] - box_min[i])
                    .fold(0.0, f64::max);
                let margin = AABB_INFLATION * max_extent + f64::EPSILON;
                for i in 0..3 {
                    box_min[i] -= margin;
                    box_max[i] += margin;
                }
                GeomWithData::new(Rectangle::from_corners(box_min, box_max), cell)
            })
            .collect();
        Self {
            tree: RTree::bulk_load(boxes),
        }
    }

    /// The cells whose inflated bounding box contains `point`, in ascending
    /// cell index order.
    pub fn candidate_cells<T: Real>(&self, point: &Point3<T>) -> Vec<CellIndex> {
        let point_f64 = [
            nalgebra::try_convert(point.x).unwrap_or(f64::NAN),
            nalgebra::try_convert(point.y).unwrap_or(f64::NAN),
            nalgebra::try_convert(point.z).unwrap_or(f64::NAN),
        ];
        let mut candidates: Vec<_> = self
            .tree
            .locate_all_at_point(&point_f64)
            .map(|geometry| geometry.data)
            .collect();
        candidates.sort_unstable();
        candidates
    }
}

/// Locates the cells of the local mesh partition containing each of the given dofs.
///
/// Returns the subset of `dofs` that were found in the local partition, in input
/// order, together with the cell → dof adjacency of all confirmed matches. A dof
/// whose coordinate lies on an entity shared between several cells is recorded
/// under every matching cell.
///
/// A dof without a locally known coordinate, or whose coordinate lies outside
/// every local cell, is omitted from the returned subset; in a distributed setting
/// this is an expected outcome, not an error. Degenerate cells never match.
pub fn locate_cells_with_dofs<T, S>(
    space: &S,
    dofs: &[GlobalDofIndex],
    tol: &CollisionTolerance<T>,
) -> (Vec<GlobalDofIndex>, CellDofAdjacency)
where
    T: Real + Send + Sync,
    S: FunctionSpace<T> + Sync,
{
    let tree = CellBoundingBoxTree::from_space(space);

    // Candidate narrowing and exact confirmation are independent per dof and read
    // only shared geometry; the matches are merged serially afterwards so that the
    // output reflects the input dof order.
    let matches: Vec<Vec<CellIndex>> = dofs
        .par_iter()
        .map(|&dof| {
            let point = match space.dof_coordinate(dof) {
                Some(point) => point,
                None => return Vec::new(),
            };
            tree.candidate_cells(&point)
                .into_iter()
                .filter(|&cell| {
                    collides(
                        &space.cell_vertices(cell),
                        space.cell_type(cell),
                        &point,
                        tol,
                    )
                })
                .collect()
        })
        .collect();

    let mut found_dofs = Vec::new();
    let mut adjacency = CellDofAdjacency::new();
    for (&dof, cells) in dofs.iter().zip(&matches) {
        if cells.is_empty() {
            continue;
        }
        found_dofs.push(dof);
        for &cell in cells {
            adjacency.push(cell, dof);
        }
    }

    debug!(
        "located {} of {} dofs in {} cells",
        found_dofs.len(),
        dofs.len(),
        adjacency.num_cells()
    );

    (found_dofs, adjacency)
}
