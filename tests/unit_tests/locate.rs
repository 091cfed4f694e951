use mpc_kernels::collision::CollisionTolerance;
use mpc_kernels::element::CellType;
use mpc_kernels::locate::{locate_cells_with_dofs, CellBoundingBoxTree};
use mpc_kernels::space::LagrangeSpace;
use nalgebra::Point3;

use super::{two_quad_mesh, two_triangle_mesh};

#[test]
fn bounding_box_tree_returns_candidates_containing_point() {
    let space = two_quad_mesh();
    let tree = CellBoundingBoxTree::from_space(&space);

    assert_eq!(tree.candidate_cells(&Point3::new(0.5, 0.5, 0.0)), vec![0]);
    assert_eq!(tree.candidate_cells(&Point3::new(1.5, 0.5, 0.0)), vec![1]);
    // The shared edge x = 1 lies in both (inflated) boxes
    assert_eq!(tree.candidate_cells(&Point3::new(1.0, 0.5, 0.0)), vec![0, 1]);
    assert!(tree.candidate_cells(&Point3::new(10.0, 10.0, 10.0)).is_empty());
}

#[test]
fn locates_cells_containing_dof_coordinates() {
    let space = two_quad_mesh();
    let tol = CollisionTolerance::default();

    // Dof 0 is a corner of cell 0 only; dof 5 a corner of cell 1 only.
    let (found, adjacency) = locate_cells_with_dofs(&space, &[0, 5], &tol);
    assert_eq!(found, vec![0, 5]);
    assert_eq!(adjacency.num_cells(), 2);
    assert_eq!(adjacency.dofs_in_cell(0), Some(&[0][..]));
    assert_eq!(adjacency.dofs_in_cell(1), Some(&[5][..]));
}

#[test]
fn dof_at_cell_centroid_is_located_in_that_cell() {
    // Vertex 3 participates in no cell; its coordinate is the centroid of cell 0.
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(1.0 / 3.0, 1.0 / 3.0, 0.0),
    ];
    let cells = vec![(CellType::Triangle, vec![0, 1, 2])];
    let space = LagrangeSpace::from_mesh(vertices, &cells);
    let tol = CollisionTolerance::default();

    let (found, adjacency) = locate_cells_with_dofs(&space, &[3], &tol);
    assert_eq!(found, vec![3]);
    assert_eq!(adjacency.dofs_in_cell(0), Some(&[3][..]));
}

#[test]
fn dof_on_shared_edge_is_recorded_under_both_cells() {
    let space = two_quad_mesh();
    let tol = CollisionTolerance::default();

    // Dofs 1 and 4 lie on the edge shared by both cells
    let (found, adjacency) = locate_cells_with_dofs(&space, &[1, 4], &tol);
    assert_eq!(found, vec![1, 4]);
    assert_eq!(adjacency.num_cells(), 2);
    assert_eq!(adjacency.dofs_in_cell(0), Some(&[1, 4][..]));
    assert_eq!(adjacency.dofs_in_cell(1), Some(&[1, 4][..]));
    assert_eq!(adjacency.num_entries(), 4);
}

#[test]
fn unknown_dofs_are_omitted_without_error() {
    let space = two_triangle_mesh();
    let tol = CollisionTolerance::default();

    // Dof 17 has no coordinate in this partition
    let (found, adjacency) = locate_cells_with_dofs(&space, &[0, 17, 3], &tol);
    assert_eq!(found, vec![0, 3]);
    assert_eq!(adjacency.num_cells(), 2);
}

#[test]
fn found_dofs_preserve_input_order() {
    let space = two_quad_mesh();
    let tol = CollisionTolerance::default();

    let (found, _) = locate_cells_with_dofs(&space, &[5, 2, 0], &tol);
    assert_eq!(found, vec![5, 2, 0]);
}

#[test]
fn empty_dof_list_produces_empty_adjacency() {
    let space = two_triangle_mesh();
    let tol = CollisionTolerance::default();

    let (found, adjacency) = locate_cells_with_dofs(&space, &[], &tol);
    assert!(found.is_empty());
    assert!(adjacency.is_empty());
}

#[test]
fn degenerate_cells_are_skipped() {
    // Cell 1 is a zero-area sliver collapsed onto the segment from (1, 0) to (0, 1)
    let vertices = vec![
        Point3::new(0.0, 0.0, 0.0),
        Point3::new(1.0, 0.0, 0.0),
        Point3::new(0.0, 1.0, 0.0),
        Point3::new(0.5, 0.5, 0.0),
    ];
    let cells = vec![
        (CellType::Triangle, vec![0, 1, 2]),
        (CellType::Triangle, vec![1, 3, 2]),
    ];
    let space = LagrangeSpace::from_mesh(vertices, &cells);
    let tol = CollisionTolerance::default();

    // Dof 3 sits inside cell 0's closure; the degenerate cell 1 never matches.
    let (found, adjacency) = locate_cells_with_dofs(&space, &[3], &tol);
    assert_eq!(found, vec![3]);
    assert_eq!(adjacency.cells(), &[0]);
}

#[test]
fn adjacency_iterates_in_cell_discovery_order() {
    let space = two_quad_mesh();
    let tol = CollisionTolerance::default();

    // Dof 5 discovers cell 1 before dof 0 discovers cell 0
    let (_, adjacency) = locate_cells_with_dofs(&space, &[5, 0], &tol);
    let pairs: Vec<_> = adjacency.iter().collect();
    assert_eq!(pairs.len(), 2);
    assert_eq!(pairs[0], (1, &[5][..]));
    assert_eq!(pairs[1], (0, &[0][..]));
}
