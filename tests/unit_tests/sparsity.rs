use mpc_kernels::error::ContractViolation;
use mpc_kernels::sparsity::{extend_standard_pattern, BilinearForm, SparsityPattern};
use mpc_kernels::{CellIndex, GlobalDofIndex};

/// A bilinear form whose test and trial dofmaps are given explicitly per cell.
struct ExplicitForm {
    cells: Vec<CellIndex>,
    test_dofs: Vec<Vec<GlobalDofIndex>>,
    trial_dofs: Vec<Vec<GlobalDofIndex>>,
}

impl BilinearForm for ExplicitForm {
    fn integration_cells(&self) -> &[CellIndex] {
        &self.cells
    }

    fn test_dofs(&self, cell: CellIndex) -> &[GlobalDofIndex] {
        &self.test_dofs[cell as usize]
    }

    fn trial_dofs(&self, cell: CellIndex) -> &[GlobalDofIndex] {
        &self.trial_dofs[cell as usize]
    }
}

/// Two triangles sharing the edge (1, 2), test space == trial space.
fn two_triangle_form() -> ExplicitForm {
    ExplicitForm {
        cells: vec![0, 1],
        test_dofs: vec![vec![0, 1, 2], vec![1, 3, 2]],
        trial_dofs: vec![vec![0, 1, 2], vec![1, 3, 2]],
    }
}

#[test]
fn insert_and_nnz_absorb_duplicates() {
    let mut pattern = SparsityPattern::new(4, 4);
    pattern.insert(0, 1).unwrap();
    pattern.insert(0, 1).unwrap();
    pattern.insert(1, 0).unwrap();
    assert_eq!(pattern.nnz(), 2);
}

#[test]
fn standard_pattern_is_union_of_cell_cross_products() {
    let mut pattern = SparsityPattern::new(4, 4);
    extend_standard_pattern(&mut pattern, &two_triangle_form()).unwrap();

    // Cell couplings: {0,1,2} x {0,1,2} and {1,2,3} x {1,2,3}; the union has
    // 9 + 9 - 4 shared entries.
    assert_eq!(pattern.nnz(), 14);

    pattern.finalize();
    assert_eq!(pattern.row(0), Some(&[0, 1, 2][..]));
    assert_eq!(pattern.row(1), Some(&[0, 1, 2, 3][..]));
    assert_eq!(pattern.row(2), Some(&[0, 1, 2, 3][..]));
    assert_eq!(pattern.row(3), Some(&[1, 2, 3][..]));
}

#[test]
fn extension_is_idempotent() {
    let form = two_triangle_form();
    let mut pattern = SparsityPattern::new(4, 4);
    extend_standard_pattern(&mut pattern, &form).unwrap();
    let nnz_first = pattern.nnz();
    extend_standard_pattern(&mut pattern, &form).unwrap();
    assert_eq!(pattern.nnz(), nnz_first);
}

#[test]
fn rectangular_pattern_separates_test_and_trial_dofs() {
    let form = ExplicitForm {
        cells: vec![0],
        test_dofs: vec![vec![0, 1]],
        trial_dofs: vec![vec![2, 0, 1]],
    };
    let mut pattern = SparsityPattern::new(2, 3);
    extend_standard_pattern(&mut pattern, &form).unwrap();
    assert_eq!(pattern.nnz(), 6);

    pattern.finalize();
    assert_eq!(pattern.row(0), Some(&[0, 1, 2][..]));
    assert_eq!(pattern.row(1), Some(&[0, 1, 2][..]));
}

#[test]
fn insert_after_finalize_is_a_contract_violation() {
    let mut pattern = SparsityPattern::new(4, 4);
    pattern.insert(2, 3).unwrap();
    pattern.finalize();

    assert_eq!(
        pattern.insert(0, 1),
        Err(ContractViolation::InsertAfterFinalize { row: 0, col: 1 })
    );
    // The pattern is unchanged by the rejected insertion
    assert_eq!(pattern.nnz(), 1);
}

#[test]
fn extend_after_finalize_is_a_contract_violation() {
    let mut pattern = SparsityPattern::new(4, 4);
    pattern.finalize();
    let result = extend_standard_pattern(&mut pattern, &two_triangle_form());
    assert_eq!(
        result,
        Err(ContractViolation::InsertAfterFinalize { row: 0, col: 0 })
    );
}

#[test]
fn finalize_produces_sorted_compressed_storage() {
    let mut pattern = SparsityPattern::new(3, 10);
    pattern.insert(0, 7).unwrap();
    pattern.insert(0, 2).unwrap();
    pattern.insert(0, 5).unwrap();
    pattern.insert(2, 9).unwrap();
    assert!(!pattern.is_finalized());
    assert_eq!(pattern.offsets(), None);

    pattern.finalize();
    assert!(pattern.is_finalized());
    assert_eq!(pattern.offsets(), Some(&[0, 3, 3, 4][..]));
    assert_eq!(pattern.indices(), Some(&[2, 5, 7, 9][..]));
    assert_eq!(pattern.row(1), Some(&[][..]));
    assert_eq!(pattern.nnz(), 4);

    // Finalizing again is a no-op
    pattern.finalize();
    assert_eq!(pattern.nnz(), 4);
}

#[test]
fn empty_pattern_finalizes_to_empty_storage() {
    let mut pattern = SparsityPattern::new(0, 0);
    pattern.finalize();
    assert_eq!(pattern.nnz(), 0);
    assert_eq!(pattern.offsets(), Some(&[0][..]));
    assert_eq!(pattern.indices(), Some(&[][..]));
}
