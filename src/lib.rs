//! Geometric search and sparsity-construction kernels for multi-point constraints (MPCs)
//! in finite element assembly.
//!
//! The crate provides four computational kernels that a surrounding MPC assembly pipeline
//! consumes:
//!
//! - [`collision`]: exact, boundary-inclusive point-in-cell tests for the supported
//!   reference cell shapes.
//! - [`basis`]: evaluation of a function space's basis functions at arbitrary physical
//!   points inside a given cell, including Piola pushforwards for vector-valued elements.
//! - [`locate`]: construction of a cell → dof adjacency from global dof coordinates,
//!   accelerated by an R*-tree over cell bounding boxes.
//! - [`sparsity`]: extension of a symbolic sparsity pattern with the standard per-cell
//!   dof coupling induced by a bilinear form.
//!
//! The crate does not own mesh or function space data and does not solve linear systems.
//! External collaborators provide geometry and dofmaps through the
//! [`FunctionSpace`](crate::space::FunctionSpace) and
//! [`BilinearForm`](crate::sparsity::BilinearForm) traits.

use nalgebra::RealField;

pub mod adjacency;
pub mod basis;
pub mod collision;
pub mod element;
pub mod error;
pub mod locate;
pub mod space;
pub mod sparsity;

pub extern crate nalgebra;

/// A real scalar type usable in the geometric kernels.
pub trait Real: RealField + Copy {}

impl<T: RealField + Copy> Real for T {}

/// Global index of a degree of freedom.
///
/// Global dof indices are 64-bit since they index into the distributed global system,
/// of which the local partition only sees a part.
pub type GlobalDofIndex = u64;

/// Local index of a cell in the owning partition's mesh.
pub type CellIndex = u32;
