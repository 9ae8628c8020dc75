//! Implements the finite element method

mod control_convergence;
mod element_bubble_tri3;
mod element_supg_tri3;
mod export;
mod fluid_element_trait;
mod fluid_elements;
mod linear_system;
mod mesh_topology;
mod nonlocal_domain;
mod nonlocal_static;
mod nr_solver;
mod prescribed_values;
mod primary_field;
mod shape_tri3;
mod stabilization;
mod stokes_flow;
pub use crate::fem::control_convergence::*;
pub use crate::fem::element_bubble_tri3::*;
pub use crate::fem::element_supg_tri3::*;
pub use crate::fem::export::*;
pub use crate::fem::fluid_element_trait::*;
pub use crate::fem::fluid_elements::*;
pub use crate::fem::linear_system::*;
pub use crate::fem::mesh_topology::*;
pub use crate::fem::nonlocal_domain::*;
pub use crate::fem::nonlocal_static::*;
pub use crate::fem::nr_solver::*;
pub use crate::fem::prescribed_values::*;
pub use crate::fem::primary_field::*;
pub use crate::fem::shape_tri3::*;
pub use crate::fem::stabilization::*;
pub use crate::fem::stokes_flow::*;
