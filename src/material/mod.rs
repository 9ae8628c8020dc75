//! Implements material models and their integration-point states

mod damage_status;
mod fluid_model;
mod fluid_status;
mod isotropic_damage;
mod linear_elastic;
mod newtonian_fluid;
mod nonlinear_fluid;
mod nonlocal_damage;
mod two_phase;
pub use crate::material::damage_status::*;
pub use crate::material::fluid_model::*;
pub use crate::material::fluid_status::*;
pub use crate::material::isotropic_damage::*;
pub use crate::material::linear_elastic::*;
pub use crate::material::newtonian_fluid::*;
pub use crate::material::nonlinear_fluid::*;
pub use crate::material::nonlocal_damage::*;
pub use crate::material::two_phase::*;
