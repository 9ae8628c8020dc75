//! Finite element engine for stabilized incompressible flow and nonlocal damage
//!
//! The [fem::StokesFlow] driver solves steady or transient (Navier-)Stokes problems
//! with SUPG/PSPG/LSIC stabilized triangles and a Newtonian or power-law viscosity.
//! The [fem::NonlocalStatic] analysis solves quasi-static problems with an integral-type
//! nonlocal isotropic damage model, including the nonlocal coupling of the tangent.

/// Defines a type alias for the error type as a static string
pub type StrError = &'static str;

/// Defines a function of time
pub type FnTime = fn(f64) -> f64;

pub mod base;
pub mod fem;
pub mod material;
pub mod prelude;
