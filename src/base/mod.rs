//! Implements the base structures for a finite element simulation

mod assembly;
mod attributes;
mod config;
mod enums;
mod equations;
mod essential;
mod input_record;
mod natural;
mod parameters;
mod quadrature;
mod sample_meshes;
mod time_step;
pub use crate::base::assembly::*;
pub use crate::base::attributes::*;
pub use crate::base::config::*;
pub use crate::base::enums::*;
pub use crate::base::equations::*;
pub use crate::base::essential::*;
pub use crate::base::input_record::*;
pub use crate::base::natural::*;
pub use crate::base::parameters::*;
pub use crate::base::quadrature::*;
pub use crate::base::sample_meshes::*;
pub use crate::base::time_step::*;
