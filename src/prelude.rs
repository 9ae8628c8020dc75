//! Makes available common structures needed to run a simulation
//!
//! You may write `use fmsim::prelude::*` in your code and obtain
//! access to commonly used functionality.

pub use crate::base::{Attributes, Config, Dof, Elem, Essential, InputRecord, Load, Natural, SampleMeshes, TimeStep};
pub use crate::base::{ParamDamage, ParamFluid, ParamNonlocal, ParamSolid, ParamViscosity};
pub use crate::fem::{ExportModule, JsonExport, MeshTopology, NonlocalStatic, StokesFlow, TopologyState};
pub use crate::fem::{DEFAULT_OUT_DIR, DEFAULT_TEST_DIR};
