use super::{ParamFluid, ParamSolid};
use serde::{Deserialize, Serialize};

/// Defines degrees-of-freedom (DOF) types
///
/// Note: The fixed numbering scheme assists in sorting the DOFs.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum Dof {
    /// Velocity along the first dimension
    Vx = 0,

    /// Velocity along the second dimension
    Vy = 1,

    /// Pressure
    Pl = 2,

    /// Bubble (element-internal) velocity along the first dimension
    Bx = 3,

    /// Bubble (element-internal) velocity along the second dimension
    By = 4,

    /// Displacement along the first dimension
    Ux = 5,

    /// Displacement along the second dimension
    Uy = 6,
}

/// Defines the element type (and parameters) associated with a cell attribute
#[derive(Clone, Copy, Debug)]
pub enum Elem {
    /// Equal-order linear triangle with SUPG/PSPG/LSIC stabilization
    SupgTri3(ParamFluid),

    /// Linear triangle enriched with a cubic velocity bubble (MINI element)
    BubbleTri3(ParamFluid),

    /// Two-node bar with (possibly nonlocal) isotropic damage
    Bar(ParamSolid),

    /// Constant-strain triangle in plane-stress with (possibly nonlocal) isotropic damage
    PlaneStress(ParamSolid),
}

impl Elem {
    /// Returns the name of the element
    pub fn name(&self) -> &'static str {
        match self {
            Elem::SupgTri3(..) => "SupgTri3",
            Elem::BubbleTri3(..) => "BubbleTri3",
            Elem::Bar(..) => "Bar",
            Elem::PlaneStress(..) => "PlaneStress",
        }
    }

    /// Returns whether the element solves the flow (velocity/pressure) equations
    pub fn is_fluid(&self) -> bool {
        match self {
            Elem::SupgTri3(..) | Elem::BubbleTri3(..) => true,
            Elem::Bar(..) | Elem::PlaneStress(..) => false,
        }
    }

    /// Returns the DOFs at each node of the element
    pub fn nodal_dofs(&self) -> &'static [Dof] {
        match self {
            Elem::SupgTri3(..) | Elem::BubbleTri3(..) => &[Dof::Vx, Dof::Vy, Dof::Pl],
            Elem::Bar(..) => &[Dof::Ux],
            Elem::PlaneStress(..) => &[Dof::Ux, Dof::Uy],
        }
    }

    /// Returns the element-internal DOFs (not shared with other elements)
    pub fn internal_dofs(&self) -> &'static [Dof] {
        match self {
            Elem::BubbleTri3(..) => &[Dof::Bx, Dof::By],
            _ => &[],
        }
    }
}

/// Defines the global components updated by the nonlinear solver
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Component {
    /// Internal forces (residual) vector
    InternalRhs,

    /// Tangent (Jacobian) matrix
    NonLinearLhs,

    /// Mass matrix (not used by steady solvers)
    Mass,
}

/// Defines the characteristic vectors requested from elements
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CharVector {
    /// Internal forces (the residual of the balance equations)
    InternalForces,

    /// External forces from boundary and body loads
    ExternalForces,

    /// Lumped mass vector
    LumpedMass,
}

/// Defines the characteristic matrices requested from elements
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CharMatrix {
    /// Consistent tangent of the internal forces
    TangentStiffness,

    /// Secant stiffness
    SecantStiffness,

    /// Consistent mass matrix
    Mass,
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
