use crate::base::{scatter_block_matrix, scatter_block_vector, CharMatrix, CharVector, Elem};
use crate::StrError;
use russell_lab::{mat_vec_mul, Matrix, Vector};
use std::io::{Read, Write};

/// Splits the local DOFs of a fluid element into velocity and pressure blocks
///
/// The local numbering is node-major, followed by the element-internal DOFs:
///
/// ```text
/// SupgTri3:   vx0 vy0 p0 vx1 vy1 p1 vx2 vy2 p2
/// BubbleTri3: vx0 vy0 p0 vx1 vy1 p1 vx2 vy2 p2 bx by
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct DofLayout {
    /// Local indices of the velocity DOFs (velocity block order)
    pub velocity: Vec<usize>,

    /// Local indices of the pressure DOFs (pressure block order)
    pub pressure: Vec<usize>,

    /// Total number of local DOFs
    pub n_local: usize,
}

impl DofLayout {
    /// Allocates a new instance
    pub fn new(elem: &Elem) -> Result<Self, StrError> {
        match elem {
            Elem::SupgTri3(..) => Ok(DofLayout {
                velocity: vec![0, 1, 3, 4, 6, 7],
                pressure: vec![2, 5, 8],
                n_local: 9,
            }),
            Elem::BubbleTri3(..) => Ok(DofLayout {
                velocity: vec![0, 1, 3, 4, 6, 7, 9, 10],
                pressure: vec![2, 5, 8],
                n_local: 11,
            }),
            _ => Err("element is not a fluid element"),
        }
    }

    /// Returns the size of the velocity block
    pub fn nv(&self) -> usize {
        self.velocity.len()
    }

    /// Returns the size of the pressure block
    pub fn np(&self) -> usize {
        self.pressure.len()
    }
}

/// Holds the local data required by the element computations
pub struct FluidContext<'a> {
    /// Includes the advection (Navier-Stokes) terms
    pub advection: bool,

    /// Includes the time derivative terms
    pub transient: bool,

    /// Time step size
    pub dt: f64,

    /// Out-of-plane thickness
    pub thickness: f64,

    /// Local velocities (velocity block order)
    pub uu: &'a Vector,

    /// Local pressures (pressure block order)
    pub pp: &'a Vector,

    /// Local velocities at the previous step (velocity block order)
    pub uu_prev: &'a Vector,
}

/// Defines the interface of fluid elements
pub trait FluidElementTrait: Send {
    /// Returns the local DOF layout
    fn layout(&self) -> &DofLayout;

    /// Computes a characteristic vector (n_local)
    fn characteristic_vector(&mut self, answer: &mut Vector, kind: CharVector, ctx: &FluidContext) -> Result<(), StrError>;

    /// Computes a characteristic matrix (n_local × n_local)
    fn characteristic_matrix(&mut self, answer: &mut Matrix, kind: CharMatrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Recomputes the stabilization coefficients
    fn update_stabilization(&mut self, ctx: &FluidContext) -> Result<(), StrError>;

    /// Returns the critical time step of the element
    fn critical_time_step(&self, ctx: &FluidContext) -> f64;

    /// Recomputes the stress at all integration points and commits their status
    fn update_internal_state(&mut self, ctx: &FluidContext) -> Result<(), StrError>;

    /// Writes the integration point statuses to a stream
    fn save_context(&self, writer: &mut dyn Write) -> Result<(), StrError>;

    /// Reads the integration point statuses from a stream
    fn restore_context(&mut self, reader: &mut dyn Read) -> Result<(), StrError>;
}

/// Defines the terms of the stabilized (SUPG/PSPG/LSIC) formulation
///
/// The momentum balance (MB) terms have the size of the velocity block (nv) and the
/// continuity (MC) terms have the size of the pressure block (np). The continuity
/// equation is multiplied by -1 so that the Stokes tangent is a symmetric saddle point.
pub trait SupgTerms {
    /// Returns the local DOF layout
    fn dof_layout(&self) -> &DofLayout;

    /// Mass matrix of the momentum balance (nv × nv)
    fn acceleration_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Advection term of the momentum balance (nv)
    fn advection_mb(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError>;

    /// Derivative of the advection term of the momentum balance (nv × nv)
    fn advection_derivative_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Diffusion (viscous) term of the momentum balance (nv)
    fn diffusion_mb(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError>;

    /// Derivative of the diffusion term of the momentum balance (nv × nv, symmetric)
    fn diffusion_derivative_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Pressure term of the momentum balance (nv × np)
    fn pressure_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// LSIC stabilization term of the momentum balance (nv × nv)
    fn lsic_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Linear advection (divergence) term of the continuity (np × nv)
    fn linear_advection_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Advection term of the continuity (np)
    fn advection_mc(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError>;

    /// Derivative of the advection term of the continuity (np × nv)
    fn advection_derivative_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Diffusion term of the continuity (np)
    fn diffusion_mc(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError>;

    /// Derivative of the diffusion term of the continuity (np × nv)
    fn diffusion_derivative_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Mass matrix of the continuity (np × nv)
    fn acceleration_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Pressure (PSPG) term of the continuity (np × np)
    fn pressure_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Prescribed loads of the momentum balance (nv)
    fn bc_rhs_mb(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError>;

    /// Prescribed loads of the continuity (np)
    fn bc_rhs_mc(&mut self, answer: &mut Vector, ctx: &FluidContext) -> Result<(), StrError>;

    /// Boundary terms acting on the velocity in the momentum balance (nv × nv)
    fn bc_lhs_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Boundary terms acting on the pressure in the momentum balance (nv × np)
    fn bc_lhs_pressure_mb(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;

    /// Boundary terms acting on the velocity in the continuity (np × nv)
    fn bc_lhs_pressure_mc(&mut self, answer: &mut Matrix, ctx: &FluidContext) -> Result<(), StrError>;
}

/// Holds the scratch blocks employed to compose the characteristic arrays
struct Blocks {
    vv: Matrix,
    vp: Matrix,
    pv: Matrix,
    pp: Matrix,
    v: Vector,
    p: Vector,
    help_v: Vector,
    help_p: Vector,
}

impl Blocks {
    fn new(nv: usize, np: usize) -> Self {
        Blocks {
            vv: Matrix::new(nv, nv),
            vp: Matrix::new(nv, np),
            pv: Matrix::new(np, nv),
            pp: Matrix::new(np, np),
            v: Vector::new(nv),
            p: Vector::new(np),
            help_v: Vector::new(nv),
            help_p: Vector::new(np),
        }
    }
}

/// Computes a characteristic vector by composing the stabilized terms
///
/// ```text
/// InternalForces:
///   MB: [adv] + diff + P p + LSIC u + BC u + BCp p + [M (u - u_prev)/Δt]
///   MC: Lin u + [adv] + diff + Pmc p + BCmc u + [Mmc (u - u_prev)/Δt]
///
/// ExternalForces: [bc_rhs_mb; bc_rhs_mc]
/// ```
pub fn compose_characteristic_vector<E: SupgTerms>(
    element: &mut E,
    answer: &mut Vector,
    kind: CharVector,
    ctx: &FluidContext,
) -> Result<(), StrError> {
    let layout = element.dof_layout().clone();
    let mut b = Blocks::new(layout.nv(), layout.np());
    answer.fill(0.0);
    match kind {
        CharVector::InternalForces => {
            // momentum balance
            if ctx.advection {
                element.advection_mb(&mut b.v, ctx)?;
                scatter_block_vector(answer, 1.0, &b.v, &layout.velocity);
            }
            element.diffusion_mb(&mut b.v, ctx)?;
            scatter_block_vector(answer, 1.0, &b.v, &layout.velocity);
            element.pressure_mb(&mut b.vp, ctx)?;
            add_product(answer, &b.vp, ctx.pp, &mut b.help_v, &layout.velocity)?;
            element.lsic_mb(&mut b.vv, ctx)?;
            add_product(answer, &b.vv, ctx.uu, &mut b.help_v, &layout.velocity)?;
            element.bc_lhs_mb(&mut b.vv, ctx)?;
            add_product(answer, &b.vv, ctx.uu, &mut b.help_v, &layout.velocity)?;
            element.bc_lhs_pressure_mb(&mut b.vp, ctx)?;
            add_product(answer, &b.vp, ctx.pp, &mut b.help_v, &layout.velocity)?;

            // continuity
            element.linear_advection_mc(&mut b.pv, ctx)?;
            add_product(answer, &b.pv, ctx.uu, &mut b.help_p, &layout.pressure)?;
            if ctx.advection {
                element.advection_mc(&mut b.p, ctx)?;
                scatter_block_vector(answer, 1.0, &b.p, &layout.pressure);
            }
            element.diffusion_mc(&mut b.p, ctx)?;
            scatter_block_vector(answer, 1.0, &b.p, &layout.pressure);
            element.pressure_mc(&mut b.pp, ctx)?;
            add_product(answer, &b.pp, ctx.pp, &mut b.help_p, &layout.pressure)?;
            element.bc_lhs_pressure_mc(&mut b.pv, ctx)?;
            add_product(answer, &b.pv, ctx.uu, &mut b.help_p, &layout.pressure)?;

            // time derivative
            if ctx.transient {
                let mut rate = Vector::new(layout.nv());
                for i in 0..layout.nv() {
                    rate[i] = (ctx.uu[i] - ctx.uu_prev[i]) / ctx.dt;
                }
                element.acceleration_mb(&mut b.vv, ctx)?;
                add_product(answer, &b.vv, &rate, &mut b.help_v, &layout.velocity)?;
                element.acceleration_mc(&mut b.pv, ctx)?;
                add_product(answer, &b.pv, &rate, &mut b.help_p, &layout.pressure)?;
            }
            Ok(())
        }
        CharVector::ExternalForces => {
            element.bc_rhs_mb(&mut b.v, ctx)?;
            scatter_block_vector(answer, 1.0, &b.v, &layout.velocity);
            element.bc_rhs_mc(&mut b.p, ctx)?;
            scatter_block_vector(answer, 1.0, &b.p, &layout.pressure);
            Ok(())
        }
        _ => Err("unknown characteristic vector type"),
    }
}

/// Computes a characteristic matrix by composing the stabilized terms
///
/// ```text
/// TangentStiffness:
///   Kvv = diff' + LSIC + BC + [adv'] + [M/Δt]      Kvp = P + BCp
///   Kpv = Lin + BCmc + [adv'mc] + [Mmc/Δt]          Kpp = Pmc
/// ```
pub fn compose_characteristic_matrix<E: SupgTerms>(
    element: &mut E,
    answer: &mut Matrix,
    kind: CharMatrix,
    ctx: &FluidContext,
) -> Result<(), StrError> {
    if kind != CharMatrix::TangentStiffness {
        return Err("unknown characteristic matrix type");
    }
    let layout = element.dof_layout().clone();
    let (vl, pl) = (&layout.velocity, &layout.pressure);
    let mut b = Blocks::new(layout.nv(), layout.np());
    answer.fill(0.0);

    // velocity-velocity
    element.diffusion_derivative_mb(&mut b.vv, ctx)?;
    scatter_block_matrix(answer, 1.0, &b.vv, vl, vl);
    element.lsic_mb(&mut b.vv, ctx)?;
    scatter_block_matrix(answer, 1.0, &b.vv, vl, vl);
    element.bc_lhs_mb(&mut b.vv, ctx)?;
    scatter_block_matrix(answer, 1.0, &b.vv, vl, vl);
    if ctx.advection {
        element.advection_derivative_mb(&mut b.vv, ctx)?;
        scatter_block_matrix(answer, 1.0, &b.vv, vl, vl);
    }
    if ctx.transient {
        element.acceleration_mb(&mut b.vv, ctx)?;
        scatter_block_matrix(answer, 1.0 / ctx.dt, &b.vv, vl, vl);
    }

    // velocity-pressure
    element.pressure_mb(&mut b.vp, ctx)?;
    scatter_block_matrix(answer, 1.0, &b.vp, vl, pl);
    element.bc_lhs_pressure_mb(&mut b.vp, ctx)?;
    scatter_block_matrix(answer, 1.0, &b.vp, vl, pl);

    // pressure-velocity
    element.linear_advection_mc(&mut b.pv, ctx)?;
    scatter_block_matrix(answer, 1.0, &b.pv, pl, vl);
    element.bc_lhs_pressure_mc(&mut b.pv, ctx)?;
    scatter_block_matrix(answer, 1.0, &b.pv, pl, vl);
    if ctx.advection {
        element.advection_derivative_mc(&mut b.pv, ctx)?;
        scatter_block_matrix(answer, 1.0, &b.pv, pl, vl);
    }
    if ctx.transient {
        element.acceleration_mc(&mut b.pv, ctx)?;
        scatter_block_matrix(answer, 1.0 / ctx.dt, &b.pv, pl, vl);
    }

    // pressure-pressure
    element.pressure_mc(&mut b.pp, ctx)?;
    scatter_block_matrix(answer, 1.0, &b.pp, pl, pl);
    Ok(())
}

/// Adds the product of a block matrix and a vector to the local vector
fn add_product(answer: &mut Vector, block: &Matrix, x: &Vector, help: &mut Vector, map: &[usize]) -> Result<(), StrError> {
    mat_vec_mul(help, 1.0, block, x)?;
    scatter_block_vector(answer, 1.0, help, map);
    Ok(())
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
