use super::{ControlConvergence, LinearSystem, NmStatus, NonlinearProblem, NonlocalDomain, NrSolver, PrescribedValues};
use crate::base::{Attributes, Config, Equations, Essential, TimeStep};
use crate::material::{restore_context, save_context};
use crate::StrError;
use gemlab::mesh::Mesh;
use russell_lab::Vector;
use std::io::{Read, Write};

/// Implements a displacement-controlled quasi-static analysis with (nonlocal) damage
///
/// The loading is given by the essential boundary conditions as functions of time.
/// The tangent matrix is the secant stiffness plus the nonlocal coupling of the
/// loading points; thus, the matrix is not symmetric.
pub struct NonlocalStatic<'a> {
    /// Holds the configuration parameters
    config: &'a Config,

    /// Holds the equation numbers
    pub equations: Equations,

    /// Holds the integration points and their states
    pub domain: NonlocalDomain,

    /// Holds the prescribed values
    pub prescribed: PrescribedValues,

    /// Holds the displacements
    pub uu: Vector,

    /// Holds the global linear system
    lin_sys: LinearSystem,

    /// Holds the current time step
    pub current_step: Option<TimeStep>,
}

/// Holds the nonlinear problem of a single step
struct DamageProblem<'b> {
    domain: &'b mut NonlocalDomain,
    prescribed: &'b [bool],
}

impl<'b> NonlinearProblem for DamageProblem<'b> {
    fn prescribed(&self) -> &[bool] {
        self.prescribed
    }

    fn update_residual(&mut self, uu: &Vector, rr: &mut Vector) -> Result<(), StrError> {
        self.domain.update_state(uu)?;
        self.domain.assemble_internal_forces(rr, self.prescribed);
        Ok(())
    }

    fn update_tangent(&mut self, _uu: &Vector, lin_sys: &mut LinearSystem) -> Result<(), StrError> {
        self.domain.assemble_secant_stiffness(lin_sys, self.prescribed)?;
        self.domain.assemble_nonlocal_stiffness(lin_sys, self.prescribed)?;
        lin_sys.put_prescribed_ones(self.prescribed)
    }
}

impl<'a> NonlocalStatic<'a> {
    /// Allocates a new instance
    pub fn new(config: &'a Config, mesh: &Mesh, attributes: &Attributes, essential: &Essential) -> Result<Self, StrError> {
        if let Some(msg) = config.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate simulation because config.validate() failed");
        }
        let equations = Equations::new(mesh, attributes)?;
        let domain = NonlocalDomain::new(mesh, attributes, &equations)?;
        let prescribed = PrescribedValues::new(&equations, essential)?;
        let neq = equations.n_equation;
        let lin_sys = LinearSystem::new(neq, neq + domain.nnz_sup())?;
        Ok(NonlocalStatic {
            config,
            equations,
            domain,
            prescribed,
            uu: Vector::new(neq),
            lin_sys,
            current_step: None,
        })
    }

    /// Solves the equilibrium at a given time and commits the state
    ///
    /// The last converged displacements are the initial guess.
    pub fn solve_step(&mut self, step: &TimeStep) -> Result<(), StrError> {
        self.prescribed.apply(&mut self.uu, step.time);
        let mut solver = NrSolver::new(self.config, self.equations.n_equation);
        solver.control.print_timestep(step.number, step.time, step.dt);
        let mut problem = DamageProblem {
            domain: &mut self.domain,
            prescribed: &self.prescribed.flags,
        };
        let status = solver.solve(&mut problem, &mut self.uu, &mut self.lin_sys)?;
        if !status.contains(NmStatus::SUCCESS) {
            println!("ERROR: nonlinear solver failed at step {} ({})", step.number, status);
            return Err("nonlinear solver did not converge");
        }
        self.domain.commit();
        self.current_step = Some(*step);
        Ok(())
    }

    /// Runs all steps from `t_ini + dt` to `t_fin`
    ///
    /// The function `output` is called after each converged step.
    pub fn solve_yourself<F>(&mut self, mut output: F) -> Result<(), StrError>
    where
        F: FnMut(&NonlocalStatic) -> Result<(), StrError>,
    {
        let control = ControlConvergence::new(self.config, self.equations.n_equation);
        control.print_header();
        let dt = self.config.dt;
        let tolerance = 1e-10 * dt;
        let mut step = TimeStep::new(0, self.config.t_ini, dt, 0);
        for _ in 0..self.config.n_max_time_steps {
            if step.time + dt > self.config.t_fin + tolerance {
                break;
            }
            step = step.next(dt);
            self.solve_step(&step)?;
            output(self)?;
        }
        control.print_footer();
        Ok(())
    }

    /// Returns the nodal forces (including the reactions at prescribed equations)
    pub fn nodal_forces(&self) -> Vector {
        let mut ff = Vector::new(self.equations.n_equation);
        let free = vec![false; self.equations.n_equation];
        self.domain.assemble_internal_forces(&mut ff, &free);
        ff
    }

    /// Writes the context (displacements and states) to a stream
    pub fn save_context<W: Write>(&self, writer: &mut W) -> Result<(), StrError> {
        save_context(&self.current_step, writer)?;
        save_context(&self.uu, writer)?;
        self.domain.save_context(writer)
    }

    /// Reads the context (displacements and states) from a stream
    pub fn restore_context<R: Read>(&mut self, reader: &mut R) -> Result<(), StrError> {
        let current: Option<TimeStep> = restore_context(reader)?;
        let uu: Vector = restore_context(reader)?;
        if uu.dim() != self.equations.n_equation {
            return Err("cannot read context");
        }
        self.domain.restore_context(reader)?;
        self.current_step = current;
        self.uu = uu;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
