use super::{ControlConvergence, ExportModule, FlowState, FluidElements, LinearSystem, MeshQualityEstimator};
use super::{MeshTopology, NonlinearProblem, NrSolver, PrescribedValues, PrimaryField, TopologyState};
use super::{MAX_MESH_DEFORMATION, NmStatus};
use crate::base::{Attributes, Component, Config, Equations, Essential, Natural, TimeStep};
use crate::material::{restore_context, save_context};
use crate::StrError;
use gemlab::mesh::Mesh;
use russell_lab::{vec_add, Vector};
use std::io::{Read, Write};

/// Implements the incremental driver of (Navier-)Stokes flow problems
///
/// Each step runs the following sequence:
///
/// 1. Mesh check: replace the mesh if the attached topology asks for it or if the
///    quality metric exceeds [MAX_MESH_DEFORMATION]
/// 2. Advance the primary field (at most once per step)
/// 3. Assemble the external forces and set the prescribed values
/// 4. Run the Newton-Raphson iterations
/// 5. Commit: refresh the stabilization, update the internal state, and write the output
pub struct StokesFlow<'a> {
    /// Holds the configuration parameters
    config: &'a Config,

    /// Holds the current mesh
    pub mesh: Mesh,

    /// Holds the element attributes
    attributes: Attributes,

    /// Holds the essential boundary conditions
    essential: Essential,

    /// Holds the natural boundary conditions
    natural: Natural,

    /// Holds the equation numbers
    pub equations: Equations,

    /// Holds all fluid elements
    pub elements: FluidElements<'a>,

    /// Holds the prescribed values
    pub prescribed: PrescribedValues,

    /// Holds the primary field (velocities and pressures)
    pub field: PrimaryField,

    /// Holds the external forces vector
    pub ff_ext: Vector,

    /// Holds the internal forces vector
    pub ff_int: Vector,

    /// Holds the error norm of the last internal forces assembly
    pub error_norm: f64,

    /// Holds the global linear system (allocated lazily)
    lin_sys: Option<LinearSystem>,

    /// Holds the mesh topology provider
    topology: Option<Box<dyn MeshTopology>>,

    /// Holds the mesh quality estimator (allocated with the first mesh from the topology)
    estimator: Option<MeshQualityEstimator>,

    /// Holds the state reported by the topology at the end of the last step
    topology_state: TopologyState,

    /// Holds the output manager
    export: Option<Box<dyn ExportModule>>,

    /// Holds the previous time step
    pub previous_step: Option<TimeStep>,

    /// Holds the current time step
    pub current_step: Option<TimeStep>,

    /// Indicates that the field has been advanced to the current step
    has_advanced: bool,
}

/// Holds the nonlinear problem of a single step
struct FlowProblem<'b, 'a> {
    elements: &'b mut FluidElements<'a>,
    prescribed: &'b [bool],
    ff_ext: &'b Vector,
    ff_int: &'b mut Vector,
    uu_prev: &'b Vector,
    dt: f64,
    error_norm: f64,
}

impl<'b, 'a> NonlinearProblem for FlowProblem<'b, 'a> {
    fn prescribed(&self) -> &[bool] {
        self.prescribed
    }

    fn update_residual(&mut self, uu: &Vector, rr: &mut Vector) -> Result<(), StrError> {
        let state = FlowState {
            uu,
            uu_prev: self.uu_prev,
            dt: self.dt,
        };
        self.elements.update_stabilization(&state)?;
        self.error_norm = self
            .elements
            .assemble_internal_forces(self.ff_int, &state, self.prescribed)?;
        vec_add(rr, 1.0, self.ff_int, -1.0, self.ff_ext)
    }

    fn update_tangent(&mut self, uu: &Vector, lin_sys: &mut LinearSystem) -> Result<(), StrError> {
        let state = FlowState {
            uu,
            uu_prev: self.uu_prev,
            dt: self.dt,
        };
        self.elements.update_stabilization(&state)?;
        self.elements.assemble_tangent(lin_sys, &state, self.prescribed)?;
        lin_sys.put_prescribed_ones(self.prescribed)?;
        Ok(())
    }
}

impl<'a> StokesFlow<'a> {
    /// Allocates a new instance
    pub fn new(
        config: &'a Config,
        mesh: Mesh,
        attributes: Attributes,
        essential: Essential,
        natural: Natural,
    ) -> Result<Self, StrError> {
        if let Some(msg) = config.validate() {
            println!("ERROR: {}", msg);
            return Err("cannot allocate simulation because config.validate() failed");
        }
        StokesFlow::check_consistency(&mesh, &attributes)?;
        let equations = Equations::new(&mesh, &attributes)?;
        let elements = FluidElements::new(&mesh, &attributes, &equations, &natural, config)?;
        let prescribed = PrescribedValues::new(&equations, &essential)?;
        let neq = equations.n_equation;
        Ok(StokesFlow {
            config,
            mesh,
            attributes,
            essential,
            natural,
            equations,
            elements,
            prescribed,
            field: PrimaryField::new(neq),
            ff_ext: Vector::new(neq),
            ff_int: Vector::new(neq),
            error_norm: 0.0,
            lin_sys: None,
            topology: None,
            estimator: None,
            topology_state: TopologyState::Ok,
            export: None,
            previous_step: None,
            current_step: None,
            has_advanced: false,
        })
    }

    /// Checks that all cells of the mesh correspond to fluid elements
    pub fn check_consistency(mesh: &Mesh, attributes: &Attributes) -> Result<(), StrError> {
        for cell in &mesh.cells {
            if !attributes.get(cell)?.is_fluid() {
                return Err("element is not a fluid element");
            }
        }
        Ok(())
    }

    /// Attaches a mesh topology provider
    pub fn set_topology(&mut self, topology: Box<dyn MeshTopology>) -> &mut Self {
        self.topology = Some(topology);
        self
    }

    /// Attaches an output manager and initializes it
    pub fn set_export(&mut self, mut export: Box<dyn ExportModule>) -> Result<&mut Self, StrError> {
        export.initialize()?;
        self.export = Some(export);
        Ok(self)
    }

    /// Returns the number of equations
    pub fn n_equation(&self) -> usize {
        self.equations.n_equation
    }

    /// Renumbers the equations and drops the linear system
    ///
    /// Returns the new number of equations.
    pub fn force_equation_numbering(&mut self) -> Result<usize, StrError> {
        let equations = Equations::new(&self.mesh, &self.attributes)?;
        for (e, element) in self.elements.all.iter_mut().enumerate() {
            match equations.cells.get(e) {
                Some(l2g) if l2g.len() == element.local_to_global.len() => {
                    element.local_to_global.clone_from(l2g);
                }
                _ => return Err("local-to-global map is inconsistent with the element"),
            }
        }
        self.prescribed = PrescribedValues::new(&equations, &self.essential)?;
        let neq = equations.n_equation;
        if neq != self.field.dim() {
            self.field = PrimaryField::new(neq);
            self.ff_ext = Vector::new(neq);
            self.ff_int = Vector::new(neq);
        }
        self.equations = equations;
        self.lin_sys = None;
        Ok(neq)
    }

    /// Replaces the mesh and rebuilds all elements, equations, and vectors
    fn rebuild_domain(&mut self, mesh: Mesh) -> Result<(), StrError> {
        StokesFlow::check_consistency(&mesh, &self.attributes)?;
        let equations = Equations::new(&mesh, &self.attributes)?;
        self.elements = FluidElements::new(&mesh, &self.attributes, &equations, &self.natural, self.config)?;
        self.prescribed = PrescribedValues::new(&equations, &self.essential)?;
        let neq = equations.n_equation;
        self.field = PrimaryField::new(neq);
        self.ff_ext = Vector::new(neq);
        self.ff_int = Vector::new(neq);
        self.equations = equations;
        self.mesh = mesh;
        self.lin_sys = None;
        Ok(())
    }

    /// Generates a new mesh using the topology provider and rebuilds the domain
    fn replace_fe_mesh(&mut self) -> Result<(), StrError> {
        let mesh = match self.topology.as_mut() {
            Some(topology) => topology.replace_fe_mesh()?,
            None => return Err("mesh topology is not available"),
        };
        self.rebuild_domain(mesh)
    }

    /// Creates the next time step
    ///
    /// The first call creates the step at `t_ini` (and the previous step at `t_ini - dt`).
    pub fn give_next_step(&mut self) -> TimeStep {
        let dt = self.config.dt;
        let next = match self.current_step {
            None => {
                self.previous_step = Some(TimeStep::new(0, self.config.t_ini - dt, dt, 0));
                TimeStep::new(1, self.config.t_ini, dt, 1)
            }
            Some(current) => {
                self.previous_step = Some(current);
                current.next(dt)
            }
        };
        self.current_step = Some(next);
        next
    }

    /// Checks the mesh and replaces it if needed
    fn check_mesh(&mut self, step: &TimeStep) -> Result<(), StrError> {
        let n_elements = match self.topology.as_ref() {
            Some(topology) => topology.n_elements(),
            None => return Ok(()),
        };
        if n_elements == 0 {
            self.replace_fe_mesh()?;
            self.estimator = Some(MeshQualityEstimator::new());
            if let Some(export) = self.export.as_mut() {
                export.initialize()?;
            }
        }
        let estimator = self.estimator.get_or_insert_with(MeshQualityEstimator::new);
        let error = estimator.global_error(&self.mesh);
        if error > MAX_MESH_DEFORMATION || self.topology_state == TopologyState::NeedsRemeshing {
            if self.config.verbose_timesteps {
                println!("remeshing at step {} (mesh quality = {:?})", step.number, error);
            }
            self.replace_fe_mesh()?;
            if let Some(estimator) = self.estimator.as_mut() {
                estimator.global_error(&self.mesh);
            }
            self.topology_state = TopologyState::Ok;
            if let Some(export) = self.export.as_mut() {
                export.initialize()?;
                export.do_output(step, &self.field)?;
            }
        }
        Ok(())
    }

    /// Solves the current step
    ///
    /// [StokesFlow::give_next_step] must be called beforehand. The field is advanced only
    /// once per step; thus, this function may be called again if the step is re-solved.
    pub fn solve_yourself_at(&mut self) -> Result<(), StrError> {
        let step = self.current_step.ok_or("time step is not available; call give_next_step first")?;

        // mesh check
        self.check_mesh(&step)?;

        // advance
        if !self.has_advanced {
            self.field.advance(&step);
            self.has_advanced = true;
        }
        // every attempt starts from zero at the free equations (the prescribed values are set below)
        self.field.solution.fill(0.0);

        // linear system
        if self.lin_sys.is_none() {
            self.lin_sys = Some(LinearSystem::from_equations(&self.equations)?);
        }

        // external forces
        let state = FlowState {
            uu: &self.field.solution,
            uu_prev: &self.field.previous,
            dt: step.dt,
        };
        self.elements.update_stabilization(&state)?;
        self.elements
            .assemble_external_forces(&mut self.ff_ext, &state, &self.prescribed.flags)?;

        // prescribed values
        self.prescribed.apply(&mut self.field.solution, step.time);

        // Newton-Raphson iterations
        let lin_sys = match self.lin_sys.as_mut() {
            Some(lin_sys) => lin_sys,
            None => return Err("linear system is not available"),
        };
        let mut solver = NrSolver::new(self.config, self.equations.n_equation);
        solver.control.print_timestep(step.number, step.time, step.dt);
        let mut problem = FlowProblem {
            elements: &mut self.elements,
            prescribed: &self.prescribed.flags,
            ff_ext: &self.ff_ext,
            ff_int: &mut self.ff_int,
            uu_prev: &self.field.previous,
            dt: step.dt,
            error_norm: 0.0,
        };
        let status = solver.solve(&mut problem, &mut self.field.solution, lin_sys)?;
        self.error_norm = problem.error_norm;
        if !status.contains(NmStatus::SUCCESS) {
            println!("ERROR: nonlinear solver failed at step {} ({})", step.number, status);
            return Err("nonlinear solver did not converge");
        }

        // stabilization with the converged solution
        let state = FlowState {
            uu: &self.field.solution,
            uu_prev: &self.field.previous,
            dt: step.dt,
        };
        self.elements.update_stabilization(&state)
    }

    /// Updates the internal state of the topology and all elements
    pub fn update_internal_state(&mut self) -> Result<(), StrError> {
        let step = self.current_step.ok_or("time step is not available; call give_next_step first")?;
        if let Some(topology) = self.topology.as_mut() {
            self.topology_state = topology.update_yourself(&step);
        }
        let state = FlowState {
            uu: &self.field.solution,
            uu_prev: &self.field.previous,
            dt: step.dt,
        };
        self.elements.update_internal_state(&state)
    }

    /// Commits the current step and writes the output
    pub fn update_yourself(&mut self) -> Result<(), StrError> {
        let step = self.current_step.ok_or("time step is not available; call give_next_step first")?;
        self.has_advanced = false;
        self.update_internal_state()?;
        self.field.commit();
        if let Some(export) = self.export.as_mut() {
            export.do_output(&step, &self.field)?;
        }
        Ok(())
    }

    /// Updates a global component (internal forces or tangent matrix) using the working solution
    pub fn update_component(&mut self, kind: Component) -> Result<(), StrError> {
        let dt = self.current_step.map(|s| s.dt).unwrap_or(self.config.dt);
        let state = FlowState {
            uu: &self.field.solution,
            uu_prev: &self.field.previous,
            dt,
        };
        match kind {
            Component::InternalRhs => {
                self.elements.update_stabilization(&state)?;
                self.error_norm =
                    self.elements
                        .assemble_internal_forces(&mut self.ff_int, &state, &self.prescribed.flags)?;
                Ok(())
            }
            Component::NonLinearLhs => {
                if self.lin_sys.is_none() {
                    self.lin_sys = Some(LinearSystem::from_equations(&self.equations)?);
                }
                let lin_sys = match self.lin_sys.as_mut() {
                    Some(lin_sys) => lin_sys,
                    None => return Err("linear system is not available"),
                };
                self.elements.update_stabilization(&state)?;
                lin_sys.zero()?;
                self.elements.assemble_tangent(lin_sys, &state, &self.prescribed.flags)?;
                lin_sys.put_prescribed_ones(&self.prescribed.flags)
            }
            _ => Err("unknown component"),
        }
    }

    /// Returns the global linear system, if allocated
    pub fn linear_system(&self) -> Option<&LinearSystem> {
        self.lin_sys.as_ref()
    }

    /// Returns the smallest critical time step of all elements
    pub fn critical_time_step(&mut self) -> f64 {
        let state = FlowState {
            uu: &self.field.solution,
            uu_prev: &self.field.previous,
            dt: self.config.dt,
        };
        self.elements.critical_time_step(&state)
    }

    /// Runs all steps from `t_ini` to `t_fin`
    pub fn solve_yourself(&mut self) -> Result<(), StrError> {
        let control = ControlConvergence::new(self.config, self.equations.n_equation);
        control.print_header();
        let dt = self.config.dt;
        let tolerance = 1e-10 * dt;
        for _ in 0..self.config.n_max_time_steps {
            let t_next = match self.current_step {
                None => self.config.t_ini,
                Some(current) => current.time + dt,
            };
            if t_next > self.config.t_fin + tolerance {
                break;
            }
            self.give_next_step();
            self.solve_yourself_at()?;
            self.update_yourself()?;
        }
        control.print_footer();
        Ok(())
    }

    /// Writes the context (field, steps, and element states) to a stream
    pub fn save_context<W: Write>(&self, writer: &mut W) -> Result<(), StrError> {
        save_context(&self.current_step, writer)?;
        save_context(&self.field, writer)?;
        self.elements.save_context(writer)
    }

    /// Reads the context (field, steps, and element states) from a stream
    ///
    /// The stream must have been written by a simulation with the same mesh.
    pub fn restore_context<R: Read>(&mut self, reader: &mut R) -> Result<(), StrError> {
        let current: Option<TimeStep> = restore_context(reader)?;
        let field: PrimaryField = restore_context(reader)?;
        if field.dim() != self.equations.n_equation {
            return Err("cannot read context");
        }
        self.elements.restore_context(reader)?;
        self.current_step = current;
        self.previous_step = None;
        self.field = field;
        self.has_advanced = false;
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
