use super::{DofLayout, ElementBubbleTri3, ElementSupgTri3, FluidContext, FluidElementTrait, LinearSystem};
use crate::base::{assemble_vector, Attributes, CharMatrix, CharVector, Config, Elem, Equations, Natural};
use crate::StrError;
use gemlab::mesh::{Cell, Mesh};
use russell_lab::{Matrix, Vector};
use std::io::{Read, Write};

/// Holds the global values required by the element computations
pub struct FlowState<'a> {
    /// Global vector of unknowns (velocities and pressures)
    pub uu: &'a Vector,

    /// Global vector of unknowns at the previous step
    pub uu_prev: &'a Vector,

    /// Time step size
    pub dt: f64,
}

/// Holds the local values gathered from the global vectors
struct LocalValues {
    layout: DofLayout,
    uu: Vector,
    pp: Vector,
    uu_prev: Vector,
}

/// Defines a generic fluid element, wrapping an "actual" implementation
pub struct GenericFluidElement {
    /// Connects to the "actual" implementation of local equations
    pub actual: Box<dyn FluidElementTrait>,

    /// Holds the local-to-global map of equations
    pub local_to_global: Vec<usize>,

    /// Implements the internal forces vector
    pub internal: Vector,

    /// Implements the external forces vector
    pub external: Vector,

    /// Implements the tangent (Jacobian) matrix
    pub jacobian: Matrix,

    /// Holds the local velocities and pressures
    local: LocalValues,
}

/// Holds a collection of (generic) fluid elements
pub struct FluidElements<'a> {
    /// Holds configuration parameters
    pub config: &'a Config,

    /// All elements
    pub all: Vec<GenericFluidElement>,
}

/// Holds auxiliary arguments for the computation of numerical Jacobian matrices
#[cfg(test)]
struct ArgsForNumericalJacobian<'a> {
    /// Holds the residual vector
    pub residual: &'a mut Vector,

    /// Holds the global vector of unknowns
    pub uu: &'a mut Vector,
}

impl LocalValues {
    fn new(layout: DofLayout) -> Self {
        let (nv, np) = (layout.nv(), layout.np());
        LocalValues {
            layout,
            uu: Vector::new(nv),
            pp: Vector::new(np),
            uu_prev: Vector::new(nv),
        }
    }

    /// Copies the global values into the local blocks
    fn gather(&mut self, local_to_global: &[usize], uu: &Vector, uu_prev: &Vector) {
        for (i, m) in self.layout.velocity.iter().enumerate() {
            let g = local_to_global[*m];
            self.uu[i] = uu[g];
            self.uu_prev[i] = uu_prev[g];
        }
        for (i, m) in self.layout.pressure.iter().enumerate() {
            self.pp[i] = uu[local_to_global[*m]];
        }
    }

    /// Returns the context for the element computations
    fn context(&self, config: &Config, dt: f64) -> FluidContext {
        FluidContext {
            advection: config.advection,
            transient: config.transient,
            dt,
            thickness: config.thickness,
            uu: &self.uu,
            pp: &self.pp,
            uu_prev: &self.uu_prev,
        }
    }
}

impl GenericFluidElement {
    /// Allocates new instance
    pub fn new(mesh: &Mesh, cell: &Cell, elem: &Elem, equations: &Equations, natural: &Natural) -> Result<Self, StrError> {
        let layout = DofLayout::new(elem)?;
        let actual: Box<dyn FluidElementTrait> = match elem {
            Elem::SupgTri3(p) => Box::new(ElementSupgTri3::new(mesh, cell, p, layout.clone(), natural)?),
            Elem::BubbleTri3(p) => Box::new(ElementBubbleTri3::new(mesh, cell, p, layout.clone(), natural)?),
            _ => return Err("element is not a fluid element"),
        };
        let local_to_global = match equations.cells.get(cell.id) {
            Some(l2g) => l2g.clone(),
            None => return Err("cell id is out of bounds"),
        };
        if local_to_global.len() != layout.n_local {
            return Err("local-to-global map is inconsistent with the element");
        }
        let n = layout.n_local;
        Ok(GenericFluidElement {
            actual,
            local_to_global,
            internal: Vector::new(n),
            external: Vector::new(n),
            jacobian: Matrix::new(n, n),
            local: LocalValues::new(layout),
        })
    }

    /// Calculates the internal forces vector
    pub fn calc_internal_forces(&mut self, config: &Config, state: &FlowState) -> Result<(), StrError> {
        self.local.gather(&self.local_to_global, state.uu, state.uu_prev);
        let ctx = self.local.context(config, state.dt);
        self.actual
            .characteristic_vector(&mut self.internal, CharVector::InternalForces, &ctx)
    }

    /// Calculates the external forces vector
    pub fn calc_external_forces(&mut self, config: &Config, state: &FlowState) -> Result<(), StrError> {
        self.local.gather(&self.local_to_global, state.uu, state.uu_prev);
        let ctx = self.local.context(config, state.dt);
        self.actual
            .characteristic_vector(&mut self.external, CharVector::ExternalForces, &ctx)
    }

    /// Calculates the tangent matrix
    pub fn calc_jacobian(&mut self, config: &Config, state: &FlowState) -> Result<(), StrError> {
        self.local.gather(&self.local_to_global, state.uu, state.uu_prev);
        let ctx = self.local.context(config, state.dt);
        self.actual
            .characteristic_matrix(&mut self.jacobian, CharMatrix::TangentStiffness, &ctx)
    }

    /// Recomputes the stabilization coefficients
    pub fn update_stabilization(&mut self, config: &Config, state: &FlowState) -> Result<(), StrError> {
        self.local.gather(&self.local_to_global, state.uu, state.uu_prev);
        let ctx = self.local.context(config, state.dt);
        self.actual.update_stabilization(&ctx)
    }

    /// Recomputes and commits the stress at the integration points
    pub fn update_internal_state(&mut self, config: &Config, state: &FlowState) -> Result<(), StrError> {
        self.local.gather(&self.local_to_global, state.uu, state.uu_prev);
        let ctx = self.local.context(config, state.dt);
        self.actual.update_internal_state(&ctx)
    }

    /// Returns the critical time step
    pub fn critical_time_step(&mut self, config: &Config, state: &FlowState) -> f64 {
        self.local.gather(&self.local_to_global, state.uu, state.uu_prev);
        let ctx = self.local.context(config, state.dt);
        self.actual.critical_time_step(&ctx)
    }

    /// Calculates the Jacobian matrix using finite differences
    ///
    /// **Note:** The global vector is changed temporarily, but it is restored at the end of the function
    #[cfg(test)]
    pub(crate) fn numerical_jacobian(&mut self, config: &Config, uu: &mut Vector, uu_prev: &Vector, dt: f64) -> Result<(), StrError> {
        let neq = self.internal.dim();
        let mut args = ArgsForNumericalJacobian {
            residual: &mut self.internal,
            uu,
        };
        for i in 0..neq {
            for j in 0..neq {
                let g = self.local_to_global[j];
                let at_u = args.uu[g];
                let res = russell_lab::deriv1_central5(at_u, &mut args, |u, a| {
                    let original = a.uu[g];
                    a.uu[g] = u;
                    self.local.gather(&self.local_to_global, a.uu, uu_prev);
                    let ctx = self.local.context(config, dt);
                    self.actual
                        .characteristic_vector(a.residual, CharVector::InternalForces, &ctx)?;
                    a.uu[g] = original;
                    Ok(a.residual[i])
                })?;
                self.jacobian.set(i, j, res);
            }
        }
        Ok(())
    }
}

impl<'a> FluidElements<'a> {
    /// Allocates new instance
    pub fn new(
        mesh: &Mesh,
        attributes: &Attributes,
        equations: &Equations,
        natural: &Natural,
        config: &'a Config,
    ) -> Result<Self, StrError> {
        let res: Result<Vec<_>, _> = mesh
            .cells
            .iter()
            .map(|cell| {
                let elem = attributes.get(cell)?;
                GenericFluidElement::new(mesh, cell, elem, equations, natural)
            })
            .collect();
        match res {
            Ok(all) => Ok(FluidElements { config, all }),
            Err(e) => Err(e),
        }
    }

    /// Recomputes the stabilization coefficients of all elements
    pub fn update_stabilization(&mut self, state: &FlowState) -> Result<(), StrError> {
        let config = self.config;
        self.all
            .iter_mut()
            .map(|e| e.update_stabilization(config, state))
            .collect()
    }

    /// Assembles the internal forces vector
    ///
    /// The global vector is cleared (with zeros) at the beginning. Returns the error norm,
    /// i.e., the sum of the squared entries of the local vectors.
    pub fn assemble_internal_forces(
        &mut self,
        ff_int: &mut Vector,
        state: &FlowState,
        prescribed: &[bool],
    ) -> Result<f64, StrError> {
        let config = self.config;
        ff_int.fill(0.0); // << important
        let mut error_norm = 0.0;
        for e in &mut self.all {
            e.calc_internal_forces(config, state)?;
            error_norm += e.internal.as_data().iter().fold(0.0, |acc, x| acc + x * x);
            assemble_vector(ff_int, &e.internal, &e.local_to_global, prescribed);
        }
        Ok(error_norm)
    }

    /// Assembles the external forces vector
    ///
    /// The global vector is cleared (with zeros) at the beginning.
    pub fn assemble_external_forces(
        &mut self,
        ff_ext: &mut Vector,
        state: &FlowState,
        prescribed: &[bool],
    ) -> Result<(), StrError> {
        let config = self.config;
        ff_ext.fill(0.0); // << important
        for e in &mut self.all {
            e.calc_external_forces(config, state)?;
            assemble_vector(ff_ext, &e.external, &e.local_to_global, prescribed);
        }
        Ok(())
    }

    /// Assembles the tangent matrices
    ///
    /// **Note:** The global matrix must be reset beforehand
    pub fn assemble_tangent(&mut self, lin_sys: &mut LinearSystem, state: &FlowState, prescribed: &[bool]) -> Result<(), StrError> {
        let config = self.config;
        for e in &mut self.all {
            e.calc_jacobian(config, state)?;
            lin_sys.assemble(&e.jacobian, &e.local_to_global, &e.local_to_global, prescribed)?;
        }
        Ok(())
    }

    /// Recomputes and commits the stress at the integration points of all elements
    pub fn update_internal_state(&mut self, state: &FlowState) -> Result<(), StrError> {
        let config = self.config;
        self.all
            .iter_mut()
            .map(|e| e.update_internal_state(config, state))
            .collect()
    }

    /// Returns the smallest critical time step among all elements
    pub fn critical_time_step(&mut self, state: &FlowState) -> f64 {
        let config = self.config;
        self.all
            .iter_mut()
            .fold(f64::INFINITY, |acc, e| f64::min(acc, e.critical_time_step(config, state)))
    }

    /// Writes the context of all elements to a stream
    pub fn save_context(&self, writer: &mut dyn Write) -> Result<(), StrError> {
        for e in &self.all {
            e.actual.save_context(writer)?;
        }
        Ok(())
    }

    /// Reads the context of all elements from a stream
    pub fn restore_context(&mut self, reader: &mut dyn Read) -> Result<(), StrError> {
        for e in &mut self.all {
            e.actual.restore_context(reader)?;
        }
        Ok(())
    }
}

////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod tests {
    use super::{FlowState, FluidElements, GenericFluidElement};
    use crate::fem::LinearSystem;
    use crate::base::{Attributes, Config, Elem, Equations, Load, Natural, ParamFluid, ParamSolid, SampleMeshes};
    use russell_lab::{approx_eq, mat_approx_eq, Vector};

    #[test]
    fn new_captures_errors() {
        let mesh = SampleMeshes::two_tri3();
        let att = Attributes::from([(1, Elem::PlaneStress(ParamSolid::sample_local_damage()))]);
        let equations = Equations::new(&mesh, &att).unwrap();
        let config = Config::new();
        assert_eq!(
            GenericFluidElement::new(&mesh, &mesh.cells[0], att.get(&mesh.cells[0]).unwrap(), &equations, &Natural::new())
                .err(),
            Some("element is not a fluid element")
        );
        assert_eq!(
            FluidElements::new(&mesh, &att, &equations, &Natural::new(), &config).err(),
            Some("element is not a fluid element")
        );
    }

    #[test]
    fn numerical_jacobian_works() {
        let mesh = SampleMeshes::two_tri3();
        let mut config = Config::new();
        config.set_advection(true).unwrap().set_transient(true).unwrap();
        for elem in [
            Elem::SupgTri3(ParamFluid::sample_newtonian()),
            Elem::BubbleTri3(ParamFluid::sample_newtonian()),
        ] {
            let att = Attributes::from([(1, elem)]);
            let equations = Equations::new(&mesh, &att).unwrap();
            let mut natural = Natural::new();
            natural.on_side(1, 0, Load::OutFlow).unwrap();
            let mut elements = FluidElements::new(&mesh, &att, &equations, &natural, &config).unwrap();
            let n = equations.n_equation;
            let mut uu = Vector::new(n);
            let mut uu_prev = Vector::new(n);
            for i in 0..n {
                uu[i] = 0.1 * ((i % 5) as f64) - 0.2;
                uu_prev[i] = 0.05 * ((i % 3) as f64);
            }
            let state = FlowState {
                uu: &uu,
                uu_prev: &uu_prev,
                dt: 0.5,
            };
            elements.update_stabilization(&state).unwrap();
            for e in &mut elements.all {
                e.calc_jacobian(&config, &state).unwrap();
            }
            let analytical: Vec<_> = elements.all.iter().map(|e| e.jacobian.clone()).collect();
            for (e, jj_ana) in elements.all.iter_mut().zip(analytical.iter()) {
                e.numerical_jacobian(&config, &mut uu, &uu_prev, 0.5).unwrap();
                mat_approx_eq(jj_ana, &e.jacobian, 1e-7);
            }
        }
    }

    #[test]
    fn assemble_works() {
        let mesh = SampleMeshes::two_tri3();
        let config = Config::new();
        let att = Attributes::from([(1, Elem::SupgTri3(ParamFluid::sample_newtonian()))]);
        let equations = Equations::new(&mesh, &att).unwrap();
        let mut natural = Natural::new();
        natural.on_body(1, Load::BodyForce { gx: 0.0, gy: -1.0 }).unwrap();
        let mut elements = FluidElements::new(&mesh, &att, &equations, &natural, &config).unwrap();
        let n = equations.n_equation;
        let (uu, uu_prev) = (Vector::new(n), Vector::new(n));
        let state = FlowState {
            uu: &uu,
            uu_prev: &uu_prev,
            dt: 1.0,
        };
        let mut prescribed = vec![false; n];
        prescribed[0] = true;

        // at rest: no internal forces
        let mut ff_int = Vector::new(n);
        let norm = elements.assemble_internal_forces(&mut ff_int, &state, &prescribed).unwrap();
        assert_eq!(norm, 0.0);

        // body force: the total vertical force is ρ g A (the first equation is Vx)
        let mut ff_ext = Vector::new(n);
        elements.assemble_external_forces(&mut ff_ext, &state, &prescribed).unwrap();
        let mut total = 0.0;
        for p in 0..mesh.points.len() {
            total += ff_ext[equations.eq(p, crate::base::Dof::Vy).unwrap()];
        }
        approx_eq(total, -1.0, 1e-15);
        assert_eq!(ff_ext[0], 0.0);

        // tangent
        let mut lin_sys = LinearSystem::from_equations(&equations).unwrap();
        elements.assemble_tangent(&mut lin_sys, &state, &prescribed).unwrap();
        assert!(lin_sys.kk.get_coo().unwrap().get_info().2 > 0);
        assert_eq!(elements.critical_time_step(&state), 0.5);

        // context
        let mut buffer: Vec<u8> = Vec::new();
        elements.save_context(&mut buffer).unwrap();
        elements.restore_context(&mut buffer.as_slice()).unwrap();
    }
}
